use crate::models::Format;

use super::{Field, LinePattern};

/// Module requirements in `go.mod` (`require` blocks or single-line form) and
/// `go.sum` entries. The version keeps its `v` prefix, as Go module versions
/// always carry it.
pub const GO_MODULE: LinePattern = LinePattern {
    format: Format::Golang,
    pattern: r"^\s*(?:require\s+)?([A-Za-z0-9][^\s]*)\s+(v\d+\.\d+\.\d+(?:-[0-9A-Za-z.\-]+)?(?:\+incompatible)?)(?:/go\.mod)?(?:\s|$)",
    fields: &[Field::Name, Field::Version],
    normalize: None,
};
