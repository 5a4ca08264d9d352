use crate::models::Format;

use super::{Field, LinePattern};

/// `package.json` dependency entries: `"name": "^1.2.3"`.
///
/// Range operators other than a leading `^` or `~` (and tags like `latest`)
/// carry no concrete version and are skipped.
pub const PACKAGE_JSON: LinePattern = LinePattern {
    format: Format::Npm,
    pattern: r#"^\s*"([^"]+)"\s*:\s*"[\^~]?(\d+(?:\.\d+)+)""#,
    fields: &[Field::Name, Field::Version],
    normalize: None,
};
