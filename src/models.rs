use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Ecosystem tag carried by every [`Component`].
///
/// `Other` holds tags reported by the policy engine for ecosystems this tool
/// does not extract; such components cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub enum Format {
    Npm,
    Nuget,
    Pypi,
    Maven,
    Golang,
    Ruby,
    Other(String),
}

impl Format {
    pub fn as_str(&self) -> &str {
        match self {
            Format::Npm => "npm",
            Format::Nuget => "nuget",
            Format::Pypi => "pypi",
            Format::Maven => "maven",
            Format::Golang => "golang",
            Format::Ruby => "ruby",
            Format::Other(tag) => tag,
        }
    }
}

impl From<&str> for Format {
    fn from(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "npm" => Format::Npm,
            "nuget" => Format::Nuget,
            "pypi" => Format::Pypi,
            "maven" => Format::Maven,
            "golang" => Format::Golang,
            // package URLs and the policy engine call Ruby gems "gem"
            "ruby" | "gem" => Format::Ruby,
            other => Format::Other(other.to_string()),
        }
    }
}

impl From<Format> for String {
    fn from(format: Format) -> Self {
        format.as_str().to_string()
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A canonical dependency coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Component {
    pub format: Format,
    /// Empty for ecosystems without a group (everything except Maven).
    pub group: String,
    pub name: String,
    pub version: String,
}

impl Component {
    pub fn new(
        format: Format,
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Component {
            format,
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}@{}", self.name, self.version)
        } else {
            write!(f, "{}:{}@{}", self.group, self.name, self.version)
        }
    }
}

/// Where a line sits inside one file's patch.
///
/// `position` counts every visited patch line (hunk headers included) and is
/// what position-anchored review APIs expect. `line` is the line number in the
/// new version of the file; removed lines never advance it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangeLocation {
    pub position: u64,
    pub line: u64,
}

/// One changed file of a pull/merge request together with its unified diff.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    /// Hosts omit the patch for binary or oversized files.
    #[serde(default)]
    pub patch: String,
}

impl ChangedFile {
    pub fn new(filename: impl Into<String>, patch: impl Into<String>) -> Self {
        ChangedFile {
            filename: filename.into(),
            patch: patch.into(),
        }
    }
}

/// Components found in one file, keyed by where they were found.
pub type Locations = BTreeMap<ChangeLocation, Component>;

/// Every component found across the changed files of one request.
pub type ManifestExtraction = BTreeMap<ChangedFile, Locations>;

/// Replacement components chosen by the policy engine, same shape as
/// [`ManifestExtraction`].
pub type RemediationResult = BTreeMap<ChangedFile, Locations>;
