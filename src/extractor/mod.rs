//! Per-ecosystem extraction of added dependency coordinates from manifest diffs.
//!
//! Single-line ecosystems are declared as a [`LinePattern`]: a regex plus the
//! fields its capture groups fill. Maven and Gradle need state across lines and
//! live in [`java`].

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::diff::{self, DiffLine};
use crate::models::{ChangedFile, Component, Format, Locations, ManifestExtraction};

pub mod dotnet;
pub mod golang;
pub mod java;
pub mod node;
pub mod python;
pub mod ruby;

pub trait Extractor {
    fn extract(&self, lines: &[DiffLine<'_>]) -> Result<Locations>;
}

/// Component field filled by a capture group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Group,
    Name,
    Version,
}

/// Regex-driven extractor for ecosystems that declare one dependency per line.
///
/// Capture group `n` fills `fields[n - 1]`. Only added lines are considered and
/// only the first match on a line counts.
pub struct LinePattern {
    pub format: Format,
    pub pattern: &'static str,
    pub fields: &'static [Field],
    pub normalize: Option<fn(&mut Component)>,
}

impl LinePattern {
    fn compile(&self) -> Result<Regex> {
        Regex::new(self.pattern)
            .with_context(|| format!("invalid {} line pattern", self.format))
    }

    fn component(&self, caps: &Captures<'_>) -> Option<Component> {
        let mut component = Component::new(self.format.clone(), "", "", "");

        for (i, field) in self.fields.iter().enumerate() {
            let value = caps.get(i + 1)?.as_str().trim().to_string();
            match field {
                Field::Group => component.group = value,
                Field::Name => component.name = value,
                Field::Version => component.version = value,
            }
        }

        if component.name.is_empty() || component.version.is_empty() {
            return None;
        }

        if let Some(normalize) = self.normalize {
            normalize(&mut component);
        }

        Some(component)
    }
}

impl Extractor for LinePattern {
    fn extract(&self, lines: &[DiffLine<'_>]) -> Result<Locations> {
        let re = self.compile()?;
        let mut found = Locations::new();

        for (location, text) in diff::additions(lines) {
            let Some(caps) = re.captures(text) else {
                continue;
            };
            if let Some(component) = self.component(&caps) {
                found.insert(location, component);
            }
        }

        Ok(found)
    }
}

/// Pick the extractor for a changed file, by exact match on its final path
/// component.
pub fn extractor_for(filename: &str) -> Option<Box<dyn Extractor>> {
    let name = filename.rsplit('/').next().unwrap_or(filename);

    let extractor: Box<dyn Extractor> = match name {
        "package.json" => Box::new(node::PACKAGE_JSON),
        "packages.config" => Box::new(dotnet::PACKAGES_CONFIG),
        "requirements.txt" => Box::new(python::REQUIREMENTS_TXT),
        "go.mod" | "go.sum" => Box::new(golang::GO_MODULE),
        "Gemfile" => Box::new(ruby::GEMFILE),
        "pom.xml" => Box::new(java::MavenExtractor::new()),
        "build.gradle" => Box::new(java::GradleExtractor::new()),
        _ => return None,
    };

    Some(extractor)
}

/// Extract the added components of every supported manifest in `files`.
///
/// Unsupported files are skipped. A manifest whose extraction fails is logged
/// and left out; it never stops the remaining files from being processed.
pub fn find_components(files: &[ChangedFile]) -> ManifestExtraction {
    let mut extraction = ManifestExtraction::new();

    for file in files {
        let Some(extractor) = extractor_for(&file.filename) else {
            debug!(filename = %file.filename, "not a supported manifest");
            continue;
        };

        let lines = diff::walk(&file.patch);
        match extractor.extract(&lines) {
            Ok(components) if components.is_empty() => {
                debug!(filename = %file.filename, "manifest change adds no components");
            }
            Ok(components) => {
                debug!(
                    filename = %file.filename,
                    components = components.len(),
                    "extracted components from manifest"
                );
                extraction.insert(file.clone(), components);
            }
            Err(err) => {
                warn!(filename = %file.filename, error = %err, "could not read manifest changes");
            }
        }
    }

    extraction
}
