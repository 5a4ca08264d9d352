use std::borrow::Cow;

use anyhow::{Context, Result};
use quick_xml::escape::unescape;
use regex::Regex;

use crate::diff::{DiffLine, LineKind};
use crate::models::{ChangeLocation, Component, Format, Locations};

use super::{Extractor, Field, LinePattern};

/// `<tag>value</tag>` on a single line.
const TAG_LINE: &str = r"^\s*<([A-Za-z][\w.\-]*)>\s*([^<]*?)\s*</([A-Za-z][\w.\-]*)>\s*$";

/// Extractor for `pom.xml` diffs.
///
/// A `<dependency>` block is reported only when its `<version>` line was added,
/// at the location of that line. Group and artifact may come from unchanged
/// context lines of the same block.
#[derive(Debug, Default)]
pub struct MavenExtractor;

impl MavenExtractor {
    /// Create a new `MavenExtractor`.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug)]
enum State {
    Idle,
    InDependency(Pending),
}

/// The dependency block currently being read.
#[derive(Debug, Default)]
struct Pending {
    group_id: String,
    artifact_id: String,
    version: String,
    version_at: Option<ChangeLocation>,
    new_version: bool,
    in_exclusions: bool,
}

/// `text` with any `<!-- ... -->` removed; an unterminated comment runs to
/// the end of the line.
fn strip_xml_comments(text: &str) -> Cow<'_, str> {
    if !text.contains("<!--") {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        match rest[start + 4..].find("-->") {
            Some(end) => rest = &rest[start + 4 + end + 3..],
            None => rest = "",
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

impl Pending {
    fn observe(&mut self, line: &DiffLine<'_>, text: &str, tag_line: &Regex) {
        match text {
            "<exclusions>" => self.in_exclusions = true,
            "</exclusions>" => self.in_exclusions = false,
            _ => {}
        }
        if self.in_exclusions {
            return;
        }

        let Some(caps) = tag_line.captures(text) else {
            return;
        };
        if caps[1] != caps[3] {
            return;
        }

        let value = unescape(&caps[2])
            .unwrap_or(Cow::Borrowed(&caps[2]))
            .into_owned();

        match &caps[1] {
            "groupId" => self.group_id = value,
            "artifactId" => self.artifact_id = value,
            "version" => {
                self.version = value;
                self.version_at = Some(line.location);
                self.new_version = line.kind == LineKind::Added;
            }
            _ => {}
        }
    }

    fn flush_into(self, found: &mut Locations) {
        if !self.new_version || self.artifact_id.is_empty() || self.version.is_empty() {
            return;
        }
        if let Some(at) = self.version_at {
            found.insert(
                at,
                Component::new(Format::Maven, self.group_id, self.artifact_id, self.version),
            );
        }
    }
}

impl Extractor for MavenExtractor {
    fn extract(&self, lines: &[DiffLine<'_>]) -> Result<Locations> {
        let tag_line = Regex::new(TAG_LINE).context("invalid pom.xml tag pattern")?;
        let mut found = Locations::new();
        let mut state = State::Idle;

        for line in lines {
            match line.kind {
                // Removed lines are not part of the new file.
                LineKind::Removed | LineKind::Meta => continue,
                LineKind::HunkHeader => {
                    if let State::InDependency(pending) = state {
                        pending.flush_into(&mut found);
                    }
                    state = State::Idle;
                    continue;
                }
                LineKind::Added | LineKind::Context => {}
            }

            let cleaned = strip_xml_comments(line.text);
            let text = cleaned.trim();
            state = match state {
                State::Idle if text == "<dependency>" => State::InDependency(Pending::default()),
                State::Idle => State::Idle,
                State::InDependency(pending) if text == "</dependency>" => {
                    pending.flush_into(&mut found);
                    State::Idle
                }
                State::InDependency(pending) if text == "<dependency>" => {
                    pending.flush_into(&mut found);
                    State::InDependency(Pending::default())
                }
                State::InDependency(mut pending) => {
                    pending.observe(line, text, &tag_line);
                    State::InDependency(pending)
                }
            };
        }

        if let State::InDependency(pending) = state {
            pending.flush_into(&mut found);
        }

        Ok(found)
    }
}

/// Legacy map notation: `implementation group: 'g', name: 'n', version: 'v'`.
const GRADLE_MAP: LinePattern = LinePattern {
    format: Format::Maven,
    pattern: r#"group\s*:\s*['"]([^'"]+)['"]\s*,\s*name\s*:\s*['"]([^'"]+)['"]\s*,\s*version\s*:\s*['"]([^'"]+)['"]"#,
    fields: &[Field::Group, Field::Name, Field::Version],
    normalize: None,
};

/// Short notation: `implementation 'g:n:v'` or `implementation("g:n:v")`.
const GRADLE_SHORT: LinePattern = LinePattern {
    format: Format::Maven,
    pattern: r#"^\s*[A-Za-z]\w*\s*\(?\s*['"]([^:'"\s]+):([^:'"\s]+):([^:'"\s@]+)(?:@[^'"]*)?['"]\s*\)?"#,
    fields: &[Field::Group, Field::Name, Field::Version],
    normalize: None,
};

/// Extractor for `build.gradle` diffs.
///
/// Runs both notations over the added lines. When both match the same line
/// the map notation wins.
#[derive(Debug, Default)]
pub struct GradleExtractor;

impl GradleExtractor {
    /// Create a new `GradleExtractor`.
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for GradleExtractor {
    fn extract(&self, lines: &[DiffLine<'_>]) -> Result<Locations> {
        let mut found = GRADLE_MAP.extract(lines)?;
        for (location, component) in GRADLE_SHORT.extract(lines)? {
            found.entry(location).or_insert(component);
        }
        Ok(found)
    }
}
