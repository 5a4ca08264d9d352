//! Review comments for remediations, and the sinks that receive them.
//!
//! - [`render_comment`] turns a replacement component into host-agnostic
//!   markdown.
//! - [`CommentSink`] is whatever posts the comment; it gets both coordinates
//!   of the [`ChangeLocation`] and picks the one its host anchors on.
//! - [`terminal`] prints extraction and remediation tables, [`json`] the same
//!   data for machines.

use anyhow::Result;
use serde::Serialize;
use tracing::warn;

use crate::models::{ChangeLocation, Component, Format, RemediationResult};

pub mod json;
pub mod terminal;

/// Registry page for a component version; empty for unknown formats.
pub fn href(c: &Component) -> String {
    match c.format {
        Format::Npm => format!("https://www.npmjs.com/package/{}/v/{}", c.name, c.version),
        Format::Maven => format!(
            "https://search.maven.org/artifact/{}/{}/{}/jar",
            c.group, c.name, c.version
        ),
        Format::Nuget => format!("https://www.nuget.org/packages/{}/{}", c.name, c.version),
        Format::Pypi => format!("https://pypi.org/project/{}/{}", c.name, c.version),
        Format::Golang => format!("https://{}/releases/tag/{}", c.name, c.version),
        Format::Ruby => format!("https://rubygems.org/gems/{}/versions/{}", c.name, c.version),
        Format::Other(_) => String::new(),
    }
}

/// Review comment recommending `c` as the replacement.
pub fn render_comment(c: &Component) -> String {
    format!(
        "[Nexus Lifecycle](https://www.sonatype.com/product-nexus-lifecycle) has found that this version of `{name}` violates your company's policies.\n\n\
         Lifecycle recommends using version [{version}]({href}) instead as it does not violate any policies.\n\n",
        name = c.name,
        version = c.version,
        href = href(c),
    )
}

/// Receives rendered review comments.
pub trait CommentSink {
    fn add_comment(&mut self, filename: &str, location: &ChangeLocation, body: &str) -> Result<()>;
}

impl<F> CommentSink for F
where
    F: FnMut(&str, &ChangeLocation, &str) -> Result<()>,
{
    fn add_comment(&mut self, filename: &str, location: &ChangeLocation, body: &str) -> Result<()> {
        self(filename, location, body)
    }
}

/// A comment as handed to a sink, kept for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedComment {
    pub filename: String,
    pub position: u64,
    pub line: u64,
    pub body: String,
}

impl CommentSink for Vec<RenderedComment> {
    fn add_comment(&mut self, filename: &str, location: &ChangeLocation, body: &str) -> Result<()> {
        self.push(RenderedComment {
            filename: filename.to_string(),
            position: location.position,
            line: location.line,
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Render every remediation and hand it to `sink`.
///
/// A failing sink call is logged and does not stop the remaining comments.
/// Returns how many comments the sink accepted.
pub fn post_remediations<S>(remediations: &RemediationResult, sink: &mut S) -> usize
where
    S: CommentSink + ?Sized,
{
    let mut posted = 0;

    for (file, components) in remediations {
        for (location, component) in components {
            let body = render_comment(component);
            match sink.add_comment(&file.filename, location, &body) {
                Ok(()) => posted += 1,
                Err(err) => warn!(
                    filename = %file.filename,
                    position = location.position,
                    error = %err,
                    "could not add comment"
                ),
            }
        }
    }

    posted
}
