use anyhow::Result;
use serde::Serialize;

use super::RenderedComment;
use crate::models::{Component, ManifestExtraction, RemediationResult};

#[derive(Debug, Serialize)]
struct Found<'a> {
    filename: &'a str,
    position: u64,
    line: u64,
    component: &'a Component,
    purl: String,
}

#[derive(Debug, Serialize)]
struct Remediated<'a> {
    filename: &'a str,
    position: u64,
    line: u64,
    current: Option<&'a Component>,
    suggested: &'a Component,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    extraction: Vec<Found<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remediations: Option<Vec<Remediated<'a>>>,
    #[serde(skip_serializing_if = "no_comments")]
    comments: &'a [RenderedComment],
}

fn no_comments(comments: &&[RenderedComment]) -> bool {
    comments.is_empty()
}

/// Pretty-printed JSON document with one flat entry per location.
pub fn render(
    extraction: &ManifestExtraction,
    remediations: Option<&RemediationResult>,
    comments: &[RenderedComment],
) -> Result<String> {
    let found = extraction
        .iter()
        .flat_map(|(file, locations)| {
            locations.iter().map(move |(location, component)| Found {
                filename: &file.filename,
                position: location.position,
                line: location.line,
                component,
                purl: component.purl(),
            })
        })
        .collect();

    let remediated = remediations.map(|result| {
        result
            .iter()
            .flat_map(|(file, locations)| {
                locations.iter().map(move |(location, suggested)| Remediated {
                    filename: &file.filename,
                    position: location.position,
                    line: location.line,
                    current: extraction.get(file).and_then(|found| found.get(location)),
                    suggested,
                })
            })
            .collect()
    });

    let report = Report {
        extraction: found,
        remediations: remediated,
        comments,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
