use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use super::{href, RenderedComment};
use crate::models::{ManifestExtraction, RemediationResult};

/// Everything one run produced, as the terminal report sees it.
pub struct Summary<'a> {
    /// Number of changed files read from the input.
    pub files: usize,
    pub extraction: &'a ManifestExtraction,
    /// `None` when remediation was not attempted (`--extract-only`).
    pub remediations: Option<&'a RemediationResult>,
    pub comments: &'a [RenderedComment],
}

/// Render a colored terminal report.
pub fn render(summary: &Summary<'_>, verbose: bool, quiet: bool) -> Result<()> {
    let manifests = summary.extraction.len();
    let components: usize = summary.extraction.values().map(|l| l.len()).sum();
    let remediated: usize = summary
        .remediations
        .map(|r| r.values().map(|l| l.len()).sum())
        .unwrap_or(0);

    if quiet {
        match summary.remediations {
            Some(_) => println!(
                "Files: {}  Manifests: {}  Components: {}  Remediations: {}",
                summary.files,
                manifests,
                components,
                remediated.to_string().red(),
            ),
            None => println!(
                "Files: {}  Manifests: {}  Components: {}",
                summary.files, manifests, components,
            ),
        }
        return Ok(());
    }

    println!(
        "\n {} v{}\n",
        "manifest-remediator".bold(),
        env!("CARGO_PKG_VERSION")
    );

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Changed files      : {:>4}", summary.files));
    println!(" │  {:<48} │", format!("Manifests          : {:>4}", manifests));
    println!(" │  {:<48} │", format!("Changed components : {:>4}", components));
    if summary.remediations.is_some() {
        let mark = if remediated > 0 { "✗".red() } else { "✓".green() };
        println!(
            " │  {:<48} │",
            format!("{}  Remediations     : {:>4}", mark, remediated)
        );
    }
    println!(" └────────────────────────────────────────────────────┘\n");

    if (verbose || summary.remediations.is_none()) && components > 0 {
        println!(" {} Changed dependencies:\n", "[FOUND]".cyan().bold());
        render_extraction_table(summary.extraction);
        println!();
    }

    if let Some(remediations) = summary.remediations {
        if remediated > 0 {
            println!(
                " {} Dependencies violating policy:\n",
                "[REMEDIATE]".red().bold()
            );
            render_remediation_table(summary.extraction, remediations);
            println!();
        }
    }

    if verbose {
        for comment in summary.comments {
            println!(
                " {} {} (position {}, line {})\n",
                "→".cyan(),
                comment.filename.bold(),
                comment.position,
                comment.line
            );
            for line in comment.body.lines() {
                println!("   {}", line);
            }
        }
    }

    Ok(())
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).add_attribute(Attribute::Bold))
        .collect()
}

fn render_extraction_table(extraction: &ManifestExtraction) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&[
            "File", "Position", "Line", "Format", "Component", "Version",
        ]));

    for (file, locations) in extraction {
        for (location, component) in locations {
            let name = if component.group.is_empty() {
                component.name.clone()
            } else {
                format!("{}:{}", component.group, component.name)
            };
            table.add_row(vec![
                Cell::new(&file.filename),
                Cell::new(location.position).set_alignment(CellAlignment::Right),
                Cell::new(location.line).set_alignment(CellAlignment::Right),
                Cell::new(component.format.to_string()),
                Cell::new(name),
                Cell::new(&component.version),
            ]);
        }
    }

    println!("{}", table);
}

fn render_remediation_table(extraction: &ManifestExtraction, remediations: &RemediationResult) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&[
            "File", "Line", "Position", "Current", "Suggested", "Link",
        ]));

    for (file, locations) in remediations {
        for (location, suggested) in locations {
            let current = extraction
                .get(file)
                .and_then(|found| found.get(location))
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".to_string());

            table.add_row(vec![
                Cell::new(&file.filename),
                Cell::new(location.line).set_alignment(CellAlignment::Right),
                Cell::new(location.position).set_alignment(CellAlignment::Right),
                Cell::new(current).fg(Color::Red),
                Cell::new(&suggested.version).fg(Color::Green),
                Cell::new(href(suggested)).fg(Color::DarkGrey),
            ]);
        }
    }

    println!("{}", table);
}
