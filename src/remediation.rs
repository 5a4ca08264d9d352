//! Matching extracted components against the policy engine.

use futures::future::join_all;
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::engine::{PolicyEngine, RemediationQuery, Stage};
use crate::models::{
    ChangeLocation, ChangedFile, Component, ManifestExtraction, RemediationResult,
};

/// Fixed inputs shared by every query of one request.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions<'a> {
    pub application: &'a str,
    pub stage: Stage,
    /// Queries in flight at once; values below 1 are treated as 1.
    pub batch_size: usize,
}

/// Look up a policy-compliant replacement for every extracted component.
///
/// A location is kept only when the engine answered with a parseable
/// component whose version differs from the one in the diff. Engine failures
/// are logged and skipped. Files without a surviving location are absent.
pub async fn resolve<E>(
    engine: &E,
    options: &ResolveOptions<'_>,
    extraction: &ManifestExtraction,
    progress: Option<&ProgressBar>,
) -> RemediationResult
where
    E: PolicyEngine + ?Sized,
{
    let pending: Vec<(&ChangedFile, ChangeLocation, &Component)> = extraction
        .iter()
        .flat_map(|(file, components)| {
            components
                .iter()
                .map(move |(location, component)| (file, *location, component))
        })
        .collect();

    let mut remediations = RemediationResult::new();

    for batch in pending.chunks(options.batch_size.max(1)) {
        let lookups = batch
            .iter()
            .map(|(_, _, component)| remediate(engine, options, component));
        let outcomes = join_all(lookups).await;

        for ((file, location, _), outcome) in batch.iter().zip(outcomes) {
            if let Some(remediated) = outcome {
                remediations
                    .entry((*file).clone())
                    .or_default()
                    .insert(*location, remediated);
            }
            if let Some(pb) = progress {
                pb.inc(1);
            }
        }
    }

    remediations
}

async fn remediate<E>(
    engine: &E,
    options: &ResolveOptions<'_>,
    component: &Component,
) -> Option<Component>
where
    E: PolicyEngine + ?Sized,
{
    let package_url = component.purl();
    if package_url.is_empty() {
        debug!(component = %component, format = %component.format, "format cannot be evaluated");
        return None;
    }

    let query = RemediationQuery {
        package_url: &package_url,
        stage: options.stage,
        application: options.application,
    };

    let found = match engine.remediation(&query).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            debug!(package_url = %package_url, "no remediation available");
            return None;
        }
        Err(err) => {
            warn!(
                package_url = %package_url,
                error = %format_args!("{:#}", err),
                "could not evaluate component"
            );
            return None;
        }
    };

    let remediated = match found.to_component() {
        Ok(remediated) => remediated,
        Err(err) => {
            warn!(package_url = %package_url, error = %err, "could not read remediating component");
            return None;
        }
    };

    if remediated.version == component.version {
        debug!(package_url = %package_url, "remediation keeps the current version");
        return None;
    }

    info!(
        package_url = %package_url,
        suggested = %remediated.version,
        "found remediation"
    );
    Some(remediated)
}
