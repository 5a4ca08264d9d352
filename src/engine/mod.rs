//! Policy engine boundary.
//!
//! The resolver only talks to [`PolicyEngine`]; [`iq`] implements it over the
//! Nexus IQ REST API.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::models::{Component, Format};

pub mod iq;

/// Policy evaluation stage the remediation is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Develop,
    #[default]
    Build,
    StageRelease,
    Release,
    Operate,
}

impl Stage {
    /// Stage identifier as the engine's API expects it.
    pub fn id(&self) -> &'static str {
        match self {
            Stage::Develop => "develop",
            Stage::Build => "build",
            Stage::StageRelease => "stage-release",
            Stage::Release => "release",
            Stage::Operate => "operate",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// One remediation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemediationQuery<'a> {
    pub package_url: &'a str,
    pub stage: Stage,
    pub application: &'a str,
}

/// Component as the engine reports it: structured coordinates, a package URL,
/// or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineComponent {
    #[serde(default)]
    pub package_url: Option<String>,
    #[serde(default)]
    pub component_identifier: Option<ComponentIdentifier>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ComponentIdentifier {
    pub format: String,
    /// Keys differ per ecosystem (`groupId`/`artifactId`, `packageId`, `name`).
    #[serde(default)]
    pub coordinates: BTreeMap<String, Option<String>>,
}

impl ComponentIdentifier {
    fn coordinate(&self, key: &str) -> Option<&str> {
        self.coordinates
            .get(key)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }

    fn to_component(&self) -> Option<Component> {
        let name = self
            .coordinate("artifactId")
            .or_else(|| self.coordinate("packageId"))
            .or_else(|| self.coordinate("name"))?;
        let version = self.coordinate("version")?;
        let group = self.coordinate("groupId").unwrap_or_default();

        Some(Component::new(
            Format::from(self.format.as_str()),
            group,
            name,
            version,
        ))
    }
}

impl EngineComponent {
    /// Canonical component, preferring structured coordinates over the
    /// package URL.
    pub fn to_component(&self) -> Result<Component> {
        if let Some(component) = self
            .component_identifier
            .as_ref()
            .and_then(ComponentIdentifier::to_component)
        {
            return Ok(component);
        }

        match self.package_url.as_deref() {
            Some(purl) if !purl.is_empty() => Component::from_purl(purl),
            _ => bail!("engine component has neither usable coordinates nor a package URL"),
        }
    }
}

#[async_trait]
pub trait PolicyEngine: Send + Sync {
    /// The "no violations" alternative for the queried component, if the
    /// engine knows one.
    async fn remediation(&self, query: &RemediationQuery<'_>) -> Result<Option<EngineComponent>>;
}
