use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EngineComponent, PolicyEngine, RemediationQuery};
use crate::config::EngineConfig;

const USER_AGENT: &str = concat!("manifest-remediator/", env!("CARGO_PKG_VERSION"));

/// Version change type carrying the nearest version without policy violations.
const NEXT_NO_VIOLATIONS: &str = "next-no-violations";

/// Nexus IQ Server client.
///
/// Every query resolves the application's internal id and then asks for the
/// component's remediation at the requested stage. Nothing is cached.
pub struct IqClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct ApplicationList {
    #[serde(default)]
    applications: Vec<Application>,
}

#[derive(Debug, Deserialize)]
struct Application {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RemediationRequest<'a> {
    package_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct RemediationResponse {
    remediation: Remediation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Remediation {
    #[serde(default)]
    version_changes: Vec<VersionChange>,
}

#[derive(Debug, Deserialize)]
struct VersionChange {
    #[serde(rename = "type")]
    kind: String,
    data: VersionChangeData,
}

#[derive(Debug, Deserialize)]
struct VersionChangeData {
    component: EngineComponent,
}

impl RemediationResponse {
    fn into_no_violations(self) -> Option<EngineComponent> {
        self.remediation
            .version_changes
            .into_iter()
            .find(|change| change.kind == NEXT_NO_VIOLATIONS)
            .map(|change| change.data.component)
    }
}

impl IqClient {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let base_url = config
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| anyhow!("no policy engine URL configured"))?
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("could not build policy engine HTTP client")?;

        Ok(IqClient {
            client,
            base_url,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    async fn application_id(&self, public_id: &str) -> Result<String> {
        let url = format!("{}/api/v2/applications", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("publicId", public_id)])
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .with_context(|| format!("could not look up application {}", public_id))?;

        if !response.status().is_success() {
            bail!(
                "application lookup for {} returned {}",
                public_id,
                response.status()
            );
        }

        let list: ApplicationList = response.json().await?;
        list.applications
            .into_iter()
            .next()
            .map(|app| app.id)
            .ok_or_else(|| anyhow!("no application with public id {}", public_id))
    }
}

#[async_trait]
impl PolicyEngine for IqClient {
    async fn remediation(&self, query: &RemediationQuery<'_>) -> Result<Option<EngineComponent>> {
        let app_id = self.application_id(query.application).await?;
        let url = format!(
            "{}/api/v2/components/remediation/application/{}",
            self.base_url, app_id
        );

        debug!(url = %url, package_url = query.package_url, stage = %query.stage, "requesting remediation");

        let response = self
            .client
            .post(&url)
            .query(&[("stageId", query.stage.id())])
            .basic_auth(&self.username, Some(&self.password))
            .json(&RemediationRequest {
                package_url: query.package_url,
            })
            .send()
            .await
            .with_context(|| format!("remediation request for {} failed", query.package_url))?;

        if !response.status().is_success() {
            bail!(
                "remediation request for {} returned {}",
                query.package_url,
                response.status()
            );
        }

        let body: RemediationResponse = response
            .json()
            .await
            .context("unexpected remediation response")?;

        Ok(body.into_no_violations())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Component, Format};

    #[test]
    fn test_picks_no_violations_change() {
        let json = r#"{
  "remediation": {
    "versionChanges": [
      {
        "type": "next-non-failing",
        "data": { "component": { "packageUrl": "pkg:npm/chalk@2.0.0" } }
      },
      {
        "type": "next-no-violations",
        "data": {
          "component": {
            "packageUrl": "pkg:npm/chalk@2.4.2",
            "componentIdentifier": {
              "format": "npm",
              "coordinates": { "packageId": "chalk", "version": "2.4.2" }
            },
            "hash": null
          }
        }
      }
    ]
  }
}"#;
        let response: RemediationResponse = serde_json::from_str(json).unwrap();
        let component = response.into_no_violations().unwrap();
        assert_eq!(
            component.to_component().unwrap(),
            Component::new(Format::Npm, "", "chalk", "2.4.2")
        );
    }

    #[test]
    fn test_no_version_changes() {
        let response: RemediationResponse =
            serde_json::from_str(r#"{ "remediation": { "versionChanges": [] } }"#).unwrap();
        assert!(response.into_no_violations().is_none());

        let response: RemediationResponse =
            serde_json::from_str(r#"{ "remediation": {} }"#).unwrap();
        assert!(response.into_no_violations().is_none());
    }

    #[test]
    fn test_application_list() {
        let list: ApplicationList = serde_json::from_str(
            r#"{ "applications": [ { "id": "4bb67dcfc86344e3a483832f8c496419", "publicId": "my-app", "name": "My App" } ] }"#,
        )
        .unwrap();
        assert_eq!(list.applications[0].id, "4bb67dcfc86344e3a483832f8c496419");
    }

    #[test]
    fn test_client_requires_url() {
        let config = EngineConfig::default();
        assert!(IqClient::new(&config).is_err());

        let config = EngineConfig {
            url: Some("http://localhost:8070/".to_string()),
            ..EngineConfig::default()
        };
        let client = IqClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8070");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(RemediationRequest {
            package_url: "pkg:npm/chalk@1.0.0",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "packageUrl": "pkg:npm/chalk@1.0.0" }));
    }
}
