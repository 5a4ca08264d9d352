//! Package-URL synthesis and parsing for [`Component`].
//!
//! Only the coordinate (type, namespace, name, version) survives a round trip;
//! qualifiers and subpaths are fixed per ecosystem on the way out and dropped
//! on the way in.

use anyhow::{anyhow, bail, Result};

use crate::models::{Component, Format};

impl Component {
    /// Package URL used to query the policy engine.
    ///
    /// Returns an empty string for formats that cannot be evaluated.
    pub fn purl(&self) -> String {
        match self.format {
            Format::Npm => format!("pkg:npm/{}@{}", self.name, self.version),
            Format::Nuget => format!("pkg:nuget/{}@{}", self.name, self.version),
            Format::Pypi => format!("pkg:pypi/{}@{}?extension=tar.gz", self.name, self.version),
            Format::Maven => format!(
                "pkg:maven/{}/{}@{}?type=jar",
                self.group, self.name, self.version
            ),
            Format::Golang => format!("pkg:golang/{}@{}", self.name, self.version),
            Format::Ruby => format!("pkg:gem/{}@{}?platform=ruby", self.name, self.version),
            Format::Other(_) => String::new(),
        }
    }

    /// Parse a package URL back into a canonical component.
    ///
    /// Maven keeps its namespace as the group. Every other ecosystem folds the
    /// namespace into the name (`@scope/pkg`, `github.com/org/module`).
    pub fn from_purl(purl: &str) -> Result<Component> {
        let rest = purl
            .strip_prefix("pkg:")
            .ok_or_else(|| anyhow!("package URL must start with `pkg:`: {}", purl))?
            .trim_start_matches('/');

        let rest = rest.split('#').next().unwrap_or(rest);
        let rest = rest.split('?').next().unwrap_or(rest);

        let (ty, path) = rest
            .split_once('/')
            .ok_or_else(|| anyhow!("package URL has no name: {}", purl))?;
        let (path, version) = path
            .rsplit_once('@')
            .ok_or_else(|| anyhow!("package URL has no version: {}", purl))?;

        if version.is_empty() || version.contains('/') {
            bail!("package URL has no version: {}", purl);
        }

        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(percent_decode)
            .collect();

        let Some((name, namespace)) = segments.split_last() else {
            bail!("package URL has no name: {}", purl);
        };

        let format = Format::from(ty);
        let (group, name) = match format {
            Format::Maven => (namespace.join("/"), name.clone()),
            _ => (String::new(), segments.join("/")),
        };

        Ok(Component::new(format, group, name, percent_decode(version)))
    }
}

fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}
