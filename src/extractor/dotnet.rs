use std::borrow::Cow;

use quick_xml::escape::unescape;

use crate::models::{Component, Format};

use super::{Field, LinePattern};

/// Legacy NuGet `packages.config` entries:
/// `<package id="Newtonsoft.Json" version="13.0.1" targetFramework="net452" />`.
pub const PACKAGES_CONFIG: LinePattern = LinePattern {
    format: Format::Nuget,
    pattern: r#"<package\s+id\s*=\s*"([^"]+)"\s+version\s*=\s*"([^"]+)""#,
    fields: &[Field::Name, Field::Version],
    normalize: Some(unescape_attributes),
};

fn unescape_attributes(component: &mut Component) {
    component.name = unescape_or_raw(&component.name);
    component.version = unescape_or_raw(&component.version);
}

fn unescape_or_raw(value: &str) -> String {
    unescape(value)
        .unwrap_or(Cow::Borrowed(value))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::walk;
    use crate::extractor::Extractor;

    #[test]
    fn test_packages_config() {
        let patch = r#"@@ -1,4 +1,4 @@
 <packages>
-  <package id="Newtonsoft.Json" version="12.0.3" targetFramework="net452" />
+  <package id="Newtonsoft.Json" version="13.0.1" targetFramework="net452" />
   <package id="NUnit" version="3.13.3" targetFramework="net452" />
 </packages>"#;
        let found = PACKAGES_CONFIG.extract(&walk(patch)).unwrap();
        assert_eq!(found.len(), 1);
        let (location, component) = found.into_iter().next().unwrap();
        assert_eq!(location.position, 3);
        assert_eq!(location.line, 2);
        assert_eq!(component, Component::new(Format::Nuget, "", "Newtonsoft.Json", "13.0.1"));
    }

    #[test]
    fn test_entities_unescaped() {
        let patch = "@@ -0,0 +1 @@\n+<package id=\"A&amp;B\" version=\"1.0.0\" />";
        let found = PACKAGES_CONFIG.extract(&walk(patch)).unwrap();
        assert_eq!(found.values().next().map(|c| c.name.as_str()), Some("A&B"));
    }
}
