use crate::models::{Component, Format};

use super::{Field, LinePattern};

/// `Gemfile` declarations with a version: `gem 'rails', '~> 5.2'`.
pub const GEMFILE: LinePattern = LinePattern {
    format: Format::Ruby,
    pattern: r#"^\s*gem\s+['"]([^'"]+)['"]\s*,\s*['"]\s*(?:[~><=!]+\s*)?([0-9][0-9A-Za-z.\-]*)[^'"]*['"]"#,
    fields: &[Field::Name, Field::Version],
    normalize: Some(fill_component_version),
};

fn fill_component_version(component: &mut Component) {
    component.version = fill_version(&component.version);
}

/// Pad a dotted numeric version to major.minor.patch: `1` → `1.0.0`,
/// `1.2` → `1.2.0`. Prereleases such as `6.1.0.rc1` are left as written.
pub fn fill_version(version: &str) -> String {
    if !version.split('.').all(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())) {
        return version.to_string();
    }
    let segments = version.split('.').count();
    let mut filled = version.to_string();
    for _ in segments..3 {
        filled.push_str(".0");
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::walk;
    use crate::extractor::Extractor;

    #[test]
    fn test_fill_version() {
        assert_eq!(fill_version("1"), "1.0.0");
        assert_eq!(fill_version("1.2"), "1.2.0");
        assert_eq!(fill_version("1.2.3"), "1.2.3");
        assert_eq!(fill_version("1.2.3.4"), "1.2.3.4");
        assert_eq!(fill_version("6.1.0.rc1"), "6.1.0.rc1");
        assert_eq!(fill_version("7.0.beta2"), "7.0.beta2");
    }

    #[test]
    fn test_gemfile() {
        let patch = r#"@@ -1,3 +1,6 @@
 source 'https://rubygems.org'
+gem 'doorkeeper', '~> 4.5'
+gem "rails", ">= 5"
+gem 'pg', '1.1.4'
+gem 'puma'
 gem 'bootsnap', require: false"#;
        let found: Vec<_> = GEMFILE
            .extract(&walk(patch))
            .unwrap()
            .into_values()
            .collect();
        assert_eq!(
            found,
            vec![
                Component::new(Format::Ruby, "", "doorkeeper", "4.5.0"),
                Component::new(Format::Ruby, "", "rails", "5.0.0"),
                Component::new(Format::Ruby, "", "pg", "1.1.4"),
            ]
        );
    }

    #[test]
    fn test_prerelease_version_kept_whole() {
        let patch = r#"@@ -1,2 +1,3 @@
 source 'https://rubygems.org'
+gem 'rails', '6.1.0.rc1'
+gem 'sidekiq', '~> 7.0.beta2'
 gem 'pg'"#;
        let found: Vec<_> = GEMFILE
            .extract(&walk(patch))
            .unwrap()
            .into_values()
            .collect();
        assert_eq!(
            found,
            vec![
                Component::new(Format::Ruby, "", "rails", "6.1.0.rc1"),
                Component::new(Format::Ruby, "", "sidekiq", "7.0.beta2"),
            ]
        );
    }
}
