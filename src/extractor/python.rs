use crate::models::Format;

use super::{Field, LinePattern};

/// Pinned `requirements.txt` lines: `name==version`.
///
/// Extras (`name[extra]`), environment markers (`; python_version ...`) and
/// trailing `#` comments are not part of the coordinate.
pub const REQUIREMENTS_TXT: LinePattern = LinePattern {
    format: Format::Pypi,
    pattern: r"^\s*([A-Za-z0-9][A-Za-z0-9._\-]*)(?:\[[^\]]*\])?\s*==\s*([^\s#;,]+)",
    fields: &[Field::Name, Field::Version],
    normalize: None,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::walk;
    use crate::extractor::Extractor;
    use crate::models::Component;

    #[test]
    fn test_requirements_txt() {
        let patch = "@@ -1,2 +1,6 @@
 # runtime deps
+requests==2.28.1
+flask>=2.0.0
+numpy==1.24.0 ; python_version >= '3.8'
+urllib3[socks]==1.26.15   # pinned for proxies
+-r dev.txt
 click==8.1.3";
        let found: Vec<_> = REQUIREMENTS_TXT
            .extract(&walk(patch))
            .unwrap()
            .into_values()
            .collect();
        assert_eq!(
            found,
            vec![
                Component::new(Format::Pypi, "", "requests", "2.28.1"),
                Component::new(Format::Pypi, "", "numpy", "1.24.0"),
                Component::new(Format::Pypi, "", "urllib3", "1.26.15"),
            ]
        );
    }
}
