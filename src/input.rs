//! Reading the changed-file list of one request.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::InputFormat;
use crate::diff::split_git_diff;
use crate::models::ChangedFile;

/// Load changed files from `path`, or from stdin when `path` is `-`.
pub fn load_changed_files(path: &Path, format: InputFormat) -> Result<Vec<ChangedFile>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("could not read changed files from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("could not read changed files from {}", path.display()))?
    };

    parse_changed_files(&content, format)
        .with_context(|| format!("invalid changed files in {}", path.display()))
}

/// Parse a host's file list (JSON) or a raw multi-file diff.
pub fn parse_changed_files(content: &str, format: InputFormat) -> Result<Vec<ChangedFile>> {
    let format = match format {
        InputFormat::Auto if content.trim_start().starts_with('[') => InputFormat::Json,
        InputFormat::Auto => InputFormat::Diff,
        explicit => explicit,
    };

    match format {
        InputFormat::Json => {
            serde_json::from_str(content).context("expected a JSON array of {filename, patch}")
        }
        _ => {
            let files = split_git_diff(content);
            if files.is_empty() && !content.trim().is_empty() {
                bail!("no file sections found in diff");
            }
            Ok(files)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HOST_FILES: &str = r#"[
  {
    "sha": "bbcd538c8e72b8c175046e27cc8f907076331401",
    "filename": "package.json",
    "status": "modified",
    "additions": 1,
    "patch": "@@ -1,3 +1,4 @@\n {\n+  \"chalk\": \"^1.0.0\",\n   \"cors\": \"^2.8.5\"\n }"
  },
  { "filename": "logo.png", "status": "added" }
]"#;

    const GIT_DIFF: &str = "diff --git a/requirements.txt b/requirements.txt
index 3f1c2a1..9d0e4b7 100644
--- a/requirements.txt
+++ b/requirements.txt
@@ -1,2 +1,2 @@
-requests==2.28.1
+requests==2.31.0
 flask==2.2.2
";

    #[test]
    fn test_host_json() {
        let files = parse_changed_files(HOST_FILES, InputFormat::Auto).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "package.json");
        assert!(files[0].patch.contains("chalk"));
        // binary files come without a patch
        assert_eq!(files[1].patch, "");
    }

    #[test]
    fn test_git_diff() {
        let files = parse_changed_files(GIT_DIFF, InputFormat::Auto).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "requirements.txt");
        assert!(files[0].patch.starts_with("@@ -1,2 +1,2 @@"));
    }

    #[test]
    fn test_forced_format_mismatch() {
        assert!(parse_changed_files(GIT_DIFF, InputFormat::Json).is_err());
        assert!(parse_changed_files("just some text\n", InputFormat::Diff).is_err());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_changed_files("", InputFormat::Auto).unwrap().is_empty());
        assert!(parse_changed_files("[]", InputFormat::Auto).unwrap().is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{}", GIT_DIFF).unwrap();
        let files = load_changed_files(f.path(), InputFormat::Auto).unwrap();
        assert_eq!(files[0].filename, "requirements.txt");

        assert!(load_changed_files(Path::new("/no/such/diff"), InputFormat::Auto).is_err());
    }
}
