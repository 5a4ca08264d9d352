//! Unified-diff walking.
//!
//! [`walk`] tags every line of one file's patch with its [`ChangeLocation`] and
//! [`LineKind`]. [`split_git_diff`] cuts a multi-file `git diff` into the
//! per-file patches a pull-request API would report.

use crate::models::{ChangeLocation, ChangedFile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    HunkHeader,
    Added,
    Removed,
    Context,
    /// File headers before the first hunk and `\ No newline at end of file`.
    Meta,
}

/// One visited patch line. `text` has the `+`/`-`/` ` marker stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffLine<'a> {
    pub location: ChangeLocation,
    pub kind: LineKind,
    pub text: &'a str,
}

/// Walk one file's patch.
///
/// Empty lines are skipped and take no position. Positions start at 0 and
/// grow by one per visited line. The new-file line number advances only on
/// context and added lines; a hunk header rebases it onto the header's
/// `+start` when that does not move it backwards.
pub fn walk(patch: &str) -> Vec<DiffLine<'_>> {
    let mut lines = Vec::new();
    let mut position: u64 = 0;
    let mut line: u64 = 0;
    let mut in_hunk = false;

    for raw in patch.lines() {
        if raw.is_empty() {
            continue;
        }

        let (kind, text) = if raw.starts_with("@@") {
            in_hunk = true;
            if let Some(range) = HunkRange::parse(raw) {
                line = line.max(range.new_start.saturating_sub(1));
            }
            (LineKind::HunkHeader, raw)
        } else if !in_hunk || raw.starts_with('\\') {
            (LineKind::Meta, raw)
        } else if let Some(rest) = raw.strip_prefix('+') {
            line += 1;
            (LineKind::Added, rest)
        } else if let Some(rest) = raw.strip_prefix('-') {
            (LineKind::Removed, rest)
        } else {
            line += 1;
            (LineKind::Context, raw.strip_prefix(' ').unwrap_or(raw))
        };

        lines.push(DiffLine {
            location: ChangeLocation { position, line },
            kind,
            text,
        });
        position += 1;
    }

    lines
}

/// Added lines only, as fed to the single-line extractors.
pub fn additions<'a>(
    lines: &'a [DiffLine<'a>],
) -> impl Iterator<Item = (ChangeLocation, &'a str)> + 'a {
    lines
        .iter()
        .filter(|l| l.kind == LineKind::Added)
        .map(|l| (l.location, l.text))
}

/// The `-a,b +c,d` part of a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HunkRange {
    old_len: u64,
    new_start: u64,
    new_len: u64,
}

impl HunkRange {
    fn parse(header: &str) -> Option<Self> {
        let mut tokens = header.trim_start_matches('@').split_whitespace();
        let old = tokens.next()?.strip_prefix('-')?;
        let new = tokens.next()?.strip_prefix('+')?;
        let (_, old_len) = parse_range(old)?;
        let (new_start, new_len) = parse_range(new)?;
        Some(HunkRange {
            old_len,
            new_start,
            new_len,
        })
    }
}

fn parse_range(range: &str) -> Option<(u64, u64)> {
    match range.split_once(',') {
        Some((start, len)) => Some((start.parse().ok()?, len.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

#[derive(Default)]
struct Section {
    target: Option<String>,
    patch: Vec<String>,
    /// Old/new lines still expected by the current hunk.
    remaining: Option<(u64, u64)>,
}

impl Section {
    fn into_file(self) -> Option<ChangedFile> {
        let target = self.target?;
        if target == "/dev/null" || self.patch.is_empty() {
            return None;
        }
        let filename = target.strip_prefix("b/").unwrap_or(target.as_str()).to_string();
        Some(ChangedFile::new(filename, self.patch.join("\n")))
    }
}

/// Split a multi-file unified diff (`git diff`, `git format-patch`, `diff -u`)
/// into one [`ChangedFile`] per target file.
///
/// Each patch starts at the file's first hunk header. Deleted files are
/// dropped since they cannot introduce a dependency.
pub fn split_git_diff(text: &str) -> Vec<ChangedFile> {
    let mut files = Vec::new();
    let mut section: Option<Section> = None;

    for raw in text.lines() {
        let in_hunk = section
            .as_ref()
            .is_some_and(|s| s.remaining.is_some_and(|(old, new)| old > 0 || new > 0));

        if in_hunk {
            if let Some(s) = section.as_mut() {
                consume_hunk_line(s, raw);
            }
            continue;
        }

        if raw.starts_with("diff --git ") {
            files.extend(section.take().and_then(Section::into_file));
            section = Some(Section::default());
            continue;
        }

        if raw.starts_with("--- ") {
            // Plain `diff -u` output has no `diff --git` line between files.
            if section.as_ref().is_some_and(|s| !s.patch.is_empty()) {
                files.extend(section.take().and_then(Section::into_file));
            }
            section.get_or_insert_with(Section::default);
            continue;
        }

        let Some(s) = section.as_mut() else {
            continue;
        };

        if let Some(target) = raw.strip_prefix("+++ ") {
            let target = target.split('\t').next().unwrap_or(target).trim_end();
            s.target = Some(target.to_string());
        } else if raw.starts_with("@@") {
            if let Some(range) = HunkRange::parse(raw) {
                s.remaining = Some((range.old_len, range.new_len));
            }
            s.patch.push(raw.to_string());
        } else if raw.starts_with('\\') && !s.patch.is_empty() {
            s.patch.push(raw.to_string());
        }
    }

    files.extend(section.and_then(Section::into_file));
    files
}

fn consume_hunk_line(section: &mut Section, raw: &str) {
    let Some((old, new)) = section.remaining.as_mut() else {
        return;
    };
    match raw.chars().next() {
        Some('+') => *new = new.saturating_sub(1),
        Some('-') => *old = old.saturating_sub(1),
        Some('\\') => {}
        // An empty line is a context line whose leading space was stripped.
        _ => {
            *old = old.saturating_sub(1);
            *new = new.saturating_sub(1);
        }
    }
    section.patch.push(raw.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGE_JSON_PATCH: &str = r#"@@ -75,6 +75,7 @@
],
"dependencies": {
"body-parser": "^1.19.0",
+ "chalk": "^1.0.0",
"check-dependencies": "^1.1.0",
"clarinet": "^0.12.3",
"colors": "^1.3.3",
@@ -85,7 +86,6 @@
"cors": "^2.8.5",
"dottie": "^2.0.1",
"download": "^7.1.0",
- "errorhandler": "^1.5.1",
"express": "^4.17.1",
"express-jwt": "0.1.3",
"express-rate-limit": "^4.0.1",
@@ -112,7 +112,7 @@
"libxmljs2": "^0.21.3",
"marsdb": "^0.6.11",
"morgan": "^1.9.1",
- "moment": "^2.3.0",
+ "moment": "^2.1.0",
"multer": "^1.4.1",
"node-pre-gyp": "^0.13.0",
"notevil": "^1.3.1 ",
"#;

    #[test]
    fn test_positions_unique_and_increasing() {
        assert_eq!(walk(PACKAGE_JSON_PATCH).len(), 25);

        let patches = [
            PACKAGE_JSON_PATCH,
            // file headers before the first hunk
            "diff --git a/go.mod b/go.mod\nindex 1..2 100644\n--- a/go.mod\n+++ b/go.mod\n@@ -1,2 +1,3 @@\n module x\n+require a v1.0.0\n go 1.21",
            // missing trailing newline markers on both sides
            "@@ -1,1 +1,1 @@\n-old\n\\ No newline at end of file\n+new\n\\ No newline at end of file",
            // second hunk starts before the first one ends
            "@@ -1,3 +1,4 @@\n a\n+b\n c\n d\n@@ -2,2 +2,3 @@\n c\n+e\n d",
            // a hunk that only removes lines
            "@@ -5,3 +4,0 @@\n-x\n-y\n-z\n@@ -20,1 +17,2 @@\n w\n+v",
            // empty lines interleaved
            "@@ -1,2 +1,3 @@\n\n a\n\n+b\n\n c\n",
        ];

        for patch in patches {
            let lines = walk(patch);
            for pair in lines.windows(2) {
                assert_eq!(
                    pair[1].location.position,
                    pair[0].location.position + 1,
                    "positions must step by one in {patch:?}"
                );
                assert!(
                    pair[1].location.line >= pair[0].location.line,
                    "line went backwards in {patch:?}"
                );
            }
            for pair in lines.windows(2) {
                if matches!(pair[1].kind, LineKind::Removed | LineKind::Meta) {
                    assert_eq!(pair[1].location.line, pair[0].location.line);
                }
            }
        }
    }

    #[test]
    fn test_removed_lines_do_not_advance_line() {
        let lines = walk(PACKAGE_JSON_PATCH);
        for pair in lines.windows(2) {
            if pair[1].kind == LineKind::Removed {
                assert_eq!(pair[1].location.line, pair[0].location.line);
            }
        }
    }

    #[test]
    fn test_additions_carry_both_coordinates() {
        let lines = walk(PACKAGE_JSON_PATCH);
        let added: Vec<_> = additions(&lines).collect();
        assert_eq!(added.len(), 2);

        assert_eq!(added[0].0, ChangeLocation { position: 4, line: 78 });
        assert_eq!(added[0].1, r#" "chalk": "^1.0.0","#);

        // third hunk header is position 16 and rebases to line 111
        assert_eq!(added[1].0, ChangeLocation { position: 21, line: 115 });
        assert_eq!(added[1].1, r#" "moment": "^2.1.0","#);
    }

    #[test]
    fn test_kinds() {
        let patch = "@@ -1,2 +1,2 @@\n context\n-old\n+new\n\\ No newline at end of file";
        let kinds: Vec<_> = walk(patch).iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::HunkHeader,
                LineKind::Context,
                LineKind::Removed,
                LineKind::Added,
                LineKind::Meta,
            ]
        );
    }

    #[test]
    fn test_file_headers_are_not_additions() {
        let patch = "--- a/go.mod\n+++ b/go.mod\n@@ -1 +1 @@\n+module example.com/app";
        let lines = walk(patch);
        let added: Vec<_> = additions(&lines).collect();
        assert_eq!(lines[1].kind, LineKind::Meta);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0], (ChangeLocation { position: 3, line: 1 }, "module example.com/app"));
    }

    #[test]
    fn test_empty_lines_skipped() {
        let lines = walk("@@ -1,1 +1,2 @@\n\n+a\n\n+b\n");
        let positions: Vec<_> = lines.iter().map(|l| l.location.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_no_hunks_or_only_removals_yield_nothing() {
        assert!(walk("").is_empty());
        let lines = walk("@@ -1,2 +0,0 @@\n-a\n-b");
        assert_eq!(additions(&lines).count(), 0);
        assert!(lines.iter().all(|l| l.location.line == 0));
    }

    #[test]
    fn test_split_git_diff() {
        let text = "\
diff --git a/package.json b/package.json
index 1111111..2222222 100644
--- a/package.json
+++ b/package.json
@@ -1,3 +1,4 @@
 {
+  \"chalk\": \"^1.0.0\",
 \"name\": \"app\"
 }
diff --git a/old/Gemfile b/old/Gemfile
deleted file mode 100644
--- a/old/Gemfile
+++ /dev/null
@@ -1 +0,0 @@
-gem 'rails', '~> 5.0'
diff --git a/api/requirements.txt b/api/requirements.txt
--- a/api/requirements.txt
+++ b/api/requirements.txt
@@ -1,2 +1,2 @@
--- not a header
+requests==2.28.1
 flask==2.0.0
";
        let files = split_git_diff(text);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "package.json");
        assert!(files[0].patch.starts_with("@@ -1,3 +1,4 @@"));
        assert_eq!(files[0].patch.lines().count(), 5);
        assert_eq!(files[1].filename, "api/requirements.txt");
        assert_eq!(files[1].patch.lines().nth(1), Some("--- not a header"));
    }

    #[test]
    fn test_split_plain_unified_diff() {
        let text = "\
--- go.mod.orig\t2024-01-01 00:00:00
+++ go.mod\t2024-01-02 00:00:00
@@ -3 +3 @@
-require github.com/gorilla/mux v1.7.0
+require github.com/gorilla/mux v1.8.0
--- Gemfile.orig
+++ Gemfile
@@ -1 +1 @@
-gem 'rails', '5.0'
+gem 'rails', '5.2'
";
        let files = split_git_diff(text);
        let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["go.mod", "Gemfile"]);
    }
}
