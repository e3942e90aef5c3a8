//! Minimal glob expansion for release asset patterns
//!
//! Only two wildcards are understood:
//! - `*`  - any run of characters except `/` (one directory level)
//! - `**` - any run of characters including `/` (any number of levels)
//!
//! Patterns are matched against paths relative to a base directory,
//! always written with forward slashes.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ReleaseError, Result};

/// A compiled glob pattern
///
/// The matcher is anchored: it must cover the whole relative path.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a glob pattern
    ///
    /// # Errors
    ///
    /// * The translated expression is rejected by the regex engine
    ///
    /// # Example
    ///
    /// ```
    /// use commit_release::glob::GlobPattern;
    ///
    /// let pattern = GlobPattern::compile("dist/*.tar.gz").unwrap();
    /// assert!(pattern.is_match("dist/app-1.0.tar.gz"));
    /// assert!(!pattern.is_match("dist/nested/app.tar.gz"));
    /// ```
    pub fn compile(pattern: &str) -> Result<Self> {
        let expression = glob_to_regex(pattern);
        let regex = Regex::new(&expression).map_err(|e| {
            ReleaseError::Configuration(format!("Invalid asset pattern '{}': {}", pattern, e))
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Test a forward-slash relative path against the pattern
    pub fn is_match(&self, relative: &str) -> bool {
        self.regex.is_match(relative)
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Translate a glob into an anchored regular expression
///
/// `**` is recognized before `*` so that the single star never
/// swallows a separator. A `**/` segment may also match no directory
/// at all, so `a/**/z` accepts both `a/z` and `a/b/c/z`.
pub fn glob_to_regex(pattern: &str) -> String {
    let normalized = pattern.replace('\\', "/");
    let chars: Vec<char> = normalized.chars().collect();

    let mut expression = String::with_capacity(normalized.len() * 2 + 2);
    let mut literal = String::new();
    expression.push('^');

    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '*' {
            literal.push(chars[i]);
            i += 1;
            continue;
        }

        expression.push_str(&regex::escape(&literal));
        literal.clear();

        if chars.get(i + 1) == Some(&'*') {
            if chars.get(i + 2) == Some(&'/') {
                expression.push_str("(?:.*/)?");
                i += 3;
            } else {
                expression.push_str(".*");
                i += 2;
            }
        } else {
            expression.push_str("[^/]*");
            i += 1;
        }
    }

    expression.push_str(&regex::escape(&literal));
    expression.push('$');
    expression
}

/// Lazily walk `base` and yield every path matching `pattern`
///
/// Relative patterns are resolved against `base`; a relative `base` is
/// resolved against the current directory. Yielded paths are absolute.
///
/// # Errors
///
/// * The pattern cannot be compiled
/// * The base directory cannot be made absolute
///
/// Read failures during traversal surface as an `Err` item, after which
/// the iterator is exhausted.
///
/// # Example
///
/// ```no_run
/// use commit_release::glob::{expand, is_regular_file};
///
/// # fn main() -> commit_release::error::Result<()> {
/// for path in expand("target/release/*", ".")? {
///     let path = path?;
///     if is_regular_file(&path) {
///         println!("{}", path.display());
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn expand(pattern: &str, base: impl AsRef<Path>) -> Result<Expand> {
    let matcher = GlobPattern::compile(pattern)?;
    let base = base.as_ref();
    let root =
        std::path::absolute(base).map_err(|e| ReleaseError::filesystem(base, e))?;
    debug!(pattern = matcher.as_str(), root = %root.display(), "Expanding pattern");

    Ok(Expand::new(matcher, root))
}

/// Single-pass iterator over matches below a root directory
///
/// Traversal uses an explicit stack of pending directories, so deep
/// trees do not grow the call stack. Sibling order is unspecified.
pub struct Expand {
    matcher: GlobPattern,
    root: PathBuf,
    pending: Vec<PathBuf>,
    current: Option<(PathBuf, fs::ReadDir)>,
    done: bool,
}

impl Expand {
    fn new(matcher: GlobPattern, root: PathBuf) -> Self {
        Self {
            matcher,
            pending: vec![root.clone()],
            root,
            current: None,
            done: false,
        }
    }

    fn fail(&mut self, path: PathBuf, err: std::io::Error) -> Option<Result<PathBuf>> {
        self.done = true;
        self.pending.clear();
        self.current = None;
        Some(Err(ReleaseError::filesystem(path, err)))
    }
}

impl Iterator for Expand {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let Some((dir, entries)) = self.current.as_mut() else {
                let dir = self.pending.pop()?;
                match fs::read_dir(&dir) {
                    Ok(entries) => self.current = Some((dir, entries)),
                    Err(e) => return self.fail(dir, e),
                }
                continue;
            };

            let entry = match entries.next() {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    let dir = dir.clone();
                    return self.fail(dir, e);
                }
                None => {
                    self.current = None;
                    continue;
                }
            };

            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => return self.fail(path, e),
            };
            if file_type.is_dir() {
                self.pending.push(path.clone());
            }

            if let Some(relative) = relative_posix(&self.root, &path) {
                if self.matcher.is_match(&relative) {
                    return Some(Ok(path));
                }
            }
        }
    }
}

/// Express `path` relative to `root` with forward slashes
fn relative_posix(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Whether `path` exists and is a regular file
///
/// Missing or inaccessible paths are reported as `false`.
pub fn is_regular_file(path: impl AsRef<Path>) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn fixture(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, file.as_bytes()).unwrap();
        }
        dir
    }

    fn matches(pattern: &str, dir: &TempDir) -> BTreeSet<String> {
        let root = std::path::absolute(dir.path()).unwrap();
        expand(pattern, dir.path())
            .unwrap()
            .map(|p| relative_posix(&root, &p.unwrap()).unwrap())
            .collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_glob_to_regex_escapes_specials() {
        // Arrange - dots, plus and parentheses are literal in globs
        let pattern = "dist/app(1)+x.tar.gz";

        // Act
        let expression = glob_to_regex(pattern);

        // Assert
        assert_eq!(expression, r"^dist/app\(1\)\+x\.tar\.gz$");
    }

    #[test]
    fn test_glob_to_regex_wildcards() {
        assert_eq!(glob_to_regex("*.txt"), r"^[^/]*\.txt$");
        assert_eq!(glob_to_regex("a/**"), "^a/.*$");
        assert_eq!(glob_to_regex("**/*.rs"), r"^(?:.*/)?[^/]*\.rs$");
    }

    #[test]
    fn test_single_star_does_not_cross_separator() {
        let pattern = GlobPattern::compile("a/*.txt").unwrap();

        assert!(pattern.is_match("a/c.txt"));
        assert!(!pattern.is_match("a/b/c.txt"));
    }

    #[test]
    fn test_double_star_matches_zero_or_more_segments() {
        let pattern = GlobPattern::compile("a/**/z.txt").unwrap();

        assert!(pattern.is_match("a/z.txt"));
        assert!(pattern.is_match("a/b/z.txt"));
        assert!(pattern.is_match("a/b/c/z.txt"));
        assert!(!pattern.is_match("b/z.txt"));
    }

    #[test]
    fn test_pattern_is_anchored() {
        let pattern = GlobPattern::compile("*.zip").unwrap();

        assert!(pattern.is_match("release.zip"));
        assert!(!pattern.is_match("release.zip.sig"));
        assert!(!pattern.is_match("out/release.zip"));
    }

    #[test]
    fn test_backslashes_are_normalized() {
        let pattern = GlobPattern::compile(r"dist\*.exe").unwrap();

        assert!(pattern.is_match("dist/app.exe"));
        assert_eq!(pattern.as_str(), r"dist\*.exe");
    }

    #[test]
    fn test_expand_matches_fixture_tree() {
        // Arrange
        let dir = fixture(&[
            "a/z.txt",
            "a/c.txt",
            "a/b/c.txt",
            "a/b/c/z.txt",
            "b/z.txt",
            "readme.md",
        ]);

        // Act & Assert
        assert_eq!(matches("a/*.txt", &dir), set(&["a/z.txt", "a/c.txt"]));
        assert_eq!(
            matches("a/**/z.txt", &dir),
            set(&["a/z.txt", "a/b/c/z.txt"])
        );
        assert_eq!(
            matches("**/z.txt", &dir),
            set(&["a/z.txt", "a/b/c/z.txt", "b/z.txt"])
        );
        assert_eq!(matches("*.md", &dir), set(&["readme.md"]));
        assert_eq!(matches("nothing/*", &dir), set(&[]));
    }

    #[test]
    fn test_expand_yields_directories_too() {
        // Arrange
        let dir = fixture(&["dist/linux/app", "dist/mac/app"]);

        // Act
        let found = matches("dist/*", &dir);

        // Assert - directories match like any other entry
        assert_eq!(found, set(&["dist/linux", "dist/mac"]));
    }

    #[test]
    fn test_expand_yields_absolute_paths() {
        let dir = fixture(&["out/a.bin"]);

        let paths: Vec<PathBuf> = expand("out/*.bin", dir.path())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(paths.len(), 1);
        assert!(paths[0].is_absolute());
        assert!(paths[0].ends_with("out/a.bin"));
    }

    #[test]
    fn test_expand_is_fresh_per_call() {
        let dir = fixture(&["x.txt", "y.txt"]);

        assert_eq!(matches("*.txt", &dir).len(), 2);
        assert_eq!(matches("*.txt", &dir).len(), 2);
    }

    #[test]
    fn test_expand_missing_base_reports_filesystem_error() {
        // Arrange
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");

        // Act
        let mut iter = expand("*", &missing).unwrap();

        // Assert - error is surfaced once, then the iterator ends
        assert!(matches!(
            iter.next(),
            Some(Err(ReleaseError::Filesystem { .. }))
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_is_regular_file() {
        let dir = fixture(&["bin/tool"]);

        assert!(is_regular_file(dir.path().join("bin/tool")));
        assert!(!is_regular_file(dir.path().join("bin")));
        assert!(!is_regular_file(dir.path().join("missing")));
    }
}
