// SPDX-License-Identifier: GPL-3.0-or-later

//! This module recovers compilation database entries from build log lines.
//!
//! A relevant log line embeds a shell command as a sequence of single-quoted
//! tokens, where two consecutive quotes inside a token stand for one literal
//! quote character. The compiled source file is named by a token ending in
//! `.c`. Lines that miss the compiler token, the quoted tokens or the source
//! file token are not compile steps and contribute no entry.

use std::path::{Path, PathBuf};

use path_absolutize::Absolutize;
use regex::Regex;
use thiserror::Error;

use crate::output::Entry;

/// Matches one single-quoted token and captures its content.
/// The content allows the quote-doubling escape.
const QUOTED_TOKEN_PATTERN: &str = r"'((?:[^']|'')+)'";

/// Responsible for converting one build log line into zero or one entry.
///
/// The extractor is stateless across lines. The root directory is recorded
/// as the `directory` field of every entry and anchors the resolution of
/// relative source file paths.
pub struct LogEntryExtractor {
    token_matcher: Regex,
    directory: PathBuf,
    compiler: String,
}

/// Represents the fatal extraction failures.
///
/// A source file that the log refers to, but cannot be found on disk, stops
/// the whole run. It is evidence of a mismatched root directory or a stale
/// log, which the caller has to fix.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("File {0:?} not found")]
    MissingFile(PathBuf),
    #[error("Failed to resolve path {0:?}: {1}")]
    PathResolution(PathBuf, std::io::Error),
}

impl LogEntryExtractor {
    /// Create a new extractor for the given root directory.
    ///
    /// The compiler argument is the token that separates compile commands
    /// from link steps and other log noise.
    pub fn new(directory: &Path, compiler: &str) -> Self {
        let token_matcher =
            Regex::new(QUOTED_TOKEN_PATTERN).expect("Invalid quoted token pattern");

        LogEntryExtractor {
            token_matcher,
            directory: directory.to_path_buf(),
            compiler: compiler.to_string(),
        }
    }

    /// Convert one build log line into zero or one entry.
    ///
    /// Disqualified lines are skipped silently. The only error is a source
    /// file reference that does not exist on disk, which is escalated to
    /// abort the run.
    pub fn extract(&self, line: &str) -> Result<Option<Entry>, ExtractionError> {
        let tokens = self.quoted_tokens(line);

        let command = tokens.join(" ");
        let file = tokens
            .iter()
            .filter(|token| token.ends_with(".c"))
            .cloned()
            .collect::<Vec<String>>()
            .join(" ");

        if !command.contains(self.compiler.as_str()) {
            return Ok(None);
        }
        if command.is_empty() || file.is_empty() {
            return Ok(None);
        }

        let command = normalize_escapes(&command);
        let file = self.resolve(Path::new(&file))?;

        Ok(Some(Entry {
            directory: self.directory.clone(),
            file,
            command,
        }))
    }

    /// Extract the decoded quoted tokens of the line.
    fn quoted_tokens(&self, line: &str) -> Vec<String> {
        self.token_matcher
            .captures_iter(line)
            .map(|capture| capture[1].replace("''", "'"))
            .collect()
    }

    /// Resolve the source file path against the root directory.
    ///
    /// Absolute paths are used as-is; relative ones are joined onto the
    /// root. Both are normalized, and the result must exist on disk.
    fn resolve(&self, file: &Path) -> Result<PathBuf, ExtractionError> {
        let candidate = file
            .absolutize_from(self.directory.as_path())
            .map_err(|error| ExtractionError::PathResolution(file.to_path_buf(), error))?
            .to_path_buf();

        if !candidate.exists() {
            return Err(ExtractionError::MissingFile(candidate));
        }
        Ok(candidate)
    }
}

/// Rewrite the escaped pound representations to a literal `#`.
///
/// The log format escapes `#` as `\#` or `$(pound)` to be safely embedded
/// in line-oriented macro-processing build files. The command is not
/// interpreted by those, so the escapes are folded back.
fn normalize_escapes(command: &str) -> String {
    command.replace(r"\#", "#").replace("$(pound)", "#")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sut(directory: &Path) -> LogEntryExtractor {
        LogEntryExtractor::new(directory, "gcc")
    }

    #[test]
    fn test_line_without_quoted_tokens() {
        let root = tempdir().unwrap();

        let result = sut(root.path()).extract("gcc -c main.c").unwrap();

        assert_eq!(result, None);
    }

    #[test]
    fn test_line_without_compiler_token() {
        let root = tempdir().unwrap();

        let result = sut(root.path())
            .extract("rule 'ld' '-o' 'main' 'main.c'")
            .unwrap();

        assert_eq!(result, None);
    }

    #[test]
    fn test_line_without_source_file_token() {
        let root = tempdir().unwrap();

        let result = sut(root.path())
            .extract("rule 'gcc' '-o' 'main' 'main.o'")
            .unwrap();

        assert_eq!(result, None);
    }

    #[test]
    fn test_doubling_escape_decodes_to_one_quote() {
        let root = tempdir().unwrap();

        let tokens = sut(root.path()).quoted_tokens("'-DNAME=it''s'");

        assert_eq!(tokens, vec!["-DNAME=it's"]);
    }

    #[test]
    fn test_escape_normalization() {
        assert_eq!(normalize_escapes(r"-DA=\#"), "-DA=#");
        assert_eq!(normalize_escapes("-DA=$(pound)"), "-DA=#");
        // A bare pound is left unchanged by a second application.
        assert_eq!(normalize_escapes("-DA=#"), "-DA=#");
    }

    #[test]
    fn test_relative_path_resolution() {
        let root = tempdir().unwrap();
        fs::create_dir(root.path().join("sub")).unwrap();
        fs::write(root.path().join("sub/foo.c"), "int main;").unwrap();

        let result = sut(root.path())
            .extract("'gcc' '-c' 'sub/foo.c'")
            .unwrap()
            .unwrap();

        assert_eq!(result.file, root.path().join("sub/foo.c"));
        assert_eq!(result.directory, root.path());
        assert_eq!(result.command, "gcc -c sub/foo.c");
    }

    #[test]
    fn test_absolute_path_resolution() {
        let root = tempdir().unwrap();
        let other = tempdir().unwrap();
        let source = other.path().join("foo.c");
        fs::write(&source, "int main;").unwrap();

        let line = format!("'gcc' '-c' '{}'", source.display());
        let result = sut(root.path()).extract(&line).unwrap().unwrap();

        assert_eq!(result.file, source);
        assert_eq!(result.directory, root.path());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let root = tempdir().unwrap();

        let result = sut(root.path()).extract("'gcc' '-c' 'missing.c'");

        match result {
            Err(ExtractionError::MissingFile(path)) => {
                assert_eq!(path, root.path().join("missing.c"));
            }
            _ => panic!("should be a missing file error"),
        }
    }

    #[test]
    fn test_compile_line() {
        let root = tempdir().unwrap();
        fs::write(root.path().join("main.c"), "int main;").unwrap();

        let result = sut(root.path())
            .extract("cc1 '-O2' 'gcc' '-I/inc' '-c' 'main.c'")
            .unwrap()
            .unwrap();

        assert_eq!(
            result,
            Entry {
                directory: root.path().to_path_buf(),
                file: root.path().join("main.c"),
                command: "-O2 gcc -I/inc -c main.c".to_string(),
            }
        );
    }
}
