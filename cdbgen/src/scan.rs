// SPDX-License-Identifier: GPL-3.0-or-later

//! This module synthesizes compilation database entries from a source tree.
//!
//! The tree is walked for `.c` source files and `.h` header files. The
//! directories containing headers become the include path list, and every
//! source file gets a fixed-flag compiler invocation. The discovered files
//! are not validated against the build system; the synthesized commands are
//! a best-effort guess for projects without a usable build log.

use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::config;
use crate::output::Entry;

/// Responsible for synthesizing entries for all sources of a directory tree.
pub struct SourceTreeScanner {
    directory: PathBuf,
    compiler: String,
    config: config::Scan,
}

/// Represents the fatal scan failures.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Failed to walk the source tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Path {0:?} can't be encoded to UTF-8")]
    Encoding(PathBuf),
}

impl SourceTreeScanner {
    /// Create a new scanner rooted at the given directory.
    pub fn new(directory: &Path, compiler: &str, config: &config::Scan) -> Self {
        SourceTreeScanner {
            directory: directory.to_path_buf(),
            compiler: compiler.to_string(),
            config: config.clone(),
        }
    }

    /// Build one entry for every discovered source file.
    ///
    /// The walk is sorted by file name, so repeated runs over the same tree
    /// produce identical output.
    pub fn entries(&self) -> Result<Vec<Entry>, ScanError> {
        let sources = self.files_with_extension("c")?;
        let headers = self.files_with_extension("h")?;

        let include_directories = parent_directories(headers.as_slice());
        let flags = self.flags(include_directories.as_slice())?;
        log::debug!(
            "Found {} sources and {} include directories",
            sources.len(),
            include_directories.len()
        );

        sources
            .into_iter()
            .map(|source| {
                let command = self.command(source.as_path(), flags.as_slice())?;
                Ok(Entry {
                    directory: self.directory.clone(),
                    file: source,
                    command,
                })
            })
            .collect()
    }

    /// Collect all files with the given extension under the root directory.
    fn files_with_extension(&self, extension: &str) -> Result<Vec<PathBuf>, ScanError> {
        let mut result = Vec::new();
        for candidate in WalkDir::new(&self.directory).sort_by_file_name() {
            let entry = candidate?;
            let path = entry.path();
            if path.extension().is_some_and(|found| found == extension) && !self.ignored(path) {
                result.push(path.to_path_buf());
            }
        }
        Ok(result)
    }

    /// Check the path against the configured ignore substrings.
    fn ignored(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.config
            .ignore
            .iter()
            .any(|substring| path.contains(substring.as_str()))
    }

    /// Assemble the compiler flags shared by all synthesized commands.
    fn flags(&self, include_directories: &[PathBuf]) -> Result<Vec<String>, ScanError> {
        let mut flags = vec![format!("-std={}", self.config.standard)];
        for directory in include_directories {
            flags.push(format!("-I{}", into_string(directory)?));
        }
        for define in &self.config.defines {
            flags.push(format!("-D{}", define));
        }
        Ok(flags)
    }

    /// Assemble the full command string for one source file.
    fn command(&self, source: &Path, flags: &[String]) -> Result<String, ScanError> {
        let mut arguments: Vec<String> = Vec::with_capacity(flags.len() + 4);
        arguments.push(self.compiler.clone());
        arguments.extend(flags.iter().cloned());
        arguments.push(String::from("-c"));
        arguments.push(String::from("-o"));
        arguments.push(into_string(source.with_extension("o").as_path())?);
        arguments.push(into_string(source)?);

        Ok(shell_words::join(arguments))
    }
}

/// The parent directories of the given files, deduplicated,
/// in first-seen order.
fn parent_directories(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();
    for file in files {
        if let Some(parent) = file.parent() {
            if !result.iter().any(|seen| seen == parent) {
                result.push(parent.to_path_buf());
            }
        }
    }
    result
}

fn into_string(path: &Path) -> Result<String, ScanError> {
    path.to_path_buf()
        .into_os_string()
        .into_string()
        .map_err(|_| ScanError::Encoding(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec_of_strings;
    use std::fs;
    use tempfile::tempdir;

    fn populate(root: &Path, files: &[&str]) {
        for file in files {
            let path = root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
    }

    #[test]
    fn test_empty_tree() {
        let root = tempdir().unwrap();

        let sut = SourceTreeScanner::new(root.path(), "gcc", &config::Scan::default());
        let result = sut.entries().unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn test_synthesized_commands() {
        let root = tempdir().unwrap();
        populate(
            root.path(),
            &["src/main.c", "src/util.c", "include/util.h", "README.md"],
        );

        let sut = SourceTreeScanner::new(root.path(), "gcc", &config::Scan::default());
        let result = sut.entries().unwrap();

        assert_eq!(result.len(), 2);
        let entry = &result[0];
        assert_eq!(entry.directory, root.path());
        assert_eq!(entry.file, root.path().join("src/main.c"));
        assert_eq!(
            entry.command,
            format!(
                "gcc -std=gnu11 -I{root}/include -c -o {root}/src/main.o {root}/src/main.c",
                root = root.path().display()
            )
        );
    }

    #[test]
    fn test_defines_and_standard() {
        let root = tempdir().unwrap();
        populate(root.path(), &["main.c"]);

        let config = config::Scan {
            standard: "c99".to_string(),
            defines: vec_of_strings!["KERNEL", "DEBUG"],
            ignore: vec![],
        };
        let sut = SourceTreeScanner::new(root.path(), "cc", &config);
        let result = sut.entries().unwrap();

        assert_eq!(result.len(), 1);
        assert!(result[0].command.starts_with("cc -std=c99 -DKERNEL -DDEBUG -c -o"));
    }

    #[test]
    fn test_ignored_paths() {
        let root = tempdir().unwrap();
        populate(
            root.path(),
            &["src/main.c", "third_party/vendor.c", "third_party/vendor.h"],
        );

        let config = config::Scan {
            ignore: vec_of_strings!["third_party"],
            ..config::Scan::default()
        };
        let sut = SourceTreeScanner::new(root.path(), "gcc", &config);
        let result = sut.entries().unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].file, root.path().join("src/main.c"));
        // The ignored header directory contributes no include flag.
        assert!(!result[0].command.contains("-I"));
    }

    #[test]
    fn test_walk_is_sorted() {
        let root = tempdir().unwrap();
        populate(root.path(), &["b.c", "a.c", "c.c"]);

        let sut = SourceTreeScanner::new(root.path(), "gcc", &config::Scan::default());
        let result = sut.entries().unwrap();

        let files: Vec<PathBuf> = result.into_iter().map(|entry| entry.file).collect();
        assert_eq!(
            files,
            vec![
                root.path().join("a.c"),
                root.path().join("b.c"),
                root.path().join("c.c"),
            ]
        );
    }
}
