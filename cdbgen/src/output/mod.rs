// SPDX-License-Identifier: GPL-3.0-or-later

//! This module is responsible for writing the compilation database file.
//!
//! The database is a JSON array of entries, defined in the LLVM project
//! [documentation](https://clang.llvm.org/docs/JSONCompilationDatabase.html).
//! The module provides the entry type, the serialization layouts and the
//! file writer.

mod json;

use serde::Serialize;
use std::io::Write;
use std::{fs, io, path};
use thiserror::Error;

/// Represents an entry of the compilation database.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Entry {
    /// The working directory of the compilation. All relative paths in the
    /// command are interpreted against this directory.
    pub directory: path::PathBuf,
    /// The main translation unit source processed by this compilation step.
    /// This is used by tools as the key into the compilation database.
    pub file: path::PathBuf,
    /// The compile command executed, as a single shell-joined string.
    pub command: String,
}

/// Serialization layout of the database file.
#[derive(Clone, Debug, PartialEq)]
pub struct EntryFormat {
    /// The number of spaces of one indentation level.
    pub indent: usize,
    /// Write the keys of each entry in alphabetical order instead of the
    /// declared field order.
    pub sort_keys: bool,
}

impl EntryFormat {
    /// The layout of databases recovered from build logs.
    pub fn sorted() -> Self {
        EntryFormat {
            indent: 2,
            sort_keys: true,
        }
    }

    /// The layout of databases synthesized from a source tree scan.
    pub fn as_declared() -> Self {
        EntryFormat {
            indent: 4,
            sort_keys: false,
        }
    }
}

/// Responsible for writing the compilation database file atomically.
///
/// The file is first written to a temporary file and then renamed to the
/// final file name. This ensures that the output file is not left in an
/// inconsistent state in case of errors. A previous database under the
/// final name is fully replaced.
pub struct OutputWriter {
    temp_path: path::PathBuf,
    final_path: path::PathBuf,
    format: EntryFormat,
}

/// Represents errors that can occur while writing output.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("Failed to write the output file {0:?}: {1}")]
    Io(path::PathBuf, std::io::Error),
    #[error("Failed to serialize the output file {0:?}: {1}")]
    Serialization(path::PathBuf, serde_json::Error),
}

impl OutputWriter {
    /// Create a new instance of the output writer.
    ///
    /// No file is opened here; the writer touches the filesystem only when
    /// the entries are already collected.
    pub fn new(output: &path::Path, format: EntryFormat) -> Self {
        OutputWriter {
            temp_path: output.with_extension("tmp"),
            final_path: output.to_path_buf(),
            format,
        }
    }

    /// Consume the entries and write the database file.
    pub fn write(self, entries: impl Iterator<Item = Entry>) -> Result<(), WriterError> {
        let mut output = fs::File::create(&self.temp_path)
            .map(io::BufWriter::new)
            .map_err(|error| WriterError::Io(self.temp_path.clone(), error))?;

        json::write_array(&mut output, entries, &self.format)
            .map_err(|error| WriterError::Serialization(self.temp_path.clone(), error))?;
        output
            .flush()
            .map_err(|error| WriterError::Io(self.temp_path.clone(), error))?;
        drop(output);

        fs::rename(&self.temp_path, &self.final_path)
            .map_err(|error| WriterError::Io(self.final_path.clone(), error))?;

        Ok(())
    }
}
