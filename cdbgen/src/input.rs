// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Context;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Responsible for reading the build log file.
///
/// The line syntax is defined by the `extract` module, and the parsing logic
/// is implemented there. Here we only handle the file opening and the error
/// handling.
pub struct BuildLogReader {
    reader: BufReader<File>,
}

impl TryFrom<&Path> for BuildLogReader {
    type Error = anyhow::Error;

    /// Open the file and create a new instance of the build log reader.
    ///
    /// If the file cannot be opened, the error will be escalated with the
    /// file name attached.
    fn try_from(file_name: &Path) -> Result<Self, Self::Error> {
        let file = OpenOptions::new()
            .read(true)
            .open(file_name)
            .with_context(|| format!("Failed to open build log: {:?}", file_name))?;
        let reader = BufReader::new(file);

        Ok(BuildLogReader { reader })
    }
}

impl BuildLogReader {
    /// Generate the physical lines of the build log.
    ///
    /// Returns an iterator over the lines. A read failure is reported as
    /// the failed element; the caller decides to escalate it.
    pub fn lines(self) -> impl Iterator<Item = Result<String, std::io::Error>> {
        self.reader.lines()
    }
}
