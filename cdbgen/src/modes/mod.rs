// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use path_absolutize::Absolutize;

use crate::extract::LogEntryExtractor;
use crate::input::BuildLogReader;
use crate::output::{Entry, EntryFormat, OutputWriter};
use crate::scan::SourceTreeScanner;
use crate::{args, config};

/// Represent the modes the application can run in.
///
/// To the user the modes are:
/// - log: recover the compile commands the build actually used from a log.
/// - scan: synthesize compile commands for all sources of a directory tree.
///
/// Both modes produce the same database format; the difference is where the
/// entries come from and how the file is laid out.
pub enum Mode {
    Log {
        input: PathBuf,
        extractor: LogEntryExtractor,
        writer: OutputWriter,
    },
    Scan {
        scanner: SourceTreeScanner,
        writer: OutputWriter,
    },
}

impl Mode {
    /// Configure the application mode based on the command line arguments
    /// and the configuration.
    ///
    /// Here we are checking if the command line arguments and configuration
    /// are valid. The root directory is resolved to an absolute path before
    /// any entry is built from it.
    pub fn configure(
        args: args::Arguments,
        config: config::Main,
    ) -> Result<Self, ConfigurationError> {
        match args.mode {
            args::Mode::Log { input, output } => {
                log::debug!("Mode: recover compile commands from the build log");

                let directory = resolve_directory(&input.directory)?;
                let extractor = LogEntryExtractor::new(&directory, &config.compiler);
                let writer =
                    OutputWriter::new(Path::new(&output.file_name), EntryFormat::sorted());

                Ok(Self::Log {
                    input: PathBuf::from(&config.log.input),
                    extractor,
                    writer,
                })
            }
            args::Mode::Scan { input, output } => {
                log::debug!("Mode: synthesize compile commands from the source tree");

                let directory = resolve_directory(&input.directory)?;
                let mut scan_config = config.scan;
                scan_config.ignore.extend(input.ignore);
                let scanner = SourceTreeScanner::new(&directory, &config.compiler, &scan_config);
                let writer =
                    OutputWriter::new(Path::new(&output.file_name), EntryFormat::as_declared());

                Ok(Self::Scan { scanner, writer })
            }
        }
    }

    /// It actually runs the application mode.
    ///
    /// All entries are collected before the output file is opened, so a
    /// fatal extraction failure aborts the run without touching a previous
    /// database under the output name.
    pub fn run(self) -> ExitCode {
        let status = match self {
            Self::Log {
                input,
                extractor,
                writer,
            } => Self::recover(input.as_path(), &extractor, writer),
            Self::Scan { scanner, writer } => Self::synthesize(&scanner, writer),
        };
        match status {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                log::error!("cdbgen: {error:#}");
                ExitCode::FAILURE
            }
        }
    }

    /// Run the log recovery: read the build log line by line and convert
    /// each line into zero or one entry.
    fn recover(
        input: &Path,
        extractor: &LogEntryExtractor,
        writer: OutputWriter,
    ) -> anyhow::Result<()> {
        let reader = BuildLogReader::try_from(input)?;

        let mut entries: Vec<Entry> = Vec::new();
        for line in reader.lines() {
            let line =
                line.with_context(|| format!("Failed to read the build log: {:?}", input))?;
            if let Some(entry) = extractor.extract(&line)? {
                entries.push(entry);
            }
        }
        log::debug!("Recovered {} entries from the build log", entries.len());

        writer.write(entries.into_iter())?;
        Ok(())
    }

    /// Run the source tree scan and write the synthesized entries.
    fn synthesize(scanner: &SourceTreeScanner, writer: OutputWriter) -> anyhow::Result<()> {
        let entries = scanner.entries()?;
        log::debug!("Synthesized {} entries from the source tree", entries.len());

        writer.write(entries.into_iter())?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Failed to resolve directory {0:?}: {1}")]
    DirectoryResolution(PathBuf, std::io::Error),
}

/// Resolve the root directory argument to a normalized absolute path.
fn resolve_directory(directory: &str) -> Result<PathBuf, ConfigurationError> {
    let path = Path::new(directory);
    path.absolutize()
        .map(|resolved| resolved.to_path_buf())
        .map_err(|error| ConfigurationError::DirectoryResolution(path.to_path_buf(), error))
}
