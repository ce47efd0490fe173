// SPDX-License-Identifier: GPL-3.0-or-later

//! This module contains the command line interface of the application.
//!
//! The command line parsing is implemented using the `clap` library.
//! The module is defining types to represent a structured form of the
//! program invocation. The `Arguments` type is used to represent all
//! possible invocations of the program.

use anyhow::anyhow;
use clap::{arg, command, ArgAction, ArgMatches, Command};

/// Common constants used in the module.
const MODE_LOG_SUBCOMMAND: &str = "log";
const MODE_SCAN_SUBCOMMAND: &str = "scan";
const DEFAULT_OUTPUT_FILE: &str = "compile_commands.json";
const DEFAULT_ROOT_DIRECTORY: &str = ".";

/// Represents the command line arguments of the application.
#[derive(Debug, PartialEq)]
pub struct Arguments {
    // The path of the configuration file.
    pub config: Option<String>,
    // The mode of the application.
    pub mode: Mode,
}

/// Represents the mode of the application.
#[derive(Debug, PartialEq)]
pub enum Mode {
    Log {
        input: BuildLog,
        output: BuildDatabase,
    },
    Scan {
        input: SourceTree,
        output: BuildDatabase,
    },
}

/// Represents the build log to recover compile commands from.
#[derive(Debug, PartialEq)]
pub struct BuildLog {
    pub directory: String,
}

/// Represents the source tree to synthesize compile commands for.
#[derive(Debug, PartialEq)]
pub struct SourceTree {
    pub directory: String,
    pub ignore: Vec<String>,
}

#[derive(Debug, PartialEq)]
pub struct BuildDatabase {
    pub file_name: String,
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(matches: ArgMatches) -> Result<Self, Self::Error> {
        let config = matches.get_one::<String>("config").map(String::to_string);

        match matches.subcommand() {
            Some((MODE_LOG_SUBCOMMAND, log_matches)) => {
                let input = BuildLog::try_from(log_matches)?;
                let output = BuildDatabase::try_from(log_matches)?;
                let mode = Mode::Log { input, output };
                let arguments = Arguments { config, mode };
                Ok(arguments)
            }
            Some((MODE_SCAN_SUBCOMMAND, scan_matches)) => {
                let input = SourceTree::try_from(scan_matches)?;
                let output = BuildDatabase::try_from(scan_matches)?;
                let mode = Mode::Scan { input, output };
                let arguments = Arguments { config, mode };
                Ok(arguments)
            }
            None => {
                let input = BuildLog::try_from(&matches)?;
                let output = BuildDatabase::try_from(&matches)?;
                let mode = Mode::Log { input, output };
                let arguments = Arguments { config, mode };
                Ok(arguments)
            }
            _ => Err(anyhow!("unrecognized subcommand")),
        }
    }
}

impl TryFrom<&ArgMatches> for BuildLog {
    type Error = anyhow::Error;

    fn try_from(matches: &ArgMatches) -> Result<Self, Self::Error> {
        let directory = matches
            .get_one::<String>("directory")
            .map(String::to_string)
            .expect("directory is defaulted");
        Ok(BuildLog { directory })
    }
}

impl TryFrom<&ArgMatches> for SourceTree {
    type Error = anyhow::Error;

    fn try_from(matches: &ArgMatches) -> Result<Self, Self::Error> {
        let directory = matches
            .get_one::<String>("directory")
            .map(String::to_string)
            .expect("directory is defaulted");
        let ignore = matches
            .get_many::<String>("ignore")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        Ok(SourceTree { directory, ignore })
    }
}

impl TryFrom<&ArgMatches> for BuildDatabase {
    type Error = anyhow::Error;

    fn try_from(matches: &ArgMatches) -> Result<Self, Self::Error> {
        let file_name = matches
            .get_one::<String>("output")
            .map(String::to_string)
            .expect("output is defaulted");
        Ok(BuildDatabase { file_name })
    }
}

/// Represents the command line interface of the application.
///
/// This describes how the user can interact with the application.
/// The different modes of the application are represented as subcommands.
/// The application can recover commands from a build log, synthesize them
/// from a source tree scan, or run the default mode which is the log
/// recovery.
pub fn cli() -> Command {
    command!()
        .subcommand_required(false)
        .subcommand_negates_reqs(true)
        .args(&[
            arg!(-v --verbose ... "Sets the level of verbosity").action(ArgAction::Count),
            arg!(-c --config <FILE> "Path of the config file"),
        ])
        .subcommand(
            Command::new(MODE_LOG_SUBCOMMAND)
                .about("recovers compile commands from a build log")
                .args(&[
                    arg!(-d --directory <DIR> "Root directory of the build")
                        .default_value(DEFAULT_ROOT_DIRECTORY)
                        .hide_default_value(false),
                    arg!(-o --output <FILE> "Path of the result file")
                        .default_value(DEFAULT_OUTPUT_FILE)
                        .hide_default_value(false),
                ]),
        )
        .subcommand(
            Command::new(MODE_SCAN_SUBCOMMAND)
                .about("synthesizes compile commands from a source tree")
                .args(&[
                    arg!(-d --directory <DIR> "Root directory of the source tree")
                        .default_value(DEFAULT_ROOT_DIRECTORY)
                        .hide_default_value(false),
                    arg!(-o --output <FILE> "Path of the result file")
                        .default_value(DEFAULT_OUTPUT_FILE)
                        .hide_default_value(false),
                    arg!(--ignore <SUBSTRING> "Skip paths containing the substring")
                        .action(ArgAction::Append),
                ]),
        )
        .args(&[
            arg!(-d --directory <DIR> "Root directory of the build")
                .default_value(DEFAULT_ROOT_DIRECTORY)
                .hide_default_value(false),
            arg!(-o --output <FILE> "Path of the result file")
                .default_value(DEFAULT_OUTPUT_FILE)
                .hide_default_value(false),
        ])
}
