// SPDX-License-Identifier: GPL-3.0-or-later

//! This module defines the configuration of the application.
//!
//! The configuration is either loaded from a file or used with default
//! values, which are defined in the code. Every setting has a default,
//! so the configuration file is optional.
//!
//! The configuration file syntax is based on the YAML format.
//! The default configuration file name is `cdbgen.yml`.
//!
//! ```yaml
//! schema: "1.0"
//!
//! compiler: gcc
//! log:
//!   input: build.log
//! scan:
//!   standard: gnu11
//!   defines:
//!     - KERNEL
//!   ignore:
//!     - third_party
//! ```

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use log::{debug, info};
use serde::{Deserialize, Serialize};

const SUPPORTED_SCHEMA_VERSION: &str = "1.0";
const DEFAULT_COMPILER: &str = "gcc";
const DEFAULT_LOG_FILE: &str = "build.log";
const DEFAULT_C_STANDARD: &str = "gnu11";

/// Represents the application configuration.
#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct Main {
    #[serde(deserialize_with = "validate_schema_version")]
    pub schema: String,
    /// The token that identifies a compiler invocation. It is matched
    /// against recovered commands and names the toolchain of synthesized
    /// ones.
    #[serde(default = "default_compiler")]
    pub compiler: String,
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub scan: Scan,
}

impl Main {
    /// Loads the configuration from the specified file or the default locations.
    ///
    /// If the configuration file is specified, it will be used. Otherwise, the default locations
    /// will be searched for the configuration file. If the configuration file is not found, the
    /// default configuration will be returned.
    pub fn load(file: &Option<String>) -> Result<Self> {
        if let Some(path) = file {
            // If the configuration file is specified, use it.
            let config_file_path = PathBuf::from(path);
            Self::from_file(config_file_path.as_path())
        } else {
            // Otherwise, try to find the configuration file in the default locations.
            let locations = Self::file_locations();
            for location in locations {
                debug!("Checking configuration file: {}", location.display());
                if location.exists() {
                    return Self::from_file(location.as_path());
                }
            }
            // If the configuration file is not found, return the default configuration.
            debug!("Configuration file not found. Using the default configuration.");
            Ok(Self::default())
        }
    }

    /// The default locations where the configuration file can be found.
    ///
    /// The locations are searched in the following order:
    /// - The current working directory.
    /// - The local configuration directory of the user.
    /// - The configuration directory of the user.
    /// - The local configuration directory of the application.
    /// - The configuration directory of the application.
    fn file_locations() -> Vec<PathBuf> {
        let mut locations = Vec::new();

        if let Ok(current_dir) = std::env::current_dir() {
            locations.push(current_dir);
        }
        if let Some(base_dirs) = BaseDirs::new() {
            locations.push(base_dirs.config_local_dir().to_path_buf());
            locations.push(base_dirs.config_dir().to_path_buf());
        }

        if let Some(proj_dirs) = ProjectDirs::from("com.github", "rizsotto", "cdbgen") {
            locations.push(proj_dirs.config_local_dir().to_path_buf());
            locations.push(proj_dirs.config_dir().to_path_buf());
        }
        // filter out duplicate elements from the list
        locations.dedup();
        // append the default configuration file name to the locations
        locations.iter().map(|p| p.join("cdbgen.yml")).collect()
    }

    /// Loads the configuration from the specified file.
    pub fn from_file(file: &Path) -> Result<Self> {
        info!("Loading configuration file: {}", file.display());

        let reader = OpenOptions::new()
            .read(true)
            .open(file)
            .with_context(|| format!("Failed to open configuration file: {:?}", file))?;

        let content = Self::from_reader(reader)
            .with_context(|| format!("Failed to parse configuration from file: {:?}", file))?;

        Ok(content)
    }

    /// Define the deserialization format of the config file.
    fn from_reader<R, T>(rdr: R) -> serde_yml::Result<T>
    where
        R: std::io::Read,
        T: serde::de::DeserializeOwned + 'static,
    {
        serde_yml::from_reader(rdr)
    }
}

impl Default for Main {
    fn default() -> Self {
        Main {
            schema: String::from(SUPPORTED_SCHEMA_VERSION),
            compiler: default_compiler(),
            log: Log::default(),
            scan: Scan::default(),
        }
    }
}

/// Configuration of the build log recovery.
///
/// The input file is resolved relative to the working directory the
/// application was started from.
#[derive(Debug, PartialEq, Deserialize, Serialize)]
pub struct Log {
    #[serde(default = "default_log_file")]
    pub input: String,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            input: default_log_file(),
        }
    }
}

/// Configuration of the source tree scan.
///
/// - Standard: the value of the `-std` flag of the synthesized commands.
/// - Defines: one `-D` flag is emitted for each element.
/// - Ignore: paths containing any of these substrings are skipped.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Scan {
    #[serde(default = "default_standard")]
    pub standard: String,
    #[serde(default)]
    pub defines: Vec<String>,
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl Default for Scan {
    fn default() -> Self {
        Scan {
            standard: default_standard(),
            defines: vec![],
            ignore: vec![],
        }
    }
}

fn default_compiler() -> String {
    String::from(DEFAULT_COMPILER)
}

fn default_log_file() -> String {
    String::from(DEFAULT_LOG_FILE)
}

fn default_standard() -> String {
    String::from(DEFAULT_C_STANDARD)
}

fn validate_schema_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let schema = String::deserialize(deserializer)?;
    if schema != SUPPORTED_SCHEMA_VERSION {
        Err(serde::de::Error::custom(format!(
            "Unsupported schema version: {schema}. Expected: {SUPPORTED_SCHEMA_VERSION}"
        )))
    } else {
        Ok(schema)
    }
}
