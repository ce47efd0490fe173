// SPDX-License-Identifier: GPL-3.0-or-later
use std::process::ExitCode;

use cdbgen::modes::Mode;
use cdbgen::{args, config};

/// Driver function of the application.
fn main() -> anyhow::Result<ExitCode> {
    // Initialize the logging system.
    env_logger::init();
    // Get the package name and version from Cargo
    let pkg_name = env!("CARGO_PKG_NAME");
    let pkg_version = env!("CARGO_PKG_VERSION");
    log::debug!("{} v{}", pkg_name, pkg_version);

    // Parse the command line arguments.
    let matches = args::cli().get_matches();
    let arguments = args::Arguments::try_from(matches)?;
    log::debug!("Arguments: {:?}", arguments);

    // Load the configuration.
    let configuration = config::Main::load(&arguments.config)?;
    log::debug!("Configuration: {:?}", configuration);

    // Run the application.
    let mode = Mode::configure(arguments, configuration)?;
    let result = mode.run();
    log::debug!("Exit code: {:?}", result);

    Ok(result)
}
