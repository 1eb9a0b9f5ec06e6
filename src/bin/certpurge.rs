// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Certificate Removal Command-Line Tool
//!
//! Removes certificates from a Windows certificate store by subject name or
//! serial number, confirming the Root store security prompt automatically.
//!
//! # Usage
//!
//! ```text
//! certpurge [OPTIONS] <SCOPE> <STORE> <IDENTIFIER>...
//!
//! Arguments:
//!   <SCOPE>          CurrentUser or LocalMachine
//!   <STORE>          Store name (My, Root, CA, ...)
//!   <IDENTIFIER>...  Certificate names or serial numbers
//!
//! Options:
//!   -c, --config <PATH>   Path to configuration file
//!   -v, --verbose         Enable verbose output
//!   -q, --quiet           Suppress non-error output
//!       --log-level <LEVEL>  Diagnostic level (trace, debug, info, warn, error)
//!       --dry-run         Show what would be removed without removing it
//!       --no-watcher      Do not watch for the confirmation dialog
//!   -h, --help            Print help
//!   -V, --version         Print version
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Remove a personal certificate by name
//! certpurge CurrentUser My TEST1
//!
//! # Remove a root certificate by serial number
//! certpurge CurrentUser Root 3A1F00C2
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tracing::{debug, warn};

use certpurge::store::WELL_KNOWN_STORES;
use certpurge::windows::{SystemStoreProvider, Win32Desktop, is_elevated, is_windows};
use certpurge::{
    BatchRequest, ConfigLoader, LogLevel, Orchestrator, StdoutReporter, StoreScope, logging,
};

/// Exit code for command-line usage errors.
const EXIT_USAGE: u8 = 2;

/// Certificate Removal Command-Line Tool
#[derive(Parser)]
#[command(name = "certpurge")]
#[command(author = "U.S. Federal Government")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Remove certificates from a Windows certificate store by name or serial number",
    long_about = None
)]
#[command(after_help = help_footer())]
struct Cli {
    /// Store location: CurrentUser or LocalMachine
    #[arg(value_name = "SCOPE")]
    scope: Option<String>,

    /// Certificate store name (e.g. My, Root, CA)
    #[arg(value_name = "STORE")]
    store: Option<String>,

    /// Certificate names or serial numbers to remove
    #[arg(value_name = "IDENTIFIER")]
    identifiers: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long)]
    quiet: bool,

    /// Diagnostic level: trace, debug, info, warn or error
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level)]
    log_level: Option<LogLevel>,

    /// Show what would be removed without removing anything
    #[arg(long)]
    dry_run: bool,

    /// Do not watch for the Root store confirmation dialog
    #[arg(long)]
    no_watcher: bool,
}

fn help_footer() -> String {
    let mut footer = String::from(
        "Examples:\n  \
         certpurge CurrentUser My TEST1\n  \
         certpurge CurrentUser Root 3A1F00C2\n  \
         certpurge LocalMachine TrustedPeople TEST2 \"Old Test CA\"\n\n\
         Store names:\n",
    );
    for (name, description) in WELL_KNOWN_STORES {
        footer.push_str(&format!("  {:<18}{}\n", name, description));
    }
    footer.push_str(
        "\nBlocking user input while the confirmation dialog is handled requires\n\
         administrator rights. LocalMachine stores also require administrator rights.",
    );
    footer
}

fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    LogLevel::parse(s).ok_or_else(|| format!("unknown log level \"{s}\""))
}

fn main() -> ExitCode {
    run(Cli::parse())
}

fn run(cli: Cli) -> ExitCode {
    let (Some(scope), Some(store)) = (&cli.scope, &cli.store) else {
        return print_help();
    };
    if cli.identifiers.is_empty() {
        return print_help();
    }

    let scope: StoreScope = match scope.parse() {
        Ok(scope) => scope,
        Err(e) => {
            println!("Error: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_path(path);
    }
    let config = match loader.load() {
        Ok(config) => config,
        Err(e) => {
            println!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let configured = cli.log_level.unwrap_or(config.logging.level);
    logging::init(LogLevel::resolve(cli.verbose, cli.quiet, configured));
    debug!("Starting certpurge v{}", certpurge::VERSION);

    let use_watcher = !cli.no_watcher && config.watcher.enabled;
    if !is_windows() {
        warn!("Windows certificate stores are not available on this platform");
    } else if use_watcher && config.watcher.block_input && !is_elevated() {
        warn!("Not running as administrator; user input will not be blocked");
    }

    let mut orchestrator = Orchestrator::new(SystemStoreProvider, Arc::new(StdoutReporter))
        .dry_run(cli.dry_run);
    if use_watcher {
        orchestrator = orchestrator.with_watcher(Arc::new(Win32Desktop::new()), config.watcher);
    }

    let request = BatchRequest::new(scope, store.as_str(), cli.identifiers);
    match orchestrator.run(&request) {
        Ok(outcome) => {
            debug!(
                removed = outcome.summary.removed,
                not_found = outcome.summary.not_found,
                "Batch complete"
            );
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}

fn print_help() -> ExitCode {
    match Cli::command().print_help() {
        Ok(()) => {
            println!();
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
