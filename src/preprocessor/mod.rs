// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! G-code macro preprocessor - driver.
//!
//! This module ties the dialect-agnostic core (expression environment,
//! conditional and switch stacks, program builder, macro resolver) to the
//! line dispatcher, the include stack and the per-input run flow.

mod directives;
mod engine;
mod include;
mod line_conditionals;
mod line_program;
mod line_switch;
mod passes;
pub mod cli;
#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};

use crate::core::env::{EnvSnapshot, Environment};
use crate::core::expr::Value;
use crate::core::preprocessor::conditional::{ConditionalError, ConditionalStack};
use crate::core::preprocessor::error::{
    Diagnostic, PassCounts, PpError, PpErrorKind, PpRunError, PpRunReport, PrintRecord, Severity,
};
use crate::core::preprocessor::output::{OutputSettings, ProgramWriter};
use crate::core::preprocessor::program::{Program, ProgramSet};
use crate::core::preprocessor::resolver::resolve_program;
use crate::core::preprocessor::switch::SwitchStack;
use crate::core::source_map::SourceOrigin;

use cli::{validate_cli, Cli, CliConfig, Define};

pub use engine::Preprocessor;
pub use include::IncludeSettings;
pub use passes::{seed_environment, FsOutputSink, MemoryOutputSink, OutputSink};

// Re-export public types
pub use crate::core::preprocessor::error::{PpRunError as RunError, PpRunReport as RunReport};
pub use cli::VERSION;

/// Run the preprocessor with command-line arguments.
pub fn run() -> Result<Vec<PpRunReport>, PpRunError> {
    passes::run()
}

/// Run the preprocessor over every input named by `cli`, writing programs
/// to the file system.
pub fn run_with_cli(cli: &Cli) -> Result<Vec<PpRunReport>, PpRunError> {
    passes::run_with_cli(cli)
}

/// Run one input with a validated configuration and an explicit sink.
pub fn run_input(
    path: &Path,
    config: &CliConfig,
    sink: &mut dyn OutputSink,
) -> Result<PpRunReport, PpRunError> {
    passes::run_one(path, config, sink)
}
