// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and argument validation.

use std::env;
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use crate::core::preprocessor::error::{PpError, PpErrorKind, PpRunError};
use crate::core::preprocessor::output::OutputSettings;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_INCLUDE_DEPTH: usize = 64;
pub const DEFAULT_EXPR_DEPTH: usize = 64;

const LONG_ABOUT: &str = "Directive-driven macro preprocessor for G-code programs.

Each input file is processed on its own. Every @program ... @endprogram block
that completes becomes one output file named <number>.<ext> (or <name>.<ext>
with -p) inside the output directory. Nothing is written for an input that
reports errors.
Configuration values are bound in the expression environment before the first
line is read: outputDir, control, model, leader, trailer, fileExtension,
progNumFileName and verbose, followed by -D definitions.";

#[derive(Parser, Debug)]
#[command(
    name = "gplus",
    version = VERSION,
    about = "G-code macro preprocessor with conditionals, switch tables and program blocks",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        long = "format",
        value_enum,
        default_value_t = OutputFormat::Text,
        long_help = "Select CLI output format. text is default; json writes one JSON object per diagnostic, print and status line."
    )]
    pub format: OutputFormat,
    #[arg(
        long = "diagnostics-style",
        value_enum,
        default_value_t = DiagnosticsStyle::Classic,
        long_help = "Diagnostic layout for text output. classic prints one line per diagnostic; rich adds the offending source line, related origins, notes and help."
    )]
    pub diagnostics_style: DiagnosticsStyle,
    #[arg(
        short = 'q',
        long = "quiet",
        action = ArgAction::SetTrue,
        long_help = "Suppress diagnostic and status output for successful runs. Errors are still reported unless --no-error is set."
    )]
    pub quiet: bool,
    #[arg(
        short = 'E',
        long = "error",
        value_name = "FILE",
        long_help = "Write diagnostics to FILE instead of stderr."
    )]
    pub error_file: Option<PathBuf>,
    #[arg(
        long = "error-append",
        action = ArgAction::SetTrue,
        requires = "error_file",
        long_help = "Append diagnostics to --error FILE instead of truncating it."
    )]
    pub error_append: bool,
    #[arg(
        long = "no-error",
        action = ArgAction::SetTrue,
        conflicts_with_all = ["error_file", "error_append"],
        long_help = "Disable all diagnostic output routing."
    )]
    pub no_error: bool,
    #[arg(
        short = 'w',
        long = "no-warn",
        action = ArgAction::SetTrue,
        conflicts_with = "warn_error",
        long_help = "Suppress warning diagnostics."
    )]
    pub no_warn: bool,
    #[arg(
        long = "Werror",
        action = ArgAction::SetTrue,
        conflicts_with = "no_warn",
        long_help = "Treat warnings as errors (non-zero exit status)."
    )]
    pub warn_error: bool,
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        long_help = "Output directory for generated programs. Created when missing. Defaults to the current directory."
    )]
    pub output_dir: Option<PathBuf>,
    #[arg(
        short = 'c',
        long = "controller",
        value_name = "ID",
        long_help = "Controller type, bound as `control` in the expression environment."
    )]
    pub controller: Option<String>,
    #[arg(
        short = 'm',
        long = "model",
        value_name = "ID",
        long_help = "Machine model, bound as `model` in the expression environment."
    )]
    pub model: Option<String>,
    #[arg(
        short = 'l',
        long = "leader",
        value_name = "TEXT",
        long_help = "Line written before each program. Defaults to %."
    )]
    pub leader: Option<String>,
    #[arg(
        short = 't',
        long = "trailer",
        value_name = "TEXT",
        long_help = "Line written after each program. Defaults to %."
    )]
    pub trailer: Option<String>,
    #[arg(
        short = 'e',
        long = "extension",
        value_name = "EXT",
        long_help = "Output file extension, with or without a leading dot. Defaults to nc."
    )]
    pub extension: Option<String>,
    #[arg(
        short = 'p',
        long = "prog-name",
        action = ArgAction::SetTrue,
        long_help = "Name output files after the program name instead of the program number."
    )]
    pub prog_name: bool,
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::SetTrue,
        long_help = "Annotate every output line with its source file:line and comment, and keep comment-only lines."
    )]
    pub verbose: bool,
    #[arg(
        short = 'D',
        long = "define",
        value_name = "NAME[=EXPR]",
        action = ArgAction::Append,
        long_help = "Predefine a symbol (repeatable). EXPR is evaluated; if it does not evaluate it is bound as a string. If EXPR is omitted, defaults to 1."
    )]
    pub defines: Vec<String>,
    #[arg(
        short = 'I',
        long = "include-path",
        value_name = "DIR",
        action = ArgAction::Append,
        long_help = "Additional include search root (repeatable). Include resolution order is: including file directory, then include roots in command-line order, then the path as written."
    )]
    pub include_paths: Vec<PathBuf>,
    #[arg(
        long = "include-depth",
        value_name = "N",
        default_value_t = DEFAULT_INCLUDE_DEPTH,
        long_help = "Maximum @include nesting depth. Defaults to 64."
    )]
    pub include_depth: usize,
    #[arg(
        long = "expr-depth",
        value_name = "N",
        default_value_t = DEFAULT_EXPR_DEPTH,
        long_help = "Maximum expression nesting depth. Defaults to 64."
    )]
    pub expr_depth: usize,
    #[arg(
        short = 'i',
        long = "infile",
        value_name = "FILE",
        action = ArgAction::Append,
        long_help = "Input source file (repeatable)."
    )]
    pub infiles: Vec<PathBuf>,
    #[arg(
        value_name = "INPUT",
        action = ArgAction::Append,
        long_help = "Input source files, processed in order. Equivalent to repeated -i."
    )]
    pub positional_inputs: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub enum DiagnosticsSinkConfig {
    Stderr,
    File { path: PathBuf, append: bool },
    Disabled,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WarningPolicy {
    pub emit_warnings: bool,
    pub treat_warnings_as_errors: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DiagnosticsStyle {
    #[default]
    Classic,
    Rich,
}

/// A `-D` definition split into name and optional expression text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Define {
    pub name: String,
    pub expr: Option<String>,
}

pub fn parse_define(text: &str) -> Result<Define, PpRunError> {
    let (name, expr) = match text.split_once('=') {
        Some((name, expr)) => (name.trim(), Some(expr.trim().to_string())),
        None => (text.trim(), None),
    };
    if !crate::core::env::is_identifier(name) {
        return Err(cli_error(format!("Invalid -D/--define name: {text}")));
    }
    Ok(Define {
        name: name.to_string(),
        expr,
    })
}

fn cli_error(message: impl Into<String>) -> PpRunError {
    PpRunError::new(
        PpError::new(PpErrorKind::Cli, &message.into(), None),
        Vec::new(),
    )
}

fn parse_env_bool(var_name: &str) -> Result<Option<bool>, PpRunError> {
    let Some(raw) = env::var_os(var_name) else {
        return Ok(None);
    };
    let value = raw.to_string_lossy().trim().to_ascii_lowercase();
    let parsed = match value.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        "" => None,
        _ => {
            return Err(cli_error(format!(
                "Invalid boolean value for {var_name}: {value}"
            )))
        }
    };
    Ok(parsed)
}

fn parse_env_path(var_name: &str) -> Result<Option<PathBuf>, PpRunError> {
    Ok(parse_env_string(var_name)?.map(PathBuf::from))
}

fn parse_env_path_list(var_name: &str) -> Result<Vec<PathBuf>, PpRunError> {
    let Some(raw) = env::var_os(var_name) else {
        return Ok(Vec::new());
    };
    let values: Vec<PathBuf> = env::split_paths(&raw)
        .filter(|path| !path.as_os_str().is_empty())
        .collect();
    Ok(values)
}

fn parse_env_csv_list(var_name: &str) -> Result<Vec<String>, PpRunError> {
    let Some(raw) = env::var_os(var_name) else {
        return Ok(Vec::new());
    };
    let value = raw.to_string_lossy();
    Ok(value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect())
}

fn parse_env_usize(var_name: &str) -> Result<Option<usize>, PpRunError> {
    let Some(value) = parse_env_string(var_name)? else {
        return Ok(None);
    };
    value
        .parse::<usize>()
        .map(Some)
        .map_err(|_| cli_error(format!("Invalid integer value for {var_name}: {value}")))
}

fn parse_env_string(var_name: &str) -> Result<Option<String>, PpRunError> {
    let Some(raw) = env::var_os(var_name) else {
        return Ok(None);
    };
    let value = raw.to_string_lossy().trim().to_string();
    if value.is_empty() {
        return Ok(None);
    }
    Ok(Some(value))
}

/// Validate CLI arguments and return parsed configuration.
pub fn validate_cli(cli: &Cli) -> Result<CliConfig, PpRunError> {
    let env_output = parse_env_path("GPLUS_OUTPUT")?;
    let env_controller = parse_env_string("GPLUS_CONTROLLER")?;
    let env_model = parse_env_string("GPLUS_MODEL")?;
    let env_leader = parse_env_string("GPLUS_LEADER")?;
    let env_trailer = parse_env_string("GPLUS_TRAILER")?;
    let env_extension = parse_env_string("GPLUS_EXTENSION")?;
    let env_prog_name = parse_env_bool("GPLUS_PROG_NAME")?;
    let env_verbose = parse_env_bool("GPLUS_VERBOSE")?;
    let env_defines = parse_env_csv_list("GPLUS_DEFINES")?;
    let env_include_paths = parse_env_path_list("GPLUS_INCLUDE_PATHS")?;
    let env_include_depth = parse_env_usize("GPLUS_INCLUDE_DEPTH")?;
    let env_expr_depth = parse_env_usize("GPLUS_EXPR_DEPTH")?;

    let env_quiet = parse_env_bool("GPLUS_QUIET")?;
    let env_no_warn = parse_env_bool("GPLUS_NO_WARN")?;
    let env_warn_error = parse_env_bool("GPLUS_WERROR")?;

    let env_error_file = parse_env_path("GPLUS_ERROR_FILE")?;
    let env_error_append = parse_env_bool("GPLUS_ERROR_APPEND")?;
    let env_no_error = parse_env_bool("GPLUS_NO_ERROR")?;

    let mut effective_defines = Vec::new();
    for text in env_defines.iter().chain(cli.defines.iter()) {
        effective_defines.push(parse_define(text)?);
    }

    let mut effective_include_paths = env_include_paths;
    effective_include_paths.extend(cli.include_paths.clone());

    let effective_quiet = if cli.quiet {
        true
    } else {
        env_quiet.unwrap_or(false)
    };

    let effective_no_warn = if cli.no_warn {
        true
    } else if cli.warn_error {
        false
    } else {
        env_no_warn.unwrap_or(false)
    };

    let effective_warn_error = if cli.warn_error {
        true
    } else if effective_no_warn {
        false
    } else {
        env_warn_error.unwrap_or(false)
    };

    let effective_error_file = if cli.error_file.is_some() {
        cli.error_file.clone()
    } else {
        env_error_file
    };

    let effective_error_append = if cli.error_append {
        true
    } else {
        env_error_append.unwrap_or(false)
    };

    let effective_no_error = if cli.no_error {
        true
    } else if cli.error_file.is_some() {
        false
    } else {
        env_no_error.unwrap_or(false)
    };

    let effective_prog_name = if cli.prog_name {
        true
    } else {
        env_prog_name.unwrap_or(false)
    };

    let effective_verbose = if cli.verbose {
        true
    } else {
        env_verbose.unwrap_or(false)
    };

    let effective_include_depth = if cli.include_depth != DEFAULT_INCLUDE_DEPTH {
        cli.include_depth
    } else {
        env_include_depth.unwrap_or(cli.include_depth)
    };

    let effective_expr_depth = if cli.expr_depth != DEFAULT_EXPR_DEPTH {
        cli.expr_depth
    } else {
        env_expr_depth.unwrap_or(cli.expr_depth)
    };

    let effective_extension = cli
        .extension
        .clone()
        .or(env_extension)
        .unwrap_or_else(|| "nc".to_string());
    let effective_extension = effective_extension
        .trim()
        .trim_start_matches('.')
        .to_string();
    if effective_extension.is_empty() {
        return Err(cli_error("-e/--extension must not be empty"));
    }

    let input_paths = if !cli.infiles.is_empty() {
        if !cli.positional_inputs.is_empty() {
            return Err(cli_error(
                "Do not mix positional input with -i/--infile; use one style",
            ));
        }
        cli.infiles.clone()
    } else if !cli.positional_inputs.is_empty() {
        cli.positional_inputs.clone()
    } else {
        return Err(cli_error("No input files specified"));
    };

    if effective_include_depth == 0 {
        return Err(cli_error("--include-depth must be at least 1"));
    }

    if effective_expr_depth == 0 {
        return Err(cli_error("--expr-depth must be at least 1"));
    }

    Ok(CliConfig {
        input_paths,
        output: OutputSettings {
            output_dir: cli.output_dir.clone().or(env_output).unwrap_or_default(),
            leader: cli
                .leader
                .clone()
                .or(env_leader)
                .unwrap_or_else(|| "%".to_string()),
            trailer: cli
                .trailer
                .clone()
                .or(env_trailer)
                .unwrap_or_else(|| "%".to_string()),
            extension: effective_extension,
            name_by_number: !effective_prog_name,
            verbose: effective_verbose,
        },
        controller: cli.controller.clone().or(env_controller),
        model: cli.model.clone().or(env_model),
        defines: effective_defines,
        include_paths: effective_include_paths,
        include_depth: effective_include_depth,
        expr_depth: effective_expr_depth,
        quiet: effective_quiet,
        output_format: cli.format,
        diagnostics_style: cli.diagnostics_style,
        diagnostics_sink: if effective_no_error {
            DiagnosticsSinkConfig::Disabled
        } else if let Some(path) = &effective_error_file {
            DiagnosticsSinkConfig::File {
                path: path.clone(),
                append: effective_error_append,
            }
        } else {
            DiagnosticsSinkConfig::Stderr
        },
        warning_policy: WarningPolicy {
            emit_warnings: !effective_no_warn,
            treat_warnings_as_errors: effective_warn_error,
        },
    })
}

/// Validated CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub input_paths: Vec<PathBuf>,
    pub output: OutputSettings,
    pub controller: Option<String>,
    pub model: Option<String>,
    pub defines: Vec<Define>,
    pub include_paths: Vec<PathBuf>,
    pub include_depth: usize,
    pub expr_depth: usize,
    pub quiet: bool,
    pub output_format: OutputFormat,
    pub diagnostics_style: DiagnosticsStyle,
    pub diagnostics_sink: DiagnosticsSinkConfig,
    pub warning_policy: WarningPolicy,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            input_paths: Vec::new(),
            output: OutputSettings::default(),
            controller: None,
            model: None,
            defines: Vec::new(),
            include_paths: Vec::new(),
            include_depth: DEFAULT_INCLUDE_DEPTH,
            expr_depth: DEFAULT_EXPR_DEPTH,
            quiet: false,
            output_format: OutputFormat::Text,
            diagnostics_style: DiagnosticsStyle::Classic,
            diagnostics_sink: DiagnosticsSinkConfig::Stderr,
            warning_policy: WarningPolicy {
                emit_warnings: true,
                treat_warnings_as_errors: false,
            },
        }
    }
}
