// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for gplus.

use std::fs::OpenOptions;
use std::io::{self, Write};

use clap::Parser;
use serde_json::json;

use gplus::core::preprocessor::error::{Diagnostic, PpRunReport, PrintRecord, Severity};
use gplus::preprocessor::cli::{
    validate_cli, Cli, CliConfig, DiagnosticsSinkConfig, DiagnosticsStyle, OutputFormat,
};

struct DiagnosticsSink {
    writer: Option<Box<dyn Write>>,
}

impl DiagnosticsSink {
    fn from_config(config: &DiagnosticsSinkConfig) -> io::Result<Self> {
        match config {
            DiagnosticsSinkConfig::Disabled => Ok(Self { writer: None }),
            DiagnosticsSinkConfig::Stderr => Ok(Self {
                writer: Some(Box::new(io::stderr())),
            }),
            DiagnosticsSinkConfig::File { path, append } => {
                let mut opts = OpenOptions::new();
                opts.create(true).write(true);
                if *append {
                    opts.append(true);
                } else {
                    opts.truncate(true);
                }
                let file = opts.open(path)?;
                Ok(Self {
                    writer: Some(Box::new(file)),
                })
            }
        }
    }

    fn emit_line(&mut self, line: &str) {
        if let Some(writer) = &mut self.writer {
            let _ = writeln!(writer, "{line}");
        }
    }

    fn emit_diagnostics(
        &mut self,
        diagnostics: &[Diagnostic],
        format: OutputFormat,
        style: DiagnosticsStyle,
    ) {
        for diag in diagnostics {
            self.emit_line(&format_diagnostic_line(diag, format, style));
        }
    }
}

fn severity_to_str(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

fn format_diagnostic_line(
    diag: &Diagnostic,
    format: OutputFormat,
    style: DiagnosticsStyle,
) -> String {
    if format == OutputFormat::Json {
        json!({
            "code": diag.code(),
            "severity": severity_to_str(diag.severity()),
            "message": diag.message(),
            "file": diag.file(),
            "line": diag.line(),
            "related": diag.related().map(|related| json!({
                "file": related.origin.file.clone(),
                "line": related.origin.line,
                "label": related.label.clone(),
            })),
            "notes": diag.notes(),
            "help": diag.help(),
        })
        .to_string()
    } else if style == DiagnosticsStyle::Classic {
        diag.format()
    } else {
        diag.format_with_context()
    }
}

fn format_print_line(print: &PrintRecord, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        json!({
            "kind": "print",
            "file": print.origin.file.clone(),
            "line": print.origin.line,
            "expr": print.expr.clone(),
            "value": print.value.clone(),
        })
        .to_string()
    } else {
        print.format()
    }
}

fn format_status_line(report: &PpRunReport, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        json!({
            "kind": "status",
            "input": report.input(),
            "success": report.succeeded(),
            "errors": report.error_count(),
            "warnings": report.warning_count(),
            "written": report
                .written()
                .iter()
                .map(|path| path.to_string_lossy().into_owned())
                .collect::<Vec<_>>(),
        })
        .to_string()
    } else {
        report.status_line()
    }
}

fn visible_diagnostics(diagnostics: &[Diagnostic], config: &CliConfig) -> Vec<Diagnostic> {
    diagnostics
        .iter()
        .filter(|diag| config.warning_policy.emit_warnings || diag.severity() != Severity::Warning)
        .cloned()
        .collect()
}

fn main() {
    let cli = Cli::parse();
    let cli_config = match validate_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let mut sink = match DiagnosticsSink::from_config(&cli_config.diagnostics_sink) {
        Ok(sink) => sink,
        Err(err) => {
            eprintln!("Failed to open diagnostics sink: {err}");
            std::process::exit(1);
        }
    };

    let format = cli_config.output_format;
    let style = cli_config.diagnostics_style;
    match gplus::preprocessor::run_with_cli(&cli) {
        Ok(reports) => {
            let mut failed = false;
            for report in &reports {
                for print in report.prints() {
                    println!("{}", format_print_line(print, format));
                }
                failed |= !report.succeeded();
                if cli_config.quiet && report.succeeded() {
                    continue;
                }
                let diagnostics = visible_diagnostics(report.diagnostics(), &cli_config);
                sink.emit_diagnostics(&diagnostics, format, style);
                println!("{}", format_status_line(report, format));
            }
            if failed {
                std::process::exit(1);
            }
        }
        Err(err) => {
            let diagnostics = visible_diagnostics(err.diagnostics(), &cli_config);
            sink.emit_diagnostics(&diagnostics, format, style);
            if format != OutputFormat::Json
                && !matches!(cli_config.diagnostics_sink, DiagnosticsSinkConfig::Disabled)
            {
                sink.emit_line(&err.to_string());
            }
            std::process::exit(1);
        }
    }
}
