// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};

use clap::Parser;

use super::*;

/// Destination for generated program files.
pub trait OutputSink {
    fn create_dir(&mut self, dir: &Path) -> io::Result<()>;
    fn open(&mut self, path: &Path) -> io::Result<Box<dyn Write + '_>>;
}

/// Writes programs to the file system.
#[derive(Debug, Default)]
pub struct FsOutputSink;

impl OutputSink for FsOutputSink {
    fn create_dir(&mut self, dir: &Path) -> io::Result<()> {
        if dir.as_os_str().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(dir)
    }

    fn open(&mut self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        Ok(Box::new(File::create(path)?))
    }
}

/// Collects programs in memory, keyed by path.
#[derive(Debug, Default)]
pub struct MemoryOutputSink {
    dirs: Vec<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl MemoryOutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn files(&self) -> &BTreeMap<PathBuf, Vec<u8>> {
        &self.files
    }

    pub fn file_text(&self, path: &Path) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

struct MemoryFile<'a> {
    buffer: &'a mut Vec<u8>,
}

impl Write for MemoryFile<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl OutputSink for MemoryOutputSink {
    fn create_dir(&mut self, dir: &Path) -> io::Result<()> {
        if !self.dirs.iter().any(|known| known == dir) {
            self.dirs.push(dir.to_path_buf());
        }
        Ok(())
    }

    fn open(&mut self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        let buffer = self.files.entry(path.to_path_buf()).or_default();
        buffer.clear();
        Ok(Box::new(MemoryFile { buffer }))
    }
}

/// Environment a run starts from: the argument-letter constants, the
/// configuration values and the `-D` definitions, in that order.
pub fn seed_environment(config: &CliConfig) -> Environment {
    let mut env = Environment::with_constants();
    env.set_max_depth(config.expr_depth);

    let output = &config.output;
    env.set(
        "outputDir",
        Value::Str(output.output_dir().to_string_lossy().into_owned()),
    );
    if let Some(control) = &config.controller {
        env.set("control", Value::Str(control.clone()));
    }
    if let Some(model) = &config.model {
        env.set("model", Value::Str(model.clone()));
    }
    env.set("leader", Value::Str(output.leader.clone()));
    env.set("trailer", Value::Str(output.trailer.clone()));
    env.set("fileExtension", Value::Str(output.extension.clone()));
    env.set("progNumFileName", Value::Bool(output.name_by_number));
    env.set("verbose", Value::Bool(output.verbose));

    for define in &config.defines {
        bind_define(&mut env, define);
    }
    env
}

fn bind_define(env: &mut Environment, define: &Define) {
    let value = match &define.expr {
        None => Value::Int(1),
        Some(expr) => env
            .eval(expr)
            .unwrap_or_else(|_| Value::Str(expr.clone())),
    };
    env.set(&define.name, value);
}

pub(super) fn run() -> Result<Vec<PpRunReport>, PpRunError> {
    let cli = Cli::parse();
    run_with_cli(&cli)
}

pub(super) fn run_with_cli(cli: &Cli) -> Result<Vec<PpRunReport>, PpRunError> {
    let config = validate_cli(cli)?;

    let mut sink = FsOutputSink;
    let mut reports = Vec::new();
    for path in &config.input_paths {
        let report = run_one(path, &config, &mut sink)?;
        let aborted = report.aborted();
        reports.push(report);
        // `@error` stops the whole run; later inputs are never read.
        if aborted {
            break;
        }
    }

    if config.warning_policy.treat_warnings_as_errors {
        let mut warning_diags = Vec::new();
        for report in &reports {
            for diag in report.diagnostics() {
                if diag.severity() == Severity::Warning {
                    let mut warning = diag.clone();
                    warning.severity = Severity::Error;
                    warning_diags.push(warning);
                }
            }
        }
        if !warning_diags.is_empty() {
            return Err(PpRunError::new(
                PpError::new(PpErrorKind::Cli, "Warnings treated as errors (-Werror)", None),
                warning_diags,
            ));
        }
    }

    Ok(reports)
}

/// Preprocess one input and write its programs when the run is clean.
pub(super) fn run_one(
    path: &Path,
    config: &CliConfig,
    sink: &mut dyn OutputSink,
) -> Result<PpRunReport, PpRunError> {
    let include = IncludeSettings {
        paths: config.include_paths.clone(),
        max_depth: config.include_depth,
    };
    let mut pp = Preprocessor::new(seed_environment(config), include);
    pp.process_file(path);
    let mut report = pp.finish(path.to_string_lossy());

    let blocked_by_warnings =
        config.warning_policy.treat_warnings_as_errors && report.warning_count() > 0;
    if report.succeeded() && !blocked_by_warnings {
        write_programs(&mut report, &config.output, sink);
    }
    Ok(report)
}

fn write_programs(report: &mut PpRunReport, settings: &OutputSettings, sink: &mut dyn OutputSink) {
    let dir = settings.output_dir().to_path_buf();
    if let Err(err) = sink.create_dir(&dir) {
        let detail = format!("{}: {err}", dir.display());
        report.push_diagnostic(Diagnostic::new(
            0,
            Severity::Error,
            PpError::new(PpErrorKind::Io, "error creating output directory", Some(&detail)),
        ));
        return;
    }

    let targets: Vec<(PathBuf, usize)> = report
        .programs()
        .iter()
        .enumerate()
        .filter(|(_, program)| program.is_done())
        .map(|(idx, program)| (settings.file_path(program), idx))
        .collect();

    for (path, idx) in targets {
        let result = sink.open(&path).and_then(|out| {
            let mut writer = ProgramWriter::new(out, settings);
            writer.write_program(&report.programs()[idx])
        });
        match result {
            Ok(()) => report.record_written(path),
            Err(err) => {
                let detail = format!("{}: {err}", path.display());
                report.push_diagnostic(Diagnostic::new(
                    0,
                    Severity::Error,
                    PpError::new(PpErrorKind::Io, "error writing file", Some(&detail)),
                ));
            }
        }
    }
}
