// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and run reporting for the preprocessor.

use std::fmt;
use std::path::PathBuf;

use crate::core::source_map::SourceOrigin;

use super::program::Program;

/// Categories of preprocessor errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpErrorKind {
    Cli,
    Conditional,
    Directive,
    Expression,
    Fatal,
    Include,
    Io,
    Macro,
    Program,
    Switch,
}

/// A preprocessor error with a kind and message.
#[derive(Debug, Clone)]
pub struct PpError {
    kind: PpErrorKind,
    message: String,
}

impl PpError {
    pub fn new(kind: PpErrorKind, msg: &str, param: Option<&str>) -> Self {
        Self {
            kind,
            message: format_error(msg, param),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> PpErrorKind {
        self.kind
    }
}

impl fmt::Display for PpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PpError {}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A second source position a diagnostic refers to, such as the earlier
/// definition in a duplicate-definition warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedOrigin {
    pub origin: SourceOrigin,
    pub label: String,
}

/// A diagnostic message with location and context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub(crate) line: u32,
    pub(crate) code: String,
    pub(crate) severity: Severity,
    pub(crate) error: PpError,
    pub(crate) file: Option<String>,
    pub(crate) source: Option<String>,
    pub(crate) related: Option<RelatedOrigin>,
    pub(crate) notes: Vec<String>,
    pub(crate) help: Vec<String>,
}

impl Diagnostic {
    pub fn new(line: u32, severity: Severity, error: PpError) -> Self {
        Self {
            line,
            code: default_diagnostic_code(error.kind()).to_string(),
            severity,
            error,
            file: None,
            source: None,
            related: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    pub fn at(origin: &SourceOrigin, severity: Severity, error: PpError) -> Self {
        Self::new(origin.line, severity, error).with_file(Some(origin.file.clone()))
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn with_related(mut self, origin: SourceOrigin, label: impl Into<String>) -> Self {
        self.related = Some(RelatedOrigin {
            origin,
            label: label.into(),
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// Single-line rendering: `file:line: SEVERITY [code] - message at origin`.
    pub fn format(&self) -> String {
        let sev = severity_label(self.severity);
        let location = match &self.file {
            Some(file) => format!("{file}:{}", self.line),
            None => self.line.to_string(),
        };
        let mut out = format!("{location}: {sev} [{}] - {}", self.code, self.error.message());
        if let Some(related) = &self.related {
            out.push_str(&format!(" at {}", related.origin));
        }
        out
    }

    pub fn format_with_context(&self) -> String {
        let sev = severity_label(self.severity);
        let header = match &self.file {
            Some(file) => format!("{file}:{}: {sev} [{}]", self.line, self.code),
            None => format!("{}: {sev} [{}]", self.line, self.code),
        };

        let mut out = String::new();
        out.push_str(&header);
        out.push('\n');

        if let Some(source) = &self.source {
            out.push_str(&build_context_line(self.line, source));
            out.push('\n');
        }

        if let Some(related) = &self.related {
            out.push_str(&format!(
                "      = note: {} at {}\n",
                related.label, related.origin
            ));
        }

        for note in &self.notes {
            out.push_str("note: ");
            out.push_str(note);
            out.push('\n');
        }

        for help in &self.help {
            out.push_str("help: ");
            out.push_str(help);
            out.push('\n');
        }

        out.push_str(&format!("{sev}: {}", self.error.message()));
        out
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn message(&self) -> &str {
        self.error.message()
    }

    pub fn kind(&self) -> PpErrorKind {
        self.error.kind()
    }

    pub fn related(&self) -> Option<&RelatedOrigin> {
        self.related.as_ref()
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn help(&self) -> &[String] {
        &self.help
    }
}

/// Output of an `@print` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintRecord {
    pub origin: SourceOrigin,
    pub expr: String,
    pub value: Option<String>,
}

impl PrintRecord {
    /// `file:line print: expr = value`; a failed evaluation shows `undefined`.
    pub fn format(&self) -> String {
        format!(
            "{} print: {} = {}",
            self.origin,
            self.expr,
            self.value.as_deref().unwrap_or("undefined")
        )
    }
}

/// Error and warning totals for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassCounts {
    pub lines: u32,
    pub errors: u32,
    pub warnings: u32,
}

impl PassCounts {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Result of preprocessing one input file.
#[derive(Debug)]
pub struct PpRunReport {
    input: String,
    diagnostics: Vec<Diagnostic>,
    prints: Vec<PrintRecord>,
    programs: Vec<Program>,
    written: Vec<PathBuf>,
    counts: PassCounts,
    aborted: bool,
}

impl PpRunReport {
    pub fn new(
        input: impl Into<String>,
        diagnostics: Vec<Diagnostic>,
        prints: Vec<PrintRecord>,
        programs: Vec<Program>,
        counts: PassCounts,
        aborted: bool,
    ) -> Self {
        Self {
            input: input.into(),
            diagnostics,
            prints,
            programs,
            written: Vec::new(),
            counts,
            aborted,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn prints(&self) -> &[PrintRecord] {
        &self.prints
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn program(&self, name: &str) -> Option<&Program> {
        self.programs.iter().find(|p| p.name() == name)
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    pub fn lines_processed(&self) -> u32 {
        self.counts.lines
    }

    pub fn error_count(&self) -> usize {
        self.counts.errors as usize
    }

    pub fn warning_count(&self) -> usize {
        self.counts.warnings as usize
    }

    /// True when `@error` stopped the run.
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    pub fn succeeded(&self) -> bool {
        self.counts.errors == 0
    }

    pub fn status_line(&self) -> String {
        format!(
            "{}. {} errors, {} warnings",
            if self.succeeded() {
                "Success"
            } else {
                "Failure"
            },
            self.counts.errors,
            self.counts.warnings
        )
    }

    pub(crate) fn record_written(&mut self, path: PathBuf) {
        self.written.push(path);
    }

    pub(crate) fn push_diagnostic(&mut self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error => self.counts.errors += 1,
            Severity::Warning => self.counts.warnings += 1,
        }
        self.diagnostics.push(diag);
    }
}

/// Error that stops a run before or outside of per-line processing.
#[derive(Debug)]
pub struct PpRunError {
    error: PpError,
    diagnostics: Vec<Diagnostic>,
}

impl PpRunError {
    pub fn new(error: PpError, diagnostics: Vec<Diagnostic>) -> Self {
        Self { error, diagnostics }
    }

    pub fn kind(&self) -> PpErrorKind {
        self.error.kind()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl fmt::Display for PpRunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for PpRunError {}

/// Render the source line of a diagnostic as `  NN | text`.
pub fn build_context_line(line_num: u32, source: &str) -> String {
    format!("{:>5} | {}", line_num, source)
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => "WARNING",
        Severity::Error => "ERROR",
    }
}

fn default_diagnostic_code(kind: PpErrorKind) -> &'static str {
    match kind {
        PpErrorKind::Cli => "gp101",
        PpErrorKind::Conditional => "gp201",
        PpErrorKind::Directive => "gp202",
        PpErrorKind::Switch => "gp301",
        PpErrorKind::Program => "gp302",
        PpErrorKind::Expression => "gp401",
        PpErrorKind::Macro => "gp402",
        PpErrorKind::Include => "gp501",
        PpErrorKind::Io => "gp502",
        PpErrorKind::Fatal => "gp900",
    }
}

/// Format an error message with an optional parameter.
pub fn format_error(msg: &str, param: Option<&str>) -> String {
    match param {
        Some(p) => format!("{msg}: {p}"),
        None => msg.to_string(),
    }
}
