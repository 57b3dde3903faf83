// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;

/// Position inside one source file on the include stack.
#[derive(Debug, Clone)]
pub(crate) struct FileContext {
    pub(crate) name: String,
    pub(crate) dir: Option<PathBuf>,
    pub(crate) line: u32,
    pub(crate) text: String,
}

/// The program under construction and the include level that opened it.
#[derive(Debug)]
pub(crate) struct OpenProgram {
    pub(crate) program: Program,
    pub(crate) file_level: usize,
}

/// A `@program` whose name was rejected. Its lines are skipped up to the
/// matching `@endprogram`, after which the environment is put back.
#[derive(Debug)]
pub(crate) struct RejectedProgram {
    pub(crate) origin: SourceOrigin,
    pub(crate) file_level: usize,
    pub(crate) snapshot: EnvSnapshot,
}

/// Parser state for one preprocessing run.
///
/// Holds the environment, the include stack, the conditional and switch
/// stacks, the header target and the program being built. Lines are fed
/// through [`Preprocessor::process_file`] or [`Preprocessor::process_source`]
/// and the result is collected with [`Preprocessor::finish`].
pub struct Preprocessor {
    pub(crate) env: Environment,
    pub(crate) include: IncludeSettings,
    pub(crate) files: Vec<FileContext>,
    pub(crate) cond: ConditionalStack,
    pub(crate) switches: SwitchStack,
    pub(crate) header_open: Option<(SourceOrigin, usize)>,
    pub(crate) global_header: Vec<String>,
    pub(crate) current: Option<OpenProgram>,
    pub(crate) rejected_program: Option<RejectedProgram>,
    pub(crate) programs: ProgramSet,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) prints: Vec<PrintRecord>,
    pub(crate) counts: PassCounts,
    pub(crate) aborted: bool,
}

impl Preprocessor {
    pub fn new(env: Environment, include: IncludeSettings) -> Self {
        Self {
            env,
            include,
            files: Vec::new(),
            cond: ConditionalStack::new(),
            switches: SwitchStack::new(),
            header_open: None,
            global_header: Vec::new(),
            current: None,
            rejected_program: None,
            programs: ProgramSet::new(),
            diagnostics: Vec::new(),
            prints: Vec::new(),
            counts: PassCounts::new(),
            aborted: false,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn programs(&self) -> &ProgramSet {
        &self.programs
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn prints(&self) -> &[PrintRecord] {
        &self.prints
    }

    pub fn error_count(&self) -> u32 {
        self.counts.errors
    }

    pub fn warning_count(&self) -> u32 {
        self.counts.warnings
    }

    /// True once `@error` has stopped the run.
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    /// Preprocess in-memory text as if it were a file called `name`.
    /// Relative includes resolve against `dir` when given.
    pub fn process_source(&mut self, name: &str, dir: Option<&Path>, text: &str) {
        if self.aborted {
            return;
        }
        self.enter_text(name.to_string(), dir.map(Path::to_path_buf), text);
    }

    /// Collect the run result.
    pub fn finish(mut self, input: impl Into<String>) -> PpRunReport {
        if let Some(mut open) = self.current.take() {
            if let Some(snapshot) = open.program.abandon() {
                self.env.restore(snapshot);
            }
        }
        self.close_rejected_program();
        PpRunReport::new(
            input,
            self.diagnostics,
            self.prints,
            self.programs.into_vec(),
            self.counts,
            self.aborted,
        )
    }

    /// Leave a rejected program, dropping whatever its body bound.
    pub(crate) fn close_rejected_program(&mut self) {
        if let Some(rejected) = self.rejected_program.take() {
            self.env.restore(rejected.snapshot);
        }
    }

    /// Origin of the line being processed.
    pub(crate) fn origin(&self) -> SourceOrigin {
        match self.files.last() {
            Some(file) => SourceOrigin::new(file.name.clone(), file.line),
            None => SourceOrigin::new("", 0),
        }
    }

    pub(crate) fn file_level(&self) -> usize {
        self.files.len()
    }

    /// Diagnostic at the current line, carrying its source text.
    pub(crate) fn diagnostic_here(&self, severity: Severity, error: PpError) -> Diagnostic {
        let source = self.files.last().map(|file| file.text.clone());
        Diagnostic::at(&self.origin(), severity, error).with_source(source)
    }

    pub(crate) fn push_diagnostic(&mut self, diag: Diagnostic) {
        match diag.severity() {
            Severity::Error => self.counts.errors += 1,
            Severity::Warning => self.counts.warnings += 1,
        }
        self.diagnostics.push(diag);
    }

    pub(crate) fn error(&mut self, kind: PpErrorKind, msg: &str, param: Option<&str>) {
        let diag = self.diagnostic_here(Severity::Error, PpError::new(kind, msg, param));
        self.push_diagnostic(diag);
    }

    pub(crate) fn warning(&mut self, kind: PpErrorKind, msg: &str, param: Option<&str>) {
        let diag = self.diagnostic_here(Severity::Warning, PpError::new(kind, msg, param));
        self.push_diagnostic(diag);
    }

    /// Error located at an earlier origin, such as the opening line of an
    /// unterminated block.
    pub(crate) fn error_at(
        &mut self,
        origin: &SourceOrigin,
        kind: PpErrorKind,
        msg: &str,
        param: Option<&str>,
    ) {
        let diag = Diagnostic::at(origin, Severity::Error, PpError::new(kind, msg, param));
        self.push_diagnostic(diag);
    }
}
