// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use std::fs;

use super::cli::DEFAULT_INCLUDE_DEPTH;
use super::engine::FileContext;
use super::*;

/// Where `@include` looks for files and how deep it may nest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeSettings {
    pub paths: Vec<PathBuf>,
    pub max_depth: usize,
}

impl Default for IncludeSettings {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            max_depth: DEFAULT_INCLUDE_DEPTH,
        }
    }
}

/// Strip one pair of `"..."` or `<...>` around an include path.
fn unquote_include(spec: &str) -> &str {
    let spec = spec.trim();
    for (open, close) in [('"', '"'), ('<', '>'), ('\'', '\'')] {
        if let Some(inner) = spec
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    spec
}

impl Preprocessor {
    /// Preprocess a file from disk. A read failure is reported as an error.
    pub fn process_file(&mut self, path: &Path) {
        if self.aborted {
            return;
        }
        let name = path.to_string_lossy().to_string();
        match fs::read_to_string(path) {
            Ok(text) => {
                let dir = path.parent().map(Path::to_path_buf);
                self.enter_text(name, dir, &text);
            }
            Err(err) => {
                let detail = format!("{name}: {err}");
                let diag = if self.files.is_empty() {
                    Diagnostic::new(
                        0,
                        Severity::Error,
                        PpError::new(PpErrorKind::Io, "file read", Some(&detail)),
                    )
                    .with_file(Some(name))
                } else {
                    self.diagnostic_here(
                        Severity::Error,
                        PpError::new(PpErrorKind::Io, "file read", Some(&detail)),
                    )
                };
                self.push_diagnostic(diag);
            }
        }
    }

    /// Push a file context, run every line through the dispatcher, check for
    /// unterminated blocks and pop back to the including file.
    pub(crate) fn enter_text(&mut self, name: String, dir: Option<PathBuf>, text: &str) {
        let saved_cond = std::mem::take(&mut self.cond);
        self.files.push(FileContext {
            name,
            dir,
            line: 0,
            text: String::new(),
        });
        let level = self.files.len();

        for raw in text.split('\n') {
            if self.aborted {
                break;
            }
            let line = raw.trim();
            if let Some(file) = self.files.last_mut() {
                file.line += 1;
                file.text = line.to_string();
            }
            self.counts.lines += 1;
            self.process_line(line);
        }

        if !self.aborted {
            self.check_end_of_file(level);
        }
        self.files.pop();
        self.cond = saved_cond;
    }

    /// Handle `@include PATH`.
    pub(crate) fn include_file(&mut self, spec: &str) {
        let spec = unquote_include(spec);
        if spec.is_empty() {
            self.error(PpErrorKind::Include, "@include requires a path", None);
            return;
        }
        if self.files.len() > self.include.max_depth {
            let note = format!("maximum include depth is {}", self.include.max_depth);
            let diag = self
                .diagnostic_here(
                    Severity::Error,
                    PpError::new(PpErrorKind::Include, "include depth exceeded", Some(spec)),
                )
                .with_note(note)
                .with_help("raise --include-depth or break the include cycle");
            self.push_diagnostic(diag);
            return;
        }
        let path = self.resolve_include(spec);
        self.process_file(&path);
    }

    /// Including file's directory, then the include roots, then `spec` as
    /// written. The last candidate is returned when none exists.
    pub(crate) fn resolve_include(&self, spec: &str) -> PathBuf {
        let requested = PathBuf::from(spec);
        if requested.is_absolute() {
            return requested;
        }
        let base = self.files.last().and_then(|file| file.dir.clone());
        base.into_iter()
            .chain(self.include.paths.iter().cloned())
            .map(|root| root.join(&requested))
            .find(|candidate| candidate.is_file())
            .unwrap_or(requested)
    }

    /// Report blocks opened in the file at `level` that were never closed.
    fn check_end_of_file(&mut self, level: usize) {
        for frame in self.cond.drain_unterminated() {
            let mut diag = Diagnostic::at(
                &frame.origin,
                Severity::Error,
                PpError::new(PpErrorKind::Conditional, "unterminated @if", None),
            );
            if let Some(else_origin) = frame.else_origin {
                diag = diag.with_related(else_origin, "@else branch");
            }
            self.push_diagnostic(diag);
        }

        if let Some((origin, header_level)) = self.header_open.clone() {
            if header_level >= level {
                self.header_open = None;
                self.error_at(&origin, PpErrorKind::Directive, "unterminated @header", None);
            }
        }

        let mut switches = self.switches.drain_from_level(level);
        let program_open_here = self
            .current
            .as_ref()
            .is_some_and(|open| open.file_level >= level);
        if program_open_here {
            if let Some(mut open) = self.current.take() {
                switches.extend(self.switches.drain_unterminated());
                if let Some(snapshot) = open.program.abandon() {
                    self.env.restore(snapshot);
                }
                let origin = open.program.origin().clone();
                self.error_at(
                    &origin,
                    PpErrorKind::Program,
                    "unterminated @program",
                    Some(open.program.name()),
                );
            }
        }
        for sw in switches {
            self.error_at(&sw.origin, PpErrorKind::Switch, "unterminated @switch", None);
        }

        if self
            .rejected_program
            .as_ref()
            .is_some_and(|rejected| rejected.file_level >= level)
        {
            self.close_rejected_program();
        }
    }
}
