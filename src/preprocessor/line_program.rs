// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::directives::Emission;
use super::engine::{OpenProgram, RejectedProgram};
use super::*;

use crate::core::env::is_identifier;

/// Name bound by a leading `N@name` block label.
fn block_label_name(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("N@")?;
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let name = &rest[..end];
    is_identifier(name).then_some(name)
}

/// Leading identifier of a `@program` argument.
fn program_name(args: &str) -> &str {
    let end = args
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(args.len());
    &args[..end]
}

impl Preprocessor {
    /// `@program NAME`: the name must be bound to a positive integer, which
    /// becomes the program number.
    pub(crate) fn begin_program(&mut self, args: &str) {
        let name = program_name(args);
        if name.is_empty() {
            self.error(PpErrorKind::Program, "@program requires a name", None);
            return;
        }

        let enclosing = self
            .current
            .as_ref()
            .map(|open| open.program.origin().clone())
            .or_else(|| self.rejected_program.as_ref().map(|rejected| rejected.origin.clone()));
        if let Some(enclosing) = enclosing {
            let diag = self
                .diagnostic_here(
                    Severity::Error,
                    PpError::new(PpErrorKind::Program, "programs cannot be nested", None),
                )
                .with_related(enclosing, "enclosing @program");
            self.push_diagnostic(diag);
            return;
        }

        let origin = self.origin();
        let file_level = self.file_level();
        let number = match self.env.get(name).cloned() {
            None => Err(format!("{name} not defined")),
            Some(value) => match value.as_integer() {
                None => Err(format!("{name} must be integer")),
                Some(number) if number <= 0 => Err(format!("{name} must be a positive integer")),
                Some(number) => Ok(number),
            },
        };
        let number = match number {
            Ok(number) => number,
            Err(message) => {
                self.error(PpErrorKind::Program, &message, None);
                self.rejected_program = Some(RejectedProgram {
                    origin,
                    file_level,
                    snapshot: self.env.snapshot(),
                });
                return;
            }
        };

        if let Some(existing) = self.programs.get(name) {
            let previous = existing.origin().clone();
            let diag = self
                .diagnostic_here(
                    Severity::Warning,
                    PpError::new(PpErrorKind::Program, "overwriting program", Some(name)),
                )
                .with_related(previous, "previously defined");
            self.push_diagnostic(diag);
        }

        let program = Program::new(
            name,
            number,
            origin,
            self.global_header.clone(),
            self.env.snapshot(),
        );
        self.current = Some(OpenProgram {
            program,
            file_level,
        });
    }

    /// `@endprogram`: resolve macro tokens, put the environment back the way
    /// `@program` found it and store the program.
    pub(crate) fn end_program(&mut self) {
        let Some(mut open) = self.current.take() else {
            self.error(PpErrorKind::Program, "@endprogram outside of program", None);
            return;
        };

        for sw in self.switches.drain_unterminated() {
            self.error_at(&sw.origin, PpErrorKind::Switch, "unterminated @switch", None);
        }

        for failure in resolve_program(&mut open.program, &mut self.env) {
            let message = format!("{} undefined", failure.expr);
            let diag = Diagnostic::at(
                &failure.origin,
                Severity::Error,
                PpError::new(PpErrorKind::Macro, &message, None),
            )
            .with_note(failure.reason);
            self.push_diagnostic(diag);
        }

        if let Some(snapshot) = open.program.seal() {
            self.env.restore(snapshot);
        }
        self.programs.insert(open.program);
    }

    /// `@delay EXPR` emits a dwell block with the evaluated duration.
    pub(crate) fn directive_delay(&mut self, expr: &str) {
        match self.env.eval(expr) {
            Ok(value) => {
                let origin = self.origin();
                if let Some(open) = self.current.as_mut() {
                    open.program.push_line(
                        origin,
                        Some(format!("G04 P{value} ;")),
                        Some(expr.to_string()),
                    );
                }
            }
            Err(err) => {
                let diag = self
                    .diagnostic_here(
                        Severity::Error,
                        PpError::new(PpErrorKind::Expression, "@delay failed", Some(expr)),
                    )
                    .with_note(err.message);
                self.push_diagnostic(diag);
            }
        }
    }

    /// Bind a leading block label and append the line to the program body.
    pub(crate) fn emit_line(&mut self, emission: Emission) {
        let origin = self.origin();
        let Some(out_line) = self.current.as_ref().map(|open| open.program.out_line()) else {
            if !emission.text.is_empty() {
                self.error(
                    PpErrorKind::Program,
                    "program line outside of program",
                    None,
                );
            }
            return;
        };

        if let Some(name) = block_label_name(&emission.text) {
            if !self.env.contains(name) {
                self.env.set(name, Value::Int(i64::from(out_line)));
            } else if emission.synthesized {
                let name = name.to_string();
                self.warning(PpErrorKind::Switch, "duplicate switch label", Some(&name));
            }
        }

        if let Some(open) = self.current.as_mut() {
            open.program.push_line(origin, Some(emission.text), None);
        }
    }
}
