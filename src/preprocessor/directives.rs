// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;

/// Every directive word the dispatcher recognizes.
pub(crate) const DIRECTIVES: &[&str] = &[
    "@case",
    "@defaultcase",
    "@define",
    "@delay",
    "@else",
    "@endcase",
    "@endheader",
    "@endif",
    "@endprogram",
    "@endswitch",
    "@error",
    "@eval",
    "@header",
    "@if",
    "@include",
    "@print",
    "@program",
    "@switch",
];

/// Text a directive hands on to block-label handling and emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Emission {
    pub(crate) text: String,
    /// The text is a label line produced by the switch compiler.
    pub(crate) synthesized: bool,
}

impl Emission {
    pub(crate) fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            synthesized: false,
        }
    }

    pub(crate) fn label(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            synthesized: true,
        }
    }
}

/// Split `@word rest` into the word and its trimmed argument text.
pub(crate) fn split_directive(line: &str) -> Option<(&str, &str)> {
    if !line.starts_with('@') {
        return None;
    }
    match line.find(char::is_whitespace) {
        Some(idx) => Some((&line[..idx], line[idx..].trim())),
        None => Some((line, "")),
    }
}

impl Preprocessor {
    /// Route one trimmed input line. The checks run in a fixed priority
    /// order and the first that claims the line ends its processing.
    pub(crate) fn process_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        if let Some(comment) = line.strip_prefix("//") {
            if self.cond.is_active() && self.rejected_program.is_none() {
                let origin = self.origin();
                if let Some(open) = self.current.as_mut() {
                    open.program
                        .push_line(origin, None, Some(comment.trim().to_string()));
                }
            }
            return;
        }

        let directive = split_directive(line);
        let word = directive.map(|(word, _)| word);
        let args = directive.map(|(_, args)| args).unwrap_or("");

        if self.cond.is_active() {
            if word == Some("@endheader") {
                if self.header_open.take().is_none() {
                    self.warning(PpErrorKind::Directive, "not in header", None);
                }
                return;
            }
            if self.header_open.is_some() {
                self.capture_header_line(line);
                return;
            }
        }

        match word {
            Some("@if") => return self.directive_if(args),
            Some("@else") => return self.directive_else(),
            Some("@endif") => return self.directive_endif(),
            _ => {}
        }

        if !self.cond.is_active() {
            return;
        }

        match word {
            Some("@print") => return self.directive_print(args),
            Some("@error") => return self.directive_error(args),
            Some("@header") => {
                self.header_open = Some((self.origin(), self.file_level()));
                return;
            }
            Some("@program") => return self.begin_program(args),
            Some("@include") => return self.include_file(args),
            Some("@eval") => return self.directive_eval(args),
            Some("@define") => return self.directive_define(args),
            _ => {}
        }

        if self.rejected_program.is_some() {
            if word == Some("@endprogram") {
                self.close_rejected_program();
            }
            return;
        }

        if self.current.is_none() {
            match word {
                Some("@endprogram") => {
                    self.error(PpErrorKind::Program, "@endprogram outside of program", None)
                }
                Some(word) if DIRECTIVES.contains(&word) => {}
                _ => self.error(
                    PpErrorKind::Program,
                    "program line outside of program",
                    None,
                ),
            }
            return;
        }

        let emission = match word {
            Some("@endprogram") => return self.end_program(),
            Some("@switch") => return self.directive_switch(args),
            Some("@delay") => return self.directive_delay(args),
            Some("@case") => self.directive_case(args),
            Some("@defaultcase") => self.directive_defaultcase(),
            Some("@endcase") => self.directive_endcase(),
            Some("@endswitch") => self.directive_endswitch(),
            _ => Some(Emission::text(line)),
        };
        if let Some(emission) = emission {
            self.emit_line(emission);
        }
    }

    fn capture_header_line(&mut self, line: &str) {
        if self.rejected_program.is_some() {
            return;
        }
        match self.current.as_mut() {
            Some(open) => open.program.header_mut().push(line.to_string()),
            None => self.global_header.push(line.to_string()),
        }
    }

    fn directive_print(&mut self, expr: &str) {
        let origin = self.origin();
        let value = self.env.eval(expr).ok().map(|value| value.to_string());
        self.prints.push(PrintRecord {
            origin,
            expr: expr.to_string(),
            value,
        });
    }

    /// `@error` ends the whole run; nothing after it is processed.
    fn directive_error(&mut self, message: &str) {
        let param = (!message.is_empty()).then_some(message);
        self.error(PpErrorKind::Fatal, "@error", param);
        self.aborted = true;
    }

    fn directive_eval(&mut self, expr: &str) {
        if let Err(err) = self.env.eval(expr) {
            let diag = self
                .diagnostic_here(
                    Severity::Warning,
                    PpError::new(PpErrorKind::Expression, "@eval failed", Some(expr)),
                )
                .with_note(err.message);
            self.push_diagnostic(diag);
        }
    }

    fn directive_define(&mut self, assignment: &str) {
        if assignment.is_empty() {
            self.error(
                PpErrorKind::Expression,
                "@define requires NAME = value",
                None,
            );
            return;
        }
        if let Err(err) = self.env.define(assignment) {
            let diag = self
                .diagnostic_here(
                    Severity::Error,
                    PpError::new(PpErrorKind::Expression, "@define failed", Some(assignment)),
                )
                .with_note(err.message);
            self.push_diagnostic(diag);
        }
    }
}
