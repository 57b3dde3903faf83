// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::directives::Emission;
use super::*;

impl Preprocessor {
    /// `@switch EXPR` records where the jump table goes; it emits nothing.
    pub(crate) fn directive_switch(&mut self, expr: &str) {
        if expr.is_empty() {
            self.error(PpErrorKind::Switch, "@switch requires an expression", None);
        }
        let origin = self.origin();
        let file_level = self.file_level();
        let Some(open) = self.current.as_ref() else {
            return;
        };
        let insert_at = open.program.lines().len();
        let out_line = open.program.out_line();
        self.switches
            .open(expr, origin, insert_at, out_line, file_level);
    }

    pub(crate) fn directive_case(&mut self, expr: &str) -> Option<Emission> {
        if self.switches.is_empty() {
            self.error(PpErrorKind::Switch, "@case outside switch", None);
            return None;
        }
        if expr.is_empty() {
            self.error(PpErrorKind::Switch, "@case requires a value", None);
            return None;
        }
        let origin = self.origin();
        let sw = self.switches.current_mut()?;
        Some(Emission::label(sw.add_case(expr, origin)))
    }

    pub(crate) fn directive_defaultcase(&mut self) -> Option<Emission> {
        if self.switches.is_empty() {
            self.error(PpErrorKind::Switch, "@defaultcase outside switch", None);
            return None;
        }
        let origin = self.origin();
        let result = self.switches.current_mut()?.set_default(origin);
        match result {
            Ok(label) => Some(Emission::label(label)),
            Err(first) => {
                let diag = self
                    .diagnostic_here(
                        Severity::Error,
                        PpError::new(
                            PpErrorKind::Switch,
                            "switch already has @defaultcase",
                            None,
                        ),
                    )
                    .with_related(first, "first @defaultcase");
                self.push_diagnostic(diag);
                None
            }
        }
    }

    pub(crate) fn directive_endcase(&mut self) -> Option<Emission> {
        match self.switches.current() {
            Some(sw) => Some(Emission::text(sw.end_case_line())),
            None => {
                self.error(PpErrorKind::Switch, "@endcase outside switch", None);
                None
            }
        }
    }

    /// Close the innermost switch: splice its jump table in where the
    /// `@switch` was and hand on the end label.
    pub(crate) fn directive_endswitch(&mut self) -> Option<Emission> {
        let Some(sw) = self.switches.close() else {
            self.error(PpErrorKind::Switch, "@endswitch outside switch", None);
            return None;
        };
        let table = sw.jump_table();
        if let Some(open) = self.current.as_mut() {
            open.program
                .insert_lines(sw.insert_at, &sw.origin, sw.out_line, table);
        }
        Some(Emission::label(sw.end_label_line()))
    }
}
