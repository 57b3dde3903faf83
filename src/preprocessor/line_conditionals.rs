// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::*;

impl Preprocessor {
    /// `@if EXPR`. Inside a branch that is not taken the expression is not
    /// evaluated at all. A failed evaluation counts as false.
    pub(crate) fn directive_if(&mut self, expr: &str) {
        let origin = self.origin();
        if self.cond.is_active() && expr.is_empty() {
            self.error(
                PpErrorKind::Conditional,
                "@if requires an expression",
                None,
            );
        }
        let env = &mut self.env;
        self.cond.push_if(origin, || {
            !expr.is_empty()
                && env
                    .eval(expr)
                    .map(|value| value.is_truthy())
                    .unwrap_or(false)
        });
    }

    pub(crate) fn directive_else(&mut self) {
        let origin = self.origin();
        if let Err(ConditionalError::NoOpenIf) = self.cond.flip_else(origin) {
            self.error(PpErrorKind::Conditional, "@else without @if", None);
        }
    }

    pub(crate) fn directive_endif(&mut self) {
        if let Err(ConditionalError::NoOpenIf) = self.cond.pop() {
            self.error(PpErrorKind::Conditional, "@endif without @if", None);
        }
    }
}
