// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Switch/case compilation into label lines and a jump table.
//!
//! A switch is not evaluated while preprocessing. Each `@case` becomes a
//! block-number label in the program body, and `@endswitch` synthesizes the
//! comparison-and-branch lines that pick a label at machine run time. Those
//! lines are spliced into the body at the point where `@switch` appeared.

use crate::core::source_map::SourceOrigin;

/// Label of the `index`-th (1-based) case of a switch at `depth`.
pub fn case_label(depth: usize, index: usize) -> String {
    format!("__{depth}_{index}")
}

pub fn default_label(depth: usize) -> String {
    format!("__{depth}_default")
}

pub fn end_label(depth: usize) -> String {
    format!("__{depth}_endswitch")
}

/// Block-number line that defines `label`.
pub fn label_line(label: &str) -> String {
    format!("N@{label}")
}

/// Unconditional branch to `label`.
pub fn jump_line(label: &str) -> String {
    format!("GOTO@{label}")
}

/// One `@case` seen inside a switch.
#[derive(Debug, Clone)]
pub struct CaseMarker {
    pub expr: String,
    pub origin: SourceOrigin,
}

/// Compilation state of one open `@switch`.
#[derive(Debug, Clone)]
pub struct SwitchContext {
    pub expr: String,
    pub origin: SourceOrigin,
    /// Body index where the jump table is inserted.
    pub insert_at: usize,
    /// Output-line counter value when the switch opened.
    pub out_line: u32,
    /// Nesting level, outermost switch is 1.
    pub depth: usize,
    /// Include depth of the file that opened the switch.
    pub file_level: usize,
    pub cases: Vec<CaseMarker>,
    pub default: Option<SourceOrigin>,
}

impl SwitchContext {
    /// Record a case and return the label line that marks its body.
    pub fn add_case(&mut self, expr: &str, origin: SourceOrigin) -> String {
        self.cases.push(CaseMarker {
            expr: expr.trim().to_string(),
            origin,
        });
        label_line(&case_label(self.depth, self.cases.len()))
    }

    /// Record the default case. Fails with the first default's origin when
    /// one was already seen.
    pub fn set_default(&mut self, origin: SourceOrigin) -> Result<String, SourceOrigin> {
        if let Some(existing) = &self.default {
            return Err(existing.clone());
        }
        self.default = Some(origin);
        Ok(label_line(&default_label(self.depth)))
    }

    pub fn end_case_line(&self) -> String {
        jump_line(&end_label(self.depth))
    }

    pub fn end_label_line(&self) -> String {
        label_line(&end_label(self.depth))
    }

    /// Branch lines in case-declaration order, then the fallback jump.
    pub fn jump_table(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .cases
            .iter()
            .enumerate()
            .map(|(idx, case)| {
                format!(
                    "IF[{} EQ {}] {}",
                    self.expr,
                    case.expr,
                    jump_line(&case_label(self.depth, idx + 1))
                )
            })
            .collect();
        let fallback = if self.default.is_some() {
            default_label(self.depth)
        } else {
            end_label(self.depth)
        };
        lines.push(jump_line(&fallback));
        lines
    }
}

/// Open switches, innermost last.
#[derive(Debug, Default)]
pub struct SwitchStack {
    stack: Vec<SwitchContext>,
}

impl SwitchStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Open a switch nested inside any current one.
    pub fn open(
        &mut self,
        expr: &str,
        origin: SourceOrigin,
        insert_at: usize,
        out_line: u32,
        file_level: usize,
    ) {
        let depth = self.stack.len() + 1;
        self.stack.push(SwitchContext {
            expr: expr.trim().to_string(),
            origin,
            insert_at,
            out_line,
            depth,
            file_level,
            cases: Vec::new(),
            default: None,
        });
    }

    pub fn current(&self) -> Option<&SwitchContext> {
        self.stack.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut SwitchContext> {
        self.stack.last_mut()
    }

    /// Close the innermost switch, restoring the enclosing one.
    pub fn close(&mut self) -> Option<SwitchContext> {
        self.stack.pop()
    }

    /// Remove every open switch, innermost first.
    pub fn drain_unterminated(&mut self) -> Vec<SwitchContext> {
        let mut open = std::mem::take(&mut self.stack);
        open.reverse();
        open
    }

    /// Remove the innermost switches opened at `file_level` or deeper.
    pub fn drain_from_level(&mut self, file_level: usize) -> Vec<SwitchContext> {
        let mut drained = Vec::new();
        while self
            .stack
            .last()
            .is_some_and(|sw| sw.file_level >= file_level)
        {
            if let Some(sw) = self.stack.pop() {
                drained.push(sw);
            }
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn at(line: u32) -> SourceOrigin {
        SourceOrigin::new("sw.gp", line)
    }

    #[test]
    fn jump_table_with_default_has_one_line_per_case_plus_fallback() {
        let mut stack = SwitchStack::new();
        stack.open("#100", at(1), 3, 3, 1);
        let sw = stack.current_mut().unwrap();
        assert_eq!(sw.add_case("1", at(2)), "N@__1_1");
        assert_eq!(sw.add_case(" 2 ", at(5)), "N@__1_2");
        assert_eq!(sw.set_default(at(8)), Ok("N@__1_default".to_string()));

        assert_eq!(
            sw.jump_table(),
            vec![
                "IF[#100 EQ 1] GOTO@__1_1".to_string(),
                "IF[#100 EQ 2] GOTO@__1_2".to_string(),
                "GOTO@__1_default".to_string(),
            ]
        );
    }

    #[test]
    fn jump_table_without_default_falls_through_to_end() {
        let mut stack = SwitchStack::new();
        stack.open("TOOL", at(1), 0, 0, 1);
        let sw = stack.current_mut().unwrap();
        sw.add_case("A", at(2));
        sw.add_case("B", at(3));
        let table = sw.jump_table();
        assert_eq!(table.len(), 3);
        assert_eq!(table[2], "GOTO@__1_endswitch");
        assert_eq!(sw.end_case_line(), "GOTO@__1_endswitch");
        assert_eq!(sw.end_label_line(), "N@__1_endswitch");
    }

    #[test]
    fn second_default_reports_first_origin() {
        let mut stack = SwitchStack::new();
        stack.open("X", at(1), 0, 0, 1);
        let sw = stack.current_mut().unwrap();
        sw.set_default(at(4)).unwrap();
        assert_eq!(sw.set_default(at(6)), Err(at(4)));
    }

    #[test]
    fn closing_restores_enclosing_switch() {
        let mut stack = SwitchStack::new();
        stack.open("OUTER", at(1), 0, 0, 1);
        stack.open("INNER", at(2), 1, 1, 1);
        assert_eq!(stack.current().unwrap().depth, 2);
        let inner = stack.close().unwrap();
        assert_eq!(inner.expr, "INNER");
        assert_eq!(stack.current().unwrap().expr, "OUTER");
        stack.close();
        assert!(stack.current().is_none());
        assert!(stack.close().is_none());
    }

    #[test]
    fn drain_from_level_keeps_outer_file_switches() {
        let mut stack = SwitchStack::new();
        stack.open("A", at(1), 0, 0, 1);
        stack.open("B", at(2), 0, 0, 2);
        stack.open("C", at(3), 0, 0, 2);
        let drained = stack.drain_from_level(2);
        let exprs: Vec<_> = drained.iter().map(|sw| sw.expr.as_str()).collect();
        assert_eq!(exprs, vec!["C", "B"]);
        assert_eq!(stack.current().unwrap().expr, "A");
        assert_eq!(stack.drain_unterminated().len(), 1);
    }

    proptest! {
        #[test]
        fn nested_switch_labels_never_collide(
            outer_cases in 0usize..24,
            inner_cases in 0usize..24,
            outer_default in any::<bool>(),
            inner_default in any::<bool>(),
        ) {
            let mut stack = SwitchStack::new();
            stack.open("O", at(1), 0, 0, 1);
            stack.open("I", at(2), 0, 0, 1);
            let mut labels = Vec::new();
            {
                let inner = stack.current_mut().unwrap();
                for n in 0..inner_cases {
                    labels.push(inner.add_case(&n.to_string(), at(3)));
                }
                if inner_default {
                    labels.push(inner.set_default(at(4)).unwrap());
                }
                labels.push(inner.end_label_line());
            }
            stack.close().unwrap();
            let outer = stack.current_mut().unwrap();
            for n in 0..outer_cases {
                labels.push(outer.add_case(&n.to_string(), at(5)));
            }
            if outer_default {
                labels.push(outer.set_default(at(6)).unwrap());
            }
            labels.push(outer.end_label_line());

            let mut seen = HashSet::new();
            for label in labels {
                prop_assert!(seen.insert(label));
            }
        }
    }
}
