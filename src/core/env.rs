// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! The symbol environment consulted by directives and macro tokens.

use std::collections::HashMap;

use super::expr::{self, EvalContext, EvalError, Value, DEFAULT_MAX_DEPTH};

/// Macro-argument letters bound to their local-variable numbers.
pub const ARGUMENT_CONSTANTS: &[(&str, i64)] = &[
    ("A", 1),
    ("B", 2),
    ("C", 3),
    ("I", 4),
    ("J", 5),
    ("K", 6),
    ("D", 7),
    ("E", 8),
    ("F", 9),
    ("H", 11),
    ("M", 13),
    ("Q", 17),
    ("R", 18),
    ("S", 19),
    ("T", 20),
    ("U", 21),
    ("V", 22),
    ("W", 23),
    ("X", 24),
    ("Y", 25),
    ("Z", 26),
];

/// Point-in-time copy of an environment's bindings.
#[derive(Debug, Clone)]
pub struct EnvSnapshot {
    bindings: HashMap<String, Value>,
}

/// Mutable symbol table plus the evaluator bound to it.
#[derive(Debug, Clone)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    max_depth: usize,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// An environment with no bindings.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// An environment seeded with [`ARGUMENT_CONSTANTS`].
    pub fn with_constants() -> Self {
        let mut env = Self::new();
        for (name, value) in ARGUMENT_CONSTANTS {
            env.set(name, Value::Int(*value));
        }
        env
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth.max(1);
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn snapshot(&self) -> EnvSnapshot {
        EnvSnapshot {
            bindings: self.bindings.clone(),
        }
    }

    /// Replace every binding with the snapshot's.
    pub fn restore(&mut self, snapshot: EnvSnapshot) {
        self.bindings = snapshot.bindings;
    }

    /// Evaluate expression or statement text against the live bindings.
    pub fn eval(&mut self, src: &str) -> Result<Value, EvalError> {
        let max_depth = self.max_depth;
        expr::evaluate(src, self, max_depth)
    }

    /// Evaluate a `NAME = EXPR[, ...]` binding list. A bare name binds `1`.
    pub fn define(&mut self, src: &str) -> Result<Value, EvalError> {
        let trimmed = src.trim();
        if is_identifier(trimmed) {
            self.set(trimmed, Value::Int(1));
            return Ok(Value::Int(1));
        }
        let parsed = expr::parse_expression(trimmed, self.max_depth)?;
        let statements = match &parsed {
            expr::Expr::Sequence(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        if let Some(bad) = statements
            .iter()
            .find(|stmt| !matches!(stmt, expr::Expr::Assign { .. }))
        {
            let offset = match bad {
                expr::Expr::Literal(_, o) | expr::Expr::Identifier(_, o) => Some(*o),
                expr::Expr::Binary { offset, .. } | expr::Expr::Call { offset, .. } => Some(*offset),
                _ => None,
            };
            let message = "Expected NAME = value";
            return Err(match offset {
                Some(offset) => EvalError::at(message, offset),
                None => EvalError::new(message),
            });
        }
        expr::eval_expr(&parsed, self)
    }
}

impl EvalContext for Environment {
    fn lookup_symbol(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }

    fn assign_symbol(&mut self, name: &str, value: Value) {
        self.set(name, value);
    }
}

/// True for `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
