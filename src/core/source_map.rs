// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Source origins for mapping emitted records and diagnostics back to input files.

use std::fmt;

/// A 1-based input line inside a named source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceOrigin {
    pub file: String,
    pub line: u32,
}

impl SourceOrigin {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
