// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Programs and the line records that make up their bodies.

use std::collections::HashMap;

use crate::core::env::EnvSnapshot;
use crate::core::source_map::SourceOrigin;

/// One body line of a program.
///
/// A record with no text and a comment is a comment-only line. Comments
/// also collect the audit trail of macro substitutions.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    pub origin: SourceOrigin,
    pub out_line: u32,
    pub text: Option<String>,
    pub comment: Option<String>,
}

impl LineRecord {
    pub fn new(
        origin: SourceOrigin,
        out_line: u32,
        text: Option<String>,
        comment: Option<String>,
    ) -> Self {
        Self {
            origin,
            out_line,
            text,
            comment,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Append to the comment, separated by `sep` when one exists.
    pub fn append_comment(&mut self, note: &str, sep: &str) {
        match &mut self.comment {
            Some(existing) if !existing.is_empty() => {
                existing.push_str(sep);
                existing.push_str(note);
            }
            _ => self.comment = Some(note.to_string()),
        }
    }
}

/// A named, numbered output unit.
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    number: i64,
    origin: SourceOrigin,
    header: Vec<String>,
    lines: Vec<LineRecord>,
    out_line: u32,
    snapshot: Option<EnvSnapshot>,
    done: bool,
}

impl Program {
    pub fn new(
        name: impl Into<String>,
        number: i64,
        origin: SourceOrigin,
        header: Vec<String>,
        snapshot: EnvSnapshot,
    ) -> Self {
        Self {
            name: name.into(),
            number,
            origin,
            header,
            lines: Vec::new(),
            out_line: 0,
            snapshot: Some(snapshot),
            done: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Vec<String> {
        &mut self.header
    }

    pub fn lines(&self) -> &[LineRecord] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut [LineRecord] {
        &mut self.lines
    }

    /// Number of records appended so far; the value block labels bind to.
    pub fn out_line(&self) -> u32 {
        self.out_line
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Append a record and advance the output-line counter.
    pub fn push_line(
        &mut self,
        origin: SourceOrigin,
        text: Option<String>,
        comment: Option<String>,
    ) -> &LineRecord {
        let record = LineRecord::new(origin, self.out_line, text, comment);
        self.out_line += 1;
        let idx = self.lines.len();
        self.lines.push(record);
        &self.lines[idx]
    }

    /// Splice text lines in at body index `at` without moving the counter.
    pub fn insert_lines(&mut self, at: usize, origin: &SourceOrigin, out_line: u32, texts: Vec<String>) {
        let at = at.min(self.lines.len());
        let records = texts
            .into_iter()
            .map(|text| LineRecord::new(origin.clone(), out_line, Some(text), None));
        self.lines.splice(at..at, records);
    }

    /// Mark complete and hand back the entry snapshot.
    pub fn seal(&mut self) -> Option<EnvSnapshot> {
        self.done = true;
        self.snapshot.take()
    }

    /// Hand back the entry snapshot without completing the program.
    pub fn abandon(&mut self) -> Option<EnvSnapshot> {
        self.snapshot.take()
    }
}

/// Programs keyed by name, kept in first-definition order.
#[derive(Debug, Default)]
pub struct ProgramSet {
    programs: Vec<Program>,
    index: HashMap<String, usize>,
}

impl ProgramSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Program> {
        self.index.get(name).map(|idx| &self.programs[*idx])
    }

    /// Store `program`, replacing any program of the same name in place.
    pub fn insert(&mut self, program: Program) -> Option<Program> {
        match self.index.get(program.name()) {
            Some(idx) => Some(std::mem::replace(&mut self.programs[*idx], program)),
            None => {
                self.index
                    .insert(program.name().to_string(), self.programs.len());
                self.programs.push(program);
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Program> {
        self.programs.iter()
    }

    pub fn into_vec(self) -> Vec<Program> {
        self.programs
    }
}
