// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Conditional preprocessing state management.

use crate::core::source_map::SourceOrigin;

/// Visibility of one `@if` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalState {
    /// The branch being scanned is taken.
    Active,
    /// The branch being scanned is not taken; `@else` flips it.
    Inactive,
    /// An enclosing level is not taken, so neither branch of this level is.
    AncestorInactive,
}

/// One open `@if`.
#[derive(Debug, Clone)]
pub struct ConditionalFrame {
    pub state: ConditionalState,
    pub origin: SourceOrigin,
    pub else_origin: Option<SourceOrigin>,
}

/// Failure of an `@else`/`@endif` against the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalError {
    NoOpenIf,
}

/// Stack of open `@if` levels for one source file.
#[derive(Debug, Default)]
pub struct ConditionalStack {
    stack: Vec<ConditionalFrame>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Lines are visible when no level is open or the top level is active.
    pub fn is_active(&self) -> bool {
        match self.stack.last() {
            Some(frame) => frame.state == ConditionalState::Active,
            None => true,
        }
    }

    /// Open an `@if`. `condition` is only consulted when the enclosing
    /// levels are all active, so dead branches never evaluate anything.
    pub fn push_if<F>(&mut self, origin: SourceOrigin, condition: F) -> ConditionalState
    where
        F: FnOnce() -> bool,
    {
        let state = if !self.is_active() {
            ConditionalState::AncestorInactive
        } else if condition() {
            ConditionalState::Active
        } else {
            ConditionalState::Inactive
        };
        self.stack.push(ConditionalFrame {
            state,
            origin,
            else_origin: None,
        });
        state
    }

    /// Flip the top level for `@else`. Returns the new state.
    pub fn flip_else(&mut self, origin: SourceOrigin) -> Result<ConditionalState, ConditionalError> {
        let frame = self.stack.last_mut().ok_or(ConditionalError::NoOpenIf)?;
        frame.state = match frame.state {
            ConditionalState::Active => ConditionalState::Inactive,
            ConditionalState::Inactive => ConditionalState::Active,
            ConditionalState::AncestorInactive => ConditionalState::AncestorInactive,
        };
        frame.else_origin = Some(origin);
        Ok(frame.state)
    }

    /// Close the top level for `@endif`.
    pub fn pop(&mut self) -> Result<ConditionalFrame, ConditionalError> {
        self.stack.pop().ok_or(ConditionalError::NoOpenIf)
    }

    /// Remove every open level, innermost first.
    pub fn drain_unterminated(&mut self) -> Vec<ConditionalFrame> {
        let mut frames = std::mem::take(&mut self.stack);
        frames.reverse();
        frames
    }
}
