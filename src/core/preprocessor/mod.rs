// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Core preprocessor components.
//!
//! - [`conditional`] - Conditional state machine
//! - [`switch`] - Switch/case jump-table compilation
//! - [`program`] - Programs and line records
//! - [`resolver`] - Macro-token resolution
//! - [`output`] - Program file generation
//! - [`error`] - Error types and diagnostics

pub mod conditional;
pub mod error;
pub mod output;
pub mod program;
pub mod resolver;
pub mod switch;
