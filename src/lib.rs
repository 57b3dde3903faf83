// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! gplus: a directive-driven macro preprocessor for G-code programs.
//!
//! [`core`] holds the expression language, the symbol environment and the
//! program model. [`preprocessor`] holds the line dispatcher, the include
//! stack, the command-line interface and the per-input run flow.

pub mod core;
pub mod preprocessor;
