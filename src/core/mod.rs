// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Dialect-agnostic building blocks of the preprocessor.
//!
//! - [`expr`] - Expression language and evaluator
//! - [`env`] - Symbol environment with snapshot/restore
//! - [`source_map`] - Source origins
//! - [`preprocessor`] - Conditionals, switches, programs, resolution, output

pub mod env;
pub mod expr;
pub mod preprocessor;
pub mod source_map;
