// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Diagnostics raised by the statement cache and compiler orchestration.

use super::{Diagnostic, Severity};

pub const COMPILE_CANCELLED: &str = "ENGINE_001";

pub fn compile_cancelled() -> Diagnostic {
	Diagnostic::new(COMPILE_CANCELLED, Severity::Statement, "statement compilation was cancelled")
		.with_note("the cached entry is untouched, a later call will compile it")
}
