// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use super::{Diagnostic, Severity};

pub const INTERNAL: &str = "INTERNAL_001";

/// An unexpected internal state. Carries the source location so the
/// report is actionable without a backtrace.
pub fn internal_with_location(reason: impl Into<String>, file: &str, line: u32) -> Diagnostic {
	Diagnostic::new(INTERNAL, Severity::Statement, reason)
		.with_label(format!("at {}:{}", file, line))
		.with_note("this is a bug, please report it")
}

/// Builds an internal-error diagnostic with automatic source location
/// capture.
#[macro_export]
macro_rules! internal {
	($($arg:tt)*) => {
		$crate::diagnostic::internal::internal_with_location(format!($($arg)*), file!(), line!())
	};
}
