// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Diagnostics raised by the statement compilation pipeline.

use super::{Diagnostic, Fragment, Severity};

pub const SYNTAX: &str = "COMPILE_001";
pub const TABLE_NOT_FOUND: &str = "COMPILE_002";
pub const COLUMN_NOT_FOUND: &str = "COMPILE_003";
pub const TYPE_MISMATCH: &str = "COMPILE_004";
pub const STALE_REFERENCE: &str = "COMPILE_005";
pub const GENERATE_FAILED: &str = "COMPILE_006";
pub const PARAMETER_COUNT: &str = "COMPILE_007";
pub const MISSING_STATISTICS: &str = "COMPILE_008";

pub fn syntax_error(message: impl Into<String>, fragment: Fragment) -> Diagnostic {
	Diagnostic::new(SYNTAX, Severity::Statement, message)
		.with_fragment(fragment)
		.with_label("while parsing statement")
}

pub fn table_not_found(fragment: Fragment, namespace: &str, table: &str) -> Diagnostic {
	Diagnostic::new(TABLE_NOT_FOUND, Severity::Statement, format!("table '{}.{}' does not exist", namespace, table))
		.with_fragment(fragment)
		.with_help("check the table name and the current namespace")
}

pub fn column_not_found(fragment: Fragment, table: &str, column: &str) -> Diagnostic {
	Diagnostic::new(
		COLUMN_NOT_FOUND,
		Severity::Statement,
		format!("column '{}' does not exist in table '{}'", column, table),
	)
	.with_fragment(fragment)
}

pub fn type_mismatch(fragment: Fragment, expected: &str, found: &str) -> Diagnostic {
	Diagnostic::new(TYPE_MISMATCH, Severity::Statement, format!("expected {} but found {}", expected, found))
		.with_fragment(fragment)
}

/// A storage object a statement was compiled against no longer exists.
/// Recoverable: the caller is expected to recompile once.
pub fn stale_reference(object: u64, detail: impl Into<String>) -> Diagnostic {
	Diagnostic::new(STALE_REFERENCE, Severity::Statement, detail)
		.with_label(format!("storage object {} vanished during compilation", object))
		.with_note("the statement will be recompiled against the current schema")
}

pub fn generate_failed(detail: impl Into<String>) -> Diagnostic {
	Diagnostic::new(GENERATE_FAILED, Severity::Statement, detail).with_label("while generating executable code")
}

/// Warning attached to a plan compiled without row estimates.
pub fn missing_statistics(table: &str) -> Diagnostic {
	Diagnostic::new(
		MISSING_STATISTICS,
		Severity::Statement,
		format!("no row statistics for table '{}', using default estimate", table),
	)
	.with_help("run ANALYZE to collect statistics")
}

pub fn parameter_count(expected: usize, found: usize) -> Diagnostic {
	Diagnostic::new(
		PARAMETER_COUNT,
		Severity::Statement,
		format!("statement uses {} parameters but {} defaults were supplied", expected, found),
	)
}
