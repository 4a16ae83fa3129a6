// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Diagnostics raised by the nested-transaction coordinator.

use super::{Diagnostic, Severity};

pub const SAVEPOINT_NOT_FOUND: &str = "TXN_001";
pub const ALREADY_COMPLETED: &str = "TXN_002";
pub const ELEVATE_DENIED: &str = "TXN_003";
pub const LOCK_UNAVAILABLE: &str = "TXN_004";

pub fn savepoint_not_found(name: &str) -> Diagnostic {
	Diagnostic::new(SAVEPOINT_NOT_FOUND, Severity::Transaction, format!("savepoint '{}' does not exist", name))
		.with_help("savepoints are released on commit and on rollback past them")
}

pub fn already_completed(operation: &str) -> Diagnostic {
	Diagnostic::new(
		ALREADY_COMPLETED,
		Severity::Statement,
		format!("cannot {} on a completed nested transaction", operation),
	)
}

pub fn elevate_denied(resource: &str) -> Diagnostic {
	Diagnostic::new(
		ELEVATE_DENIED,
		Severity::Transaction,
		format!("cannot elevate to read-write for resource '{}'", resource),
	)
	.with_note("the coordinator refused the upgrade, the parent transaction stays read-only")
}

pub fn lock_unavailable(object: u64) -> Diagnostic {
	Diagnostic::new(
		LOCK_UNAVAILABLE,
		Severity::Statement,
		format!("could not acquire schema lock on object {}", object),
	)
	.with_help("another transaction holds a conflicting lock")
}
