// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Diagnostics raised by catalog operations.

use super::{Diagnostic, Severity};

pub const NAMESPACE_NOT_FOUND: &str = "CATALOG_001";
pub const TABLE_EXISTS: &str = "CATALOG_002";

pub fn namespace_not_found(name: &str) -> Diagnostic {
	Diagnostic::new(NAMESPACE_NOT_FOUND, Severity::Statement, format!("namespace '{}' does not exist", name))
}

pub fn table_exists(namespace: &str, table: &str) -> Diagnostic {
	Diagnostic::new(TABLE_EXISTS, Severity::Statement, format!("table '{}.{}' already exists", namespace, table))
}
