// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Plan optimization. Deliberately small: predicate normalization, an
//! access-path decision, and a cardinality estimate from the statistics
//! store. Also the second line of defense against concurrent DDL: every
//! dependency is re-checked against the catalog before the plan moves
//! on to code generation.

use stratum_catalog::{ColumnType, MaterializedCatalog};
use stratum_core::{
	diagnostic::compile,
	error,
	interface::OptimizerFlags,
};
use tracing::{debug, instrument};

use crate::ast::{CompareOp, Literal};
use crate::bind::{BoundKind, BoundStatement};

const DEFAULT_ROW_ESTIMATE: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPath {
	FullScan,
	FilteredScan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedStatement {
	pub bound: BoundStatement,
	pub access: AccessPath,
	pub expected_rows: u64,
}

#[instrument(name = "sql::optimize", level = "trace", skip_all)]
pub fn optimize(
	mut bound: BoundStatement,
	catalog: &MaterializedCatalog,
	flags: OptimizerFlags,
) -> crate::Result<OptimizedStatement> {
	// Bind locked these objects, but an invalidation may have raced the
	// lock acquisition. Missing objects surface as stale references so
	// the caller retries against the current schema.
	for dependency in &bound.dependencies {
		if catalog.find_table(*dependency).is_none() {
			return Err(error!(compile::stale_reference(
				dependency.0,
				format!("object {} vanished before optimization", dependency),
			)));
		}
	}

	if flags.normalize_predicates {
		normalize_predicates(&mut bound);
	}

	let (access, expected_rows) = match &bound.kind {
		BoundKind::Select {
			table,
			filter,
			..
		} => {
			let base = match catalog.stats().estimate_rows(table.id) {
				Some(rows) => rows,
				None => {
					debug!("no statistics for '{}', assuming {} rows", table.name, DEFAULT_ROW_ESTIMATE);
					bound.warnings.push(compile::missing_statistics(&table.name));
					DEFAULT_ROW_ESTIMATE
				}
			};
			match filter {
				Some(_) => (AccessPath::FilteredScan, (base / 2).max(1)),
				None => (AccessPath::FullScan, base),
			}
		}
		BoundKind::Insert {
			..
		} => (AccessPath::FullScan, 1),
		BoundKind::CreateTable {
			..
		}
		| BoundKind::DropTable {
			..
		} => (AccessPath::FullScan, 0),
	};

	Ok(OptimizedStatement {
		bound,
		access,
		expected_rows,
	})
}

/// Rewrites `bool_col != x` to `bool_col = !x`. Booleans only have two
/// values, so the equality form lets the executor use the cheaper
/// comparison.
fn normalize_predicates(bound: &mut BoundStatement) {
	let BoundKind::Select {
		filter: Some(filter),
		..
	} = &mut bound.kind
	else {
		return;
	};

	if filter.column.ty == ColumnType::Bool && filter.op == CompareOp::NotEq {
		if let Literal::Bool(value) = filter.value {
			filter.op = CompareOp::Eq;
			filter.value = Literal::Bool(!value);
		}
	}
}
