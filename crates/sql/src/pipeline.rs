// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! The compilation pipeline: parse, bind, optimize, generate.
//!
//! Each run opens a fresh nested sub-transaction so the catalog reads
//! of bind and optimize are mutually consistent, and commits it before
//! code generation (which reads nothing). Any error path drops the
//! handle, which rolls it back and releases its schema locks.

use std::sync::Arc;

use stratum_catalog::MaterializedCatalog;
use stratum_core::interface::{
	Disposition, NestedTransaction, ObjectId, Permission, SessionContext, StatementIdentity, TransactionCoordinator,
};
use stratum_core::diagnostic::Diagnostic;
use tracing::instrument;

use crate::ast::{Literal, parse};
use crate::bind::bind;
use crate::generate::{Program, generate};
use crate::optimize::optimize;

/// Everything a successful compile produces, ready to be installed into
/// a cached plan.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
	pub program: Arc<Program>,
	pub permissions: Vec<Permission>,
	pub dependencies: Vec<ObjectId>,
	pub disposition: Disposition,
	pub warnings: Vec<Diagnostic>,
}

/// The compile path behind the plan cache. Object safe so the cache
/// orchestration can be tested with stub pipelines.
pub trait Pipeline: Send + Sync {
	fn run(
		&self,
		identity: &StatementIdentity,
		session: &SessionContext,
		params: &[Literal],
	) -> crate::Result<PipelineOutput>;
}

pub struct StandardPipeline<C: TransactionCoordinator> {
	catalog: Arc<MaterializedCatalog>,
	coordinator: Arc<C>,
}

impl<C: TransactionCoordinator> StandardPipeline<C> {
	pub fn new(catalog: Arc<MaterializedCatalog>, coordinator: Arc<C>) -> Self {
		Self {
			catalog,
			coordinator,
		}
	}
}

impl<C: TransactionCoordinator> Pipeline for StandardPipeline<C> {
	#[instrument(name = "sql::pipeline", level = "trace", skip_all, fields(namespace = identity.namespace()))]
	fn run(
		&self,
		identity: &StatementIdentity,
		session: &SessionContext,
		params: &[Literal],
	) -> crate::Result<PipelineOutput> {
		let statement = parse(identity.text(), params)?;

		// The sub-transaction mode follows the statement: a write
		// statement compiles under the mode its execution needs.
		let mut txn = self.coordinator.begin_nested(statement.is_read_only())?;
		let bound = bind(&statement, &self.catalog, session, &mut txn)?;
		let optimized = optimize(bound, &self.catalog, session.optimizer)?;
		txn.commit()?;

		let program = generate(&optimized)?;
		Ok(PipelineOutput {
			program: Arc::new(program),
			permissions: optimized.bound.permissions,
			dependencies: optimized.bound.dependencies,
			disposition: optimized.bound.disposition,
			warnings: optimized.bound.warnings,
		})
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::time::Duration;

	use stratum_catalog::{ColumnDef, ColumnType, MaterializedCatalog};
	use stratum_core::{
		diagnostic::{
			Severity,
			compile::{MISSING_STATISTICS, TABLE_NOT_FOUND, TYPE_MISMATCH},
		},
		interface::{
			Disposition, IsolationLevel, NestedTransaction, SessionContext, SessionId, StatementIdentity,
			TransactionCoordinator,
		},
	};
	use stratum_transaction::StandardCoordinator;

	use super::{Pipeline, StandardPipeline};
	use crate::ast::{CompareOp, Literal};
	use crate::generate::Instruction;

	fn setup() -> (Arc<MaterializedCatalog>, StandardPipeline<StandardCoordinator>, SessionContext) {
		let catalog = Arc::new(MaterializedCatalog::new());
		let ns = catalog.ensure_namespace("app");
		catalog.create_table(
			ns,
			"users",
			vec![
				ColumnDef::new("id", ColumnType::Int),
				ColumnDef::new("name", ColumnType::Text),
				ColumnDef::new("active", ColumnType::Bool),
			],
			None,
		)
		.unwrap();

		let coordinator = Arc::new(StandardCoordinator::with_lock_timeout(Duration::from_millis(100)));
		let pipeline = StandardPipeline::new(catalog.clone(), coordinator);
		let session = SessionContext::new(SessionId(1), "app");
		(catalog, pipeline, session)
	}

	fn identity(text: &str, read_only: bool) -> StatementIdentity {
		StatementIdentity::new("app", text, "", read_only, IsolationLevel::ReadCommitted)
	}

	#[test]
	fn test_select_compiles_to_program() {
		let (catalog, pipeline, session) = setup();
		let output = pipeline.run(&identity("SELECT id, name FROM users WHERE id = 42", true), &session, &[]).unwrap();

		let users = catalog.find_table_by_name(catalog.namespace_id("app").unwrap(), "users", None).unwrap();
		assert_eq!(output.dependencies, vec![users.id]);
		assert_eq!(output.disposition, Disposition::Shared);

		let kinds: Vec<_> = output.program.instructions.iter().collect();
		assert!(matches!(kinds[0], Instruction::ScanTable { table, .. } if *table == users.id));
		assert!(matches!(kinds[1], Instruction::FilterCompare { .. }));
		assert!(matches!(kinds[2], Instruction::Project { columns } if columns == &["id", "name"]));

		// No statistics yet: the plan carries a warning, not an error.
		assert!(output.warnings.iter().any(|warning| warning.code == MISSING_STATISTICS));
	}

	#[test]
	fn test_statistics_silence_the_warning() {
		let (catalog, pipeline, session) = setup();
		let users = catalog.find_table_by_name(catalog.namespace_id("app").unwrap(), "users", None).unwrap();

		let coordinator = StandardCoordinator::new();
		let mut txn = coordinator.begin_nested(false).unwrap();
		catalog.stats().refresh(&mut txn, users.id, 500).unwrap();
		txn.commit().unwrap();

		let output = pipeline.run(&identity("SELECT id FROM users WHERE id = 1", true), &session, &[]).unwrap();
		assert!(output.warnings.is_empty());
		assert!(matches!(
			output.program.instructions[0],
			Instruction::ScanTable { expected_rows, .. } if expected_rows == 250
		));
	}

	#[test]
	fn test_unknown_table_aborts_statement_only() {
		let (_, pipeline, session) = setup();
		let err = pipeline.run(&identity("SELECT id FROM missing", true), &session, &[]).unwrap_err();
		assert_eq!(err.code(), TABLE_NOT_FOUND);
		assert_eq!(err.severity(), Severity::Statement);
	}

	#[test]
	fn test_parameter_defaults_substituted() {
		let (_, pipeline, session) = setup();
		let output = pipeline
			.run(&identity("SELECT id FROM users WHERE id = ?", true), &session, &[Literal::Int(5)])
			.unwrap();
		assert!(matches!(
			&output.program.instructions[1],
			Instruction::FilterCompare { value: Literal::Int(5), .. }
		));
	}

	#[test]
	fn test_explain_is_one_shot() {
		let (_, pipeline, session) = setup();
		let output = pipeline.run(&identity("EXPLAIN SELECT id FROM users", true), &session, &[]).unwrap();
		assert_eq!(output.disposition, Disposition::OneShot);
		assert_eq!(output.program.instructions.len(), 1);
		assert!(matches!(
			&output.program.instructions[0],
			Instruction::Describe { rendered } if rendered.contains("scan")
		));
	}

	#[test]
	fn test_temporary_table_makes_plan_session_local() {
		let (catalog, pipeline, session) = setup();
		let ns = catalog.namespace_id("app").unwrap();
		catalog.create_table(ns, "scratch", vec![ColumnDef::new("id", ColumnType::Int)], Some(session.session))
			.unwrap();

		let output = pipeline.run(&identity("SELECT id FROM scratch", true), &session, &[]).unwrap();
		assert_eq!(output.disposition, Disposition::SessionLocal);
	}

	#[test]
	fn test_temporary_table_shadows_shared() {
		let (catalog, pipeline, session) = setup();
		let ns = catalog.namespace_id("app").unwrap();
		let local = catalog
			.create_table(ns, "users", vec![ColumnDef::new("id", ColumnType::Int)], Some(session.session))
			.unwrap();

		let output = pipeline.run(&identity("SELECT id FROM users", true), &session, &[]).unwrap();
		assert_eq!(output.dependencies, vec![local.id]);
		assert_eq!(output.disposition, Disposition::SessionLocal);
	}

	#[test]
	fn test_insert_type_mismatch() {
		let (_, pipeline, session) = setup();
		let err = pipeline
			.run(&identity("INSERT INTO users (id) VALUES ('oops')", false), &session, &[])
			.unwrap_err();
		assert_eq!(err.code(), TYPE_MISMATCH);
	}

	#[test]
	fn test_bool_not_eq_is_normalized() {
		let (_, pipeline, session) = setup();
		let output = pipeline
			.run(&identity("SELECT id FROM users WHERE active != true", true), &session, &[])
			.unwrap();
		assert!(matches!(
			&output.program.instructions[1],
			Instruction::FilterCompare { op: CompareOp::Eq, value: Literal::Bool(false), .. }
		));
	}

	#[test]
	fn test_explain_ddl_describes_without_executing() {
		let (catalog, pipeline, session) = setup();
		let output = pipeline
			.run(&identity("EXPLAIN CREATE TABLE events (id INT)", true), &session, &[])
			.unwrap();

		assert_eq!(output.disposition, Disposition::OneShot);
		assert!(matches!(
			&output.program.instructions[0],
			Instruction::Describe { rendered } if rendered.contains("create table events")
		));

		// Describing the DDL never created the table.
		let ns = catalog.namespace_id("app").unwrap();
		assert!(catalog.find_table_by_name(ns, "events", None).is_none());
	}

	#[test]
	fn test_ddl_elevates_and_is_one_shot() {
		let (_, pipeline, session) = setup();
		let output = pipeline
			.run(&identity("CREATE TABLE events (id INT, payload TEXT)", false), &session, &[])
			.unwrap();
		assert_eq!(output.disposition, Disposition::OneShot);
		assert!(matches!(&output.program.instructions[0], Instruction::CreateTable { temporary: false, .. }));
	}
}
