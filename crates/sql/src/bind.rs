// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Binds a parsed statement against the catalog: resolves names to
//! object ids, checks types, collects required permissions and the
//! dependency set, and decides how the resulting plan may be cached.
//!
//! Binding runs inside an open nested sub-transaction; every catalog
//! object it reads is locked shared first so the reads stay mutually
//! consistent for the rest of the compile.

use stratum_catalog::{ColumnDef, MaterializedCatalog, TableDef};
use stratum_core::{
	diagnostic::{Diagnostic, Fragment, catalog::table_exists, compile},
	error,
	interface::{Disposition, NamespaceId, NestedTransaction, ObjectId, Permission, SessionContext},
};
use tracing::instrument;

use crate::ast::{
	CompareOp, CreateTableNode, DropTableNode, FilterExpr, InsertNode, Literal, Projection, SelectNode, Statement,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BoundFilter {
	pub column: ColumnDef,
	pub op: CompareOp,
	pub value: Literal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoundKind {
	Select {
		table: TableDef,
		columns: Vec<ColumnDef>,
		filter: Option<BoundFilter>,
	},
	Insert {
		table: TableDef,
		columns: Vec<ColumnDef>,
		values: Vec<Literal>,
	},
	CreateTable {
		namespace: NamespaceId,
		name: String,
		columns: Vec<ColumnDef>,
		temporary: bool,
	},
	DropTable {
		table: TableDef,
	},
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
	pub kind: BoundKind,
	/// EXPLAIN wrapper: describe the plan instead of executing it.
	pub explain: bool,
	pub permissions: Vec<Permission>,
	pub dependencies: Vec<ObjectId>,
	pub disposition: Disposition,
	pub warnings: Vec<Diagnostic>,
}

#[instrument(name = "sql::bind", level = "trace", skip_all)]
pub fn bind<N: NestedTransaction>(
	statement: &Statement,
	catalog: &MaterializedCatalog,
	session: &SessionContext,
	txn: &mut N,
) -> crate::Result<BoundStatement> {
	match statement {
		Statement::Explain(inner) => {
			let mut bound = bind(inner, catalog, session, txn)?;
			bound.explain = true;
			// One-shot: describing a plan is never worth a cache slot.
			bound.disposition = Disposition::OneShot;
			Ok(bound)
		}
		Statement::Select(select) => bind_select(select, catalog, session, txn),
		Statement::Insert(insert) => bind_insert(insert, catalog, session, txn),
		Statement::CreateTable(create) => bind_create_table(create, catalog, session, txn),
		Statement::DropTable(drop) => bind_drop_table(drop, catalog, session, txn),
	}
}

/// Resolves and share-locks a table. A session-local table shadows a
/// shared one of the same name; the savepoint gives back the shared
/// lock taken while probing when that happens.
fn resolve_table<N: NestedTransaction>(
	catalog: &MaterializedCatalog,
	session: &SessionContext,
	txn: &mut N,
	namespace: NamespaceId,
	name: &str,
	offset: u32,
) -> crate::Result<TableDef> {
	let savepoint = txn.create_savepoint("resolve")?;

	let shared = catalog.find_table_by_name(namespace, name, None);
	if let Some(def) = &shared {
		txn.lock_shared(def.id)?;
	}

	let chosen = match catalog.find_table_by_name(namespace, name, Some(session.session)) {
		Some(local) if local.is_session_local() => {
			txn.rollback_to_savepoint(savepoint)?;
			txn.lock_shared(local.id)?;
			local
		}
		_ => match shared {
			Some(def) => def,
			None => {
				return Err(error!(compile::table_not_found(
					Fragment::new(name, offset),
					&session.namespace,
					name,
				)));
			}
		},
	};
	txn.release_savepoint(savepoint)?;

	// Re-read under the lock: a drop that slipped in between the name
	// lookup and the lock is a stale reference, not a missing table.
	catalog.find_table(chosen.id).ok_or_else(|| {
		error!(compile::stale_reference(chosen.id.0, format!("table '{}' was dropped during binding", name)))
	})
}

fn resolve_column(table: &TableDef, name: &str, offset: u32) -> crate::Result<ColumnDef> {
	table.column(name)
		.cloned()
		.ok_or_else(|| error!(compile::column_not_found(Fragment::new(name, offset), &table.name, name)))
}

fn table_disposition(table: &TableDef) -> Disposition {
	if table.is_session_local() {
		Disposition::SessionLocal
	} else {
		Disposition::Shared
	}
}

fn bind_select<N: NestedTransaction>(
	select: &SelectNode,
	catalog: &MaterializedCatalog,
	session: &SessionContext,
	txn: &mut N,
) -> crate::Result<BoundStatement> {
	let namespace = catalog.namespace_id(&session.namespace)?;
	let table = resolve_table(catalog, session, txn, namespace, &select.table, select.table_offset)?;

	let columns = match &select.projection {
		Projection::All => table.columns.clone(),
		Projection::Columns(names) => names
			.iter()
			.map(|name| resolve_column(&table, name, select.table_offset))
			.collect::<crate::Result<Vec<_>>>()?,
	};

	let filter = match &select.filter {
		Some(filter) => Some(bind_filter(&table, filter)?),
		None => None,
	};

	Ok(BoundStatement {
		permissions: vec![Permission::Select(table.id)],
		dependencies: vec![table.id],
		disposition: table_disposition(&table),
		explain: false,
		warnings: vec![],
		kind: BoundKind::Select {
			table,
			columns,
			filter,
		},
	})
}

fn bind_filter(table: &TableDef, filter: &FilterExpr) -> crate::Result<BoundFilter> {
	let column = resolve_column(table, &filter.column, filter.offset)?;
	if !filter.value.matches(column.ty) {
		return Err(error!(compile::type_mismatch(
			Fragment::new(filter.column.clone(), filter.offset),
			&column.ty.to_string(),
			filter.value.type_name(),
		)));
	}
	Ok(BoundFilter {
		column,
		op: filter.op,
		value: filter.value.clone(),
	})
}

fn bind_insert<N: NestedTransaction>(
	insert: &InsertNode,
	catalog: &MaterializedCatalog,
	session: &SessionContext,
	txn: &mut N,
) -> crate::Result<BoundStatement> {
	let namespace = catalog.namespace_id(&session.namespace)?;
	let table = resolve_table(catalog, session, txn, namespace, &insert.table, insert.table_offset)?;

	if insert.columns.len() != insert.values.len() {
		return Err(error!(compile::type_mismatch(
			Fragment::new(insert.table.clone(), insert.table_offset),
			&format!("{} values", insert.columns.len()),
			&format!("{} values", insert.values.len()),
		)));
	}

	let mut columns = Vec::with_capacity(insert.columns.len());
	for (name, value) in insert.columns.iter().zip(&insert.values) {
		let column = resolve_column(&table, name, insert.table_offset)?;
		if !value.matches(column.ty) {
			return Err(error!(compile::type_mismatch(
				Fragment::new(name.clone(), insert.table_offset),
				&column.ty.to_string(),
				value.type_name(),
			)));
		}
		columns.push(column);
	}

	Ok(BoundStatement {
		permissions: vec![Permission::Insert(table.id)],
		dependencies: vec![table.id],
		disposition: table_disposition(&table),
		explain: false,
		warnings: vec![],
		kind: BoundKind::Insert {
			table,
			columns,
			values: insert.values.clone(),
		},
	})
}

fn bind_create_table<N: NestedTransaction>(
	create: &CreateTableNode,
	catalog: &MaterializedCatalog,
	session: &SessionContext,
	txn: &mut N,
) -> crate::Result<BoundStatement> {
	let namespace = catalog.namespace_id(&session.namespace)?;

	// DDL writes catalog rows at execution; compile under the elevated
	// mode it will need.
	txn.elevate("catalog")?;

	let owner = create.temporary.then_some(session.session);
	if catalog.find_table_by_name(namespace, &create.table, owner).is_some_and(|def| def.session == owner) {
		return Err(error!(table_exists(&session.namespace, &create.table)));
	}

	let columns = create.columns.iter().map(|(name, ty)| ColumnDef::new(name.clone(), *ty)).collect();

	Ok(BoundStatement {
		permissions: vec![Permission::CreateTable(namespace)],
		dependencies: vec![],
		disposition: Disposition::OneShot,
		explain: false,
		warnings: vec![],
		kind: BoundKind::CreateTable {
			namespace,
			name: create.table.clone(),
			columns,
			temporary: create.temporary,
		},
	})
}

fn bind_drop_table<N: NestedTransaction>(
	drop: &DropTableNode,
	catalog: &MaterializedCatalog,
	session: &SessionContext,
	txn: &mut N,
) -> crate::Result<BoundStatement> {
	let namespace = catalog.namespace_id(&session.namespace)?;
	let table = resolve_table(catalog, session, txn, namespace, &drop.table, drop.table_offset)?;

	txn.elevate("catalog")?;

	Ok(BoundStatement {
		permissions: vec![Permission::DropTable(table.id)],
		dependencies: vec![table.id],
		disposition: Disposition::OneShot,
		explain: false,
		warnings: vec![],
		kind: BoundKind::DropTable {
			table,
		},
	})
}
