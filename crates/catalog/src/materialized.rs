// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use stratum_core::{
	diagnostic::catalog::{namespace_not_found, table_exists},
	error,
	interface::{InvalidationKind, NamespaceId, ObjectId, SessionId},
};
use tracing::{debug, instrument};

use crate::{
	def::{ColumnDef, NamespaceDef, TableDef},
	dependency::DependencyRegistry,
	stats::StatisticsStore,
};

/// The in-memory schema catalog: namespaces and tables indexed by id
/// and by name, safe for concurrent readers and DDL writers.
///
/// DDL operations fire plan invalidations through the attached
/// [`DependencyRegistry`].
pub struct MaterializedCatalog {
	namespaces: DashMap<String, NamespaceDef>,
	tables: DashMap<ObjectId, TableDef>,
	/// (namespace, name, owning session) -> object. Shared tables use
	/// `None` as the session component.
	table_names: DashMap<(NamespaceId, String, Option<SessionId>), ObjectId>,
	registry: Arc<DependencyRegistry>,
	stats: StatisticsStore,
	next_namespace: AtomicU64,
	next_object: AtomicU64,
}

impl MaterializedCatalog {
	pub fn new() -> Self {
		Self {
			namespaces: DashMap::new(),
			tables: DashMap::new(),
			table_names: DashMap::new(),
			registry: Arc::new(DependencyRegistry::new()),
			stats: StatisticsStore::new(),
			next_namespace: AtomicU64::new(1),
			next_object: AtomicU64::new(1),
		}
	}

	pub fn registry(&self) -> &Arc<DependencyRegistry> {
		&self.registry
	}

	pub fn stats(&self) -> &StatisticsStore {
		&self.stats
	}

	pub fn ensure_namespace(&self, name: &str) -> NamespaceId {
		self.namespaces
			.entry(name.to_string())
			.or_insert_with(|| NamespaceDef {
				id: NamespaceId(self.next_namespace.fetch_add(1, Ordering::SeqCst)),
				name: name.to_string(),
			})
			.id
	}

	pub fn namespace_id(&self, name: &str) -> crate::Result<NamespaceId> {
		self.namespaces.get(name).map(|ns| ns.id).ok_or_else(|| error!(namespace_not_found(name)))
	}

	#[instrument(name = "catalog::create_table", level = "trace", skip(self, columns))]
	pub fn create_table(
		&self,
		namespace: NamespaceId,
		name: &str,
		columns: Vec<ColumnDef>,
		session: Option<SessionId>,
	) -> crate::Result<TableDef> {
		let key = (namespace, name.to_string(), session);
		if self.table_names.contains_key(&key) {
			return Err(error!(table_exists(&namespace.to_string(), name)));
		}

		let id = ObjectId(self.next_object.fetch_add(1, Ordering::SeqCst));
		let def = TableDef {
			id,
			namespace,
			name: name.to_string(),
			columns,
			session,
			schema_version: 0,
		};

		self.tables.insert(id, def.clone());
		self.table_names.insert(key, id);
		debug!("created table '{}' as object {}", name, id);
		Ok(def)
	}

	#[instrument(name = "catalog::drop_table", level = "trace", skip(self))]
	pub fn drop_table(&self, id: ObjectId) -> crate::Result<()> {
		let Some((_, def)) = self.tables.remove(&id) else {
			return Err(error!(stratum_core::internal!("drop of unknown object {}", id)));
		};
		self.table_names.remove(&(def.namespace, def.name.clone(), def.session));
		self.stats.forget(id);
		self.registry.invalidate_object(id, InvalidationKind::Dropped);
		debug!("dropped table '{}' (object {})", def.name, id);
		Ok(())
	}

	#[instrument(name = "catalog::alter_table", level = "trace", skip(self, column))]
	pub fn alter_table_add_column(&self, id: ObjectId, column: ColumnDef) -> crate::Result<TableDef> {
		let def = {
			let Some(mut def) = self.tables.get_mut(&id) else {
				return Err(error!(stratum_core::internal!("alter of unknown object {}", id)));
			};
			def.columns.push(column);
			def.schema_version += 1;
			def.clone()
		};
		self.registry.invalidate_object(id, InvalidationKind::Altered);
		Ok(def)
	}

	pub fn find_table(&self, id: ObjectId) -> Option<TableDef> {
		self.tables.get(&id).map(|def| def.clone())
	}

	/// Resolves a table name for `session`: a session-local table
	/// shadows a shared one of the same name.
	pub fn find_table_by_name(
		&self,
		namespace: NamespaceId,
		name: &str,
		session: Option<SessionId>,
	) -> Option<TableDef> {
		if let Some(session) = session {
			let key = (namespace, name.to_string(), Some(session));
			if let Some(id) = self.table_names.get(&key) {
				return self.find_table(*id);
			}
		}
		let key = (namespace, name.to_string(), None);
		self.table_names.get(&key).and_then(|id| self.find_table(*id))
	}
}

impl Default for MaterializedCatalog {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use stratum_core::interface::{DependencyTracker, PlanKey, SessionId};

	use super::*;
	use crate::def::ColumnType;

	fn columns() -> Vec<ColumnDef> {
		vec![ColumnDef::new("id", ColumnType::Int), ColumnDef::new("name", ColumnType::Text)]
	}

	#[test]
	fn test_create_and_resolve() {
		let catalog = MaterializedCatalog::new();
		let ns = catalog.ensure_namespace("app");
		let def = catalog.create_table(ns, "users", columns(), None).unwrap();

		let found = catalog.find_table_by_name(ns, "users", None).unwrap();
		assert_eq!(found.id, def.id);
		assert_eq!(found.column("id").unwrap().ty, ColumnType::Int);
		assert!(found.column("missing").is_none());
	}

	#[test]
	fn test_duplicate_table_rejected() {
		let catalog = MaterializedCatalog::new();
		let ns = catalog.ensure_namespace("app");
		catalog.create_table(ns, "users", columns(), None).unwrap();
		assert!(catalog.create_table(ns, "users", columns(), None).is_err());
	}

	#[test]
	fn test_session_local_shadows_shared() {
		let catalog = MaterializedCatalog::new();
		let ns = catalog.ensure_namespace("app");
		let shared = catalog.create_table(ns, "scratch", columns(), None).unwrap();
		let local = catalog.create_table(ns, "scratch", columns(), Some(SessionId(7))).unwrap();

		let for_owner = catalog.find_table_by_name(ns, "scratch", Some(SessionId(7))).unwrap();
		assert_eq!(for_owner.id, local.id);
		assert!(for_owner.is_session_local());

		let for_other = catalog.find_table_by_name(ns, "scratch", Some(SessionId(8))).unwrap();
		assert_eq!(for_other.id, shared.id);
	}

	#[test]
	fn test_drop_invalidates_dependents() {
		let catalog = MaterializedCatalog::new();
		let ns = catalog.ensure_namespace("app");
		let def = catalog.create_table(ns, "users", columns(), None).unwrap();

		catalog.registry().register_dependencies(PlanKey(1), &[def.id]);
		catalog.drop_table(def.id).unwrap();

		assert!(catalog.find_table(def.id).is_none());
		assert!(!catalog.registry().has_live_dependency(PlanKey(1)));
	}

	#[test]
	fn test_alter_bumps_schema_version() {
		let catalog = MaterializedCatalog::new();
		let ns = catalog.ensure_namespace("app");
		let def = catalog.create_table(ns, "users", columns(), None).unwrap();

		let altered =
			catalog.alter_table_add_column(def.id, ColumnDef::new("active", ColumnType::Bool)).unwrap();
		assert_eq!(altered.schema_version, 1);
		assert!(altered.column("active").is_some());
	}
}
