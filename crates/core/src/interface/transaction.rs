// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use super::{ObjectId, SavepointId};

/// A nested sub-transaction: a bounded unit of lock acquisition scoped
/// to one compile attempt.
///
/// Locks taken through the handle live until `commit` or `rollback`.
/// Dropping an unfinished handle rolls it back, so every exit path of a
/// compile releases its schema locks.
pub trait NestedTransaction {
	/// Takes a shared schema lock on `object`, keeping the catalog rows
	/// it guards consistent for the rest of this sub-transaction.
	fn lock_shared(&mut self, object: ObjectId) -> crate::Result<()>;

	/// Upgrades this sub-transaction to read-write for `resource`.
	/// Needed when a compile must touch catalog rows (DDL statements,
	/// statistics refresh).
	fn elevate(&mut self, resource: &str) -> crate::Result<()>;

	fn create_savepoint(&mut self, name: &str) -> crate::Result<SavepointId>;

	fn release_savepoint(&mut self, savepoint: SavepointId) -> crate::Result<()>;

	/// Releases every lock taken after `savepoint` and forgets any
	/// savepoints created after it.
	fn rollback_to_savepoint(&mut self, savepoint: SavepointId) -> crate::Result<()>;

	fn commit(self) -> crate::Result<()>;

	fn rollback(self);
}

/// The subset of the transaction manager the compiler consumes.
pub trait TransactionCoordinator: Send + Sync {
	type Nested: NestedTransaction;

	fn begin_nested(&self, read_only: bool) -> crate::Result<Self::Nested>;
}
