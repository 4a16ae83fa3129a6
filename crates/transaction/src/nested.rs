// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use std::sync::Arc;

use stratum_core::{
	diagnostic::transaction::{already_completed, savepoint_not_found},
	error,
	interface::{NestedTransaction, ObjectId, SavepointId},
};
use tracing::debug;

use crate::lock::{ExclusiveResourceLock, LockManager, SharedObjectLock};

struct Savepoint {
	id: SavepointId,
	name: String,
	lock_mark: usize,
	elevation_mark: usize,
}

/// A nested sub-transaction holding schema locks on behalf of one
/// compile attempt. Dropping the handle without committing rolls it
/// back and releases every lock.
pub struct StandardNestedTransaction {
	manager: Arc<LockManager>,
	read_only: bool,
	completed: bool,
	locks: Vec<(ObjectId, SharedObjectLock)>,
	elevations: Vec<(String, ExclusiveResourceLock)>,
	savepoints: Vec<Savepoint>,
	next_savepoint: u32,
}

impl StandardNestedTransaction {
	pub(crate) fn new(manager: Arc<LockManager>, read_only: bool) -> Self {
		Self {
			manager,
			read_only,
			completed: false,
			locks: Vec::new(),
			elevations: Vec::new(),
			savepoints: Vec::new(),
			next_savepoint: 0,
		}
	}

	pub fn read_only(&self) -> bool {
		self.read_only
	}

	pub fn lock_count(&self) -> usize {
		self.locks.len()
	}

	fn check_open(&self, operation: &str) -> crate::Result<()> {
		if self.completed {
			return Err(error!(already_completed(operation)));
		}
		Ok(())
	}
}

impl NestedTransaction for StandardNestedTransaction {
	fn lock_shared(&mut self, object: ObjectId) -> crate::Result<()> {
		self.check_open("lock")?;
		// Re-locking an object already held is a no-op; the first guard
		// covers the whole sub-transaction.
		if self.locks.iter().any(|(held, _)| *held == object) {
			return Ok(());
		}
		let guard = self.manager.lock_shared(object)?;
		self.locks.push((object, guard));
		Ok(())
	}

	fn elevate(&mut self, resource: &str) -> crate::Result<()> {
		self.check_open("elevate")?;
		if self.elevations.iter().any(|(held, _)| held == resource) {
			return Ok(());
		}
		let guard = self.manager.lock_resource_exclusive(resource)?;
		self.elevations.push((resource.to_string(), guard));
		self.read_only = false;
		Ok(())
	}

	fn create_savepoint(&mut self, name: &str) -> crate::Result<SavepointId> {
		self.check_open("create savepoint")?;
		let id = SavepointId(self.next_savepoint);
		self.next_savepoint += 1;
		self.savepoints.push(Savepoint {
			id,
			name: name.to_string(),
			lock_mark: self.locks.len(),
			elevation_mark: self.elevations.len(),
		});
		Ok(id)
	}

	fn release_savepoint(&mut self, savepoint: SavepointId) -> crate::Result<()> {
		self.check_open("release savepoint")?;
		let position = self
			.savepoints
			.iter()
			.position(|sp| sp.id == savepoint)
			.ok_or_else(|| error!(savepoint_not_found(&format!("#{}", savepoint.0))))?;
		// Releasing a savepoint releases everything established after
		// it as well; the locks stay held by the transaction.
		self.savepoints.truncate(position);
		Ok(())
	}

	fn rollback_to_savepoint(&mut self, savepoint: SavepointId) -> crate::Result<()> {
		self.check_open("rollback to savepoint")?;
		let position = self
			.savepoints
			.iter()
			.position(|sp| sp.id == savepoint)
			.ok_or_else(|| error!(savepoint_not_found(&format!("#{}", savepoint.0))))?;

		let (lock_mark, elevation_mark) = {
			let sp = &self.savepoints[position];
			debug!("rolling back to savepoint '{}', releasing {} locks", sp.name, self.locks.len() - sp.lock_mark);
			(sp.lock_mark, sp.elevation_mark)
		};

		self.locks.truncate(lock_mark);
		self.elevations.truncate(elevation_mark);
		// The savepoint itself stays established.
		self.savepoints.truncate(position + 1);
		Ok(())
	}

	fn commit(mut self) -> crate::Result<()> {
		self.completed = true;
		self.locks.clear();
		self.elevations.clear();
		self.savepoints.clear();
		Ok(())
	}

	fn rollback(mut self) {
		self.completed = true;
		self.locks.clear();
		self.elevations.clear();
		self.savepoints.clear();
	}
}

impl Drop for StandardNestedTransaction {
	fn drop(&mut self) {
		if !self.completed {
			debug!("nested sub-transaction dropped without commit, rolling back {} locks", self.locks.len());
		}
	}
}
