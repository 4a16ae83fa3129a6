// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use parking_lot::{RwLock as ParkingRwLock, RwLockReadGuard as ParkingRwLockReadGuard, RwLockWriteGuard as ParkingRwLockWriteGuard};
use self_cell::self_cell;
use stratum_core::{diagnostic::transaction::lock_unavailable, error, interface::ObjectId};

type SharedGuard<'a> = ParkingRwLockReadGuard<'a, ()>;

self_cell! {
	// Owns the lock Arc together with the guard borrowing from it, so a
	// held lock can live in a transaction struct.
	pub(crate) struct SharedObjectLock {
		owner: Arc<ParkingRwLock<()>>,

		#[covariant]
		dependent: SharedGuard,
	}
}

type ExclusiveGuard<'a> = ParkingRwLockWriteGuard<'a, ()>;

self_cell! {
	pub(crate) struct ExclusiveResourceLock {
		owner: Arc<ParkingRwLock<()>>,

		#[covariant]
		dependent: ExclusiveGuard,
	}
}

/// Process-wide schema lock table. Object locks are taken shared by
/// compiling transactions; named resources (catalog rows, statistics)
/// are taken exclusive on elevation.
pub(crate) struct LockManager {
	objects: DashMap<ObjectId, Arc<ParkingRwLock<()>>>,
	resources: DashMap<String, Arc<ParkingRwLock<()>>>,
	timeout: Duration,
}

impl LockManager {
	pub(crate) fn new(timeout: Duration) -> Self {
		Self {
			objects: DashMap::new(),
			resources: DashMap::new(),
			timeout,
		}
	}

	pub(crate) fn lock_shared(&self, object: ObjectId) -> crate::Result<SharedObjectLock> {
		let lock = self.objects.entry(object).or_insert_with(|| Arc::new(ParkingRwLock::new(()))).clone();
		SharedObjectLock::try_new(lock, |lock| {
			lock.try_read_for(self.timeout).ok_or_else(|| error!(lock_unavailable(object.0)))
		})
	}

	pub(crate) fn lock_resource_exclusive(&self, resource: &str) -> crate::Result<ExclusiveResourceLock> {
		let lock = self
			.resources
			.entry(resource.to_string())
			.or_insert_with(|| Arc::new(ParkingRwLock::new(())))
			.clone();
		ExclusiveResourceLock::try_new(lock, |lock| {
			lock.try_write_for(self.timeout).ok_or_else(|| {
				error!(stratum_core::diagnostic::transaction::elevate_denied(resource))
			})
		})
	}
}
