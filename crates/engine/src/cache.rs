// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! The shared statement cache: one entry per statement identity, plus a
//! key index so the dependency layer can address entries without
//! knowing identities.

use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use stratum_core::interface::{InvalidationKind, InvalidationSink, PlanKey, StatementIdentity};
use tracing::debug;

use crate::plan::{CompiledPlan, PlanState};

pub struct StatementCache {
	plans: DashMap<StatementIdentity, Arc<CompiledPlan>>,
	keys: DashMap<PlanKey, StatementIdentity>,
	next_key: AtomicU64,
}

impl StatementCache {
	pub fn new() -> Self {
		Self {
			plans: DashMap::new(),
			keys: DashMap::new(),
			next_key: AtomicU64::new(1),
		}
	}

	/// Returns the entry for `identity`, creating an uncompiled one if
	/// absent. First writer wins: concurrent callers all end up with the
	/// same entry.
	pub fn get_or_insert(&self, identity: &StatementIdentity) -> Arc<CompiledPlan> {
		self.plans
			.entry(identity.clone())
			.or_insert_with(|| {
				let key = PlanKey(self.next_key.fetch_add(1, Ordering::SeqCst));
				self.keys.insert(key, identity.clone());
				Arc::new(CompiledPlan::new(identity.clone(), key))
			})
			.clone()
	}

	pub fn get(&self, identity: &StatementIdentity) -> Option<Arc<CompiledPlan>> {
		self.plans.get(identity).map(|plan| plan.clone())
	}

	pub fn remove(&self, identity: &StatementIdentity) -> Option<Arc<CompiledPlan>> {
		let (_, plan) = self.plans.remove(identity)?;
		self.keys.remove(&plan.key());
		Some(plan)
	}

	pub fn len(&self) -> usize {
		self.plans.len()
	}

	pub fn is_empty(&self) -> bool {
		self.plans.is_empty()
	}

	/// Evicts arbitrary idle entries until at most `capacity` remain.
	/// `keep` and entries with a compile in flight are never victims.
	/// Returns the evicted keys so the caller can drop their dependency
	/// records.
	pub fn evict_overflow(&self, capacity: usize, keep: &StatementIdentity) -> Vec<PlanKey> {
		let mut evicted = Vec::new();
		while self.plans.len() > capacity {
			let victim = self
				.plans
				.iter()
				.find(|entry| entry.key() != keep && entry.value().state() != PlanState::Compiling)
				.map(|entry| entry.key().clone());
			let Some(identity) = victim else {
				break;
			};
			if let Some(plan) = self.remove(&identity) {
				debug!("evicted plan {} over capacity {}", plan.key(), capacity);
				evicted.push(plan.key());
			}
		}
		evicted
	}
}

impl Default for StatementCache {
	fn default() -> Self {
		Self::new()
	}
}

impl InvalidationSink for StatementCache {
	fn plan_invalidated(&self, key: PlanKey, kind: InvalidationKind) {
		let Some(identity) = self.keys.get(&key).map(|entry| entry.clone()) else {
			return;
		};
		match kind {
			InvalidationKind::Dropped => {
				// The entry leaves the cache; in-flight compiles and
				// waiters observe the flag flip through the plan they
				// already hold.
				if let Some(plan) = self.remove(&identity) {
					plan.invalidate(kind);
				}
			}
			InvalidationKind::Altered => {
				// The entry stays and recompiles in place on next use.
				if let Some(plan) = self.get(&identity) {
					plan.invalidate(kind);
				}
			}
		}
	}
}
