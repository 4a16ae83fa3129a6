// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use std::{collections::HashSet, sync::Arc};

use dashmap::DashMap;
use parking_lot::RwLock;
use stratum_core::interface::{DependencyTracker, InvalidationKind, InvalidationSink, ObjectId, PlanKey};
use tracing::debug;

/// Records "plan P used schema object O at compile time" edges and
/// drives plan invalidation when objects change.
///
/// Edge removal and sink notification are two separate steps. A reader
/// can therefore observe a plan whose cached flag still says valid while
/// its dependency record is already gone; the compiler covers that gap
/// by re-checking [`DependencyTracker::has_live_dependency`] on cache
/// hits.
pub struct DependencyRegistry {
	/// object -> plans that depend on it
	dependents: DashMap<ObjectId, HashSet<PlanKey>>,
	/// plan -> objects it depends on
	records: DashMap<PlanKey, Vec<ObjectId>>,
	sink: RwLock<Option<Arc<dyn InvalidationSink>>>,
}

impl DependencyRegistry {
	pub fn new() -> Self {
		Self {
			dependents: DashMap::new(),
			records: DashMap::new(),
			sink: RwLock::new(None),
		}
	}

	/// Wires the statement cache in. Invalidations raised before a sink
	/// is attached only remove edges.
	pub fn attach_sink(&self, sink: Arc<dyn InvalidationSink>) {
		*self.sink.write() = Some(sink);
	}

	/// Invalidates every plan depending on `object`. Called by
	/// schema-change code paths (DROP, ALTER), never by the compiler.
	pub fn invalidate_object(&self, object: ObjectId, kind: InvalidationKind) {
		let Some((_, plans)) = self.dependents.remove(&object) else {
			return;
		};
		debug!("invalidating {} plans depending on object {}", plans.len(), object);

		// First step: the records disappear.
		for plan in &plans {
			self.records.remove(plan);
		}

		// Second step: the cache flags flip. A concurrent lookup
		// between the two steps sees a valid flag with no record.
		let sink = self.sink.read().clone();
		if let Some(sink) = sink {
			for plan in plans {
				sink.plan_invalidated(plan, kind);
			}
		}
	}

	pub fn record_count(&self) -> usize {
		self.records.len()
	}
}

impl Default for DependencyRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl DependencyTracker for DependencyRegistry {
	fn has_live_dependency(&self, plan: PlanKey) -> bool {
		self.records.contains_key(&plan)
	}

	fn register_dependencies(&self, plan: PlanKey, objects: &[ObjectId]) {
		self.records.insert(plan, objects.to_vec());
		for object in objects {
			self.dependents.entry(*object).or_default().insert(plan);
		}
	}

	fn drop_dependencies(&self, plan: PlanKey) {
		if let Some((_, objects)) = self.records.remove(&plan) {
			for object in objects {
				if let Some(mut dependents) = self.dependents.get_mut(&object) {
					dependents.remove(&plan);
				}
			}
		}
	}
}
