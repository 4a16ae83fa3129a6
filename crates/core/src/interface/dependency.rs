// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use super::{ObjectId, PlanKey};

/// Why a plan is being invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidationKind {
	/// The object was dropped; dependents must leave the cache.
	Dropped,
	/// The object was altered; dependents recompile on next use.
	Altered,
}

/// Receives invalidations from the dependency layer. Implemented by the
/// statement cache.
pub trait InvalidationSink: Send + Sync {
	fn plan_invalidated(&self, plan: PlanKey, kind: InvalidationKind);
}

/// Maps compiled plans to the schema objects they used.
///
/// Edge removal and cache notification are not one atomic step in the
/// wider system: a plan can be flagged valid while its dependency record
/// is already gone. Callers must treat a missing record as "invalid"
/// even when the cached flag disagrees.
pub trait DependencyTracker: Send + Sync {
	/// Whether `plan` still has a live dependency record.
	fn has_live_dependency(&self, plan: PlanKey) -> bool;

	/// Records `plan` as a dependent of each object. Called once per
	/// successful compile.
	fn register_dependencies(&self, plan: PlanKey, objects: &[ObjectId]);

	/// Forgets every edge of `plan`. Called when the entry leaves the
	/// cache.
	fn drop_dependencies(&self, plan: PlanKey);
}
