// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! The narrow contracts the statement compiler consumes from the
//! transaction and dependency layers, plus the shared value types that
//! cross crate boundaries.

mod dependency;
mod identity;
mod ids;
mod plan;
mod session;
mod transaction;

pub use dependency::{DependencyTracker, InvalidationKind, InvalidationSink};
pub use identity::{IsolationLevel, StatementIdentity};
pub use ids::{NamespaceId, ObjectId, PlanKey, SavepointId, SessionId};
pub use plan::{Disposition, Permission};
pub use session::{CancelToken, OptimizerFlags, SessionContext};
pub use transaction::{NestedTransaction, TransactionCoordinator};
