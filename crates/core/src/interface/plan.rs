// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use serde::{Deserialize, Serialize};

use super::{NamespaceId, ObjectId};

/// How a compiled plan may be cached. Decided once, at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
	/// Shareable across sessions; stays in the cache until invalidated
	/// or evicted.
	Shared,
	/// References session-local schema objects; usable once by the
	/// compiling session, evicted from the shared cache before the
	/// compile call returns.
	SessionLocal,
	/// One-shot statements (EXPLAIN and friends); never worth keeping.
	OneShot,
}

/// A privilege the executing principal must hold to run a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Permission {
	Select(ObjectId),
	Insert(ObjectId),
	CreateTable(NamespaceId),
	DropTable(ObjectId),
}
