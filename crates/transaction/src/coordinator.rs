// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use std::{sync::Arc, time::Duration};

use stratum_core::interface::TransactionCoordinator;
use tracing::instrument;

use crate::{lock::LockManager, nested::StandardNestedTransaction};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Single-version lock coordinator. Hands out nested sub-transactions
/// whose schema locks are scoped to one compile attempt each.
#[derive(Clone)]
pub struct StandardCoordinator {
	manager: Arc<LockManager>,
}

impl StandardCoordinator {
	pub fn new() -> Self {
		Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
	}

	pub fn with_lock_timeout(timeout: Duration) -> Self {
		Self {
			manager: Arc::new(LockManager::new(timeout)),
		}
	}
}

impl Default for StandardCoordinator {
	fn default() -> Self {
		Self::new()
	}
}

impl TransactionCoordinator for StandardCoordinator {
	type Nested = StandardNestedTransaction;

	#[instrument(name = "transaction::begin_nested", level = "trace", skip(self))]
	fn begin_nested(&self, read_only: bool) -> crate::Result<Self::Nested> {
		Ok(StandardNestedTransaction::new(self.manager.clone(), read_only))
	}
}
