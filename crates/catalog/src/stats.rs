// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use dashmap::DashMap;
use stratum_core::interface::{NestedTransaction, ObjectId};

/// Per-table row estimates consumed by the optimizer. Refreshing an
/// estimate writes catalog rows, so it requires elevating the nested
/// transaction to read-write first.
pub struct StatisticsStore {
	rows: DashMap<ObjectId, u64>,
}

impl StatisticsStore {
	pub(crate) fn new() -> Self {
		Self {
			rows: DashMap::new(),
		}
	}

	pub fn estimate_rows(&self, object: ObjectId) -> Option<u64> {
		self.rows.get(&object).map(|rows| *rows)
	}

	pub fn refresh(&self, txn: &mut impl NestedTransaction, object: ObjectId, rows: u64) -> crate::Result<()> {
		txn.elevate("statistics")?;
		self.rows.insert(object, rows);
		Ok(())
	}

	pub(crate) fn forget(&self, object: ObjectId) {
		self.rows.remove(&object);
	}
}
