// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

/// Compiler and cache tuning knobs.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
	/// Upper bound on cached shared plans. Overflow evicts an arbitrary
	/// idle entry.
	pub cache_size: usize,
	/// Normalize statement text before building the cache identity, so
	/// statements differing only in comments and whitespace share one
	/// entry.
	pub ignore_comment_differences: bool,
	/// A cache hit probes the dependency record every N uses. 1 probes
	/// on every hit.
	pub stale_plan_check_interval: u64,
}

impl Default for CompilerConfig {
	fn default() -> Self {
		Self {
			cache_size: 1024,
			ignore_comment_differences: false,
			stale_plan_check_interval: 1,
		}
	}
}

impl CompilerConfig {
	pub fn with_cache_size(mut self, cache_size: usize) -> Self {
		self.cache_size = cache_size;
		self
	}

	pub fn with_ignore_comment_differences(mut self, ignore: bool) -> Self {
		self.ignore_comment_differences = ignore;
		self
	}

	pub fn with_stale_plan_check_interval(mut self, interval: u64) -> Self {
		self.stale_plan_check_interval = interval.max(1);
		self
	}
}
