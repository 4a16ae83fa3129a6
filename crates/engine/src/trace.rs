// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic compiler counters, cheap enough to keep always on.
#[derive(Debug, Default)]
pub struct CompilerMetrics {
	hits: AtomicU64,
	compiles: AtomicU64,
	failures: AtomicU64,
	waits: AtomicU64,
	stale_retries: AtomicU64,
	orphan_recompiles: AtomicU64,
}

impl CompilerMetrics {
	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_compile(&self) {
		self.compiles.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_wait(&self) {
		self.waits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_stale_retry(&self) {
		self.stale_retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_orphan_recompile(&self) {
		self.orphan_recompiles.fetch_add(1, Ordering::Relaxed);
	}

	/// Cache hits served without recompiling.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Successful compiles.
	pub fn compiles(&self) -> u64 {
		self.compiles.load(Ordering::Relaxed)
	}

	/// Compiles that surfaced an error to the caller.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Times a session blocked on another session's compile.
	pub fn waits(&self) -> u64 {
		self.waits.load(Ordering::Relaxed)
	}

	/// Automatic retries after a stale-reference failure.
	pub fn stale_retries(&self) -> u64 {
		self.stale_retries.load(Ordering::Relaxed)
	}

	/// Valid-looking entries recompiled because their dependency record
	/// was gone.
	pub fn orphan_recompiles(&self) -> u64 {
		self.orphan_recompiles.load(Ordering::Relaxed)
	}
}
