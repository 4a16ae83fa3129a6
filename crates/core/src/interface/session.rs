// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

use super::{IsolationLevel, SessionId};

/// Cooperative cancellation flag shared between a session and whatever
/// compile call it has in flight. Cancelling never corrupts shared
/// state; a waiter that observes the flag simply stops waiting.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::Release);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}
}

/// Session optimizer switches that participate in plan selection. Part
/// of the session-property fingerprint: two sessions with different
/// flags never share a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerFlags {
	pub normalize_predicates: bool,
}

impl Default for OptimizerFlags {
	fn default() -> Self {
		Self {
			normalize_predicates: true,
		}
	}
}

/// Everything a compile needs to know about the calling session, passed
/// down the pipeline explicitly instead of through ambient state.
#[derive(Debug, Clone)]
pub struct SessionContext {
	pub session: SessionId,
	pub namespace: String,
	pub fingerprint: String,
	pub read_only: bool,
	pub isolation: IsolationLevel,
	pub optimizer: OptimizerFlags,
	pub cancel: CancelToken,
}

impl SessionContext {
	pub fn new(session: SessionId, namespace: impl Into<String>) -> Self {
		Self {
			session,
			namespace: namespace.into(),
			fingerprint: String::new(),
			read_only: false,
			isolation: IsolationLevel::default(),
			optimizer: OptimizerFlags::default(),
			cancel: CancelToken::new(),
		}
	}

	pub fn with_read_only(mut self, read_only: bool) -> Self {
		self.read_only = read_only;
		self
	}

	pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
		self.isolation = isolation;
		self
	}

	pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
		self.fingerprint = fingerprint.into();
		self
	}
}
