// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! A cached plan and its compile-state machine.
//!
//! States move `Uncompiled -> Compiling -> Valid | Invalid`; `Invalid`
//! re-enters `Compiling` on the next claim. Exactly one session holds
//! the compiling claim at a time, everyone else blocks on the condvar
//! until the state changes.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use stratum_core::{
	diagnostic::{Diagnostic, engine::compile_cancelled},
	error,
	interface::{CancelToken, Disposition, InvalidationKind, Permission, PlanKey, StatementIdentity},
};
use stratum_sql::generate::Program;
use stratum_sql::pipeline::PipelineOutput;
use tracing::debug;

/// Waiters re-check cancellation at this cadence.
const WAIT_TICK: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanState {
	Uncompiled,
	Compiling,
	Valid,
	Invalid,
}

/// Immutable view of a valid plan, handed out to executing sessions.
/// Outlives invalidation of the cache entry it came from.
#[derive(Debug, Clone)]
pub struct PlanSnapshot {
	pub program: Arc<Program>,
	pub permissions: Vec<Permission>,
	pub warnings: Vec<Diagnostic>,
	pub disposition: Disposition,
	/// Bumped on every successful install into this entry.
	pub version: u64,
}

/// Outcome of trying to take the compiling claim.
pub enum Claim {
	/// The caller owns the compile; it must end with `install` or `fail`.
	Acquired,
	/// The plan is already valid.
	Ready(PlanSnapshot),
	/// Another session is compiling.
	Busy,
}

/// Outcome of waiting for another session's compile.
#[derive(Debug)]
pub enum WaitOutcome {
	Ready(PlanSnapshot),
	/// The compile failed or the plan was invalidated; claim again.
	Retry,
}

struct PlanShared {
	state: PlanState,
	artifact: Option<Arc<Program>>,
	permissions: Vec<Permission>,
	warnings: Vec<Diagnostic>,
	disposition: Disposition,
	version: u64,
	uses_since_check: u64,
	/// Set when an invalidation lands while a compile is in flight; the
	/// install then lands as `Invalid` instead of `Valid`.
	invalidated_while_compiling: bool,
}

impl PlanShared {
	fn snapshot(&self) -> Option<PlanSnapshot> {
		let program = self.artifact.clone()?;
		Some(PlanSnapshot {
			program,
			permissions: self.permissions.clone(),
			warnings: self.warnings.clone(),
			disposition: self.disposition,
			version: self.version,
		})
	}
}

pub struct CompiledPlan {
	identity: StatementIdentity,
	key: PlanKey,
	shared: Mutex<PlanShared>,
	changed: Condvar,
}

impl CompiledPlan {
	pub fn new(identity: StatementIdentity, key: PlanKey) -> Self {
		Self {
			identity,
			key,
			shared: Mutex::new(PlanShared {
				state: PlanState::Uncompiled,
				artifact: None,
				permissions: vec![],
				warnings: vec![],
				disposition: Disposition::Shared,
				version: 0,
				uses_since_check: 0,
				invalidated_while_compiling: false,
			}),
			changed: Condvar::new(),
		}
	}

	pub fn identity(&self) -> &StatementIdentity {
		&self.identity
	}

	pub fn key(&self) -> PlanKey {
		self.key
	}

	pub fn state(&self) -> PlanState {
		self.shared.lock().state
	}

	/// Tries to take the compiling claim.
	pub fn claim(&self) -> Claim {
		let mut shared = self.shared.lock();
		match shared.state {
			PlanState::Uncompiled | PlanState::Invalid => {
				shared.state = PlanState::Compiling;
				shared.invalidated_while_compiling = false;
				Claim::Acquired
			}
			PlanState::Valid => match shared.snapshot() {
				Some(snapshot) => Claim::Ready(snapshot),
				// Valid without an artifact cannot happen; treat it as
				// a plan to recompile.
				None => {
					shared.state = PlanState::Compiling;
					shared.invalidated_while_compiling = false;
					Claim::Acquired
				}
			},
			PlanState::Compiling => Claim::Busy,
		}
	}

	/// Blocks until the in-flight compile resolves. Wakes periodically
	/// to honor cancellation; cancelling a waiter never touches the
	/// entry itself.
	pub fn wait(&self, cancel: &CancelToken) -> crate::Result<WaitOutcome> {
		let mut shared = self.shared.lock();
		loop {
			match shared.state {
				PlanState::Valid => match shared.snapshot() {
					Some(snapshot) => return Ok(WaitOutcome::Ready(snapshot)),
					None => return Ok(WaitOutcome::Retry),
				},
				PlanState::Uncompiled | PlanState::Invalid => return Ok(WaitOutcome::Retry),
				PlanState::Compiling => {
					if cancel.is_cancelled() {
						return Err(error!(compile_cancelled()));
					}
					self.changed.wait_for(&mut shared, WAIT_TICK);
				}
			}
		}
	}

	/// Installs a compile result. Returns `None` when an invalidation
	/// landed during the compile: the entry becomes `Invalid` and the
	/// result is discarded.
	pub fn install(&self, output: PipelineOutput) -> Option<PlanSnapshot> {
		let mut shared = self.shared.lock();
		debug_assert_eq!(shared.state, PlanState::Compiling);

		if shared.invalidated_while_compiling {
			debug!("discarding compile result for {}: invalidated mid-flight", self.key);
			shared.invalidated_while_compiling = false;
			shared.state = PlanState::Invalid;
			shared.artifact = None;
			self.changed.notify_all();
			return None;
		}

		shared.state = PlanState::Valid;
		shared.artifact = Some(output.program);
		shared.permissions = output.permissions;
		shared.warnings = output.warnings;
		shared.disposition = output.disposition;
		shared.version += 1;
		shared.uses_since_check = 0;
		let snapshot = shared.snapshot();
		self.changed.notify_all();
		snapshot
	}

	/// Installs a result that must stay private to the compiling session
	/// (session-local and one-shot plans). The snapshot goes to the
	/// caller only; the entry returns to `Uncompiled` so it is never
	/// observable as valid and the next claimant compiles for itself.
	/// Returns `None` when an invalidation landed during the compile.
	pub fn install_private(&self, output: PipelineOutput) -> Option<PlanSnapshot> {
		let mut shared = self.shared.lock();
		debug_assert_eq!(shared.state, PlanState::Compiling);

		if shared.invalidated_while_compiling {
			debug!("discarding compile result for {}: invalidated mid-flight", self.key);
			shared.invalidated_while_compiling = false;
			shared.state = PlanState::Invalid;
			shared.artifact = None;
			self.changed.notify_all();
			return None;
		}

		shared.state = PlanState::Uncompiled;
		shared.version += 1;
		let snapshot = PlanSnapshot {
			program: output.program,
			permissions: output.permissions,
			warnings: output.warnings,
			disposition: output.disposition,
			version: shared.version,
		};
		self.changed.notify_all();
		Some(snapshot)
	}

	/// Releases the compiling claim after a failed compile. The entry
	/// returns to `Uncompiled` so a waiter can try again.
	pub fn fail(&self) {
		let mut shared = self.shared.lock();
		if shared.state == PlanState::Compiling {
			shared.state = PlanState::Uncompiled;
			shared.invalidated_while_compiling = false;
		}
		self.changed.notify_all();
	}

	/// Applies an invalidation from the dependency layer.
	pub fn invalidate(&self, kind: InvalidationKind) {
		let mut shared = self.shared.lock();
		match shared.state {
			PlanState::Compiling => shared.invalidated_while_compiling = true,
			_ => {
				debug!("plan {} invalidated ({:?})", self.key, kind);
				shared.state = PlanState::Invalid;
				shared.artifact = None;
			}
		}
		self.changed.notify_all();
	}

	/// Whether this hit should re-check the dependency record. Counts
	/// uses; fires every `interval` hits.
	pub fn should_probe_dependencies(&self, interval: u64) -> bool {
		let mut shared = self.shared.lock();
		shared.uses_since_check += 1;
		if shared.uses_since_check >= interval {
			shared.uses_since_check = 0;
			true
		} else {
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::thread;
	use std::time::Duration;

	use stratum_core::interface::{
		CancelToken, Disposition, InvalidationKind, IsolationLevel, PlanKey, StatementIdentity,
	};
	use stratum_sql::generate::{Instruction, Program};
	use stratum_sql::pipeline::PipelineOutput;

	use super::{Claim, CompiledPlan, PlanState, WaitOutcome};

	fn plan() -> Arc<CompiledPlan> {
		let identity = StatementIdentity::new("app", "SELECT 1", "", true, IsolationLevel::ReadCommitted);
		Arc::new(CompiledPlan::new(identity, PlanKey(1)))
	}

	fn output() -> PipelineOutput {
		PipelineOutput {
			program: Arc::new(Program {
				instructions: vec![Instruction::Project {
					columns: vec![],
				}],
			}),
			permissions: vec![],
			dependencies: vec![],
			disposition: Disposition::Shared,
			warnings: vec![],
		}
	}

	#[test]
	fn test_claim_then_install() {
		let plan = plan();
		assert!(matches!(plan.claim(), Claim::Acquired));
		assert!(matches!(plan.claim(), Claim::Busy));

		let snapshot = plan.install(output()).unwrap();
		assert_eq!(snapshot.version, 1);
		assert_eq!(plan.state(), PlanState::Valid);
		assert!(matches!(plan.claim(), Claim::Ready(_)));
	}

	#[test]
	fn test_install_private_never_publishes() {
		let plan = plan();
		assert!(matches!(plan.claim(), Claim::Acquired));

		let snapshot = plan.install_private(output()).unwrap();
		assert_eq!(snapshot.version, 1);
		assert_eq!(plan.state(), PlanState::Uncompiled);

		// The next claimant compiles for itself instead of being served.
		assert!(matches!(plan.claim(), Claim::Acquired));
	}

	#[test]
	fn test_install_private_discards_after_invalidation() {
		let plan = plan();
		assert!(matches!(plan.claim(), Claim::Acquired));
		plan.invalidate(InvalidationKind::Altered);

		assert!(plan.install_private(output()).is_none());
		assert_eq!(plan.state(), PlanState::Invalid);
	}

	#[test]
	fn test_fail_releases_claim() {
		let plan = plan();
		assert!(matches!(plan.claim(), Claim::Acquired));
		plan.fail();
		assert_eq!(plan.state(), PlanState::Uncompiled);
		assert!(matches!(plan.claim(), Claim::Acquired));
	}

	#[test]
	fn test_invalidation_during_compile_discards_result() {
		let plan = plan();
		assert!(matches!(plan.claim(), Claim::Acquired));
		plan.invalidate(InvalidationKind::Altered);

		assert!(plan.install(output()).is_none());
		assert_eq!(plan.state(), PlanState::Invalid);

		// The next claim recompiles in place and bumps the version.
		assert!(matches!(plan.claim(), Claim::Acquired));
		let snapshot = plan.install(output()).unwrap();
		assert_eq!(snapshot.version, 1);
	}

	#[test]
	fn test_invalidate_valid_plan() {
		let plan = plan();
		assert!(matches!(plan.claim(), Claim::Acquired));
		plan.install(output()).unwrap();

		plan.invalidate(InvalidationKind::Altered);
		assert_eq!(plan.state(), PlanState::Invalid);

		assert!(matches!(plan.claim(), Claim::Acquired));
		let snapshot = plan.install(output()).unwrap();
		assert_eq!(snapshot.version, 2);
	}

	#[test]
	fn test_waiter_wakes_on_install() {
		let plan = plan();
		assert!(matches!(plan.claim(), Claim::Acquired));

		let waiter = {
			let plan = plan.clone();
			thread::spawn(move || plan.wait(&CancelToken::new()).unwrap())
		};

		thread::sleep(Duration::from_millis(20));
		plan.install(output()).unwrap();

		match waiter.join().unwrap() {
			WaitOutcome::Ready(snapshot) => assert_eq!(snapshot.version, 1),
			WaitOutcome::Retry => panic!("expected the installed plan"),
		}
	}

	#[test]
	fn test_waiter_wakes_on_failure_and_retries() {
		let plan = plan();
		assert!(matches!(plan.claim(), Claim::Acquired));

		let waiter = {
			let plan = plan.clone();
			thread::spawn(move || plan.wait(&CancelToken::new()).unwrap())
		};

		thread::sleep(Duration::from_millis(20));
		plan.fail();

		assert!(matches!(waiter.join().unwrap(), WaitOutcome::Retry));
	}

	#[test]
	fn test_cancelled_waiter_stops_waiting() {
		let plan = plan();
		assert!(matches!(plan.claim(), Claim::Acquired));

		let cancel = CancelToken::new();
		let waiter = {
			let plan = plan.clone();
			let cancel = cancel.clone();
			thread::spawn(move || plan.wait(&cancel))
		};

		thread::sleep(Duration::from_millis(20));
		cancel.cancel();

		let err = waiter.join().unwrap().unwrap_err();
		assert_eq!(err.code(), stratum_core::diagnostic::engine::COMPILE_CANCELLED);

		// The entry is untouched: the compile still owns the claim.
		assert_eq!(plan.state(), PlanState::Compiling);
		plan.install(output()).unwrap();
	}

	#[test]
	fn test_probe_interval() {
		let plan = plan();
		assert!(plan.should_probe_dependencies(1));
		assert!(plan.should_probe_dependencies(1));

		assert!(!plan.should_probe_dependencies(3));
		assert!(!plan.should_probe_dependencies(3));
		assert!(plan.should_probe_dependencies(3));
		assert!(!plan.should_probe_dependencies(3));
	}
}
