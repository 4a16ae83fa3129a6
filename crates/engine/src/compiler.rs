// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Compiler orchestration: the get-or-compile loop in front of the
//! statement cache.
//!
//! Exactly one session compiles a given statement at a time; everyone
//! else blocks on the entry and reuses the result. A cache hit is
//! double-checked against the dependency layer, because dependency
//! removal and cache flagging are not one atomic step. A compile that
//! fails on a stale schema reference is retried once against the
//! current schema before the error reaches the caller.

use std::sync::Arc;

use stratum_core::{
	diagnostic::{compile, engine::compile_cancelled},
	error,
	interface::{DependencyTracker, Disposition, InvalidationKind, SessionContext, StatementIdentity},
};
use stratum_sql::ast::Literal;
use stratum_sql::pipeline::Pipeline;
use stratum_sql::token::normalize;
use tracing::{debug, instrument, warn};

use crate::cache::StatementCache;
use crate::config::CompilerConfig;
use crate::plan::{Claim, CompiledPlan, PlanSnapshot, WaitOutcome};
use crate::trace::CompilerMetrics;

pub struct Compiler {
	cache: Arc<StatementCache>,
	pipeline: Arc<dyn Pipeline>,
	tracker: Arc<dyn DependencyTracker>,
	config: CompilerConfig,
	metrics: CompilerMetrics,
}

impl Compiler {
	pub fn new(pipeline: Arc<dyn Pipeline>, tracker: Arc<dyn DependencyTracker>, config: CompilerConfig) -> Self {
		Self {
			cache: Arc::new(StatementCache::new()),
			pipeline,
			tracker,
			config,
			metrics: CompilerMetrics::default(),
		}
	}

	/// The cache, for wiring into the dependency layer as its
	/// invalidation sink.
	pub fn cache(&self) -> &Arc<StatementCache> {
		&self.cache
	}

	pub fn metrics(&self) -> &CompilerMetrics {
		&self.metrics
	}

	/// The cache identity `text` compiles under for `session`.
	pub fn identity(&self, session: &SessionContext, text: &str) -> StatementIdentity {
		let text = if self.config.ignore_comment_differences {
			normalize(text)
		} else {
			text.to_string()
		};
		StatementIdentity::new(&session.namespace, text, &session.fingerprint, session.read_only, session.isolation)
	}

	/// Returns a valid plan snapshot for `text`, compiling it if the
	/// cache has no valid entry.
	#[instrument(name = "engine::compile", level = "trace", skip_all, fields(session = %session.session))]
	pub fn compile(
		&self,
		session: &SessionContext,
		text: &str,
		params: &[Literal],
	) -> crate::Result<PlanSnapshot> {
		let identity = self.identity(session, text);
		let mut forced_retry_used = false;

		loop {
			if session.cancel.is_cancelled() {
				return Err(error!(compile_cancelled()));
			}

			let plan = self.cache.get_or_insert(&identity);
			match plan.claim() {
				Claim::Ready(snapshot) => {
					if plan.should_probe_dependencies(self.config.stale_plan_check_interval)
						&& !self.tracker.has_live_dependency(plan.key())
					{
						// Valid flag, no dependency record: the entry is
						// orphaned and must not be served. It recompiles in
						// place so its version keeps counting up.
						warn!("recompiling orphaned plan {}", plan.key());
						self.metrics.record_orphan_recompile();
						plan.invalidate(InvalidationKind::Dropped);
						continue;
					}
					self.metrics.record_hit();
					return Ok(snapshot);
				}
				Claim::Busy => {
					self.metrics.record_wait();
					match plan.wait(&session.cancel)? {
						WaitOutcome::Ready(snapshot) => return Ok(snapshot),
						WaitOutcome::Retry => continue,
					}
				}
				Claim::Acquired => match self.run_claimed(&plan, &identity, session, params) {
					Ok(Some(snapshot)) => {
						self.metrics.record_compile();
						self.settle(&identity, snapshot.disposition);
						return Ok(snapshot);
					}
					Ok(None) => {
						// Invalidated while compiling; the result was
						// discarded. Retry once against the new schema.
						self.tracker.drop_dependencies(plan.key());
						self.cache.remove(&identity);
						if forced_retry_used {
							return Err(error!(compile::stale_reference(
								plan.key().0,
								"schema changed during compilation",
							)));
						}
						forced_retry_used = true;
						self.metrics.record_stale_retry();
						debug!("compile of {} invalidated mid-flight, retrying", plan.key());
					}
					Err(err) => {
						plan.fail();
						if err.is_stale_reference() && !forced_retry_used {
							forced_retry_used = true;
							self.metrics.record_stale_retry();
							self.tracker.drop_dependencies(plan.key());
							self.cache.remove(&identity);
							debug!("stale reference while compiling {}, retrying", plan.key());
							continue;
						}
						self.metrics.record_failure();
						return Err(err);
					}
				},
			}
		}
	}

	/// Runs the pipeline under an acquired claim. For shared plans the
	/// dependencies are registered before the install so a plan is never
	/// valid without its record. Session-local and one-shot plans leave
	/// the cache under the claim and are never published as valid, so no
	/// waiter with an equal identity can be served them.
	fn run_claimed(
		&self,
		plan: &Arc<CompiledPlan>,
		identity: &StatementIdentity,
		session: &SessionContext,
		params: &[Literal],
	) -> crate::Result<Option<PlanSnapshot>> {
		let output = self.pipeline.run(identity, session, params)?;
		match output.disposition {
			Disposition::Shared => {
				self.tracker.register_dependencies(plan.key(), &output.dependencies);
				Ok(plan.install(output))
			}
			Disposition::SessionLocal | Disposition::OneShot => {
				self.cache.remove(identity);
				Ok(plan.install_private(output))
			}
		}
	}

	/// Post-install bookkeeping: a new shared entry may push the cache
	/// over capacity.
	fn settle(&self, identity: &StatementIdentity, disposition: Disposition) {
		if disposition == Disposition::Shared {
			for key in self.cache.evict_overflow(self.config.cache_size, identity) {
				self.tracker.drop_dependencies(key);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{
		Arc, OnceLock,
		atomic::{AtomicU64, Ordering},
	};
	use std::thread;
	use std::time::Duration;

	use stratum_catalog::DependencyRegistry;
	use stratum_core::{
		Error,
		diagnostic::{
			compile::{self, STALE_REFERENCE, SYNTAX},
			engine::COMPILE_CANCELLED,
		},
		error,
		interface::{
			Disposition, InvalidationKind, InvalidationSink, ObjectId, PlanKey, SessionContext, SessionId,
			StatementIdentity,
		},
	};
	use stratum_sql::ast::Literal;
	use stratum_sql::generate::{Instruction, Program};
	use stratum_sql::pipeline::{Pipeline, PipelineOutput};

	use super::Compiler;
	use crate::cache::StatementCache;
	use crate::config::CompilerConfig;

	fn output(disposition: Disposition) -> PipelineOutput {
		PipelineOutput {
			program: Arc::new(Program {
				instructions: vec![Instruction::Project {
					columns: vec![],
				}],
			}),
			permissions: vec![],
			dependencies: vec![ObjectId(5)],
			disposition,
			warnings: vec![],
		}
	}

	struct StaticPipeline {
		disposition: Disposition,
		calls: AtomicU64,
	}

	impl StaticPipeline {
		fn shared() -> Self {
			Self {
				disposition: Disposition::Shared,
				calls: AtomicU64::new(0),
			}
		}

		fn with_disposition(disposition: Disposition) -> Self {
			Self {
				disposition,
				calls: AtomicU64::new(0),
			}
		}
	}

	impl Pipeline for StaticPipeline {
		fn run(
			&self,
			_identity: &StatementIdentity,
			_session: &SessionContext,
			_params: &[Literal],
		) -> stratum_core::Result<PipelineOutput> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(output(self.disposition))
		}
	}

	/// Fails with a stale reference for the first `failures` calls, then
	/// succeeds.
	struct FlakyPipeline {
		failures: AtomicU64,
	}

	impl Pipeline for FlakyPipeline {
		fn run(
			&self,
			_identity: &StatementIdentity,
			_session: &SessionContext,
			_params: &[Literal],
		) -> stratum_core::Result<PipelineOutput> {
			if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
				return Err(error!(compile::stale_reference(5, "object vanished")));
			}
			Ok(output(Disposition::Shared))
		}
	}

	struct SyntaxErrorPipeline;

	impl Pipeline for SyntaxErrorPipeline {
		fn run(
			&self,
			_identity: &StatementIdentity,
			_session: &SessionContext,
			_params: &[Literal],
		) -> stratum_core::Result<PipelineOutput> {
			Err(Error(compile::syntax_error(
				"bad statement",
				stratum_core::diagnostic::Fragment::new("?", 0),
			)))
		}
	}

	/// Fires an ALTER invalidation against its own entry mid-compile,
	/// once.
	struct InvalidatingPipeline {
		cache: OnceLock<Arc<StatementCache>>,
		fired: AtomicU64,
	}

	impl Pipeline for InvalidatingPipeline {
		fn run(
			&self,
			_identity: &StatementIdentity,
			_session: &SessionContext,
			_params: &[Literal],
		) -> stratum_core::Result<PipelineOutput> {
			if self.fired.fetch_add(1, Ordering::SeqCst) == 0 {
				// The first entry the cache hands out gets key 1.
				self.cache.get().unwrap().plan_invalidated(PlanKey(1), InvalidationKind::Altered);
			}
			Ok(output(Disposition::Shared))
		}
	}

	fn session() -> SessionContext {
		SessionContext::new(SessionId(1), "app")
	}

	fn compiler(pipeline: Arc<dyn Pipeline>, config: CompilerConfig) -> (Compiler, Arc<DependencyRegistry>) {
		let registry = Arc::new(DependencyRegistry::new());
		let compiler = Compiler::new(pipeline, registry.clone(), config);
		registry.attach_sink(compiler.cache().clone());
		(compiler, registry)
	}

	#[test]
	fn test_compile_then_hit() {
		let pipeline = Arc::new(StaticPipeline::shared());
		let (compiler, _) = compiler(pipeline.clone(), CompilerConfig::default());
		let session = session();

		let first = compiler.compile(&session, "SELECT 1", &[]).unwrap();
		let second = compiler.compile(&session, "SELECT 1", &[]).unwrap();

		assert_eq!(first.version, 1);
		assert_eq!(second.version, 1);
		assert_eq!(pipeline.calls.load(Ordering::SeqCst), 1);
		assert_eq!(compiler.metrics().compiles(), 1);
		assert_eq!(compiler.metrics().hits(), 1);
	}

	#[test]
	fn test_stale_reference_retried_once() {
		let pipeline = Arc::new(FlakyPipeline {
			failures: AtomicU64::new(1),
		});
		let (compiler, _) = compiler(pipeline, CompilerConfig::default());

		compiler.compile(&session(), "SELECT 1", &[]).unwrap();
		assert_eq!(compiler.metrics().stale_retries(), 1);
		assert_eq!(compiler.metrics().compiles(), 1);
		assert_eq!(compiler.metrics().failures(), 0);
	}

	#[test]
	fn test_persistent_stale_reference_surfaces() {
		let pipeline = Arc::new(FlakyPipeline {
			failures: AtomicU64::new(u64::MAX),
		});
		let (compiler, _) = compiler(pipeline, CompilerConfig::default());

		let err = compiler.compile(&session(), "SELECT 1", &[]).unwrap_err();
		assert_eq!(err.code(), STALE_REFERENCE);
		assert_eq!(compiler.metrics().stale_retries(), 1);
		assert_eq!(compiler.metrics().failures(), 1);
	}

	#[test]
	fn test_non_stale_error_not_retried() {
		let (compiler, _) = compiler(Arc::new(SyntaxErrorPipeline), CompilerConfig::default());

		let err = compiler.compile(&session(), "SELECT ?", &[]).unwrap_err();
		assert_eq!(err.code(), SYNTAX);
		assert_eq!(compiler.metrics().stale_retries(), 0);

		// The entry went back to uncompiled, not poisoned.
		let identity = compiler.identity(&session(), "SELECT ?");
		assert!(compiler.cache().get(&identity).is_some());
	}

	#[test]
	fn test_orphaned_record_recompiles() {
		let pipeline = Arc::new(StaticPipeline::shared());
		let (compiler, registry) = compiler(pipeline.clone(), CompilerConfig::default());
		let session = session();

		let first = compiler.compile(&session, "SELECT 1", &[]).unwrap();

		// Simulate the non-atomic invalidation window: the record is
		// gone but the cached flag still says valid.
		let identity = compiler.identity(&session, "SELECT 1");
		let key = compiler.cache().get(&identity).unwrap().key();
		use stratum_core::interface::DependencyTracker;
		registry.drop_dependencies(key);

		let second = compiler.compile(&session, "SELECT 1", &[]).unwrap();
		assert_eq!(compiler.metrics().orphan_recompiles(), 1);
		assert_eq!(pipeline.calls.load(Ordering::SeqCst), 2);

		// The entry recompiled in place: same key, next version.
		assert_eq!(first.version, 1);
		assert_eq!(second.version, 2);
		assert_eq!(compiler.cache().get(&identity).unwrap().key(), key);
		assert!(registry.has_live_dependency(key));
	}

	#[test]
	fn test_one_shot_plan_not_retained() {
		let pipeline = Arc::new(StaticPipeline::with_disposition(Disposition::OneShot));
		let (compiler, registry) = compiler(pipeline, CompilerConfig::default());

		compiler.compile(&session(), "EXPLAIN SELECT 1", &[]).unwrap();
		assert!(compiler.cache().is_empty());
		assert_eq!(registry.record_count(), 0);
	}

	/// Compiles slowly so a second session can be made to wait on the
	/// entry.
	struct SlowLocalPipeline {
		calls: AtomicU64,
	}

	impl Pipeline for SlowLocalPipeline {
		fn run(
			&self,
			_identity: &StatementIdentity,
			_session: &SessionContext,
			_params: &[Literal],
		) -> stratum_core::Result<PipelineOutput> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			thread::sleep(Duration::from_millis(60));
			Ok(output(Disposition::SessionLocal))
		}
	}

	#[test]
	fn test_waiter_never_served_a_session_local_plan() {
		let pipeline = Arc::new(SlowLocalPipeline {
			calls: AtomicU64::new(0),
		});
		let (compiler, registry) = compiler(pipeline.clone(), CompilerConfig::default());
		let compiler = Arc::new(compiler);

		let owner = {
			let compiler = compiler.clone();
			thread::spawn(move || compiler.compile(&session(), "SELECT id FROM scratch", &[]).unwrap())
		};
		thread::sleep(Duration::from_millis(20));
		let waiter = {
			let compiler = compiler.clone();
			thread::spawn(move || compiler.compile(&session(), "SELECT id FROM scratch", &[]).unwrap())
		};

		let first = owner.join().unwrap();
		let second = waiter.join().unwrap();

		// Each session compiled for itself; the owner's result was never
		// observable as a valid shared entry.
		assert_eq!(pipeline.calls.load(Ordering::SeqCst), 2);
		assert_eq!(first.disposition, Disposition::SessionLocal);
		assert_eq!(second.disposition, Disposition::SessionLocal);
		assert!(compiler.cache().is_empty());
		assert_eq!(registry.record_count(), 0);
	}

	#[test]
	fn test_session_local_plan_not_retained() {
		let pipeline = Arc::new(StaticPipeline::with_disposition(Disposition::SessionLocal));
		let (compiler, registry) = compiler(pipeline.clone(), CompilerConfig::default());
		let session = session();

		compiler.compile(&session, "SELECT id FROM scratch", &[]).unwrap();
		assert!(compiler.cache().is_empty());
		assert_eq!(registry.record_count(), 0);

		// The next use compiles again rather than sharing.
		compiler.compile(&session, "SELECT id FROM scratch", &[]).unwrap();
		assert_eq!(pipeline.calls.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn test_capacity_bounds_cache() {
		let pipeline = Arc::new(StaticPipeline::shared());
		let (compiler, registry) = compiler(pipeline, CompilerConfig::default().with_cache_size(2));
		let session = session();

		compiler.compile(&session, "SELECT 1", &[]).unwrap();
		compiler.compile(&session, "SELECT 2", &[]).unwrap();
		compiler.compile(&session, "SELECT 3", &[]).unwrap();

		assert_eq!(compiler.cache().len(), 2);
		assert_eq!(registry.record_count(), 2);
	}

	#[test]
	fn test_cancelled_before_start() {
		let pipeline = Arc::new(StaticPipeline::shared());
		let (compiler, _) = compiler(pipeline.clone(), CompilerConfig::default());

		let session = session();
		session.cancel.cancel();

		let err = compiler.compile(&session, "SELECT 1", &[]).unwrap_err();
		assert_eq!(err.code(), COMPILE_CANCELLED);
		assert_eq!(pipeline.calls.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn test_comment_insensitive_identity() {
		let pipeline = Arc::new(StaticPipeline::shared());
		let (compiler, _) =
			compiler(pipeline.clone(), CompilerConfig::default().with_ignore_comment_differences(true));
		let session = session();

		compiler.compile(&session, "SELECT 1 -- first", &[]).unwrap();
		compiler.compile(&session, "/* second */ SELECT  1", &[]).unwrap();

		assert_eq!(pipeline.calls.load(Ordering::SeqCst), 1);
		assert_eq!(compiler.metrics().hits(), 1);
	}

	#[test]
	fn test_comment_sensitive_by_default() {
		let pipeline = Arc::new(StaticPipeline::shared());
		let (compiler, _) = compiler(pipeline.clone(), CompilerConfig::default());
		let session = session();

		compiler.compile(&session, "SELECT 1 -- first", &[]).unwrap();
		compiler.compile(&session, "SELECT 1 -- second", &[]).unwrap();

		assert_eq!(pipeline.calls.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn test_invalidation_during_compile_forces_retry() {
		let pipeline = Arc::new(InvalidatingPipeline {
			cache: OnceLock::new(),
			fired: AtomicU64::new(0),
		});
		let (compiler, _) = compiler(pipeline.clone(), CompilerConfig::default());
		pipeline.cache.set(compiler.cache().clone()).ok().unwrap();

		let snapshot = compiler.compile(&session(), "SELECT 1", &[]).unwrap();
		assert_eq!(snapshot.version, 1);
		assert_eq!(compiler.metrics().stale_retries(), 1);
		assert_eq!(pipeline.fired.load(Ordering::SeqCst), 2);
	}
}
