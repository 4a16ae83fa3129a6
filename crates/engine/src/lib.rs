// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Concurrent statement cache and compiler orchestration.
//!
//! The compiler sits between sessions and the compilation pipeline: it
//! deduplicates concurrent compiles of the same statement, hands out
//! immutable plan snapshots, and keeps cached plans honest against
//! concurrent DDL through the dependency layer.

pub mod cache;
pub mod compiler;
pub mod config;
pub mod plan;
pub mod trace;

pub use cache::StatementCache;
pub use compiler::Compiler;
pub use config::CompilerConfig;
pub use plan::{CompiledPlan, PlanSnapshot, PlanState};
pub use stratum_core::Result;
pub use trace::CompilerMetrics;
