// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! The statement compilation pipeline: text is tokenized and parsed to
//! an AST, bound against the catalog inside a nested sub-transaction,
//! optimized, and lowered to an executable program. The pipeline itself
//! knows nothing about caching; the engine crate orchestrates it.

pub mod ast;
pub mod bind;
pub mod error;
pub mod generate;
pub mod optimize;
pub mod pipeline;
pub mod token;

pub use pipeline::{Pipeline, PipelineOutput, StandardPipeline};
pub use stratum_core::Result;
