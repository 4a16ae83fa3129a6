// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! The materialized schema catalog and the dependency registry that
//! links compiled plans to the schema objects they were built against.

mod def;
mod dependency;
mod materialized;
mod stats;

pub use def::{ColumnDef, ColumnType, NamespaceDef, TableDef};
pub use dependency::DependencyRegistry;
pub use materialized::MaterializedCatalog;
pub use stats::StatisticsStore;
pub use stratum_core::Result;
