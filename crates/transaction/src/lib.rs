// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Single-version lock coordinator. Provides the nested sub-transaction
//! contract the statement compiler uses to bound the lifetime of schema
//! locks taken while compiling: acquire on enter, release on every exit
//! path, independent of the caller's own transaction boundaries.

mod coordinator;
mod lock;
mod nested;

pub use coordinator::StandardCoordinator;
pub use nested::StandardNestedTransaction;
pub use stratum_core::Result;
