// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Shared foundation for StratumDB: the diagnostic-based error model and
//! the narrow interfaces the statement compiler consumes from the
//! transaction and catalog layers.

pub mod diagnostic;
pub mod error;
pub mod interface;

pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
