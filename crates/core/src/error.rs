// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use std::fmt::{Display, Formatter};

use crate::diagnostic::{DefaultRenderer, Diagnostic, Severity, compile};

#[derive(Debug, Clone, PartialEq)]
pub struct Error(pub Diagnostic);

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let out = DefaultRenderer::render_string(&self.0);
		f.write_str(out.as_str())
	}
}

impl Error {
	pub fn diagnostic(self) -> Diagnostic {
		self.0
	}

	pub fn code(&self) -> &str {
		self.0.code.as_str()
	}

	pub fn severity(&self) -> Severity {
		self.0.severity
	}

	/// Whether this error means a storage object a plan referred to no
	/// longer exists. The orchestration layer treats this class as a
	/// missed invalidation and forces one recompile.
	pub fn is_stale_reference(&self) -> bool {
		self.0.code == compile::STALE_REFERENCE
	}
}

impl std::error::Error for Error {}

/// Wraps a diagnostic (or anything convertible into one) into an [`Error`].
#[macro_export]
macro_rules! error {
	($diagnostic:expr) => {
		$crate::Error($crate::diagnostic::IntoDiagnostic::into_diagnostic($diagnostic))
	};
}

/// Returns `Err(Error)` from the current function.
#[macro_export]
macro_rules! return_error {
	($diagnostic:expr) => {
		return Err($crate::error!($diagnostic))
	};
}
