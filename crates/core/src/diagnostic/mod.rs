// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Structured diagnostics. Every error in the system carries one of
//! these; the `severity` field tells the orchestration layer how much
//! state to unwind (just the statement, the surrounding transaction, or
//! the whole session).

pub mod catalog;
pub mod compile;
pub mod engine;
pub mod internal;
pub mod transaction;

mod render;

use std::fmt::{Display, Formatter};

pub use render::DefaultRenderer;
use serde::{Deserialize, Serialize};

/// How much transactional state an error unwinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
	/// Aborts the offending statement only.
	Statement,
	/// Aborts the surrounding transaction.
	Transaction,
	/// Terminates the session.
	Session,
}

impl Display for Severity {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Severity::Statement => f.write_str("statement"),
			Severity::Transaction => f.write_str("transaction"),
			Severity::Session => f.write_str("session"),
		}
	}
}

/// A piece of the offending statement text, for error reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
	pub text: String,
	pub offset: u32,
}

impl Fragment {
	pub fn new(text: impl Into<String>, offset: u32) -> Self {
		Self {
			text: text.into(),
			offset,
		}
	}

	pub fn text(&self) -> &str {
		&self.text
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
	pub code: String,
	pub severity: Severity,
	pub message: String,
	pub fragment: Option<Fragment>,
	pub label: Option<String>,
	pub help: Option<String>,
	pub notes: Vec<String>,
}

impl Diagnostic {
	pub fn new(code: &str, severity: Severity, message: impl Into<String>) -> Self {
		Self {
			code: code.to_string(),
			severity,
			message: message.into(),
			fragment: None,
			label: None,
			help: None,
			notes: vec![],
		}
	}

	pub fn with_fragment(mut self, fragment: Fragment) -> Self {
		self.fragment = Some(fragment);
		self
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	pub fn with_help(mut self, help: impl Into<String>) -> Self {
		self.help = Some(help.into());
		self
	}

	pub fn with_note(mut self, note: impl Into<String>) -> Self {
		self.notes.push(note.into());
		self
	}
}

impl Display for Diagnostic {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_fmt(format_args!("{}", self.code))
	}
}

/// Conversion into a [`Diagnostic`]; implemented by crate-local error
/// enums so they can flow through the shared `Error` type.
pub trait IntoDiagnostic {
	fn into_diagnostic(self) -> Diagnostic;
}

impl IntoDiagnostic for Diagnostic {
	fn into_diagnostic(self) -> Diagnostic {
		self
	}
}
