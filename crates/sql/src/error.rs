// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use stratum_core::diagnostic::{Diagnostic, Fragment, IntoDiagnostic, compile};

#[derive(Debug, thiserror::Error)]
pub enum SqlError {
	#[error("unexpected character '{ch}'")]
	UnexpectedCharacter {
		ch: char,
		offset: u32,
	},

	#[error("unterminated string literal")]
	UnterminatedString {
		offset: u32,
	},

	#[error("unterminated block comment")]
	UnterminatedComment {
		offset: u32,
	},

	#[error("unexpected token '{found}'")]
	UnexpectedToken {
		found: String,
		expected: String,
		offset: u32,
	},

	#[error("unexpected end of statement")]
	UnexpectedEnd {
		expected: String,
	},
}

impl IntoDiagnostic for SqlError {
	fn into_diagnostic(self) -> Diagnostic {
		match self {
			SqlError::UnexpectedCharacter {
				ch,
				offset,
			} => compile::syntax_error(
				format!("unexpected character '{}'", ch),
				Fragment::new(ch.to_string(), offset),
			),
			SqlError::UnterminatedString {
				offset,
			} => compile::syntax_error("unterminated string literal", Fragment::new("'", offset))
				.with_help("string literals are closed with a single quote"),
			SqlError::UnterminatedComment {
				offset,
			} => compile::syntax_error("unterminated block comment", Fragment::new("/*", offset)),
			SqlError::UnexpectedToken {
				found,
				expected,
				offset,
			} => compile::syntax_error(
				format!("unexpected token '{}'", found),
				Fragment::new(found, offset),
			)
			.with_help(format!("expected {}", expected)),
			SqlError::UnexpectedEnd {
				expected,
			} => compile::syntax_error("unexpected end of statement", Fragment::new("", 0))
				.with_help(format!("expected {}", expected)),
		}
	}
}
