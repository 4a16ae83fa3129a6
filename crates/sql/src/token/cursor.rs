// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

/// Character cursor over statement text, tracking the byte offset for
/// diagnostics.
pub(crate) struct Cursor<'a> {
	rest: &'a str,
	offset: usize,
}

impl<'a> Cursor<'a> {
	pub(crate) fn new(input: &'a str) -> Self {
		Self {
			rest: input,
			offset: 0,
		}
	}

	pub(crate) fn offset(&self) -> u32 {
		self.offset as u32
	}

	pub(crate) fn peek(&self) -> Option<char> {
		self.rest.chars().next()
	}

	pub(crate) fn peek_second(&self) -> Option<char> {
		let mut chars = self.rest.chars();
		chars.next();
		chars.next()
	}

	pub(crate) fn advance(&mut self) -> Option<char> {
		let ch = self.rest.chars().next()?;
		let len = ch.len_utf8();
		self.rest = &self.rest[len..];
		self.offset += len;
		Some(ch)
	}

	pub(crate) fn advance_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
		let start = self.rest;
		let mut len = 0;
		while let Some(ch) = self.peek() {
			if !predicate(ch) {
				break;
			}
			len += ch.len_utf8();
			self.advance();
		}
		&start[..len]
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.rest.is_empty()
	}
}
