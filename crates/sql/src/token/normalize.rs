// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

/// Strips comments and collapses whitespace so that comment-only
/// differences between two statements produce the same text.
///
/// String literals are copied verbatim, comment markers inside them
/// included. Best effort: unterminated constructs are left for the
/// tokenizer to report, normalization just stops rewriting.
pub fn normalize(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	let mut chars = input.chars().peekable();
	let mut pending_space = false;

	while let Some(ch) = chars.next() {
		if ch.is_whitespace() {
			pending_space = !out.is_empty();
			continue;
		}

		if ch == '-' && chars.peek() == Some(&'-') {
			for skipped in chars.by_ref() {
				if skipped == '\n' {
					break;
				}
			}
			pending_space = !out.is_empty();
			continue;
		}

		if ch == '/' && chars.peek() == Some(&'*') {
			chars.next();
			let mut previous = '\0';
			for skipped in chars.by_ref() {
				if previous == '*' && skipped == '/' {
					break;
				}
				previous = skipped;
			}
			pending_space = !out.is_empty();
			continue;
		}

		if pending_space {
			out.push(' ');
			pending_space = false;
		}

		if ch == '\'' {
			out.push(ch);
			for inner in chars.by_ref() {
				out.push(inner);
				if inner == '\'' {
					break;
				}
			}
			continue;
		}

		out.push(ch);
	}

	out
}
