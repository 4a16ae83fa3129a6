// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Cursor-based tokenizer. Comments (`--` to end of line, `/* */`) are
//! skipped here and stripped by [`normalize`], which is what the cache
//! identity uses when comment-insensitive caching is configured.

mod cursor;
mod normalize;

pub use normalize::normalize;
use stratum_core::error;

use crate::error::SqlError;
use cursor::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
	Select,
	From,
	Where,
	Insert,
	Into,
	Values,
	Create,
	Temporary,
	Table,
	Drop,
	Explain,
	True,
	False,
}

impl Keyword {
	fn lookup(word: &str) -> Option<Keyword> {
		let upper = word.to_ascii_uppercase();
		match upper.as_str() {
			"SELECT" => Some(Keyword::Select),
			"FROM" => Some(Keyword::From),
			"WHERE" => Some(Keyword::Where),
			"INSERT" => Some(Keyword::Insert),
			"INTO" => Some(Keyword::Into),
			"VALUES" => Some(Keyword::Values),
			"CREATE" => Some(Keyword::Create),
			"TEMPORARY" | "TEMP" => Some(Keyword::Temporary),
			"TABLE" => Some(Keyword::Table),
			"DROP" => Some(Keyword::Drop),
			"EXPLAIN" => Some(Keyword::Explain),
			"TRUE" => Some(Keyword::True),
			"FALSE" => Some(Keyword::False),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
	Eq,
	NotEq,
	Lt,
	LtEq,
	Gt,
	GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
	Comma,
	LParen,
	RParen,
	Star,
	Semicolon,
	Question,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	Keyword(Keyword),
	Identifier,
	Integer,
	Text,
	Operator(Operator),
	Separator(Separator),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
	pub kind: TokenKind,
	/// For [`TokenKind::Text`] this is the unquoted content.
	pub text: String,
	pub offset: u32,
}

fn is_identifier_start(ch: char) -> bool {
	ch.is_ascii_alphabetic() || ch == '_' || ch == '#'
}

fn is_identifier_part(ch: char) -> bool {
	ch.is_ascii_alphanumeric() || ch == '_'
}

/// Skips whitespace and comments. Returns an error only for an
/// unterminated block comment.
fn skip_trivia(cursor: &mut Cursor) -> crate::Result<()> {
	loop {
		match (cursor.peek(), cursor.peek_second()) {
			(Some(ch), _) if ch.is_whitespace() => {
				cursor.advance();
			}
			(Some('-'), Some('-')) => {
				cursor.advance_while(|ch| ch != '\n');
			}
			(Some('/'), Some('*')) => {
				let start = cursor.offset();
				cursor.advance();
				cursor.advance();
				loop {
					match (cursor.peek(), cursor.peek_second()) {
						(Some('*'), Some('/')) => {
							cursor.advance();
							cursor.advance();
							break;
						}
						(Some(_), _) => {
							cursor.advance();
						}
						(None, _) => {
							return Err(error!(SqlError::UnterminatedComment {
								offset: start,
							}));
						}
					}
				}
			}
			_ => return Ok(()),
		}
	}
}

fn scan_word(cursor: &mut Cursor) -> Token {
	let offset = cursor.offset();
	let word = cursor.advance_while(|ch| is_identifier_part(ch) || ch == '#');
	let kind = match Keyword::lookup(word) {
		Some(keyword) => TokenKind::Keyword(keyword),
		None => TokenKind::Identifier,
	};
	Token {
		kind,
		text: word.to_string(),
		offset,
	}
}

fn scan_number(cursor: &mut Cursor) -> Token {
	let offset = cursor.offset();
	let digits = cursor.advance_while(|ch| ch.is_ascii_digit());
	Token {
		kind: TokenKind::Integer,
		text: digits.to_string(),
		offset,
	}
}

fn scan_text(cursor: &mut Cursor) -> crate::Result<Token> {
	let offset = cursor.offset();
	cursor.advance();
	let mut content = String::new();
	loop {
		match cursor.advance() {
			Some('\'') => {
				return Ok(Token {
					kind: TokenKind::Text,
					text: content,
					offset,
				});
			}
			Some(ch) => content.push(ch),
			None => {
				return Err(error!(SqlError::UnterminatedString {
					offset,
				}));
			}
		}
	}
}

fn scan_operator(cursor: &mut Cursor) -> crate::Result<Token> {
	let offset = cursor.offset();
	let first = cursor.advance().unwrap_or_default();
	let operator = match (first, cursor.peek()) {
		('!', Some('=')) => {
			cursor.advance();
			Operator::NotEq
		}
		('<', Some('=')) => {
			cursor.advance();
			Operator::LtEq
		}
		('>', Some('=')) => {
			cursor.advance();
			Operator::GtEq
		}
		('<', Some('>')) => {
			cursor.advance();
			Operator::NotEq
		}
		('=', _) => Operator::Eq,
		('<', _) => Operator::Lt,
		('>', _) => Operator::Gt,
		_ => {
			return Err(error!(SqlError::UnexpectedCharacter {
				ch: first,
				offset,
			}));
		}
	};
	let text = match operator {
		Operator::Eq => "=",
		Operator::NotEq => "!=",
		Operator::Lt => "<",
		Operator::LtEq => "<=",
		Operator::Gt => ">",
		Operator::GtEq => ">=",
	};
	Ok(Token {
		kind: TokenKind::Operator(operator),
		text: text.to_string(),
		offset,
	})
}

pub fn tokenize(input: &str) -> crate::Result<Vec<Token>> {
	let mut cursor = Cursor::new(input);
	let mut tokens = Vec::new();

	loop {
		skip_trivia(&mut cursor)?;
		if cursor.is_empty() {
			return Ok(tokens);
		}

		let ch = cursor.peek().unwrap_or_default();
		let token = if is_identifier_start(ch) {
			scan_word(&mut cursor)
		} else if ch.is_ascii_digit() {
			scan_number(&mut cursor)
		} else if ch == '\'' {
			scan_text(&mut cursor)?
		} else if matches!(ch, '=' | '!' | '<' | '>') {
			scan_operator(&mut cursor)?
		} else {
			let offset = cursor.offset();
			let separator = match ch {
				',' => Separator::Comma,
				'(' => Separator::LParen,
				')' => Separator::RParen,
				'*' => Separator::Star,
				';' => Separator::Semicolon,
				'?' => Separator::Question,
				other => {
					return Err(error!(SqlError::UnexpectedCharacter {
						ch: other,
						offset,
					}));
				}
			};
			cursor.advance();
			Token {
				kind: TokenKind::Separator(separator),
				text: ch.to_string(),
				offset,
			}
		};
		tokens.push(token);
	}
}

#[cfg(test)]
mod tests {
	use stratum_core::diagnostic::compile::SYNTAX;

	use super::*;

	#[test]
	fn test_tokenize_select() {
		let tokens = tokenize("SELECT id, name FROM users WHERE id = 42").unwrap();
		assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Select));
		assert_eq!(tokens[1].kind, TokenKind::Identifier);
		assert_eq!(tokens[1].text, "id");
		assert_eq!(tokens[2].kind, TokenKind::Separator(Separator::Comma));
		assert_eq!(tokens[7].kind, TokenKind::Identifier);
		assert_eq!(tokens[7].text, "id");
		assert_eq!(tokens[8].kind, TokenKind::Operator(Operator::Eq));
		assert_eq!(tokens[9].kind, TokenKind::Integer);
		assert_eq!(tokens[9].text, "42");
	}

	#[test]
	fn test_tokenize_skips_comments() {
		let tokens = tokenize("SELECT /* projection */ id FROM t -- trailing\n").unwrap();
		let kinds: Vec<_> = tokens.iter().map(|token| token.kind).collect();
		assert_eq!(
			kinds,
			vec![
				TokenKind::Keyword(Keyword::Select),
				TokenKind::Identifier,
				TokenKind::Keyword(Keyword::From),
				TokenKind::Identifier,
			]
		);
	}

	#[test]
	fn test_tokenize_string_keeps_content() {
		let tokens = tokenize("SELECT name FROM t WHERE name = 'a -- not a comment'").unwrap();
		let text = tokens.last().unwrap();
		assert_eq!(text.kind, TokenKind::Text);
		assert_eq!(text.text, "a -- not a comment");
	}

	#[test]
	fn test_unterminated_string() {
		let err = tokenize("SELECT 'oops").unwrap_err();
		assert_eq!(err.code(), SYNTAX);
	}

	#[test]
	fn test_unterminated_block_comment() {
		let err = tokenize("SELECT id /* oops").unwrap_err();
		assert_eq!(err.code(), SYNTAX);
	}

	#[test]
	fn test_not_eq_spellings() {
		let a = tokenize("a != 1").unwrap();
		let b = tokenize("a <> 1").unwrap();
		assert_eq!(a[1].kind, TokenKind::Operator(Operator::NotEq));
		assert_eq!(b[1].kind, TokenKind::Operator(Operator::NotEq));
	}
}
