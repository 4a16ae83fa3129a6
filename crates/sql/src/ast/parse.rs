// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use stratum_core::{diagnostic::compile, error};
use stratum_catalog::ColumnType;

use super::{
	CompareOp, CreateTableNode, DropTableNode, FilterExpr, InsertNode, Literal, Projection, SelectNode, Statement,
};
use crate::{
	error::SqlError,
	token::{Keyword, Separator, Token, TokenKind, tokenize},
};

/// Parses one statement. `params` supplies default values for `?`
/// placeholders, positionally.
pub fn parse(text: &str, params: &[Literal]) -> crate::Result<Statement> {
	let tokens = tokenize(text)?;
	let mut parser = Parser {
		tokens,
		position: 0,
		params,
		params_used: 0,
	};
	let statement = parser.parse_statement()?;
	parser.expect_end()?;
	Ok(statement)
}

struct Parser<'a> {
	tokens: Vec<Token>,
	position: usize,
	params: &'a [Literal],
	params_used: usize,
}

impl Parser<'_> {
	fn peek(&self) -> Option<&Token> {
		self.tokens.get(self.position)
	}

	fn advance(&mut self) -> Option<Token> {
		let token = self.tokens.get(self.position).cloned();
		if token.is_some() {
			self.position += 1;
		}
		token
	}

	fn unexpected<T>(&self, expected: &str) -> crate::Result<T> {
		match self.peek() {
			Some(token) => Err(error!(SqlError::UnexpectedToken {
				found: token.text.clone(),
				expected: expected.to_string(),
				offset: token.offset,
			})),
			None => Err(error!(SqlError::UnexpectedEnd {
				expected: expected.to_string(),
			})),
		}
	}

	fn expect_keyword(&mut self, keyword: Keyword, expected: &str) -> crate::Result<()> {
		match self.peek() {
			Some(token) if token.kind == TokenKind::Keyword(keyword) => {
				self.advance();
				Ok(())
			}
			_ => self.unexpected(expected),
		}
	}

	fn consume_keyword(&mut self, keyword: Keyword) -> bool {
		if let Some(token) = self.peek() {
			if token.kind == TokenKind::Keyword(keyword) {
				self.advance();
				return true;
			}
		}
		false
	}

	fn expect_separator(&mut self, separator: Separator, expected: &str) -> crate::Result<()> {
		match self.peek() {
			Some(token) if token.kind == TokenKind::Separator(separator) => {
				self.advance();
				Ok(())
			}
			_ => self.unexpected(expected),
		}
	}

	fn consume_separator(&mut self, separator: Separator) -> bool {
		if let Some(token) = self.peek() {
			if token.kind == TokenKind::Separator(separator) {
				self.advance();
				return true;
			}
		}
		false
	}

	fn expect_identifier(&mut self, expected: &str) -> crate::Result<(String, u32)> {
		match self.peek() {
			Some(token) if token.kind == TokenKind::Identifier => {
				let token = self.advance().unwrap_or_else(|| unreachable!());
				Ok((token.text, token.offset))
			}
			_ => self.unexpected(expected),
		}
	}

	fn expect_end(&mut self) -> crate::Result<()> {
		self.consume_separator(Separator::Semicolon);
		if self.peek().is_some() {
			return self.unexpected("end of statement");
		}
		if self.params_used < self.params.len() {
			return Err(error!(compile::parameter_count(self.params_used, self.params.len())));
		}
		Ok(())
	}

	fn parse_statement(&mut self) -> crate::Result<Statement> {
		match self.peek().map(|token| token.kind) {
			Some(TokenKind::Keyword(Keyword::Select)) => self.parse_select().map(Statement::Select),
			Some(TokenKind::Keyword(Keyword::Insert)) => self.parse_insert().map(Statement::Insert),
			Some(TokenKind::Keyword(Keyword::Create)) => {
				self.parse_create_table().map(Statement::CreateTable)
			}
			Some(TokenKind::Keyword(Keyword::Drop)) => self.parse_drop_table().map(Statement::DropTable),
			Some(TokenKind::Keyword(Keyword::Explain)) => {
				self.advance();
				let inner = self.parse_statement()?;
				Ok(Statement::Explain(Box::new(inner)))
			}
			_ => self.unexpected("SELECT, INSERT, CREATE, DROP or EXPLAIN"),
		}
	}

	fn parse_select(&mut self) -> crate::Result<SelectNode> {
		self.expect_keyword(Keyword::Select, "SELECT")?;

		let projection = if self.consume_separator(Separator::Star) {
			Projection::All
		} else {
			let mut columns = Vec::new();
			loop {
				let (column, _) = self.expect_identifier("a column name")?;
				columns.push(column);
				if !self.consume_separator(Separator::Comma) {
					break;
				}
			}
			Projection::Columns(columns)
		};

		self.expect_keyword(Keyword::From, "FROM")?;
		let (table, table_offset) = self.expect_identifier("a table name")?;

		let filter = if self.consume_keyword(Keyword::Where) {
			Some(self.parse_filter()?)
		} else {
			None
		};

		Ok(SelectNode {
			projection,
			table,
			table_offset,
			filter,
		})
	}

	fn parse_filter(&mut self) -> crate::Result<FilterExpr> {
		let (column, offset) = self.expect_identifier("a column name")?;
		let op = self.parse_compare_op()?;
		let value = self.parse_literal()?;
		Ok(FilterExpr {
			column,
			op,
			value,
			offset,
		})
	}

	fn parse_compare_op(&mut self) -> crate::Result<CompareOp> {
		match self.peek().map(|token| token.kind) {
			Some(TokenKind::Operator(op)) => {
				self.advance();
				Ok(op)
			}
			_ => self.unexpected("a comparison operator"),
		}
	}

	fn parse_literal(&mut self) -> crate::Result<Literal> {
		let Some(token) = self.peek().cloned() else {
			return self.unexpected("a literal value");
		};
		match token.kind {
			TokenKind::Integer => {
				self.advance();
				let value = token.text.parse::<i64>().map_err(|_| {
					error!(SqlError::UnexpectedToken {
						found: token.text.clone(),
						expected: "an integer literal".to_string(),
						offset: token.offset,
					})
				})?;
				Ok(Literal::Int(value))
			}
			TokenKind::Text => {
				self.advance();
				Ok(Literal::Text(token.text))
			}
			TokenKind::Keyword(Keyword::True) => {
				self.advance();
				Ok(Literal::Bool(true))
			}
			TokenKind::Keyword(Keyword::False) => {
				self.advance();
				Ok(Literal::Bool(false))
			}
			TokenKind::Separator(Separator::Question) => {
				self.advance();
				let index = self.params_used;
				self.params_used += 1;
				match self.params.get(index) {
					Some(value) => Ok(value.clone()),
					None => Err(error!(compile::parameter_count(
						self.params_used,
						self.params.len()
					))),
				}
			}
			_ => self.unexpected("a literal value"),
		}
	}

	fn parse_insert(&mut self) -> crate::Result<InsertNode> {
		self.expect_keyword(Keyword::Insert, "INSERT")?;
		self.expect_keyword(Keyword::Into, "INTO")?;
		let (table, table_offset) = self.expect_identifier("a table name")?;

		self.expect_separator(Separator::LParen, "'('")?;
		let mut columns = Vec::new();
		loop {
			let (column, _) = self.expect_identifier("a column name")?;
			columns.push(column);
			if !self.consume_separator(Separator::Comma) {
				break;
			}
		}
		self.expect_separator(Separator::RParen, "')'")?;

		self.expect_keyword(Keyword::Values, "VALUES")?;
		self.expect_separator(Separator::LParen, "'('")?;
		let mut values = Vec::new();
		loop {
			values.push(self.parse_literal()?);
			if !self.consume_separator(Separator::Comma) {
				break;
			}
		}
		self.expect_separator(Separator::RParen, "')'")?;

		Ok(InsertNode {
			table,
			table_offset,
			columns,
			values,
		})
	}

	fn parse_create_table(&mut self) -> crate::Result<CreateTableNode> {
		self.expect_keyword(Keyword::Create, "CREATE")?;
		let temporary = self.consume_keyword(Keyword::Temporary);
		self.expect_keyword(Keyword::Table, "TABLE")?;
		let (table, _) = self.expect_identifier("a table name")?;

		self.expect_separator(Separator::LParen, "'('")?;
		let mut columns = Vec::new();
		loop {
			let (column, _) = self.expect_identifier("a column name")?;
			let ty = self.parse_column_type()?;
			columns.push((column, ty));
			if !self.consume_separator(Separator::Comma) {
				break;
			}
		}
		self.expect_separator(Separator::RParen, "')'")?;

		Ok(CreateTableNode {
			table,
			temporary,
			columns,
		})
	}

	fn parse_column_type(&mut self) -> crate::Result<ColumnType> {
		let (name, offset) = self.expect_identifier("a column type")?;
		match name.to_ascii_uppercase().as_str() {
			"BOOL" | "BOOLEAN" => Ok(ColumnType::Bool),
			"INT" | "INTEGER" => Ok(ColumnType::Int),
			"TEXT" | "VARCHAR" => Ok(ColumnType::Text),
			_ => Err(error!(SqlError::UnexpectedToken {
				found: name,
				expected: "BOOL, INT or TEXT".to_string(),
				offset,
			})),
		}
	}

	fn parse_drop_table(&mut self) -> crate::Result<DropTableNode> {
		self.expect_keyword(Keyword::Drop, "DROP")?;
		self.expect_keyword(Keyword::Table, "TABLE")?;
		let (table, table_offset) = self.expect_identifier("a table name")?;
		Ok(DropTableNode {
			table,
			table_offset,
		})
	}
}

#[cfg(test)]
mod tests {
	use stratum_core::diagnostic::compile::{PARAMETER_COUNT, SYNTAX};

	use super::*;

	#[test]
	fn test_parse_select_star() {
		let statement = parse("SELECT * FROM users", &[]).unwrap();
		let Statement::Select(select) = statement else {
			panic!("expected select");
		};
		assert_eq!(select.projection, Projection::All);
		assert_eq!(select.table, "users");
		assert!(select.filter.is_none());
	}

	#[test]
	fn test_parse_select_with_filter() {
		let statement = parse("SELECT id, name FROM users WHERE id >= 10;", &[]).unwrap();
		let Statement::Select(select) = statement else {
			panic!("expected select");
		};
		assert_eq!(select.projection, Projection::Columns(vec!["id".into(), "name".into()]));
		let filter = select.filter.unwrap();
		assert_eq!(filter.column, "id");
		assert_eq!(filter.op, CompareOp::GtEq);
		assert_eq!(filter.value, Literal::Int(10));
	}

	#[test]
	fn test_parse_insert() {
		let statement = parse("INSERT INTO users (id, name) VALUES (1, 'ada')", &[]).unwrap();
		let Statement::Insert(insert) = statement else {
			panic!("expected insert");
		};
		assert_eq!(insert.columns, vec!["id".to_string(), "name".to_string()]);
		assert_eq!(insert.values, vec![Literal::Int(1), Literal::Text("ada".into())]);
	}

	#[test]
	fn test_parse_create_temporary_table() {
		let statement = parse("CREATE TEMP TABLE scratch (id INT, note TEXT)", &[]).unwrap();
		let Statement::CreateTable(create) = statement else {
			panic!("expected create table");
		};
		assert!(create.temporary);
		assert_eq!(create.columns.len(), 2);
	}

	#[test]
	fn test_parse_explain() {
		let statement = parse("EXPLAIN SELECT * FROM users", &[]).unwrap();
		assert!(matches!(statement, Statement::Explain(_)));
		assert!(statement.is_read_only());
	}

	#[test]
	fn test_parameter_defaults_substituted() {
		let statement = parse("SELECT * FROM users WHERE id = ?", &[Literal::Int(7)]).unwrap();
		let Statement::Select(select) = statement else {
			panic!("expected select");
		};
		assert_eq!(select.filter.unwrap().value, Literal::Int(7));
	}

	#[test]
	fn test_missing_parameter_default() {
		let err = parse("SELECT * FROM users WHERE id = ?", &[]).unwrap_err();
		assert_eq!(err.code(), PARAMETER_COUNT);
	}

	#[test]
	fn test_excess_parameter_defaults() {
		let err = parse("SELECT * FROM users", &[Literal::Int(1)]).unwrap_err();
		assert_eq!(err.code(), PARAMETER_COUNT);
	}

	#[test]
	fn test_syntax_error_carries_fragment() {
		let err = parse("SELECT FORM users", &[]).unwrap_err();
		assert_eq!(err.code(), SYNTAX);
		let diagnostic = err.diagnostic();
		assert_eq!(diagnostic.fragment.unwrap().text, "users");
	}

	#[test]
	fn test_trailing_garbage_rejected() {
		let err = parse("DROP TABLE users users", &[]).unwrap_err();
		assert_eq!(err.code(), SYNTAX);
	}
}
