// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Statement AST. Pure data produced by [`parse`], consumed by bind.

mod parse;

use std::fmt::{Display, Formatter};

pub use parse::parse;
use stratum_catalog::ColumnType;

pub use crate::token::Operator as CompareOp;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
	Int(i64),
	Text(String),
	Bool(bool),
}

impl Literal {
	pub fn type_name(&self) -> &'static str {
		match self {
			Literal::Int(_) => "INT",
			Literal::Text(_) => "TEXT",
			Literal::Bool(_) => "BOOL",
		}
	}

	pub fn matches(&self, ty: ColumnType) -> bool {
		matches!(
			(self, ty),
			(Literal::Int(_), ColumnType::Int)
				| (Literal::Text(_), ColumnType::Text)
				| (Literal::Bool(_), ColumnType::Bool)
		)
	}
}

impl Display for Literal {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Literal::Int(value) => f.write_fmt(format_args!("{}", value)),
			Literal::Text(value) => f.write_fmt(format_args!("'{}'", value)),
			Literal::Bool(value) => f.write_fmt(format_args!("{}", value)),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
	All,
	Columns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpr {
	pub column: String,
	pub op: CompareOp,
	pub value: Literal,
	pub offset: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectNode {
	pub projection: Projection,
	pub table: String,
	pub table_offset: u32,
	pub filter: Option<FilterExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertNode {
	pub table: String,
	pub table_offset: u32,
	pub columns: Vec<String>,
	pub values: Vec<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableNode {
	pub table: String,
	pub temporary: bool,
	pub columns: Vec<(String, ColumnType)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTableNode {
	pub table: String,
	pub table_offset: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
	Select(SelectNode),
	Insert(InsertNode),
	CreateTable(CreateTableNode),
	DropTable(DropTableNode),
	Explain(Box<Statement>),
}

impl Statement {
	/// Whether executing the statement reads without writing. EXPLAIN
	/// is read-only regardless of what it wraps.
	pub fn is_read_only(&self) -> bool {
		match self {
			Statement::Select(_) | Statement::Explain(_) => true,
			Statement::Insert(_) | Statement::CreateTable(_) | Statement::DropTable(_) => false,
		}
	}
}
