// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use stratum_core::interface::{NamespaceId, ObjectId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
	Bool,
	Int,
	Text,
}

impl Display for ColumnType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			ColumnType::Bool => f.write_str("BOOL"),
			ColumnType::Int => f.write_str("INT"),
			ColumnType::Text => f.write_str("TEXT"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
	pub name: String,
	pub ty: ColumnType,
}

impl ColumnDef {
	pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
		Self {
			name: name.into(),
			ty,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceDef {
	pub id: NamespaceId,
	pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
	pub id: ObjectId,
	pub namespace: NamespaceId,
	pub name: String,
	pub columns: Vec<ColumnDef>,
	/// Set for session-local (temporary) tables; such tables resolve
	/// only for their owning session and make any plan using them
	/// non-shareable.
	pub session: Option<SessionId>,
	/// Bumped on every ALTER.
	pub schema_version: u64,
}

impl TableDef {
	pub fn column(&self, name: &str) -> Option<&ColumnDef> {
		self.columns.iter().find(|column| column.name == name)
	}

	pub fn is_session_local(&self) -> bool {
		self.session.is_some()
	}
}
