// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

//! Lowers an optimized statement to a flat instruction program, the
//! immutable artifact the plan cache hands out for execution.

use std::fmt::{Display, Formatter};

use stratum_core::{diagnostic::compile, error, interface::{NamespaceId, ObjectId}};
use stratum_catalog::ColumnDef;
use tracing::instrument;

use crate::ast::{CompareOp, Literal};
use crate::bind::BoundKind;
use crate::optimize::{AccessPath, OptimizedStatement};

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
	ScanTable {
		table: ObjectId,
		expected_rows: u64,
	},
	FilterCompare {
		column: String,
		op: CompareOp,
		value: Literal,
	},
	Project {
		columns: Vec<String>,
	},
	InsertRow {
		table: ObjectId,
		columns: Vec<String>,
		values: Vec<Literal>,
	},
	CreateTable {
		namespace: NamespaceId,
		name: String,
		columns: Vec<ColumnDef>,
		temporary: bool,
	},
	DropTable {
		table: ObjectId,
	},
	/// EXPLAIN output: the rendered form of the plan it wraps.
	Describe {
		rendered: String,
	},
}

impl Display for Instruction {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Instruction::ScanTable {
				table,
				expected_rows,
			} => f.write_fmt(format_args!("scan {} (~{} rows)", table, expected_rows)),
			Instruction::FilterCompare {
				column,
				op,
				value,
			} => f.write_fmt(format_args!("filter {} {:?} {}", column, op, value)),
			Instruction::Project {
				columns,
			} => f.write_fmt(format_args!("project {}", columns.join(", "))),
			Instruction::InsertRow {
				table,
				columns,
				..
			} => f.write_fmt(format_args!("insert into {} ({})", table, columns.join(", "))),
			Instruction::CreateTable {
				name,
				temporary,
				..
			} => {
				if *temporary {
					f.write_fmt(format_args!("create temporary table {}", name))
				} else {
					f.write_fmt(format_args!("create table {}", name))
				}
			}
			Instruction::DropTable {
				table,
			} => f.write_fmt(format_args!("drop table {}", table)),
			Instruction::Describe {
				..
			} => f.write_str("describe plan"),
		}
	}
}

/// The executable artifact. Immutable once built; shared between
/// sessions through the plan cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
	pub instructions: Vec<Instruction>,
}

impl Program {
	pub fn describe(&self) -> String {
		let mut out = String::new();
		for (index, instruction) in self.instructions.iter().enumerate() {
			if index > 0 {
				out.push('\n');
			}
			out.push_str(&format!("{:>2}: {}", index, instruction));
		}
		out
	}
}

#[instrument(name = "sql::generate", level = "trace", skip_all)]
pub fn generate(optimized: &OptimizedStatement) -> crate::Result<Program> {
	let instructions = lower(optimized)?;
	if instructions.is_empty() {
		return Err(error!(compile::generate_failed("statement lowered to an empty instruction stream")));
	}

	if optimized.bound.explain {
		let rendered = Program {
			instructions,
		}
		.describe();
		return Ok(Program {
			instructions: vec![Instruction::Describe {
				rendered,
			}],
		});
	}

	Ok(Program {
		instructions,
	})
}

fn lower(optimized: &OptimizedStatement) -> crate::Result<Vec<Instruction>> {
	let mut instructions = Vec::new();
	match &optimized.bound.kind {
		BoundKind::Select {
			table,
			columns,
			filter,
		} => {
			instructions.push(Instruction::ScanTable {
				table: table.id,
				expected_rows: optimized.expected_rows,
			});
			if let Some(filter) = filter {
				debug_assert_eq!(optimized.access, AccessPath::FilteredScan);
				instructions.push(Instruction::FilterCompare {
					column: filter.column.name.clone(),
					op: filter.op,
					value: filter.value.clone(),
				});
			}
			instructions.push(Instruction::Project {
				columns: columns.iter().map(|column| column.name.clone()).collect(),
			});
		}
		BoundKind::Insert {
			table,
			columns,
			values,
		} => {
			instructions.push(Instruction::InsertRow {
				table: table.id,
				columns: columns.iter().map(|column| column.name.clone()).collect(),
				values: values.clone(),
			});
		}
		BoundKind::CreateTable {
			namespace,
			name,
			columns,
			temporary,
		} => {
			instructions.push(Instruction::CreateTable {
				namespace: *namespace,
				name: name.clone(),
				columns: columns.clone(),
				temporary: *temporary,
			});
		}
		BoundKind::DropTable {
			table,
		} => {
			instructions.push(Instruction::DropTable {
				table: table.id,
			});
		}
	}
	Ok(instructions)
}
