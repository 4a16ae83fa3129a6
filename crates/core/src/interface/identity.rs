// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 StratumDB

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// Concurrency-control contract under which compile-time catalog reads
/// are performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IsolationLevel {
	ReadCommitted,
	RepeatableRead,
	Serializable,
}

impl Default for IsolationLevel {
	fn default() -> Self {
		IsolationLevel::ReadCommitted
	}
}

/// Identifies "the same statement" for cache purposes.
///
/// Two identities are equal iff all fields compare equal. The hash is
/// derived solely from the statement text so that bucketing stays cheap;
/// full equality confirms a bucket hit. The text is expected to already
/// be normalized by the caller when comment-insensitive caching is
/// configured; the identity itself never rewrites it.
#[derive(Debug, Clone, Eq)]
pub struct StatementIdentity {
	namespace: String,
	text: String,
	fingerprint: String,
	read_only: bool,
	isolation: IsolationLevel,
	text_hash: u64,
}

impl StatementIdentity {
	pub fn new(
		namespace: impl Into<String>,
		text: impl Into<String>,
		fingerprint: impl Into<String>,
		read_only: bool,
		isolation: IsolationLevel,
	) -> Self {
		let text = text.into();
		let text_hash = xxh3_64(text.as_bytes());
		Self {
			namespace: namespace.into(),
			text,
			fingerprint: fingerprint.into(),
			read_only,
			isolation,
			text_hash,
		}
	}

	pub fn namespace(&self) -> &str {
		&self.namespace
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn fingerprint(&self) -> &str {
		&self.fingerprint
	}

	pub fn read_only(&self) -> bool {
		self.read_only
	}

	pub fn isolation(&self) -> IsolationLevel {
		self.isolation
	}

	pub fn text_hash(&self) -> u64 {
		self.text_hash
	}
}

impl PartialEq for StatementIdentity {
	fn eq(&self, other: &Self) -> bool {
		self.text_hash == other.text_hash
			&& self.text == other.text
			&& self.namespace == other.namespace
			&& self.fingerprint == other.fingerprint
			&& self.read_only == other.read_only
			&& self.isolation == other.isolation
	}
}

impl Hash for StatementIdentity {
	fn hash<H: Hasher>(&self, state: &mut H) {
		state.write_u64(self.text_hash);
	}
}
