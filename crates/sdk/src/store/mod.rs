// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::{
	Listing, ListingKind, MAX_MESSAGE_CHARS, Message, MessageWithSender, NewMessage, User,
};
pub use memory::{MemoryListingStore, MemoryMessageStore, MemoryUserStore};

/// Error types for record store operations
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("Invalid record: {0}")]
	Invalid(String),
	#[error("Record not found: {0}")]
	NotFound(String),
	#[error("Store backend error: {0}")]
	Backend(String),
}

/// Listing records, queried by the correlation engine.
///
/// Backed by whatever the deployment persists listings in; the engine only
/// needs the candidate query below. The in-memory backend doubles as the
/// single-process listing table.
#[async_trait]
pub trait ListingStore: Send + Sync {
	/// Record a listing.
	async fn insert(&self, listing: Listing) -> Result<(), StoreError>;

	/// Open listings of `kind` in exactly `category` whose date falls within
	/// `[since, until]` (inclusive).
	async fn find_open_candidates(
		&self,
		kind: ListingKind,
		category: &str,
		since: DateTime<Utc>,
		until: DateTime<Utc>,
	) -> Result<Vec<Listing>, StoreError>;
}

/// User records, consulted to resolve notification targets.
#[async_trait]
pub trait UserStore: Send + Sync {
	/// Record a user.
	async fn insert(&self, user: User) -> Result<(), StoreError>;

	/// Look up a user by ID. `Ok(None)` means the user does not exist;
	/// `Err` is reserved for backend failures.
	async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;
}

/// Direct-message records.
///
/// Mutation rules: only the receiver of a message may mark it read or delete
/// it. Both operations report whether a matching record existed rather than
/// erroring, so handlers can translate `false` to a 404 and idempotent
/// deletes to a success.
#[async_trait]
pub trait MessageStore: Send + Sync {
	/// Validate and store a message. Assigns the ID and creation timestamp;
	/// messages start unread.
	async fn create(&self, new: NewMessage) -> Result<Message, StoreError>;

	/// The receiver's inbox, newest first, each message joined with the
	/// sender's display name.
	async fn inbox(&self, receiver_id: &str) -> Result<Vec<MessageWithSender>, StoreError>;

	/// Mark a message read. Returns false when no message with this ID is
	/// addressed to `receiver_id`.
	async fn mark_read(&self, id: &str, receiver_id: &str) -> Result<bool, StoreError>;

	/// Delete a message. Same ownership rule as `mark_read`.
	async fn delete(&self, id: &str, receiver_id: &str) -> Result<bool, StoreError>;
}

/// Shared validation for message creation, applied by every backend.
pub fn validate_new_message(new: &NewMessage) -> Result<(), StoreError> {
	if new.content.trim().is_empty() {
		return Err(StoreError::Invalid("message content is empty".to_string()));
	}
	if new.content.chars().count() > MAX_MESSAGE_CHARS {
		return Err(StoreError::Invalid(format!(
			"message content exceeds {} characters",
			MAX_MESSAGE_CHARS
		)));
	}
	if new.receiver_id.is_empty() {
		return Err(StoreError::Invalid("receiver id is empty".to_string()));
	}
	Ok(())
}
