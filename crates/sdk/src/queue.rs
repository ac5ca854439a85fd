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

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Error types for offline queue operations
#[derive(Debug, Error)]
pub enum QueueError {
	#[error("Failed to enqueue message: {0}")]
	AppendFailed(String),
	#[error("Queue entry already exists: {0}")]
	DuplicateEntry(u64),
	#[error("Queue storage error: {0}")]
	StorageError(String),
}

/// A send captured while the client was offline.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedSend {
	/// Correlation ID minted at send time; doubles as the queue key and
	/// the insertion-order key.
	pub correlation_id: u64,
	/// Receiving user ID
	pub receiver_id: String,
	/// Message body
	pub content: String,
	/// When the send was queued
	pub queued_at: DateTime<Utc>,
}

/// Offline send queue - the replay anchor for the outbox.
///
/// The queue records sends attempted without connectivity so they can be
/// replayed when connectivity returns. Semantic constraints:
/// - Entries keep arrival order; replay walks them oldest first
/// - `remove` is the claim operation: the first caller gets the entry,
///   every later caller gets `None`. Replay-at-most-once hangs off this.
/// - Correlation IDs are unique for the lifetime of the queue
pub trait OfflineQueue: Send + Sync {
	/// Append an entry. Rejects a correlation ID that is already queued.
	fn append(&self, entry: QueuedSend) -> Result<(), QueueError>;

	/// All queued entries in arrival order.
	fn snapshot(&self) -> Result<Vec<QueuedSend>, QueueError>;

	/// Remove and return the entry with this correlation ID. `None` means
	/// the entry was never queued or some other pass already claimed it.
	fn remove(&self, correlation_id: u64) -> Result<Option<QueuedSend>, QueueError>;

	/// Number of queued entries.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// In-memory offline queue.
///
/// Non-persistent equivalent of the browser-side table the original client
/// kept; suitable for tests and embedded use.
#[derive(Default)]
pub struct MemoryOfflineQueue {
	entries: Mutex<Vec<QueuedSend>>,
}

impl MemoryOfflineQueue {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> Result<MutexGuard<'_, Vec<QueuedSend>>, QueueError> {
		self.entries
			.lock()
			.map_err(|_| QueueError::StorageError("queue lock poisoned".to_string()))
	}
}

impl OfflineQueue for MemoryOfflineQueue {
	fn append(&self, entry: QueuedSend) -> Result<(), QueueError> {
		let mut entries = self.lock()?;
		if entries
			.iter()
			.any(|e| e.correlation_id == entry.correlation_id)
		{
			return Err(QueueError::DuplicateEntry(entry.correlation_id));
		}
		entries.push(entry);
		Ok(())
	}

	fn snapshot(&self) -> Result<Vec<QueuedSend>, QueueError> {
		Ok(self.lock()?.clone())
	}

	fn remove(&self, correlation_id: u64) -> Result<Option<QueuedSend>, QueueError> {
		let mut entries = self.lock()?;
		match entries.iter().position(|e| e.correlation_id == correlation_id) {
			Some(idx) => Ok(Some(entries.remove(idx))),
			None => Ok(None),
		}
	}

	fn len(&self) -> usize {
		self.entries.lock().map(|e| e.len()).unwrap_or(0)
	}
}
