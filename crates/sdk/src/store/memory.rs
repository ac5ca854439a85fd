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

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ListingStore, MessageStore, StoreError, UserStore, validate_new_message};
use crate::types::{Listing, ListingKind, ListingStatus, Message, MessageWithSender, NewMessage, User};

fn lock<'a, T>(mutex: &'a Mutex<T>) -> Result<MutexGuard<'a, T>, StoreError> {
	mutex
		.lock()
		.map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
}

/// In-memory listing store.
///
/// Non-persistent; suitable for tests and single-process deployments where
/// the listing service shares the process.
#[derive(Default)]
pub struct MemoryListingStore {
	rows: Mutex<Vec<Listing>>,
}

impl MemoryListingStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.rows.lock().map(|rows| rows.len()).unwrap_or(0)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[async_trait]
impl ListingStore for MemoryListingStore {
	async fn insert(&self, listing: Listing) -> Result<(), StoreError> {
		if listing.title.trim().is_empty() {
			return Err(StoreError::Invalid("listing title is empty".to_string()));
		}
		let mut rows = lock(&self.rows)?;
		rows.push(listing);
		Ok(())
	}

	async fn find_open_candidates(
		&self,
		kind: ListingKind,
		category: &str,
		since: DateTime<Utc>,
		until: DateTime<Utc>,
	) -> Result<Vec<Listing>, StoreError> {
		let rows = lock(&self.rows)?;
		Ok(rows
			.iter()
			.filter(|l| {
				l.kind == kind
					&& l.status == ListingStatus::Open
					&& l.category == category
					&& l.date >= since
					&& l.date <= until
			})
			.cloned()
			.collect())
	}
}

/// In-memory user store.
#[derive(Default)]
pub struct MemoryUserStore {
	rows: Mutex<HashMap<String, User>>,
}

impl MemoryUserStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl UserStore for MemoryUserStore {
	async fn insert(&self, user: User) -> Result<(), StoreError> {
		let mut rows = lock(&self.rows)?;
		rows.insert(user.id.clone(), user);
		Ok(())
	}

	async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
		let rows = lock(&self.rows)?;
		Ok(rows.get(id).cloned())
	}
}

/// In-memory message store.
///
/// Inbox queries join sender display names through the user store; a sender
/// that can no longer be resolved falls back to its raw ID.
pub struct MemoryMessageStore {
	rows: Mutex<Vec<Message>>,
	users: Arc<dyn UserStore>,
}

impl MemoryMessageStore {
	pub fn new(users: Arc<dyn UserStore>) -> Self {
		Self {
			rows: Mutex::new(Vec::new()),
			users,
		}
	}

	pub fn len(&self) -> usize {
		self.rows.lock().map(|rows| rows.len()).unwrap_or(0)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
	async fn create(&self, new: NewMessage) -> Result<Message, StoreError> {
		validate_new_message(&new)?;
		let message = Message {
			id: Uuid::new_v4().to_string(),
			content: new.content,
			sender_id: new.sender_id,
			receiver_id: new.receiver_id,
			read: false,
			created_at: Utc::now(),
		};
		let mut rows = lock(&self.rows)?;
		rows.push(message.clone());
		Ok(message)
	}

	async fn inbox(&self, receiver_id: &str) -> Result<Vec<MessageWithSender>, StoreError> {
		let mut received: Vec<Message> = {
			let rows = lock(&self.rows)?;
			rows.iter()
				.filter(|m| m.receiver_id == receiver_id)
				.cloned()
				.collect()
		};
		// Newest first.
		received.sort_by(|a, b| b.created_at.cmp(&a.created_at));

		let mut names: HashMap<String, String> = HashMap::new();
		let mut out = Vec::with_capacity(received.len());
		for message in received {
			let sender_name = match names.get(&message.sender_id) {
				Some(name) => name.clone(),
				None => {
					let name = self
						.users
						.find_by_id(&message.sender_id)
						.await?
						.map(|u| u.username)
						.unwrap_or_else(|| message.sender_id.clone());
					names.insert(message.sender_id.clone(), name.clone());
					name
				}
			};
			out.push(MessageWithSender {
				message,
				sender_name,
			});
		}
		Ok(out)
	}

	async fn mark_read(&self, id: &str, receiver_id: &str) -> Result<bool, StoreError> {
		let mut rows = lock(&self.rows)?;
		match rows
			.iter_mut()
			.find(|m| m.id == id && m.receiver_id == receiver_id)
		{
			Some(message) => {
				message.read = true;
				Ok(true)
			}
			None => Ok(false),
		}
	}

	async fn delete(&self, id: &str, receiver_id: &str) -> Result<bool, StoreError> {
		let mut rows = lock(&self.rows)?;
		let before = rows.len();
		rows.retain(|m| !(m.id == id && m.receiver_id == receiver_id));
		Ok(rows.len() != before)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn create_test_user(id: &str, username: &str) -> User {
		User {
			id: id.to_string(),
			username: username.to_string(),
			email: None,
		}
	}

	fn stores() -> (Arc<MemoryUserStore>, MemoryMessageStore) {
		let users = Arc::new(MemoryUserStore::new());
		let messages = MemoryMessageStore::new(users.clone());
		(users, messages)
	}

	#[tokio::test]
	async fn create_assigns_id_and_starts_unread() {
		let (_, messages) = stores();
		let msg = messages
			.create(NewMessage {
				content: "found your wallet".to_string(),
				sender_id: "u1".to_string(),
				receiver_id: "u2".to_string(),
			})
			.await
			.unwrap();
		assert!(!msg.id.is_empty());
		assert!(!msg.read);
	}

	#[tokio::test]
	async fn inbox_is_newest_first_with_sender_names() {
		let (users, messages) = stores();
		users.insert(create_test_user("u1", "alice")).await.unwrap();

		for body in ["first", "second"] {
			messages
				.create(NewMessage {
					content: body.to_string(),
					sender_id: "u1".to_string(),
					receiver_id: "u2".to_string(),
				})
				.await
				.unwrap();
			// Distinct timestamps so the ordering assertion is meaningful.
			tokio::time::sleep(std::time::Duration::from_millis(2)).await;
		}

		let inbox = messages.inbox("u2").await.unwrap();
		assert_eq!(inbox.len(), 2);
		assert_eq!(inbox[0].message.content, "second");
		assert_eq!(inbox[1].message.content, "first");
		assert!(inbox.iter().all(|m| m.sender_name == "alice"));
	}

	#[tokio::test]
	async fn unknown_sender_falls_back_to_id() {
		let (_, messages) = stores();
		messages
			.create(NewMessage {
				content: "hi".to_string(),
				sender_id: "ghost".to_string(),
				receiver_id: "u2".to_string(),
			})
			.await
			.unwrap();
		let inbox = messages.inbox("u2").await.unwrap();
		assert_eq!(inbox[0].sender_name, "ghost");
	}

	#[tokio::test]
	async fn only_receiver_can_mark_read_or_delete() {
		let (_, messages) = stores();
		let msg = messages
			.create(NewMessage {
				content: "hi".to_string(),
				sender_id: "u1".to_string(),
				receiver_id: "u2".to_string(),
			})
			.await
			.unwrap();

		assert!(!messages.mark_read(&msg.id, "u1").await.unwrap());
		assert!(!messages.delete(&msg.id, "u1").await.unwrap());
		assert_eq!(messages.len(), 1);

		assert!(messages.mark_read(&msg.id, "u2").await.unwrap());
		assert!(messages.delete(&msg.id, "u2").await.unwrap());
		assert!(messages.is_empty());
	}

	fn create_test_listing(id: &str, kind: ListingKind, category: &str, days_ago: i64) -> Listing {
		let now = Utc::now();
		Listing {
			id: id.to_string(),
			title: format!("listing {}", id),
			description: String::new(),
			category: category.to_string(),
			location: "library".to_string(),
			coordinates: None,
			date: now - chrono::Duration::days(days_ago),
			kind,
			status: ListingStatus::Open,
			owner_id: "owner".to_string(),
			created_at: now,
		}
	}

	#[tokio::test]
	async fn candidate_query_filters_kind_status_category_and_window() {
		let listings = MemoryListingStore::new();
		listings
			.insert(create_test_listing("in-window", ListingKind::Lost, "wallet", 3))
			.await
			.unwrap();
		listings
			.insert(create_test_listing("out-of-window", ListingKind::Lost, "wallet", 9))
			.await
			.unwrap();
		listings
			.insert(create_test_listing("wrong-kind", ListingKind::Found, "wallet", 3))
			.await
			.unwrap();
		listings
			.insert(create_test_listing("wrong-category", ListingKind::Lost, "keys", 3))
			.await
			.unwrap();
		let mut resolved = create_test_listing("resolved", ListingKind::Lost, "wallet", 3);
		resolved.status = ListingStatus::Resolved;
		listings.insert(resolved).await.unwrap();

		let now = Utc::now();
		let hits = listings
			.find_open_candidates(
				ListingKind::Lost,
				"wallet",
				now - chrono::Duration::days(5),
				now + chrono::Duration::days(5),
			)
			.await
			.unwrap();
		assert_eq!(hits.len(), 1);
		assert_eq!(hits[0].id, "in-window");
	}
}
