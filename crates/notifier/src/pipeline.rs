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

//! Pipeline facade.
//!
//! The two hooks the controller layer calls after its own writes commit:
//! `on_listing_created` runs correlation plus dispatch, and
//! `on_message_sent` fans a freshly stored message out to the receiver's
//! live connections. Neither can fail the caller.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use reclaim_matching::CorrelationEngine;
use reclaim_sdk::types::{Listing, MessageWithSender, ServerEvent};

use crate::dispatcher::Dispatcher;
use crate::push::RealtimePush;

/// Correlation-and-notification pipeline behind the listing and message
/// controllers.
pub struct Pipeline {
	engine: CorrelationEngine,
	dispatcher: Dispatcher,
	push: Arc<dyn RealtimePush>,
}

impl Pipeline {
	pub fn new(engine: CorrelationEngine, dispatcher: Dispatcher, push: Arc<dyn RealtimePush>) -> Self {
		Self {
			engine,
			dispatcher,
			push,
		}
	}

	/// Correlate a just-committed listing and notify matched owners.
	///
	/// Runs after the listing write; nothing here propagates back to the
	/// creation flow. An engine failure ends the run with a log line.
	pub async fn on_listing_created(&self, listing: &Listing, actor_id: &str) {
		let matches = match self.engine.find_matches(listing).await {
			Ok(matches) => matches,
			Err(e) => {
				warn!(
					target: "notifier::pipeline",
					listing_id = %listing.id,
					error = %e,
					"correlation scan failed, notifications skipped"
				);
				return;
			}
		};
		if matches.is_empty() {
			debug!(
				target: "notifier::pipeline",
				listing_id = %listing.id,
				"no counterpart matches"
			);
			return;
		}
		self.dispatcher.dispatch(listing, actor_id, &matches).await;
	}

	/// Fan a just-stored message out to the receiver's live connections.
	/// Returns how many connections were reached; zero is a normal result
	/// for an offline receiver.
	pub fn on_message_sent(&self, message: &MessageWithSender) -> usize {
		let receiver_id = message.message.receiver_id.clone();
		self.push
			.publish(&receiver_id, ServerEvent::NewMessage(message.clone()))
	}
}

/// One queued correlation job.
struct DispatchJob {
	listing: Listing,
	actor_id: String,
}

/// Bounded hand-off between request handlers and the dispatch worker.
///
/// The ingest handler answers as soon as the job is queued; the worker
/// runs correlation and dispatch off the request path. A full queue drops
/// the job with a warning rather than blocking or failing the caller.
pub struct DispatchQueue {
	tx: mpsc::Sender<DispatchJob>,
	worker: JoinHandle<()>,
}

impl DispatchQueue {
	/// Spawn the worker task draining jobs into `pipeline`.
	pub fn start(pipeline: Arc<Pipeline>, capacity: usize) -> Self {
		let (tx, mut rx) = mpsc::channel::<DispatchJob>(capacity);
		let worker = tokio::spawn(async move {
			info!(target: "notifier::pipeline", "dispatch worker started");
			while let Some(job) = rx.recv().await {
				pipeline
					.on_listing_created(&job.listing, &job.actor_id)
					.await;
			}
			info!(target: "notifier::pipeline", "dispatch worker stopped");
		});
		Self { tx, worker }
	}

	/// Queue a listing for correlation and dispatch. Never blocks.
	pub fn enqueue_listing_created(&self, listing: Listing, actor_id: String) {
		let listing_id = listing.id.clone();
		match self.tx.try_send(DispatchJob { listing, actor_id }) {
			Ok(()) => {}
			Err(mpsc::error::TrySendError::Full(_)) => {
				warn!(
					target: "notifier::pipeline",
					listing_id = %listing_id,
					"dispatch queue full, job dropped"
				);
			}
			Err(mpsc::error::TrySendError::Closed(_)) => {
				warn!(
					target: "notifier::pipeline",
					listing_id = %listing_id,
					"dispatch worker gone, job dropped"
				);
			}
		}
	}

	/// Stop accepting jobs and wait for the worker to finish the backlog.
	pub async fn shutdown(self) {
		drop(self.tx);
		let _ = self.worker.await;
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;
	use std::time::Duration;

	use async_trait::async_trait;
	use chrono::Utc;

	use reclaim_sdk::store::{
		ListingStore, MemoryListingStore, MemoryMessageStore, MemoryUserStore, UserStore,
	};
	use reclaim_sdk::types::{ListingKind, ListingStatus, Message, User};
	use reclaim_matching::MatchingConfig;

	use super::*;
	use crate::cooldown::MemoryCooldownStore;
	use crate::email::{EmailError, EmailTransport};
	use crate::events::OutcomeBuffer;

	struct NoEmail;

	#[async_trait]
	impl EmailTransport for NoEmail {
		async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), EmailError> {
			Err(EmailError::Disabled)
		}
	}

	struct RecordingPush {
		published: Mutex<Vec<String>>,
	}

	impl RecordingPush {
		fn new() -> Self {
			Self {
				published: Mutex::new(Vec::new()),
			}
		}
	}

	impl RealtimePush for RecordingPush {
		fn publish(&self, user_id: &str, _event: ServerEvent) -> usize {
			self.published.lock().unwrap().push(user_id.to_string());
			1
		}
	}

	fn create_test_listing(id: &str, kind: ListingKind, owner_id: &str, title: &str) -> Listing {
		Listing {
			id: id.to_string(),
			title: title.to_string(),
			description: String::new(),
			category: "daily-items".to_string(),
			location: "library".to_string(),
			coordinates: None,
			date: Utc::now(),
			kind,
			status: ListingStatus::Open,
			owner_id: owner_id.to_string(),
			created_at: Utc::now(),
		}
	}

	async fn pipeline_with_push(push: Arc<RecordingPush>) -> (Arc<Pipeline>, Arc<MemoryMessageStore>) {
		let listings = Arc::new(MemoryListingStore::new());
		let users = Arc::new(MemoryUserStore::new());
		let messages = Arc::new(MemoryMessageStore::new(users.clone()));

		users
			.insert(User {
				id: "bob".to_string(),
				username: "bob".to_string(),
				email: None,
			})
			.await
			.unwrap();
		listings
			.insert(create_test_listing(
				"lost-1",
				ListingKind::Lost,
				"bob",
				"lost wallet near library",
			))
			.await
			.unwrap();

		let engine = CorrelationEngine::new(listings, users.clone(), MatchingConfig::default());
		let (producer, _consumer) = OutcomeBuffer::new(64).split();
		let dispatcher = Dispatcher::new(
			messages.clone(),
			users,
			Arc::new(MemoryCooldownStore::default()),
			Arc::new(NoEmail),
			push.clone(),
			producer,
			Duration::from_secs(3600),
		);
		(
			Arc::new(Pipeline::new(engine, dispatcher, push)),
			messages,
		)
	}

	#[tokio::test]
	async fn listing_created_notifies_matched_owner() {
		let push = Arc::new(RecordingPush::new());
		let (pipeline, messages) = pipeline_with_push(push.clone()).await;

		let found = create_test_listing("found-1", ListingKind::Found, "alice", "black wallet found");
		pipeline.on_listing_created(&found, "alice").await;

		assert_eq!(messages.len(), 1);
		assert_eq!(push.published.lock().unwrap().as_slice(), ["bob"]);
	}

	#[tokio::test]
	async fn message_sent_publishes_to_receiver() {
		let push = Arc::new(RecordingPush::new());
		let (pipeline, _messages) = pipeline_with_push(push.clone()).await;

		let reached = pipeline.on_message_sent(&MessageWithSender {
			message: Message {
				id: "m1".to_string(),
				content: "hi".to_string(),
				sender_id: "alice".to_string(),
				receiver_id: "bob".to_string(),
				read: false,
				created_at: Utc::now(),
			},
			sender_name: "alice".to_string(),
		});
		assert_eq!(reached, 1);
		assert_eq!(push.published.lock().unwrap().as_slice(), ["bob"]);
	}

	#[tokio::test]
	async fn queued_jobs_run_off_the_request_path() {
		let push = Arc::new(RecordingPush::new());
		let (pipeline, messages) = pipeline_with_push(push).await;
		let queue = DispatchQueue::start(pipeline, 8);

		let found = create_test_listing("found-1", ListingKind::Found, "alice", "black wallet found");
		queue.enqueue_listing_created(found, "alice".to_string());
		queue.shutdown().await;

		assert_eq!(messages.len(), 1);
	}
}
