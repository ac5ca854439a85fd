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

//! Outgoing-message state machine.
//!
//! Every send is tracked under a client-minted correlation ID from the
//! moment the user hits send, through whichever path delivery takes:
//!
//! ```text
//!             online                offline
//! sending ───────────► sent    ┌────────────► offline ──(drain)──► sent
//!    │                         │
//!    └────► error (manual retry)
//! ```
//!
//! `error` is terminal until `retry`. Queued sends are replayed in arrival
//! order when connectivity returns; the queue entry is claimed before the
//! reconciliation broadcast so a duplicate restore event cannot acknowledge
//! (or send) twice.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::bus::{Reconciliation, ReconcileBus};
use crate::client::SendTransport;
use crate::queue::{OfflineQueue, QueuedSend};
use crate::types::MessageWithSender;

/// Error types for outbox operations
#[derive(Debug, Error)]
pub enum OutboxError {
	#[error("Unknown correlation id: {0}")]
	Unknown(u64),
	#[error("Retry only applies to failed sends: {0}")]
	NotRetryable(u64),
}

/// Delivery state of an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutgoingStatus {
	/// Send in flight
	Sending,
	/// Stored by the server; `real_id` is set
	Sent,
	/// Captured in the offline queue, awaiting replay
	Offline,
	/// Failed; stays put until a manual retry
	Error,
}

/// One tracked outgoing message
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEntry {
	pub correlation_id: u64,
	pub receiver_id: String,
	pub content: String,
	pub status: OutgoingStatus,
	/// Server-assigned message ID, once known
	pub real_id: Option<String>,
	pub queued_at: DateTime<Utc>,
}

/// Mints strictly increasing correlation IDs from the local clock.
///
/// IDs are wall-clock milliseconds; two mints inside the same millisecond
/// bump by one so the ID stays unique while keeping timestamp ordering.
struct CorrelationMinter {
	last: AtomicU64,
}

impl CorrelationMinter {
	fn new() -> Self {
		Self {
			last: AtomicU64::new(0),
		}
	}

	fn mint(&self) -> u64 {
		let now = Utc::now().timestamp_millis().max(0) as u64;
		let mut last = self.last.load(Ordering::Relaxed);
		loop {
			let candidate = now.max(last + 1);
			match self.last.compare_exchange_weak(
				last,
				candidate,
				Ordering::SeqCst,
				Ordering::Relaxed,
			) {
				Ok(_) => return candidate,
				Err(observed) => last = observed,
			}
		}
	}
}

/// Client-side send pipeline with offline capture and reconciliation.
pub struct Outbox {
	transport: Arc<dyn SendTransport>,
	queue: Arc<dyn OfflineQueue>,
	bus: ReconcileBus,
	views: Mutex<HashMap<u64, OutgoingEntry>>,
	online: AtomicBool,
	drain_lock: tokio::sync::Mutex<()>,
	minter: CorrelationMinter,
}

impl Outbox {
	/// Create an outbox that starts online.
	pub fn new(
		transport: Arc<dyn SendTransport>,
		queue: Arc<dyn OfflineQueue>,
		bus: ReconcileBus,
	) -> Self {
		Self {
			transport,
			queue,
			bus,
			views: Mutex::new(HashMap::new()),
			online: AtomicBool::new(true),
			drain_lock: tokio::sync::Mutex::new(()),
			minter: CorrelationMinter::new(),
		}
	}

	/// The reconciliation bus views subscribe to.
	pub fn bus(&self) -> &ReconcileBus {
		&self.bus
	}

	pub fn is_online(&self) -> bool {
		self.online.load(Ordering::Acquire)
	}

	fn views(&self) -> MutexGuard<'_, HashMap<u64, OutgoingEntry>> {
		match self.views.lock() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		}
	}

	fn set_status(&self, correlation_id: u64, status: OutgoingStatus) {
		if let Some(entry) = self.views().get_mut(&correlation_id) {
			entry.status = status;
		}
	}

	/// Settle an entry to `sent` under its server identity. Does not
	/// broadcast; callers decide whether a reconciliation announcement
	/// is due.
	fn settle_sent(&self, correlation_id: u64, real_id: &str) {
		let mut views = self.views();
		let Some(entry) = views.get_mut(&correlation_id) else {
			debug!(
				target: "client::outbox",
				correlation_id,
				"reconciliation for untracked send ignored"
			);
			return;
		};
		match &entry.real_id {
			None => {
				entry.real_id = Some(real_id.to_string());
				entry.status = OutgoingStatus::Sent;
			}
			Some(existing) if existing == real_id => {
				entry.status = OutgoingStatus::Sent;
			}
			Some(existing) => {
				// First identity wins.
				warn!(
					target: "client::outbox",
					correlation_id,
					existing = %existing,
					conflicting = %real_id,
					"conflicting reconciliation identity ignored"
				);
			}
		}
	}

	/// Track and attempt a send. Returns the correlation ID immediately;
	/// the final state is visible through `entry()` / the reconcile bus.
	pub async fn send(&self, receiver_id: &str, content: &str) -> u64 {
		let correlation_id = self.minter.mint();
		let entry = OutgoingEntry {
			correlation_id,
			receiver_id: receiver_id.to_string(),
			content: content.to_string(),
			status: OutgoingStatus::Sending,
			real_id: None,
			queued_at: Utc::now(),
		};
		self.views().insert(correlation_id, entry);

		if self.is_online() {
			self.transmit(correlation_id, receiver_id, content).await;
		} else {
			self.capture_offline(correlation_id, receiver_id, content);
		}
		correlation_id
	}

	/// Retry a failed send under its original correlation ID.
	pub async fn retry(&self, correlation_id: u64) -> Result<(), OutboxError> {
		let (receiver_id, content) = {
			let views = self.views();
			let entry = views
				.get(&correlation_id)
				.ok_or(OutboxError::Unknown(correlation_id))?;
			if entry.status != OutgoingStatus::Error {
				return Err(OutboxError::NotRetryable(correlation_id));
			}
			(entry.receiver_id.clone(), entry.content.clone())
		};

		self.set_status(correlation_id, OutgoingStatus::Sending);
		if self.is_online() {
			self.transmit(correlation_id, &receiver_id, &content).await;
		} else {
			self.capture_offline(correlation_id, &receiver_id, &content);
		}
		Ok(())
	}

	async fn transmit(&self, correlation_id: u64, receiver_id: &str, content: &str) {
		match self.transport.send(receiver_id, content).await {
			Ok(message) => {
				self.settle_sent(correlation_id, &message.id);
			}
			Err(e) => {
				warn!(
					target: "client::outbox",
					correlation_id,
					error = %e,
					"send failed"
				);
				self.set_status(correlation_id, OutgoingStatus::Error);
			}
		}
	}

	fn capture_offline(&self, correlation_id: u64, receiver_id: &str, content: &str) {
		let queued = QueuedSend {
			correlation_id,
			receiver_id: receiver_id.to_string(),
			content: content.to_string(),
			queued_at: Utc::now(),
		};
		match self.queue.append(queued) {
			Ok(()) => self.set_status(correlation_id, OutgoingStatus::Offline),
			Err(e) => {
				warn!(
					target: "client::outbox",
					correlation_id,
					error = %e,
					"offline capture failed"
				);
				self.set_status(correlation_id, OutgoingStatus::Error);
			}
		}
	}

	/// Record a connectivity change. Every restore signal triggers a drain;
	/// drains serialize among themselves and a repeat finds nothing left.
	pub async fn set_online(&self, online: bool) {
		self.online.store(online, Ordering::Release);
		if online {
			self.drain().await;
		}
	}

	/// Replay queued sends in arrival order.
	///
	/// Each entry is claimed out of the queue before its reconciliation is
	/// broadcast, so a concurrent or repeated drain can neither re-send nor
	/// re-acknowledge it. Entries whose send fails stay queued for the next
	/// drain.
	pub async fn drain(&self) {
		let _guard = self.drain_lock.lock().await;

		let snapshot = match self.queue.snapshot() {
			Ok(entries) => entries,
			Err(e) => {
				warn!(target: "client::outbox", error = %e, "offline queue unreadable, drain skipped");
				return;
			}
		};
		if snapshot.is_empty() {
			return;
		}
		debug!(target: "client::outbox", queued = snapshot.len(), "draining offline queue");

		for queued in snapshot {
			match self
				.transport
				.send(&queued.receiver_id, &queued.content)
				.await
			{
				Ok(message) => match self.queue.remove(queued.correlation_id) {
					Ok(Some(_)) => {
						self.settle_sent(queued.correlation_id, &message.id);
						self.bus.publish(Reconciliation {
							correlation_id: queued.correlation_id,
							real_id: message.id,
						});
					}
					Ok(None) => {
						debug!(
							target: "client::outbox",
							correlation_id = queued.correlation_id,
							"queue entry already claimed, skipping acknowledgement"
						);
					}
					Err(e) => {
						warn!(
							target: "client::outbox",
							correlation_id = queued.correlation_id,
							error = %e,
							"queue claim failed after replay"
						);
					}
				},
				Err(e) => {
					warn!(
						target: "client::outbox",
						correlation_id = queued.correlation_id,
						error = %e,
						"replay failed, entry stays queued"
					);
				}
			}
		}
	}

	/// Apply a reconciliation that arrived from outside the drain path
	/// (for example over the live channel). Idempotent per correlation ID.
	pub fn apply_reconciliation(&self, correlation_id: u64, real_id: &str) {
		self.settle_sent(correlation_id, real_id);
	}

	/// Snapshot of one tracked send.
	pub fn entry(&self, correlation_id: u64) -> Option<OutgoingEntry> {
		self.views().get(&correlation_id).cloned()
	}

	/// Snapshot of all tracked sends in mint order.
	pub fn entries(&self) -> Vec<OutgoingEntry> {
		let mut entries: Vec<OutgoingEntry> = self.views().values().cloned().collect();
		entries.sort_by_key(|e| e.correlation_id);
		entries
	}
}

/// One rendered message in a conversation view.
#[derive(Debug, Clone)]
pub struct ViewItem {
	/// Set for messages this client sent
	pub correlation_id: Option<u64>,
	/// Set once the server identity is known
	pub real_id: Option<String>,
	pub content: String,
	pub sender_name: Option<String>,
}

/// Ordered conversation view that absorbs duplicate deliveries.
///
/// A message enters the list once per identity: an optimistic entry is
/// settled in place when its server ID arrives, and a live-channel delivery
/// whose ID is already present is dropped rather than re-appended.
#[derive(Default)]
pub struct SessionView {
	items: Mutex<Vec<ViewItem>>,
}

impl SessionView {
	pub fn new() -> Self {
		Self::default()
	}

	fn items(&self) -> MutexGuard<'_, Vec<ViewItem>> {
		match self.items.lock() {
			Ok(guard) => guard,
			Err(poisoned) => poisoned.into_inner(),
		}
	}

	/// Show a just-sent message before the server has confirmed it.
	pub fn push_optimistic(&self, correlation_id: u64, content: &str) {
		self.items().push(ViewItem {
			correlation_id: Some(correlation_id),
			real_id: None,
			content: content.to_string(),
			sender_name: None,
		});
	}

	/// Attach the server identity to an optimistic entry. Repeats and
	/// conflicts leave the first identity in place.
	pub fn confirm(&self, correlation_id: u64, real_id: &str) {
		let mut items = self.items();
		if let Some(item) = items
			.iter_mut()
			.find(|i| i.correlation_id == Some(correlation_id))
		{
			if item.real_id.is_none() {
				item.real_id = Some(real_id.to_string());
			}
		}
	}

	/// Append a delivered message unless its identity is already shown.
	/// Returns whether the view changed.
	pub fn push_delivered(&self, message: &MessageWithSender) -> bool {
		let mut items = self.items();
		if items
			.iter()
			.any(|i| i.real_id.as_deref() == Some(message.message.id.as_str()))
		{
			return false;
		}
		items.push(ViewItem {
			correlation_id: None,
			real_id: Some(message.message.id.clone()),
			content: message.message.content.clone(),
			sender_name: Some(message.sender_name.clone()),
		});
		true
	}

	pub fn len(&self) -> usize {
		self.items().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn snapshot(&self) -> Vec<ViewItem> {
		self.items().clone()
	}
}
