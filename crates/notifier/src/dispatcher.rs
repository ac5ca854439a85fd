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

//! Notification dispatcher.
//!
//! For every match the correlation engine produced, the dispatcher runs
//! two independent channels: an in-app inbox message (stored and pushed
//! live) and an email. Each channel is gated by its own cooldown window
//! per matched owner. A channel failing, being suppressed, or being
//! skipped never touches the other channel, other matches, or the caller;
//! outcomes go to the log and the outcome buffer.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use reclaim_matching::MatchCandidate;
use reclaim_sdk::store::{MessageStore, UserStore};
use reclaim_sdk::types::{Listing, ListingKind, MessageWithSender, NewMessage, ServerEvent};

use crate::cooldown::CooldownStore;
use crate::email::{EmailError, EmailTransport};
use crate::events::{DispatchEvent, OutcomeProducer};
use crate::push::RealtimePush;

/// Cooldown channel name for in-app inbox notifications.
pub const CHANNEL_INBOX: &str = "inbox";
/// Cooldown channel name for email notifications.
pub const CHANNEL_EMAIL: &str = "email";

/// Inbox message body for a match.
pub fn inbox_body(listing: &Listing) -> String {
	match listing.kind {
		ListingKind::Found => format!(
			"Someone found an item that may match one you reported lost: \"{}\". \
			 Open the board to check the details and reply if it is yours.",
			listing.title
		),
		ListingKind::Lost => format!(
			"Someone is looking for an item that may match one you reported found: \"{}\". \
			 Open the board to check the details and reply if you have it.",
			listing.title
		),
	}
}

/// Email subject line for a match.
pub fn email_subject(listing: &Listing) -> String {
	match listing.kind {
		ListingKind::Found => format!("A found item may match your lost listing: {}", listing.title),
		ListingKind::Lost => format!("A lost item may match your found listing: {}", listing.title),
	}
}

/// Email body for a match.
pub fn email_body(listing: &Listing) -> String {
	format!(
		"{}\n\nReported near: {}\n\nThis is an automated match notification from the campus \
		 lost-and-found board.",
		inbox_body(listing),
		listing.location
	)
}

/// Per-match dual-channel notification dispatch.
pub struct Dispatcher {
	messages: Arc<dyn MessageStore>,
	users: Arc<dyn UserStore>,
	cooldown: Arc<dyn CooldownStore>,
	email: Arc<dyn EmailTransport>,
	push: Arc<dyn RealtimePush>,
	outcomes: OutcomeProducer,
	cooldown_ttl: Duration,
}

impl Dispatcher {
	pub fn new(
		messages: Arc<dyn MessageStore>,
		users: Arc<dyn UserStore>,
		cooldown: Arc<dyn CooldownStore>,
		email: Arc<dyn EmailTransport>,
		push: Arc<dyn RealtimePush>,
		outcomes: OutcomeProducer,
		cooldown_ttl: Duration,
	) -> Self {
		Self {
			messages,
			users,
			cooldown,
			email,
			push,
			outcomes,
			cooldown_ttl,
		}
	}

	/// Notify every matched owner about `listing`.
	///
	/// Infallible by contract: the listing creation that triggered the
	/// dispatch has already committed, so everything that goes wrong here
	/// is logged and recorded, never returned.
	pub async fn dispatch(&self, listing: &Listing, actor_id: &str, matches: &[MatchCandidate]) {
		if matches.is_empty() {
			return;
		}

		// Sender display name for the pushed copy; the stored message only
		// carries the actor's ID.
		let actor_name = match self.users.find_by_id(actor_id).await {
			Ok(Some(actor)) => actor.username,
			Ok(None) | Err(_) => actor_id.to_string(),
		};

		debug!(
			target: "notifier::dispatcher",
			listing_id = %listing.id,
			actor_id,
			matches = matches.len(),
			"dispatching match notifications"
		);

		for candidate in matches {
			self.notify_inbox(listing, actor_id, &actor_name, candidate)
				.await;
			self.notify_email(listing, candidate).await;
		}
	}

	async fn notify_inbox(
		&self,
		listing: &Listing,
		actor_id: &str,
		actor_name: &str,
		candidate: &MatchCandidate,
	) {
		let owner_id = candidate.owner.id.clone();
		match self
			.cooldown
			.should_notify(&owner_id, CHANNEL_INBOX, self.cooldown_ttl)
			.await
		{
			Ok(true) => {}
			Ok(false) => {
				debug!(
					target: "notifier::dispatcher",
					owner_id = %owner_id,
					listing_id = %listing.id,
					"inbox notification suppressed by cooldown"
				);
				self.outcomes.record(DispatchEvent::InboxSuppressed {
					subject_id: owner_id,
					listing_id: listing.id.clone(),
				});
				return;
			}
			Err(e) => {
				warn!(
					target: "notifier::dispatcher",
					owner_id = %owner_id,
					listing_id = %listing.id,
					error = %e,
					"inbox cooldown check failed"
				);
				self.outcomes.record(DispatchEvent::InboxFailed {
					subject_id: owner_id,
					listing_id: listing.id.clone(),
					error: e.to_string(),
				});
				return;
			}
		}

		let new = NewMessage {
			content: inbox_body(listing),
			sender_id: actor_id.to_string(),
			receiver_id: owner_id.clone(),
		};
		match self.messages.create(new).await {
			Ok(message) => {
				let message_id = message.id.clone();
				let reached = self.push.publish(
					&owner_id,
					ServerEvent::NewMessage(MessageWithSender {
						message,
						sender_name: actor_name.to_string(),
					}),
				);
				debug!(
					target: "notifier::dispatcher",
					owner_id = %owner_id,
					listing_id = %listing.id,
					message_id = %message_id,
					connections = reached,
					"inbox notification stored"
				);
				self.outcomes.record(DispatchEvent::InboxSent {
					subject_id: owner_id,
					listing_id: listing.id.clone(),
					message_id,
				});
			}
			Err(e) => {
				warn!(
					target: "notifier::dispatcher",
					owner_id = %owner_id,
					listing_id = %listing.id,
					error = %e,
					"inbox notification failed to store"
				);
				self.outcomes.record(DispatchEvent::InboxFailed {
					subject_id: owner_id,
					listing_id: listing.id.clone(),
					error: e.to_string(),
				});
			}
		}
	}

	async fn notify_email(&self, listing: &Listing, candidate: &MatchCandidate) {
		let owner_id = candidate.owner.id.clone();
		let Some(address) = candidate.owner.email.as_deref() else {
			self.outcomes.record(DispatchEvent::EmailSkipped {
				subject_id: owner_id,
				listing_id: listing.id.clone(),
			});
			return;
		};

		match self
			.cooldown
			.should_notify(&owner_id, CHANNEL_EMAIL, self.cooldown_ttl)
			.await
		{
			Ok(true) => {}
			Ok(false) => {
				debug!(
					target: "notifier::dispatcher",
					owner_id = %owner_id,
					listing_id = %listing.id,
					"email notification suppressed by cooldown"
				);
				self.outcomes.record(DispatchEvent::EmailSuppressed {
					subject_id: owner_id,
					listing_id: listing.id.clone(),
				});
				return;
			}
			Err(e) => {
				warn!(
					target: "notifier::dispatcher",
					owner_id = %owner_id,
					listing_id = %listing.id,
					error = %e,
					"email cooldown check failed"
				);
				self.outcomes.record(DispatchEvent::EmailFailed {
					subject_id: owner_id,
					listing_id: listing.id.clone(),
					error: e.to_string(),
				});
				return;
			}
		}

		match self
			.email
			.send(address, &email_subject(listing), &email_body(listing))
			.await
		{
			Ok(()) => {
				self.outcomes.record(DispatchEvent::EmailSent {
					subject_id: owner_id,
					listing_id: listing.id.clone(),
				});
			}
			Err(EmailError::Disabled) => {
				self.outcomes.record(DispatchEvent::EmailSkipped {
					subject_id: owner_id,
					listing_id: listing.id.clone(),
				});
			}
			Err(e) => {
				warn!(
					target: "notifier::dispatcher",
					owner_id = %owner_id,
					listing_id = %listing.id,
					error = %e,
					"email notification failed"
				);
				self.outcomes.record(DispatchEvent::EmailFailed {
					subject_id: owner_id,
					listing_id: listing.id.clone(),
					error: e.to_string(),
				});
			}
		}
	}
}
