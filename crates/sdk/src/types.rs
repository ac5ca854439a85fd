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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum message body length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Listing kind (what the poster is reporting)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
	Lost,
	Found,
}

impl ListingKind {
	/// The kind a counterpart listing must have to be a candidate match.
	pub fn opposite(self) -> Self {
		match self {
			ListingKind::Lost => ListingKind::Found,
			ListingKind::Found => ListingKind::Lost,
		}
	}
}

/// Listing lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
	Open,
	Resolved,
}

/// A lost-or-found listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
	/// Listing ID
	pub id: String,
	/// Short title (keyword source for matching)
	pub title: String,
	/// Free-form description
	pub description: String,
	/// Category label; matching requires exact equality
	pub category: String,
	/// Free-text location
	pub location: String,
	/// Optional map coordinates (longitude, latitude)
	pub coordinates: Option<(f64, f64)>,
	/// When the item was lost or found
	pub date: DateTime<Utc>,
	/// Lost or found
	pub kind: ListingKind,
	/// Open or resolved
	pub status: ListingStatus,
	/// Posting user ID
	pub owner_id: String,
	/// Timestamp when the listing was created
	pub created_at: DateTime<Utc>,
}

/// A platform user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// User ID
	pub id: String,
	/// Display name
	pub username: String,
	/// Email address, if the user registered one
	pub email: Option<String>,
}

/// A stored direct message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
	/// Message ID
	pub id: String,
	/// Message body
	pub content: String,
	/// Sending user ID
	pub sender_id: String,
	/// Receiving user ID
	pub receiver_id: String,
	/// Whether the receiver marked the message read
	pub read: bool,
	/// Timestamp when the message was stored
	pub created_at: DateTime<Utc>,
}

/// A message joined with its sender's display name.
///
/// This is the shape inbox queries return and the realtime channel delivers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageWithSender {
	#[serde(flatten)]
	pub message: Message,
	/// Sender display name
	pub sender_name: String,
}

/// Input to message creation
#[derive(Debug, Clone)]
pub struct NewMessage {
	pub content: String,
	pub sender_id: String,
	pub receiver_id: String,
}

/// Request body for the message send endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
	/// Receiving user ID
	pub receiver_id: String,
	/// Message body
	pub content: String,
}

/// Server-to-client realtime event.
///
/// Wire shape: `{"event": "new_message", "payload": { ...message... }}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ServerEvent {
	/// A message addressed to the connected user was just stored
	NewMessage(MessageWithSender),
}

/// Client-to-server realtime command.
///
/// Wire shape: `{"event": "join", "payload": {"userId": "..."}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ClientCommand {
	/// Identify this connection so user-addressed events reach it
	Join(JoinPayload),
}

/// Payload of the `join` command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
	pub user_id: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn listing_kind_opposite_flips() {
		assert_eq!(ListingKind::Lost.opposite(), ListingKind::Found);
		assert_eq!(ListingKind::Found.opposite(), ListingKind::Lost);
	}

	#[test]
	fn listing_kind_serializes_lowercase() {
		assert_eq!(serde_json::to_string(&ListingKind::Lost).unwrap(), "\"lost\"");
		assert_eq!(
			serde_json::to_string(&ListingStatus::Resolved).unwrap(),
			"\"resolved\""
		);
	}

	#[test]
	fn message_wire_shape_is_camel_case() {
		let msg = Message {
			id: "m1".to_string(),
			content: "hello".to_string(),
			sender_id: "u1".to_string(),
			receiver_id: "u2".to_string(),
			read: false,
			created_at: Utc::now(),
		};
		let value = serde_json::to_value(&msg).unwrap();
		assert!(value.get("senderId").is_some());
		assert!(value.get("receiverId").is_some());
		assert!(value.get("createdAt").is_some());
	}

	#[test]
	fn realtime_wire_shapes() {
		let event = ServerEvent::NewMessage(MessageWithSender {
			message: Message {
				id: "m1".to_string(),
				content: "hi".to_string(),
				sender_id: "u1".to_string(),
				receiver_id: "u2".to_string(),
				read: false,
				created_at: Utc::now(),
			},
			sender_name: "alice".to_string(),
		});
		let value = serde_json::to_value(&event).unwrap();
		assert_eq!(value.get("event").unwrap(), "new_message");
		assert_eq!(
			value.pointer("/payload/senderName").unwrap(),
			"alice"
		);

		let command: ClientCommand =
			serde_json::from_str(r#"{"event":"join","payload":{"userId":"u7"}}"#).unwrap();
		let ClientCommand::Join(join) = command;
		assert_eq!(join.user_id, "u7");
	}

	#[test]
	fn message_with_sender_flattens() {
		let wire = MessageWithSender {
			message: Message {
				id: "m1".to_string(),
				content: "hi".to_string(),
				sender_id: "u1".to_string(),
				receiver_id: "u2".to_string(),
				read: false,
				created_at: Utc::now(),
			},
			sender_name: "alice".to_string(),
		};
		let value = serde_json::to_value(&wire).unwrap();
		assert_eq!(value.get("senderName").unwrap(), "alice");
		assert_eq!(value.get("content").unwrap(), "hi");
	}
}
