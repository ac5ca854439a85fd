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

//! WebSocket endpoint for realtime delivery.
//!
//! Each connection gets its own pump task selecting over two sources:
//! registry events to serialize onto the socket, and inbound frames. A
//! connection receives nothing until it sends a `join` command naming its
//! user; on disconnect it leaves whatever group it joined.

use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::{Message, MessageStream, Session};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use reclaim_sdk::types::{ClientCommand, ServerEvent};

use crate::registry::{ConnectionHandle, PushRegistry};
use crate::server::GatewayState;

/// `GET /ws` - upgrade and hand the connection to its pump task.
pub async fn connect(
	req: HttpRequest,
	body: web::Payload,
	state: web::Data<GatewayState>,
) -> Result<HttpResponse, actix_web::Error> {
	let (response, session, stream) = actix_ws::handle(&req, body)?;
	let state = state.into_inner();
	actix_web::rt::spawn(pump(state, session, stream));
	Ok(response)
}

/// Apply a `join` command to the registry.
///
/// A connection belongs to one user at a time: joining as someone else
/// moves the connection out of the previous group, while re-joining as
/// the same user just refreshes the registration.
fn apply_join(
	registry: &PushRegistry,
	joined_user: &mut Option<String>,
	conn_id: Uuid,
	tx: &mpsc::UnboundedSender<ServerEvent>,
	user_id: String,
) {
	if let Some(previous) = joined_user.take()
		&& previous != user_id
	{
		registry.leave(&previous, conn_id);
	}
	registry.join(&user_id, ConnectionHandle::new(conn_id, tx.clone()));
	*joined_user = Some(user_id);
}

async fn pump(state: std::sync::Arc<GatewayState>, mut session: Session, mut stream: MessageStream) {
	let conn_id = Uuid::new_v4();
	let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
	let mut joined_user: Option<String> = None;

	debug!(target: "gateway::ws", %conn_id, "connection established");

	loop {
		tokio::select! {
			Some(event) = rx.recv() => {
				let frame = match serde_json::to_string(&event) {
					Ok(frame) => frame,
					Err(e) => {
						warn!(target: "gateway::ws", %conn_id, error = %e, "event serialization failed");
						continue;
					}
				};
				if session.text(frame).await.is_err() {
					break;
				}
			}
			frame = stream.next() => {
				match frame {
					Some(Ok(Message::Text(text))) => {
						match serde_json::from_str::<ClientCommand>(&text) {
							Ok(ClientCommand::Join(join)) => {
								apply_join(
									&state.registry,
									&mut joined_user,
									conn_id,
									&tx,
									join.user_id,
								);
							}
							Err(e) => {
								debug!(
									target: "gateway::ws",
									%conn_id,
									error = %e,
									"unknown client frame ignored"
								);
							}
						}
					}
					Some(Ok(Message::Ping(bytes))) => {
						if session.pong(&bytes).await.is_err() {
							break;
						}
					}
					Some(Ok(Message::Close(_))) | None => break,
					Some(Err(e)) => {
						warn!(target: "gateway::ws", %conn_id, error = %e, "socket error");
						break;
					}
					Some(Ok(_)) => {}
				}
			}
		}
	}

	if let Some(user_id) = joined_user {
		state.registry.leave(&user_id, conn_id);
	}
	let _ = session.close(None).await;
	debug!(target: "gateway::ws", %conn_id, "connection closed");
}

#[cfg(test)]
mod tests {
	use chrono::Utc;

	use reclaim_sdk::types::{Message, MessageWithSender};

	use super::*;

	fn create_test_event(body: &str) -> ServerEvent {
		ServerEvent::NewMessage(MessageWithSender {
			message: Message {
				id: "m1".to_string(),
				content: body.to_string(),
				sender_id: "u1".to_string(),
				receiver_id: "u2".to_string(),
				read: false,
				created_at: Utc::now(),
			},
			sender_name: "alice".to_string(),
		})
	}

	#[test]
	fn rejoin_as_another_user_moves_the_connection() {
		let registry = PushRegistry::new();
		let (tx, mut rx) = mpsc::unbounded_channel();
		let conn_id = Uuid::new_v4();
		let mut joined = None;

		apply_join(&registry, &mut joined, conn_id, &tx, "alice".to_string());
		assert_eq!(joined.as_deref(), Some("alice"));
		assert_eq!(registry.publish("alice", create_test_event("hi")), 1);
		assert!(rx.try_recv().is_ok());

		apply_join(&registry, &mut joined, conn_id, &tx, "bob".to_string());
		assert_eq!(joined.as_deref(), Some("bob"));

		// The old group no longer reaches this connection.
		assert_eq!(registry.connection_count("alice"), 0);
		assert_eq!(registry.publish("alice", create_test_event("stale")), 0);
		assert!(rx.try_recv().is_err());

		assert_eq!(registry.publish("bob", create_test_event("hello bob")), 1);
		assert!(rx.try_recv().is_ok());
	}

	#[test]
	fn rejoin_as_same_user_keeps_one_registration() {
		let registry = PushRegistry::new();
		let (tx, mut rx) = mpsc::unbounded_channel();
		let conn_id = Uuid::new_v4();
		let mut joined = None;

		apply_join(&registry, &mut joined, conn_id, &tx, "alice".to_string());
		apply_join(&registry, &mut joined, conn_id, &tx, "alice".to_string());
		assert_eq!(joined.as_deref(), Some("alice"));

		assert_eq!(registry.connection_count("alice"), 1);
		assert_eq!(registry.publish("alice", create_test_event("once")), 1);
		assert!(rx.try_recv().is_ok());
		assert!(rx.try_recv().is_err());
	}

	#[test]
	fn unknown_client_frames_do_not_parse_as_commands() {
		// The pump ignores frames that fail to parse; joins are the only
		// recognized command.
		assert!(serde_json::from_str::<ClientCommand>("{\"event\":\"typing\"}").is_err());
		assert!(serde_json::from_str::<ClientCommand>("not json").is_err());
		let parsed: ClientCommand =
			serde_json::from_str("{\"event\":\"join\",\"payload\":{\"userId\":\"u1\"}}").unwrap();
		let ClientCommand::Join(join) = parsed;
		assert_eq!(join.user_id, "u1");
	}
}
