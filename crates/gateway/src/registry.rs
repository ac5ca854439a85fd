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

//! Live connection registry.
//!
//! Maps a user identity to every connection currently joined under it, so
//! one user reading the board in two tabs gets fan-out on both. Delivery
//! is at-most-once and best-effort: publishing to a user with no live
//! connection is a silent no-op, and a connection that stopped consuming
//! is pruned on the next publish.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use reclaim_notifier::RealtimePush;
use reclaim_sdk::types::ServerEvent;

/// One live connection's delivery end.
///
/// The socket pump owns the receiver; the registry only ever clones the
/// sender. The channel is unbounded so `publish` never blocks on a slow
/// consumer; the pump applies backpressure by disconnecting instead.
#[derive(Clone)]
pub struct ConnectionHandle {
	conn_id: Uuid,
	tx: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
	pub fn new(conn_id: Uuid, tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
		Self { conn_id, tx }
	}

	#[cfg(test)]
	pub fn conn_id(&self) -> Uuid {
		self.conn_id
	}

	/// False when the pump dropped its receiver.
	fn deliver(&self, event: ServerEvent) -> bool {
		self.tx.send(event).is_ok()
	}
}

/// User-keyed registry of live connections.
#[derive(Default)]
pub struct PushRegistry {
	connections: DashMap<String, Vec<ConnectionHandle>>,
}

impl PushRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Join a connection under `user_id`. Idempotent per connection: a
	/// repeat join of the same connection replaces its handle instead of
	/// duplicating fan-out.
	pub fn join(&self, user_id: &str, handle: ConnectionHandle) {
		let mut entry = self.connections.entry(user_id.to_string()).or_default();
		match entry.iter_mut().find(|h| h.conn_id == handle.conn_id) {
			Some(existing) => *existing = handle,
			None => entry.push(handle),
		}
		debug!(
			target: "gateway::registry",
			user_id,
			connections = entry.len(),
			"connection joined"
		);
	}

	/// Drop one connection from `user_id`'s group; the group itself goes
	/// away when its last connection leaves. Unknown ids are a no-op.
	pub fn leave(&self, user_id: &str, conn_id: Uuid) {
		let emptied = match self.connections.get_mut(user_id) {
			Some(mut entry) => {
				entry.retain(|h| h.conn_id != conn_id);
				entry.is_empty()
			}
			None => false,
		};
		if emptied {
			self.connections
				.remove_if(user_id, |_, handles| handles.is_empty());
		}
		debug!(target: "gateway::registry", user_id, %conn_id, "connection left");
	}

	/// Live connections currently joined under `user_id`.
	#[cfg(test)]
	pub fn connection_count(&self, user_id: &str) -> usize {
		self.connections
			.get(user_id)
			.map(|entry| entry.len())
			.unwrap_or(0)
	}

	/// Deliver `event` to every live connection of `user_id`; returns how
	/// many were reached.
	///
	/// The handle list is snapshotted first so no map guard is held while
	/// sending. Handles whose pump is gone are pruned afterwards.
	pub fn publish(&self, user_id: &str, event: ServerEvent) -> usize {
		let snapshot: Vec<ConnectionHandle> = match self.connections.get(user_id) {
			Some(entry) => entry.clone(),
			None => {
				debug!(target: "gateway::registry", user_id, "publish to user with no connections");
				return 0;
			}
		};

		let mut delivered = 0;
		let mut dead = Vec::new();
		for handle in &snapshot {
			if handle.deliver(event.clone()) {
				delivered += 1;
			} else {
				dead.push(handle.conn_id);
			}
		}
		for conn_id in dead {
			self.leave(user_id, conn_id);
		}
		delivered
	}
}

impl RealtimePush for PushRegistry {
	fn publish(&self, user_id: &str, event: ServerEvent) -> usize {
		PushRegistry::publish(self, user_id, event)
	}
}
