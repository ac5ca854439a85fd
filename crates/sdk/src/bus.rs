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

use tokio::sync::broadcast;

/// Default buffered reconciliations per subscriber.
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Announcement that a locally-minted send now has a server identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
	/// Client-minted correlation ID
	pub correlation_id: u64,
	/// Server-assigned message ID
	pub real_id: String,
}

/// Broadcast bus for reconciliation announcements.
///
/// Views subscribe to swap optimistic entries over to their server identity;
/// publishing with no subscribers is a silent no-op.
#[derive(Clone)]
pub struct ReconcileBus {
	tx: broadcast::Sender<Reconciliation>,
}

impl ReconcileBus {
	pub fn new(capacity: usize) -> Self {
		let (tx, _) = broadcast::channel(capacity);
		Self { tx }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<Reconciliation> {
		self.tx.subscribe()
	}

	/// Publish an announcement; returns how many subscribers saw it.
	pub fn publish(&self, reconciliation: Reconciliation) -> usize {
		self.tx.send(reconciliation).unwrap_or(0)
	}
}

impl Default for ReconcileBus {
	fn default() -> Self {
		Self::new(DEFAULT_BUS_CAPACITY)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn publish_without_subscribers_is_a_no_op() {
		let bus = ReconcileBus::default();
		let seen = bus.publish(Reconciliation {
			correlation_id: 1,
			real_id: "m1".to_string(),
		});
		assert_eq!(seen, 0);
	}

	#[tokio::test]
	async fn all_subscribers_receive_announcements() {
		let bus = ReconcileBus::default();
		let mut rx_a = bus.subscribe();
		let mut rx_b = bus.subscribe();

		bus.publish(Reconciliation {
			correlation_id: 42,
			real_id: "m42".to_string(),
		});

		let got_a = rx_a.recv().await.unwrap();
		let got_b = rx_b.recv().await.unwrap();
		assert_eq!(got_a, got_b);
		assert_eq!(got_a.correlation_id, 42);
		assert_eq!(got_a.real_id, "m42");
	}
}
