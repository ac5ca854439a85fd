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

//! Reclaim SDK - shared domain types and the client delivery library
//!
//! This crate carries the record types and store traits the server crates
//! share, plus everything a client embeds to send messages reliably over
//! flaky connectivity:
//! - an outbox state machine tracking every send by correlation ID
//! - an offline queue replayed in order when connectivity returns
//! - a reconcile bus announcing server identities for replayed sends
//! - an HTTP transport targeting the gateway's send endpoint
//!
//! The SDK is designed to be lightweight and embeddable:
//! - No background threads
//! - No runtime initialization
//! - No environment or configuration loading

pub mod bus;
pub mod client;
pub mod outbox;
pub mod queue;
pub mod store;
pub mod types;

pub use bus::{Reconciliation, ReconcileBus};
pub use client::{HttpSendClient, SendError, SendTransport};
pub use outbox::{Outbox, OutboxError, OutgoingEntry, OutgoingStatus, SessionView};
pub use queue::{MemoryOfflineQueue, OfflineQueue, QueueError, QueuedSend};
pub use store::{
	ListingStore, MemoryListingStore, MemoryMessageStore, MemoryUserStore, MessageStore,
	StoreError, UserStore,
};
pub use types::*;
