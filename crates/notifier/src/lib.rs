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

//! Reclaim Notification Pipeline
//!
//! Turns correlation matches into notifications. For each matched owner
//! two channels run independently - an in-app inbox message (stored, then
//! pushed to live connections) and an email - each gated by its own
//! atomic cooldown window so a burst of qualifying listings produces one
//! notification per channel per six hours.
//!
//! Nothing in here can fail the listing creation that triggered it:
//! channel failures are logged and recorded as outcome events, and the
//! whole run can be pushed off the request path through the bounded
//! dispatch queue.

pub mod config;
pub mod cooldown;
pub mod dispatcher;
pub mod email;
pub mod events;
pub mod pipeline;
pub mod push;

pub use config::NotifierConfig;
pub use cooldown::{CooldownError, CooldownStore, MemoryCooldownStore, RedisCooldownStore};
pub use dispatcher::{CHANNEL_EMAIL, CHANNEL_INBOX, Dispatcher};
pub use email::{DisabledEmailTransport, EmailError, EmailTransport, HttpEmailTransport};
pub use events::{DispatchEvent, OutcomeBuffer, OutcomeConsumer, OutcomeProducer, OutcomeWriter};
pub use pipeline::{DispatchQueue, Pipeline};
pub use push::{NullPush, RealtimePush};
