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

mod memory;
mod redis;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryCooldownStore;
pub use self::redis::RedisCooldownStore;

/// Error types for cooldown operations
#[derive(Debug, Error)]
pub enum CooldownError {
	#[error("Cooldown backend error: {0}")]
	Backend(String),
}

/// Per-subject, per-channel notification throttle.
///
/// One call answers "may I notify this subject over this channel now?" and,
/// when the answer is yes, opens a fresh cooldown window in the same atomic
/// step. There is deliberately no separate read: a check-then-set pair would
/// let two concurrent dispatches both pass the check.
///
/// Semantic constraints:
/// - A live window always answers false and is never extended by the check
/// - Expired or absent windows answer true exactly once per expiry
/// - Atomicity is per `(subject, channel)` key; distinct channels for the
///   same subject throttle independently
#[async_trait]
pub trait CooldownStore: Send + Sync {
	/// Atomically claim the right to notify. True means no live window
	/// existed and a fresh one of length `ttl` was installed.
	async fn should_notify(
		&self,
		subject: &str,
		channel: &str,
		ttl: Duration,
	) -> Result<bool, CooldownError>;
}

/// Key layout shared by keyed backends.
pub(crate) fn cooldown_key(subject: &str, channel: &str) -> String {
	format!("notify:{}:{}", subject, channel)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn key_layout_is_stable() {
		assert_eq!(cooldown_key("u42", "email"), "notify:u42:email");
	}
}
