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

use serde::{Deserialize, Serialize};

/// Default cooldown window per subject and channel, in seconds (6 hours).
pub const DEFAULT_COOLDOWN_SECS: u64 = 21_600;
/// Default dispatch queue capacity.
pub const DEFAULT_DISPATCH_QUEUE_CAPACITY: usize = 256;
/// Default outcome event buffer capacity.
pub const DEFAULT_EVENT_BUFFER_CAPACITY: usize = 1_024;
/// Default sender address for match notification emails.
pub const DEFAULT_EMAIL_FROM: &str = "no-reply@reclaim.campus";
/// Default email relay request timeout, in milliseconds.
pub const DEFAULT_EMAIL_TIMEOUT_MS: u64 = 5_000;

/// Notifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
	/// Cooldown window per `(subject, channel)`, in seconds
	#[serde(default = "default_cooldown_secs")]
	pub cooldown_secs: u64,
	/// Bounded dispatch queue capacity
	#[serde(default = "default_dispatch_queue_capacity")]
	pub dispatch_queue_capacity: usize,
	/// Bounded outcome buffer capacity
	#[serde(default = "default_event_buffer_capacity")]
	pub event_buffer_capacity: usize,
	/// HTTP email relay endpoint; unset disables email delivery
	#[serde(default)]
	pub email_relay_url: Option<String>,
	/// Sender address for notification emails
	#[serde(default = "default_email_from")]
	pub email_from: String,
	/// Email relay request timeout, in milliseconds
	#[serde(default = "default_email_timeout_ms")]
	pub email_timeout_ms: u64,
}

fn default_cooldown_secs() -> u64 {
	DEFAULT_COOLDOWN_SECS
}

fn default_dispatch_queue_capacity() -> usize {
	DEFAULT_DISPATCH_QUEUE_CAPACITY
}

fn default_event_buffer_capacity() -> usize {
	DEFAULT_EVENT_BUFFER_CAPACITY
}

fn default_email_from() -> String {
	DEFAULT_EMAIL_FROM.to_string()
}

fn default_email_timeout_ms() -> u64 {
	DEFAULT_EMAIL_TIMEOUT_MS
}

impl Default for NotifierConfig {
	fn default() -> Self {
		Self {
			cooldown_secs: DEFAULT_COOLDOWN_SECS,
			dispatch_queue_capacity: DEFAULT_DISPATCH_QUEUE_CAPACITY,
			event_buffer_capacity: DEFAULT_EVENT_BUFFER_CAPACITY,
			email_relay_url: None,
			email_from: DEFAULT_EMAIL_FROM.to_string(),
			email_timeout_ms: DEFAULT_EMAIL_TIMEOUT_MS,
		}
	}
}

impl NotifierConfig {
	/// Load configuration from environment variables (prefix `NOTIFIER_`)
	pub fn from_env() -> Result<Self, config::ConfigError> {
		dotenv::dotenv().ok();
		let cfg = config::Config::builder()
			.add_source(config::Environment::with_prefix("NOTIFIER"))
			.build()?;

		let loaded: Self = cfg.try_deserialize()?;
		loaded.validate()?;
		Ok(loaded)
	}

	fn validate(&self) -> Result<(), config::ConfigError> {
		if self.cooldown_secs == 0 {
			return Err(config::ConfigError::Message(
				"cooldown_secs must be at least 1".to_string(),
			));
		}
		if self.dispatch_queue_capacity == 0 {
			return Err(config::ConfigError::Message(
				"dispatch_queue_capacity must be at least 1".to_string(),
			));
		}
		if self.event_buffer_capacity == 0 {
			return Err(config::ConfigError::Message(
				"event_buffer_capacity must be at least 1".to_string(),
			));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_valid_and_six_hours() {
		let cfg = NotifierConfig::default();
		assert!(cfg.validate().is_ok());
		assert_eq!(cfg.cooldown_secs, 6 * 60 * 60);
		assert!(cfg.email_relay_url.is_none());
	}

	#[test]
	fn zero_cooldown_is_rejected() {
		let cfg = NotifierConfig {
			cooldown_secs: 0,
			..NotifierConfig::default()
		};
		assert!(cfg.validate().is_err());
	}
}
