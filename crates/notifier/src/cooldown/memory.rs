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

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::sync::Cache;

use super::{CooldownError, CooldownStore};

/// Default bound on tracked cooldown windows.
pub const DEFAULT_MAX_WINDOWS: u64 = 100_000;

/// Reads each window's length out of its cache value, so callers can open
/// windows of different lengths through one cache.
struct PerWindowTtl;

impl Expiry<(String, String), (u64, Duration)> for PerWindowTtl {
	fn expire_after_create(
		&self,
		_key: &(String, String),
		value: &(u64, Duration),
		_created_at: Instant,
	) -> Option<Duration> {
		Some(value.1)
	}
}

/// In-process cooldown store.
///
/// Keyed by `(subject, channel)`. The value is a per-call token plus the
/// window length; `get_with` inserts exactly once per missing key, so the
/// caller whose token survives is the one that opened the window. There is
/// no check-then-set pair anywhere, hence no race for two dispatches to
/// both claim the same window.
///
/// A denied check performs a plain read and leaves the remaining window
/// untouched.
pub struct MemoryCooldownStore {
	cache: Cache<(String, String), (u64, Duration)>,
	next_token: AtomicU64,
}

impl MemoryCooldownStore {
	pub fn new(max_windows: u64) -> Self {
		let cache = Cache::builder()
			.max_capacity(max_windows)
			.expire_after(PerWindowTtl)
			.build();

		Self {
			cache,
			next_token: AtomicU64::new(1),
		}
	}
}

impl Default for MemoryCooldownStore {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_WINDOWS)
	}
}

#[async_trait]
impl CooldownStore for MemoryCooldownStore {
	async fn should_notify(
		&self,
		subject: &str,
		channel: &str,
		ttl: Duration,
	) -> Result<bool, CooldownError> {
		let key = (subject.to_string(), channel.to_string());
		let token = self.next_token.fetch_add(1, Ordering::Relaxed);

		let (stored, _) = self.cache.get_with(key, || (token, ttl));
		Ok(stored == token)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const SHORT: Duration = Duration::from_millis(100);

	#[tokio::test]
	async fn first_claim_wins_second_is_denied() {
		let store = MemoryCooldownStore::default();
		assert!(store.should_notify("u1", "inbox", SHORT).await.unwrap());
		assert!(!store.should_notify("u1", "inbox", SHORT).await.unwrap());
	}

	#[tokio::test]
	async fn expired_window_reopens() {
		let store = MemoryCooldownStore::default();
		assert!(store.should_notify("u1", "email", SHORT).await.unwrap());
		std::thread::sleep(SHORT * 2);
		assert!(store.should_notify("u1", "email", SHORT).await.unwrap());
	}

	#[tokio::test]
	async fn denied_check_does_not_extend_the_window() {
		let ttl = Duration::from_millis(300);
		let store = MemoryCooldownStore::default();
		assert!(store.should_notify("u1", "inbox", ttl).await.unwrap());

		// Two denied checks inside the window; if reads extended the
		// window the final claim below would still be inside it.
		std::thread::sleep(Duration::from_millis(100));
		assert!(!store.should_notify("u1", "inbox", ttl).await.unwrap());
		std::thread::sleep(Duration::from_millis(100));
		assert!(!store.should_notify("u1", "inbox", ttl).await.unwrap());

		std::thread::sleep(Duration::from_millis(200));
		assert!(store.should_notify("u1", "inbox", ttl).await.unwrap());
	}

	#[tokio::test]
	async fn channels_and_subjects_throttle_independently() {
		let store = MemoryCooldownStore::default();
		assert!(store.should_notify("u1", "inbox", SHORT).await.unwrap());
		assert!(store.should_notify("u1", "email", SHORT).await.unwrap());
		assert!(store.should_notify("u2", "inbox", SHORT).await.unwrap());
		assert!(!store.should_notify("u1", "inbox", SHORT).await.unwrap());
	}

	#[tokio::test]
	async fn concurrent_claims_admit_exactly_one() {
		let store = std::sync::Arc::new(MemoryCooldownStore::default());
		let mut tasks = Vec::new();
		for _ in 0..16 {
			let store = store.clone();
			tasks.push(tokio::spawn(async move {
				store
					.should_notify("u1", "inbox", Duration::from_secs(60))
					.await
					.unwrap()
			}));
		}
		let mut admitted = 0;
		for task in tasks {
			if task.await.unwrap() {
				admitted += 1;
			}
		}
		assert_eq!(admitted, 1);
	}
}
