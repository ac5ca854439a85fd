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

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use super::{CooldownError, CooldownStore, cooldown_key};

/// Redis-backed cooldown store for deployments with more than one
/// dispatching process.
///
/// Each claim is a single `SET key 1 NX EX ttl` round trip: the window is
/// checked and installed in one server-side atomic command. Splitting this
/// into SETNX followed by EXPIRE would leave a crash window where the key
/// never expires, and GET followed by SET would let two dispatchers both
/// claim.
pub struct RedisCooldownStore {
	conn: ConnectionManager,
}

impl RedisCooldownStore {
	/// Connect to `url` (e.g. `redis://127.0.0.1:6379`).
	pub async fn connect(url: &str) -> Result<Self, CooldownError> {
		let client = redis::Client::open(url)
			.map_err(|e| CooldownError::Backend(format!("invalid redis url: {}", e)))?;
		let conn = ConnectionManager::new(client)
			.await
			.map_err(|e| CooldownError::Backend(format!("redis connect failed: {}", e)))?;
		Ok(Self { conn })
	}
}

#[async_trait]
impl CooldownStore for RedisCooldownStore {
	async fn should_notify(
		&self,
		subject: &str,
		channel: &str,
		ttl: Duration,
	) -> Result<bool, CooldownError> {
		let key = cooldown_key(subject, channel);
		let ttl_secs = ttl.as_secs().max(1);

		let mut conn = self.conn.clone();
		// SET ... NX EX replies OK when the key was absent and nil when a
		// live window already holds it.
		let reply: Option<String> = redis::cmd("SET")
			.arg(&key)
			.arg(1)
			.arg("NX")
			.arg("EX")
			.arg(ttl_secs)
			.query_async(&mut conn)
			.await
			.map_err(|e| CooldownError::Backend(format!("redis SET failed: {}", e)))?;

		Ok(reply.is_some())
	}
}
