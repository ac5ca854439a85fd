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

use reclaim_sdk::types::ServerEvent;

/// Realtime delivery surface the dispatcher publishes through.
///
/// Implemented by the gateway's connection registry. Delivery is
/// at-most-once and best-effort: a user with no live connection receives
/// nothing, which is a success, not an error. Implementations must not
/// block on slow consumers.
pub trait RealtimePush: Send + Sync {
	/// Deliver `event` to every live connection of `user_id`. Returns how
	/// many connections were reached.
	fn publish(&self, user_id: &str, event: ServerEvent) -> usize;
}

/// Push sink for deployments and tests with no realtime layer wired in.
pub struct NullPush;

impl RealtimePush for NullPush {
	fn publish(&self, _user_id: &str, _event: ServerEvent) -> usize {
		0
	}
}
