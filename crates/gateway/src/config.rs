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

use std::{env, net::SocketAddr};

use anyhow::{Context, Result};

// Logging configuration constants
/// Default log level (can be overridden by RUST_LOG environment variable)
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default log directory component name
pub const LOG_COMPONENT_NAME: &str = "gateway";

/// Default console output enabled (can be overridden by LOG_TO_CONSOLE environment variable)
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

// Server configuration constants
/// Default HTTP server bind address (can be overridden by GATEWAY_BIND_ADDR environment variable)
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Default cap on actix worker threads (can be overridden by GATEWAY_MAX_WORKERS)
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Gateway runtime configuration
#[derive(Debug, Clone)]
pub struct GatewayRuntimeConfig {
	pub bind_addr: SocketAddr,
	pub workers: usize,
}

impl GatewayRuntimeConfig {
	pub fn from_env() -> Result<Self> {
		dotenv::dotenv().ok();

		let bind_addr_str =
			env::var("GATEWAY_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
		let bind_addr = bind_addr_str
			.parse()
			.with_context(|| format!("Invalid bind address: {}", bind_addr_str))?;

		let max_workers = env::var("GATEWAY_MAX_WORKERS")
			.ok()
			.and_then(|w| w.parse().ok())
			.unwrap_or(DEFAULT_MAX_WORKERS);
		let workers = num_cpus::get().min(max_workers).max(1);

		Ok(Self { bind_addr, workers })
	}
}

impl Default for GatewayRuntimeConfig {
	fn default() -> Self {
		Self {
			bind_addr: DEFAULT_BIND_ADDR.parse().expect("default bind addr parses"),
			workers: 1,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_bind_addr_is_loopback() {
		let cfg = GatewayRuntimeConfig::default();
		assert!(cfg.bind_addr.ip().is_loopback());
		assert_eq!(cfg.bind_addr.port(), 8080);
	}
}
