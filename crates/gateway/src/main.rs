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

//! Reclaim gateway binary.
//!
//! HTTP and WebSocket front of the lost-and-found message center: message
//! endpoints, the internal listing-created ingest, and realtime delivery
//! to joined connections.

mod config;
mod handlers;
mod logging;
mod middleware;
mod registry;
mod routes;
mod server;
mod ws;

use anyhow::Result;
use tracing::info;

use crate::server::GatewayServer;

#[actix_rt::main]
async fn main() -> Result<()> {
	logging::init_logging()?;

	info!(target: "server", "Starting reclaim gateway");

	let server = GatewayServer::new()?;
	server.serve().await
}
