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

//! Service wiring and HTTP server lifecycle.
//!
//! `GatewayServer` assembles the stores, the correlation engine, the
//! dispatcher with its cooldown and email transports, the push registry,
//! and the dispatch queue into one `GatewayState`, then runs actix-web
//! over it.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use tracing::info;

use reclaim_matching::{CorrelationEngine, MatchingConfig};
use reclaim_notifier::{
	DisabledEmailTransport, Dispatcher, DispatchQueue, EmailTransport, HttpEmailTransport,
	MemoryCooldownStore, NotifierConfig, OutcomeBuffer, OutcomeWriter, Pipeline,
};
use reclaim_sdk::store::{MemoryListingStore, MemoryMessageStore, MemoryUserStore};

use crate::config::GatewayRuntimeConfig;
use crate::middleware::LoggingMiddleware;
use crate::registry::PushRegistry;
use crate::routes::configure_routes;

/// Shared per-request state.
///
/// Stores are held concretely: this service owns its tables in process,
/// and the handler tests read row counts straight off them.
pub struct GatewayState {
	pub users: Arc<MemoryUserStore>,
	pub messages: Arc<MemoryMessageStore>,
	pub listings: Arc<MemoryListingStore>,
	pub registry: Arc<PushRegistry>,
	pub pipeline: Arc<Pipeline>,
	pub queue: DispatchQueue,
}

impl GatewayState {
	#[cfg(test)]
	pub fn listings_len(&self) -> usize {
		self.listings.len()
	}
}

/// The assembled gateway service.
pub struct GatewayServer {
	state: web::Data<GatewayState>,
	config: GatewayRuntimeConfig,
	// Drains dispatch outcomes on a background thread for the life of the
	// server; dropping it flushes the backlog.
	_outcome_writer: OutcomeWriter,
}

impl GatewayServer {
	/// Build the server from the environment.
	pub fn new() -> Result<Self> {
		let runtime = GatewayRuntimeConfig::from_env().context("Invalid gateway configuration")?;
		let notifier = NotifierConfig::from_env().context("Invalid notifier configuration")?;
		let matching = MatchingConfig::from_env().context("Invalid matching configuration")?;
		Ok(Self::build(runtime, notifier, matching))
	}

	/// Build with defaults: loopback bind, one worker, disabled email,
	/// in-memory cooldowns.
	#[cfg(test)]
	pub fn for_tests() -> Self {
		Self::build(
			GatewayRuntimeConfig::default(),
			NotifierConfig::default(),
			MatchingConfig::default(),
		)
	}

	fn build(
		runtime: GatewayRuntimeConfig,
		notifier: NotifierConfig,
		matching: MatchingConfig,
	) -> Self {
		let users = Arc::new(MemoryUserStore::new());
		let listings = Arc::new(MemoryListingStore::new());
		let messages = Arc::new(MemoryMessageStore::new(users.clone()));
		let registry = Arc::new(PushRegistry::new());

		let email: Arc<dyn EmailTransport> = match &notifier.email_relay_url {
			Some(url) => Arc::new(HttpEmailTransport::new(
				url.clone(),
				notifier.email_from.clone(),
				Duration::from_millis(notifier.email_timeout_ms),
			)),
			None => Arc::new(DisabledEmailTransport),
		};

		let (producer, consumer) = OutcomeBuffer::new(notifier.event_buffer_capacity).split();
		let outcome_writer = OutcomeWriter::start(consumer);

		let engine = CorrelationEngine::new(listings.clone(), users.clone(), matching);
		let dispatcher = Dispatcher::new(
			messages.clone(),
			users.clone(),
			Arc::new(MemoryCooldownStore::default()),
			email,
			registry.clone(),
			producer,
			Duration::from_secs(notifier.cooldown_secs),
		);
		let pipeline = Arc::new(Pipeline::new(engine, dispatcher, registry.clone()));
		let queue = DispatchQueue::start(pipeline.clone(), notifier.dispatch_queue_capacity);

		let state = web::Data::new(GatewayState {
			users,
			messages,
			listings,
			registry,
			pipeline,
			queue,
		});

		Self {
			state,
			config: runtime,
			_outcome_writer: outcome_writer,
		}
	}

	#[cfg(test)]
	pub fn state(&self) -> &GatewayState {
		self.state.get_ref()
	}

	/// App data for mounting the handlers in an actix `App`.
	#[cfg(test)]
	pub fn data(&self) -> web::Data<GatewayState> {
		self.state.clone()
	}

	/// Run the HTTP server until it shuts down.
	pub async fn serve(self) -> Result<()> {
		let bind_addr = self.config.bind_addr;
		let workers = self.config.workers;
		let state = self.state.clone();

		info!(
			target: "server",
			%bind_addr,
			workers,
			"Gateway listening"
		);

		HttpServer::new(move || {
			App::new()
				.app_data(state.clone())
				.wrap(LoggingMiddleware)
				.configure(configure_routes)
		})
		.workers(workers)
		.bind(bind_addr)
		.with_context(|| format!("Failed to bind {}", bind_addr))?
		.run()
		.await
		.context("HTTP server failed")?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use chrono::Utc;
	use tokio::sync::mpsc;
	use uuid::Uuid;

	use reclaim_sdk::store::{ListingStore, UserStore};
	use reclaim_sdk::types::{Listing, ListingKind, ListingStatus, ServerEvent, User};

	use super::*;
	use crate::registry::ConnectionHandle;

	fn create_test_listing(id: &str, kind: ListingKind, owner_id: &str, title: &str) -> Listing {
		Listing {
			id: id.to_string(),
			title: title.to_string(),
			description: String::new(),
			category: "daily-items".to_string(),
			location: "library".to_string(),
			coordinates: None,
			date: Utc::now(),
			kind,
			status: ListingStatus::Open,
			owner_id: owner_id.to_string(),
			created_at: Utc::now(),
		}
	}

	#[actix_web::test]
	async fn wiring_carries_a_match_through_to_a_live_connection() {
		let server = GatewayServer::for_tests();
		let state = server.state();

		state
			.users
			.insert(User {
				id: "bob".to_string(),
				username: "Bob".to_string(),
				email: None,
			})
			.await
			.unwrap();
		state
			.listings
			.insert(create_test_listing(
				"lost-1",
				ListingKind::Lost,
				"bob",
				"lost black wallet",
			))
			.await
			.unwrap();

		let (tx, mut rx) = mpsc::unbounded_channel();
		state
			.registry
			.join("bob", ConnectionHandle::new(Uuid::new_v4(), tx));

		let found = create_test_listing("found-1", ListingKind::Found, "alice", "black wallet");
		state
			.pipeline
			.on_listing_created(&found, "alice")
			.await;

		assert_eq!(state.messages.len(), 1);
		match rx.try_recv() {
			Ok(ServerEvent::NewMessage(pushed)) => {
				assert_eq!(pushed.message.receiver_id, "bob");
			}
			other => panic!("expected a pushed message, got {:?}", other.is_ok()),
		}
	}
}
