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

use actix_web::web;

use crate::{handlers, ws};

/// Configure API routes for the gateway
///
/// - `/api/v1/messages` - message center endpoints
/// - `/internal/v1/listings/created` - listing-service ingest
/// - `/ws` - realtime delivery socket
/// - `/health` - health check endpoint
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
	cfg.service(
		web::scope("/api/v1")
			.route("/messages", web::post().to(handlers::send_message))
			.route("/messages", web::get().to(handlers::inbox))
			.route(
				"/messages/{message_id}/read",
				web::patch().to(handlers::mark_read),
			)
			.route(
				"/messages/{message_id}",
				web::delete().to(handlers::delete_message),
			),
	)
	.service(
		web::scope("/internal/v1")
			.route("/listings/created", web::post().to(handlers::listing_created)),
	)
	.route("/ws", web::get().to(ws::connect))
	.route("/health", web::get().to(handlers::health));
}
