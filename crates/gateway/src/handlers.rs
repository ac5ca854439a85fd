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

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use reclaim_sdk::store::{ListingStore, MessageStore, StoreError, UserStore};
use reclaim_sdk::types::{Listing, MessageWithSender, NewMessage, SendMessageRequest};

use crate::server::GatewayState;

/// Error types for gateway operations
#[derive(Debug, Error)]
pub enum GatewayError {
	#[error("Unauthorized: {0}")]
	Unauthorized(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Invalid request: {0}")]
	Invalid(String),
	#[error("Internal error: {0}")]
	Internal(String),
}

impl From<StoreError> for GatewayError {
	fn from(e: StoreError) -> Self {
		match e {
			StoreError::Invalid(msg) => GatewayError::Invalid(msg),
			StoreError::NotFound(msg) => GatewayError::NotFound(msg),
			StoreError::Backend(msg) => GatewayError::Internal(msg),
		}
	}
}

impl actix_web::ResponseError for GatewayError {
	fn error_response(&self) -> HttpResponse {
		let status = match self {
			GatewayError::Unauthorized(_) => actix_web::http::StatusCode::UNAUTHORIZED,
			GatewayError::NotFound(_) => actix_web::http::StatusCode::NOT_FOUND,
			GatewayError::Invalid(_) => actix_web::http::StatusCode::BAD_REQUEST,
			GatewayError::Internal(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
		};

		HttpResponse::build(status).json(serde_json::json!({
			"error": self.to_string()
		}))
	}
}

/// Caller identity, as asserted by the upstream session layer.
///
/// Session validation is outside this service; the gateway trusts the
/// `X-User-Id` header its upstream sets after authenticating the caller.
fn caller_id(req: &HttpRequest) -> Result<String, GatewayError> {
	req.headers()
		.get("X-User-Id")
		.and_then(|value| value.to_str().ok())
		.filter(|id| !id.is_empty())
		.map(str::to_string)
		.ok_or_else(|| GatewayError::Unauthorized("missing X-User-Id header".to_string()))
}

/// Health check endpoint
pub async fn health() -> impl Responder {
	HttpResponse::Ok().json(serde_json::json!({
		"status": "ok",
		"service": "reclaim-gateway"
	}))
}

/// Handle message send request
///
/// Persists the message, fans it out to the receiver's live connections,
/// and answers with the stored record (including the sender's display
/// name, matching the realtime payload shape).
pub async fn send_message(
	state: web::Data<GatewayState>,
	request: web::Json<SendMessageRequest>,
	req: HttpRequest,
) -> Result<HttpResponse, GatewayError> {
	let sender_id = caller_id(&req)?;
	let request = request.into_inner();

	// Unknown receivers are rejected before anything is stored.
	let receiver = state
		.users
		.find_by_id(&request.receiver_id)
		.await?
		.ok_or_else(|| GatewayError::NotFound(format!("no such user: {}", request.receiver_id)))?;

	let message = state
		.messages
		.create(NewMessage {
			content: request.content,
			sender_id: sender_id.clone(),
			receiver_id: receiver.id,
		})
		.await?;

	let sender_name = state
		.users
		.find_by_id(&sender_id)
		.await?
		.map(|u| u.username)
		.unwrap_or_else(|| sender_id.clone());
	let stored = MessageWithSender {
		message,
		sender_name,
	};

	let reached = state.pipeline.on_message_sent(&stored);
	info!(
		target: "gateway::handlers",
		message_id = %stored.message.id,
		sender_id = %stored.message.sender_id,
		receiver_id = %stored.message.receiver_id,
		connections = reached,
		"message stored"
	);

	Ok(HttpResponse::Created().json(stored))
}

/// Handle inbox query request
pub async fn inbox(
	state: web::Data<GatewayState>,
	req: HttpRequest,
) -> Result<HttpResponse, GatewayError> {
	let receiver_id = caller_id(&req)?;
	let messages = state.messages.inbox(&receiver_id).await?;
	Ok(HttpResponse::Ok().json(messages))
}

/// Handle mark-read request. Receiver-only; 404 covers both a missing
/// message and someone else's.
pub async fn mark_read(
	state: web::Data<GatewayState>,
	path: web::Path<String>,
	req: HttpRequest,
) -> Result<HttpResponse, GatewayError> {
	let receiver_id = caller_id(&req)?;
	let message_id = path.into_inner();

	if state.messages.mark_read(&message_id, &receiver_id).await? {
		Ok(HttpResponse::NoContent().finish())
	} else {
		Err(GatewayError::NotFound(format!(
			"no such message: {}",
			message_id
		)))
	}
}

/// Handle message deletion request. Receiver-only and idempotent: a
/// message that is already gone (or never was the caller's) deletes to
/// the same 204.
pub async fn delete_message(
	state: web::Data<GatewayState>,
	path: web::Path<String>,
	req: HttpRequest,
) -> Result<HttpResponse, GatewayError> {
	let receiver_id = caller_id(&req)?;
	let message_id = path.into_inner();

	state.messages.delete(&message_id, &receiver_id).await?;
	Ok(HttpResponse::NoContent().finish())
}

/// Internal ingest body: a listing the listing service just committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingCreatedRequest {
	pub listing: Listing,
	pub actor_id: String,
}

/// Handle listing-created ingest from the listing service.
///
/// Records the listing for future correlation scans and queues the
/// match-and-notify run; answers 202 as soon as the job is queued. The
/// triggering creation already committed upstream, so nothing downstream
/// of the queue can fail this request.
pub async fn listing_created(
	state: web::Data<GatewayState>,
	request: web::Json<ListingCreatedRequest>,
) -> Result<HttpResponse, GatewayError> {
	let ListingCreatedRequest { listing, actor_id } = request.into_inner();

	state.listings.insert(listing.clone()).await?;
	state.queue.enqueue_listing_created(listing, actor_id);

	Ok(HttpResponse::Accepted().finish())
}
