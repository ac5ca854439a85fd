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
use reqwest::Client as ReqwestClient;
use thiserror::Error;

use crate::types::{Message, SendMessageRequest};

/// Error types for send transport operations
#[derive(Debug, Error)]
pub enum SendError {
	#[error("Network error: {0}")]
	Network(String),
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Server error: {0}")]
	Server(String),
	#[error("Send rejected: {0}")]
	Rejected(String),
}

/// Transport used by the outbox to deliver a message to the platform.
///
/// The outbox only cares about the result: the stored message with its
/// server identity, or a failure to classify. Implementations must not
/// retry internally; retry policy belongs to the outbox.
#[async_trait]
pub trait SendTransport: Send + Sync {
	async fn send(&self, receiver_id: &str, content: &str) -> Result<Message, SendError>;
}

/// HTTP send transport targeting the gateway's message endpoint.
pub struct HttpSendClient {
	base_url: String,
	user_id: String,
	client: ReqwestClient,
}

impl HttpSendClient {
	/// Create a transport sending as `user_id` against `base_url`.
	pub fn new(base_url: impl Into<String>, user_id: impl Into<String>) -> Self {
		Self::with_timeout(base_url, user_id, Duration::from_secs(30))
	}

	/// Create a transport with a custom request timeout.
	pub fn with_timeout(
		base_url: impl Into<String>,
		user_id: impl Into<String>,
		timeout: Duration,
	) -> Self {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.build()
			.expect("Failed to create HTTP client");

		Self {
			base_url: base_url.into(),
			user_id: user_id.into(),
			client,
		}
	}
}

#[async_trait]
impl SendTransport for HttpSendClient {
	async fn send(&self, receiver_id: &str, content: &str) -> Result<Message, SendError> {
		let url = format!("{}/api/v1/messages", self.base_url);
		let body = SendMessageRequest {
			receiver_id: receiver_id.to_string(),
			content: content.to_string(),
		};

		let response = self
			.client
			.post(&url)
			.header("X-User-Id", &self.user_id)
			.json(&body)
			.send()
			.await
			.map_err(|e| SendError::Network(format!("Request failed: {}", e)))?;

		let status = response.status();
		if !status.is_success() {
			let error_text = response
				.text()
				.await
				.unwrap_or_else(|_| format!("HTTP {}", status));
			if status.is_client_error() {
				return Err(SendError::Rejected(format!("{}: {}", status, error_text)));
			}
			return Err(SendError::Server(format!("{}: {}", status, error_text)));
		}

		let message: Message = response
			.json()
			.await
			.map_err(|e| SendError::Serialization(format!("Failed to parse response: {}", e)))?;

		Ok(message)
	}
}
