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
use serde::Serialize;
use thiserror::Error;

/// Error types for email delivery
#[derive(Debug, Error)]
pub enum EmailError {
	#[error("Email delivery disabled")]
	Disabled,
	#[error("Email network error: {0}")]
	Network(String),
	#[error("Email relay error: {0}")]
	Relay(String),
}

/// Outbound email delivery.
///
/// The dispatcher treats this as fire-and-forget per match: a failure is
/// logged and recorded, never propagated. Implementations must not retry
/// internally.
#[async_trait]
pub trait EmailTransport: Send + Sync {
	async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError>;
}

#[derive(Serialize)]
struct RelayRequest<'a> {
	to: &'a str,
	subject: &'a str,
	text: &'a str,
	from: &'a str,
}

/// Email transport posting to an HTTP relay endpoint.
pub struct HttpEmailTransport {
	relay_url: String,
	from: String,
	client: ReqwestClient,
}

impl HttpEmailTransport {
	pub fn new(relay_url: impl Into<String>, from: impl Into<String>, timeout: Duration) -> Self {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.build()
			.expect("Failed to create HTTP client");

		Self {
			relay_url: relay_url.into(),
			from: from.into(),
			client,
		}
	}
}

#[async_trait]
impl EmailTransport for HttpEmailTransport {
	async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
		let request = RelayRequest {
			to,
			subject,
			text: body,
			from: &self.from,
		};

		let response = self
			.client
			.post(&self.relay_url)
			.json(&request)
			.send()
			.await
			.map_err(|e| EmailError::Network(format!("Relay request failed: {}", e)))?;

		let status = response.status();
		if !status.is_success() {
			let error_text = response
				.text()
				.await
				.unwrap_or_else(|_| format!("HTTP {}", status));
			return Err(EmailError::Relay(format!("{}: {}", status, error_text)));
		}
		Ok(())
	}
}

/// Stand-in for deployments with no relay configured. Every send reports
/// `Disabled`, which the dispatcher records as a skip rather than a failure.
pub struct DisabledEmailTransport;

#[async_trait]
impl EmailTransport for DisabledEmailTransport {
	async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), EmailError> {
		Err(EmailError::Disabled)
	}
}
