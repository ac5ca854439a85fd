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

use serde::{Deserialize, Serialize};

/// Days either side of a new listing's date that candidates may fall in.
pub const DEFAULT_DATE_WINDOW_DAYS: i64 = 5;
/// Minimum characters for a title token to count as a keyword.
pub const DEFAULT_MIN_TOKEN_CHARS: usize = 2;
/// Cap on candidates examined per new listing.
pub const DEFAULT_MAX_CANDIDATES: usize = 500;

/// Correlation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
	/// Inclusive date window half-width, in days
	#[serde(default = "default_date_window_days")]
	pub date_window_days: i64,
	/// Minimum keyword length, in characters
	#[serde(default = "default_min_token_chars")]
	pub min_token_chars: usize,
	/// Candidate scan cap per new listing
	#[serde(default = "default_max_candidates")]
	pub max_candidates: usize,
}

fn default_date_window_days() -> i64 {
	DEFAULT_DATE_WINDOW_DAYS
}

fn default_min_token_chars() -> usize {
	DEFAULT_MIN_TOKEN_CHARS
}

fn default_max_candidates() -> usize {
	DEFAULT_MAX_CANDIDATES
}

impl Default for MatchingConfig {
	fn default() -> Self {
		Self {
			date_window_days: DEFAULT_DATE_WINDOW_DAYS,
			min_token_chars: DEFAULT_MIN_TOKEN_CHARS,
			max_candidates: DEFAULT_MAX_CANDIDATES,
		}
	}
}

impl MatchingConfig {
	/// Load configuration from environment variables (prefix `MATCHING_`)
	pub fn from_env() -> Result<Self, config::ConfigError> {
		dotenv::dotenv().ok();
		let cfg = config::Config::builder()
			.add_source(config::Environment::with_prefix("MATCHING"))
			.build()?;

		let loaded: Self = cfg.try_deserialize()?;
		loaded.validate()?;
		Ok(loaded)
	}

	fn validate(&self) -> Result<(), config::ConfigError> {
		if self.date_window_days < 0 {
			return Err(config::ConfigError::Message(
				"date_window_days must be non-negative".to_string(),
			));
		}
		if self.min_token_chars == 0 {
			return Err(config::ConfigError::Message(
				"min_token_chars must be at least 1".to_string(),
			));
		}
		if self.max_candidates == 0 {
			return Err(config::ConfigError::Message(
				"max_candidates must be at least 1".to_string(),
			));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_valid() {
		let cfg = MatchingConfig::default();
		assert!(cfg.validate().is_ok());
		assert_eq!(cfg.date_window_days, 5);
		assert_eq!(cfg.min_token_chars, 2);
	}

	#[test]
	fn zero_token_length_is_rejected() {
		let cfg = MatchingConfig {
			min_token_chars: 0,
			..MatchingConfig::default()
		};
		assert!(cfg.validate().is_err());
	}
}
