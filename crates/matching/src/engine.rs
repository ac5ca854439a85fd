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

use std::sync::Arc;

use chrono::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use reclaim_sdk::store::{ListingStore, StoreError, UserStore};
use reclaim_sdk::types::{Listing, User};

use crate::config::MatchingConfig;
use crate::keywords::extract_keywords;

/// Error types for correlation operations
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Candidate query failed: {0}")]
	Store(#[from] StoreError),
}

/// A cross-post match: an open counterpart listing and its owner.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
	pub listing: Listing,
	pub owner: User,
}

/// Correlation engine that pairs new listings with open counterparts
///
/// A new lost listing is checked against open found listings and vice
/// versa. Candidates must share the exact category and sit inside the
/// inclusive date window; they relate when the candidate's location
/// contains the new listing's location, or the candidate's title contains
/// any keyword from the new listing's title.
pub struct CorrelationEngine {
	listings: Arc<dyn ListingStore>,
	users: Arc<dyn UserStore>,
	config: MatchingConfig,
}

impl CorrelationEngine {
	pub fn new(
		listings: Arc<dyn ListingStore>,
		users: Arc<dyn UserStore>,
		config: MatchingConfig,
	) -> Self {
		Self {
			listings,
			users,
			config,
		}
	}

	/// Find counterpart listings whose owners should hear about `listing`.
	///
	/// Each match is joined with its owner record; candidates whose owner
	/// cannot be resolved are skipped rather than failing the scan. The
	/// new listing's own poster is never matched against themselves.
	pub async fn find_matches(&self, listing: &Listing) -> Result<Vec<MatchCandidate>, EngineError> {
		let window = Duration::days(self.config.date_window_days);
		let mut candidates = self
			.listings
			.find_open_candidates(
				listing.kind.opposite(),
				&listing.category,
				listing.date - window,
				listing.date + window,
			)
			.await?;

		if candidates.len() > self.config.max_candidates {
			warn!(
				target: "matching::engine",
				listing_id = %listing.id,
				candidates = candidates.len(),
				cap = self.config.max_candidates,
				"candidate scan capped"
			);
			candidates.truncate(self.config.max_candidates);
		}

		let keywords = extract_keywords(&listing.title, self.config.min_token_chars);
		let mut matches = Vec::new();
		for candidate in candidates {
			if candidate.owner_id == listing.owner_id {
				continue;
			}
			if !Self::is_related(&candidate, listing, &keywords) {
				continue;
			}
			match self.users.find_by_id(&candidate.owner_id).await {
				Ok(Some(owner)) => matches.push(MatchCandidate {
					listing: candidate,
					owner,
				}),
				Ok(None) => {
					warn!(
						target: "matching::engine",
						candidate_id = %candidate.id,
						owner_id = %candidate.owner_id,
						"candidate owner missing, match skipped"
					);
				}
				Err(e) => {
					warn!(
						target: "matching::engine",
						candidate_id = %candidate.id,
						owner_id = %candidate.owner_id,
						error = %e,
						"owner lookup failed, match skipped"
					);
				}
			}
		}

		debug!(
			target: "matching::engine",
			listing_id = %listing.id,
			keywords = keywords.len(),
			matches = matches.len(),
			"correlation scan finished"
		);
		Ok(matches)
	}

	/// Location containment or keyword hit. An empty location on the new
	/// listing never counts as contained (it would match everything).
	fn is_related(candidate: &Listing, listing: &Listing, keywords: &[String]) -> bool {
		let location = listing.location.trim();
		if !location.is_empty() && candidate.location.contains(location) {
			return true;
		}
		keywords
			.iter()
			.any(|keyword| candidate.title.contains(keyword.as_str()))
	}
}

#[cfg(test)]
mod tests {
	use chrono::{TimeZone, Utc};

	use reclaim_sdk::store::{MemoryListingStore, MemoryUserStore};
	use reclaim_sdk::types::{ListingKind, ListingStatus};

	use super::*;

	fn create_test_listing(
		id: &str,
		kind: ListingKind,
		title: &str,
		location: &str,
		owner_id: &str,
		day: u32,
	) -> Listing {
		Listing {
			id: id.to_string(),
			title: title.to_string(),
			description: String::new(),
			category: "daily-items".to_string(),
			location: location.to_string(),
			coordinates: None,
			date: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
			kind,
			status: ListingStatus::Open,
			owner_id: owner_id.to_string(),
			created_at: Utc::now(),
		}
	}

	fn create_test_user(id: &str) -> User {
		User {
			id: id.to_string(),
			username: format!("user-{}", id),
			email: None,
		}
	}

	async fn engine_with(
		candidates: Vec<Listing>,
		owners: Vec<User>,
	) -> CorrelationEngine {
		let listings = Arc::new(MemoryListingStore::new());
		for candidate in candidates {
			listings.insert(candidate).await.unwrap();
		}
		let users = Arc::new(MemoryUserStore::new());
		for owner in owners {
			users.insert(owner).await.unwrap();
		}
		CorrelationEngine::new(listings, users, MatchingConfig::default())
	}

	#[tokio::test]
	async fn keyword_hit_matches_opposite_listing() {
		let engine = engine_with(
			vec![create_test_listing(
				"lost-1",
				ListingKind::Lost,
				"钱包不见了",
				"宿舍",
				"bob",
				10,
			)],
			vec![create_test_user("bob")],
		)
		.await;

		let found = create_test_listing(
			"found-1",
			ListingKind::Found,
			"黑色 钱包,丢失",
			"操场",
			"alice",
			12,
		);
		let matches = engine.find_matches(&found).await.unwrap();
		assert_eq!(matches.len(), 1);
		assert_eq!(matches[0].listing.id, "lost-1");
		assert_eq!(matches[0].owner.id, "bob");
	}

	#[tokio::test]
	async fn location_containment_matches_without_keywords() {
		// Every title token is a single character, so the keyword set is
		// empty and only the location test can relate the pair.
		let engine = engine_with(
			vec![create_test_listing(
				"lost-1",
				ListingKind::Lost,
				"卡",
				"大学图书馆三楼",
				"bob",
				10,
			)],
			vec![create_test_user("bob")],
		)
		.await;

		let found = create_test_listing("found-1", ListingKind::Found, "卡 丢", "图书馆", "alice", 10);
		let matches = engine.find_matches(&found).await.unwrap();
		assert_eq!(matches.len(), 1);
	}

	#[tokio::test]
	async fn empty_location_is_not_a_wildcard() {
		let engine = engine_with(
			vec![create_test_listing(
				"lost-1",
				ListingKind::Lost,
				"自行车钥匙",
				"操场",
				"bob",
				10,
			)],
			vec![create_test_user("bob")],
		)
		.await;

		// No keyword overlap and an empty location: nothing relates.
		let found = create_test_listing("found-1", ListingKind::Found, "水杯", "", "alice", 10);
		assert!(engine.find_matches(&found).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn category_must_match_exactly() {
		let mut candidate =
			create_test_listing("lost-1", ListingKind::Lost, "钱包不见了", "宿舍", "bob", 10);
		candidate.category = "cards".to_string();
		let engine = engine_with(vec![candidate], vec![create_test_user("bob")]).await;

		let found = create_test_listing("found-1", ListingKind::Found, "钱包", "宿舍", "alice", 10);
		assert!(engine.find_matches(&found).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn date_window_is_inclusive_at_five_days() {
		let engine = engine_with(
			vec![
				create_test_listing("edge", ListingKind::Lost, "钱包不见了", "宿舍", "bob", 10),
				create_test_listing("outside", ListingKind::Lost, "钱包不见了", "宿舍", "bob", 22),
			],
			vec![create_test_user("bob")],
		)
		.await;

		let found = create_test_listing("found-1", ListingKind::Found, "钱包", "操场", "alice", 15);
		let matches = engine.find_matches(&found).await.unwrap();
		assert_eq!(matches.len(), 1);
		assert_eq!(matches[0].listing.id, "edge");
	}

	#[tokio::test]
	async fn unresolvable_owner_is_skipped_not_fatal() {
		let engine = engine_with(
			vec![
				create_test_listing("lost-1", ListingKind::Lost, "钱包不见了", "宿舍", "ghost", 10),
				create_test_listing("lost-2", ListingKind::Lost, "钱包也丢了", "宿舍", "bob", 10),
			],
			vec![create_test_user("bob")],
		)
		.await;

		let found = create_test_listing("found-1", ListingKind::Found, "钱包", "操场", "alice", 10);
		let matches = engine.find_matches(&found).await.unwrap();
		assert_eq!(matches.len(), 1);
		assert_eq!(matches[0].owner.id, "bob");
	}

	#[tokio::test]
	async fn own_listings_never_match_back() {
		let engine = engine_with(
			vec![create_test_listing(
				"lost-1",
				ListingKind::Lost,
				"钱包不见了",
				"宿舍",
				"alice",
				10,
			)],
			vec![create_test_user("alice")],
		)
		.await;

		let found = create_test_listing("found-1", ListingKind::Found, "钱包", "宿舍", "alice", 10);
		assert!(engine.find_matches(&found).await.unwrap().is_empty());
	}
}
