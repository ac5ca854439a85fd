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

//! Reclaim Correlation Engine
//!
//! When someone posts a lost listing, open found listings are scanned for
//! likely counterparts (and vice versa). Candidates must be the opposite
//! kind in exactly the same category, dated within an inclusive window of
//! the new listing; they relate through location containment or title
//! keywords. Matches come joined with their owners so the notifier can
//! address them directly.
//!
//! The engine is read-only over the record stores and deliberately cheap:
//! one candidate query, one pass, no persistence of its own.

pub mod config;
pub mod engine;
pub mod keywords;

pub use config::MatchingConfig;
pub use engine::{CorrelationEngine, EngineError, MatchCandidate};
pub use keywords::extract_keywords;
