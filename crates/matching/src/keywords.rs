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

use std::collections::HashSet;

/// Full-width punctuation that shows up in campus listing titles alongside
/// ASCII punctuation. Anything here splits tokens.
const CJK_PUNCTUATION: &[char] = &[
	'，', '。', '！', '？', '、', '；', '：', '“', '”', '‘', '’', '（', '）', '【', '】', '《',
	'》', '…', '—', '·', '￥',
];

fn is_separator(c: char) -> bool {
	c.is_whitespace() || c.is_ascii_punctuation() || CJK_PUNCTUATION.contains(&c)
}

/// Extract match keywords from a listing title.
///
/// Splits on whitespace and punctuation (ASCII and full-width), drops tokens
/// shorter than `min_chars` characters (characters, not bytes), and
/// deduplicates while preserving first-seen order. An empty result is legal;
/// it only disables keyword matching for the listing.
pub fn extract_keywords(title: &str, min_chars: usize) -> Vec<String> {
	let mut seen: HashSet<&str> = HashSet::new();
	let mut keywords = Vec::new();
	for token in title.split(is_separator) {
		if token.is_empty() || token.chars().count() < min_chars {
			continue;
		}
		if seen.insert(token) {
			keywords.push(token.to_string());
		}
	}
	keywords
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_on_mixed_width_punctuation() {
		let keywords = extract_keywords("黑色 钱包,丢失", 2);
		assert_eq!(keywords, vec!["黑色", "钱包", "丢失"]);
	}

	#[test]
	fn drops_short_tokens_by_char_count() {
		// "包" is three bytes but one character, so it is dropped;
		// "钱包" is two characters and kept.
		let keywords = extract_keywords("包 钱包 a ab", 2);
		assert_eq!(keywords, vec!["钱包", "ab"]);
	}

	#[test]
	fn deduplicates_preserving_first_seen_order() {
		let keywords = extract_keywords("wallet black wallet card black", 2);
		assert_eq!(keywords, vec!["wallet", "black", "card"]);
	}

	#[test]
	fn full_width_sentence_punctuation_separates() {
		let keywords = extract_keywords("校园卡（图书馆）丢失！请联系", 2);
		assert_eq!(keywords, vec!["校园卡", "图书馆", "丢失", "请联系"]);
	}

	#[test]
	fn empty_or_all_short_titles_yield_no_keywords() {
		assert!(extract_keywords("", 2).is_empty());
		assert!(extract_keywords("a b c", 2).is_empty());
		assert!(extract_keywords("，。！", 2).is_empty());
	}
}
