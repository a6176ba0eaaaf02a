use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{Error, Result};

pub type Hit = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingStrategy {
	All,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
	pub q: String,
	pub limit: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filter: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub matching_strategy: Option<MatchingStrategy>,
}
impl SearchQuery {
	/// Exact equality on one attribute. The query text stays empty; the filter alone selects hits.
	pub fn exact(attribute: &str, value: &str, limit: u32) -> Self {
		Self {
			q: String::new(),
			limit,
			filter: Some(exact_filter(attribute, value)),
			matching_strategy: None,
		}
	}

	/// Full-text query where every term must match.
	pub fn full_text(text: &str, limit: u32) -> Self {
		Self {
			q: text.to_string(),
			limit,
			filter: None,
			matching_strategy: Some(MatchingStrategy::All),
		}
	}

	/// Unfiltered, unranked page of documents.
	pub fn scan(limit: u32) -> Self {
		Self::full_text("", limit)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct IndexStats {
	pub collections: usize,
	pub total_documents: u64,
}

struct IndexPage {
	uids: Vec<String>,
	total: Option<usize>,
}

/// HTTP client for one Meilisearch instance. Cloning shares the connection pool.
#[derive(Clone, Debug)]
pub struct MeiliClient {
	http: Client,
	base_url: String,
	page_size: u32,
	health_timeout: Duration,
}
impl MeiliClient {
	pub fn new(cfg: &idcrawl_config::Index) -> Result<Self> {
		let headers = crate::auth_headers(cfg.api_key.as_deref(), &cfg.default_headers)?;
		let http = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(headers)
			.build()?;

		Ok(Self {
			http,
			base_url: cfg.url.trim_end_matches('/').to_string(),
			page_size: cfg.page_size.max(1),
			health_timeout: Duration::from_millis(cfg.health_timeout_ms),
		})
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Every index uid, following pagination until a short page, the reported total, or a page
	/// with no new uids.
	pub async fn list_indexes(&self) -> Result<Vec<String>> {
		let url = format!("{}/indexes", self.base_url);
		let mut uids: Vec<String> = Vec::new();
		let mut offset = 0_usize;

		loop {
			let json: Value = self
				.http
				.get(&url)
				.query(&[("limit", self.page_size as usize), ("offset", offset)])
				.send()
				.await?
				.error_for_status()?
				.json()
				.await?;
			let page = parse_index_page(&json)?;
			let fetched = page.uids.len();
			let before = uids.len();

			for uid in page.uids {
				if !uids.contains(&uid) {
					uids.push(uid);
				}
			}

			offset += fetched;

			if fetched < self.page_size as usize
				|| uids.len() == before
				|| page.total.is_some_and(|total| uids.len() >= total)
			{
				break;
			}
		}

		Ok(uids)
	}

	pub async fn filterable_attributes(&self, uid: &str) -> Result<Vec<String>> {
		let url = format!("{}/indexes/{uid}/settings/filterable-attributes", self.base_url);
		let json: Value =
			self.http.get(url).send().await?.error_for_status()?.json().await?;

		parse_filterable_attributes(&json)
	}

	pub async fn search(&self, uid: &str, query: &SearchQuery) -> Result<Vec<Hit>> {
		let url = format!("{}/indexes/{uid}/search", self.base_url);
		let json: Value =
			self.http.post(url).json(query).send().await?.error_for_status()?.json().await?;

		parse_hits(json)
	}

	/// Document count of one index.
	pub async fn document_count(&self, uid: &str) -> Result<u64> {
		let url = format!("{}/indexes/{uid}/stats", self.base_url);
		let json: Value = self.http.get(url).send().await?.error_for_status()?.json().await?;

		json.get("numberOfDocuments").and_then(Value::as_u64).ok_or_else(|| {
			Error::InvalidResponse {
				endpoint: "stats".to_string(),
				message: "numberOfDocuments is missing.".to_string(),
			}
		})
	}

	/// Index count and summed document count. Indexes whose stats fail are skipped.
	pub async fn stats(&self) -> Result<IndexStats> {
		let uids = self.list_indexes().await?;
		let mut total_documents = 0;

		for uid in &uids {
			match self.document_count(uid).await {
				Ok(count) => total_documents += count,
				Err(err) => tracing::warn!(index = %uid, error = %err, "Index stats unavailable."),
			}
		}

		Ok(IndexStats { collections: uids.len(), total_documents })
	}

	/// Whether the instance reports itself available. Transport failures count as offline.
	pub async fn is_healthy(&self) -> bool {
		let url = format!("{}/health", self.base_url);
		let res = match self.http.get(url).timeout(self.health_timeout).send().await {
			Ok(res) => res,
			Err(err) => {
				tracing::error!(error = %err, "Index health check failed.");

				return false;
			},
		};

		if res.status() != StatusCode::OK {
			return false;
		}

		match res.json::<Value>().await {
			Ok(json) => json.get("status").and_then(Value::as_str) == Some("available"),
			Err(err) => {
				tracing::error!(error = %err, "Index health response was not JSON.");

				false
			},
		}
	}
}

/// `attribute = "value"` with quotes and backslashes escaped.
pub fn exact_filter(attribute: &str, value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());

	for ch in value.chars() {
		if matches!(ch, '"' | '\\') {
			escaped.push('\\');
		}

		escaped.push(ch);
	}

	format!("{attribute} = \"{escaped}\"")
}

/// Meilisearch attribute patterns allow one leading or trailing `*`.
pub fn attribute_matches(pattern: &str, attribute: &str) -> bool {
	if pattern == "*" {
		return true;
	}
	if let Some(prefix) = pattern.strip_suffix('*') {
		return attribute.starts_with(prefix);
	}
	if let Some(suffix) = pattern.strip_prefix('*') {
		return attribute.ends_with(suffix);
	}

	pattern == attribute
}

fn parse_index_page(json: &Value) -> Result<IndexPage> {
	let results = json.get("results").and_then(Value::as_array).ok_or_else(|| {
		Error::InvalidResponse {
			endpoint: "indexes".to_string(),
			message: "results array is missing.".to_string(),
		}
	})?;
	let uids = results
		.iter()
		.filter_map(|item| item.get("uid").and_then(Value::as_str).map(str::to_string))
		.collect();
	let total = json.get("total").and_then(Value::as_u64).map(|total| total as usize);

	Ok(IndexPage { uids, total })
}

fn parse_filterable_attributes(json: &Value) -> Result<Vec<String>> {
	let items = json.as_array().ok_or_else(|| Error::InvalidResponse {
		endpoint: "filterable-attributes".to_string(),
		message: "expected an array.".to_string(),
	})?;
	let mut patterns = Vec::new();

	for item in items {
		match item {
			Value::String(pattern) => patterns.push(pattern.clone()),
			Value::Object(granular) => {
				if let Some(list) = granular.get("attributePatterns").and_then(Value::as_array) {
					patterns.extend(list.iter().filter_map(Value::as_str).map(str::to_string));
				}
			},
			_ => {},
		}
	}

	Ok(patterns)
}

fn parse_hits(json: Value) -> Result<Vec<Hit>> {
	let Value::Object(mut body) = json else {
		return Err(Error::InvalidResponse {
			endpoint: "search".to_string(),
			message: "expected an object.".to_string(),
		});
	};
	let Some(Value::Array(hits)) = body.remove("hits") else {
		return Err(Error::InvalidResponse {
			endpoint: "search".to_string(),
			message: "hits array is missing.".to_string(),
		});
	};

	Ok(hits
		.into_iter()
		.filter_map(|hit| match hit {
			Value::Object(map) => Some(map),
			_ => None,
		})
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn escapes_filter_values() {
		assert_eq!(exact_filter("email", "a@x.com"), r#"email = "a@x.com""#);
		assert_eq!(exact_filter("username", r#"say "hi"\"#), r#"username = "say \"hi\"\\""#);
	}

	#[test]
	fn reads_plain_and_granular_filterable_attributes() {
		let json = serde_json::json!([
			"email",
			{ "attributePatterns": ["phone", "user*"], "features": { "facetSearch": false } },
			7
		]);
		let patterns = parse_filterable_attributes(&json).expect("parse failed");

		assert_eq!(patterns, vec!["email", "phone", "user*"]);
	}

	#[test]
	fn matches_wildcard_patterns() {
		assert!(attribute_matches("*", "phone"));
		assert!(attribute_matches("user*", "username"));
		assert!(attribute_matches("*_id", "account_id"));
		assert!(!attribute_matches("email", "phone"));
	}

	#[test]
	fn search_query_serializes_camel_case() {
		let json = serde_json::to_value(SearchQuery::full_text("ann lee", 200))
			.expect("Query must serialize.");

		assert_eq!(json, serde_json::json!({ "q": "ann lee", "limit": 200, "matchingStrategy": "all" }));
	}

	#[test]
	fn rejects_search_bodies_without_hits() {
		let err = parse_hits(serde_json::json!({ "message": "index not found" }))
			.expect_err("Expected missing hits error.");

		assert!(err.to_string().contains("hits array is missing."));
	}
}
