use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub index: Index,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub crawl: Crawl,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

/// Connection settings for the Meilisearch record index.
#[derive(Debug, Clone, Deserialize)]
pub struct Index {
	pub url: String,
	/// Optional. Blank keys are normalized to `None`.
	#[serde(default)]
	pub api_key: Option<String>,
	pub timeout_ms: u64,
	#[serde(default = "default_health_timeout_ms")]
	pub health_timeout_ms: u64,
	/// Page size used when listing collections.
	#[serde(default = "default_page_size")]
	pub page_size: u32,
	/// How long a collection's filterable attribute set is reused before it is fetched again.
	#[serde(default = "default_filterable_cache_ttl_ms")]
	pub filterable_cache_ttl_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Per-collection limits for a single-hop search.
#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_full_text_limit")]
	pub full_text_limit: u32,
	#[serde(default = "default_exact_limit")]
	pub exact_limit: u32,
	#[serde(default = "default_scan_limit")]
	pub scan_limit: u32,
	/// Number of collections queried at once by one single-hop search.
	#[serde(default = "default_collection_concurrency")]
	pub collection_concurrency: usize,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			full_text_limit: default_full_text_limit(),
			exact_limit: default_exact_limit(),
			scan_limit: default_scan_limit(),
			collection_concurrency: default_collection_concurrency(),
		}
	}
}

/// Default budgets for a deep search. Requests may override each one.
#[derive(Debug, Clone, Deserialize)]
pub struct Crawl {
	#[serde(default = "default_budget")]
	pub max_depth: u32,
	#[serde(default = "default_budget")]
	pub max_queries: u32,
	#[serde(default = "default_budget")]
	pub max_per_hit: u32,
	#[serde(default = "default_crawl_concurrency")]
	pub concurrency: usize,
}
impl Default for Crawl {
	fn default() -> Self {
		Self {
			max_depth: default_budget(),
			max_queries: default_budget(),
			max_per_hit: default_budget(),
			concurrency: default_crawl_concurrency(),
		}
	}
}

fn default_health_timeout_ms() -> u64 {
	2_000
}

fn default_page_size() -> u32 {
	1_000
}

fn default_filterable_cache_ttl_ms() -> u64 {
	60_000
}

fn default_full_text_limit() -> u32 {
	200
}

fn default_exact_limit() -> u32 {
	100
}

fn default_scan_limit() -> u32 {
	200
}

fn default_collection_concurrency() -> usize {
	8
}

fn default_budget() -> u32 {
	5
}

fn default_crawl_concurrency() -> usize {
	5
}
