mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Crawl, Index, Search, Service};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.index.url.trim().is_empty() {
		return Err(Error::Validation { message: "index.url must be non-empty.".to_string() });
	}

	for (label, value) in [
		("index.timeout_ms", cfg.index.timeout_ms),
		("index.health_timeout_ms", cfg.index.health_timeout_ms),
		("index.page_size", u64::from(cfg.index.page_size)),
		("search.full_text_limit", u64::from(cfg.search.full_text_limit)),
		("search.exact_limit", u64::from(cfg.search.exact_limit)),
		("search.scan_limit", u64::from(cfg.search.scan_limit)),
		("search.collection_concurrency", cfg.search.collection_concurrency as u64),
		("crawl.max_queries", u64::from(cfg.crawl.max_queries)),
		("crawl.max_per_hit", u64::from(cfg.crawl.max_per_hit)),
		("crawl.concurrency", cfg.crawl.concurrency as u64),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	for (key, value) in &cfg.index.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("index.default_headers.{key} must be a string."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.index.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.index.api_key = None;
	}

	let trimmed = cfg.index.url.trim().trim_end_matches('/');

	if trimmed.len() != cfg.index.url.len() {
		cfg.index.url = trimmed.to_string();
	}
}
