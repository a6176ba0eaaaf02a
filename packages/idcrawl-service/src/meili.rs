use std::{
	collections::HashMap,
	sync::Mutex,
	time::{Duration, Instant},
};

use idcrawl_providers::meilisearch::{self, MeiliClient, SearchQuery};

use crate::{BoxFuture, HealthProbe, RawRecord, RecordIndex, Result};

/// [`RecordIndex`] over Meilisearch, where collections are indexes.
pub struct MeiliIndex {
	client: MeiliClient,
	filterable_ttl: Duration,
	filterable: Mutex<HashMap<String, (Instant, Vec<String>)>>,
}
impl MeiliIndex {
	pub fn new(cfg: &idcrawl_config::Index) -> Result<Self> {
		Ok(Self::with_client(MeiliClient::new(cfg)?, Duration::from_millis(cfg.filterable_cache_ttl_ms)))
	}

	pub fn with_client(client: MeiliClient, filterable_ttl: Duration) -> Self {
		Self { client, filterable_ttl, filterable: Mutex::new(HashMap::new()) }
	}

	pub fn client(&self) -> &MeiliClient {
		&self.client
	}

	async fn filterable_patterns(&self, collection: &str) -> color_eyre::Result<Vec<String>> {
		if let Some(patterns) = self.cached_patterns(collection) {
			return Ok(patterns);
		}

		let patterns = self.client.filterable_attributes(collection).await?;
		let mut cache = self.filterable.lock().unwrap_or_else(|err| err.into_inner());

		cache.insert(collection.to_string(), (Instant::now(), patterns.clone()));

		Ok(patterns)
	}

	fn cached_patterns(&self, collection: &str) -> Option<Vec<String>> {
		let cache = self.filterable.lock().unwrap_or_else(|err| err.into_inner());
		let (fetched_at, patterns) = cache.get(collection)?;

		(fetched_at.elapsed() < self.filterable_ttl).then(|| patterns.clone())
	}
}

impl RecordIndex for MeiliIndex {
	fn list_collections(&self) -> BoxFuture<'_, color_eyre::Result<Vec<String>>> {
		Box::pin(async move { Ok(self.client.list_indexes().await?) })
	}

	fn is_field_filterable<'a>(
		&'a self,
		collection: &'a str,
		field: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<bool>> {
		Box::pin(async move {
			let patterns = self.filterable_patterns(collection).await?;

			Ok(patterns.iter().any(|pattern| meilisearch::attribute_matches(pattern, field)))
		})
	}

	fn query_exact<'a>(
		&'a self,
		collection: &'a str,
		field: &'a str,
		value: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RawRecord>>> {
		Box::pin(async move {
			Ok(self.client.search(collection, &SearchQuery::exact(field, value, limit)).await?)
		})
	}

	fn query_full_text<'a>(
		&'a self,
		collection: &'a str,
		text: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RawRecord>>> {
		Box::pin(async move {
			Ok(self.client.search(collection, &SearchQuery::full_text(text, limit)).await?)
		})
	}

	fn query_scan<'a>(
		&'a self,
		collection: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RawRecord>>> {
		Box::pin(async move { Ok(self.client.search(collection, &SearchQuery::scan(limit)).await?) })
	}
}

impl HealthProbe for MeiliIndex {
	fn is_online(&self) -> BoxFuture<'_, bool> {
		Box::pin(self.client.is_healthy())
	}
}
