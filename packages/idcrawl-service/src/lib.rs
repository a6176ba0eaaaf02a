pub mod crawl;
pub mod meili;
pub mod search;

mod error;

pub use color_eyre;
pub use crawl::{AggregateOutcome, DeepSearchRequest};
pub use error::{Error, Result};
pub use idcrawl_domain::{IdentityField, IdentityRecord, QueryType, RawRecord, classify};
pub use meili::MeiliIndex;
pub use search::SearchOutcome;

use std::{future::Future, pin::Pin, sync::Arc};

use idcrawl_config::Config;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Read-only view of the record index. Every call is scoped to one collection so a failing
/// collection never affects the others.
pub trait RecordIndex
where
	Self: Send + Sync,
{
	fn list_collections(&self) -> BoxFuture<'_, color_eyre::Result<Vec<String>>>;

	fn is_field_filterable<'a>(
		&'a self,
		collection: &'a str,
		field: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<bool>>;

	fn query_exact<'a>(
		&'a self,
		collection: &'a str,
		field: &'a str,
		value: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RawRecord>>>;

	fn query_full_text<'a>(
		&'a self,
		collection: &'a str,
		text: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RawRecord>>>;

	fn query_scan<'a>(
		&'a self,
		collection: &'a str,
		limit: u32,
	) -> BoxFuture<'a, color_eyre::Result<Vec<RawRecord>>>;
}

pub trait HealthProbe
where
	Self: Send + Sync,
{
	fn is_online(&self) -> BoxFuture<'_, bool>;
}

#[derive(Clone)]
pub struct Backend {
	pub index: Arc<dyn RecordIndex>,
	pub health: Arc<dyn HealthProbe>,
}
impl Backend {
	pub fn new(index: Arc<dyn RecordIndex>, health: Arc<dyn HealthProbe>) -> Self {
		Self { index, health }
	}

	/// Meilisearch-backed index and health probe sharing one HTTP client.
	pub fn meilisearch(cfg: &idcrawl_config::Index) -> Result<Self> {
		let index = Arc::new(MeiliIndex::new(cfg)?);

		Ok(Self { index: index.clone(), health: index })
	}
}

pub struct IdentityService {
	pub cfg: Config,
	pub backend: Backend,
}
impl IdentityService {
	pub fn new(cfg: Config) -> Result<Self> {
		let backend = Backend::meilisearch(&cfg.index)?;

		Ok(Self { cfg, backend })
	}

	pub fn with_backend(cfg: Config, backend: Backend) -> Self {
		Self { cfg, backend }
	}

	pub async fn is_online(&self) -> bool {
		self.backend.health.is_online().await
	}
}
