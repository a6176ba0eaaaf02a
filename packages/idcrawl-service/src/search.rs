use futures::stream::{self, StreamExt};
use idcrawl_domain::canonical_value;

use crate::{Error, IdentityRecord, IdentityService, QueryType};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchOutcome {
	pub success: bool,
	pub query: String,
	pub query_type: QueryType,
	pub results_found: bool,
	pub count: usize,
	pub records: Vec<IdentityRecord>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	/// Collections that failed and were left out of `records`.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub failed_collections: Vec<String>,
}
impl SearchOutcome {
	fn found(
		query: &str,
		query_type: QueryType,
		records: Vec<IdentityRecord>,
		failed_collections: Vec<String>,
	) -> Self {
		Self {
			success: true,
			query: query.to_string(),
			query_type,
			results_found: !records.is_empty(),
			count: records.len(),
			records,
			error: None,
			failed_collections,
		}
	}

	pub(crate) fn unavailable(
		query: &str,
		query_type: QueryType,
		err: &Error,
		failed_collections: Vec<String>,
	) -> Self {
		Self {
			success: false,
			query: query.to_string(),
			query_type,
			results_found: false,
			count: 0,
			records: Vec::new(),
			error: Some(err.to_string()),
			failed_collections,
		}
	}
}

impl IdentityService {
	/// Runs one hop: queries every collection for `value` read as `query_type`.
	///
	/// A collection that fails is logged and skipped. The outcome only reports failure when
	/// collections cannot be listed or every listed collection failed.
	pub async fn search(&self, value: &str, query_type: QueryType) -> SearchOutcome {
		let canonical = canonical_value(query_type, value);

		if canonical.is_empty() {
			return SearchOutcome::found(value, query_type, Vec::new(), Vec::new());
		}

		let collections = match self.backend.index.list_collections().await {
			Ok(collections) => collections,
			Err(err) => {
				let err = Error::from(err);

				tracing::error!(error = %err, query_type = %query_type, "Search aborted.");

				return SearchOutcome::unavailable(value, query_type, &err, Vec::new());
			},
		};
		let width = self.cfg.search.collection_concurrency.max(1);
		let per_collection: Vec<(&String, crate::Result<Vec<IdentityRecord>>)> =
			stream::iter(collections.iter())
				.map(|collection| {
					let canonical = canonical.as_str();

					async move {
						(collection, self.search_collection(collection, query_type, canonical).await)
					}
				})
				.buffered(width)
				.collect()
				.await;
		let mut records = Vec::new();
		let mut failed = Vec::new();

		for (collection, result) in per_collection {
			match result {
				Ok(found) => records.extend(found),
				Err(err) => {
					tracing::warn!(collection = %collection, error = %err, "Collection search failed.");

					failed.push(collection.clone());
				},
			}
		}

		if !collections.is_empty() && failed.len() == collections.len() {
			let err = Error::BackendUnavailable {
				message: format!("all {} collections failed", collections.len()),
			};

			tracing::error!(error = %err, query_type = %query_type, "Search failed.");

			return SearchOutcome::unavailable(value, query_type, &err, failed);
		}

		records.sort_by_key(|record| !is_exact_match(record, query_type, &canonical));

		tracing::info!(
			query_type = %query_type,
			count = records.len(),
			failed = failed.len(),
			"Search completed."
		);

		SearchOutcome::found(value, query_type, records, failed)
	}

	async fn search_collection(
		&self,
		collection: &str,
		query_type: QueryType,
		canonical: &str,
	) -> crate::Result<Vec<IdentityRecord>> {
		self.query_collection(collection, query_type, canonical).await.map_err(|err| {
			Error::PartialCollection { collection: collection.to_string(), message: err.to_string() }
		})
	}

	async fn query_collection(
		&self,
		collection: &str,
		query_type: QueryType,
		canonical: &str,
	) -> color_eyre::Result<Vec<IdentityRecord>> {
		let index = &self.backend.index;
		let limits = &self.cfg.search;

		if query_type == QueryType::Name {
			let hits = index.query_full_text(collection, canonical, limits.full_text_limit).await?;

			return Ok(hits.iter().map(IdentityRecord::from_raw).collect());
		}

		let attribute = query_type.target_field().index_attribute();

		if index.is_field_filterable(collection, attribute).await? {
			let hits = index.query_exact(collection, attribute, canonical, limits.exact_limit).await?;

			return Ok(hits.iter().map(IdentityRecord::from_raw).collect());
		}

		// Not every collection can filter on every field; scan and compare locally instead.
		let hits = index.query_scan(collection, limits.scan_limit).await?;

		Ok(hits
			.iter()
			.map(IdentityRecord::from_raw)
			.filter(|record| is_exact_match(record, query_type, canonical))
			.collect())
	}
}

/// Whether the field targeted by `query_type` equals the canonical query value.
pub fn is_exact_match(record: &IdentityRecord, query_type: QueryType, canonical: &str) -> bool {
	record
		.present(query_type.target_field())
		.map(|value| canonical_value(query_type, value) == canonical)
		.unwrap_or(false)
}
