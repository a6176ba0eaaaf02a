use std::collections::{HashMap, HashSet};

use futures::future;
use tokio::sync::Semaphore;
use uuid::Uuid;

use idcrawl_config::Crawl;
use idcrawl_domain::{
	IdentityKey, canonical_value, expansion_candidates, identity_key, merge_records, seed_record,
};

use crate::{Error, IdentityRecord, IdentityService, QueryType, SearchOutcome, classify};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct DeepSearchRequest {
	pub query: String,
	/// Classified from `query` when absent.
	pub query_type: Option<QueryType>,
	pub max_depth: Option<u32>,
	pub max_queries: Option<u32>,
	pub max_per_hit: Option<u32>,
	pub concurrency: Option<usize>,
}
impl DeepSearchRequest {
	pub fn new(query: impl Into<String>) -> Self {
		Self { query: query.into(), ..Default::default() }
	}
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AggregateOutcome {
	pub crawl_id: Uuid,
	pub success: bool,
	pub query: String,
	pub query_type: QueryType,
	pub max_depth: u32,
	pub results_found: bool,
	pub count: usize,
	pub queries_dispatched: u32,
	pub records: Vec<IdentityRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Budgets {
	max_depth: u32,
	max_queries: u32,
	max_per_hit: u32,
	concurrency: usize,
}
impl Budgets {
	fn resolve(req: &DeepSearchRequest, defaults: &Crawl) -> Self {
		Self {
			max_depth: req.max_depth.unwrap_or(defaults.max_depth),
			max_queries: req.max_queries.unwrap_or(defaults.max_queries),
			max_per_hit: req.max_per_hit.unwrap_or(defaults.max_per_hit),
			concurrency: req.concurrency.unwrap_or(defaults.concurrency).max(1),
		}
	}
}

/// One pending single-hop search.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FrontierEntry {
	value: String,
	query_type: QueryType,
	depth: u32,
}
impl FrontierEntry {
	fn seen_key(&self) -> (QueryType, String) {
		(self.query_type, canonical_value(self.query_type, &self.value))
	}
}

/// Records keyed by identity, kept in first-insertion order.
#[derive(Debug, Default)]
struct Aggregate {
	positions: HashMap<IdentityKey, usize>,
	records: Vec<IdentityRecord>,
}
impl Aggregate {
	fn absorb(&mut self, record: &IdentityRecord) {
		let key = identity_key(record);

		match self.positions.get(&key) {
			Some(&position) => {
				merge_records(&mut self.records[position], record);
			},
			None => {
				self.positions.insert(key, self.records.len());
				self.records.push(seed_record(record));
			},
		}
	}

	fn into_records(self) -> Vec<IdentityRecord> {
		self.records
	}
}

impl IdentityService {
	/// Breadth-first crawl from `req.query` through the Email, Phone and Username fields of
	/// every hit, one hop-depth layer at a time.
	///
	/// Each layer is gathered completely before its outcomes are merged, so the aggregate is
	/// written by one task only. The gate bounds in-flight searches for the whole crawl.
	pub async fn deep_search(&self, req: DeepSearchRequest) -> AggregateOutcome {
		let budgets = Budgets::resolve(&req, &self.cfg.crawl);
		let query_type = req.query_type.unwrap_or_else(|| classify(&req.query));
		let crawl_id = Uuid::new_v4();
		let gate = Semaphore::new(budgets.concurrency);
		let mut frontier =
			vec![FrontierEntry { value: req.query.clone(), query_type, depth: 0 }];
		let mut cursor = 0;
		let mut seen = HashSet::new();
		let mut dispatched = 0_u32;
		let mut aggregate = Aggregate::default();

		while cursor < frontier.len() {
			let depth = frontier[cursor].depth;

			if depth > budgets.max_depth {
				break;
			}

			let layer_end = frontier[cursor..]
				.iter()
				.position(|entry| entry.depth != depth)
				.map_or(frontier.len(), |offset| cursor + offset);
			let mut batch = Vec::new();

			for entry in &frontier[cursor..layer_end] {
				if dispatched >= budgets.max_queries {
					break;
				}

				let key = entry.seen_key();

				if key.1.is_empty() || !seen.insert(key) {
					continue;
				}

				dispatched += 1;

				batch.push(entry.clone());
			}

			cursor = layer_end;

			tracing::debug!(
				crawl_id = %crawl_id,
				depth,
				layer = batch.len(),
				frontier = frontier.len() - cursor,
				dispatched,
				"Dispatching crawl layer."
			);

			let outcomes =
				future::join_all(batch.iter().map(|entry| self.dispatch(&gate, entry))).await;
			let succeeded: Vec<&SearchOutcome> =
				outcomes.iter().filter(|outcome| outcome.success).collect();

			for outcome in &succeeded {
				for record in &outcome.records {
					aggregate.absorb(record);
				}
			}

			if depth < budgets.max_depth && dispatched < budgets.max_queries {
				for outcome in &succeeded {
					for record in &outcome.records {
						frontier.extend(expand(record, depth + 1, budgets.max_per_hit, &seen));
					}
				}
			}

			if dispatched >= budgets.max_queries {
				break;
			}
		}

		let records = aggregate.into_records();

		tracing::info!(
			crawl_id = %crawl_id,
			query_type = %query_type,
			count = records.len(),
			queries = dispatched,
			"Deep search completed."
		);

		AggregateOutcome {
			crawl_id,
			success: true,
			query: req.query,
			query_type,
			max_depth: budgets.max_depth,
			results_found: !records.is_empty(),
			count: records.len(),
			queries_dispatched: dispatched,
			records,
		}
	}

	async fn dispatch(&self, gate: &Semaphore, entry: &FrontierEntry) -> SearchOutcome {
		let _permit = match gate.acquire().await {
			Ok(permit) => permit,
			Err(err) => {
				let err = Error::BackendUnavailable { message: err.to_string() };

				return SearchOutcome::unavailable(&entry.value, entry.query_type, &err, Vec::new());
			},
		};

		self.search(&entry.value, entry.query_type).await
	}
}

/// Follow-up entries for one hit, capped at `max_per_hit` for that hit alone.
fn expand(
	record: &IdentityRecord,
	depth: u32,
	max_per_hit: u32,
	seen: &HashSet<(QueryType, String)>,
) -> Vec<FrontierEntry> {
	let mut entries = Vec::new();

	for (query_type, value) in expansion_candidates(record) {
		if entries.len() >= max_per_hit as usize {
			break;
		}

		let key = (query_type, canonical_value(query_type, value));

		// Values such as "n/a" phones have no canonical form and are not identifiers.
		if key.1.is_empty() || seen.contains(&key) {
			continue;
		}

		entries.push(FrontierEntry { value: value.to_string(), query_type, depth });
	}

	entries
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::IdentityField;

	fn hit() -> IdentityRecord {
		IdentityRecord::default()
			.with(IdentityField::Email, "neo@matrix.io")
			.with(IdentityField::Phone, "+1 555 0100")
			.with(IdentityField::Username, "neo")
	}

	#[test]
	fn expansion_respects_per_hit_cap() {
		let entries = expand(&hit(), 1, 2, &HashSet::new());

		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0].query_type, QueryType::Email);
		assert_eq!(entries[1].query_type, QueryType::Phone);
		assert!(entries.iter().all(|entry| entry.depth == 1));
	}

	#[test]
	fn expansion_skips_seen_queries() {
		let seen = HashSet::from([
			(QueryType::Email, "neo@matrix.io".to_string()),
			(QueryType::Phone, "15550100".to_string()),
		]);
		let entries = expand(&hit(), 3, 5, &seen);

		assert_eq!(
			entries,
			vec![FrontierEntry { value: "neo".to_string(), query_type: QueryType::Username, depth: 3 }]
		);
	}

	#[test]
	fn expansion_skips_values_without_a_canonical_form() {
		let record = IdentityRecord::default()
			.with(IdentityField::Phone, "n/a")
			.with(IdentityField::Username, "@");
		let with_email = record.clone().with(IdentityField::Email, "neo@matrix.io");

		assert!(expand(&record, 1, 5, &HashSet::new()).is_empty());
		assert_eq!(expand(&with_email, 1, 1, &HashSet::new())[0].query_type, QueryType::Email);
	}

	#[test]
	fn aggregate_merges_by_identity_key() {
		let mut aggregate = Aggregate::default();

		aggregate.absorb(&IdentityRecord::default().with(IdentityField::Email, " a@x.com "));
		aggregate.absorb(
			&IdentityRecord::default()
				.with(IdentityField::Email, "A@X.COM")
				.with(IdentityField::Country, "US"),
		);
		aggregate.absorb(&IdentityRecord::default().with(IdentityField::Username, "other"));

		let records = aggregate.into_records();

		assert_eq!(records.len(), 2);
		assert_eq!(records[0].get(IdentityField::Email), Some("a@x.com"));
		assert_eq!(records[0].get(IdentityField::Country), Some("US"));
	}

	#[test]
	fn zero_concurrency_still_admits_one_search() {
		let defaults = Crawl { max_depth: 2, max_queries: 3, max_per_hit: 4, concurrency: 5 };
		let req = DeepSearchRequest { concurrency: Some(0), ..DeepSearchRequest::new("neo") };
		let budgets = Budgets::resolve(&req, &defaults);

		assert_eq!(
			budgets,
			Budgets { max_depth: 2, max_queries: 3, max_per_hit: 4, concurrency: 1 }
		);
	}
}
