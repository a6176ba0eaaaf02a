use std::fmt;

use crate::{
	query::{QueryType, canonical_value},
	record::{IdentityField, IdentityRecord},
};

const KEY_SEPARATOR: &str = "|";

/// Composite key deciding whether two records describe the same identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);
impl IdentityKey {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl fmt::Display for IdentityKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Builds the key from Email, Phone and Username, in that order. Absent parts are skipped.
/// Records with none of the three fall back to their full normalized contents.
pub fn identity_key(record: &IdentityRecord) -> IdentityKey {
	let parts: Vec<String> = IdentityField::IDENTITY
		.into_iter()
		.filter_map(|field| record.present(field).map(|value| key_part(field, value)))
		.filter(|part| !part.is_empty())
		.collect();

	if !parts.is_empty() {
		return IdentityKey(parts.join(KEY_SEPARATOR));
	}

	let full = IdentityField::ALL
		.into_iter()
		.filter_map(|field| record.present(field).map(|value| format!("{}={value}", field.label())))
		.collect::<Vec<_>>()
		.join(";");

	IdentityKey(full.trim().to_lowercase())
}

/// Copy of `record` as it enters an aggregate: identity fields are trimmed.
pub fn seed_record(record: &IdentityRecord) -> IdentityRecord {
	let mut seeded = record.clone();

	for field in IdentityField::IDENTITY {
		if let Some(value) = record.get(field) {
			let trimmed = value.trim();

			if trimmed.is_empty() {
				seeded.clear(field);
			} else {
				seeded.set(field, trimmed);
			}
		}
	}

	seeded
}

/// Fills every field that is empty in `existing` from `incoming`. Existing values are never
/// overwritten. Returns whether anything changed.
pub fn merge_records(existing: &mut IdentityRecord, incoming: &IdentityRecord) -> bool {
	let mut changed = false;

	for field in IdentityField::ALL {
		if existing.present(field).is_some() {
			continue;
		}

		let Some(value) = incoming.present(field) else {
			continue;
		};
		let value = if field.is_identity() { value.trim() } else { value };

		existing.set(field, value);

		changed = true;
	}

	changed
}

/// Candidate follow-up queries exposed by `record`, in Email, Phone, Username order.
pub fn expansion_candidates(record: &IdentityRecord) -> impl Iterator<Item = (QueryType, &str)> {
	IdentityField::IDENTITY
		.into_iter()
		.filter_map(move |field| record.present(field).map(|value| (identity_query(field), value.trim())))
}

/// Query type that searches an identity field.
fn identity_query(field: IdentityField) -> QueryType {
	match field {
		IdentityField::Email => QueryType::Email,
		IdentityField::Phone => QueryType::Phone,
		_ => QueryType::Username,
	}
}

fn key_part(field: IdentityField, value: &str) -> String {
	canonical_value(identity_query(field), value)
}
