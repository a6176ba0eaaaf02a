use std::{fmt, str::FromStr};

use crate::record::IdentityField;

/// Semantic type assigned to a raw query. Every query maps to exactly one type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
	Username,
	Email,
	Phone,
	AccountId,
	Name,
}
impl QueryType {
	pub const ALL: [Self; 5] =
		[Self::Username, Self::Email, Self::Phone, Self::AccountId, Self::Name];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Username => "username",
			Self::Email => "email",
			Self::Phone => "phone",
			Self::AccountId => "account_id",
			Self::Name => "name",
		}
	}

	/// The record field a query of this type is matched against.
	pub fn target_field(self) -> IdentityField {
		match self {
			Self::Username => IdentityField::Username,
			Self::Email => IdentityField::Email,
			Self::Phone => IdentityField::Phone,
			Self::AccountId => IdentityField::AccountId,
			Self::Name => IdentityField::Name,
		}
	}
}
impl fmt::Display for QueryType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for QueryType {
	type Err = ParseQueryTypeError;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let lowered = raw.trim().to_ascii_lowercase();

		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str() == lowered)
			.ok_or_else(|| ParseQueryTypeError { value: raw.to_string() })
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown query type {value:?}; expected username, email, phone, account_id, or name.")]
pub struct ParseQueryTypeError {
	pub value: String,
}

/// Classifies a raw query. First matching rule wins; the fallback is [`QueryType::Name`].
pub fn classify(raw: &str) -> QueryType {
	let query = raw.trim().to_lowercase();

	if query.starts_with('@') {
		return QueryType::Username;
	}
	if let Some((_, domain)) = query.rsplit_once('@')
		&& domain.contains('.')
	{
		return QueryType::Email;
	}
	if strip_account_prefix(&query).is_some() {
		return QueryType::AccountId;
	}
	if is_all_digits(&query) && query.len() <= 10 {
		return QueryType::AccountId;
	}
	if normalize_phone(&query).len() >= 7 {
		return QueryType::Phone;
	}
	if query.contains('_') && !is_all_digits(&query) {
		return QueryType::Username;
	}

	QueryType::Name
}

/// Keeps only ASCII digits, in their original order.
pub fn normalize_phone(raw: &str) -> String {
	raw.chars().filter(char::is_ascii_digit).collect()
}

/// Canonical comparable form of `raw` when it is read as a value of `kind`.
///
/// The same form is sent to the index, compared against record fields, and used to remember
/// which queries were already dispatched.
pub fn canonical_value(kind: QueryType, raw: &str) -> String {
	let trimmed = raw.trim();

	match kind {
		QueryType::Phone => normalize_phone(trimmed),
		QueryType::Username => {
			let lowered = trimmed.to_lowercase();

			lowered.strip_prefix('@').unwrap_or(lowered.as_str()).trim().to_string()
		},
		QueryType::AccountId => {
			let lowered = trimmed.to_lowercase();

			strip_account_prefix(&lowered).unwrap_or(lowered.as_str()).to_string()
		},
		QueryType::Email | QueryType::Name => trimmed.to_lowercase(),
	}
}

fn strip_account_prefix(query: &str) -> Option<&str> {
	query.strip_prefix("id").filter(|rest| is_all_digits(rest))
}

fn is_all_digits(value: &str) -> bool {
	!value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}
