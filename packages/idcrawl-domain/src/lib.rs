pub mod identity;
pub mod query;
pub mod record;

pub use identity::{IdentityKey, expansion_candidates, identity_key, merge_records, seed_record};
pub use query::{ParseQueryTypeError, QueryType, canonical_value, classify, normalize_phone};
pub use record::{IdentityField, IdentityRecord, RawRecord};
