use serde_json::{Map, Value};

/// A document exactly as the record index returned it.
pub type RawRecord = Map<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentityField {
	Name,
	Username,
	Email,
	Phone,
	AccountId,
	Address,
	DateOfBirth,
	Country,
	ExtraInfo,
	Source,
}
impl IdentityField {
	pub const ALL: [Self; 10] = [
		Self::Name,
		Self::Username,
		Self::Email,
		Self::Phone,
		Self::AccountId,
		Self::Address,
		Self::DateOfBirth,
		Self::Country,
		Self::ExtraInfo,
		Self::Source,
	];
	/// Fields that link records into one identity, in key and expansion order.
	pub const IDENTITY: [Self; 3] = [Self::Email, Self::Phone, Self::Username];

	pub fn label(self) -> &'static str {
		match self {
			Self::Name => "Name",
			Self::Username => "Username",
			Self::Email => "Email",
			Self::Phone => "Phone",
			Self::AccountId => "Account ID",
			Self::Address => "Address",
			Self::DateOfBirth => "Date of Birth",
			Self::Country => "Country",
			Self::ExtraInfo => "Extra Info",
			Self::Source => "Source",
		}
	}

	/// Attribute name used by documents in the record index.
	pub fn index_attribute(self) -> &'static str {
		match self {
			Self::Name => "full_name",
			Self::Username => "username",
			Self::Email => "email",
			Self::Phone => "phone",
			Self::AccountId => "account_id",
			Self::Address => "address",
			Self::DateOfBirth => "DOB",
			Self::Country => "country",
			Self::ExtraInfo => "extra",
			Self::Source => "source",
		}
	}

	pub fn is_identity(self) -> bool {
		Self::IDENTITY.contains(&self)
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdentityRecord {
	#[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(rename = "Username", default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	#[serde(rename = "Email", default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(rename = "Phone", default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	#[serde(rename = "Account ID", default, skip_serializing_if = "Option::is_none")]
	pub account_id: Option<String>,
	#[serde(rename = "Address", default, skip_serializing_if = "Option::is_none")]
	pub address: Option<String>,
	#[serde(rename = "Date of Birth", default, skip_serializing_if = "Option::is_none")]
	pub date_of_birth: Option<String>,
	#[serde(rename = "Country", default, skip_serializing_if = "Option::is_none")]
	pub country: Option<String>,
	#[serde(rename = "Extra Info", default, skip_serializing_if = "Option::is_none")]
	pub extra_info: Option<String>,
	#[serde(rename = "Source", default, skip_serializing_if = "Option::is_none")]
	pub source: Option<String>,
}
impl IdentityRecord {
	/// Maps an index document onto the fixed field set. Unknown attributes are dropped.
	pub fn from_raw(raw: &RawRecord) -> Self {
		let mut record = Self::default();

		for field in IdentityField::ALL {
			if let Some(value) = raw.get(field.index_attribute()).and_then(stringify) {
				record.set(field, value);
			}
		}

		record
	}

	pub fn get(&self, field: IdentityField) -> Option<&str> {
		self.slot(field).as_deref()
	}

	/// Non-blank value of `field`, if any.
	pub fn present(&self, field: IdentityField) -> Option<&str> {
		self.get(field).filter(|value| !value.trim().is_empty())
	}

	pub fn set(&mut self, field: IdentityField, value: impl Into<String>) {
		*self.slot_mut(field) = Some(value.into());
	}

	pub fn clear(&mut self, field: IdentityField) {
		*self.slot_mut(field) = None;
	}

	pub fn with(mut self, field: IdentityField, value: impl Into<String>) -> Self {
		self.set(field, value);

		self
	}

	pub fn is_empty(&self) -> bool {
		IdentityField::ALL.into_iter().all(|field| self.present(field).is_none())
	}

	fn slot(&self, field: IdentityField) -> &Option<String> {
		match field {
			IdentityField::Name => &self.name,
			IdentityField::Username => &self.username,
			IdentityField::Email => &self.email,
			IdentityField::Phone => &self.phone,
			IdentityField::AccountId => &self.account_id,
			IdentityField::Address => &self.address,
			IdentityField::DateOfBirth => &self.date_of_birth,
			IdentityField::Country => &self.country,
			IdentityField::ExtraInfo => &self.extra_info,
			IdentityField::Source => &self.source,
		}
	}

	fn slot_mut(&mut self, field: IdentityField) -> &mut Option<String> {
		match field {
			IdentityField::Name => &mut self.name,
			IdentityField::Username => &mut self.username,
			IdentityField::Email => &mut self.email,
			IdentityField::Phone => &mut self.phone,
			IdentityField::AccountId => &mut self.account_id,
			IdentityField::Address => &mut self.address,
			IdentityField::DateOfBirth => &mut self.date_of_birth,
			IdentityField::Country => &mut self.country,
			IdentityField::ExtraInfo => &mut self.extra_info,
			IdentityField::Source => &mut self.source,
		}
	}
}

fn stringify(value: &Value) -> Option<String> {
	let text = match value {
		Value::Null => return None,
		Value::String(text) => text.clone(),
		Value::Bool(flag) => flag.to_string(),
		Value::Number(number) => number.to_string(),
		Value::Array(_) | Value::Object(_) => value.to_string(),
	};

	if text.trim().is_empty() { None } else { Some(text) }
}
