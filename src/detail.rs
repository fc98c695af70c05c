//! Dynamic item payloads and the field sets used to check refiner chains.

use std::collections::BTreeSet;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended, string-keyed payload attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Detail(Map<String, Value>);

impl Detail {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder form of [`Detail::insert`].
	#[must_use]
	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(key, value);
		self
	}

	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
		self.0.insert(key.into(), value.into())
	}

	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.0.remove(key)
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	#[must_use]
	pub fn get_str(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(Value::as_str)
	}

	#[must_use]
	pub fn get_u64(&self, key: &str) -> Option<u64> {
		self.0.get(key).and_then(Value::as_u64)
	}

	/// Deserialize a single field into `T`, returning `None` on absence or mismatch.
	#[must_use]
	pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
		self.0
			.get(key)
			.and_then(|value| serde_json::from_value(value.clone()).ok())
	}

	#[must_use]
	pub fn contains(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Field names currently present on this payload.
	#[must_use]
	pub fn shape(&self) -> Shape {
		Shape::of(self.keys())
	}

	/// Capture a serializable struct as a dynamic payload.
	pub fn from_typed<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
		match serde_json::to_value(value)? {
			Value::Object(map) => Ok(Self(map)),
			other => Err(serde_json::Error::custom(format!(
				"detail must serialize to a map, got {other}"
			))),
		}
	}

	/// Reinterpret the payload as a concrete struct.
	pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, serde_json::Error> {
		serde_json::from_value(Value::Object(self.0))
	}
}

impl FromIterator<(String, Value)> for Detail {
	fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

/// Set of detail field names a stage reads or adds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shape(BTreeSet<String>);

impl Shape {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn of<I, S>(fields: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(fields.into_iter().map(Into::into).collect())
	}

	#[must_use]
	pub fn contains(&self, field: &str) -> bool {
		self.0.contains(field)
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Fields of `self` that `available` lacks, in sorted order.
	#[must_use]
	pub fn missing(&self, available: &Shape) -> Vec<String> {
		self.0.difference(&available.0).cloned().collect()
	}

	/// Fields of `self` that the payload lacks, in sorted order.
	#[must_use]
	pub fn missing_from(&self, detail: &Detail) -> Vec<String> {
		self.0
			.iter()
			.filter(|field| !detail.contains(field))
			.cloned()
			.collect()
	}

	#[must_use]
	pub fn union(&self, other: &Shape) -> Shape {
		Self(self.0.union(&other.0).cloned().collect())
	}

	/// Fields of `self` not present in `other`.
	#[must_use]
	pub fn difference(&self, other: &Shape) -> Shape {
		Self(self.0.difference(&other.0).cloned().collect())
	}

	pub fn extend(&mut self, other: &Shape) {
		self.0.extend(other.0.iter().cloned());
	}
}

impl fmt::Display for Shape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{{")?;
		for (index, field) in self.0.iter().enumerate() {
			if index > 0 {
				write!(f, ", ")?;
			}
			write!(f, "{field}")?;
		}
		write!(f, "}}")
	}
}
