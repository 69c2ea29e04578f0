//! The `Reader` entity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Reader identifier (`readers.reader_num`).
///
/// Assigned by the database sequence on insert and never changed afterwards.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReaderId(pub i32);

impl ReaderId {
    pub fn new(value: i32) -> Self {
        ReaderId(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for ReaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ReaderId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i32>().map(ReaderId)
    }
}

/// A library reader.
///
/// The JSON shape keeps the historical field names of the public API:
/// `{"num": 1, "name": "...", "adress": "..." | null, "phone": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reader {
    /// Ignored on input; the database assigns it.
    #[serde(rename = "num", default)]
    pub id: ReaderId,
    pub name: String,
    #[serde(rename = "adress", default)]
    pub address: Option<String>,
    /// Kept as text so leading zeros and formatting survive.
    pub phone: String,
}

impl Reader {
    /// Create a reader that has not been stored yet.
    pub fn new(
        name: impl Into<String>,
        address: Option<impl Into<String>>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: ReaderId::default(),
            name: name.into(),
            address: address.map(Into::into),
            phone: phone.into(),
        }
    }

    /// Return a copy of this reader carrying `id`.
    pub fn with_id(mut self, id: ReaderId) -> Self {
        self.id = id;
        self
    }
}

impl fmt::Display for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reader #{}: {} (address: {}, phone: {})",
            self.id,
            self.name,
            self.address.as_deref().unwrap_or("-"),
            self.phone
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reader_serializes_with_api_field_names() {
        let reader = Reader::new("Vasya", Some("Mira 6"), "555").with_id(ReaderId(3));
        let value = serde_json::to_value(&reader).unwrap();
        assert_eq!(
            value,
            json!({"num": 3, "name": "Vasya", "adress": "Mira 6", "phone": "555"})
        );
    }

    #[test]
    fn test_missing_address_serializes_as_null() {
        let reader = Reader::new("Vasya", None::<String>, "555");
        let value = serde_json::to_value(&reader).unwrap();
        assert!(value["adress"].is_null());
    }

    #[test]
    fn test_deserialize_without_num_and_address() {
        let reader: Reader = serde_json::from_str(r#"{"name":"Petya","phone":"0123"}"#).unwrap();
        assert_eq!(reader.id, ReaderId(0));
        assert_eq!(reader.address, None);
        assert_eq!(reader.phone, "0123");
    }

    #[test]
    fn test_deserialize_requires_name() {
        let result: Result<Reader, _> = serde_json::from_str(r#"{"phone":"555"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_reader_id_from_str() {
        assert_eq!("42".parse::<ReaderId>().unwrap(), ReaderId(42));
        assert!("abc".parse::<ReaderId>().is_err());
        assert!("4.2".parse::<ReaderId>().is_err());
    }

    #[test]
    fn test_display_uses_dash_for_missing_address() {
        let reader = Reader::new("Vasya", None::<String>, "555").with_id(ReaderId(1));
        assert_eq!(reader.to_string(), "Reader #1: Vasya (address: -, phone: 555)");
    }
}
