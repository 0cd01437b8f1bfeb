//! Vehicle models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Opaque vehicle identifier.
///
/// The backend hands out numeric ids; they are kept as text and written back
/// as JSON numbers when they look numeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "RawId")]
pub struct VehicleId(String);

impl VehicleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VehicleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for VehicleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for VehicleId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<RawId> for VehicleId {
    fn from(raw: RawId) -> Self {
        Self(raw.into_string())
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for VehicleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_id(&self.0, serializer)
    }
}

/// Identifier as it appears on the wire: number or string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    pub fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

/// Write an id back as a JSON number when it is numeric.
pub(crate) fn serialize_id<S: Serializer>(id: &str, serializer: S) -> Result<S::Ok, S::Error> {
    match id.parse::<i64>() {
        Ok(n) => serializer.serialize_i64(n),
        Err(_) => serializer.serialize_str(id),
    }
}

/// Whether a vehicle can currently be selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Unavailable,
}

impl Availability {
    /// Normalize a backend status string. Only `available` is bookable.
    pub fn from_status(status: Option<&str>) -> Self {
        match status.map(|s| s.trim().to_lowercase()) {
            Some(s) if s == "available" => Availability::Available,
            _ => Availability::Unavailable,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rentable vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub daily_rate: Decimal,
    pub availability: Availability,
    pub category: Option<String>,
    pub image: Option<String>,
}

impl Vehicle {
    pub fn new(id: impl Into<VehicleId>, name: impl Into<String>, daily_rate: Decimal) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            daily_rate,
            availability: Availability::Available,
            category: None,
            image: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    pub fn is_bookable(&self) -> bool {
        self.availability == Availability::Available
    }
}

/// Browse filter: category tab plus free-text search on the name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleFilter {
    pub category: Option<String>,
    pub query: Option<String>,
}

impl VehicleFilter {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        let category_ok = match self.category.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(c) if c.eq_ignore_ascii_case("all") => true,
            Some(c) => vehicle
                .category
                .as_deref()
                .is_some_and(|vc| vc.eq_ignore_ascii_case(c)),
        };

        let query_ok = match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => vehicle.name.to_lowercase().contains(&q.to_lowercase()),
        };

        category_ok && query_ok
    }
}
