//! Behaviour shared by every directory record.
//!
//! Stores, search and the HTTP handlers are generic over [`DirectoryRecord`], so farmers and
//! distributors flow through the same code paths.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;
use crate::search::Coordinates;

/// Which side of the marketplace a user (or a collection) belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Farmer,
    Distributor,
}

impl Role {
    /// Resource name used in URLs.
    pub fn collection(&self) -> &'static str {
        match self {
            Role::Farmer => "farmers",
            Role::Distributor => "distributors",
        }
    }

    /// Storage key of the collection document.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Role::Farmer => "farmers_data",
            Role::Distributor => "distributors_data",
        }
    }

    /// Human-readable singular label.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Farmer => "Farmer",
            Role::Distributor => "Distributor",
        }
    }

    /// The role whose directory this role searches.
    pub fn opposite(&self) -> Role {
        match self {
            Role::Farmer => Role::Distributor,
            Role::Distributor => Role::Farmer,
        }
    }

    /// Front-end route of the role's dashboard.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Farmer => "/farmer/dashboard",
            Role::Distributor => "/distributor/dashboard",
        }
    }
}

/// Input validation for request bodies.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// A profile stored in one of the directory collections.
pub trait DirectoryRecord:
    Clone + std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Fields supplied on creation (everything but the id).
    type Create: Clone
        + std::fmt::Debug
        + Serialize
        + DeserializeOwned
        + Validate
        + Send
        + Sync
        + 'static;
    /// Partial update; every field optional, `None` keeps the stored value.
    type Update: Clone
        + std::fmt::Debug
        + Default
        + Serialize
        + DeserializeOwned
        + Validate
        + Send
        + Sync
        + 'static;

    const ROLE: Role;

    /// Build a record from a create request and a store-assigned id.
    fn from_request(id: i64, request: Self::Create) -> Self;

    /// Shallow merge: every field present in `update` replaces the stored one.
    /// The id is never touched.
    fn apply_update(&mut self, update: Self::Update);

    /// An update that only replaces the crop list.
    fn crops_update(crops: Vec<String>) -> Self::Update;

    fn id(&self) -> i64;
    fn name(&self) -> &str;
    fn location(&self) -> &str;
    fn crops(&self) -> &[String];
    fn latitude(&self) -> Option<f64>;
    fn longitude(&self) -> Option<f64>;

    /// Coordinates, when both halves are present and finite.
    fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude(), self.longitude())
    }
}

/// Reject a missing or blank required field.
pub(crate) fn require_text(value: &str, label: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", label)));
    }
    Ok(())
}

/// Reject an update that would blank out a required field.
pub(crate) fn reject_blank(value: Option<&String>, label: &str) -> Result<(), AppError> {
    match value {
        Some(v) => require_text(v, label),
        None => Ok(()),
    }
}

/// Reject coordinates outside [-90, 90] latitude / [-180, 180] longitude.
pub(crate) fn check_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(), AppError> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::Validation(format!(
                "Latitude {} is out of range (-90 to 90)",
                lat
            )));
        }
    }
    if let Some(lon) = longitude {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(AppError::Validation(format!(
                "Longitude {} is out of range (-180 to 180)",
                lon
            )));
        }
    }
    Ok(())
}

/// For `Option<Option<T>>` fields with `#[serde(default)]`: an absent field stays `None`,
/// an explicit `null` becomes `Some(None)`.
pub fn deserialize_nullable<'de, T, D>(
    deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
