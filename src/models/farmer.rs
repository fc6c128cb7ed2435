//! Farmer model matching the frontend Farmer interface.

use serde::{Deserialize, Serialize};

use super::record::{
    check_coordinates, deserialize_nullable, reject_blank, require_text, DirectoryRecord, Role,
    Validate,
};
use crate::crops::validate_crops;
use crate::errors::AppError;

/// A farmer profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Farmer {
    pub id: i64,
    pub name: String,
    pub farm_name: String,
    pub contact: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub crops: Vec<String>,
}

/// Request body for creating a new farmer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateFarmerRequest {
    pub name: String,
    pub farm_name: String,
    pub contact: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub crops: Vec<String>,
}

/// Request body for updating an existing farmer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFarmerRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<Option<f64>>,
    #[serde(
        default,
        deserialize_with = "deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crops: Option<Vec<String>>,
}

impl Validate for CreateFarmerRequest {
    fn validate(&self) -> Result<(), AppError> {
        require_text(&self.name, "Name")?;
        require_text(&self.farm_name, "Farm name")?;
        require_text(&self.contact, "Contact")?;
        require_text(&self.location, "Location")?;
        check_coordinates(self.latitude, self.longitude)?;
        validate_crops(&self.crops)
    }
}

impl Validate for UpdateFarmerRequest {
    fn validate(&self) -> Result<(), AppError> {
        reject_blank(self.name.as_ref(), "Name")?;
        reject_blank(self.farm_name.as_ref(), "Farm name")?;
        reject_blank(self.contact.as_ref(), "Contact")?;
        reject_blank(self.location.as_ref(), "Location")?;
        check_coordinates(self.latitude.flatten(), self.longitude.flatten())?;
        match &self.crops {
            Some(crops) => validate_crops(crops),
            None => Ok(()),
        }
    }
}

impl DirectoryRecord for Farmer {
    type Create = CreateFarmerRequest;
    type Update = UpdateFarmerRequest;

    const ROLE: Role = Role::Farmer;

    fn from_request(id: i64, request: CreateFarmerRequest) -> Self {
        Self {
            id,
            name: request.name,
            farm_name: request.farm_name,
            contact: request.contact,
            location: request.location,
            latitude: request.latitude,
            longitude: request.longitude,
            crops: request.crops,
        }
    }

    fn apply_update(&mut self, update: UpdateFarmerRequest) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(farm_name) = update.farm_name {
            self.farm_name = farm_name;
        }
        if let Some(contact) = update.contact {
            self.contact = contact;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(latitude) = update.latitude {
            self.latitude = latitude;
        }
        if let Some(longitude) = update.longitude {
            self.longitude = longitude;
        }
        if let Some(crops) = update.crops {
            self.crops = crops;
        }
    }

    fn crops_update(crops: Vec<String>) -> UpdateFarmerRequest {
        UpdateFarmerRequest {
            crops: Some(crops),
            ..Default::default()
        }
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn crops(&self) -> &[String] {
        &self.crops
    }

    fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    fn longitude(&self) -> Option<f64> {
        self.longitude
    }
}
