//! Core observation types for agridash.
//!
//! An observation is one submitted record of how a plot was farmed: the soil,
//! the irrigation method, the seed and the fertilizer. The four values are
//! free text; the store adds an id and a creation timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// One of the four free-text fields of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObservationField {
    /// Soil the crop grows in.
    SoilType,
    /// How the plot is watered.
    IrrigationMethod,
    /// Seed variety planted.
    SeedType,
    /// Fertilizer applied.
    FertilizerUsed,
}

impl ObservationField {
    /// All fields, in form and chart order.
    pub const ALL: [Self; 4] = [
        Self::SoilType,
        Self::IrrigationMethod,
        Self::SeedType,
        Self::FertilizerUsed,
    ];

    /// Name of the field in JSON payloads.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::SoilType => "soilType",
            Self::IrrigationMethod => "irrigationMethod",
            Self::SeedType => "seedType",
            Self::FertilizerUsed => "fertilizerUsed",
        }
    }

    /// Human-readable label used by the form and the charts.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SoilType => "Soil Type",
            Self::IrrigationMethod => "Irrigation Method",
            Self::SeedType => "Seed Type",
            Self::FertilizerUsed => "Fertilizer Used",
        }
    }

    /// Example values shown as a hint in the form.
    #[must_use]
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::SoilType => "e.g., Clay, Sandy, Loam",
            Self::IrrigationMethod => "e.g., Drip, Sprinkler, Surface",
            Self::SeedType => "e.g., Hybrid, GMO, Heirloom",
            Self::FertilizerUsed => "e.g., Organic, Inorganic, Compost",
        }
    }
}

impl std::fmt::Display for ObservationField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A validated submission, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewObservation {
    /// Soil type, e.g. `Clay`.
    pub soil_type: String,
    /// Irrigation method, e.g. `Drip`.
    pub irrigation_method: String,
    /// Seed type, e.g. `Hybrid`.
    pub seed_type: String,
    /// Fertilizer used, e.g. `Organic`.
    pub fertilizer_used: String,
}

impl NewObservation {
    /// Build a submission from its four values.
    #[must_use]
    pub fn new(
        soil_type: impl Into<String>,
        irrigation_method: impl Into<String>,
        seed_type: impl Into<String>,
        fertilizer_used: impl Into<String>,
    ) -> Self {
        Self {
            soil_type: soil_type.into(),
            irrigation_method: irrigation_method.into(),
            seed_type: seed_type.into(),
            fertilizer_used: fertilizer_used.into(),
        }
    }

    /// Parse and validate a raw JSON payload.
    ///
    /// Unknown keys are ignored. Values are taken verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the payload is not an object, or if
    /// any field is missing, not a string, or empty.
    pub fn from_json(payload: &Value) -> Result<Self> {
        let object = payload
            .as_object()
            .ok_or_else(|| Error::validation("body", "expected a JSON object"))?;

        let take = |field: ObservationField| -> Result<String> {
            match object.get(field.wire_name()) {
                None | Some(Value::Null) => Err(Error::validation(field.wire_name(), "is required")),
                Some(Value::String(s)) => Ok(s.clone()),
                Some(_) => Err(Error::validation(field.wire_name(), "must be a string")),
            }
        };

        let new = Self {
            soil_type: take(ObservationField::SoilType)?,
            irrigation_method: take(ObservationField::IrrigationMethod)?,
            seed_type: take(ObservationField::SeedType)?,
            fertilizer_used: take(ObservationField::FertilizerUsed)?,
        };
        new.validate()?;
        Ok(new)
    }

    /// Check that every field is present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        for field in ObservationField::ALL {
            if self.value(field).is_empty() {
                return Err(Error::validation(field.wire_name(), "must not be empty"));
            }
        }
        Ok(())
    }

    /// Get the value of a field.
    #[must_use]
    pub fn value(&self, field: ObservationField) -> &str {
        match field {
            ObservationField::SoilType => &self.soil_type,
            ObservationField::IrrigationMethod => &self.irrigation_method,
            ObservationField::SeedType => &self.seed_type,
            ObservationField::FertilizerUsed => &self.fertilizer_used,
        }
    }
}

/// A stored observation.
///
/// Immutable once created: there is no update or delete path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    /// Identifier assigned by the store.
    pub id: i64,
    /// Soil type.
    pub soil_type: String,
    /// Irrigation method.
    pub irrigation_method: String,
    /// Seed type.
    pub seed_type: String,
    /// Fertilizer used.
    pub fertilizer_used: String,
    /// When the store accepted this observation.
    pub created_at: DateTime<Utc>,
}

impl Observation {
    /// Combine a submission with its store-assigned id and timestamp.
    #[must_use]
    pub fn from_new(id: i64, new: NewObservation, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            soil_type: new.soil_type,
            irrigation_method: new.irrigation_method,
            seed_type: new.seed_type,
            fertilizer_used: new.fertilizer_used,
            created_at,
        }
    }

    /// Get the value of a field.
    #[must_use]
    pub fn value(&self, field: ObservationField) -> &str {
        match field {
            ObservationField::SoilType => &self.soil_type,
            ObservationField::IrrigationMethod => &self.irrigation_method,
            ObservationField::SeedType => &self.seed_type,
            ObservationField::FertilizerUsed => &self.fertilizer_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_wire_names() {
        let names: Vec<_> = ObservationField::ALL
            .iter()
            .map(|f| f.wire_name())
            .collect();
        assert_eq!(
            names,
            ["soilType", "irrigationMethod", "seedType", "fertilizerUsed"]
        );
    }

    #[test]
    fn test_field_labels() {
        assert_eq!(ObservationField::SoilType.label(), "Soil Type");
        assert_eq!(ObservationField::FertilizerUsed.label(), "Fertilizer Used");
        assert!(ObservationField::SeedType.placeholder().contains("Heirloom"));
    }

    #[test]
    fn test_from_json_valid() {
        let payload = json!({
            "soilType": "Clay",
            "irrigationMethod": "Drip",
            "seedType": "Hybrid",
            "fertilizerUsed": "Organic"
        });
        let new = NewObservation::from_json(&payload).unwrap();
        assert_eq!(new, NewObservation::new("Clay", "Drip", "Hybrid", "Organic"));
    }

    #[test]
    fn test_from_json_keeps_values_verbatim() {
        let payload = json!({
            "soilType": "  Sandy loam ",
            "irrigationMethod": "Drip",
            "seedType": "Hybrid",
            "fertilizerUsed": "Organic",
            "extra": 42
        });
        let new = NewObservation::from_json(&payload).unwrap();
        assert_eq!(new.soil_type, "  Sandy loam ");
    }

    #[test]
    fn test_from_json_empty_field() {
        let payload = json!({
            "soilType": "",
            "irrigationMethod": "Drip",
            "seedType": "Hybrid",
            "fertilizerUsed": "Organic"
        });
        let err = NewObservation::from_json(&payload).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("soilType"));
    }

    #[test]
    fn test_from_json_missing_field() {
        let payload = json!({
            "soilType": "Clay",
            "irrigationMethod": "Drip",
            "seedType": "Hybrid"
        });
        let err = NewObservation::from_json(&payload).unwrap_err();
        assert!(err.to_string().contains("fertilizerUsed"));
        assert!(err.to_string().contains("required"));
    }

    #[test]
    fn test_from_json_wrong_type() {
        let payload = json!({
            "soilType": "Clay",
            "irrigationMethod": 3,
            "seedType": "Hybrid",
            "fertilizerUsed": "Organic"
        });
        let err = NewObservation::from_json(&payload).unwrap_err();
        assert!(err.to_string().contains("irrigationMethod"));
        assert!(err.to_string().contains("string"));
    }

    #[test]
    fn test_from_json_not_object() {
        let err = NewObservation::from_json(&json!(["Clay"])).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_observation_wire_format() {
        let created_at = DateTime::parse_from_rfc3339("2024-05-01T10:20:30.123Z")
            .unwrap()
            .with_timezone(&Utc);
        let obs = Observation::from_new(
            7,
            NewObservation::new("Clay", "Drip", "Hybrid", "Organic"),
            created_at,
        );

        let value = serde_json::to_value(&obs).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["soilType"], "Clay");
        assert_eq!(value["fertilizerUsed"], "Organic");
        assert_eq!(value["createdAt"], "2024-05-01T10:20:30.123Z");

        let back: Observation = serde_json::from_value(value).unwrap();
        assert_eq!(back, obs);
    }

    #[test]
    fn test_value_accessor() {
        let new = NewObservation::new("Clay", "Drip", "Hybrid", "Organic");
        assert_eq!(new.value(ObservationField::IrrigationMethod), "Drip");
        let obs = Observation::from_new(1, new, Utc::now());
        assert_eq!(obs.value(ObservationField::SeedType), "Hybrid");
    }
}
