//! Dashboard view state.
//!
//! [`DashboardState`] is an immutable snapshot. Every transition returns a
//! new snapshot, and the record list is shared between snapshots rather than
//! grown in place.

use std::collections::HashMap;
use std::sync::Arc;

use crate::observation::{NewObservation, Observation, ObservationField};

/// Alert text after a successful submission.
pub const SUBMIT_SUCCESS_MESSAGE: &str = "Data submitted successfully";

/// Alert text after a failed submission.
pub const SUBMIT_ERROR_MESSAGE: &str = "Error submitting data";

/// Whether the initial listing has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Waiting for the first listing.
    #[default]
    Loading,
    /// The listing has been applied.
    Loaded,
}

/// Outcome of the last submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Alert {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// The last submission was stored.
    Success(String),
    /// The last submission failed.
    Error(String),
}

impl Alert {
    /// The message to show, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Success(m) | Self::Error(m) => Some(m),
        }
    }
}

/// The four text inputs of the submission form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormBuffer {
    soil_type: String,
    irrigation_method: String,
    seed_type: String,
    fertilizer_used: String,
}

impl FormBuffer {
    /// Current value of an input.
    #[must_use]
    pub fn get(&self, field: ObservationField) -> &str {
        match field {
            ObservationField::SoilType => &self.soil_type,
            ObservationField::IrrigationMethod => &self.irrigation_method,
            ObservationField::SeedType => &self.seed_type,
            ObservationField::FertilizerUsed => &self.fertilizer_used,
        }
    }

    /// Return a copy with one input replaced.
    #[must_use]
    pub fn with(mut self, field: ObservationField, value: impl Into<String>) -> Self {
        let slot = match field {
            ObservationField::SoilType => &mut self.soil_type,
            ObservationField::IrrigationMethod => &mut self.irrigation_method,
            ObservationField::SeedType => &mut self.seed_type,
            ObservationField::FertilizerUsed => &mut self.fertilizer_used,
        };
        *slot = value.into();
        self
    }

    /// Whether every input is blank.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        ObservationField::ALL
            .iter()
            .all(|&field| self.get(field).is_empty())
    }

    /// The submission these inputs describe, unvalidated.
    #[must_use]
    pub fn to_submission(&self) -> NewObservation {
        NewObservation::new(
            self.soil_type.clone(),
            self.irrigation_method.clone(),
            self.seed_type.clone(),
            self.fertilizer_used.clone(),
        )
    }
}

/// A snapshot of everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    records: Arc<[Observation]>,
    load: LoadState,
    form: FormBuffer,
    alert: Alert,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::new()),
            load: LoadState::default(),
            form: FormBuffer::default(),
            alert: Alert::default(),
        }
    }
}

impl DashboardState {
    /// Records ordered by creation time, then id. Each id appears once.
    #[must_use]
    pub fn records(&self) -> &[Observation] {
        &self.records
    }

    /// Initial-load status.
    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.load
    }

    /// Whether the initial listing is still outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.load == LoadState::Loading
    }

    /// Current form inputs.
    #[must_use]
    pub fn form(&self) -> &FormBuffer {
        &self.form
    }

    /// Outcome of the last submission.
    #[must_use]
    pub fn alert(&self) -> &Alert {
        &self.alert
    }

    /// Apply a full listing from the server and mark the state loaded.
    ///
    /// Records already received over the event stream are kept; a record
    /// present in both is counted once.
    #[must_use]
    pub fn with_listing(&self, listing: Vec<Observation>) -> Self {
        Self {
            records: merge(&self.records, listing),
            load: LoadState::Loaded,
            ..self.clone()
        }
    }

    /// Fold in one pushed record. A record whose id is already present is
    /// ignored.
    #[must_use]
    pub fn with_received(&self, observation: Observation) -> Self {
        if self.records.iter().any(|r| r.id == observation.id) {
            return self.clone();
        }
        Self {
            records: merge(&self.records, [observation]),
            ..self.clone()
        }
    }

    /// Replace one form input.
    #[must_use]
    pub fn with_form_field(&self, field: ObservationField, value: impl Into<String>) -> Self {
        Self {
            form: self.form.clone().with(field, value),
            ..self.clone()
        }
    }

    /// Record a successful submission: clear the form and show success.
    ///
    /// The records are left alone; the stored record arrives over the event
    /// stream.
    #[must_use]
    pub fn with_submit_success(&self) -> Self {
        Self {
            form: FormBuffer::default(),
            alert: Alert::Success(SUBMIT_SUCCESS_MESSAGE.to_string()),
            ..self.clone()
        }
    }

    /// Record a failed submission: keep the form and show an error.
    #[must_use]
    pub fn with_submit_failure(&self) -> Self {
        Self {
            alert: Alert::Error(SUBMIT_ERROR_MESSAGE.to_string()),
            ..self.clone()
        }
    }
}

fn merge(
    existing: &[Observation],
    incoming: impl IntoIterator<Item = Observation>,
) -> Arc<[Observation]> {
    let mut by_id: HashMap<i64, Observation> =
        existing.iter().map(|r| (r.id, r.clone())).collect();
    for record in incoming {
        by_id.insert(record.id, record);
    }

    let mut records: Vec<Observation> = by_id.into_values().collect();
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    Arc::from(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn observation(id: i64, soil: &str) -> Observation {
        let base = Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap();
        Observation::from_new(
            id,
            NewObservation::new(soil, "Drip", "Hybrid", "Organic"),
            base + Duration::minutes(id),
        )
    }

    #[test]
    fn test_default_state() {
        let state = DashboardState::default();
        assert!(state.is_loading());
        assert!(state.records().is_empty());
        assert!(state.form().is_empty());
        assert_eq!(state.alert(), &Alert::Idle);
        assert!(state.alert().message().is_none());
    }

    #[test]
    fn test_listing_marks_loaded() {
        let state = DashboardState::default()
            .with_listing(vec![observation(1, "Clay"), observation(2, "Loam")]);
        assert_eq!(state.load_state(), LoadState::Loaded);
        assert_eq!(state.records().len(), 2);
    }

    #[test]
    fn test_received_appends_in_order() {
        let state = DashboardState::default()
            .with_listing(vec![observation(1, "Clay")])
            .with_received(observation(2, "Sandy"));

        let ids: Vec<i64> = state.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, [1, 2]);
    }

    #[test]
    fn test_received_duplicate_is_ignored() {
        let state = DashboardState::default()
            .with_listing(vec![observation(1, "Clay")])
            .with_received(observation(1, "Clay"))
            .with_received(observation(1, "Clay"));
        assert_eq!(state.records().len(), 1);
    }

    #[test]
    fn test_event_before_listing_is_merged_once() {
        let state = DashboardState::default()
            .with_received(observation(3, "Loam"))
            .with_listing(vec![
                observation(1, "Clay"),
                observation(2, "Sandy"),
                observation(3, "Loam"),
            ]);

        let ids: Vec<i64> = state.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, [1, 2, 3]);
    }

    #[test]
    fn test_out_of_order_events_are_sorted() {
        let state = DashboardState::default()
            .with_listing(Vec::new())
            .with_received(observation(5, "Loam"))
            .with_received(observation(4, "Clay"));

        let ids: Vec<i64> = state.records().iter().map(|r| r.id).collect();
        assert_eq!(ids, [4, 5]);
    }

    #[test]
    fn test_transitions_leave_previous_snapshot_untouched() {
        let before = DashboardState::default().with_listing(vec![observation(1, "Clay")]);
        let after = before.with_received(observation(2, "Sandy"));

        assert_eq!(before.records().len(), 1);
        assert_eq!(after.records().len(), 2);
    }

    #[test]
    fn test_form_field_updates() {
        let state = DashboardState::default()
            .with_form_field(ObservationField::SoilType, "Clay")
            .with_form_field(ObservationField::SeedType, "Hybrid");

        assert_eq!(state.form().get(ObservationField::SoilType), "Clay");
        assert_eq!(state.form().get(ObservationField::SeedType), "Hybrid");
        assert_eq!(state.form().get(ObservationField::IrrigationMethod), "");
        assert!(!state.form().is_empty());
    }

    #[test]
    fn test_submit_success_clears_form_but_not_records() {
        let state = DashboardState::default()
            .with_listing(vec![observation(1, "Clay")])
            .with_form_field(ObservationField::SoilType, "Loam")
            .with_submit_success();

        assert!(state.form().is_empty());
        assert_eq!(state.alert(), &Alert::Success(SUBMIT_SUCCESS_MESSAGE.to_string()));
        assert_eq!(state.records().len(), 1);
    }

    #[test]
    fn test_submit_failure_keeps_form() {
        let state = DashboardState::default()
            .with_form_field(ObservationField::SoilType, "Loam")
            .with_submit_failure();

        assert_eq!(state.form().get(ObservationField::SoilType), "Loam");
        assert_eq!(state.alert().message(), Some(SUBMIT_ERROR_MESSAGE));
    }

    #[test]
    fn test_form_to_submission() {
        let form = FormBuffer::default()
            .with(ObservationField::SoilType, "Clay")
            .with(ObservationField::IrrigationMethod, "Drip")
            .with(ObservationField::SeedType, "Hybrid")
            .with(ObservationField::FertilizerUsed, "Organic");

        assert_eq!(
            form.to_submission(),
            NewObservation::new("Clay", "Drip", "Hybrid", "Organic")
        );
    }
}
