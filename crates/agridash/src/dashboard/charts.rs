//! Chart projections over the record list.
//!
//! Each projection serializes to the data shape Chart.js expects
//! (`labels` plus `datasets`), so a browser front end can hand it straight to
//! a chart. Line and bar charts plot the raw field values per record; they
//! are categorical strings and are passed through unchanged. The pie chart
//! counts how many records carry a non-empty value for each field.

use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Serialize, Serializer};

use crate::observation::{Observation, ObservationField};

/// Title shown above the charts.
pub const CHART_TITLE: &str = "Agricultural Data Visualizations";

/// An `rgba(...)` color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    r: u8,
    g: u8,
    b: u8,
    alpha: f32,
}

impl Rgba {
    /// Build a color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        Self { r, g, b, alpha }
    }

    /// The same color at a different opacity.
    #[must_use]
    pub const fn with_alpha(self, alpha: f32) -> Self {
        Self { alpha, ..self }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.alpha)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Series color for a field.
#[must_use]
pub fn field_color(field: ObservationField) -> Rgba {
    match field {
        ObservationField::SoilType => Rgba::new(75, 192, 192, 1.0),
        ObservationField::IrrigationMethod => Rgba::new(54, 162, 235, 1.0),
        ObservationField::SeedType => Rgba::new(255, 206, 86, 1.0),
        ObservationField::FertilizerUsed => Rgba::new(153, 102, 255, 1.0),
    }
}

/// One color for a whole dataset, or one per data point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Paint {
    /// Same color everywhere.
    Solid(Rgba),
    /// One color per slice or bar.
    PerPoint(Vec<Rgba>),
}

/// A Chart.js dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset<T> {
    /// Legend text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Values in label order.
    pub data: Vec<T>,
    /// Line color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<Rgba>,
    /// Fill color.
    pub background_color: Paint,
}

/// Chart.js `data` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData<T> {
    /// X axis labels, or slice labels for a pie.
    pub labels: Vec<String>,
    /// Series to draw.
    pub datasets: Vec<Dataset<T>>,
}

/// Chart.js `options` object shared by every chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    /// Resize with the container.
    pub responsive: bool,
    /// Legend and title settings.
    pub plugins: ChartPlugins,
}

/// Chart.js `options.plugins`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPlugins {
    /// Legend placement.
    pub legend: Legend,
    /// Chart title.
    pub title: Title,
}

/// Chart.js legend settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    /// `top`, `bottom`, `left` or `right`.
    pub position: String,
}

/// Chart.js title settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    /// Whether the title is drawn.
    pub display: bool,
    /// Title text.
    pub text: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            responsive: true,
            plugins: ChartPlugins {
                legend: Legend {
                    position: "top".to_string(),
                },
                title: Title {
                    display: true,
                    text: CHART_TITLE.to_string(),
                },
            },
        }
    }
}

/// All three projections of one record list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Charts {
    /// One line per field across records.
    pub line: ChartData<String>,
    /// One bar series per field across records.
    pub bar: ChartData<String>,
    /// Count of records with each field filled in.
    pub pie: ChartData<usize>,
    /// Options shared by the three charts.
    pub options: ChartOptions,
}

impl Charts {
    /// Project a record list into every chart.
    #[must_use]
    pub fn project(records: &[Observation]) -> Self {
        Self {
            line: line_chart(records),
            bar: bar_chart(records),
            pie: pie_chart(records),
            options: ChartOptions::default(),
        }
    }
}

/// X axis label for a record: its creation date in local time, `M/D/YYYY`.
#[must_use]
pub fn date_label(created_at: DateTime<Utc>) -> String {
    created_at
        .with_timezone(&Local)
        .format("%-m/%-d/%Y")
        .to_string()
}

fn date_labels(records: &[Observation]) -> Vec<String> {
    records.iter().map(|r| date_label(r.created_at)).collect()
}

fn series(records: &[Observation], field: ObservationField) -> Vec<String> {
    records.iter().map(|r| r.value(field).to_string()).collect()
}

/// Line chart: one dataset per field.
#[must_use]
pub fn line_chart(records: &[Observation]) -> ChartData<String> {
    let datasets = ObservationField::ALL
        .iter()
        .map(|&field| {
            let color = field_color(field);
            Dataset {
                label: Some(field.label().to_string()),
                data: series(records, field),
                border_color: Some(color),
                background_color: Paint::Solid(color.with_alpha(0.2)),
            }
        })
        .collect();

    ChartData {
        labels: date_labels(records),
        datasets,
    }
}

/// Bar chart: one dataset per field.
#[must_use]
pub fn bar_chart(records: &[Observation]) -> ChartData<String> {
    let datasets = ObservationField::ALL
        .iter()
        .map(|&field| Dataset {
            label: Some(field.label().to_string()),
            data: series(records, field),
            border_color: None,
            background_color: Paint::Solid(field_color(field).with_alpha(0.5)),
        })
        .collect();

    ChartData {
        labels: date_labels(records),
        datasets,
    }
}

/// Pie chart: one slice per field, sized by how many records fill it in.
#[must_use]
pub fn pie_chart(records: &[Observation]) -> ChartData<usize> {
    let labels = ObservationField::ALL
        .iter()
        .map(|field| field.label().to_string())
        .collect();
    let data = ObservationField::ALL
        .iter()
        .map(|&field| records.iter().filter(|r| !r.value(field).is_empty()).count())
        .collect();
    let colors = ObservationField::ALL
        .iter()
        .map(|&field| field_color(field).with_alpha(0.5))
        .collect();

    ChartData {
        labels,
        datasets: vec![Dataset {
            label: None,
            data,
            border_color: None,
            background_color: Paint::PerPoint(colors),
        }],
    }
}
