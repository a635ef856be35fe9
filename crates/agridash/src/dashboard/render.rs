//! Plain-text rendering of a dashboard snapshot for the terminal.

use super::charts::{line_chart, pie_chart, CHART_TITLE};
use super::state::{Alert, DashboardState, FormBuffer};
use crate::observation::{Observation, ObservationField};

/// Heading printed above the dashboard.
pub const PAGE_TITLE: &str = "Agricultural Data Collection and Dashboard";

const LOADING_TEXT: &str = "Loading...";
const BAR_WIDTH: usize = 30;

/// Render a full snapshot: alert, record table and field completeness.
#[must_use]
pub fn render(state: &DashboardState) -> String {
    let mut out = heading(PAGE_TITLE, '=');

    match state.alert() {
        Alert::Idle => {}
        Alert::Success(message) => out.push_str(&format!("[ok] {message}\n")),
        Alert::Error(message) => out.push_str(&format!("[error] {message}\n")),
    }
    out.push('\n');
    out.push_str(&render_form(state.form()));
    out.push('\n');

    if state.is_loading() {
        out.push_str(LOADING_TEXT);
        out.push('\n');
        return out;
    }

    out.push_str(&heading(CHART_TITLE, '-'));
    out.push_str(&render_table(state.records()));
    out.push('\n');
    out.push_str(&render_completeness(state.records()));
    out
}

fn heading(title: &str, underline: char) -> String {
    let rule = underline.to_string().repeat(title.len());
    format!("{title}\n{rule}\n")
}

/// Render the form inputs, showing the hint for blank ones.
#[must_use]
pub fn render_form(form: &FormBuffer) -> String {
    let lines = ObservationField::ALL.into_iter().map(|field| {
        let label = format!("{}:", field.label());
        let value = form.get(field);
        if value.is_empty() {
            format!("  {label:<19}({})\n", field.placeholder())
        } else {
            format!("  {label:<19}{value}\n")
        }
    });
    std::iter::once("New Observation\n".to_string())
        .chain(lines)
        .collect()
}

/// Render records as a table, one row per record in chart order.
#[must_use]
pub fn render_table(records: &[Observation]) -> String {
    let chart = line_chart(records);

    let mut headers = vec!["ID".to_string(), "Date".to_string()];
    headers.extend(chart.datasets.iter().filter_map(|d| d.label.clone()));

    let rows: Vec<Vec<String>> = records
        .iter()
        .zip(&chart.labels)
        .enumerate()
        .map(|(i, (record, date))| {
            let mut row = vec![record.id.to_string(), date.clone()];
            row.extend(chart.datasets.iter().map(|d| d.data[i].clone()));
            row
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            rows.iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    let mut out = table_row(&headers, &widths);
    out.push_str(&table_row(&rule, &widths));
    for row in &rows {
        out.push_str(&table_row(row, &widths));
    }
    out.push_str(&format!("({} records)\n", records.len()));
    out
}

fn table_row(cells: &[String], widths: &[usize]) -> String {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    format!("{}\n", line.join("  ").trim_end())
}

/// Render the pie projection as horizontal bars.
#[must_use]
pub fn render_completeness(records: &[Observation]) -> String {
    let chart = pie_chart(records);
    let counts = chart
        .datasets
        .first()
        .map(|d| d.data.clone())
        .unwrap_or_default();
    let total = records.len().max(1);
    let label_width = ObservationField::ALL
        .iter()
        .map(|f| f.label().len())
        .max()
        .unwrap_or(0);

    chart
        .labels
        .iter()
        .zip(counts)
        .map(|(label, count)| {
            let bar = "#".repeat(count * BAR_WIDTH / total);
            format!("{label:<label_width$}  {count:>5}  {bar}\n")
        })
        .collect()
}
