//! Dashboard client.
//!
//! Talks to the agridash server over HTTP, keeps an immutable snapshot of
//! the record list that follows the server's event stream, and projects the
//! records into chart data.

mod charts;
mod client;
mod render;
mod session;
mod sse;
mod state;

pub use charts::{
    bar_chart, date_label, field_color, line_chart, pie_chart, ChartData, ChartOptions, Charts,
    Dataset, Paint, Rgba, CHART_TITLE,
};
pub use client::{ApiClient, EventStream};
pub use render::{render, render_completeness, render_form, render_table, PAGE_TITLE};
pub use session::{Dashboard, LiveFeed};
pub use sse::{SseDecoder, SseEvent};
pub use state::{
    Alert, DashboardState, FormBuffer, LoadState, SUBMIT_ERROR_MESSAGE, SUBMIT_SUCCESS_MESSAGE,
};
