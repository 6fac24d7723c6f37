//! Wiring of the HTTP collaborators into a data source over JSON rows.

use crate::config::TuiConfig;
use crate::error::TuiError;
use crate::state::App;
use pager_cache::PagedDataSource;
use pager_http::{HttpFetcher, JsonPageDelegate};
use serde_json::Value;
use std::sync::Arc;

pub type JsonSource = PagedDataSource<JsonPageDelegate<Value>, HttpFetcher, String>;
pub type JsonApp = App<JsonPageDelegate<Value>, HttpFetcher>;

pub fn build_source(config: &TuiConfig) -> Result<JsonSource, TuiError> {
    let pager_config = config.pager_config();
    pager_config.validate()?;

    let delegate = JsonPageDelegate::new(config.url_template.clone(), &pager_config)
        .with_items_field(config.items_field.clone())
        .with_total_field(config.total_field.clone());
    let fetcher = Arc::new(HttpFetcher::new(&config.http_config())?);

    let label_field = config.label_field.clone();
    let source = PagedDataSource::new(
        pager_config,
        delegate,
        fetcher,
        Box::new(move |cell: &mut String, row: &Value| {
            *cell = row_label(row, &label_field);
        }),
    )?;
    Ok(source)
}

/// Text shown for a row: the label field if present, else the whole row.
pub fn row_label(row: &Value, label_field: &str) -> String {
    let field = if label_field.starts_with('/') {
        row.pointer(label_field)
    } else {
        row.get(label_field)
    };
    match field.unwrap_or(row) {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
