//! Delegate for JSON list endpoints.
//!
//! The endpoint is described by a URL template and two field locations: where
//! the item array lives and (optionally) where the total count lives. Field
//! locations are either a top-level key (`"items"`) or a JSON pointer
//! (`"/data/results"`). An empty items field means the body is the array.

use std::marker::PhantomData;

use pager_cache::PageDelegate;
use pager_core::{FetchFailure, FetchResponse, PageIndex, PageOutcome, PagerConfig};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Header consulted for the total when the body does not carry one.
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Longest error body kept in a [`FetchFailure::Status`].
const MAX_ERROR_BODY: usize = 512;

pub struct JsonPageDelegate<T> {
    url_template: String,
    page_size: usize,
    items_field: String,
    total_field: Option<String>,
    _item: PhantomData<fn() -> T>,
}

impl<T> JsonPageDelegate<T> {
    /// `url_template` may contain `{page}`, `{offset}` and `{limit}`; the
    /// last two follow the page size of `config`.
    pub fn new(url_template: impl Into<String>, config: &PagerConfig) -> Self {
        Self {
            url_template: url_template.into(),
            page_size: config.page_size,
            items_field: "items".to_string(),
            total_field: Some("total".to_string()),
            _item: PhantomData,
        }
    }

    pub fn with_items_field(mut self, field: impl Into<String>) -> Self {
        self.items_field = field.into();
        self
    }

    pub fn with_total_field(mut self, field: Option<String>) -> Self {
        self.total_field = field;
        self
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }
}

fn lookup<'a>(value: &'a Value, field: &str) -> Option<&'a Value> {
    if field.is_empty() {
        Some(value)
    } else if field.starts_with('/') {
        value.pointer(field)
    } else {
        value.get(field)
    }
}

fn truncate_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}

impl<T> JsonPageDelegate<T>
where
    T: DeserializeOwned,
{
    fn parse(&self, response: &FetchResponse) -> Result<(Vec<T>, Option<u64>), FetchFailure> {
        let body: Value = serde_json::from_slice(&response.body)
            .map_err(|e| FetchFailure::parse(format!("invalid JSON: {}", e)))?;

        let items = match lookup(&body, &self.items_field) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(FetchFailure::parse(format!(
                    "field '{}' is not an array",
                    self.items_field
                )))
            }
            None => {
                return Err(FetchFailure::parse(format!(
                    "missing field '{}'",
                    self.items_field
                )))
            }
        };
        let items = items
            .iter()
            .cloned()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| FetchFailure::parse(format!("invalid item: {}", e)))?;

        let total = self
            .total_field
            .as_deref()
            .and_then(|field| lookup(&body, field))
            .and_then(Value::as_u64)
            .or_else(|| {
                response
                    .header(TOTAL_COUNT_HEADER)
                    .and_then(|v| v.trim().parse().ok())
            });

        Ok((items, total))
    }
}

impl<T> PageDelegate for JsonPageDelegate<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Item = T;

    fn url_for_page(&self, page: PageIndex) -> String {
        self.url_template
            .replace("{page}", &page.to_string())
            .replace("{offset}", &(page * self.page_size).to_string())
            .replace("{limit}", &self.page_size.to_string())
    }

    fn process_results(
        &self,
        page: PageIndex,
        url: &str,
        response: Result<FetchResponse, FetchFailure>,
    ) -> PageOutcome<T> {
        let response = match response {
            Ok(response) => response,
            Err(failure) => return PageOutcome::failed(failure),
        };
        if !response.is_success() {
            tracing::warn!(page, url, status = response.status, "Page request rejected");
            return PageOutcome::failed(FetchFailure::Status {
                status: response.status,
                body: truncate_body(&response.body),
            });
        }
        match self.parse(&response) {
            Ok((items, Some(total))) => PageOutcome::with_total(items, total),
            Ok((items, None)) => PageOutcome::loaded(items),
            Err(failure) => {
                tracing::warn!(page, url, error = %failure, "Page body rejected");
                PageOutcome::failed(failure)
            }
        }
    }
}
