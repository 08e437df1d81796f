//! Fetch every page of a listing.
//!
//! Listings expose one of two envelopes:
//! - `content` / `number` / `totalPages` / `totalElements` / `last`
//! - `list` / `page` / `pages` / `total`
//!
//! [`Page`] reads both. A listing is done when the server reports no
//! records, flags the last page, or the current index reaches the last one.

use serde::Deserialize;
use std::future::Future;
use tracing::debug;

use crate::error::{PegassError, Result};

/// One page of a listing, in either wire convention.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new", alias = "list")]
    pub content: Vec<T>,
    /// Zero-based index of this page.
    #[serde(default, alias = "page")]
    pub number: Option<u32>,
    #[serde(default, alias = "pages")]
    pub total_pages: Option<u32>,
    #[serde(default, alias = "total")]
    pub total_elements: Option<u64>,
    #[serde(default)]
    pub last: Option<bool>,
}

impl<T> Page<T> {
    /// Whether no page follows this one.
    pub fn is_exhausted(&self) -> bool {
        if self.total_elements == Some(0) || self.last == Some(true) {
            return true;
        }
        if let (Some(number), Some(total_pages)) = (self.number, self.total_pages) {
            if number.saturating_add(1) >= total_pages {
                return true;
            }
        }
        // nothing left to read even if the metadata says otherwise
        self.content.is_empty()
    }
}

/// Request pages `0, 1, 2, ...` until the listing is exhausted.
///
/// Records keep server order. Gives up with
/// [`PegassError::PaginationLimit`] after `max_pages` requests.
pub async fn fetch_all<T, F, Fut>(endpoint: &str, max_pages: u32, mut fetch_page: F) -> Result<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut records = Vec::new();
    for index in 0..max_pages {
        let page = fetch_page(index).await?;
        let done = page.is_exhausted();
        debug!(
            endpoint,
            page = index,
            total_pages = ?page.total_pages,
            received = page.content.len(),
            "fetched page"
        );
        records.extend(page.content);
        if done {
            return Ok(records);
        }
    }
    Err(PegassError::PaginationLimit {
        endpoint: endpoint.to_string(),
        cap: max_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pages_with_last_flag() -> Vec<serde_json::Value> {
        (0..3)
            .map(|n| {
                json!({
                    "content": [n * 2, n * 2 + 1],
                    "number": n,
                    "totalPages": 3,
                    "totalElements": 6,
                    "last": n == 2,
                })
            })
            .collect()
    }

    fn pages_with_page_count() -> Vec<serde_json::Value> {
        (0..3)
            .map(|n| {
                json!({
                    "list": [n * 2, n * 2 + 1],
                    "page": n,
                    "pages": 3,
                    "total": 6,
                })
            })
            .collect()
    }

    fn decode(raw: serde_json::Value) -> Result<Page<u32>> {
        Ok(serde_json::from_value(raw)?)
    }

    async fn run(pages: Vec<serde_json::Value>, cap: u32) -> Result<Vec<u32>> {
        fetch_all("test", cap, |index| {
            let raw = pages[index as usize % pages.len()].clone();
            async move { decode(raw) }
        })
        .await
    }

    #[tokio::test]
    async fn both_conventions_yield_identical_sequence() {
        let by_flag = run(pages_with_last_flag(), 10).await.unwrap();
        let by_count = run(pages_with_page_count(), 10).await.unwrap();
        assert_eq!(by_flag, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(by_flag, by_count);
    }

    #[tokio::test]
    async fn zero_total_stops_after_first_page() {
        let mut calls = 0;
        let records = fetch_all("test", 10, |_| {
            calls += 1;
            async { decode(json!({ "list": [], "page": 0, "pages": 0, "total": 0 })) }
        })
        .await
        .unwrap();
        assert!(records.is_empty());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn endless_listing_hits_cap() {
        let err = fetch_all("seance", 4, |n| async move {
            decode(json!({ "content": [n], "number": 0, "totalPages": 99, "last": false }))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, PegassError::PaginationLimit { cap: 4, .. }));
    }

    #[tokio::test]
    async fn page_error_aborts_fetch() {
        let err = fetch_all("seance", 4, |_| async {
            Err::<Page<u32>, _>(PegassError::decode("seance", "bad json"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, PegassError::Decode { .. }));
    }

    #[test]
    fn last_index_signals_exhaustion_without_flag() {
        let page: Page<u32> = serde_json::from_value(json!({
            "content": [1], "number": 4, "totalPages": 5
        }))
        .unwrap();
        assert!(page.is_exhausted());
    }
}
