//! Page/limit normalization for list endpoints.
//!
//! Client-supplied values are never rejected: anything out of range,
//! negative, missing or non-numeric is coerced into a valid window.

use std::num::NonZeroU64;

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Raw pagination parameters as received from a query string or JSON body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self { page, limit }
    }
}

/// Normalized offset/limit window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub skip: u64,
    pub take: u64,
    pub page: u64,
    pub limit: NonZeroU64,
}

impl Page {
    /// Builds the metadata block for a result set of `total` rows.
    pub fn summarize(&self, total: u64) -> PageMeta {
        summarize(total, self.page, self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        normalize(&PageRequest::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

pub fn normalize(request: &PageRequest) -> Page {
    let page = request
        .page
        .map_or(DEFAULT_PAGE, |page| page.max(1) as u64);
    let limit = request
        .limit
        .map_or(DEFAULT_LIMIT, |limit| limit.clamp(1, MAX_LIMIT as i64) as u64);

    Page {
        skip: (page - 1).saturating_mul(limit),
        take: limit,
        page,
        // clamped to [1, MAX_LIMIT] above
        limit: NonZeroU64::new(limit).unwrap_or(NonZeroU64::MIN),
    }
}

pub fn summarize(total: u64, page: u64, limit: NonZeroU64) -> PageMeta {
    PageMeta {
        total,
        page,
        limit: limit.get(),
        total_pages: total.div_ceil(limit.get()),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientInt {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Accepts integers, floats and strings; anything unparsable reads as absent.
pub(crate) fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LenientInt>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        LenientInt::Int(value) => Some(value),
        LenientInt::Float(value) if value.is_finite() => Some(value.trunc() as i64),
        LenientInt::Float(_) => None,
        LenientInt::Text(text) => parse_int(&text),
    }))
}

fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value.trunc() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limit(value: u64) -> NonZeroU64 {
        NonZeroU64::new(value).unwrap()
    }

    #[test]
    fn empty_request_uses_defaults() {
        let page = normalize(&PageRequest::default());
        assert_eq!(page.page, 1);
        assert_eq!(page.limit.get(), 10);
        assert_eq!(page.skip, 0);
        assert_eq!(page.take, 10);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let page = normalize(&PageRequest::new(Some(-5), Some(500)));
        assert_eq!(page.page, 1);
        assert_eq!(page.limit.get(), 100);
        assert_eq!(page.skip, 0);
        assert_eq!(page.take, 100);

        let page = normalize(&PageRequest::new(Some(0), Some(0)));
        assert_eq!(page.page, 1);
        assert_eq!(page.limit.get(), 1);
    }

    #[test]
    fn skip_is_page_offset_times_limit() {
        for raw_page in [-3_i64, 0, 1, 2, 7, 1000] {
            for raw_limit in [-1_i64, 0, 1, 10, 99, 100, 101] {
                let page = normalize(&PageRequest::new(Some(raw_page), Some(raw_limit)));
                assert!(page.page >= 1);
                assert!((1..=MAX_LIMIT).contains(&page.limit.get()));
                assert_eq!(page.take, page.limit.get());
                assert_eq!(page.skip, (page.page - 1) * page.limit.get());
            }
        }
    }

    #[test]
    fn summarize_rounds_total_pages_up() {
        assert_eq!(
            summarize(95, 2, limit(10)),
            PageMeta {
                total: 95,
                page: 2,
                limit: 10,
                total_pages: 10
            }
        );
        assert_eq!(summarize(0, 1, limit(10)).total_pages, 0);
        assert_eq!(summarize(100, 1, limit(10)).total_pages, 10);
        assert_eq!(summarize(101, 1, limit(10)).total_pages, 11);
    }

    #[test]
    fn request_deserializes_strings_numbers_and_garbage() {
        let request: PageRequest =
            serde_json::from_value(json!({ "page": "3", "limit": 25 })).unwrap();
        assert_eq!(request, PageRequest::new(Some(3), Some(25)));

        let request: PageRequest =
            serde_json::from_value(json!({ "page": "abc", "limit": 2.9 })).unwrap();
        assert_eq!(request, PageRequest::new(None, Some(2)));

        let request: PageRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(normalize(&request), Page::default());
    }
}
