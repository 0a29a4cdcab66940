//! List responses: the items as a JSON array and the paging state as headers.

use axum::{
    Json,
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use engine::{ListQuery, PageMeta};
use serde::Serialize;

static OFFSET_HEADER: HeaderName = HeaderName::from_static("x-offset");
static LIMIT_HEADER: HeaderName = HeaderName::from_static("x-limit");
static NO_LIMIT_COUNT_HEADER: HeaderName = HeaderName::from_static("x-no-limit-count");
static LAST_PAGE_HEADER: HeaderName = HeaderName::from_static("x-last-page");

pub struct Paged<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paged<T> {
    pub fn new(page: engine::Page<T>) -> Self {
        Self {
            items: page.items,
            meta: page.meta,
        }
    }
}

fn paging_headers(meta: &PageMeta) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(OFFSET_HEADER.clone(), HeaderValue::from(meta.offset));
    headers.insert(LIMIT_HEADER.clone(), HeaderValue::from(meta.limit));
    headers.insert(
        NO_LIMIT_COUNT_HEADER.clone(),
        HeaderValue::from(meta.no_limit_count),
    );
    headers.insert(
        LAST_PAGE_HEADER.clone(),
        HeaderValue::from_static(if meta.last_page { "true" } else { "false" }),
    );
    headers
}

impl<T: Serialize> IntoResponse for Paged<T> {
    fn into_response(self) -> Response {
        (paging_headers(&self.meta), Json(self.items)).into_response()
    }
}

/// Builds the engine's list query from the shared query string.
pub fn list_query(params: api_types::ListParams) -> ListQuery {
    ListQuery {
        page: params.page.unwrap_or_default(),
        limit: params.limit.unwrap_or_default(),
        order: params.order.unwrap_or_default(),
        sort: params.sort.unwrap_or_default(),
        search: params.search.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_mirror_page_meta() {
        let meta = PageMeta {
            page: 3,
            limit: 50,
            offset: 100,
            page_count: 3,
            last_page: true,
            no_limit_count: 105,
        };
        let headers = paging_headers(&meta);
        assert_eq!(headers["x-offset"], "100");
        assert_eq!(headers["x-limit"], "50");
        assert_eq!(headers["x-no-limit-count"], "105");
        assert_eq!(headers["x-last-page"], "true");
    }
}
