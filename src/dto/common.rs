use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Standard envelope wrapping every REST response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was handled successfully.
    pub success: bool,
    /// Payload present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    /// Human-readable message present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful envelope carrying a payload.
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            message: None,
        }
    }
}

/// Envelope for paginated catalog listings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T: Serialize> {
    /// Whether the request was handled successfully.
    pub success: bool,
    /// Items on the requested page.
    pub result: Vec<T>,
    /// 1-based page number served.
    pub page: u64,
    /// Page size used.
    pub per_page: u64,
    /// Total matching items across all pages.
    pub total: u64,
}

/// Pagination query parameters accepted by the listing endpoints.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// 1-based page number; defaults to 1.
    pub page: Option<u64>,
    /// Page size; defaults to 10.
    pub per_page: Option<u64>,
}

impl PageQuery {
    /// Effective page number.
    pub fn page(&self) -> u64 {
        self.page.filter(|page| *page > 0).unwrap_or(1)
    }

    /// Effective page size.
    pub fn per_page(&self) -> u64 {
        self.per_page.filter(|per| *per > 0).unwrap_or(10)
    }
}
