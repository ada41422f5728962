use serde::Serialize;

/// The `{success, data?, message?}` envelope every successful response uses.
/// Failures are rendered by `AppError`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Success without a payload, e.g. after a delete.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 50, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 50, 50).total_pages, 1);
        assert_eq!(Pagination::new(1, 50, 51).total_pages, 2);
    }

    #[test]
    fn test_pagination_serializes_camel_case() {
        let value = serde_json::to_value(Pagination::new(2, 10, 25)).unwrap();
        assert_eq!(value["totalPages"], 3);
        assert_eq!(value["page"], 2);
    }

    #[test]
    fn test_message_only_omits_data() {
        let value = serde_json::to_value(ApiResponse::message_only("deleted")).unwrap();
        assert_eq!(value["success"], true);
        assert!(value.get("data").is_none());
        assert_eq!(value["message"], "deleted");
    }

    #[test]
    fn test_null_data_is_kept() {
        let value = serde_json::to_value(ApiResponse::ok(None::<u32>)).unwrap();
        assert!(value["data"].is_null());
        assert!(value.get("data").is_some());
    }
}
