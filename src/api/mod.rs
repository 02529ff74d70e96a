pub mod response;

use serde::Deserialize;
use uuid::Uuid;

use crate::config;
use crate::error::ApiError;

/// Parse a path parameter as a UUID, reporting 400 on malformed input
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid {} id", what)))
}

/// Reject missing or whitespace-only required fields
pub fn require_field<'a>(value: &'a str, name: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request(format!("{} is required", name)));
    }
    Ok(trimmed)
}

/// Owner-gated mutation guard: the caller must be the record owner
pub fn ensure_owner(owner_id: Uuid, caller_id: Uuid, what: &str) -> Result<(), ApiError> {
    if owner_id != caller_id {
        return Err(ApiError::forbidden(format!(
            "You are not the owner of this {}",
            what
        )));
    }
    Ok(())
}

/// Common `?page=&limit=` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Resolve to a SQL (limit, offset) pair, clamped to the configured cap.
    /// Widened to i64 before the multiply so huge page numbers cannot
    /// overflow the offset.
    pub fn limit_offset(&self) -> (i64, i64) {
        let api = &config::config().api;
        let limit = i64::from(
            self.limit
                .unwrap_or(api.default_page_size)
                .clamp(1, api.max_page_size),
        );
        let page = i64::from(self.page.unwrap_or(1).max(1));
        (limit, (page - 1) * limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid", "video").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string(), "video").unwrap(), id);
    }

    #[test]
    fn require_field_trims_and_rejects_empty() {
        assert!(require_field("", "title").is_err());
        assert!(require_field("   ", "title").is_err());
        assert_eq!(require_field("  hello ", "title").unwrap(), "hello");
    }

    #[test]
    fn ensure_owner_rejects_non_owner() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        assert!(ensure_owner(owner, owner, "video").is_ok());
        let err = ensure_owner(owner, other, "video").unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn page_query_defaults_and_clamps() {
        let q = PageQuery::default();
        let (limit, offset) = q.limit_offset();
        assert_eq!(offset, 0);
        assert!(limit >= 1);

        let q = PageQuery {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(q.limit_offset(), (10, 20));

        let q = PageQuery {
            page: Some(0),
            limit: Some(0),
        };
        let (limit, offset) = q.limit_offset();
        assert_eq!(limit, 1);
        assert_eq!(offset, 0);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let q = PageQuery {
            page: Some(u32::MAX),
            limit: Some(100),
        };
        let (limit, offset) = q.limit_offset();
        assert_eq!(limit, 100);
        assert_eq!(offset, (u32::MAX as i64 - 1) * 100);
    }
}
