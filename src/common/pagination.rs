use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

// Query params de paginação compartilhados por todas as listagens.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Normaliza page/limit: página mínima 1, limite máximo 100, defaults 1/10.
pub fn get_pagination(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let safe_page = page.unwrap_or(DEFAULT_PAGE).max(1);
    let safe_limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    (safe_page, safe_limit)
}

pub fn offset(page: i64, limit: i64) -> i64 {
    (page - 1) * limit
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

// O envelope padrão das respostas paginadas.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            data,
            meta: PaginationMeta {
                page,
                limit,
                total,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_page_one_limit_ten() {
        assert_eq!(get_pagination(None, None), (1, 10));
    }

    #[test]
    fn limit_is_capped_at_one_hundred() {
        assert_eq!(get_pagination(Some(3), Some(500)), (3, 100));
    }

    #[test]
    fn page_never_goes_below_one() {
        assert_eq!(get_pagination(Some(0), Some(10)), (1, 10));
        assert_eq!(get_pagination(Some(-5), Some(10)), (1, 10));
    }

    #[test]
    fn offset_follows_page_and_limit() {
        assert_eq!(offset(1, 10), 0);
        assert_eq!(offset(4, 25), 75);
    }

    #[test]
    fn total_pages_rounds_up() {
        let resp = PaginatedResponse::new(vec![1, 2, 3], 1, 10, 21);
        assert_eq!(resp.meta.total_pages, 3);
        let empty: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 1, 10, 0);
        assert_eq!(empty.meta.total_pages, 0);
    }
}
