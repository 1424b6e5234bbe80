// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::normalize::{normalize, NameKind};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

// Query string comum a todas as listagens
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Página (começa em 1)
    pub page: Option<i64>,
    /// Itens por página (máx. 100)
    pub limit: Option<i64>,
    /// Busca por trecho do nome (sem acento, sem caixa)
    pub search: Option<String>,
    pub status: Option<bool>,
    pub sort_by: Option<String>,
    pub order: Option<SortOrder>,
    pub tenant_id: Option<Uuid>,
    pub subsidiary_id: Option<Uuid>,
    pub section_id: Option<Uuid>,
    pub module_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
}

impl ListQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Padrão `ILIKE` já normalizado e escapado; `None` se a busca ficar vazia.
    pub fn search_pattern(&self, kind: NameKind) -> Option<String> {
        let term = normalize(self.search.as_deref()?, kind);
        if term.is_empty() {
            return None;
        }
        Some(format!("%{}%", escape_like(&term)))
    }

    /// Cláusula `ORDER BY` a partir de uma lista fechada de colunas.
    /// `allowed` mapeia o nome público (camelCase) para a coluna SQL.
    pub fn order_by(&self, allowed: &[(&str, &str)], default_column: &str) -> String {
        let column = self
            .sort_by
            .as_deref()
            .and_then(|field| {
                allowed
                    .iter()
                    .find(|(public, _)| public.eq_ignore_ascii_case(field))
                    .map(|(_, column)| *column)
            })
            .unwrap_or(default_column);
        let direction = self.order.unwrap_or_default().as_sql();
        format!(" ORDER BY {column} {direction}, id ASC")
    }
}

pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, query: &ListQuery) -> Self {
        let limit = query.limit();
        Self {
            data,
            total,
            page: query.page(),
            limit,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let q = ListQuery::default();
        assert_eq!((q.page(), q.limit(), q.offset()), (1, DEFAULT_LIMIT, 0));

        let q = ListQuery { page: Some(3), limit: Some(500), ..Default::default() };
        assert_eq!(q.limit(), MAX_LIMIT);
        assert_eq!(q.offset(), 200);

        let q = ListQuery { page: Some(-4), limit: Some(0), ..Default::default() };
        assert_eq!((q.page(), q.limit()), (1, 1));
    }

    #[test]
    fn huge_page_saturates_offset() {
        let q = ListQuery { page: Some(i64::MAX), limit: Some(100), ..Default::default() };
        assert_eq!(q.offset(), i64::MAX);
    }

    #[test]
    fn search_is_normalized_and_escaped() {
        let q = ListQuery { search: Some("  Almacén ".into()), ..Default::default() };
        assert_eq!(q.search_pattern(NameKind::Catalog).as_deref(), Some("%almacen%"));

        let q = ListQuery { search: Some("50%_off".into()), ..Default::default() };
        assert_eq!(q.search_pattern(NameKind::Tenant).as_deref(), Some("%50off%"));
        assert_eq!(escape_like("a%b_c"), "a\\%b\\_c");

        let q = ListQuery { search: Some("!!!".into()), ..Default::default() };
        assert_eq!(q.search_pattern(NameKind::Catalog), None);
    }

    #[test]
    fn order_by_uses_whitelist() {
        let allowed = [("name", "name_key"), ("createdAt", "created_at")];
        let q = ListQuery {
            sort_by: Some("createdAt".into()),
            order: Some(SortOrder::Desc),
            ..Default::default()
        };
        assert_eq!(q.order_by(&allowed, "name_key"), " ORDER BY created_at DESC, id ASC");

        let q = ListQuery { sort_by: Some("1; DROP TABLE x".into()), ..Default::default() };
        assert_eq!(q.order_by(&allowed, "name_key"), " ORDER BY name_key ASC, id ASC");
    }

    #[test]
    fn page_counts_total_pages() {
        let q = ListQuery { limit: Some(10), ..Default::default() };
        assert_eq!(Page::new(vec![1, 2, 3], 21, &q).total_pages, 3);
        assert_eq!(Page::<i32>::new(vec![], 0, &q).total_pages, 0);
    }
}
