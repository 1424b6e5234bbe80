// src/common/db_utils.rs

use sqlx::{postgres::PgRow, FromRow, PgPool, Postgres, QueryBuilder};

use crate::common::{error::AppError, pagination::ListQuery};

/// Executa a listagem paginada: um `COUNT(*)` e a página em si com os mesmos filtros.
///
/// `push_filters` recebe o builder logo após `WHERE TRUE` e deve acrescentar
/// apenas cláusulas `AND ...` com valores via `push_bind`.
pub(crate) async fn fetch_page<T, F>(
    pool: &PgPool,
    select: &str,
    from: &str,
    push_filters: F,
    order_by: &str,
    query: &ListQuery,
) -> Result<(Vec<T>, i64), AppError>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    F: Fn(&mut QueryBuilder<'_, Postgres>),
{
    let mut count = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {from} WHERE TRUE"));
    push_filters(&mut count);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut page = QueryBuilder::<Postgres>::new(format!("SELECT {select} FROM {from} WHERE TRUE"));
    push_filters(&mut page);
    page.push(order_by);
    page.push(" LIMIT ").push_bind(query.limit());
    page.push(" OFFSET ").push_bind(query.offset());

    let rows = page.build_query_as::<T>().fetch_all(pool).await?;
    Ok((rows, total))
}

/// Filtros comuns: busca por `name_key` e status.
pub(crate) fn push_name_and_status(
    qb: &mut QueryBuilder<'_, Postgres>,
    key_column: &str,
    pattern: Option<&str>,
    status: Option<bool>,
) {
    if let Some(pattern) = pattern {
        qb.push(format!(" AND {key_column} ILIKE "))
            .push_bind(pattern.to_string());
    }
    if let Some(status) = status {
        qb.push(" AND status = ").push_bind(status);
    }
}
