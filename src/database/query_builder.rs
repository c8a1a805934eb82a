use sqlx::{self, postgres::PgArguments, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::database::models::DiscountListing;
use crate::filter::{DiscountFilter, FilterParam, ListingOrder, SortDirection, SqlResult};

/// Discount listing select: filter and ordering compiled to one parameterized statement
pub struct ListingQuery {
    filter: DiscountFilter,
    order: ListingOrder,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingQuery {
    pub fn new() -> Self {
        Self {
            filter: DiscountFilter::default(),
            order: ListingOrder::StartDate(SortDirection::Asc),
        }
    }

    pub fn filter(mut self, filter: DiscountFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order(mut self, order: ListingOrder) -> Self {
        self.order = order;
        self
    }

    pub fn sql_result(&self) -> SqlResult {
        self.filter.to_sql(self.order)
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<DiscountListing>, DatabaseError> {
        let sql_result = self.sql_result();
        let mut q = sqlx::query_as::<_, DiscountListing>(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q FilterParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match v {
        FilterParam::Int(i) => q.bind(*i),
        FilterParam::Text(s) => q.bind(s.as_str()),
    }
}
