use serde::{Deserialize, Serialize};

use super::error::FilterError;
use super::types::{DateWindow, FilterParam, ListingOrder, SqlResult};

/// Discount columns joined with the owning shop's name and city
pub const LISTING_SELECT: &str = "SELECT d.id, d.shop_id, d.title, d.discount_percentage, d.category, \
     d.start_date, d.end_date, d.created_at, d.updated_at, s.shop_name, s.city \
     FROM discounts d JOIN shops s ON s.id = d.shop_id";

/// Composable, independently optional discount search criteria
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscountFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub date: Option<DateWindow>,
    /// Owner scope; set from the principal, never from the query string
    #[serde(skip)]
    pub shop_id: Option<i32>,
}

/// Query-string shape of `GET /api/discounts`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscountQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub date: Option<String>,
}

impl TryFrom<DiscountQuery> for DiscountFilter {
    type Error = FilterError;

    fn try_from(query: DiscountQuery) -> Result<Self, Self::Error> {
        let date = match non_blank(query.date) {
            Some(raw) => Some(raw.parse::<DateWindow>()?),
            None => None,
        };

        Ok(Self {
            search: non_blank(query.search),
            category: non_blank(query.category),
            city: non_blank(query.city),
            date,
            shop_id: None,
        })
    }
}

impl DiscountFilter {
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: non_blank(Some(term.into())),
            ..Default::default()
        }
    }

    pub fn for_shop(mut self, shop_id: i32) -> Self {
        self.shop_id = Some(shop_id);
        self
    }

    /// AND-joined conditions using `$n` placeholders from `starting_param_index`
    pub fn where_clause(&self, starting_param_index: usize) -> (String, Vec<FilterParam>) {
        let mut conditions: Vec<String> = vec![];
        let mut params: Vec<FilterParam> = vec![];
        let next = |params: &mut Vec<FilterParam>, param: FilterParam| {
            params.push(param);
            starting_param_index + params.len() - 1
        };

        if let Some(shop_id) = self.shop_id {
            let n = next(&mut params, FilterParam::Int(shop_id));
            conditions.push(format!("d.shop_id = ${}", n));
        }

        if let Some(date) = self.date {
            conditions.push(date.to_sql().to_string());
        }

        if let Some(category) = &self.category {
            let n = next(&mut params, FilterParam::Text(contains_pattern(category)));
            conditions.push(format!("d.category ILIKE ${} ESCAPE '\\'", n));
        }

        if let Some(city) = &self.city {
            let n = next(&mut params, FilterParam::Text(contains_pattern(city)));
            conditions.push(format!("s.city ILIKE ${} ESCAPE '\\'", n));
        }

        if let Some(search) = &self.search {
            let n = next(&mut params, FilterParam::Text(contains_pattern(search)));
            conditions.push(format!(
                "(d.title ILIKE ${0} ESCAPE '\\' OR s.shop_name ILIKE ${0} ESCAPE '\\')",
                n
            ));
        }

        let where_clause = if conditions.is_empty() {
            "1=1".to_string()
        } else {
            conditions.join(" AND ")
        };
        (where_clause, params)
    }

    pub fn to_sql(&self, order: ListingOrder) -> SqlResult {
        let (where_clause, params) = self.where_clause(1);
        SqlResult {
            query: format!("{} WHERE {} ORDER BY {}", LISTING_SELECT, where_clause, order.to_sql()),
            params,
        }
    }

    /// Query-string pairs for sending this filter to the API
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![];
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(city) = &self.city {
            pairs.push(("city", city.clone()));
        }
        if let Some(date) = self.date {
            pairs.push(("date", date.as_str().to_string()));
        }
        pairs
    }
}

/// Escape LIKE metacharacters so the term matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
