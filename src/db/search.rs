//! Filtered property search.
//!
//! [`build_property_search`] turns [`SearchCriteria`] into a parameterized
//! PostgreSQL statement without touching the database. [`search_properties`]
//! hands that statement to a [`QueryExecutor`] and returns its rows or its
//! failure unchanged.

use async_trait::async_trait;
use tracing::{debug, error};

use crate::db::criteria::SearchCriteria;
use crate::db::models::Property;
use crate::Result;

pub const DEFAULT_LIMIT: u32 = 10;

/// Marker for a positional parameter inside a predicate template.
const PLACEHOLDER: char = '?';

const BASE_QUERY: &str = "SELECT properties.*, AVG(property_reviews.rating)::float8 AS average_rating
FROM properties
JOIN property_reviews ON properties.id = property_reviews.property_id
GROUP BY properties.id";

const ORDER_BY: &str = "ORDER BY properties.cost_per_night ASC";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Int(i64),
    Text(String),
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        BindValue::Int(value)
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        BindValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Predicate {
    template: &'static str,
    values: Vec<BindValue>,
}

/// Predicates collected for one clause, rendered once with contiguous
/// `$n` placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFragment {
    predicates: Vec<Predicate>,
}

impl QueryFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate. Each `?` in `template` consumes one value, in order.
    pub fn push<I>(&mut self, template: &'static str, values: I)
    where
        I: IntoIterator<Item = BindValue>,
    {
        let values: Vec<BindValue> = values.into_iter().collect();
        assert_eq!(
            template.matches(PLACEHOLDER).count(),
            values.len(),
            "placeholder count mismatch in {:?}",
            template
        );
        self.predicates.push(Predicate { template, values });
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn bind_count(&self) -> usize {
        self.predicates.iter().map(|p| p.values.len()).sum()
    }

    /// Joins the predicates with `AND`, numbering placeholders from `first`.
    /// Returns `None` when nothing was pushed.
    pub fn render(&self, first: usize) -> Option<(String, Vec<BindValue>)> {
        if self.is_empty() {
            return None;
        }

        let mut next = first;
        let mut binds = Vec::with_capacity(self.bind_count());
        let mut parts = Vec::with_capacity(self.predicates.len());

        for predicate in &self.predicates {
            let mut sql = String::with_capacity(predicate.template.len() + 4);
            for ch in predicate.template.chars() {
                if ch == PLACEHOLDER {
                    sql.push('$');
                    sql.push_str(&next.to_string());
                    next += 1;
                } else {
                    sql.push(ch);
                }
            }
            binds.extend(predicate.values.iter().cloned());
            parts.push(sql);
        }

        Some((parts.join(" AND "), binds))
    }
}

/// A ready-to-execute statement: `binds[n - 1]` belongs to placeholder `$n`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

/// Builds the property search statement for `criteria`, capped at `limit` rows.
///
/// Every filter lands in one `HAVING` clause so the owner restriction and the
/// aggregate rating filter combine under the same `AND`. A single price bound
/// is ignored; prices are bound in cents.
pub fn build_property_search(criteria: &SearchCriteria, limit: u32) -> Statement {
    let mut having = QueryFragment::new();

    if let Some(owner_id) = criteria.owner_id {
        having.push("properties.owner_id = ?", [BindValue::Int(owner_id)]);
    }

    if let Some(city) = &criteria.city {
        having.push("properties.city ILIKE ?", [BindValue::Text(format!("%{}%", city))]);
    }

    if let Some((min_cents, max_cents)) = criteria.price_range_cents() {
        having.push(
            "properties.cost_per_night >= ? AND properties.cost_per_night <= ?",
            [BindValue::Int(min_cents), BindValue::Int(max_cents)],
        );
    }

    if let Some(rating) = criteria.minimum_rating {
        having.push("AVG(property_reviews.rating) >= ?", [BindValue::Int(rating)]);
    }

    let mut sql = String::from(BASE_QUERY);
    let mut binds = Vec::with_capacity(having.bind_count() + 1);

    if let Some((clause, values)) = having.render(1) {
        sql.push_str("\nHAVING ");
        sql.push_str(&clause);
        binds = values;
    }

    binds.push(BindValue::Int(i64::from(limit)));
    sql.push('\n');
    sql.push_str(ORDER_BY);
    sql.push_str(&format!("\nLIMIT ${}", binds.len()));

    Statement { sql, binds }
}

/// Runs a prepared statement against storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn fetch_properties(&self, statement: &Statement) -> Result<Vec<Property>>;
}

/// Builds the search statement and executes it. `limit` defaults to
/// [`DEFAULT_LIMIT`]. Execution failures are returned as-is.
pub async fn search_properties<E>(
    executor: &E,
    criteria: &SearchCriteria,
    limit: Option<u32>,
) -> Result<Vec<Property>>
where
    E: QueryExecutor + ?Sized,
{
    let statement = build_property_search(criteria, limit.unwrap_or(DEFAULT_LIMIT));
    debug!(sql = %statement.sql, binds = ?statement.binds, "Running property search");

    match executor.fetch_properties(&statement).await {
        Ok(rows) => {
            debug!("Property search returned {} rows", rows.len());
            Ok(rows)
        }
        Err(e) => {
            error!("Property search failed: {}", e);
            Err(e)
        }
    }
}
