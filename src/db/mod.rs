//! Database module for the LightBnB data-access layer
//!
//! Row models, the sqlx-backed store for users, reservations and
//! properties, and the filtered property search.

pub mod criteria;
pub mod models;
pub mod operations;
pub mod search;

pub use criteria::SearchCriteria;
pub use models::{NewProperty, NewUser, Property, Reservation, User};
pub use operations::DbOperations;
pub use search::{
    build_property_search, search_properties, BindValue, QueryExecutor, QueryFragment, Statement,
    DEFAULT_LIMIT,
};
