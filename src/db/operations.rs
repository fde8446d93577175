use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions, Postgres};
use sqlx::query::QueryAs;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::DatabaseConfig;
use crate::db::criteria::SearchCriteria;
use crate::db::models::{NewProperty, NewUser, Property, Reservation, User};
use crate::db::search::{self, BindValue, QueryExecutor, Statement, DEFAULT_LIMIT};
use crate::error::DatabaseError;
use crate::Result;

pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect(&config.url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub fn pool(&self) -> &PgPool {
        self.pool.as_ref()
    }

    /// Reads a single listing to confirm the schema is reachable.
    pub async fn probe(&self) -> Result<()> {
        sqlx::query("SELECT id FROM properties LIMIT 1")
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        info!("Connected to the database successfully");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn get_user_with_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password FROM users WHERE email = $1",
        )
        .bind(email.to_lowercase())
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    pub async fn get_user_with_id(&self, id: i32) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    pub async fn add_user(&self, user: &NewUser) -> Result<User> {
        let email = user.normalized_email();
        info!("Adding user with email: {}", email);

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password
            "#,
        )
        .bind(&user.name)
        .bind(&email)
        .bind(&user.password)
        .fetch_one(self.pool.as_ref())
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) => {
                error!("Failed to add user {}: {}", email, e);
                Err(e.into())
            }
        }
    }

    /// Past reservations of `guest_id`, oldest first.
    pub async fn get_all_reservations(
        &self,
        guest_id: i32,
        limit: Option<u32>,
    ) -> Result<Vec<Reservation>> {
        let limit = i64::from(limit.unwrap_or(DEFAULT_LIMIT));
        debug!("Fetching reservations for guest {} (limit {})", guest_id, limit);

        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT reservations.id, reservations.start_date, reservations.end_date,
                   reservations.property_id, reservations.guest_id,
                   properties.title, properties.city, properties.thumbnail_photo_url,
                   properties.cost_per_night, properties.number_of_bedrooms,
                   properties.number_of_bathrooms, properties.parking_spaces,
                   AVG(property_reviews.rating)::float8 AS average_rating
            FROM reservations
            JOIN properties ON reservations.property_id = properties.id
            JOIN property_reviews ON properties.id = property_reviews.property_id
            WHERE reservations.guest_id = $1
              AND reservations.end_date < now()::date
            GROUP BY reservations.id, properties.id
            ORDER BY reservations.start_date
            LIMIT $2
            "#,
        )
        .bind(guest_id)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(reservations)
    }

    pub async fn get_all_properties(
        &self,
        criteria: &SearchCriteria,
        limit: Option<u32>,
    ) -> Result<Vec<Property>> {
        search::search_properties(self, criteria, limit).await
    }

    pub async fn add_property(&self, property: &NewProperty) -> Result<Property> {
        info!("Adding property {:?} for owner {}", property.title, property.owner_id);

        let result = sqlx::query_as::<_, Property>(
            r#"
            INSERT INTO properties
            (title, description, number_of_bedrooms, number_of_bathrooms, parking_spaces,
             cost_per_night, thumbnail_photo_url, cover_photo_url, street, country, city,
             province, post_code, owner_id, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, TRUE)
            RETURNING *
            "#,
        )
        .bind(&property.title)
        .bind(&property.description)
        .bind(property.number_of_bedrooms)
        .bind(property.number_of_bathrooms)
        .bind(property.parking_spaces)
        .bind(property.cost_per_night)
        .bind(&property.thumbnail_photo_url)
        .bind(&property.cover_photo_url)
        .bind(&property.street)
        .bind(&property.country)
        .bind(&property.city)
        .bind(&property.province)
        .bind(&property.post_code)
        .bind(property.owner_id)
        .fetch_one(self.pool.as_ref())
        .await;

        match result {
            Ok(created) => {
                debug!("Created property {}", created.id);
                Ok(created)
            }
            Err(e) => {
                error!("Failed to add property {:?}: {}", property.title, e);
                Err(e.into())
            }
        }
    }
}

fn bind_all<'q>(
    mut query: QueryAs<'q, Postgres, Property, PgArguments>,
    binds: &'q [BindValue],
) -> QueryAs<'q, Postgres, Property, PgArguments> {
    for value in binds {
        query = match value {
            BindValue::Int(v) => query.bind(*v),
            BindValue::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

#[async_trait]
impl QueryExecutor for DbOperations {
    async fn fetch_properties(&self, statement: &Statement) -> Result<Vec<Property>> {
        let query = bind_all(sqlx::query_as::<_, Property>(&statement.sql), &statement.binds);
        let rows = query.fetch_all(self.pool.as_ref()).await?;
        Ok(rows)
    }
}
