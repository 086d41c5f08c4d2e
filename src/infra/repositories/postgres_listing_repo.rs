use crate::domain::{models::listing::Listing, ports::ListingRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresListingRepo {
    pool: PgPool,
}

impl PostgresListingRepo {
    pub fn new(pool: PgPool) -> Self { Self { pool } }
}

#[async_trait]
impl ListingRepository for PostgresListingRepo {
    async fn create(&self, listing: &Listing) -> Result<Listing, AppError> {
        sqlx::query_as::<_, Listing>(
            "INSERT INTO listings (id, host_id, title, description, location, price_per_night, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *"
        )
            .bind(&listing.id).bind(&listing.host_id).bind(&listing.title).bind(&listing.description)
            .bind(&listing.location).bind(listing.price_per_night).bind(listing.created_at).bind(listing.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Listing>, AppError> {
        sqlx::query_as::<_, Listing>("SELECT * FROM listings WHERE id = $1").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Listing>, AppError> {
        sqlx::query_as::<_, Listing>("SELECT * FROM listings ORDER BY created_at DESC").fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update(&self, listing: &Listing) -> Result<Listing, AppError> {
        sqlx::query_as::<_, Listing>(
            "UPDATE listings SET title=$1, description=$2, location=$3, price_per_night=$4, updated_at=$5
             WHERE id=$6
             RETURNING *"
        )
            .bind(&listing.title).bind(&listing.description).bind(&listing.location)
            .bind(listing.price_per_night).bind(listing.updated_at).bind(&listing.id)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Listing not found".into())); }
        Ok(())
    }
}
