use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Listing {
    pub id: String,
    pub host_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price_per_night: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewListingParams {
    pub host_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price_per_night: f64,
}

impl Listing {
    pub fn new(params: NewListingParams) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            host_id: params.host_id,
            title: params.title,
            description: params.description,
            location: params.location,
            price_per_night: params.price_per_night,
            created_at: now,
            updated_at: now,
        }
    }
}
