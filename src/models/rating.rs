use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    pub id: i64,
    pub rating: i64,
    #[sqlx(rename = "user_id")]
    pub user: i64,
    #[sqlx(rename = "restaurant_id")]
    pub restaurant: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitRating {
    pub restaurant_id: Option<i64>,
    pub rating: Option<i64>,
}

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;
