use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Sale {
    pub id: i64,
    /// Money amount, written out as a string with two decimals.
    #[serde(serialize_with = "two_decimals")]
    pub income: f64,
    pub datetime: DateTime<Utc>,
    #[sqlx(rename = "restaurant_id")]
    pub restaurant: Option<i64>,
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.2}", value))
}
