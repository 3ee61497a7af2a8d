use serde::{Deserialize, Serialize};

use super::restaurant::Restaurant;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StaffRow {
    pub id: i64,
    pub name: String,
}

/// A staff member together with every restaurant they work at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: i64,
    pub name: String,
    pub restaurant: Vec<Restaurant>,
}
