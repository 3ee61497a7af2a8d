use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    middleware::AuthUser,
    models::{
        rating::{Rating, SubmitRating, MAX_RATING, MIN_RATING},
        restaurant::{CreateRestaurant, Restaurant},
        sale::Sale,
        staff::{Staff, StaffRow},
        user::MessageResponse,
    },
    AppState,
};

pub const PAGE_SIZE: i64 = 10;

const AVAILABLE_URLS: [&str; 8] = [
    "/allrestaurants",
    "/allrestaurantsbytype",
    "/allsales",
    "/allratings",
    "/counttotalrestaurants",
    "/staff/<int:pk>/restaurants/",
    "/restaurant/<int:pk>/staff/",
    "restaurants/add/",
];

pub async fn home() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the core app homepage! Here are the available API endpoints:",
        "available_urls": AVAILABLE_URLS,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM restaurants")
        .fetch_one(&state.db)
        .await?;

    let page = Page::resolve(query.page.as_deref(), count)?;

    let results = sqlx::query_as::<_, Restaurant>(
        "SELECT * FROM restaurants ORDER BY id LIMIT ? OFFSET ?",
    )
    .bind(PAGE_SIZE)
    .bind(page.offset())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({
        "count": count,
        "next": page.next_link("/allrestaurants"),
        "previous": page.previous_link("/allrestaurants"),
        "results": results,
    })))
}

/// One page of a page-number paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub num_pages: i64,
}

impl Page {
    /// Accepts a 1-based page number or `last`. Page 1 always exists, even for
    /// an empty listing.
    pub fn resolve(raw: Option<&str>, count: i64) -> Result<Self, AppError> {
        let num_pages = ((count + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
        let number = match raw {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| AppError::NotFound("Invalid page.".into()))?,
        };
        if number < 1 || number > num_pages {
            return Err(AppError::NotFound("Invalid page.".into()));
        }
        Ok(Self { number, num_pages })
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * PAGE_SIZE
    }

    pub fn next_link(&self, path: &str) -> Option<String> {
        (self.number < self.num_pages).then(|| format!("{}?page={}", path, self.number + 1))
    }

    pub fn previous_link(&self, path: &str) -> Option<String> {
        match self.number {
            1 => None,
            2 => Some(path.to_string()),
            n => Some(format!("{}?page={}", path, n - 1)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TypeQuery {
    #[serde(rename = "type")]
    pub type_code: Option<String>,
}

pub async fn list_restaurants_by_type(
    State(state): State<AppState>,
    Query(query): Query<TypeQuery>,
) -> Result<Json<Vec<Restaurant>>, AppError> {
    let type_code = query
        .type_code
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("Query parameter 'type' is required.".into()))?;

    let restaurants = sqlx::query_as::<_, Restaurant>(
        "SELECT * FROM restaurants WHERE restaurant_type = ? ORDER BY id",
    )
    .bind(&type_code)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(restaurants))
}

pub async fn count_restaurants(State(state): State<AppState>) -> Result<Json<i64>, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM restaurants")
        .fetch_one(&state.db)
        .await?;
    Ok(Json(count))
}

pub async fn add_restaurant(
    State(state): State<AppState>,
    payload: Result<Json<CreateRestaurant>, JsonRejection>,
) -> Result<(StatusCode, Json<Restaurant>), AppError> {
    let Json(payload) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    let new = payload.validate().map_err(AppError::Fields)?;

    let restaurant = sqlx::query_as::<_, Restaurant>(
        "INSERT INTO restaurants (name, website, date_opened, latitude, longitude, restaurant_type) \
         VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(&new.name)
    .bind(&new.website)
    .bind(new.date_opened)
    .bind(new.latitude)
    .bind(new.longitude)
    .bind(new.restaurant_type)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(id = restaurant.id, name = %restaurant.name, "restaurant added");
    Ok((StatusCode::CREATED, Json(restaurant)))
}

pub async fn list_sales(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<Sale>>, AppError> {
    let sales = sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY id")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(sales))
}

pub async fn list_ratings(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<Rating>>, AppError> {
    let ratings = sqlx::query_as::<_, Rating>("SELECT * FROM ratings ORDER BY id")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(ratings))
}

pub async fn submit_rating(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<SubmitRating>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(payload) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let (restaurant_id, rating) = match (payload.restaurant_id, payload.rating) {
        (Some(restaurant_id), Some(rating)) if restaurant_id != 0 && rating != 0 => {
            (restaurant_id, rating)
        }
        _ => return Err(AppError::Validation("Missing data".into())),
    };
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(AppError::Validation(format!(
            "Ensure this value is between {} and {}.",
            MIN_RATING, MAX_RATING
        )));
    }

    if !restaurant_exists(&state.db, restaurant_id).await? {
        return Err(AppError::NotFound("Invalid restaurant".into()));
    }

    sqlx::query("INSERT INTO ratings (user_id, restaurant_id, rating) VALUES (?, ?, ?)")
        .bind(user.id)
        .bind(restaurant_id)
        .bind(rating)
        .execute(&state.db)
        .await?;

    tracing::info!(user_id = user.id, restaurant_id, rating, "rating submitted");
    Ok(Json(MessageResponse {
        message: "Rating submitted successfully".to_string(),
    }))
}

pub async fn my_ratings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Rating>>, AppError> {
    let ratings = sqlx::query_as::<_, Rating>("SELECT * FROM ratings WHERE user_id = ? ORDER BY id")
        .bind(user.id)
        .fetch_all(&state.db)
        .await?;
    Ok(Json(ratings))
}

pub async fn staff_restaurants(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<Json<Vec<Restaurant>>, AppError> {
    sqlx::query_as::<_, StaffRow>("SELECT * FROM staff WHERE id = ?")
        .bind(pk)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Staff member not found".into()))?;

    Ok(Json(restaurants_of(&state.db, pk).await?))
}

pub async fn restaurant_staff(
    State(state): State<AppState>,
    Path(pk): Path<i64>,
) -> Result<Json<Vec<Staff>>, AppError> {
    if !restaurant_exists(&state.db, pk).await? {
        return Err(AppError::NotFound("Restaurant not found".into()));
    }

    let rows = sqlx::query_as::<_, StaffRow>(
        "SELECT s.id, s.name FROM staff s \
         JOIN staff_restaurants sr ON sr.staff_id = s.id \
         WHERE sr.restaurant_id = ? ORDER BY s.id",
    )
    .bind(pk)
    .fetch_all(&state.db)
    .await?;

    let mut staff = Vec::with_capacity(rows.len());
    for row in rows {
        let restaurant = restaurants_of(&state.db, row.id).await?;
        staff.push(Staff {
            id: row.id,
            name: row.name,
            restaurant,
        });
    }
    Ok(Json(staff))
}

async fn restaurant_exists(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM restaurants WHERE id = ?")
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(count > 0)
}

async fn restaurants_of(db: &SqlitePool, staff_id: i64) -> Result<Vec<Restaurant>, sqlx::Error> {
    sqlx::query_as::<_, Restaurant>(
        "SELECT r.* FROM restaurants r \
         JOIN staff_restaurants sr ON sr.restaurant_id = r.id \
         WHERE sr.staff_id = ? ORDER BY r.id",
    )
    .bind(staff_id)
    .fetch_all(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_still_has_page_one() {
        let page = Page::resolve(None, 0).unwrap();
        assert_eq!(page, Page { number: 1, num_pages: 1 });
        assert_eq!(page.next_link("/x"), None);
        assert_eq!(page.previous_link("/x"), None);
    }

    #[test]
    fn links_between_pages() {
        let page = Page::resolve(Some("2"), 25).unwrap();
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.offset(), 10);
        assert_eq!(page.next_link("/x").as_deref(), Some("/x?page=3"));
        assert_eq!(page.previous_link("/x").as_deref(), Some("/x"));

        let last = Page::resolve(Some("last"), 25).unwrap();
        assert_eq!(last.number, 3);
        assert_eq!(last.next_link("/x"), None);
        assert_eq!(last.previous_link("/x").as_deref(), Some("/x?page=2"));
    }

    #[test]
    fn out_of_range_and_garbage_pages_are_rejected() {
        for raw in ["0", "-1", "4", "abc"] {
            assert!(
                matches!(Page::resolve(Some(raw), 25), Err(AppError::NotFound(_))),
                "page {raw} should be rejected"
            );
        }
    }
}
