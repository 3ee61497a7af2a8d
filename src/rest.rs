use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{auth, resources},
    middleware::request_timer,
    AppState,
};

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register/", post(auth::register))
        .route("/login/", post(auth::login))
        .route("/logout/", post(auth::logout))
        .route("/token/refresh/", post(auth::refresh))
        .route("/dashboard/", get(auth::dashboard))
        .route("/profile/", get(auth::profile))
}

fn resource_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(resources::home))
        .route("/allrestaurants", get(resources::list_restaurants))
        .route("/allrestaurantsbytype", get(resources::list_restaurants_by_type))
        .route("/counttotalrestaurants", get(resources::count_restaurants))
        .route("/restaurants/add/", post(resources::add_restaurant))
        .route("/allsales", get(resources::list_sales))
        .route("/allratings", get(resources::list_ratings))
        .route("/ratings/submit/", post(resources::submit_rating))
        .route("/myratings/", get(resources::my_ratings))
        .route("/staff/:pk/restaurants/", get(resources::staff_restaurants))
        .route("/restaurant/:pk/staff/", get(resources::restaurant_staff))
}

/// Builds the request pipeline: timing wraps routing, and authentication is
/// resolved per handler by the `AuthUser` extractor.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(auth_routes())
        .merge(resource_routes())
        .layer(middleware::from_fn(request_timer))
        .with_state(state)
}
