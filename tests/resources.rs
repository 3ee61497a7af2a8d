mod common;

use axum::http::StatusCode;
use common::{get, post_json, register_and_login, send, spawn_app};
use restaurant_api::AppState;
use serde_json::{json, Value};

fn bistro(name: &str, restaurant_type: &str) -> Value {
    json!({
        "name": name,
        "website": "http://www.italianbistro.com",
        "date_opened": "2022-10-26",
        "latitude": 40.7128,
        "longitude": -74.0060,
        "restaurant_type": restaurant_type,
    })
}

async fn add(app: &axum::Router, name: &str, restaurant_type: &str) -> i64 {
    let res = send(app, post_json("/restaurants/add/", bistro(name, restaurant_type), None)).await;
    assert_eq!(res.status, StatusCode::CREATED);
    res.body["id"].as_i64().unwrap()
}

async fn link_staff(state: &AppState, name: &str, restaurant_ids: &[i64]) -> i64 {
    let staff_id: i64 = sqlx::query_scalar("INSERT INTO staff (name) VALUES (?) RETURNING id")
        .bind(name)
        .fetch_one(&state.db)
        .await
        .unwrap();
    for id in restaurant_ids {
        sqlx::query("INSERT INTO staff_restaurants (staff_id, restaurant_id) VALUES (?, ?)")
            .bind(staff_id)
            .bind(id)
            .execute(&state.db)
            .await
            .unwrap();
    }
    staff_id
}

#[tokio::test]
async fn home_lists_endpoints_without_auth() {
    let (app, _state) = spawn_app().await;

    let res = send(&app, get("/", None)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body["message"],
        "Welcome to the core app homepage! Here are the available API endpoints:"
    );
    assert_eq!(
        res.body["available_urls"],
        json!([
            "/allrestaurants",
            "/allrestaurantsbytype",
            "/allsales",
            "/allratings",
            "/counttotalrestaurants",
            "/staff/<int:pk>/restaurants/",
            "/restaurant/<int:pk>/staff/",
            "restaurants/add/",
        ])
    );
}

#[tokio::test]
async fn add_restaurant_and_query_by_type() {
    let (app, _state) = spawn_app().await;

    let res = send(
        &app,
        post_json("/restaurants/add/", bistro("The Italian Bistro", "IT"), None),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["name"], "The Italian Bistro");
    assert_eq!(res.body["date_opened"], "2022-10-26");
    assert_eq!(res.body["restaurant_type"], "IT");
    add(&app, "Curry House", "IN").await;

    let res = send(&app, get("/counttotalrestaurants", None)).await;
    assert_eq!(res.body, json!(2));

    let res = send(&app, get("/allrestaurantsbytype?type=IN", None)).await;
    assert_eq!(res.status, StatusCode::OK);
    let names: Vec<&str> = res.body.as_array().unwrap().iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Curry House"]);

    let res = send(&app, get("/allrestaurantsbytype", None)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Query parameter 'type' is required.");
}

#[tokio::test]
async fn add_restaurant_reports_field_errors() {
    let (app, _state) = spawn_app().await;

    let res = send(
        &app,
        post_json(
            "/restaurants/add/",
            json!({ "name": "Nowhere", "date_opened": "2022-10-26", "latitude": 95.0, "longitude": 0.0, "restaurant_type": "ZZ" }),
            None,
        ),
    )
    .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body,
        json!({
            "latitude": ["Ensure this value is less than or equal to 90."],
            "restaurant_type": ["\"ZZ\" is not a valid choice."],
        })
    );

    let res = send(&app, get("/counttotalrestaurants", None)).await;
    assert_eq!(res.body, json!(0));
}

#[tokio::test]
async fn restaurants_are_paginated_by_ten() {
    let (app, _state) = spawn_app().await;
    for i in 0..12 {
        add(&app, &format!("R{}", i), "OT").await;
    }

    let res = send(&app, get("/allrestaurants", None)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["count"], 12);
    assert_eq!(res.body["results"].as_array().unwrap().len(), 10);
    assert_eq!(res.body["next"], "/allrestaurants?page=2");
    assert_eq!(res.body["previous"], Value::Null);

    let res = send(&app, get("/allrestaurants?page=2", None)).await;
    assert_eq!(res.body["results"].as_array().unwrap().len(), 2);
    assert_eq!(res.body["results"][0]["name"], "R10");
    assert_eq!(res.body["next"], Value::Null);
    assert_eq!(res.body["previous"], "/allrestaurants");

    let res = send(&app, get("/allrestaurants?page=3", None)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"], "Invalid page.");
}

#[tokio::test]
async fn sales_and_ratings_require_auth() {
    let (app, state) = spawn_app().await;
    let restaurant_id = add(&app, "Taco Stand", "MX").await;
    sqlx::query("INSERT INTO sales (restaurant_id, income, datetime) VALUES (?, ?, ?)")
        .bind(restaurant_id)
        .bind(125.5)
        .bind(chrono::Utc::now())
        .execute(&state.db)
        .await
        .unwrap();

    for uri in ["/allsales", "/allratings", "/myratings/"] {
        let res = send(&app, get(uri, None)).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{uri}");
    }

    let (access, _refresh) = register_and_login(&app, "eater", "pw").await;
    let res = send(&app, get("/allsales", Some(&access))).await;
    assert_eq!(res.status, StatusCode::OK);
    let sales = res.body.as_array().unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0]["income"], "125.50");
    assert_eq!(sales[0]["restaurant"], restaurant_id);
}

#[tokio::test]
async fn submit_rating_validates_and_records() {
    let (app, _state) = spawn_app().await;
    let restaurant_id = add(&app, "Gyro Place", "GR").await;
    let (alice, _) = register_and_login(&app, "alice", "pw").await;
    let (bob, _) = register_and_login(&app, "bob", "pw").await;

    let res = send(
        &app,
        post_json("/ratings/submit/", json!({ "restaurant_id": restaurant_id }), Some(&alice)),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "Missing data");

    let res = send(
        &app,
        post_json(
            "/ratings/submit/",
            json!({ "restaurant_id": restaurant_id, "rating": 6 }),
            Some(&alice),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = send(
        &app,
        post_json("/ratings/submit/", json!({ "restaurant_id": 999, "rating": 4 }), Some(&alice)),
    )
    .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"], "Invalid restaurant");

    let res = send(
        &app,
        post_json(
            "/ratings/submit/",
            json!({ "restaurant_id": restaurant_id, "rating": 4 }),
            Some(&alice),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "Rating submitted successfully");

    send(
        &app,
        post_json(
            "/ratings/submit/",
            json!({ "restaurant_id": restaurant_id, "rating": 1 }),
            Some(&bob),
        ),
    )
    .await;

    let res = send(&app, get("/allratings", Some(&alice))).await;
    assert_eq!(res.body.as_array().unwrap().len(), 2);

    let res = send(&app, get("/myratings/", Some(&alice))).await;
    let mine = res.body.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["rating"], 4);
    assert_eq!(mine[0]["restaurant"], restaurant_id);
}

#[tokio::test]
async fn staff_and_restaurants_are_linked_both_ways() {
    let (app, state) = spawn_app().await;
    let r1 = add(&app, "One", "IT").await;
    let r2 = add(&app, "Two", "CH").await;
    let r3 = add(&app, "Three", "FF").await;
    let john = link_staff(&state, "John Doe", &[r1, r2]).await;
    link_staff(&state, "Jane Smith", &[r2, r3]).await;

    let res = send(&app, get(&format!("/staff/{}/restaurants/", john), None)).await;
    assert_eq!(res.status, StatusCode::OK);
    let names: Vec<&str> = res.body.as_array().unwrap().iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["One", "Two"]);

    let res = send(&app, get(&format!("/restaurant/{}/staff/", r2), None)).await;
    assert_eq!(res.status, StatusCode::OK);
    let staff = res.body.as_array().unwrap();
    assert_eq!(staff.len(), 2);
    assert_eq!(staff[0]["name"], "John Doe");
    assert_eq!(staff[0]["restaurant"].as_array().unwrap().len(), 2);
    assert_eq!(staff[1]["restaurant"][1]["name"], "Three");

    let res = send(&app, get("/staff/999/restaurants/", None)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"], "Staff member not found");

    let res = send(&app, get("/restaurant/999/staff/", None)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"], "Restaurant not found");
}
