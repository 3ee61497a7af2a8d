//! Creates three staff members and links each to two of the first three restaurants.

use restaurant_api::{config::Config, db, models::restaurant::Restaurant};
use sqlx::SqlitePool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STAFF: [(&str, [usize; 2]); 3] = [
    ("John Doe", [0, 1]),
    ("Jane Smith", [1, 2]),
    ("Alice Johnson", [0, 2]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "seed_staff=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let pool = db::connect(&config.database_url, config.db_max_connections).await?;
    db::run_migrations(&pool).await?;

    let restaurants = sqlx::query_as::<_, Restaurant>("SELECT * FROM restaurants ORDER BY id LIMIT 3")
        .fetch_all(&pool)
        .await?;
    if restaurants.len() < 3 {
        tracing::error!(
            "Not enough restaurants! Found {}, need at least 3.",
            restaurants.len()
        );
        std::process::exit(1);
    }

    for (name, picks) in STAFF {
        let linked: Vec<&Restaurant> = picks.iter().map(|&i| &restaurants[i]).collect();
        seed_one(&pool, name, &linked).await?;
        let names: Vec<&str> = linked.iter().map(|r| r.name.as_str()).collect();
        tracing::info!("{} -> {:?}", name, names);
    }

    Ok(())
}

async fn seed_one(pool: &SqlitePool, name: &str, restaurants: &[&Restaurant]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let staff_id = sqlx::query_scalar::<_, i64>("INSERT INTO staff (name) VALUES (?) RETURNING id")
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

    for restaurant in restaurants {
        sqlx::query("INSERT OR IGNORE INTO staff_restaurants (staff_id, restaurant_id) VALUES (?, ?)")
            .bind(staff_id)
            .bind(restaurant.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await
}
