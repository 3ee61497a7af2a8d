use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum RestaurantType {
    #[serde(rename = "IN")]
    #[sqlx(rename = "IN")]
    Indian,
    #[serde(rename = "CH")]
    #[sqlx(rename = "CH")]
    Chinese,
    #[serde(rename = "IT")]
    #[sqlx(rename = "IT")]
    Italian,
    #[serde(rename = "GR")]
    #[sqlx(rename = "GR")]
    Greek,
    #[serde(rename = "MX")]
    #[sqlx(rename = "MX")]
    Mexican,
    #[serde(rename = "FF")]
    #[sqlx(rename = "FF")]
    FastFood,
    #[serde(rename = "OT")]
    #[sqlx(rename = "OT")]
    Other,
}

impl RestaurantType {
    pub const ALL: [RestaurantType; 7] = [
        RestaurantType::Indian,
        RestaurantType::Chinese,
        RestaurantType::Italian,
        RestaurantType::Greek,
        RestaurantType::Mexican,
        RestaurantType::FastFood,
        RestaurantType::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            RestaurantType::Indian => "IN",
            RestaurantType::Chinese => "CH",
            RestaurantType::Italian => "IT",
            RestaurantType::Greek => "GR",
            RestaurantType::Mexican => "MX",
            RestaurantType::FastFood => "FF",
            RestaurantType::Other => "OT",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub website: String,
    pub date_opened: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    pub restaurant_type: RestaurantType,
}

/// Create body. Fields stay optional so every problem can be reported per field.
#[derive(Debug, Default, Deserialize)]
pub struct CreateRestaurant {
    pub name: Option<String>,
    pub website: Option<String>,
    pub date_opened: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub restaurant_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRestaurant {
    pub name: String,
    pub website: String,
    pub date_opened: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
    pub restaurant_type: RestaurantType,
}

const REQUIRED: &str = "This field is required.";

impl CreateRestaurant {
    /// Checks every field and returns either a record ready to insert or all
    /// messages keyed by field name.
    pub fn validate(self) -> Result<NewRestaurant, BTreeMap<&'static str, Vec<String>>> {
        let mut errors: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();

        let name = match self.name.filter(|n| !n.trim().is_empty()) {
            None => {
                errors.entry("name").or_default().push(REQUIRED.into());
                None
            }
            Some(n) if n.chars().count() > 100 => {
                errors
                    .entry("name")
                    .or_default()
                    .push("Ensure this field has no more than 100 characters.".into());
                None
            }
            Some(n) => Some(n),
        };

        let website = self.website.unwrap_or_default();
        if !website.is_empty() && !is_http_url(&website) {
            errors
                .entry("website")
                .or_default()
                .push("Enter a valid URL.".into());
        }

        let date_opened = match self.date_opened.as_deref() {
            None | Some("") => {
                errors.entry("date_opened").or_default().push(REQUIRED.into());
                None
            }
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(d) => Some(d),
                Err(_) => {
                    errors.entry("date_opened").or_default().push(
                        "Date has wrong format. Use one of these formats instead: YYYY-MM-DD."
                            .into(),
                    );
                    None
                }
            },
        };

        let latitude = check_range(&mut errors, "latitude", self.latitude, -90.0, 90.0);
        let longitude = check_range(&mut errors, "longitude", self.longitude, -180.0, 180.0);

        let restaurant_type = match self.restaurant_type.as_deref() {
            None | Some("") => {
                errors
                    .entry("restaurant_type")
                    .or_default()
                    .push(REQUIRED.into());
                None
            }
            Some(code) => match RestaurantType::from_code(code) {
                Some(t) => Some(t),
                None => {
                    errors
                        .entry("restaurant_type")
                        .or_default()
                        .push(format!("\"{}\" is not a valid choice.", code));
                    None
                }
            },
        };

        match (name, date_opened, latitude, longitude, restaurant_type) {
            (Some(name), Some(date_opened), Some(latitude), Some(longitude), Some(restaurant_type))
                if errors.is_empty() =>
            {
                Ok(NewRestaurant {
                    name,
                    website,
                    date_opened,
                    latitude,
                    longitude,
                    restaurant_type,
                })
            }
            _ => Err(errors),
        }
    }
}

fn check_range(
    errors: &mut BTreeMap<&'static str, Vec<String>>,
    field: &'static str,
    value: Option<f64>,
    min: f64,
    max: f64,
) -> Option<f64> {
    match value {
        None => {
            errors.entry(field).or_default().push(REQUIRED.into());
            None
        }
        Some(v) if v < min => {
            errors
                .entry(field)
                .or_default()
                .push(format!("Ensure this value is greater than or equal to {}.", min));
            None
        }
        Some(v) if v > max => {
            errors
                .entry(field)
                .or_default()
                .push(format!("Ensure this value is less than or equal to {}.", max));
            None
        }
        Some(v) => Some(v),
    }
}

fn is_http_url(raw: &str) -> bool {
    match url::Url::parse(raw) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.host_str().is_some(),
        Err(_) => false,
    }
}
