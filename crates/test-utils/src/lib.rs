//! Oglas test utilities.
//!
//! Fixture builders that produce API request payloads, plus small
//! assertion helpers for JSON responses.

use chrono::{DateTime, Duration, Utc};
use serde_json::{Value as JsonValue, json};

/// Create a general-category listing payload with default values.
pub fn test_listing(title: &str) -> TestListing {
    TestListing {
        title: title.to_string(),
        description: format!("{title} in good condition"),
        price: "100.00".to_string(),
        ad_type: "sale".to_string(),
        location: "belgrade".to_string(),
        category: "general".to_string(),
        image_urls: Vec::new(),
        vehicle: None,
    }
}

/// Create a vehicle listing payload for the given make and model year.
pub fn test_vehicle_listing(title: &str, manufacturer: &str, year: i32) -> TestListing {
    test_listing(title).with_vehicle(test_vehicle(manufacturer, year))
}

/// Create vehicle details with default values.
pub fn test_vehicle(manufacturer: &str, year: i32) -> TestVehicle {
    TestVehicle {
        manufacturer: manufacturer.to_string(),
        year,
        mileage: 120_000,
        fuel_type: "diesel".to_string(),
        color: "black".to_string(),
        body_type: "sedan".to_string(),
    }
}

/// A listing payload builder.
#[derive(Debug, Clone)]
pub struct TestListing {
    pub title: String,
    pub description: String,
    pub price: String,
    pub ad_type: String,
    pub location: String,
    pub category: String,
    pub image_urls: Vec<String>,
    pub vehicle: Option<TestVehicle>,
}

impl TestListing {
    /// Set the price (decimal string, e.g. "9500.00").
    pub fn with_price(mut self, price: &str) -> Self {
        self.price = price.to_string();
        self
    }

    /// Set the city token.
    pub fn in_city(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    /// Offer for rent instead of sale.
    pub fn for_rent(mut self) -> Self {
        self.ad_type = "rent".to_string();
        self
    }

    /// Set the category without touching vehicle details.
    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    /// Attach vehicle details and switch to the vehicle category.
    pub fn with_vehicle(mut self, vehicle: TestVehicle) -> Self {
        self.category = "vehicle".to_string();
        self.vehicle = Some(vehicle);
        self
    }

    pub fn with_image(mut self, url: &str) -> Self {
        self.image_urls.push(url.to_string());
        self
    }

    /// Render as a `POST /api/ads` body.
    pub fn to_json(&self) -> JsonValue {
        let mut body = json!({
            "title": self.title,
            "description": self.description,
            "price": self.price,
            "adType": self.ad_type,
            "location": self.location,
            "category": self.category,
            "image_urls": self.image_urls,
        });
        if let (Some(vehicle), Some(map)) = (&self.vehicle, body.as_object_mut()) {
            map.insert("vehicle".to_string(), vehicle.to_json());
        }
        body
    }
}

/// Vehicle details builder.
#[derive(Debug, Clone)]
pub struct TestVehicle {
    pub manufacturer: String,
    pub year: i32,
    pub mileage: i64,
    pub fuel_type: String,
    pub color: String,
    pub body_type: String,
}

impl TestVehicle {
    pub fn with_mileage(mut self, mileage: i64) -> Self {
        self.mileage = mileage;
        self
    }

    pub fn with_fuel(mut self, fuel_type: &str) -> Self {
        self.fuel_type = fuel_type.to_string();
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    pub fn with_body(mut self, body_type: &str) -> Self {
        self.body_type = body_type.to_string();
        self
    }

    pub fn to_json(&self) -> JsonValue {
        json!({
            "manufacturer": self.manufacturer,
            "year": self.year,
            "mileage": self.mileage,
            "fuel_type": self.fuel_type,
            "color": self.color,
            "body_type": self.body_type,
        })
    }
}

/// `POST /api/auctions` body ending `ends_in` from now.
pub fn auction_payload(ad_id: &str, starting_price: &str, ends_in: Duration) -> JsonValue {
    let end_time: DateTime<Utc> = Utc::now() + ends_in;
    json!({
        "ad": ad_id,
        "starting_price": starting_price,
        "end_time": end_time.to_rfc3339(),
    })
}

/// Join `key=value` pairs into a query string (values must be URL-safe).
pub fn query_string(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a paginated response has the expected shape and count.
    pub fn page(value: &Value, count: u64, results: usize) {
        for key in ["count", "next", "previous", "results", "total_pages"] {
            has_key(value, key);
        }
        assert_eq!(value["count"], count, "count mismatch in {value}");
        let len = value["results"].as_array().map_or(0, Vec::len);
        assert_eq!(len, results, "result length mismatch in {value}");
    }

    /// Assert that an error response carries a message containing `needle`.
    pub fn error_contains(value: &Value, needle: &str) {
        let message = value["error"].as_str().unwrap_or_default();
        assert!(
            message.contains(needle),
            "Expected error containing '{needle}', got: {value}"
        );
    }
}
