//! Listing (ad) model.
//!
//! A listing is a base record plus a category-tagged detail payload. Only
//! the vehicle category carries a specialization record, stored separately
//! and keyed by the listing id. Stores hand back a [`ListingRecord`] (the
//! raw composition) and [`Listing::from_record`] enforces that the
//! specialization is present exactly when the category demands it.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::choices::{AdType, BodyType, Category, City, Color, FuelType, Manufacturer};
use super::money::Money;

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 255;

/// Maximum length of a single image reference.
pub const MAX_IMAGE_URL_LEN: usize = 500;

/// Earliest accepted model year.
pub const MIN_VEHICLE_YEAR: i32 = 1900;

/// Base attributes shared by every listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingBase {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Money,
    pub ad_type: AdType,
    pub location: City,
    pub address: String,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_id: Uuid,
    pub is_active: bool,
    pub featured: bool,
}

/// Vehicle specialization attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleAttributes {
    pub manufacturer: Manufacturer,
    pub year: i32,
    pub mileage: i64,
    pub fuel_type: FuelType,
    pub color: Color,
    pub body_type: BodyType,
}

/// Category-specific payload of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum ListingDetails {
    General,
    Vehicle(VehicleAttributes),
    Motorcycle,
    House,
}

impl ListingDetails {
    pub fn category(&self) -> Category {
        match self {
            ListingDetails::General => Category::General,
            ListingDetails::Vehicle(_) => Category::Vehicle,
            ListingDetails::Motorcycle => Category::Motorcycle,
            ListingDetails::House => Category::House,
        }
    }

    pub fn vehicle(&self) -> Option<&VehicleAttributes> {
        match self {
            ListingDetails::Vehicle(v) => Some(v),
            _ => None,
        }
    }
}

/// A fully assembled listing.
///
/// Serializes flat: base attributes, `category`, and for vehicles the merged
/// vehicle attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    #[serde(flatten)]
    pub base: ListingBase,
    #[serde(flatten)]
    pub details: ListingDetails,
}

/// Raw listing composition as persisted: base row, category tag, and the
/// specialization row if one exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub base: ListingBase,
    pub category: Category,
    pub vehicle: Option<VehicleAttributes>,
}

/// Specialization records disagree with the category tag.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("vehicle listing {0} has no vehicle details")]
    MissingVehicleDetails(Uuid),

    #[error("{category} listing {id} has orphaned vehicle details")]
    OrphanedVehicleDetails { id: Uuid, category: Category },
}

impl Listing {
    pub fn id(&self) -> Uuid {
        self.base.id
    }

    pub fn category(&self) -> Category {
        self.details.category()
    }

    /// Assemble a listing, checking the category/specialization invariant.
    pub fn from_record(record: ListingRecord) -> Result<Self, IntegrityError> {
        let ListingRecord {
            base,
            category,
            vehicle,
        } = record;

        let details = match (category, vehicle) {
            (Category::Vehicle, Some(v)) => ListingDetails::Vehicle(v),
            (Category::Vehicle, None) => {
                return Err(IntegrityError::MissingVehicleDetails(base.id));
            }
            (category, Some(_)) => {
                return Err(IntegrityError::OrphanedVehicleDetails {
                    id: base.id,
                    category,
                });
            }
            (Category::General, None) => ListingDetails::General,
            (Category::Motorcycle, None) => ListingDetails::Motorcycle,
            (Category::House, None) => ListingDetails::House,
        };

        Ok(Self { base, details })
    }

    /// Split back into the persisted composition.
    pub fn into_record(self) -> ListingRecord {
        let category = self.details.category();
        let vehicle = match self.details {
            ListingDetails::Vehicle(v) => Some(v),
            _ => None,
        };
        ListingRecord {
            base: self.base,
            category,
            vehicle,
        }
    }
}

/// Invalid listing input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Input for creating a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price: Money,
    #[serde(alias = "adType")]
    pub ad_type: AdType,
    pub location: City,
    #[serde(default)]
    pub address: String,
    #[serde(default, alias = "imageUrls")]
    pub image_urls: Vec<String>,
    pub category: Category,
    #[serde(default)]
    pub featured: bool,
    /// Required when `category` is vehicle, rejected otherwise.
    #[serde(default)]
    pub vehicle: Option<NewVehicle>,
}

/// Vehicle specialization input.
#[derive(Debug, Clone, Deserialize)]
pub struct NewVehicle {
    pub manufacturer: Manufacturer,
    pub year: i32,
    pub mileage: i64,
    #[serde(alias = "fuelType")]
    pub fuel_type: FuelType,
    pub color: Color,
    #[serde(alias = "car_type", alias = "bodyType")]
    pub body_type: BodyType,
}

impl NewVehicle {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        validate_year(self.year, now)?;
        validate_mileage(self.mileage)
    }

    pub fn into_attributes(self) -> VehicleAttributes {
        VehicleAttributes {
            manufacturer: self.manufacturer,
            year: self.year,
            mileage: self.mileage,
            fuel_type: self.fuel_type,
            color: self.color,
            body_type: self.body_type,
        }
    }
}

impl NewListing {
    /// Check every field before anything touches the store.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;
        validate_image_urls(&self.image_urls)?;

        match (self.category, &self.vehicle) {
            (Category::Vehicle, Some(vehicle)) => vehicle.validate(now),
            (Category::Vehicle, None) => Err(ValidationError::new(
                "vehicle",
                "vehicle details are required for vehicle listings",
            )),
            (category, Some(_)) => Err(ValidationError::new(
                "vehicle",
                format!("vehicle details are not allowed for {category} listings"),
            )),
            (_, None) => Ok(()),
        }
    }

    /// Build the persisted composition for a new listing.
    pub fn into_record(self, id: Uuid, owner_id: Uuid, now: DateTime<Utc>) -> ListingRecord {
        ListingRecord {
            base: ListingBase {
                id,
                title: self.title.trim().to_string(),
                description: self.description,
                price: self.price,
                ad_type: self.ad_type,
                location: self.location,
                address: self.address,
                image_urls: self.image_urls,
                created_at: now,
                updated_at: now,
                owner_id,
                is_active: true,
                featured: self.featured,
            },
            category: self.category,
            vehicle: self.vehicle.map(NewVehicle::into_attributes),
        }
    }
}

/// Partial update of a listing. The category is immutable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    #[serde(alias = "adType")]
    pub ad_type: Option<AdType>,
    pub location: Option<City>,
    pub address: Option<String>,
    #[serde(alias = "imageUrls")]
    pub image_urls: Option<Vec<String>>,
    #[serde(alias = "isActive")]
    pub is_active: Option<bool>,
    pub featured: Option<bool>,
    pub vehicle: Option<VehicleUpdate>,
}

/// Partial update of vehicle attributes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleUpdate {
    pub manufacturer: Option<Manufacturer>,
    pub year: Option<i32>,
    pub mileage: Option<i64>,
    #[serde(alias = "fuelType")]
    pub fuel_type: Option<FuelType>,
    pub color: Option<Color>,
    #[serde(alias = "car_type", alias = "bodyType")]
    pub body_type: Option<BodyType>,
}

impl ListingUpdate {
    /// Apply to an existing listing, producing the updated listing.
    ///
    /// Nothing is modified when validation fails.
    pub fn apply(self, listing: &Listing, now: DateTime<Utc>) -> Result<Listing, ValidationError> {
        let mut updated = listing.clone();
        let base = &mut updated.base;

        if let Some(title) = self.title {
            validate_title(&title)?;
            base.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            validate_description(&description)?;
            base.description = description;
        }
        if let Some(price) = self.price {
            base.price = price;
        }
        if let Some(ad_type) = self.ad_type {
            base.ad_type = ad_type;
        }
        if let Some(location) = self.location {
            base.location = location;
        }
        if let Some(address) = self.address {
            base.address = address;
        }
        if let Some(image_urls) = self.image_urls {
            validate_image_urls(&image_urls)?;
            base.image_urls = image_urls;
        }
        if let Some(is_active) = self.is_active {
            base.is_active = is_active;
        }
        if let Some(featured) = self.featured {
            base.featured = featured;
        }

        if let Some(patch) = self.vehicle {
            let ListingDetails::Vehicle(vehicle) = &mut updated.details else {
                return Err(ValidationError::new(
                    "vehicle",
                    format!(
                        "vehicle details cannot be set on a {} listing",
                        listing.category()
                    ),
                ));
            };
            patch.apply(vehicle, now)?;
        }

        updated.base.updated_at = now;
        Ok(updated)
    }
}

impl VehicleUpdate {
    fn apply(self, vehicle: &mut VehicleAttributes, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if let Some(manufacturer) = self.manufacturer {
            vehicle.manufacturer = manufacturer;
        }
        if let Some(year) = self.year {
            validate_year(year, now)?;
            vehicle.year = year;
        }
        if let Some(mileage) = self.mileage {
            validate_mileage(mileage)?;
            vehicle.mileage = mileage;
        }
        if let Some(fuel_type) = self.fuel_type {
            vehicle.fuel_type = fuel_type;
        }
        if let Some(color) = self.color {
            vehicle.color = color;
        }
        if let Some(body_type) = self.body_type {
            vehicle.body_type = body_type;
        }
        Ok(())
    }
}

pub(super) fn validate_title(title: &str) -> Result<(), ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::new("title", "must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::new(
            "title",
            format!("must be at most {MAX_TITLE_LEN} characters"),
        ));
    }
    Ok(())
}

pub(super) fn validate_description(description: &str) -> Result<(), ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::new("description", "must not be empty"));
    }
    Ok(())
}

fn validate_image_urls(urls: &[String]) -> Result<(), ValidationError> {
    for raw in urls {
        if raw.len() > MAX_IMAGE_URL_LEN {
            return Err(ValidationError::new(
                "image_urls",
                format!("image URL exceeds {MAX_IMAGE_URL_LEN} characters"),
            ));
        }
        let parsed = url::Url::parse(raw)
            .map_err(|e| ValidationError::new("image_urls", format!("'{raw}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ValidationError::new(
                "image_urls",
                format!("'{raw}': only http and https URLs are accepted"),
            ));
        }
    }
    Ok(())
}

fn validate_year(year: i32, now: DateTime<Utc>) -> Result<(), ValidationError> {
    let latest = now.year() + 1;
    if !(MIN_VEHICLE_YEAR..=latest).contains(&year) {
        return Err(ValidationError::new(
            "year",
            format!("must be between {MIN_VEHICLE_YEAR} and {latest}"),
        ));
    }
    Ok(())
}

fn validate_mileage(mileage: i64) -> Result<(), ValidationError> {
    if mileage < 0 {
        return Err(ValidationError::new("mileage", "must not be negative"));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn base(id: Uuid) -> ListingBase {
        ListingBase {
            id,
            title: "Golf 7".to_string(),
            description: "Well kept".to_string(),
            price: Money::from_major(9_500).unwrap(),
            ad_type: AdType::Sale,
            location: City::Belgrade,
            address: String::new(),
            image_urls: vec![],
            created_at: now(),
            updated_at: now(),
            owner_id: Uuid::nil(),
            is_active: true,
            featured: false,
        }
    }

    fn golf() -> VehicleAttributes {
        VehicleAttributes {
            manufacturer: Manufacturer::Volkswagen,
            year: 2016,
            mileage: 150_000,
            fuel_type: FuelType::Diesel,
            color: Color::Gray,
            body_type: BodyType::Hatchback,
        }
    }

    fn new_vehicle_listing() -> NewListing {
        serde_json::from_value(serde_json::json!({
            "title": "Golf 7",
            "description": "Well kept",
            "price": "9500.00",
            "adType": "sale",
            "location": "belgrade",
            "category": "vehicle",
            "vehicle": {
                "manufacturer": "Volkswagen",
                "year": 2016,
                "mileage": 150000,
                "fuel_type": "diesel",
                "color": "grey",
                "car_type": "hatchback"
            }
        }))
        .unwrap()
    }

    #[test]
    fn vehicle_record_assembles() {
        let id = Uuid::now_v7();
        let listing = Listing::from_record(ListingRecord {
            base: base(id),
            category: Category::Vehicle,
            vehicle: Some(golf()),
        })
        .unwrap();

        assert_eq!(listing.category(), Category::Vehicle);
        assert_eq!(listing.details.vehicle(), Some(&golf()));
    }

    #[test]
    fn vehicle_without_details_is_integrity_error() {
        let id = Uuid::now_v7();
        let err = Listing::from_record(ListingRecord {
            base: base(id),
            category: Category::Vehicle,
            vehicle: None,
        })
        .unwrap_err();

        assert_eq!(err, IntegrityError::MissingVehicleDetails(id));
    }

    #[test]
    fn orphaned_details_are_integrity_error() {
        let id = Uuid::now_v7();
        let err = Listing::from_record(ListingRecord {
            base: base(id),
            category: Category::House,
            vehicle: Some(golf()),
        })
        .unwrap_err();

        assert!(matches!(err, IntegrityError::OrphanedVehicleDetails { .. }));
    }

    #[test]
    fn serializes_flat_with_vehicle_attributes() {
        let listing = Listing::from_record(ListingRecord {
            base: base(Uuid::nil()),
            category: Category::Vehicle,
            vehicle: Some(golf()),
        })
        .unwrap();

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["category"], "vehicle");
        assert_eq!(json["manufacturer"], "volkswagen");
        assert_eq!(json["year"], 2016);
        assert_eq!(json["price"], "9500.00");
        assert_eq!(json["title"], "Golf 7");
    }

    #[test]
    fn serializes_general_without_vehicle_fields() {
        let listing = Listing::from_record(ListingRecord {
            base: base(Uuid::nil()),
            category: Category::General,
            vehicle: None,
        })
        .unwrap();

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["category"], "general");
        assert!(json.get("manufacturer").is_none());
    }

    #[test]
    fn new_vehicle_listing_validates() {
        let input = new_vehicle_listing();
        input.validate(now()).unwrap();

        let record = input.into_record(Uuid::nil(), Uuid::nil(), now());
        assert_eq!(record.category, Category::Vehicle);
        assert_eq!(record.vehicle, Some(golf()));
        assert!(record.base.is_active);
    }

    #[test]
    fn vehicle_listing_requires_details() {
        let mut input = new_vehicle_listing();
        input.vehicle = None;

        let err = input.validate(now()).unwrap_err();
        assert_eq!(err.field, "vehicle");
    }

    #[test]
    fn non_vehicle_listing_rejects_details() {
        let mut input = new_vehicle_listing();
        input.category = Category::House;

        let err = input.validate(now()).unwrap_err();
        assert_eq!(err.field, "vehicle");
    }

    #[test]
    fn rejects_future_model_year_and_negative_mileage() {
        let mut input = new_vehicle_listing();
        if let Some(v) = input.vehicle.as_mut() {
            v.year = 2030;
        }
        assert_eq!(input.validate(now()).unwrap_err().field, "year");

        let mut input = new_vehicle_listing();
        if let Some(v) = input.vehicle.as_mut() {
            v.mileage = -1;
        }
        assert_eq!(input.validate(now()).unwrap_err().field, "mileage");
    }

    #[test]
    fn rejects_blank_title_and_bad_image_urls() {
        let mut input = new_vehicle_listing();
        input.title = "   ".to_string();
        assert_eq!(input.validate(now()).unwrap_err().field, "title");

        let mut input = new_vehicle_listing();
        input.image_urls = vec!["ftp://example.com/a.jpg".to_string()];
        assert_eq!(input.validate(now()).unwrap_err().field, "image_urls");

        let mut input = new_vehicle_listing();
        input.image_urls = vec!["not a url".to_string()];
        assert_eq!(input.validate(now()).unwrap_err().field, "image_urls");
    }

    #[test]
    fn update_patches_base_and_vehicle_fields() {
        let listing = Listing::from_record(ListingRecord {
            base: base(Uuid::nil()),
            category: Category::Vehicle,
            vehicle: Some(golf()),
        })
        .unwrap();

        let later = now() + chrono::Duration::hours(1);
        let update = ListingUpdate {
            price: Some(Money::from_major(9_000).unwrap()),
            vehicle: Some(VehicleUpdate {
                mileage: Some(151_000),
                ..Default::default()
            }),
            ..Default::default()
        };

        let updated = update.apply(&listing, later).unwrap();
        assert_eq!(updated.base.price, Money::from_major(9_000).unwrap());
        assert_eq!(updated.details.vehicle().map(|v| v.mileage), Some(151_000));
        assert_eq!(updated.base.updated_at, later);
        assert_eq!(updated.base.created_at, listing.base.created_at);
    }

    #[test]
    fn update_rejects_vehicle_patch_on_general_listing() {
        let listing = Listing::from_record(ListingRecord {
            base: base(Uuid::nil()),
            category: Category::General,
            vehicle: None,
        })
        .unwrap();

        let update = ListingUpdate {
            vehicle: Some(VehicleUpdate::default()),
            ..Default::default()
        };
        assert_eq!(update.apply(&listing, now()).unwrap_err().field, "vehicle");
    }

    #[test]
    fn update_rejects_category_change() {
        let parsed = serde_json::from_value::<ListingUpdate>(serde_json::json!({
            "category": "house"
        }));
        assert!(parsed.is_err());
    }
}
