//! Listing query types.
//!
//! A [`ListingQuery`] is the validated, typed form of a search request:
//! - ListingFilter: constraints on base listing attributes
//! - VehicleFilter: constraints on vehicle attributes (vehicle category only)
//! - SortKey: requested ordering
//! - PageRequest: the requested page window

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::pager::PageRequest;
use crate::models::{AdType, BodyType, Category, City, Color, FuelType, Manufacturer, Money};

/// Inclusive range with optional bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range<T> {
    pub from: Option<T>,
    pub to: Option<T>,
}

impl<T> Default for Range<T> {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
        }
    }
}

impl<T: PartialOrd> Range<T> {
    pub fn new(from: Option<T>, to: Option<T>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.from.as_ref().is_none_or(|from| value >= from)
            && self.to.as_ref().is_none_or(|to| value <= to)
    }
}

/// Constraints on base listing attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub category: Option<Category>,
    pub location: Option<City>,
    pub ad_type: Option<AdType>,
    pub created: Range<DateTime<Utc>>,
    pub price: Range<Money>,
    /// Case-insensitive title substring.
    pub title_search: Option<String>,
    /// Restrict to one owner's listings.
    pub owner: Option<Uuid>,
}

/// Constraints on vehicle attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleFilter {
    pub manufacturer: Option<Manufacturer>,
    pub body_type: Option<BodyType>,
    pub fuel_type: Option<FuelType>,
    pub color: Option<Color>,
    pub year: Range<i32>,
    pub mileage: Range<i64>,
}

/// Requested result ordering. Every order is tie-broken by listing id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Listing id ascending (insertion order for v7 ids).
    #[default]
    Id,
    Newest,
    Oldest,
    PriceLowToHigh,
    PriceHighToLow,
}

impl SortKey {
    /// Parse a `sort` parameter token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "newest" => Some(SortKey::Newest),
            "oldest" => Some(SortKey::Oldest),
            "priceLowToHigh" => Some(SortKey::PriceLowToHigh),
            "priceHighToLow" => Some(SortKey::PriceHighToLow),
            _ => None,
        }
    }
}

/// A validated listing search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub filter: ListingFilter,
    /// Present only when the category filter selects vehicles.
    pub vehicle: Option<VehicleFilter>,
    pub sort: SortKey,
    pub page: PageRequest,
}

impl ListingQuery {
    /// Same query restricted to one owner.
    pub fn owned_by(mut self, owner: Uuid) -> Self {
        self.filter.owner = Some(owner);
        self
    }
}
