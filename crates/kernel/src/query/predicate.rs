//! In-process evaluation of listing queries.
//!
//! Mirrors the SQL produced by [`super::builder::ListingQueryBuilder`] so the
//! memory store and the PostgreSQL store agree on membership and order.

use std::cmp::Ordering;

use super::types::{ListingFilter, ListingQuery, SortKey, VehicleFilter};
use crate::models::{ListingBase, ListingRecord, VehicleAttributes};

impl ListingFilter {
    pub fn matches(&self, record: &ListingRecord) -> bool {
        let base = &record.base;

        self.category.is_none_or(|c| c == record.category)
            && self.location.is_none_or(|l| l == base.location)
            && self.ad_type.is_none_or(|t| t == base.ad_type)
            && self.owner.is_none_or(|o| o == base.owner_id)
            && self.created.contains(&base.created_at)
            && self.price.contains(&base.price)
            && self
                .title_search
                .as_deref()
                .is_none_or(|needle| title_contains(&base.title, needle))
    }
}

impl VehicleFilter {
    pub fn matches(&self, vehicle: &VehicleAttributes) -> bool {
        self.manufacturer.is_none_or(|m| m == vehicle.manufacturer)
            && self.body_type.is_none_or(|b| b == vehicle.body_type)
            && self.fuel_type.is_none_or(|f| f == vehicle.fuel_type)
            && self.color.is_none_or(|c| c == vehicle.color)
            && self.year.contains(&vehicle.year)
            && self.mileage.contains(&vehicle.mileage)
    }
}

impl ListingQuery {
    /// Whether a stored listing belongs to the result set.
    ///
    /// Vehicle searches only consider listings that have vehicle details.
    pub fn matches(&self, record: &ListingRecord) -> bool {
        if !self.filter.matches(record) {
            return false;
        }
        match (&self.vehicle, &record.vehicle) {
            (None, _) => true,
            (Some(filter), Some(vehicle)) => filter.matches(vehicle),
            (Some(_), None) => false,
        }
    }
}

impl SortKey {
    /// Total order over listings, ties broken by id ascending.
    pub fn compare(self, a: &ListingBase, b: &ListingBase) -> Ordering {
        let primary = match self {
            SortKey::Id => Ordering::Equal,
            SortKey::Newest => b.created_at.cmp(&a.created_at),
            SortKey::Oldest => a.created_at.cmp(&b.created_at),
            SortKey::PriceLowToHigh => a.price.cmp(&b.price),
            SortKey::PriceHighToLow => b.price.cmp(&a.price),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

fn title_contains(title: &str, needle: &str) -> bool {
    title.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{
        AdType, BodyType, Category, City, Color, FuelType, Manufacturer, Money,
    };
    use crate::query::types::Range;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn record(n: u128, price: i64, category: Category) -> ListingRecord {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n as i64);
        ListingRecord {
            base: ListingBase {
                id: Uuid::from_u128(n),
                title: format!("Listing {n}"),
                description: "desc".to_string(),
                price: Money::from_major(price).unwrap(),
                ad_type: AdType::Sale,
                location: City::Belgrade,
                address: String::new(),
                image_urls: vec![],
                created_at: created,
                updated_at: created,
                owner_id: Uuid::nil(),
                is_active: true,
                featured: false,
            },
            category,
            vehicle: (category == Category::Vehicle).then(|| VehicleAttributes {
                manufacturer: Manufacturer::Toyota,
                year: 2010 + n as i32,
                mileage: 10_000,
                fuel_type: FuelType::Petrol,
                color: Color::Red,
                body_type: BodyType::Sedan,
            }),
        }
    }

    #[test]
    fn empty_query_matches_everything() {
        let q = ListingQuery::default();
        assert!(q.matches(&record(1, 10, Category::General)));
        assert!(q.matches(&record(2, 10, Category::Vehicle)));
    }

    #[test]
    fn title_search_is_case_insensitive() {
        let mut q = ListingQuery::default();
        q.filter.title_search = Some("LISTING 1".to_string());
        assert!(q.matches(&record(1, 10, Category::General)));

        q.filter.title_search = Some("nothing".to_string());
        assert!(!q.matches(&record(1, 10, Category::General)));
    }

    #[test]
    fn vehicle_search_requires_vehicle_details() {
        let mut q = ListingQuery::default();
        q.filter.category = Some(Category::Vehicle);
        q.vehicle = Some(VehicleFilter {
            year: Range::new(Some(2015), None),
            ..Default::default()
        });

        assert!(q.matches(&record(6, 10, Category::Vehicle)));
        assert!(!q.matches(&record(3, 10, Category::Vehicle)));

        let mut broken = record(7, 10, Category::Vehicle);
        broken.vehicle = None;
        assert!(!q.matches(&broken));
    }

    #[test]
    fn price_orders_are_reverses_for_distinct_prices() {
        let mut rows: Vec<_> = [(1, 30), (2, 10), (3, 20)]
            .into_iter()
            .map(|(n, p)| record(n, p, Category::General).base)
            .collect();

        rows.sort_by(|a, b| SortKey::PriceLowToHigh.compare(a, b));
        let asc: Vec<_> = rows.iter().map(|r| r.id).collect();
        rows.sort_by(|a, b| SortKey::PriceHighToLow.compare(a, b));
        let mut desc: Vec<_> = rows.iter().map(|r| r.id).collect();
        desc.reverse();

        assert_eq!(asc, desc);
    }

    #[test]
    fn ties_break_by_id() {
        let a = record(1, 10, Category::General).base;
        let b = record(2, 10, Category::General).base;
        assert_eq!(SortKey::PriceHighToLow.compare(&a, &b), Ordering::Less);
        assert_eq!(SortKey::Id.compare(&b, &a), Ordering::Greater);
    }

    #[test]
    fn newest_first() {
        let old = record(1, 10, Category::General).base;
        let new = record(5, 10, Category::General).base;
        assert_eq!(SortKey::Newest.compare(&new, &old), Ordering::Less);
        assert_eq!(SortKey::Oldest.compare(&new, &old), Ordering::Greater);
    }
}
