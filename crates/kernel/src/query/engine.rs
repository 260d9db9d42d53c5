//! Listing query engine.
//!
//! Runs a [`ListingQuery`] against a [`ListingStore`]: one counted window
//! from a single snapshot, then each record assembled into a [`Listing`].

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use super::pager::Page;
use super::types::ListingQuery;
use crate::models::{IntegrityError, Listing};
use crate::store::{ListingSlice, ListingStore};

/// Failure to load a single listing.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("listing {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Executes listing searches.
#[derive(Clone)]
pub struct ListingQueryEngine {
    store: Arc<dyn ListingStore>,
}

impl ListingQueryEngine {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self { store }
    }

    /// Run a search and return the requested page.
    ///
    /// Records whose category and vehicle details disagree are skipped and
    /// logged; `count` still reports what the store matched.
    pub async fn search(&self, query: &ListingQuery) -> Result<Page<Listing>> {
        let ListingSlice { count, records } = self
            .store
            .search_listings(query, query.page.window())
            .await?;

        debug!(
            count,
            page = query.page.page,
            size = query.page.size,
            fetched = records.len(),
            "listing search"
        );

        let listings = records
            .into_iter()
            .filter_map(|record| match Listing::from_record(record) {
                Ok(listing) => Some(listing),
                Err(e) => {
                    warn!(error = %e, "skipping listing with inconsistent details");
                    None
                }
            })
            .collect();

        Ok(Page::new(listings, count, query.page))
    }

    /// Load one listing with its vehicle details.
    pub async fn get(&self, id: Uuid) -> Result<Listing, LookupError> {
        let record = self
            .store
            .fetch_listing(id)
            .await?
            .ok_or(LookupError::NotFound(id))?;
        Ok(Listing::from_record(record)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{
        AdType, BodyType, Category, City, Color, FuelType, ListingBase, ListingRecord,
        Manufacturer, Money, VehicleAttributes,
    };
    use crate::query::{PageRequest, Range, VehicleFilter};
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn record(n: u128, category: Category, vehicle: Option<VehicleAttributes>) -> ListingRecord {
        let now = Utc::now();
        ListingRecord {
            base: ListingBase {
                id: Uuid::from_u128(n),
                title: format!("Listing {n}"),
                description: "desc".to_string(),
                price: Money::from_major(n as i64).unwrap(),
                ad_type: AdType::Sale,
                location: City::Belgrade,
                address: String::new(),
                image_urls: vec![],
                created_at: now,
                updated_at: now,
                owner_id: Uuid::nil(),
                is_active: true,
                featured: false,
            },
            category,
            vehicle,
        }
    }

    fn toyota(year: i32) -> VehicleAttributes {
        VehicleAttributes {
            manufacturer: Manufacturer::Toyota,
            year,
            mileage: 50_000,
            fuel_type: FuelType::Hybrid,
            color: Color::White,
            body_type: BodyType::Sedan,
        }
    }

    fn engine(store: MemoryStore) -> ListingQueryEngine {
        ListingQueryEngine::new(Arc::new(store))
    }

    #[tokio::test]
    async fn skips_inconsistent_records_but_keeps_count() {
        let store = MemoryStore::new();
        store.insert_record(record(1, Category::General, None));
        store.insert_record(record(2, Category::Vehicle, None));
        store.insert_record(record(3, Category::House, Some(toyota(2020))));
        store.insert_record(record(4, Category::Vehicle, Some(toyota(2018))));

        let page = engine(store).search(&ListingQuery::default()).await.unwrap();
        let ids: Vec<_> = page.items.iter().map(|l| l.id().as_u128()).collect();

        assert_eq!(ids, vec![1, 4]);
        assert_eq!(page.count, 4);
    }

    #[tokio::test]
    async fn vehicle_search_merges_attributes() {
        let store = MemoryStore::new();
        store.insert_record(record(1, Category::Vehicle, Some(toyota(2015))));
        store.insert_record(record(2, Category::Vehicle, Some(toyota(2018))));
        store.insert_record(record(3, Category::General, None));

        let mut query = ListingQuery::default();
        query.filter.category = Some(Category::Vehicle);
        query.vehicle = Some(VehicleFilter {
            year: Range::new(Some(2016), None),
            ..Default::default()
        });

        let page = engine(store).search(&query).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.items[0].details.vehicle().map(|v| v.year), Some(2018));
    }

    #[tokio::test]
    async fn page_past_end_is_empty() {
        let store = MemoryStore::new();
        store.insert_record(record(1, Category::General, None));

        let query = ListingQuery {
            page: PageRequest { page: 5, size: 9 },
            ..Default::default()
        };
        let page = engine(store).search(&query).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.count, 1);
        assert_eq!(page.previous_page(), Some(1));
    }

    #[tokio::test]
    async fn get_distinguishes_missing_and_inconsistent() {
        let store = MemoryStore::new();
        store.insert_record(record(2, Category::Vehicle, None));
        let engine = engine(store);

        assert!(matches!(
            engine.get(Uuid::from_u128(1)).await,
            Err(LookupError::NotFound(_))
        ));
        assert!(matches!(
            engine.get(Uuid::from_u128(2)).await,
            Err(LookupError::Integrity(IntegrityError::MissingVehicleDetails(_)))
        ));
    }
}
