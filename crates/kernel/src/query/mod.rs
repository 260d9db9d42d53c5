//! Listing query engine.
//!
//! Turns sparse search parameters into a typed [`ListingQuery`], evaluates
//! it through a store (SQL via [`ListingQueryBuilder`] or in-process via
//! [`ListingQuery::matches`]) and pages the ordered result.

pub mod builder;
pub mod engine;
pub mod pager;
pub mod params;
pub mod predicate;
pub mod types;

pub use builder::{ListingQueryBuilder, build_by_id};
pub use engine::{ListingQueryEngine, LookupError};
pub use pager::{Page, PageRequest, PageResponse, PagerConfig, Window, page_link};
pub use params::QueryError;
pub use types::{ListingFilter, ListingQuery, Range, SortKey, VehicleFilter};
