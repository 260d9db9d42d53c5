//! Listing search SQL using SeaQuery.
//!
//! Generates the windowed SELECT and the matching COUNT for a
//! [`ListingQuery`]:
//! - base filters on `ads`
//! - vehicle filters through an inner join on `vehicle_ads`
//! - case-insensitive title search with escaped LIKE wildcards
//! - deterministic ordering (every order ends with `ads.id ASC`)

use sea_query::{
    Asterisk, Expr, Func, Iden, Order, PostgresQueryBuilder, Query, SelectStatement,
};
use uuid::Uuid;

use super::pager::Window;
use super::types::{ListingFilter, ListingQuery, Range, SortKey, VehicleFilter};

#[derive(Iden, Clone, Copy)]
pub enum Ads {
    Table,
    Id,
    Title,
    Description,
    PriceCents,
    AdType,
    Location,
    Address,
    ImageUrls,
    Category,
    CreatedAt,
    UpdatedAt,
    OwnerId,
    IsActive,
    Featured,
}

#[derive(Iden, Clone, Copy)]
pub enum VehicleAds {
    Table,
    AdId,
    Manufacturer,
    Year,
    Mileage,
    FuelType,
    Color,
    BodyType,
}

const AD_COLUMNS: [Ads; 14] = [
    Ads::Id,
    Ads::Title,
    Ads::Description,
    Ads::PriceCents,
    Ads::AdType,
    Ads::Location,
    Ads::Address,
    Ads::ImageUrls,
    Ads::Category,
    Ads::CreatedAt,
    Ads::UpdatedAt,
    Ads::OwnerId,
    Ads::IsActive,
    Ads::Featured,
];

const VEHICLE_COLUMNS: [VehicleAds; 7] = [
    VehicleAds::AdId,
    VehicleAds::Manufacturer,
    VehicleAds::Year,
    VehicleAds::Mileage,
    VehicleAds::FuelType,
    VehicleAds::Color,
    VehicleAds::BodyType,
];

/// Query builder for listing searches.
pub struct ListingQueryBuilder<'a> {
    query: &'a ListingQuery,
}

impl<'a> ListingQueryBuilder<'a> {
    pub fn new(query: &'a ListingQuery) -> Self {
        Self { query }
    }

    /// Build the main SELECT for one page window.
    pub fn build(&self, window: Window) -> String {
        let mut select = Query::select();
        add_columns(&mut select);
        select.from(Ads::Table);
        self.add_join(&mut select, true);
        self.add_filters(&mut select);
        self.add_order(&mut select);
        select.limit(window.limit);
        select.offset(window.offset);

        select.to_string(PostgresQueryBuilder)
    }

    /// Build a COUNT over the same filters.
    pub fn build_count(&self) -> String {
        let mut select = Query::select();
        select.expr(Expr::col(Asterisk).count());
        select.from(Ads::Table);
        self.add_join(&mut select, false);
        self.add_filters(&mut select);

        select.to_string(PostgresQueryBuilder)
    }

    /// Vehicle searches inner-join the specialization table. Other selects
    /// left-join it so vehicle attributes come back when present.
    fn add_join(&self, select: &mut SelectStatement, need_columns: bool) {
        let on = Expr::col((VehicleAds::Table, VehicleAds::AdId)).equals((Ads::Table, Ads::Id));
        if self.query.vehicle.is_some() {
            select.inner_join(VehicleAds::Table, on);
        } else if need_columns {
            select.left_join(VehicleAds::Table, on);
        }
    }

    fn add_filters(&self, select: &mut SelectStatement) {
        add_base_filters(select, &self.query.filter);
        if let Some(vehicle) = &self.query.vehicle {
            add_vehicle_filters(select, vehicle);
        }
    }

    fn add_order(&self, select: &mut SelectStatement) {
        match self.query.sort {
            SortKey::Id => {}
            SortKey::Newest => {
                select.order_by((Ads::Table, Ads::CreatedAt), Order::Desc);
            }
            SortKey::Oldest => {
                select.order_by((Ads::Table, Ads::CreatedAt), Order::Asc);
            }
            SortKey::PriceLowToHigh => {
                select.order_by((Ads::Table, Ads::PriceCents), Order::Asc);
            }
            SortKey::PriceHighToLow => {
                select.order_by((Ads::Table, Ads::PriceCents), Order::Desc);
            }
        }
        select.order_by((Ads::Table, Ads::Id), Order::Asc);
    }
}

/// SELECT for a single listing with its vehicle attributes, if any.
pub fn build_by_id(id: Uuid) -> String {
    let mut select = Query::select();
    add_columns(&mut select);
    select.from(Ads::Table);
    select.left_join(
        VehicleAds::Table,
        Expr::col((VehicleAds::Table, VehicleAds::AdId)).equals((Ads::Table, Ads::Id)),
    );
    select.and_where(Expr::col((Ads::Table, Ads::Id)).eq(id));

    select.to_string(PostgresQueryBuilder)
}

fn add_columns(select: &mut SelectStatement) {
    for col in AD_COLUMNS {
        select.column((Ads::Table, col));
    }
    for col in VEHICLE_COLUMNS {
        select.column((VehicleAds::Table, col));
    }
}

fn add_base_filters(select: &mut SelectStatement, filter: &ListingFilter) {
    if let Some(category) = filter.category {
        select.and_where(Expr::col((Ads::Table, Ads::Category)).eq(category.as_str()));
    }
    if let Some(location) = filter.location {
        select.and_where(Expr::col((Ads::Table, Ads::Location)).eq(location.as_str()));
    }
    if let Some(ad_type) = filter.ad_type {
        select.and_where(Expr::col((Ads::Table, Ads::AdType)).eq(ad_type.as_str()));
    }
    if let Some(owner) = filter.owner {
        select.and_where(Expr::col((Ads::Table, Ads::OwnerId)).eq(owner));
    }

    add_range(select, (Ads::Table, Ads::CreatedAt), filter.created);
    add_range(
        select,
        (Ads::Table, Ads::PriceCents),
        Range::new(
            filter.price.from.map(|m| m.minor()),
            filter.price.to.map(|m| m.minor()),
        ),
    );

    if let Some(needle) = &filter.title_search {
        let pattern = format!("%{}%", escape_like_wildcards(&needle.to_lowercase()));
        select.and_where(Expr::expr(Func::lower(Expr::col((Ads::Table, Ads::Title)))).like(pattern));
    }
}

fn add_vehicle_filters(select: &mut SelectStatement, filter: &VehicleFilter) {
    if let Some(m) = filter.manufacturer {
        select.and_where(Expr::col((VehicleAds::Table, VehicleAds::Manufacturer)).eq(m.as_str()));
    }
    if let Some(b) = filter.body_type {
        select.and_where(Expr::col((VehicleAds::Table, VehicleAds::BodyType)).eq(b.as_str()));
    }
    if let Some(f) = filter.fuel_type {
        select.and_where(Expr::col((VehicleAds::Table, VehicleAds::FuelType)).eq(f.as_str()));
    }
    if let Some(c) = filter.color {
        select.and_where(Expr::col((VehicleAds::Table, VehicleAds::Color)).eq(c.as_str()));
    }
    add_range(select, (VehicleAds::Table, VehicleAds::Year), filter.year);
    add_range(select, (VehicleAds::Table, VehicleAds::Mileage), filter.mileage);
}

fn add_range<T, C>(select: &mut SelectStatement, column: C, range: Range<T>)
where
    T: Into<sea_query::Value>,
    C: sea_query::IntoColumnRef + Clone,
{
    if let Some(from) = range.from {
        select.and_where(Expr::col(column.clone()).gte(from));
    }
    if let Some(to) = range.to {
        select.and_where(Expr::col(column).lte(to));
    }
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
