//! Query-string parsing for listing searches.
//!
//! Every parameter is optional; an absent parameter and an empty one both
//! mean "no constraint". Unknown parameter names are ignored, but a present
//! parameter that fails to parse is an error rather than being dropped.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

use super::pager::PagerConfig;
use super::types::{ListingFilter, ListingQuery, Range, SortKey, VehicleFilter};
use crate::models::{Category, Money};

/// A search parameter that could not be interpreted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid value '{value}' for '{param}': {reason}")]
    InvalidParam {
        param: &'static str,
        value: String,
        reason: String,
    },
}

impl QueryError {
    pub fn invalid(param: &'static str, value: &str, reason: impl Into<String>) -> Self {
        QueryError::InvalidParam {
            param,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Which end of a date range a bare date bounds.
#[derive(Clone, Copy)]
enum Bound {
    Start,
    End,
}

impl ListingQuery {
    /// Build a query from raw request parameters.
    pub fn from_params(
        params: &HashMap<String, String>,
        pager: &PagerConfig,
    ) -> Result<Self, QueryError> {
        let get = |name: &str| {
            params
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let filter = ListingFilter {
            category: parse_choice(get("category"), "category")?,
            location: parse_choice(get("location"), "location")?,
            ad_type: parse_choice(get("adType"), "adType")?,
            created: Range::new(
                parse_date(get("fromDate"), "fromDate", Bound::Start)?,
                parse_date(get("toDate"), "toDate", Bound::End)?,
            ),
            price: Range::new(
                parse_with::<Money>(get("priceFrom"), "priceFrom")?,
                parse_with::<Money>(get("priceTo"), "priceTo")?,
            ),
            title_search: params
                .get("search")
                .filter(|v| !v.trim().is_empty())
                .cloned(),
            owner: None,
        };

        let body_type = match get("car_type") {
            Some(raw) => parse_choice(Some(raw), "car_type")?,
            None => parse_choice(get("bodyType"), "bodyType")?,
        };

        let vehicle = VehicleFilter {
            manufacturer: parse_choice(get("manufacturer"), "manufacturer")?,
            body_type,
            fuel_type: parse_choice(get("fuelType"), "fuelType")?,
            color: parse_choice(get("color"), "color")?,
            year: Range::new(
                parse_with::<i32>(get("yearFrom"), "yearFrom")?,
                parse_with::<i32>(get("yearTo"), "yearTo")?,
            ),
            mileage: Range::new(
                parse_with::<i64>(get("mileageFrom"), "mileageFrom")?,
                parse_with::<i64>(get("mileageTo"), "mileageTo")?,
            ),
        };

        let sort = match get("sort") {
            Some(raw) => SortKey::from_token(raw).ok_or_else(|| {
                QueryError::invalid(
                    "sort",
                    raw,
                    "expected newest, oldest, priceLowToHigh or priceHighToLow",
                )
            })?,
            None => SortKey::default(),
        };

        let page = pager.request(get("page"), get("size"))?;

        // Vehicle constraints only narrow vehicle searches.
        let vehicle = (filter.category == Some(Category::Vehicle)).then_some(vehicle);

        Ok(Self {
            filter,
            vehicle,
            sort,
            page,
        })
    }
}

fn parse_choice<T>(raw: Option<&str>, param: &'static str) -> Result<Option<T>, QueryError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|v| {
        v.parse::<T>()
            .map_err(|e| QueryError::invalid(param, v, e.to_string()))
    })
    .transpose()
}

fn parse_with<T: FromStr>(raw: Option<&str>, param: &'static str) -> Result<Option<T>, QueryError> {
    raw.map(|v| {
        v.parse::<T>()
            .map_err(|_| QueryError::invalid(param, v, "expected a number"))
    })
    .transpose()
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
fn parse_date(
    raw: Option<&str>,
    param: &'static str,
    bound: Bound,
) -> Result<Option<DateTime<Utc>>, QueryError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        QueryError::invalid(param, raw, "expected YYYY-MM-DD or an RFC 3339 timestamp")
    })?;

    let time = match bound {
        Bound::Start => NaiveTime::from_hms_opt(0, 0, 0),
        Bound::End => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999),
    }
    .ok_or_else(|| QueryError::invalid(param, raw, "unrepresentable time"))?;

    Ok(Some(date.and_time(time).and_utc()))
}
