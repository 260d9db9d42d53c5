//! Auctions and bids.
//!
//! An auction is attached to exactly one listing. Its current price starts
//! at zero and only moves up as bids are accepted; at most one bid per
//! auction carries the highest-bid flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::listing::ValidationError;
use super::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Auction {
    pub id: Uuid,
    #[serde(rename = "ad")]
    pub ad_id: Uuid,
    /// Owner of the auctioned listing.
    pub seller_id: Uuid,
    pub starting_price: Money,
    pub current_price: Money,
    pub end_time: DateTime<Utc>,
    pub winner: Option<Uuid>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bid {
    pub id: Uuid,
    #[serde(rename = "auction")]
    pub auction_id: Uuid,
    #[serde(rename = "bidder")]
    pub bidder_id: Uuid,
    pub amount: Money,
    pub placed_at: DateTime<Utc>,
    pub is_highest: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAuction {
    #[serde(alias = "ad_id")]
    pub ad: Uuid,
    pub starting_price: Money,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBid {
    #[serde(alias = "auction_id")]
    pub auction: Uuid,
    pub amount: Money,
}

/// Why a bid or close request was refused by the auction's state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuctionRejection {
    #[error("sellers cannot bid on their own auction")]
    OwnAuction,

    #[error("only the seller can close this auction")]
    NotSeller,

    #[error("auction is closed")]
    Closed,

    #[error("auction ended at {0}")]
    Ended(DateTime<Utc>),

    #[error("auction runs until {0}")]
    StillRunning(DateTime<Utc>),

    #[error("bid must be at least the starting price of {0}")]
    BelowStartingPrice(Money),

    #[error("bid must exceed the current price of {0}")]
    NotAboveCurrent(Money),
}

impl NewAuction {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        if self.end_time <= now {
            return Err(ValidationError::new("end_time", "must be in the future"));
        }
        Ok(())
    }

    pub fn into_auction(self, seller_id: Uuid, now: DateTime<Utc>) -> Auction {
        Auction {
            id: Uuid::now_v7(),
            ad_id: self.ad,
            seller_id,
            starting_price: self.starting_price,
            current_price: Money::ZERO,
            end_time: self.end_time,
            winner: None,
            closed_at: None,
            created: now,
        }
    }
}

impl Auction {
    /// Accepting bids: not closed and not past the end time.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.closed_at.is_none() && now < self.end_time
    }

    /// Check a bid against the auction's current state.
    pub fn check_bid(
        &self,
        bidder_id: Uuid,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<(), AuctionRejection> {
        if bidder_id == self.seller_id {
            return Err(AuctionRejection::OwnAuction);
        }
        if !self.is_open(now) {
            return Err(match self.closed_at {
                Some(_) => AuctionRejection::Closed,
                None => AuctionRejection::Ended(self.end_time),
            });
        }
        if amount < self.starting_price {
            return Err(AuctionRejection::BelowStartingPrice(self.starting_price));
        }
        if amount <= self.current_price {
            return Err(AuctionRejection::NotAboveCurrent(self.current_price));
        }
        Ok(())
    }

    /// Check that `caller` may close the auction now.
    pub fn check_close(&self, caller: Uuid, now: DateTime<Utc>) -> Result<(), AuctionRejection> {
        if caller != self.seller_id {
            return Err(AuctionRejection::NotSeller);
        }
        if self.closed_at.is_some() {
            return Err(AuctionRejection::Closed);
        }
        if self.is_open(now) {
            return Err(AuctionRejection::StillRunning(self.end_time));
        }
        Ok(())
    }
}
