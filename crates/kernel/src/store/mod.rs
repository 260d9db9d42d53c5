//! Persistence backends.
//!
//! Each aggregate has its own trait; [`Store`] bundles them. Two backends
//! implement everything: [`PgStore`] over PostgreSQL and [`MemoryStore`]
//! for development and tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Auction, AuctionRejection, Bid, Event, Listing, ListingRecord, Mailbox, Message, Money, NewUser,
    User, WishlistEntry,
};
use crate::query::{ListingQuery, Window};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A counted window of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingSlice {
    /// Every match, ignoring the window.
    pub count: u64,
    pub records: Vec<ListingRecord>,
}

/// Listing persistence.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Count the listings matching the query and fetch one ordered window of
    /// them, both from the same snapshot. The fetch is skipped when the
    /// window starts past the last match.
    async fn search_listings(&self, query: &ListingQuery, window: Window)
    -> Result<ListingSlice>;

    async fn fetch_listing(&self, id: Uuid) -> Result<Option<ListingRecord>>;

    async fn insert_listing(&self, listing: &Listing) -> Result<()>;

    /// Replace a listing's base and vehicle attributes. Returns false if it
    /// does not exist.
    async fn update_listing(&self, listing: &Listing) -> Result<bool>;

    /// Delete a listing with its vehicle details, wishlist entries, auction
    /// and bids. Returns false if it does not exist.
    async fn delete_listing(&self, id: Uuid) -> Result<bool>;
}

/// Users and their API tokens.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user. Returns `None` if the email is already registered.
    async fn create_user(&self, input: NewUser) -> Result<Option<User>>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Issue a new API token. Returns the raw token, shown once.
    async fn issue_token(&self, user_id: Uuid) -> Result<String>;

    /// Resolve a raw bearer token to its user.
    async fn user_for_token(&self, raw_token: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait WishlistStore: Send + Sync {
    /// Add an entry. Returns false if the user already saved that listing.
    async fn add_wishlist_entry(&self, entry: &WishlistEntry) -> Result<bool>;

    async fn list_wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistEntry>>;

    async fn find_wishlist_entry(&self, id: Uuid) -> Result<Option<WishlistEntry>>;

    async fn remove_wishlist_entry(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn send_message(&self, message: &Message) -> Result<()>;

    /// Messages in a user's inbox or sent box, newest first.
    async fn list_messages(&self, user_id: Uuid, mailbox: Mailbox) -> Result<Vec<Message>>;

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>>;

    async fn set_message_read(&self, id: Uuid, read: bool) -> Result<Option<Message>>;

    async fn delete_message(&self, id: Uuid) -> Result<bool>;
}

/// Community events hosted by users.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn create_event(&self, event: &Event) -> Result<()>;

    /// All events, soonest first.
    async fn list_events(&self) -> Result<Vec<Event>>;

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>>;

    /// Replace an event. Returns false if it does not exist.
    async fn update_event(&self, event: &Event) -> Result<bool>;

    async fn delete_event(&self, id: Uuid) -> Result<bool>;
}

/// Result of an auction state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum AuctionOutcome<T> {
    Done(T),
    NotFound,
    Rejected(AuctionRejection),
}

#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// Create an auction. Returns false if the listing already has one.
    async fn create_auction(&self, auction: &Auction) -> Result<bool>;

    async fn find_auction(&self, id: Uuid) -> Result<Option<Auction>>;

    /// All auctions, most recently created first.
    async fn list_auctions(&self) -> Result<Vec<Auction>>;

    /// Bids on an auction, highest first.
    async fn list_bids(&self, auction_id: Uuid) -> Result<Vec<Bid>>;

    /// Validate and record a bid atomically with respect to other bids.
    async fn place_bid(
        &self,
        auction_id: Uuid,
        bidder_id: Uuid,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<AuctionOutcome<Bid>>;

    /// Close an ended auction, recording the highest bidder as winner.
    async fn close_auction(
        &self,
        auction_id: Uuid,
        caller: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AuctionOutcome<Auction>>;
}

/// Every persistence concern in one backend.
#[async_trait]
pub trait Store:
    ListingStore + UserStore + WishlistStore + MessageStore + AuctionStore + EventStore
{
    /// Cheap liveness probe.
    async fn check_health(&self) -> Result<()>;

    /// Backend name for logs.
    fn backend(&self) -> &'static str;
}
