//! In-process store.
//!
//! Holds every table behind one `parking_lot::RwLock`. The lock is never
//! held across an await point, so each operation is atomic with respect to
//! the others.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{
    AuctionOutcome, AuctionStore, EventStore, ListingSlice, ListingStore, MessageStore, Store,
    UserStore, WishlistStore,
};
use crate::models::api_token::{ApiToken, hash_token};
use crate::models::user::normalize_email;
use crate::models::{
    Auction, Bid, Event, Listing, ListingRecord, Mailbox, Message, Money, NewUser, User,
    WishlistEntry,
};
use crate::query::{ListingQuery, Window};

#[derive(Default)]
struct Tables {
    listings: BTreeMap<Uuid, ListingRecord>,
    users: HashMap<Uuid, User>,
    /// Keyed by token hash.
    tokens: HashMap<String, ApiToken>,
    wishlist: BTreeMap<Uuid, WishlistEntry>,
    messages: BTreeMap<Uuid, Message>,
    auctions: BTreeMap<Uuid, Auction>,
    bids: BTreeMap<Uuid, Bid>,
    events: BTreeMap<Uuid, Event>,
}

/// Store backed by in-process maps.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a listing record as-is, without checking that its category and
    /// vehicle details agree.
    pub fn insert_record(&self, record: ListingRecord) {
        self.tables.write().listings.insert(record.base.id, record);
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn search_listings(&self, query: &ListingQuery, window: Window) -> Result<ListingSlice> {
        let tables = self.tables.read();
        let mut matches: Vec<&ListingRecord> = tables
            .listings
            .values()
            .filter(|r| query.matches(r))
            .collect();
        let count = matches.len() as u64;
        if window.offset >= count {
            return Ok(ListingSlice {
                count,
                records: Vec::new(),
            });
        }

        matches.sort_by(|a, b| query.sort.compare(&a.base, &b.base));
        let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);
        let records = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(ListingSlice { count, records })
    }

    async fn fetch_listing(&self, id: Uuid) -> Result<Option<ListingRecord>> {
        Ok(self.tables.read().listings.get(&id).cloned())
    }

    async fn insert_listing(&self, listing: &Listing) -> Result<()> {
        self.insert_record(listing.clone().into_record());
        Ok(())
    }

    async fn update_listing(&self, listing: &Listing) -> Result<bool> {
        let mut tables = self.tables.write();
        match tables.listings.get_mut(&listing.id()) {
            Some(existing) => {
                *existing = listing.clone().into_record();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_listing(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write();
        if tables.listings.remove(&id).is_none() {
            return Ok(false);
        }

        tables.wishlist.retain(|_, e| e.ad_id != id);

        let auctions: Vec<Uuid> = tables
            .auctions
            .values()
            .filter(|a| a.ad_id == id)
            .map(|a| a.id)
            .collect();
        tables.bids.retain(|_, b| !auctions.contains(&b.auction_id));
        tables.auctions.retain(|_, a| a.ad_id != id);

        Ok(true)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, input: NewUser) -> Result<Option<User>> {
        let mut tables = self.tables.write();
        let email = normalize_email(&input.email);
        if tables.users.values().any(|u| u.email == email) {
            return Ok(None);
        }

        let user = input.into_user(Uuid::now_v7(), Utc::now());
        tables.users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = normalize_email(email);
        Ok(self
            .tables
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn issue_token(&self, user_id: Uuid) -> Result<String> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&user_id) {
            anyhow::bail!("cannot issue token for unknown user {user_id}");
        }

        let (token, raw) = ApiToken::issue(user_id, Utc::now());
        tables.tokens.insert(token.token_hash.clone(), token);
        Ok(raw)
    }

    async fn user_for_token(&self, raw_token: &str) -> Result<Option<User>> {
        let tables = self.tables.read();
        Ok(tables
            .tokens
            .get(&hash_token(raw_token))
            .and_then(|t| tables.users.get(&t.user_id))
            .cloned())
    }
}

#[async_trait]
impl WishlistStore for MemoryStore {
    async fn add_wishlist_entry(&self, entry: &WishlistEntry) -> Result<bool> {
        let mut tables = self.tables.write();
        let duplicate = tables
            .wishlist
            .values()
            .any(|e| e.user_id == entry.user_id && e.ad_id == entry.ad_id);
        if duplicate {
            return Ok(false);
        }
        tables.wishlist.insert(entry.id, entry.clone());
        Ok(true)
    }

    async fn list_wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistEntry>> {
        let mut entries: Vec<WishlistEntry> = self
            .tables
            .read()
            .wishlist
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }

    async fn find_wishlist_entry(&self, id: Uuid) -> Result<Option<WishlistEntry>> {
        Ok(self.tables.read().wishlist.get(&id).cloned())
    }

    async fn remove_wishlist_entry(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().wishlist.remove(&id).is_some())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn send_message(&self, message: &Message) -> Result<()> {
        self.tables
            .write()
            .messages
            .insert(message.id, message.clone());
        Ok(())
    }

    async fn list_messages(&self, user_id: Uuid, mailbox: Mailbox) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .tables
            .read()
            .messages
            .values()
            .filter(|m| m.in_mailbox(user_id, mailbox))
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        Ok(messages)
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>> {
        Ok(self.tables.read().messages.get(&id).cloned())
    }

    async fn set_message_read(&self, id: Uuid, read: bool) -> Result<Option<Message>> {
        let mut tables = self.tables.write();
        Ok(tables.messages.get_mut(&id).map(|m| {
            m.read = read;
            m.clone()
        }))
    }

    async fn delete_message(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().messages.remove(&id).is_some())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create_event(&self, event: &Event) -> Result<()> {
        self.tables.write().events.insert(event.id, event.clone());
        Ok(())
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let mut events: Vec<Event> = self.tables.read().events.values().cloned().collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.tables.read().events.get(&id).cloned())
    }

    async fn update_event(&self, event: &Event) -> Result<bool> {
        let mut tables = self.tables.write();
        match tables.events.get_mut(&event.id) {
            Some(existing) => {
                *existing = event.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().events.remove(&id).is_some())
    }
}

#[async_trait]
impl AuctionStore for MemoryStore {
    async fn create_auction(&self, auction: &Auction) -> Result<bool> {
        let mut tables = self.tables.write();
        if tables.auctions.values().any(|a| a.ad_id == auction.ad_id) {
            return Ok(false);
        }
        tables.auctions.insert(auction.id, auction.clone());
        Ok(true)
    }

    async fn find_auction(&self, id: Uuid) -> Result<Option<Auction>> {
        Ok(self.tables.read().auctions.get(&id).cloned())
    }

    async fn list_auctions(&self) -> Result<Vec<Auction>> {
        let mut auctions: Vec<Auction> = self.tables.read().auctions.values().cloned().collect();
        auctions.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(auctions)
    }

    async fn list_bids(&self, auction_id: Uuid) -> Result<Vec<Bid>> {
        let mut bids: Vec<Bid> = self
            .tables
            .read()
            .bids
            .values()
            .filter(|b| b.auction_id == auction_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.amount.cmp(&a.amount).then(a.placed_at.cmp(&b.placed_at)));
        Ok(bids)
    }

    async fn place_bid(
        &self,
        auction_id: Uuid,
        bidder_id: Uuid,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<AuctionOutcome<Bid>> {
        let mut tables = self.tables.write();
        let Some(auction) = tables.auctions.get_mut(&auction_id) else {
            return Ok(AuctionOutcome::NotFound);
        };
        if let Err(rejection) = auction.check_bid(bidder_id, amount, now) {
            return Ok(AuctionOutcome::Rejected(rejection));
        }
        auction.current_price = amount;

        for bid in tables.bids.values_mut().filter(|b| b.auction_id == auction_id) {
            bid.is_highest = false;
        }

        let bid = Bid {
            id: Uuid::now_v7(),
            auction_id,
            bidder_id,
            amount,
            placed_at: now,
            is_highest: true,
        };
        tables.bids.insert(bid.id, bid.clone());
        Ok(AuctionOutcome::Done(bid))
    }

    async fn close_auction(
        &self,
        auction_id: Uuid,
        caller: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AuctionOutcome<Auction>> {
        let mut tables = self.tables.write();
        let winner = tables
            .bids
            .values()
            .find(|b| b.auction_id == auction_id && b.is_highest)
            .map(|b| b.bidder_id);

        let Some(auction) = tables.auctions.get_mut(&auction_id) else {
            return Ok(AuctionOutcome::NotFound);
        };
        if let Err(rejection) = auction.check_close(caller, now) {
            return Ok(AuctionOutcome::Rejected(rejection));
        }

        auction.winner = winner;
        auction.closed_at = Some(now);
        Ok(AuctionOutcome::Done(auction.clone()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn check_health(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
