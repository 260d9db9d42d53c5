//! PostgreSQL store.
//!
//! Listing searches run the SQL built by
//! [`ListingQueryBuilder`](crate::query::ListingQueryBuilder); everything
//! else is hand-written SQL. Expected schema:
//!
//! ```sql
//! users        (id uuid PK, email text UNIQUE, first_name text, last_name text,
//!               phone text NULL, date_of_birth date NULL, role text,
//!               is_verified bool, created timestamptz)
//! api_tokens   (id uuid PK, user_id uuid, token_hash text UNIQUE, created timestamptz)
//! ads          (id uuid PK, title text, description text, price_cents bigint,
//!               ad_type text, location text, address text, image_urls text[],
//!               category text, created_at timestamptz, updated_at timestamptz,
//!               owner_id uuid, is_active bool, featured bool)
//! vehicle_ads  (ad_id uuid PK REFERENCES ads, manufacturer text, year int,
//!               mileage bigint, fuel_type text, color text, body_type text)
//! auctions     (id uuid PK, ad_id uuid UNIQUE, seller_id uuid,
//!               starting_price_cents bigint, current_price_cents bigint,
//!               end_time timestamptz, winner_id uuid NULL,
//!               closed_at timestamptz NULL, created timestamptz)
//! bids         (id uuid PK, auction_id uuid, bidder_id uuid, amount_cents bigint,
//!               placed_at timestamptz, is_highest bool)
//! messages     (id uuid PK, sender_id uuid, receiver_id uuid, content text,
//!               sent_at timestamptz, read bool)
//! wishlist     (id uuid PK, user_id uuid, ad_id uuid, added_at timestamptz,
//!               UNIQUE (user_id, ad_id))
//! events       (id uuid PK, title text, description text, date timestamptz,
//!               location text, host_id uuid)
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    AuctionOutcome, AuctionStore, EventStore, ListingSlice, ListingStore, MessageStore, Store,
    UserStore, WishlistStore,
};
use crate::models::api_token::{ApiToken, hash_token};
use crate::models::user::normalize_email;
use crate::models::{
    Auction, Bid, Event, Listing, ListingBase, ListingRecord, Mailbox, Message, Money, NewUser,
    User, VehicleAttributes, WishlistEntry,
};
use crate::query::{ListingQuery, ListingQueryBuilder, Window, build_by_id};

/// Store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Joined `ads` + `vehicle_ads` row.
#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    title: String,
    description: String,
    price_cents: i64,
    ad_type: String,
    location: String,
    address: String,
    image_urls: Vec<String>,
    category: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    owner_id: Uuid,
    is_active: bool,
    featured: bool,
    ad_id: Option<Uuid>,
    manufacturer: Option<String>,
    year: Option<i32>,
    mileage: Option<i64>,
    fuel_type: Option<String>,
    color: Option<String>,
    body_type: Option<String>,
}

impl TryFrom<ListingRow> for ListingRecord {
    type Error = anyhow::Error;

    fn try_from(row: ListingRow) -> Result<Self> {
        let vehicle = match row.ad_id {
            None => None,
            Some(_) => Some(VehicleAttributes {
                manufacturer: required(row.manufacturer, "manufacturer")?.parse()?,
                year: required(row.year, "year")?,
                mileage: required(row.mileage, "mileage")?,
                fuel_type: required(row.fuel_type, "fuel_type")?.parse()?,
                color: required(row.color, "color")?.parse()?,
                body_type: required(row.body_type, "body_type")?.parse()?,
            }),
        };

        Ok(ListingRecord {
            base: ListingBase {
                id: row.id,
                title: row.title,
                description: row.description,
                price: Money::from_minor(row.price_cents)?,
                ad_type: row.ad_type.parse()?,
                location: row.location.parse()?,
                address: row.address,
                image_urls: row.image_urls,
                created_at: row.created_at,
                updated_at: row.updated_at,
                owner_id: row.owner_id,
                is_active: row.is_active,
                featured: row.featured,
            },
            category: row.category.parse()?,
            vehicle,
        })
    }
}

fn required<T>(value: Option<T>, column: &str) -> Result<T> {
    value.with_context(|| format!("vehicle_ads.{column} is NULL"))
}

/// Decode a search window, dropping rows that cannot be decoded so one bad
/// row does not fail the page.
fn decode_rows(rows: Vec<ListingRow>) -> Vec<ListingRecord> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match ListingRecord::try_from(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(listing_id = %id, error = %format!("{e:#}"), "skipping undecodable listing row");
                    None
                }
            }
        })
        .collect()
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    date_of_birth: Option<NaiveDate>,
    role: String,
    is_verified: bool,
    created: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            date_of_birth: row.date_of_birth,
            role: row.role.parse()?,
            is_verified: row.is_verified,
            created: row.created,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AuctionRow {
    id: Uuid,
    ad_id: Uuid,
    seller_id: Uuid,
    starting_price_cents: i64,
    current_price_cents: i64,
    end_time: DateTime<Utc>,
    winner_id: Option<Uuid>,
    closed_at: Option<DateTime<Utc>>,
    created: DateTime<Utc>,
}

impl TryFrom<AuctionRow> for Auction {
    type Error = anyhow::Error;

    fn try_from(row: AuctionRow) -> Result<Self> {
        Ok(Auction {
            id: row.id,
            ad_id: row.ad_id,
            seller_id: row.seller_id,
            starting_price: Money::from_minor(row.starting_price_cents)?,
            current_price: Money::from_minor(row.current_price_cents)?,
            end_time: row.end_time,
            winner: row.winner_id,
            closed_at: row.closed_at,
            created: row.created,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BidRow {
    id: Uuid,
    auction_id: Uuid,
    bidder_id: Uuid,
    amount_cents: i64,
    placed_at: DateTime<Utc>,
    is_highest: bool,
}

impl TryFrom<BidRow> for Bid {
    type Error = anyhow::Error;

    fn try_from(row: BidRow) -> Result<Self> {
        Ok(Bid {
            id: row.id,
            auction_id: row.auction_id,
            bidder_id: row.bidder_id,
            amount: Money::from_minor(row.amount_cents)?,
            placed_at: row.placed_at,
            is_highest: row.is_highest,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    content: String,
    sent_at: DateTime<Utc>,
    read: bool,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            sender_id: row.sender_id,
            receiver_id: row.receiver_id,
            content: row.content,
            timestamp: row.sent_at,
            read: row.read,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    id: Uuid,
    user_id: Uuid,
    ad_id: Uuid,
    added_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    date: DateTime<Utc>,
    location: String,
    host_id: Uuid,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            title: row.title,
            description: row.description,
            date: row.date,
            location: row.location,
            host_id: row.host_id,
        }
    }
}

impl From<WishlistRow> for WishlistEntry {
    fn from(row: WishlistRow) -> Self {
        WishlistEntry {
            id: row.id,
            user_id: row.user_id,
            ad_id: row.ad_id,
            added_at: row.added_at,
        }
    }
}

const AUCTION_COLUMNS: &str = "id, ad_id, seller_id, starting_price_cents, current_price_cents, \
     end_time, winner_id, closed_at, created";

#[async_trait]
impl ListingStore for PgStore {
    async fn search_listings(&self, query: &ListingQuery, window: Window) -> Result<ListingSlice> {
        let builder = ListingQueryBuilder::new(query);
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .context("failed to set search isolation")?;

        let count_sql = builder.build_count();
        debug!(sql = %count_sql, "counting listings");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .fetch_one(&mut *tx)
            .await
            .context("failed to count listings")?;
        let count = u64::try_from(total).unwrap_or(0);

        let records = if window.offset >= count {
            Vec::new()
        } else {
            let sql = builder.build(window);
            debug!(sql = %sql, "fetching listings");
            let rows = sqlx::query_as::<_, ListingRow>(&sql)
                .fetch_all(&mut *tx)
                .await
                .context("failed to fetch listings")?;
            decode_rows(rows)
        };

        tx.commit().await.context("failed to finish search")?;
        Ok(ListingSlice { count, records })
    }

    async fn fetch_listing(&self, id: Uuid) -> Result<Option<ListingRecord>> {
        let sql = build_by_id(id);
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .fetch_optional(&self.pool)
            .await
            .context("failed to fetch listing")?;
        row.map(ListingRecord::try_from).transpose()
    }

    async fn insert_listing(&self, listing: &Listing) -> Result<()> {
        let base = &listing.base;
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO ads (id, title, description, price_cents, ad_type, location, address,
                             image_urls, category, created_at, updated_at, owner_id,
                             is_active, featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(base.id)
        .bind(&base.title)
        .bind(&base.description)
        .bind(base.price.minor())
        .bind(base.ad_type.as_str())
        .bind(base.location.as_str())
        .bind(&base.address)
        .bind(&base.image_urls)
        .bind(listing.category().as_str())
        .bind(base.created_at)
        .bind(base.updated_at)
        .bind(base.owner_id)
        .bind(base.is_active)
        .bind(base.featured)
        .execute(&mut *tx)
        .await
        .context("failed to insert listing")?;

        if let Some(vehicle) = listing.details.vehicle() {
            sqlx::query(
                r#"
                INSERT INTO vehicle_ads (ad_id, manufacturer, year, mileage, fuel_type, color, body_type)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(base.id)
            .bind(vehicle.manufacturer.as_str())
            .bind(vehicle.year)
            .bind(vehicle.mileage)
            .bind(vehicle.fuel_type.as_str())
            .bind(vehicle.color.as_str())
            .bind(vehicle.body_type.as_str())
            .execute(&mut *tx)
            .await
            .context("failed to insert vehicle details")?;
        }

        tx.commit().await.context("failed to commit listing")?;
        Ok(())
    }

    async fn update_listing(&self, listing: &Listing) -> Result<bool> {
        let base = &listing.base;
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            UPDATE ads
            SET title = $2, description = $3, price_cents = $4, ad_type = $5, location = $6,
                address = $7, image_urls = $8, updated_at = $9, is_active = $10, featured = $11
            WHERE id = $1
            "#,
        )
        .bind(base.id)
        .bind(&base.title)
        .bind(&base.description)
        .bind(base.price.minor())
        .bind(base.ad_type.as_str())
        .bind(base.location.as_str())
        .bind(&base.address)
        .bind(&base.image_urls)
        .bind(base.updated_at)
        .bind(base.is_active)
        .bind(base.featured)
        .execute(&mut *tx)
        .await
        .context("failed to update listing")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        if let Some(vehicle) = listing.details.vehicle() {
            sqlx::query(
                r#"
                UPDATE vehicle_ads
                SET manufacturer = $2, year = $3, mileage = $4, fuel_type = $5, color = $6,
                    body_type = $7
                WHERE ad_id = $1
                "#,
            )
            .bind(base.id)
            .bind(vehicle.manufacturer.as_str())
            .bind(vehicle.year)
            .bind(vehicle.mileage)
            .bind(vehicle.fuel_type.as_str())
            .bind(vehicle.color.as_str())
            .bind(vehicle.body_type.as_str())
            .execute(&mut *tx)
            .await
            .context("failed to update vehicle details")?;
        }

        tx.commit().await.context("failed to commit listing update")?;
        Ok(true)
    }

    async fn delete_listing(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        sqlx::query("DELETE FROM bids WHERE auction_id IN (SELECT id FROM auctions WHERE ad_id = $1)")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("failed to delete bids")?;
        sqlx::query("DELETE FROM auctions WHERE ad_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("failed to delete auction")?;
        sqlx::query("DELETE FROM wishlist WHERE ad_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("failed to delete wishlist entries")?;
        sqlx::query("DELETE FROM vehicle_ads WHERE ad_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("failed to delete vehicle details")?;
        let result = sqlx::query("DELETE FROM ads WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("failed to delete listing")?;

        tx.commit().await.context("failed to commit listing delete")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, input: NewUser) -> Result<Option<User>> {
        let user = input.into_user(Uuid::now_v7(), Utc::now());

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, email, first_name, last_name, phone, date_of_birth, role,
                               is_verified, created)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (email) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.date_of_birth)
        .bind(user.role.as_str())
        .bind(user.is_verified)
        .bind(user.created)
        .fetch_optional(&self.pool)
        .await
        .context("failed to create user")?;

        row.map(User::try_from).transpose()
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to find user")?;
        row.map(User::try_from).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await
            .context("failed to find user by email")?;
        row.map(User::try_from).transpose()
    }

    async fn issue_token(&self, user_id: Uuid) -> Result<String> {
        let (token, raw) = ApiToken::issue(user_id, Utc::now());

        sqlx::query(
            "INSERT INTO api_tokens (id, user_id, token_hash, created) VALUES ($1, $2, $3, $4)",
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token_hash)
        .bind(token.created)
        .execute(&self.pool)
        .await
        .context("failed to create API token")?;

        Ok(raw)
    }

    async fn user_for_token(&self, raw_token: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.* FROM users u
            JOIN api_tokens t ON t.user_id = u.id
            WHERE t.token_hash = $1
            "#,
        )
        .bind(hash_token(raw_token))
        .fetch_optional(&self.pool)
        .await
        .context("failed to resolve API token")?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl WishlistStore for PgStore {
    async fn add_wishlist_entry(&self, entry: &WishlistEntry) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO wishlist (id, user_id, ad_id, added_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, ad_id) DO NOTHING
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.ad_id)
        .bind(entry.added_at)
        .execute(&self.pool)
        .await
        .context("failed to add wishlist entry")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_wishlist(&self, user_id: Uuid) -> Result<Vec<WishlistEntry>> {
        let rows = sqlx::query_as::<_, WishlistRow>(
            "SELECT * FROM wishlist WHERE user_id = $1 ORDER BY added_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list wishlist")?;
        Ok(rows.into_iter().map(WishlistEntry::from).collect())
    }

    async fn find_wishlist_entry(&self, id: Uuid) -> Result<Option<WishlistEntry>> {
        let row = sqlx::query_as::<_, WishlistRow>("SELECT * FROM wishlist WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to find wishlist entry")?;
        Ok(row.map(WishlistEntry::from))
    }

    async fn remove_wishlist_entry(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wishlist WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to remove wishlist entry")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn send_message(&self, message: &Message) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, sender_id, receiver_id, content, sent_at, read)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id)
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.content)
        .bind(message.timestamp)
        .bind(message.read)
        .execute(&self.pool)
        .await
        .context("failed to send message")?;
        Ok(())
    }

    async fn list_messages(&self, user_id: Uuid, mailbox: Mailbox) -> Result<Vec<Message>> {
        let sql = match mailbox {
            Mailbox::Inbox => {
                "SELECT * FROM messages WHERE receiver_id = $1 ORDER BY sent_at DESC, id DESC"
            }
            Mailbox::Sent => {
                "SELECT * FROM messages WHERE sender_id = $1 ORDER BY sent_at DESC, id DESC"
            }
        };
        let rows = sqlx::query_as::<_, MessageRow>(sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("failed to list messages")?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn find_message(&self, id: Uuid) -> Result<Option<Message>> {
        let row = sqlx::query_as::<_, MessageRow>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to find message")?;
        Ok(row.map(Message::from))
    }

    async fn set_message_read(&self, id: Uuid, read: bool) -> Result<Option<Message>> {
        let row = sqlx::query_as::<_, MessageRow>(
            "UPDATE messages SET read = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(read)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update message")?;
        Ok(row.map(Message::from))
    }

    async fn delete_message(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete message")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn create_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, title, description, date, location, host_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.location)
        .bind(event.host_id)
        .execute(&self.pool)
        .await
        .context("failed to create event")?;
        Ok(())
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>("SELECT * FROM events ORDER BY date, id")
            .fetch_all(&self.pool)
            .await
            .context("failed to list events")?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to find event")?;
        Ok(row.map(Event::from))
    }

    async fn update_event(&self, event: &Event) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events SET title = $2, description = $3, date = $4, location = $5
            WHERE id = $1
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.date)
        .bind(&event.location)
        .execute(&self.pool)
        .await
        .context("failed to update event")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_event(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("failed to delete event")?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl AuctionStore for PgStore {
    async fn create_auction(&self, auction: &Auction) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO auctions (id, ad_id, seller_id, starting_price_cents, current_price_cents,
                                  end_time, winner_id, closed_at, created)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (ad_id) DO NOTHING
            "#,
        )
        .bind(auction.id)
        .bind(auction.ad_id)
        .bind(auction.seller_id)
        .bind(auction.starting_price.minor())
        .bind(auction.current_price.minor())
        .bind(auction.end_time)
        .bind(auction.winner)
        .bind(auction.closed_at)
        .bind(auction.created)
        .execute(&self.pool)
        .await
        .context("failed to create auction")?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_auction(&self, id: Uuid) -> Result<Option<Auction>> {
        let row = sqlx::query_as::<_, AuctionRow>(&format!(
            "SELECT {AUCTION_COLUMNS} FROM auctions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to find auction")?;
        row.map(Auction::try_from).transpose()
    }

    async fn list_auctions(&self) -> Result<Vec<Auction>> {
        let rows = sqlx::query_as::<_, AuctionRow>(&format!(
            "SELECT {AUCTION_COLUMNS} FROM auctions ORDER BY created DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list auctions")?;
        rows.into_iter().map(Auction::try_from).collect()
    }

    async fn list_bids(&self, auction_id: Uuid) -> Result<Vec<Bid>> {
        let rows = sqlx::query_as::<_, BidRow>(
            "SELECT * FROM bids WHERE auction_id = $1 ORDER BY amount_cents DESC, placed_at ASC",
        )
        .bind(auction_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list bids")?;
        rows.into_iter().map(Bid::try_from).collect()
    }

    async fn place_bid(
        &self,
        auction_id: Uuid,
        bidder_id: Uuid,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<AuctionOutcome<Bid>> {
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        let row = sqlx::query_as::<_, AuctionRow>(&format!(
            "SELECT {AUCTION_COLUMNS} FROM auctions WHERE id = $1 FOR UPDATE"
        ))
        .bind(auction_id)
        .fetch_optional(&mut *tx)
        .await
        .context("failed to lock auction")?;

        let Some(auction) = row.map(Auction::try_from).transpose()? else {
            return Ok(AuctionOutcome::NotFound);
        };
        if let Err(rejection) = auction.check_bid(bidder_id, amount, now) {
            return Ok(AuctionOutcome::Rejected(rejection));
        }

        sqlx::query("UPDATE bids SET is_highest = false WHERE auction_id = $1 AND is_highest")
            .bind(auction_id)
            .execute(&mut *tx)
            .await
            .context("failed to clear highest bid")?;

        let bid = Bid {
            id: Uuid::now_v7(),
            auction_id,
            bidder_id,
            amount,
            placed_at: now,
            is_highest: true,
        };
        sqlx::query(
            r#"
            INSERT INTO bids (id, auction_id, bidder_id, amount_cents, placed_at, is_highest)
            VALUES ($1, $2, $3, $4, $5, true)
            "#,
        )
        .bind(bid.id)
        .bind(bid.auction_id)
        .bind(bid.bidder_id)
        .bind(bid.amount.minor())
        .bind(bid.placed_at)
        .execute(&mut *tx)
        .await
        .context("failed to insert bid")?;

        sqlx::query("UPDATE auctions SET current_price_cents = $2 WHERE id = $1")
            .bind(auction_id)
            .bind(amount.minor())
            .execute(&mut *tx)
            .await
            .context("failed to raise current price")?;

        tx.commit().await.context("failed to commit bid")?;
        Ok(AuctionOutcome::Done(bid))
    }

    async fn close_auction(
        &self,
        auction_id: Uuid,
        caller: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AuctionOutcome<Auction>> {
        let mut tx = self.pool.begin().await.context("failed to begin transaction")?;

        let row = sqlx::query_as::<_, AuctionRow>(&format!(
            "SELECT {AUCTION_COLUMNS} FROM auctions WHERE id = $1 FOR UPDATE"
        ))
        .bind(auction_id)
        .fetch_optional(&mut *tx)
        .await
        .context("failed to lock auction")?;

        let Some(mut auction) = row.map(Auction::try_from).transpose()? else {
            return Ok(AuctionOutcome::NotFound);
        };
        if let Err(rejection) = auction.check_close(caller, now) {
            return Ok(AuctionOutcome::Rejected(rejection));
        }

        let winner: Option<Uuid> = sqlx::query_scalar(
            "SELECT bidder_id FROM bids WHERE auction_id = $1 AND is_highest",
        )
        .bind(auction_id)
        .fetch_optional(&mut *tx)
        .await
        .context("failed to find highest bid")?;

        sqlx::query("UPDATE auctions SET winner_id = $2, closed_at = $3 WHERE id = $1")
            .bind(auction_id)
            .bind(winner)
            .bind(now)
            .execute(&mut *tx)
            .await
            .context("failed to close auction")?;

        tx.commit().await.context("failed to commit auction close")?;

        auction.winner = winner;
        auction.closed_at = Some(now);
        Ok(AuctionOutcome::Done(auction))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn check_health(&self) -> Result<()> {
        crate::db::check_health(&self.pool).await
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn row(n: u128, category: &str) -> ListingRow {
        let now = Utc::now();
        ListingRow {
            id: Uuid::from_u128(n),
            title: format!("Listing {n}"),
            description: "desc".to_string(),
            price_cents: 10_000,
            ad_type: "sale".to_string(),
            location: "belgrade".to_string(),
            address: String::new(),
            image_urls: vec![],
            category: category.to_string(),
            created_at: now,
            updated_at: now,
            owner_id: Uuid::nil(),
            is_active: true,
            featured: false,
            ad_id: None,
            manufacturer: None,
            year: None,
            mileage: None,
            fuel_type: None,
            color: None,
            body_type: None,
        }
    }

    fn vehicle_row(n: u128) -> ListingRow {
        ListingRow {
            ad_id: Some(Uuid::from_u128(n)),
            manufacturer: Some("toyota".to_string()),
            year: Some(2018),
            mileage: Some(90_000),
            fuel_type: Some("hybrid".to_string()),
            color: Some("white".to_string()),
            body_type: Some("sedan".to_string()),
            ..row(n, "vehicle")
        }
    }

    #[test]
    fn decodes_vehicle_columns() {
        let record = ListingRecord::try_from(vehicle_row(1)).unwrap();
        assert_eq!(record.vehicle.map(|v| v.year), Some(2018));
        assert_eq!(record.base.price, Money::from_major(100).unwrap());
    }

    #[test]
    fn undecodable_rows_are_dropped_from_the_window() {
        let null_year = ListingRow {
            year: None,
            ..vehicle_row(2)
        };
        let bad_token = ListingRow {
            location: "atlantis".to_string(),
            ..row(3, "general")
        };
        let rows = vec![row(1, "general"), null_year, bad_token, vehicle_row(4)];

        let ids: Vec<_> = decode_rows(rows)
            .iter()
            .map(|r| r.base.id.as_u128())
            .collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
