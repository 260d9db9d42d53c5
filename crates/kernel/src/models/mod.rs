//! Domain models.

pub mod api_token;
pub mod auction;
pub mod choices;
pub mod event;
pub mod listing;
pub mod message;
pub mod money;
pub mod user;
pub mod wishlist;

pub use api_token::ApiToken;
pub use auction::{Auction, AuctionRejection, Bid, NewAuction, NewBid};
pub use choices::{
    AdType, BodyType, Category, Choice, ChoiceSets, City, Color, FuelType, Manufacturer, Role,
    UnknownChoice,
};
pub use event::{Event, EventUpdate, NewEvent};
pub use listing::{
    IntegrityError, Listing, ListingBase, ListingDetails, ListingRecord, ListingUpdate,
    NewListing, NewVehicle, ValidationError, VehicleAttributes, VehicleUpdate,
};
pub use message::{Mailbox, Message, NewMessage};
pub use money::{InvalidAmount, Money};
pub use user::{NewUser, User};
pub use wishlist::{NewWishlistEntry, WishlistEntry};
