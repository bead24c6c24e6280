//! Client library for the Wardrobe inventory and event-booking API.
//!
//! The pieces, front to back:
//! - [`token`]: durable storage for the JWT access/refresh pair.
//! - [`client`]: the authenticated request pipeline - bearer attach plus a
//!   single silent refresh-and-retry on 401.
//! - [`session`]: the login/logout lifecycle and the "who is logged in"
//!   state machine.
//! - [`resources`]: thin typed services for items, categories, events and
//!   item bookings.
//! - [`query`]: combined search/filter/pagination state for list views,
//!   with stale-response reconciliation.

pub mod client;
pub mod error;
pub mod models;
pub mod query;
pub mod resources;
pub mod session;
pub mod token;

pub use client::{ApiClient, ApiRequest, REFRESH_PATH};
pub use error::{ApiError, ErrorKey, FieldErrors};
pub use query::{page_count, ListOutcome, ListQuery, ListView, PAGE_SIZE};
pub use resources::{BookingsService, EventsService, ItemsService};
pub use session::{LoginOutcome, Session, SessionState};
pub use token::{FileTokenStore, MemoryTokenStore, StoredTokens, TokenPair, TokenStore};
