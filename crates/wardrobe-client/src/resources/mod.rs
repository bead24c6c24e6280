//! Thin request-composition services, one per entity.
//!
//! These only build requests and decode responses; all authentication and
//! retry behavior lives in the pipeline.

mod bookings;
mod events;
mod items;

pub use bookings::BookingsService;
pub use events::EventsService;
pub use items::ItemsService;

use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Decode either the paginated envelope (`{count, results}`) or a bare
/// array. Some list endpoints return one or the other depending on server
/// configuration.
fn results_or_array<T: DeserializeOwned>(value: serde_json::Value) -> Result<Vec<T>, ApiError> {
    let items = match value {
        serde_json::Value::Object(mut object) => match object.remove("results") {
            Some(results) => results,
            None => return Err(ApiError::Decode(serde::de::Error::custom(
                "expected a results array or a bare array",
            ))),
        },
        other => other,
    };
    Ok(serde_json::from_value(items)?)
}
