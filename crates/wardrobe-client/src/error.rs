//! Error types for the Wardrobe API client.
//!
//! The remote API is Django-REST-Framework shaped: validation failures come
//! back as 400 responses with field-keyed, array-valued messages, everything
//! else carries an optional `detail` string.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use thiserror::Error;

use crate::token::TokenStoreError;

/// Errors surfaced by the request pipeline and resource services.
#[derive(Error, Debug)]
pub enum ApiError {
    /// 401 after the pipeline exhausted its single refresh-and-retry.
    #[error("authentication required")]
    Unauthorized,

    /// 404 from the server.
    #[error("resource not found")]
    NotFound,

    /// 400 with field-keyed validation messages.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Any other non-2xx status.
    #[error("server returned {status}")]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    /// Transport-level failure (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Local credential storage failed.
    #[error("token storage error: {0}")]
    TokenStore(#[from] TokenStoreError),
}

impl ApiError {
    /// Map a non-2xx response status and body to the error taxonomy.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound,
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::BAD_REQUEST => {
                if let Some(fields) = FieldErrors::from_body(body) {
                    ApiError::Validation(fields)
                } else {
                    ApiError::Status {
                        status,
                        detail: extract_detail(body),
                    }
                }
            }
            status => ApiError::Status {
                status,
                detail: extract_detail(body),
            },
        }
    }

    /// Server `detail` string for this error, if one was present.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(|d| d.as_str())
        .map(|d| d.to_string())
}

/// Field-keyed validation messages, as returned by the server for
/// registration and booking-capacity failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Parse a 400 body of the shape `{"field": ["msg", ...], ...}`.
    ///
    /// String values are tolerated and treated as single-message arrays.
    /// A body whose only key is `detail` is not a validation payload and
    /// returns `None`.
    pub fn from_body(body: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let object = value.as_object()?;
        if object.is_empty() {
            return None;
        }
        if object.len() == 1 && object.contains_key("detail") {
            return None;
        }

        let mut fields = BTreeMap::new();
        for (name, messages) in object {
            let messages = match messages {
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|m| m.as_str().map(|m| m.to_string()))
                    .collect(),
                serde_json::Value::String(message) => vec![message.clone()],
                other => vec![other.to_string()],
            };
            fields.insert(name.clone(), messages);
        }
        Some(FieldErrors(fields))
    }

    /// First message for a field - the display string rendered inline.
    pub fn first(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(|m| m.first()).map(|m| m.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(name, msgs)| (name.as_str(), msgs.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FieldErrors {
    /// `field: msg, msg. field2: msg` - the formatting the registration
    /// flow shows when it has nowhere better to put the messages.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, ". ")?;
            }
            write!(f, "{}: {}", field, messages.join(", "))?;
            first = false;
        }
        Ok(())
    }
}

/// Keys for the shared error-message table.
///
/// Multiple call sites report the same class of failure; keying them here
/// keeps the user-facing copy and the fallback target consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKey {
    LoadItemFailed,
    LoadItemsFailed,
    CreateItemFailed,
    UpdateItemFailed,
    DeleteItemFailed,
    LoadCategoriesFailed,
    LoadEventFailed,
    LoadEventsFailed,
    CreateEventFailed,
    UpdateEventFailed,
    DeleteEventFailed,
    LoadBookingFailed,
    LoadBookingsFailed,
    CreateBookingFailed,
    UpdateBookingFailed,
    DeleteBookingFailed,
    Generic,
}

impl ErrorKey {
    /// Fixed user-facing message for this key.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKey::LoadItemFailed => "Failed to load item details. Please try again later.",
            ErrorKey::LoadItemsFailed => "Failed to load items. Please try again later.",
            ErrorKey::CreateItemFailed => "Failed to create item. Please try again later.",
            ErrorKey::UpdateItemFailed => {
                "Failed to update item. Please check your input and try again."
            }
            ErrorKey::DeleteItemFailed => "Failed to delete item. Please try again later.",
            ErrorKey::LoadCategoriesFailed => "Failed to load categories. Please try again later.",
            ErrorKey::LoadEventFailed => "Failed to load event details. Please try again later.",
            ErrorKey::LoadEventsFailed => "Failed to load events. Please try again later.",
            ErrorKey::CreateEventFailed => "Failed to create event. Please try again later.",
            ErrorKey::UpdateEventFailed => {
                "Failed to update event. Please check your input and try again."
            }
            ErrorKey::DeleteEventFailed => "Failed to delete event. Please try again later.",
            ErrorKey::LoadBookingFailed => "Failed to load booking details. Please try again later.",
            ErrorKey::LoadBookingsFailed => "Failed to load bookings. Please try again later.",
            ErrorKey::CreateBookingFailed => "Failed to create booking. Please try again later.",
            ErrorKey::UpdateBookingFailed => {
                "Failed to update booking. Please check your input and try again."
            }
            ErrorKey::DeleteBookingFailed => "Failed to delete booking. Please try again later.",
            ErrorKey::Generic => "Something went wrong. Please try again.",
        }
    }

    /// Where to send the user after an unrecoverable failure.
    pub fn back_target(&self) -> &'static str {
        match self {
            ErrorKey::LoadItemFailed
            | ErrorKey::CreateItemFailed
            | ErrorKey::DeleteItemFailed
            | ErrorKey::LoadCategoriesFailed => "wardrobe items list",
            ErrorKey::UpdateItemFailed => "wardrobe items get <id>",
            ErrorKey::LoadEventFailed
            | ErrorKey::CreateEventFailed
            | ErrorKey::DeleteEventFailed => "wardrobe events list",
            ErrorKey::UpdateEventFailed => "wardrobe events get <id>",
            ErrorKey::LoadBookingFailed
            | ErrorKey::CreateBookingFailed
            | ErrorKey::DeleteBookingFailed
            | ErrorKey::UpdateBookingFailed => "wardrobe bookings list",
            ErrorKey::LoadItemsFailed
            | ErrorKey::LoadEventsFailed
            | ErrorKey::LoadBookingsFailed
            | ErrorKey::Generic => "wardrobe --help",
        }
    }
}
