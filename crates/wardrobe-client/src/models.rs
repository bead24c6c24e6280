//! Typed records for the Wardrobe API.
//!
//! These mirror the server's serializers; the client treats them as opaque
//! payloads and enforces no invariants beyond presence/absence of fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user, as returned by login and `auth/me/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Registration payload for `auth/register/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// `POST auth/login/` response: the token pair plus the user record.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

/// `POST auth/token/refresh/` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// `POST auth/register/` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub detail: String,
    pub user: User,
}

/// Paginated list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    pub results: Vec<T>,
}

/// Inventory item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: String,
    /// Human-readable category label, when the serializer includes it.
    #[serde(default)]
    pub category_long: Option<String>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub checked_out: bool,
    #[serde(default)]
    pub in_repair: bool,
}

/// Item creation payload.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewItem {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub quantity: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub location: String,
    pub checked_out: bool,
    pub in_repair: bool,
}

/// Partial item update; only present fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_out: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_repair: Option<bool>,
}

/// Category choice pair from `items/categories/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub value: String,
    pub label: String,
}

/// Scheduled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
}

/// Event creation payload.
#[derive(Debug, Clone, Serialize)]
pub struct NewEvent {
    pub name: String,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

/// Partial event update.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_datetime: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Item booking against an event, including the serializer's read-only
/// joined fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBooking {
    pub id: i64,
    pub item: i64,
    pub event: i64,
    pub quantity: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub event_start_datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_end_datetime: Option<DateTime<Utc>>,
}

/// Booking creation payload. Capacity is validated server-side; violations
/// come back as a `quantity` field error.
#[derive(Debug, Clone, Serialize)]
pub struct NewItemBooking {
    pub item: i64,
    pub event: i64,
    pub quantity: u32,
}

/// Partial booking update. Item and event are immutable once booked, so
/// only the quantity can change.
#[derive(Debug, Clone, Serialize)]
pub struct ItemBookingPatch {
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserializes_with_missing_optional_fields() {
        let json = serde_json::json!({
            "id": 7,
            "username": "testuser",
            "email": "t@example.com"
        });
        let user: User = serde_json::from_value(json).unwrap();
        assert_eq!(user.username, "testuser");
        assert_eq!(user.first_name, "");
        assert!(user.groups.is_empty());
    }

    #[test]
    fn test_page_envelope() {
        let json = serde_json::json!({
            "count": 20,
            "results": [
                {"value": "HAT", "label": "Hats"},
                {"value": "WIG", "label": "Wigs"}
            ]
        });
        let page: Page<Category> = serde_json::from_value(json).unwrap();
        assert_eq!(page.count, 20);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].label, "Hats");
    }

    #[test]
    fn test_item_patch_skips_absent_fields() {
        let patch = ItemPatch {
            quantity: Some(4),
            ..Default::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"quantity": 4}));
    }

    #[test]
    fn test_booking_deserializes_joined_fields() {
        let json = serde_json::json!({
            "id": 3,
            "item": 11,
            "event": 5,
            "quantity": 2,
            "created_at": "2026-05-01T12:00:00Z",
            "item_name": "Feather Boa",
            "event_name": "Spring Gala",
            "event_start_datetime": "2026-06-01T18:00:00Z",
            "event_end_datetime": "2026-06-01T23:00:00Z"
        });
        let booking: ItemBooking = serde_json::from_value(json).unwrap();
        assert_eq!(booking.item_name, "Feather Boa");
        assert_eq!(booking.quantity, 2);
    }
}
