//! Item-booking requests.
//!
//! Capacity is enforced server-side: a booking whose quantity exceeds what
//! is available for the event's time window comes back as a 400 with a
//! `quantity` field error, surfaced as [`ApiError::Validation`].

use std::sync::Arc;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{ItemBooking, ItemBookingPatch, NewItemBooking};

pub struct BookingsService {
    api: Arc<ApiClient>,
}

impl BookingsService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// All bookings for one item.
    pub async fn list_by_item(&self, item_id: i64) -> Result<Vec<ItemBooking>, ApiError> {
        self.list(&[("item".to_string(), item_id.to_string())]).await
    }

    /// All bookings for one event.
    pub async fn list_by_event(&self, event_id: i64) -> Result<Vec<ItemBooking>, ApiError> {
        self.list(&[("event".to_string(), event_id.to_string())]).await
    }

    async fn list(&self, params: &[(String, String)]) -> Result<Vec<ItemBooking>, ApiError> {
        let value: serde_json::Value = self.api.get("itembookings/", params).await?;
        super::results_or_array(value)
    }

    pub async fn get(&self, id: i64) -> Result<ItemBooking, ApiError> {
        self.api.get(&format!("itembookings/{id}/"), &[]).await
    }

    pub async fn create(&self, booking: &NewItemBooking) -> Result<ItemBooking, ApiError> {
        self.api.post("itembookings/", booking).await
    }

    pub async fn update(&self, id: i64, patch: &ItemBookingPatch) -> Result<ItemBooking, ApiError> {
        self.api.patch(&format!("itembookings/{id}/"), patch).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("itembookings/{id}/")).await
    }
}
