//! Item and category requests.

use std::sync::Arc;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{Category, Item, ItemPatch, NewItem, Page};
use crate::query::ListQuery;

pub struct ItemsService {
    api: Arc<ApiClient>,
}

impl ItemsService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch one page of items for the query's current filter state.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Item>, ApiError> {
        self.api.get("items/", &query.params()).await
    }

    pub async fn get(&self, id: i64) -> Result<Item, ApiError> {
        self.api.get(&format!("items/{id}/"), &[]).await
    }

    pub async fn create(&self, item: &NewItem) -> Result<Item, ApiError> {
        self.api.post("items/", item).await
    }

    pub async fn update(&self, id: i64, patch: &ItemPatch) -> Result<Item, ApiError> {
        self.api.patch(&format!("items/{id}/"), patch).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("items/{id}/")).await
    }

    /// The server's category choices (value/label pairs).
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.api.get("items/categories/", &[]).await
    }
}
