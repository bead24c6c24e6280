//! Event requests.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{Event, EventPatch, NewEvent, Page};
use crate::query::ListQuery;

/// Date-range filters that the server expects as full datetimes.
const DATE_BOUND_FILTERS: [(&str, DayBound); 2] = [
    ("start_datetime_after", DayBound::Start),
    ("start_datetime_before", DayBound::End),
];

#[derive(Clone, Copy)]
enum DayBound {
    Start,
    End,
}

pub struct EventsService {
    api: Arc<ApiClient>,
}

impl EventsService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Fetch one page of events.
    ///
    /// A date-only value in the `start_datetime_after`/`_before` filters is
    /// widened to the start or end of that day before it reaches the API,
    /// so a single-day range still matches events during the day.
    pub async fn list(&self, query: &ListQuery) -> Result<Page<Event>, ApiError> {
        let mut params = query.params();
        for (name, value) in params.iter_mut() {
            if let Some((_, bound)) = DATE_BOUND_FILTERS.iter().find(|(f, _)| *f == name.as_str()) {
                *value = widen_date_bound(value, *bound);
            }
        }
        self.api.get("events/", &params).await
    }

    pub async fn get(&self, id: i64) -> Result<Event, ApiError> {
        self.api.get(&format!("events/{id}/"), &[]).await
    }

    pub async fn create(&self, event: &NewEvent) -> Result<Event, ApiError> {
        self.api.post("events/", event).await
    }

    pub async fn update(&self, id: i64, patch: &EventPatch) -> Result<Event, ApiError> {
        self.api.patch(&format!("events/{id}/"), patch).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("events/{id}/")).await
    }

    /// Events that are ongoing or upcoming; the booking form offers only
    /// these.
    pub async fn current_future(&self) -> Result<Vec<Event>, ApiError> {
        let value: serde_json::Value = self.api.get("events/current-future/", &[]).await?;
        super::results_or_array(value)
    }
}

/// Widen a `YYYY-MM-DD` value to an RFC 3339 datetime at the start or end
/// of that day. Values that already carry a time, or do not parse as a
/// date, pass through untouched.
fn widen_date_bound(value: &str, bound: DayBound) -> String {
    if value.contains('T') {
        return value.to_string();
    }
    let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") else {
        return value.to_string();
    };
    let time = match bound {
        DayBound::Start => NaiveTime::MIN,
        DayBound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            .unwrap_or(NaiveTime::MIN),
    };
    Utc.from_utc_datetime(&date.and_time(time)).to_rfc3339()
}
