use tokio_util::sync::CancellationToken;
use tracing::info;

use super::require_text;
use crate::client::{ApiClient, ApiError, ApiRequest, UserScope};
use crate::events::{ClientEvent, Feature};
use crate::models::{ItineraryQuery, SaveTravel, SavedTravel};

pub const DEFAULT_INTERESTS: &str = "general sightseeing";
pub const DEFAULT_BUDGET: &str = "moderate";

pub struct TravelClient<'a> {
    api: &'a ApiClient,
}

impl<'a> TravelClient<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        TravelClient { api }
    }

    /// Generate an itinerary as plain text.
    pub async fn itinerary(&self, query: &ItineraryQuery) -> Result<String, ApiError> {
        self.api.send(itinerary_request(query)?).await
    }

    pub async fn itinerary_cancellable(
        &self,
        query: &ItineraryQuery,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        self.api
            .send_cancellable(itinerary_request(query)?, cancel)
            .await
    }

    pub async fn save(&self, trip: &SaveTravel) -> Result<SavedTravel, ApiError> {
        let destination = trip.destination.as_deref().unwrap_or_default();
        require_text(destination, "Destination is required")?;
        if non_blank(trip.itinerary_text.as_deref()).is_none() {
            return Err(ApiError::Validation(
                "Generate an itinerary before saving".to_string(),
            ));
        }
        let request = ApiRequest::post("/api/travel/save")
            .json(trip)?
            .scoped(UserScope::Body);
        let saved: SavedTravel = self.api.send(request).await?;
        info!(id = saved.id, destination = saved.destination.as_str(), "itinerary saved");
        self.changed();
        Ok(saved)
    }

    pub async fn list_saved(&self) -> Result<Vec<SavedTravel>, ApiError> {
        self.api
            .send(ApiRequest::get("/api/travel/saved").scoped(UserScope::Query))
            .await
    }

    pub async fn get_saved(&self, id: i64) -> Result<SavedTravel, ApiError> {
        self.api
            .send(ApiRequest::get(format!("/api/travel/saved/{id}")).scoped(UserScope::Query))
            .await
    }

    pub async fn search_saved(&self, destination: &str) -> Result<Vec<SavedTravel>, ApiError> {
        let destination = require_text(destination, "Enter a destination to search for")?;
        let request = ApiRequest::get("/api/travel/saved/search")
            .query("destination", destination)
            .scoped(UserScope::Query);
        self.api.send(request).await
    }

    /// Replace the fields present in `changes`; absent fields keep their
    /// saved values.
    pub async fn update_saved(&self, id: i64, changes: &SaveTravel) -> Result<SavedTravel, ApiError> {
        if changes.days == Some(0) {
            return Err(ApiError::Validation("Days must be at least 1".to_string()));
        }
        let request = ApiRequest::put(format!("/api/travel/saved/{id}"))
            .json(changes)?
            .scoped(UserScope::Body);
        let updated = self.api.send(request).await?;
        self.changed();
        Ok(updated)
    }

    pub async fn delete_saved(&self, id: i64) -> Result<Option<String>, ApiError> {
        let message = self
            .api
            .send_message(ApiRequest::delete(format!("/api/travel/saved/{id}")).scoped(UserScope::Query))
            .await?;
        self.changed();
        Ok(message)
    }

    fn changed(&self) {
        self.api
            .events()
            .publish(ClientEvent::SavedItemsChanged(Feature::Travel));
    }
}

fn itinerary_request(query: &ItineraryQuery) -> Result<ApiRequest, ApiError> {
    let destination = require_text(&query.destination, "Destination is required")?;
    if query.days < 1 {
        return Err(ApiError::Validation("Days must be at least 1".to_string()));
    }
    let interests = non_blank(query.interests.as_deref()).unwrap_or(DEFAULT_INTERESTS);
    let budget = non_blank(query.budget.as_deref()).unwrap_or(DEFAULT_BUDGET);
    Ok(ApiRequest::get("/api/travel/itinerary")
        .query("destination", destination)
        .query("days", query.days)
        .query("interests", interests)
        .query("budget", budget))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
