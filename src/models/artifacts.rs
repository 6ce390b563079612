//! Request and response shapes of the travel, chat and recipe endpoints.
//!
//! Saved records carry the backend's zone-less timestamps; ids are the
//! backend's numeric primary keys.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// --- Travel

/// Criteria for `GET /api/travel/itinerary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryQuery {
    pub destination: String,
    pub days: u32,
    pub interests: Option<String>,
    pub budget: Option<String>,
}

/// Body of `POST /api/travel/save` and `PUT /api/travel/saved/{id}`.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaveTravel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub itinerary_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedTravel {
    pub id: i64,
    pub user_id: String,
    pub destination: String,
    pub days: u32,
    #[serde(default)]
    pub interests: Option<String>,
    #[serde(default)]
    pub budget: Option<String>,
    pub itinerary_text: String,
    #[serde(default)]
    pub trip_name: Option<String>,
    pub saved_at: NaiveDateTime,
}

// --- Chat

/// Body of `POST /api/chat/save`.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaveChat {
    pub prompt: String,
    /// When absent the backend generates the answer itself before saving.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: String,
    pub user_message: String,
    pub ai_response: String,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub session_id: Option<String>,
}

// --- Recipe

/// Criteria for `GET /api/recipes/create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeQuery {
    pub ingredients: String,
    pub cuisine: Option<String>,
    pub dietary_restrictions: Option<String>,
}

/// Body of `POST /api/recipes/save`.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecipe {
    pub recipe_text: String,
    pub ingredients: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_restrictions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecipe {
    pub id: i64,
    pub user_id: String,
    pub recipe_text: String,
    pub ingredients: String,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub dietary_restrictions: Option<String>,
    #[serde(default)]
    pub recipe_name: Option<String>,
    pub saved_at: NaiveDateTime,
}
