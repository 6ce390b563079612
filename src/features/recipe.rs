use tokio_util::sync::CancellationToken;
use tracing::info;

use super::require_text;
use crate::client::{ApiClient, ApiError, ApiRequest, UserScope};
use crate::events::{ClientEvent, Feature};
use crate::models::{RecipeQuery, SaveRecipe, SavedRecipe};

pub const DEFAULT_CUISINE: &str = "any";
const BLANK_INGREDIENTS: &str = "Please enter at least one ingredient";

pub struct RecipeClient<'a> {
    api: &'a ApiClient,
}

impl<'a> RecipeClient<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        RecipeClient { api }
    }

    pub async fn generate(&self, query: &RecipeQuery) -> Result<String, ApiError> {
        self.api.send(generate_request(query)?).await
    }

    pub async fn generate_cancellable(
        &self,
        query: &RecipeQuery,
        cancel: &CancellationToken,
    ) -> Result<String, ApiError> {
        self.api
            .send_cancellable(generate_request(query)?, cancel)
            .await
    }

    pub async fn suggestions(&self, ingredients: &str) -> Result<String, ApiError> {
        let ingredients = require_text(ingredients, BLANK_INGREDIENTS)?;
        self.api
            .send(ApiRequest::get("/api/recipes/suggestions").query("ingredients", ingredients))
            .await
    }

    pub async fn save(&self, recipe: &SaveRecipe) -> Result<SavedRecipe, ApiError> {
        require_text(&recipe.recipe_text, "Generate a recipe before saving")?;
        require_text(&recipe.ingredients, BLANK_INGREDIENTS)?;
        let request = ApiRequest::post("/api/recipes/save")
            .json(recipe)?
            .scoped(UserScope::Body);
        let saved: SavedRecipe = self.api.send(request).await?;
        info!(id = saved.id, "recipe saved");
        self.changed();
        Ok(saved)
    }

    pub async fn list_saved(&self) -> Result<Vec<SavedRecipe>, ApiError> {
        self.api
            .send(ApiRequest::get("/api/recipes/saved").scoped(UserScope::Query))
            .await
    }

    pub async fn get_saved(&self, id: i64) -> Result<SavedRecipe, ApiError> {
        self.api
            .send(ApiRequest::get(format!("/api/recipes/saved/{id}")).scoped(UserScope::Query))
            .await
    }

    pub async fn delete_saved(&self, id: i64) -> Result<Option<String>, ApiError> {
        let message = self
            .api
            .send_message(ApiRequest::delete(format!("/api/recipes/saved/{id}")).scoped(UserScope::Query))
            .await?;
        self.changed();
        Ok(message)
    }

    fn changed(&self) {
        self.api
            .events()
            .publish(ClientEvent::SavedItemsChanged(Feature::Recipe));
    }
}

fn generate_request(query: &RecipeQuery) -> Result<ApiRequest, ApiError> {
    let ingredients = require_text(&query.ingredients, BLANK_INGREDIENTS)?;
    let cuisine = query
        .cuisine
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CUISINE);
    Ok(ApiRequest::get("/api/recipes/create")
        .query("ingredients", ingredients)
        .query("cuisine", cuisine)
        .query_opt("dietaryRestrictions", query.dietary_restrictions.as_deref()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::BackendConfig;
    use crate::events::EventBus;
    use crate::models::{Profile, SessionData};
    use crate::store::MemoryStore;
    use mockito::{Matcher, Server};
    use serde_json::json;

    const RECIPE: &str = r#"{"id": 3, "userId": "alice", "recipeText": "Omelette",
        "ingredients": "eggs, cheese", "cuisine": "french", "dietaryRestrictions": null,
        "recipeName": "Breakfast", "savedAt": "2024-05-01T08:00:00"}"#;

    fn client(url: &str) -> ApiClient {
        let store = MemoryStore::with_session(SessionData::new("T1", Profile::new("alice", None)));
        ApiClient::new(&BackendConfig::with_base_url(url), Arc::new(store), EventBus::default()).unwrap()
    }

    #[tokio::test]
    async fn test_generate_defaults_cuisine() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/api/recipes/create")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ingredients".into(), "eggs, cheese".into()),
                Matcher::UrlEncoded("cuisine".into(), "any".into()),
                Matcher::UrlEncoded("dietaryRestrictions".into(), "vegetarian".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"success": true, "data": "Omelette"}"#)
            .create_async()
            .await;

        let api = client(&server.url());
        let query = RecipeQuery {
            ingredients: "eggs, cheese".to_string(),
            cuisine: None,
            dietary_restrictions: Some("vegetarian".to_string()),
        };
        assert_eq!(api.recipes().generate(&query).await.unwrap(), "Omelette");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_blank_ingredients_are_not_sent() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/api/recipes/suggestions")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let api = client(&server.url());
        let error = api.recipes().suggestions("").await.unwrap_err();
        assert!(matches!(error, ApiError::Validation(_)));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_save_list_get_delete() {
        let mut server = Server::new_async().await;
        let save = server
            .mock("POST", "/api/recipes/save")
            .match_body(Matcher::PartialJson(json!({
                "recipeText": "Omelette",
                "ingredients": "eggs, cheese",
                "userId": "alice"
            })))
            .with_status(200)
            .with_body(format!(r#"{{"success": true, "data": {RECIPE}}}"#))
            .create_async()
            .await;
        let list = server
            .mock("GET", "/api/recipes/saved")
            .match_query(Matcher::UrlEncoded("userId".into(), "alice".into()))
            .with_status(200)
            .with_body(format!(r#"{{"success": true, "data": [{RECIPE}]}}"#))
            .create_async()
            .await;
        let get = server
            .mock("GET", "/api/recipes/saved/3")
            .match_query(Matcher::UrlEncoded("userId".into(), "alice".into()))
            .with_status(200)
            .with_body(format!(r#"{{"success": true, "data": {RECIPE}}}"#))
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/api/recipes/saved/3")
            .match_query(Matcher::UrlEncoded("userId".into(), "alice".into()))
            .with_status(200)
            .with_body(r#"{"success": true, "message": "Recipe deleted successfully"}"#)
            .create_async()
            .await;

        let api = client(&server.url());
        let mut events = api.events().subscribe();
        let recipes = api.recipes();
        let saved = recipes
            .save(&SaveRecipe {
                recipe_text: "Omelette".to_string(),
                ingredients: "eggs, cheese".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(saved.recipe_name.as_deref(), Some("Breakfast"));
        assert_eq!(recipes.list_saved().await.unwrap().len(), 1);
        assert_eq!(recipes.get_saved(3).await.unwrap().id, 3);
        recipes.delete_saved(3).await.unwrap();

        save.assert_async().await;
        list.assert_async().await;
        get.assert_async().await;
        delete.assert_async().await;
        for _ in 0..2 {
            assert_eq!(
                events.try_recv().unwrap(),
                ClientEvent::SavedItemsChanged(Feature::Recipe)
            );
        }
        assert!(events.try_recv().is_err());
    }
}
