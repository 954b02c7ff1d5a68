mod value;

use crate::error::{ChefError, Result};
use crate::http;
use crate::model::{Comment, Recipe};
use crate::reaction::{Reaction, ReactionTally};
use crate::store::{sort_by_saved_at, CommentStore, CommunityStore, SavedStore};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Fields touched by a reaction update
const REACTION_FIELDS: [&str; 4] = ["likes", "dislikes", "likedBy", "dislikedBy"];

/// Document store backed by the Firestore REST API.
///
/// Layout, relative to `artifacts/{app_id}`:
/// - `public/recipes/{id}`: community recipes
/// - `public/recipes/{id}/comments/{auto}`: comment threads
/// - `users/{uid}/saved_recipes/{id}`: saved recipes
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    project_id: String,
    app_id: String,
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

impl Document {
    /// Last path segment of the document name
    fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut plain = match &self.fields {
            Some(fields) => value::decode_fields(fields)?,
            None => json!({}),
        };
        if let Value::Object(map) = &mut plain {
            map.insert("id".to_string(), Value::String(self.id().to_string()));
        }
        Ok(serde_json::from_value(plain)?)
    }
}

/// Decode every document, skipping the ones that do not fit `T`
fn decode_all<'a, T, I>(documents: I) -> Vec<T>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = &'a Document>,
{
    documents
        .into_iter()
        .filter_map(|document| match document.decode() {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable document {}: {}", document.name, e);
                None
            }
        })
        .collect()
}

/// Serialize a record into a Firestore document body
fn document_body<T: Serialize>(record: &T) -> Result<Value> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(json!({ "fields": value::encode_fields(&map) })),
        other => Err(ChefError::MalformedResponse(format!(
            "Expected a record to serialize as an object, got: {}",
            other
        ))),
    }
}

fn query_body(collection: &str, order_field: &str, limit: usize) -> Value {
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "orderBy": [{
                "field": { "fieldPath": order_field },
                "direction": "DESCENDING"
            }],
            "limit": limit
        }
    })
}

impl FirestoreStore {
    pub fn new(base_url: String, project_id: String, app_id: String) -> Self {
        Self {
            client: http::client(http::DEFAULT_TIMEOUT),
            base_url,
            project_id,
            app_id,
            id_token: None,
        }
    }

    /// Give up on requests that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http::client(timeout);
        self
    }

    /// Authenticate every request with the signed-in user's token
    pub fn with_id_token(mut self, id_token: Option<String>) -> Self {
        self.id_token = id_token;
        self
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    fn public_path(&self) -> String {
        format!("artifacts/{}/public", self.app_id)
    }

    fn recipe_path(&self, id: &str) -> String {
        format!("{}/recipes/{}", self.public_path(), id)
    }

    fn saved_path(&self, user_id: &str) -> String {
        format!("artifacts/{}/users/{}/saved_recipes", self.app_id, user_id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.id_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = self.authorized(request).send().await?;
        if !response.status().is_success() {
            return Err(ChefError::from_status("Firestore", response).await);
        }
        Ok(response)
    }

    async fn run_query<T: DeserializeOwned>(&self, parent: &str, body: Value) -> Result<Vec<T>> {
        let url = format!("{}/{}:runQuery", self.documents_url(), parent);
        let response = self.send(self.client.post(url).json(&body)).await?;
        let items: Vec<RunQueryItem> = response.json().await?;
        debug!("runQuery on {} returned {} item(s)", parent, items.len());

        Ok(decode_all(
            items.iter().filter_map(|item| item.document.as_ref()),
        ))
    }

    async fn patch_document<T: Serialize>(&self, path: &str, record: &T) -> Result<()> {
        let url = format!("{}/{}", self.documents_url(), path);
        let body = document_body(record)?;
        self.send(self.client.patch(url).json(&body)).await?;
        Ok(())
    }
}

#[async_trait]
impl CommunityStore for FirestoreStore {
    async fn top_recipes(&self, limit: usize) -> Result<Vec<Recipe>> {
        self.run_query(&self.public_path(), query_body("recipes", "likes", limit))
            .await
    }

    async fn get_recipe(&self, id: &str) -> Result<Option<Recipe>> {
        let url = format!("{}/{}", self.documents_url(), self.recipe_path(id));
        let response = self.authorized(self.client.get(url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ChefError::from_status("Firestore", response).await);
        }
        let document: Document = response.json().await?;
        Ok(Some(document.decode()?))
    }

    async fn put_recipe(&self, recipe: &Recipe) -> Result<()> {
        let id = recipe.id.as_deref().ok_or_else(|| {
            ChefError::InsufficientInput("Recipe must have an id to be stored".to_string())
        })?;
        self.patch_document(&self.recipe_path(id), recipe).await
    }

    async fn react(
        &self,
        recipe_id: &str,
        user_id: &str,
        reaction: Reaction,
    ) -> Result<Option<ReactionTally>> {
        let Some(recipe) = self.get_recipe(recipe_id).await? else {
            return Ok(None);
        };

        let tally = ReactionTally::of(&recipe).apply(user_id, reaction);
        let url = format!("{}/{}", self.documents_url(), self.recipe_path(recipe_id));
        let mask: Vec<(&str, &str)> = REACTION_FIELDS
            .iter()
            .map(|field| ("updateMask.fieldPaths", *field))
            .collect();

        let body = document_body(&tally)?;
        self.send(self.client.patch(url).query(&mask).json(&body))
            .await?;
        Ok(Some(tally))
    }
}

#[async_trait]
impl SavedStore for FirestoreStore {
    async fn saved_recipes(&self, user_id: &str) -> Result<Vec<Recipe>> {
        let url = format!("{}/{}", self.documents_url(), self.saved_path(user_id));
        let mut recipes = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).query(&[("pageSize", "100")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: ListDocumentsResponse = self.send(request).await?.json().await?;
            recipes.extend(decode_all::<Recipe, _>(&page.documents));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        sort_by_saved_at(&mut recipes);
        Ok(recipes)
    }

    async fn save_recipe(&self, user_id: &str, recipe: &Recipe) -> Result<()> {
        let id = recipe.id.as_deref().ok_or_else(|| {
            ChefError::InsufficientInput("Recipe must have an id to be saved".to_string())
        })?;
        let path = format!("{}/{}", self.saved_path(user_id), id);
        self.patch_document(&path, recipe).await
    }
}

#[async_trait]
impl CommentStore for FirestoreStore {
    async fn add_comment(&self, recipe_id: &str, comment: &Comment) -> Result<()> {
        let url = format!(
            "{}/{}/comments",
            self.documents_url(),
            self.recipe_path(recipe_id)
        );
        let body = document_body(comment)?;
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    async fn recent_comments(&self, recipe_id: &str, limit: usize) -> Result<Vec<Comment>> {
        self.run_query(
            &self.recipe_path(recipe_id),
            query_body("comments", "createdAt", limit),
        )
        .await
    }
}
