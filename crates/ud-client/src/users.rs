//! `/users-management/` endpoints

use tracing::info;
use ud_core::{UdError, UdResult};
use ud_models::{SingleUserResponse, UserUpdateRequest, UsersResponse};
use ud_queries::{encode, encode_count, QueryState, RuleSet};

use crate::client::ApiClient;

const USERS_PATH: &str = "/users-management/";
const UPDATE_PATH: &str = "/users-management/update";

#[derive(Clone)]
pub struct UsersApi {
    client: ApiClient,
}

impl UsersApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// One page of users matching the listing state
    pub async fn list_users(&self, state: &QueryState) -> UdResult<UsersResponse> {
        let params = encode(state);
        self.client.get(USERS_PATH, Some(&params)).await
    }

    pub async fn get_user(&self, user_id: i64) -> UdResult<SingleUserResponse> {
        self.client
            .get(&format!("/users-management/{}", user_id), None)
            .await
    }

    /// Validate and send an edit
    pub async fn update_user(&self, request: &UserUpdateRequest) -> UdResult<SingleUserResponse> {
        request.check().map_err(UdError::Validation)?;
        let response: SingleUserResponse = self.client.patch(UPDATE_PATH, request).await?;
        info!(user_id = request.user_id, "Updated user");
        Ok(response)
    }

    /// Number of users matching `rules`
    pub async fn count(&self, rules: &RuleSet) -> UdResult<u64> {
        let params = encode_count(rules);
        let response: UsersResponse = self.client.get(USERS_PATH, Some(&params)).await?;
        Ok(response.meta.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credential, MemoryCredentialStore};
    use crate::test_support::{admin, spawn};
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::{get, patch};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;
    use ud_queries::{FilterRule, SortSpec};

    fn user_json(user_id: i64) -> Value {
        json!({ "counter": user_id, "user_id": user_id, "is_ban": false, "country": "ایران" })
    }

    /// Echoes the received query back in `error.query` so tests can inspect it
    async fn list(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
        Json(json!({
            "data": [user_json(1), user_json(2)],
            "meta": { "total": 42, "page": 1, "size": 20, "pages": 3 },
            "error": { "query": query }
        }))
    }

    async fn show(Path(user_id): Path<i64>) -> axum::response::Response {
        if user_id == 404 {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": { "message": "user not found" } })),
            )
                .into_response();
        }
        Json(json!({ "data": user_json(user_id), "meta": {}, "error": {} })).into_response()
    }

    async fn update(Json(body): Json<Value>) -> Json<Value> {
        let mut user = user_json(body["user_id"].as_i64().unwrap_or_default());
        if let Some(score) = body.get("score") {
            user["score"] = score.clone();
        }
        Json(json!({ "data": user, "meta": {}, "error": {} }))
    }

    async fn users_api() -> UsersApi {
        let router = Router::new()
            .route("/users-management/", get(list))
            .route("/users-management/update", patch(update))
            .route("/users-management/:user_id", get(show));
        let base = spawn(router).await;
        let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new(
            "tok",
            admin(),
        )));
        UsersApi::new(ApiClient::with_http(reqwest::Client::new(), base, store))
    }

    #[tokio::test]
    async fn test_list_users_sends_encoded_rules() {
        let api = users_api().await;
        let rules = RuleSet::new()
            .with(FilterRule::between("score", 10, 50))
            .unwrap()
            .with(FilterRule::is_empty("country"))
            .unwrap();
        let state = QueryState::new()
            .with_rules(rules)
            .with_sort(SortSpec::asc("join_date").unwrap())
            .with_search("ali");

        let response = api.list_users(&state).await.unwrap();
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.meta.total, 42);

        let query = &response.error["query"];
        assert_eq!(query["min_score"], "10");
        assert_eq!(query["max_score"], "50");
        assert_eq!(query["no_country"], "true");
        assert_eq!(query["order_by"], "join_date");
        assert_eq!(query["search"], "ali");
        assert_eq!(query["page"], "1");
        assert_eq!(query["size"], "20");
    }

    #[tokio::test]
    async fn test_get_user() {
        let api = users_api().await;
        let response = api.get_user(77).await.unwrap();
        assert_eq!(response.data.user_id, 77);

        let err = api.get_user(404).await.unwrap_err();
        assert_eq!(
            err,
            UdError::NotFound {
                message: "user not found".into()
            }
        );
    }

    #[tokio::test]
    async fn test_update_user() {
        let api = users_api().await;
        let mut request = UserUpdateRequest::new(9);
        request.score = Some(15.0);
        let response = api.update_user(&request).await.unwrap();
        assert_eq!(response.data.user_id, 9);
        assert_eq!(response.data.score, Some(15.0));
    }

    #[tokio::test]
    async fn test_invalid_update_is_not_sent() {
        let api = users_api().await;
        let err = api.update_user(&UserUpdateRequest::new(0)).await.unwrap_err();
        assert!(matches!(err, UdError::Validation(_)));
    }

    #[tokio::test]
    async fn test_count() {
        let api = users_api().await;
        assert_eq!(api.count(&RuleSet::new()).await.unwrap(), 42);
    }
}
