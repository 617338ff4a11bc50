use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::RwLock;
use uuid::Uuid;

use super::{ApiError, ApiResult, Backend};
use daybook_types::*;

/// API client for communicating with the Daybook server
pub struct ApiClient {
    client: Client,
    base_url: String,
    session_token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn token(&self) -> Option<String> {
        self.session_token.read().ok().and_then(|t| t.clone())
    }

    /// Helper to add the bearer token to a request if we have one
    fn add_auth_header(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response body into a readable message
    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(&error_text) {
            return parsed.details.unwrap_or(parsed.error);
        }
        if let Ok(envelope) = serde_json::from_str::<Envelope<serde_json::Value>>(&error_text) {
            if let Some(error) = envelope.error {
                return error;
            }
        }

        // Clean up HTML error messages (e.g., from proxy 404 pages)
        if error_text.contains("<html>") || error_text.contains("<!DOCTYPE") {
            format!("Server returned {} error. Please check the server URL.", status.as_u16())
        } else {
            error_text
        }
    }

    /// Helper to handle REST responses
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = Self::error_message(response).await;
            Err(ApiError::from_status(status.as_u16(), message))
        }
    }

    /// Helper for endpoints whose body we don't need
    async fn handle_empty(&self, response: reqwest::Response) -> ApiResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = Self::error_message(response).await;
            Err(ApiError::from_status(status.as_u16(), message))
        }
    }

    /// Helper to unwrap a `/functions` envelope
    async fn handle_envelope<T: DeserializeOwned>(&self, response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        let text = response.text().await?;
        parse_envelope(status, &text)
    }

    async fn store_login(&self, response: reqwest::Response) -> ApiResult<LoginResponse> {
        let login: LoginResponse = self.handle_response(response).await?;
        self.set_session_token(Some(login.session_token.clone()));
        Ok(login)
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}

#[async_trait]
impl Backend for ApiClient {
    fn set_session_token(&self, token: Option<String>) {
        if let Ok(mut slot) = self.session_token.write() {
            *slot = token;
        }
    }

    // Authentication endpoints

    async fn register(&self, email: &str) -> ApiResult<LoginResponse> {
        let request = RegisterRequest { email: email.to_string() };
        let response = self.client.post(self.url("/auth/register")).json(&request).send().await?;
        self.store_login(response).await
    }

    async fn login(&self, email: &str) -> ApiResult<LoginResponse> {
        let request = LoginRequest { email: email.to_string() };
        let response = self.client.post(self.url("/auth/login")).json(&request).send().await?;
        self.store_login(response).await
    }

    async fn logout(&self) -> ApiResult<()> {
        let req = self.add_auth_header(self.client.post(self.url("/auth/logout")));
        let response = req.send().await?;
        self.set_session_token(None);
        self.handle_empty(response).await
    }

    async fn validate_session(&self) -> ApiResult<User> {
        let req = self.add_auth_header(self.client.get(self.url("/auth/validate")));
        let response = req.send().await?;
        let validated: ValidateSessionResponse = self.handle_response(response).await?;
        Ok(validated.user)
    }

    // Post endpoints

    async fn feed(&self, scope: FeedScope, limit: Option<u32>) -> ApiResult<Vec<Post>> {
        let mut url = format!("{}/posts?scope={}", self.base_url, scope.as_str());
        if let Some(limit) = limit {
            url.push_str(&format!("&limit={}", limit));
        }
        let req = self.add_auth_header(self.client.get(&url));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn create_post(&self, request: &CreatePostRequest) -> ApiResult<Post> {
        let req = self.add_auth_header(self.client.post(self.url("/posts")).json(request));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn set_completed(&self, post_id: Uuid, completed: bool) -> ApiResult<()> {
        let url = self.url(&format!("/posts/{}/completed", post_id));
        let request = SetCompletedRequest { completed };
        let req = self.add_auth_header(self.client.put(&url).json(&request));
        let response = req.send().await?;
        self.handle_empty(response).await
    }

    async fn delete_post(&self, post_id: Uuid) -> ApiResult<()> {
        let url = self.url(&format!("/posts/{}", post_id));
        let req = self.add_auth_header(self.client.delete(&url));
        let response = req.send().await?;
        self.handle_empty(response).await
    }

    async fn like(&self, post_id: Uuid) -> ApiResult<()> {
        let url = self.url(&format!("/posts/{}/like", post_id));
        let req = self.add_auth_header(self.client.post(&url));
        let response = req.send().await?;
        self.handle_empty(response).await
    }

    async fn unlike(&self, post_id: Uuid) -> ApiResult<()> {
        let url = self.url(&format!("/posts/{}/like", post_id));
        let req = self.add_auth_header(self.client.delete(&url));
        let response = req.send().await?;
        self.handle_empty(response).await
    }

    // Follow endpoints

    async fn follow(&self, followee_id: Uuid) -> ApiResult<FollowEdge> {
        let request = CreateFollowRequest { followee_id };
        let req = self.add_auth_header(self.client.post(self.url("/follows")).json(&request));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn unfollow(&self, followee_id: Uuid) -> ApiResult<()> {
        let url = self.url(&format!("/follows/{}", followee_id));
        let req = self.add_auth_header(self.client.delete(&url));
        let response = req.send().await?;
        self.handle_empty(response).await
    }

    async fn outgoing_follows(&self) -> ApiResult<Vec<FollowEdge>> {
        let req = self.add_auth_header(self.client.get(self.url("/follows/outgoing")));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn pending_requests(&self) -> ApiResult<Vec<FollowEdge>> {
        let req = self.add_auth_header(self.client.get(self.url("/follows/incoming?status=pending")));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    async fn answer_request(&self, edge_id: Uuid, status: FollowStatus) -> ApiResult<FollowEdge> {
        let url = self.url(&format!("/follows/{}/status", edge_id));
        let request = UpdateFollowStatusRequest { status };
        let req = self.add_auth_header(self.client.put(&url).json(&request));
        let response = req.send().await?;
        self.handle_response(response).await
    }

    // Privileged functions

    async fn set_username(&self, username: &str) -> ApiResult<User> {
        let request = SetUsernameRequest { username: username.to_string() };
        let req = self.add_auth_header(self.client.post(self.url("/functions/set-username")).json(&request));
        let response = req.send().await?;
        self.handle_envelope(response).await
    }

    async fn search_users(&self, query: &str) -> ApiResult<Vec<UserSummary>> {
        let url = format!(
            "{}/functions/search-users?q={}",
            self.base_url,
            urlencoding::encode(query)
        );
        let req = self.add_auth_header(self.client.get(&url));
        let response = req.send().await?;
        self.handle_envelope(response).await
    }

    async fn delete_account(&self) -> ApiResult<()> {
        let req = self.add_auth_header(self.client.post(self.url("/functions/delete-account")));
        let response = req.send().await?;
        let _: AccountDeleted = self.handle_envelope(response).await?;
        self.set_session_token(None);
        Ok(())
    }

    async fn schedule_for(&self, date: NaiveDate) -> ApiResult<Vec<ScheduleEntry>> {
        let url = format!("{}/functions/schedule?date={}", self.base_url, date);
        let req = self.add_auth_header(self.client.get(&url));
        let response = req.send().await?;
        self.handle_envelope(response).await
    }

    async fn create_schedule_entry(&self, draft: &ScheduleEntryDraft) -> ApiResult<ScheduleEntry> {
        let req = self.add_auth_header(self.client.post(self.url("/functions/schedule")).json(draft));
        let response = req.send().await?;
        self.handle_envelope(response).await
    }

    async fn delete_schedule_entry(&self, entry_id: Uuid) -> ApiResult<()> {
        let url = self.url(&format!("/functions/schedule/{}", entry_id));
        let req = self.add_auth_header(self.client.delete(&url));
        let response = req.send().await?;
        let _: ScheduleEntryDeleted = self.handle_envelope(response).await?;
        Ok(())
    }
}

fn parse_envelope<T: DeserializeOwned>(status: reqwest::StatusCode, text: &str) -> ApiResult<T> {
    let envelope: Envelope<T> = serde_json::from_str(text).map_err(|e| {
        if status.is_success() {
            ApiError::Serialization(e)
        } else {
            ApiError::from_status(status.as_u16(), text.to_string())
        }
    })?;

    envelope
        .into_result()
        .map_err(|message| ApiError::from_status(status.as_u16(), message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_envelope_data_is_unwrapped() {
        let id = Uuid::new_v4();
        let body = format!(r#"{{"success":true,"data":{{"id":"{}"}}}}"#, id);
        let deleted: ScheduleEntryDeleted = parse_envelope(StatusCode::OK, &body).unwrap();
        assert_eq!(deleted.id, id);

        let users: Vec<UserSummary> =
            parse_envelope(StatusCode::OK, r#"{"success":true,"data":[]}"#).unwrap();
        assert!(users.is_empty());
    }

    #[test]
    fn test_envelope_error_keeps_status() {
        let err = parse_envelope::<User>(
            StatusCode::CONFLICT,
            r#"{"success":false,"error":"Username already taken"}"#,
        )
        .unwrap_err();
        match err {
            ApiError::Conflict(message) => assert_eq!(message, "Username already taken"),
            other => panic!("expected a conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_non_envelope_body_falls_back_to_status() {
        let err = parse_envelope::<User>(StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ApiError::Api(_)), "got {:?}", err);

        let err = parse_envelope::<User>(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, ApiError::Serialization(_)));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url("/posts"), "http://localhost:3000/posts");
    }

    #[test]
    fn test_session_token_is_replaceable() {
        let client = ApiClient::default();
        assert!(client.token().is_none());
        client.set_session_token(Some("abc".to_string()));
        assert_eq!(client.token().as_deref(), Some("abc"));
        client.set_session_token(None);
        assert!(client.token().is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(ApiError::from_status(409, "taken".into()), ApiError::Conflict(_)));
        assert!(matches!(ApiError::from_status(422, "bad".into()), ApiError::BadRequest(_)));
        assert!(matches!(ApiError::from_status(403, "no".into()), ApiError::Unauthorized(_)));
        assert!(matches!(ApiError::from_status(500, "boom".into()), ApiError::Api(_)));
    }
}
