use super::ApiClient;
use crate::error::Result;
use crate::models::LoginResponse;
use reqwest::Method;
use serde_json::json;

impl ApiClient {
    /// `POST /users/login`. Rejected credentials come back as a response with
    /// a `detail` and no token rather than as an error, so the login page can
    /// show the backend's message.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let response = self
            .request(Method::POST, "/users/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::serve;
    use crate::api::ApiClient;
    use crate::models::Role;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["password"] == "correct-horse" {
            (
                StatusCode::OK,
                Json(json!({
                    "access_token": "jwt",
                    "refresh_token": "refresh",
                    "user": {"id": 5, "name": "Noor", "email": body["email"], "age": null, "role": "admin"}
                })),
            )
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Invalid credentials"})),
            )
        }
    }

    #[tokio::test]
    async fn login_success_and_rejection() {
        let base = serve(Router::new().route("/users/login", post(login))).await;
        let client = ApiClient::new(base);

        let ok = client.login("noor@example.com", "correct-horse").await.unwrap();
        assert_eq!(ok.access_token.as_deref(), Some("jwt"));
        assert_eq!(ok.user.unwrap().role, Role::Admin);

        let rejected = client.login("noor@example.com", "wrong").await.unwrap();
        assert!(rejected.access_token.is_none());
        assert_eq!(rejected.detail_message().as_deref(), Some("Invalid credentials"));
    }
}
