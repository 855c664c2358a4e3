use super::{json_body, ApiClient};
use crate::error::Result;
use crate::models::Joke;
use reqwest::Method;

impl ApiClient {
    pub async fn random_joke(&self) -> Result<Joke> {
        let response = self.request(Method::GET, "/jokes/random").send().await?;
        json_body(response).await
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::serve;
    use crate::api::ApiClient;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn random_joke_renders_setup_and_punchline() {
        let base = serve(Router::new().route(
            "/jokes/random",
            get(|| async {
                Json::<Value>(json!({"setup": "Why did the tree relax?", "punchline": "It took a leaf."}))
            }),
        ))
        .await;

        let joke = ApiClient::new(base).random_joke().await.unwrap();
        assert_eq!(
            joke.display_text(),
            "Why did the tree relax? — It took a leaf."
        );
    }
}
