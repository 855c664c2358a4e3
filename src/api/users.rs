use super::{ensure_success, json_body, ApiClient};
use crate::error::{ClientError, Result};
use crate::models::{NewUser, User, UserUpdate};
use reqwest::Method;

impl ApiClient {
    pub async fn list_users(&self) -> Result<Vec<User>> {
        let response = self.request(Method::GET, "/users/users").send().await?;
        json_body(response).await
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        let response = self
            .request(Method::GET, &format!("/users/users/{id}"))
            .send()
            .await?;
        json_body(response).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User> {
        user.validate().map_err(ClientError::Validation)?;
        let response = self
            .request(Method::POST, "/users/register")
            .json(user)
            .send()
            .await?;
        json_body(response).await
    }

    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User> {
        let response = self
            .request(Method::PUT, &format!("/users/users/{id}"))
            .json(update)
            .send()
            .await?;
        json_body(response).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let response = self
            .request(Method::DELETE, &format!("/users/users/{id}"))
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}
