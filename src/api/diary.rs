use super::{json_body, ApiClient};
use crate::error::Result;
use crate::models::DiaryEntry;
use chrono::NaiveDate;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct DiaryDates {
    #[serde(default)]
    dates: Vec<NaiveDate>,
}

impl ApiClient {
    /// Dates for which the user has written an entry.
    pub async fn diary_dates(&self, user_id: i64) -> Result<Vec<NaiveDate>> {
        let response = self
            .request(Method::GET, &format!("/diary/dates/{user_id}"))
            .send()
            .await?;
        let DiaryDates { dates } = json_body(response).await?;
        Ok(dates)
    }

    /// The entry for `date`, or `None` when nothing was written that day.
    pub async fn diary_entry(&self, user_id: i64, date: NaiveDate) -> Result<Option<DiaryEntry>> {
        let response = self
            .request(
                Method::GET,
                &format!("/diary/{user_id}/{}", date.format("%Y-%m-%d")),
            )
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        json_body(response).await.map(Some)
    }

    pub async fn create_entry(&self, user_id: i64, date: NaiveDate, content: &str) -> Result<DiaryEntry> {
        let response = self
            .request(Method::POST, "/diary/")
            .json(&DiaryEntry::new(user_id, date, content.to_string()))
            .send()
            .await?;
        json_body(response).await
    }

    pub async fn update_entry(&self, entry_id: i64, content: &str) -> Result<DiaryEntry> {
        let response = self
            .request(Method::PUT, &format!("/diary/{entry_id}"))
            .json(&json!({ "content": content }))
            .send()
            .await?;
        json_body(response).await
    }

    /// Updates the entry when it already has an id, creates it otherwise.
    pub async fn save_entry(&self, entry: &DiaryEntry) -> Result<DiaryEntry> {
        match entry.id {
            Some(id) => self.update_entry(id, &entry.content).await,
            None => {
                self.create_entry(entry.user_id, entry.date, &entry.content)
                    .await
            }
        }
    }
}
