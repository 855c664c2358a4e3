use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Authorization tier stored in the session and returned by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Anything other than `admin` is treated as a regular user.
    pub fn parse_lenient(raw: &str) -> Role {
        if raw.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }
}

impl FromStr for Role {
    type Err = String;

    /// Strict: only `user` and `admin`, in any case.
    fn from_str(raw: &str) -> Result<Role, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role \"{other}\". Use user or admin.")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub user_id: i64,
    pub date: NaiveDate,
    #[serde(default)]
    pub content: String,
}

impl DiaryEntry {
    /// An entry that has not been saved yet.
    pub fn new(user_id: i64, date: NaiveDate, content: String) -> Self {
        DiaryEntry {
            id: None,
            user_id,
            date,
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    pub role: Role,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.is_empty()
        {
            return Err("Name, email, and password are required.".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// `Some(None)` clears the age; it is sent as `null`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl From<&User> for UserUpdate {
    fn from(user: &User) -> Self {
        UserUpdate {
            name: Some(user.name.clone()),
            email: Some(user.email.clone()),
            age: Some(user.age),
            role: Some(user.role),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub detail: Option<Value>,
}

impl LoginResponse {
    pub fn detail_message(&self) -> Option<String> {
        self.detail.as_ref().map(detail_to_string)
    }
}

/// Backend `detail` fields are either a string or a list of validation errors.
pub fn detail_to_string(detail: &Value) -> String {
    match detail {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Joke {
    TwoPart { setup: String, punchline: String },
    Single { joke: String },
    Failed { error: Value },
    Other(Value),
}

impl Joke {
    pub fn display_text(&self) -> String {
        match self {
            Joke::TwoPart { setup, punchline } => format!("{} — {}", setup, punchline),
            Joke::Single { joke } => joke.clone(),
            Joke::Failed { .. } => "Could not fetch a joke right now.".to_string(),
            Joke::Other(raw) => raw.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RagQuery<'a> {
    pub user_id: i64,
    pub question: &'a str,
    pub top_k: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagAnswer {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub contexts: Vec<Value>,
    #[serde(default)]
    pub detail: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_role_falls_back_to_user() {
        assert_eq!(Role::parse_lenient("admin"), Role::Admin);
        assert_eq!(Role::parse_lenient(" Admin "), Role::Admin);
        assert_eq!(Role::parse_lenient("superuser"), Role::User);
        assert_eq!(Role::parse_lenient(""), Role::User);
    }

    #[test]
    fn joke_shapes() {
        let two: Joke =
            serde_json::from_value(json!({"setup": "Why?", "punchline": "Because."})).unwrap();
        assert_eq!(two.display_text(), "Why? — Because.");

        let single: Joke =
            serde_json::from_value(json!({"date": "2024-05-01", "joke": "A pun."})).unwrap();
        assert_eq!(single.display_text(), "A pun.");

        let failed: Joke = serde_json::from_value(json!({"error": "offline"})).unwrap();
        assert_eq!(failed.display_text(), "Could not fetch a joke right now.");

        let other: Joke = serde_json::from_value(json!({"weird": 1})).unwrap();
        assert_eq!(other.display_text(), r#"{"weird":1}"#);
    }

    #[test]
    fn new_user_requires_name_email_password() {
        let mut user = NewUser {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: String::new(),
            ..Default::default()
        };
        assert_eq!(
            user.validate().unwrap_err(),
            "Name, email, and password are required."
        );
        user.password = "secret123".into();
        assert!(user.validate().is_ok());
    }

    #[test]
    fn unsaved_entry_omits_id() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let value = serde_json::to_value(DiaryEntry::new(7, date, "hi".into())).unwrap();
        assert_eq!(
            value,
            json!({"user_id": 7, "date": "2024-03-09", "content": "hi"})
        );
    }

    #[test]
    fn chat_roles_serialize_lowercase() {
        let value = serde_json::to_value(ChatMessage::assistant("hey")).unwrap();
        assert_eq!(value, json!({"role": "assistant", "content": "hey"}));
    }

    #[test]
    fn role_parsing_is_strict() {
        assert_eq!(" Admin ".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("admn".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
        assert_eq!(Role::parse_lenient("admn"), Role::User);
    }
}
