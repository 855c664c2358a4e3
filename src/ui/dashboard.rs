use super::{Action, UI};
use crate::api::ApiClient;
use crate::guard::Route;
use crate::session::Session;
use color_eyre::Result;

const USER_MENU: [&str; 6] = [
    "Chat with HeyBuddy",
    "My diary",
    "Ask my diary",
    "Tell me a joke",
    "Log out",
    "Quit",
];

const ADMIN_MENU: [&str; 3] = ["Manage users", "Log out", "Quit"];

fn welcome(session: &Session) -> String {
    match session.display_name.as_deref() {
        Some(name) if !name.is_empty() => format!("Welcome, {name}"),
        _ => "Welcome".to_string(),
    }
}

impl UI {
    pub async fn user_dashboard(&mut self, client: &ApiClient, session: &Session) -> Result<Action> {
        let heading = format!("HeyBuddy - {}", welcome(session));
        loop {
            let Some(choice) = self.select(&heading, "Menu", &USER_MENU)? else {
                continue;
            };
            return Ok(match choice {
                0 => Action::Navigate(Route::Chat),
                1 => Action::Navigate(Route::Diary),
                2 => Action::Navigate(Route::DiaryChat),
                3 => {
                    let text = match client.random_joke().await {
                        Ok(joke) => joke.display_text(),
                        Err(e) => {
                            tracing::warn!(error = %e, "joke request failed");
                            "Failed to fetch joke.".to_string()
                        }
                    };
                    self.alert("Joke", &text)?;
                    continue;
                }
                4 => Action::Logout,
                _ => Action::Quit,
            });
        }
    }

    pub fn admin_dashboard(&mut self, session: &Session) -> Result<Action> {
        let heading = format!("HeyBuddy Admin - {}", welcome(session));
        loop {
            let Some(choice) = self.select(&heading, "Menu", &ADMIN_MENU)? else {
                continue;
            };
            return Ok(match choice {
                0 => Action::Navigate(Route::UserManagement),
                1 => Action::Logout,
                _ => Action::Quit,
            });
        }
    }
}
