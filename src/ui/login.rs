use super::input::{Field, Form};
use super::{Action, UI};
use crate::api::ApiClient;
use crate::guard::Route;
use crate::session::{KeyValueStore, SessionStore};
use color_eyre::Result;

const EMAIL: usize = 0;
const PASSWORD: usize = 1;

impl UI {
    pub async fn login<S: KeyValueStore>(
        &mut self,
        client: &mut ApiClient,
        session: &mut SessionStore<S>,
    ) -> Result<Action> {
        let mut form = Form::new(vec![Field::new("Email", ""), Field::masked("Password")]);
        let mut status: Option<String> = None;

        loop {
            if !self.edit_form("HeyBuddy - Sign in", &mut form, status.as_deref())? {
                return Ok(Action::Quit);
            }

            let email = form.value(EMAIL).trim().to_string();
            let password = form.value(PASSWORD).to_string();
            if email.is_empty() || password.is_empty() {
                status = Some("Please fill in all fields".to_string());
                continue;
            }

            self.show_busy("Sign in", "Signing in...")?;
            let response = match client.login(&email, &password).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "login request failed");
                    status = Some("Invalid email or password".to_string());
                    continue;
                }
            };

            match session.record_login(&response)? {
                Some(role) => {
                    client.set_token(session.token());
                    tracing::info!(%email, %role, "logged in");
                    return Ok(Action::Navigate(Route::landing(role)));
                }
                None => {
                    status = Some(
                        response
                            .detail_message()
                            .unwrap_or_else(|| "Login failed".to_string()),
                    );
                    form.fields[PASSWORD].value.clear();
                    form.focus = PASSWORD;
                }
            }
        }
    }
}
