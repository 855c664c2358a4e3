use super::input::{Field, Form};
use super::{instructions, read_key, screen_chunks, title, Action, UI};
use crate::api::ApiClient;
use crate::guard::Route;
use crate::models::{NewUser, Role, User, UserUpdate};
use color_eyre::Result;
use crossterm::event::KeyCode;
use ratatui::{
    layout::Constraint,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

fn parse_age(raw: &str) -> Result<Option<u32>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| "Age must be a whole number.".to_string())
}

fn create_form() -> Form {
    Form::new(vec![
        Field::new("Name", ""),
        Field::new("Email", ""),
        Field::masked("Password"),
        Field::new("Age", ""),
        Field::new("Role (user/admin)", "user"),
    ])
}

fn new_user_from(form: &Form) -> Result<NewUser, String> {
    let user = NewUser {
        name: form.value(0).trim().to_string(),
        email: form.value(1).trim().to_string(),
        password: form.value(2).to_string(),
        age: parse_age(form.value(3))?,
        role: form.value(4).parse()?,
    };
    user.validate()?;
    Ok(user)
}

fn edit_form(user: &User) -> Form {
    Form::new(vec![
        Field::new("Name", user.name.clone()),
        Field::new("Email", user.email.clone()),
        Field::new("Age", user.age.map(|a| a.to_string()).unwrap_or_default()),
        Field::new("Role (user/admin)", user.role.as_str()),
    ])
}

/// Only fields that differ from `user` are sent.
fn update_from(user: &User, form: &Form) -> Result<UserUpdate, String> {
    let name = form.value(0).trim();
    let email = form.value(1).trim();
    if name.is_empty() || email.is_empty() {
        return Err("Name and email are required.".to_string());
    }
    let age = parse_age(form.value(2))?;
    let role: Role = form.value(3).parse()?;

    Ok(UserUpdate {
        name: (name != user.name).then(|| name.to_string()),
        email: (email != user.email).then(|| email.to_string()),
        age: (age != user.age).then_some(age),
        role: (role != user.role).then_some(role),
    })
}

fn user_row(user: &User) -> String {
    let age = user.age.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string());
    format!(
        "#{:<5} {:<20} {:<28} {:<4} {}",
        user.id, user.name, user.email, age, user.role
    )
}

impl UI {
    pub async fn user_management(&mut self, client: &ApiClient) -> Result<Action> {
        let mut users = Vec::new();
        let mut selected = 0;
        let mut status = refresh(client, &mut users).await;

        loop {
            selected = selected.min(users.len().saturating_sub(1));
            self.draw_users(&users, selected, status.as_deref())?;

            match read_key()?.code {
                KeyCode::Esc => return Ok(Action::Navigate(Route::AdminDashboard)),
                KeyCode::Up => selected = selected.saturating_sub(1),
                KeyCode::Down => {
                    if selected + 1 < users.len() {
                        selected += 1;
                    }
                }
                KeyCode::Char('r') => status = refresh(client, &mut users).await,
                KeyCode::Char('n') => {
                    let mut form = create_form();
                    let mut error: Option<String> = None;
                    while self.edit_form("New user", &mut form, error.as_deref())? {
                        let new_user = match new_user_from(&form) {
                            Ok(new_user) => new_user,
                            Err(message) => {
                                error = Some(message);
                                continue;
                            }
                        };
                        match client.create_user(&new_user).await {
                            Ok(created) => {
                                tracing::info!(id = created.id, "user created");
                                status = refresh(client, &mut users).await;
                                status.get_or_insert_with(|| format!("Created {}", created.email));
                                break;
                            }
                            Err(e) => error = Some(e.user_message()),
                        }
                    }
                }
                KeyCode::Enter | KeyCode::Char('e') => {
                    let Some(user) = users.get(selected).cloned() else {
                        continue;
                    };
                    let mut form = edit_form(&user);
                    let mut error: Option<String> = None;
                    while self.edit_form("Edit user", &mut form, error.as_deref())? {
                        let update = match update_from(&user, &form) {
                            Ok(update) => update,
                            Err(message) => {
                                error = Some(message);
                                continue;
                            }
                        };
                        if update == UserUpdate::default() {
                            break;
                        }
                        match client.update_user(user.id, &update).await {
                            Ok(_) => {
                                tracing::info!(id = user.id, "user updated");
                                status = refresh(client, &mut users).await;
                                break;
                            }
                            Err(e) => error = Some(e.user_message()),
                        }
                    }
                }
                KeyCode::Char('d') => {
                    let Some(user) = users.get(selected).cloned() else {
                        continue;
                    };
                    if !self.confirm("Delete this user?")? {
                        continue;
                    }
                    match client.delete_user(user.id).await {
                        Ok(()) => {
                            tracing::info!(id = user.id, "user deleted");
                            status = refresh(client, &mut users).await;
                        }
                        Err(e) => {
                            tracing::error!(error = %e, id = user.id, "deleting user failed");
                            status = Some(e.user_message());
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn draw_users(&mut self, users: &[User], selected: usize, status: Option<&str>) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = screen_chunks(f.area(), Constraint::Min(5));
            f.render_widget(title("User Management"), chunks[0]);

            let items: Vec<ListItem> = users
                .iter()
                .map(|user| ListItem::new(Line::from(Span::raw(user_row(user)))))
                .collect();
            let list = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!("Users ({})", users.len())),
                )
                .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                .highlight_symbol("> ");
            let mut state = ListState::default().with_selected((!users.is_empty()).then_some(selected));
            f.render_stateful_widget(list, chunks[1], &mut state);

            let footer = match status {
                Some(status) => instructions(status).style(Style::default().fg(Color::Red)),
                None => instructions(
                    "Up/Down: Navigate, n: New, Enter/e: Edit, d: Delete, r: Refresh, Esc: Back",
                ),
            };
            f.render_widget(footer, chunks[2]);
        })?;
        Ok(())
    }
}

/// Reloads `users`; returns the message to show when that fails.
async fn refresh(client: &ApiClient, users: &mut Vec<User>) -> Option<String> {
    match client.list_users().await {
        Ok(list) => {
            *users = list;
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "loading users failed");
            Some(e.user_message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: 7,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            age: Some(31),
            role: Role::User,
        }
    }

    #[test]
    fn new_user_requires_core_fields() {
        let mut form = create_form();
        form.fields[0].value = "Ana".into();
        form.fields[1].value = "ana@example.com".into();
        assert_eq!(
            new_user_from(&form).unwrap_err(),
            "Name, email, and password are required."
        );

        form.fields[2].value = "secret".into();
        form.fields[3].value = "x".into();
        assert!(new_user_from(&form).unwrap_err().contains("Age"));

        form.fields[3].value = " 31 ".into();
        form.fields[4].value = "admn".into();
        assert!(new_user_from(&form).unwrap_err().contains("admn"));

        form.fields[4].value = "Admin".into();
        let created = new_user_from(&form).unwrap();
        assert_eq!(created.age, Some(31));
        assert_eq!(created.role, Role::Admin);
    }

    #[test]
    fn update_sends_only_changes() {
        let user = user();
        let mut form = edit_form(&user);
        assert_eq!(update_from(&user, &form).unwrap(), UserUpdate::default());

        form.fields[1].value = "ana@new.io".into();
        form.fields[3].value = "admin".into();
        let update = update_from(&user, &form).unwrap();
        assert_eq!(update.email.as_deref(), Some("ana@new.io"));
        assert_eq!(update.role, Some(Role::Admin));
        assert_eq!(update.name, None);
        assert_eq!(update.age, None);

        form.fields[2].value.clear();
        assert_eq!(update_from(&user, &form).unwrap().age, Some(None));
        form.fields[2].value = "32".into();
        assert_eq!(update_from(&user, &form).unwrap().age, Some(Some(32)));

        let mut admin = user.clone();
        admin.role = Role::Admin;
        let mut form = edit_form(&admin);
        form.fields[3].value = "admn".into();
        assert!(update_from(&admin, &form).unwrap_err().contains("Use user or admin"));

        form.fields[3].value = "ADMIN".into();
        assert_eq!(update_from(&admin, &form).unwrap(), UserUpdate::default());

        form.fields[0].value.clear();
        assert!(update_from(&admin, &form).is_err());
    }
}
