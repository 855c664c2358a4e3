use clap::Parser;
use color_eyre::Result;
use heybuddy::api::ApiClient;
use heybuddy::config::ClientConfig;
use heybuddy::guard::{Route, RouteGuard};
use heybuddy::session::{FileStore, SessionStore};
use heybuddy::telemetry;
use heybuddy::ui::{Action, UI};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = ClientConfig::parse();
    if let Some(log_file) = &config.log_file {
        telemetry::init_file(log_file, "info")?;
    }

    let mut session = SessionStore::new(FileStore::open(config.session_path())?);
    let mut client = ApiClient::new(&config.api_url).with_token(session.token());
    let guard = RouteGuard;
    tracing::info!(api_url = %config.api_url, "starting HeyBuddy client");

    let mut ui = UI::new()?;
    let mut route = match config.route.as_deref() {
        Some(path) => Route::from_path(path),
        None => session.role().map(Route::landing).unwrap_or(Route::Login),
    };

    loop {
        let snapshot = session.snapshot();
        let target = guard.resolve(route, &snapshot);
        if target != route {
            tracing::debug!(from = route.path(), to = target.path(), "redirected");
        }

        let action = match target {
            Route::Login => ui.login(&mut client, &mut session).await?,
            Route::UserDashboard => ui.user_dashboard(&client, &snapshot).await?,
            Route::Chat => ui.chat(&client).await?,
            Route::Diary => ui.diary(&client, &snapshot).await?,
            Route::DiaryChat => ui.diary_chat(&client, &snapshot).await?,
            Route::AdminDashboard => ui.admin_dashboard(&snapshot)?,
            Route::UserManagement => ui.user_management(&client).await?,
        };

        match action {
            Action::Navigate(next) => route = next,
            Action::Logout => {
                session.logout()?;
                client.set_token(None);
                route = Route::Login;
            }
            Action::Quit => break,
        }
    }

    Ok(())
}
