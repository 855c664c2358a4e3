//! Client-side routing and the guard every navigation passes through.
//!
//! The guard is cosmetic: the backend remains the authorization boundary.

use crate::models::Role;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    UserDashboard,
    Chat,
    Diary,
    DiaryChat,
    AdminDashboard,
    UserManagement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Role(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Enter(Route),
    Redirect(Route),
}

impl Navigation {
    pub fn route(&self) -> Route {
        match self {
            Navigation::Enter(route) | Navigation::Redirect(route) => *route,
        }
    }
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Login,
        Route::UserDashboard,
        Route::Chat,
        Route::Diary,
        Route::DiaryChat,
        Route::AdminDashboard,
        Route::UserManagement,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::UserDashboard => "user-dashboard",
            Route::Chat => "user-dashboard/chat",
            Route::Diary => "user-dashboard/diary",
            Route::DiaryChat => "user-dashboard/diary-chat",
            Route::AdminDashboard => "admin-dashboard",
            Route::UserManagement => "admin-dashboard/users",
        }
    }

    /// Empty and unknown paths land on the login page.
    pub fn from_path(path: &str) -> Route {
        let path = path.trim_matches('/');
        Route::ALL
            .into_iter()
            .find(|route| route.path() == path)
            .unwrap_or(Route::Login)
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Login => Access::Public,
            Route::UserDashboard | Route::Chat | Route::Diary | Route::DiaryChat => {
                Access::Authenticated
            }
            Route::AdminDashboard | Route::UserManagement => Access::Role(Role::Admin),
        }
    }

    /// Where a signed-in user with `role` starts.
    pub fn landing(role: Role) -> Route {
        match role {
            Role::Admin => Route::AdminDashboard,
            Role::User => Route::UserDashboard,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn check(&self, route: Route, session: &Session) -> Navigation {
        match route.access() {
            Access::Public => Navigation::Enter(route),
            Access::Authenticated if session.is_authenticated() => Navigation::Enter(route),
            Access::Authenticated => Navigation::Redirect(Route::Login),
            Access::Role(required) => match session.role() {
                None => Navigation::Redirect(Route::Login),
                Some(role) if role == required => Navigation::Enter(route),
                Some(role) => {
                    tracing::debug!(route = route.path(), %role, "role mismatch");
                    Navigation::Redirect(Route::landing(role))
                }
            },
        }
    }

    /// Follows redirects until a route can be entered.
    pub fn resolve(&self, route: Route, session: &Session) -> Route {
        let mut current = route;
        for _ in 0..Route::ALL.len() {
            match self.check(current, session) {
                Navigation::Enter(route) => return route,
                Navigation::Redirect(next) => current = next,
            }
        }
        Route::Login
    }
}
