//! Session-aware header menu.

use super::Navigation;
use crate::models::Session;
use crate::routes::Route;
use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Greeting(String),
    Write,
    Logout,
    Login,
    Register,
}

impl MenuItem {
    pub fn label(&self) -> String {
        match self {
            MenuItem::Greeting(name) => format!("Hello, {}", name),
            MenuItem::Write => "Write".to_string(),
            MenuItem::Logout => "Logout".to_string(),
            MenuItem::Login => "Login".to_string(),
            MenuItem::Register => "Register".to_string(),
        }
    }

    /// Link target; `None` for plain text and actions.
    pub fn route(&self) -> Option<Route> {
        match self {
            MenuItem::Write => Some(Route::Create),
            MenuItem::Login => Some(Route::Login),
            MenuItem::Register => Some(Route::Register),
            MenuItem::Greeting(_) | MenuItem::Logout => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Header {
    session: Option<Session>,
    menu_open: bool,
}

impl Header {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            session,
            menu_open: false,
        }
    }

    pub async fn load(state: &AppState) -> Self {
        Self::new(state.session.current().await)
    }

    #[cfg(test)]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn items(&self) -> Vec<MenuItem> {
        match &self.session {
            Some(session) => vec![
                MenuItem::Greeting(session.name.clone()),
                MenuItem::Write,
                MenuItem::Logout,
            ],
            None => vec![MenuItem::Login, MenuItem::Register],
        }
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    /// End the session. A failed logout leaves everything as it was.
    pub async fn logout(&mut self, state: &AppState) -> Navigation {
        match state.session.logout().await {
            Ok(()) => {
                self.session = None;
                self.menu_open = false;
                state.notifier.success("Logged out successfully!");
                Some(Route::Login)
            }
            Err(e) => {
                tracing::warn!("Logout failed: {}", e);
                state.notifier.error("Logout failed.");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_menu_items_follow_session() {
        let header = Header::new(None);
        let labels: Vec<String> = header.items().iter().map(MenuItem::label).collect();
        assert_eq!(labels, vec!["Login", "Register"]);

        let header = Header::new(Some(Session {
            id: "u1".into(),
            name: "Ada".into(),
            role: Role::Author,
        }));
        let items = header.items();
        assert_eq!(items[0].label(), "Hello, Ada");
        assert_eq!(items[1].route(), Some(Route::Create));
        assert_eq!(items[2], MenuItem::Logout);
    }

    #[test]
    fn test_menu_toggle() {
        let mut header = Header::default();
        assert!(!header.is_menu_open());
        header.toggle_menu();
        assert!(header.is_menu_open());
    }
}
