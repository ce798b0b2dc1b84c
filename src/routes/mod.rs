//! Route table.

use std::fmt;

/// Every page the front end can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Post(String),
    Create,
    Edit(String),
    NotFound(String),
}

impl Route {
    /// Resolve a path such as `/blog/42`. Query strings and fragments are ignored.
    pub fn parse(path: &str) -> Self {
        let bare = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let segments: Vec<&str> = bare.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Home,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["create"] => Route::Create,
            ["blog", id] => Route::Post(id.to_string()),
            ["edit", id] => Route::Edit(id.to_string()),
            _ => Route::NotFound(bare.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Post(id) => format!("/blog/{}", id),
            Route::Create => "/create".to_string(),
            Route::Edit(id) => format!("/edit/{}", id),
            Route::NotFound(path) => path.clone(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
