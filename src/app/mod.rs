//! Navigation shell.
//!
//! Owns the current route, the page shown for it, and the header. Views ask for navigation by
//! returning a [`Route`]; the shell loads the page for it.

use std::sync::Arc;

use tokio::sync::watch;

use crate::api::ApiClient;
use crate::grammar::IssueSet;
use crate::routes::Route;
use crate::views::{
    BlogView, FormMode, Header, HomeView, LoginForm, Navigation, PostForm, RegisterForm,
};
use crate::AppState;

/// Redirect chains longer than this are cut short.
const MAX_REDIRECTS: usize = 4;

pub enum Page {
    Home(HomeView),
    Login(LoginForm),
    Register(RegisterForm),
    Blog(Box<BlogView>),
    Form(Box<PostForm<ApiClient>>),
    NotFound(String),
}

pub struct App {
    state: AppState,
    route: Route,
    page: Page,
    header: Header,
}

impl App {
    /// Start on the home page.
    pub async fn start(state: AppState) -> Self {
        let mut app = Self {
            state,
            route: Route::Home,
            page: Page::Home(HomeView::Landing),
            header: Header::default(),
        };
        app.navigate(Route::Home).await;
        app
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    /// Load the page for `route`, following redirects raised while loading.
    pub async fn navigate(&mut self, route: Route) {
        let mut route = route;
        for _ in 0..MAX_REDIRECTS {
            tracing::debug!(%route, "Navigating");
            self.header = Header::load(&self.state).await;
            match self.load(&route).await {
                Ok(page) => {
                    self.page = page;
                    self.route = route;
                    return;
                }
                Err(redirect) => route = redirect,
            }
        }
        tracing::warn!(%route, "Too many redirects");
        self.page = Page::NotFound(route.path());
        self.route = route;
    }

    /// Follow the navigation an operation asked for, if any.
    pub async fn follow(&mut self, navigation: Navigation) {
        if let Some(route) = navigation {
            self.navigate(route).await;
        }
    }

    async fn load(&self, route: &Route) -> Result<Page, Route> {
        let state = &self.state;
        Ok(match route {
            Route::Home => Page::Home(HomeView::load(state).await),
            Route::Login => Page::Login(LoginForm::default()),
            Route::Register => Page::Register(RegisterForm::default()),
            Route::Post(id) => Page::Blog(Box::new(BlogView::load(state, id).await)),
            Route::Create => Page::Form(Box::new(self.open_form(FormMode::Create).await?)),
            Route::Edit(id) => {
                Page::Form(Box::new(self.open_form(FormMode::Edit(id.clone())).await?))
            }
            Route::NotFound(path) => Page::NotFound(path.clone()),
        })
    }

    async fn open_form(&self, mode: FormMode) -> Result<PostForm<ApiClient>, Route> {
        let checker = Arc::new(self.state.api.clone());
        PostForm::open(&self.state, mode, checker).await
    }

    /// Log out through the header and go where it says.
    pub async fn logout(&mut self) {
        let navigation = self.header.logout(&self.state).await;
        self.follow(navigation).await;
    }

    /// Issue updates of the open editor, if one is open.
    pub fn grammar_updates(&self) -> Option<watch::Receiver<IssueSet>> {
        match &self.page {
            Page::Form(form) => Some(form.grammar_updates()),
            _ => None,
        }
    }
}
