//! View models, one per route.
//!
//! Views own their state and talk to the backend through [`AppState`](crate::AppState). Every
//! operation guards its own failures: the user hears about them through a toast and the view stays
//! at its pre-attempt state. Operations that move somewhere else return the [`Route`] to go to.

pub mod blog;
pub mod header;
pub mod home;
pub mod login;
pub mod post_form;
pub mod register;

pub use blog::BlogView;
pub use header::Header;
pub use home::HomeView;
pub use login::LoginForm;
pub use post_form::{FormMode, PostForm};
pub use register::RegisterForm;

use crate::routes::Route;

/// Where to go after an operation, if anywhere.
pub type Navigation = Option<Route>;

/// Raised when a form is submitted with blank fields.
pub const FIELDS_REQUIRED: &str = "All fields are required.";
