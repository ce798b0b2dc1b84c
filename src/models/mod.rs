//! Data models for the Bloggit client.
//!
//! These mirror the JSON the Bloggit backend sends and accepts.

mod comment;
mod grammar;
mod post;
mod upload;
mod user;

pub use comment::*;
pub use grammar::*;
pub use post::*;
pub use upload::*;
pub use user::*;
