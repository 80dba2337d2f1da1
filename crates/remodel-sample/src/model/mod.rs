//! Resources served by the demo backend.

mod post;
mod user;

pub use post::Post;
pub use user::User;
