//! Command handlers, one module per command

pub mod base;
mod raise;
mod schema;
mod show;
mod submit;
mod url;

pub use base::{GlobalOptions, HandlerContext};
pub use raise::handle_raise;
pub use schema::handle_schema;
pub use show::handle_show;
pub use submit::{SubmitArgs, handle_submit};
pub use url::handle_url;
