//! Helper functions shared by templates, the generator and the server
//!
//! Date formatting, URL building for blog routes and small HTML utilities.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
