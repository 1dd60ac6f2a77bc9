//! greenprompt: prompt-compression client.
//!
//! Page-side content injector, popup status panel and local savings history
//! for an external prompt-compression service.

pub mod analytics;
pub mod api;
pub mod cli;
pub mod config;
pub mod host;
pub mod injector;
pub mod popup;
