//! HTTP backend for the Huddle chat core.
//!
//! [`HttpChatApi`] implements [`huddle_core::ChatApi`] over JSON/HTTP with
//! `reqwest`. Every request carries the bearer token of the injected
//! [`huddle_core::SessionStore`]; a 401 reply signs the session out.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod http;

pub use config::{API_URL_ENV, ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use http::HttpChatApi;
