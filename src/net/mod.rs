//! Network layer for the social REST API
//!
//! # Module Structure
//!
//! - [`auth`] - credentials and the active session
//! - [`client`] - main client tying configuration, gateway and session together
//! - [`http`] - request execution and status classification

pub mod auth;
pub mod client;
pub mod http;

pub use auth::{Credentials, Session, SessionContext};
pub use client::SocialClient;
pub use http::{format_service_error, AuthPolicy, HttpGateway, Response};
