//! Client SDK for the social collaboration REST API
//!
//! Activities, comments, likes and identities are exposed as typed records
//! over a JSON field store. Nested objects are decoded lazily on first access.
//! Activity streams are read through [`PagedListAccess`] windows.
//!
//! # Example
//!
//! ```no_run
//! use social_client::{ClientConfig, CrudService, SocialClient};
//!
//! # async fn example() -> social_client::Result<()> {
//! let client = SocialClient::new(ClientConfig::new("http://localhost:8080"))?;
//! client.start_session_as("demo", "gtn");
//!
//! let mut activity = client.activities().get("a1b2c3").await?;
//! println!("{:?}", activity.title()?);
//!
//! let stream = client.activities().activity_stream(&mut activity).await?;
//! println!("posted in {:?}", stream.pretty_id()?);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod net;
pub mod service;

pub use config::ClientConfig;
pub use error::{CodecError, Error, Result, ServiceError, ServiceErrorKind};
pub use model::{Activity, ActivityStream, Comment, Identity, Like, Profile, Record};
pub use net::{AuthPolicy, Session, SocialClient};
pub use service::{
    ActivityService, CrudService, IdentityService, Operation, PagedListAccess, QueryParams,
    StreamKind, Window,
};
