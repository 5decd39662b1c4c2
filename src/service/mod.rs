//! Resource services
//!
//! Each service turns one operation into a fixed sequence: build the URL,
//! execute it through the gateway, decode the body. Operations the remote
//! API does not offer for a resource are declared in [`CrudService::SUPPORTED`]
//! and fail with [`Error::UnsupportedOperation`] without touching the network.
//!
//! # Module Structure
//!
//! - [`activity`] - activities, comments and likes
//! - [`identity`] - identity lookup
//! - [`list_access`] - windowed access to activity streams

pub mod activity;
pub mod identity;
pub mod list_access;

pub use activity::ActivityService;
pub use identity::IdentityService;
pub use list_access::{PagedListAccess, StreamKind, Window};

use std::collections::BTreeMap;
use std::fmt;

use crate::codec;
use crate::error::{Error, Result, ServiceError};
use crate::model::Record;

/// An action a service may or may not offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Get,
    Update,
    Delete,
    CreateComment,
    GetComment,
    DeleteComment,
    Like,
    Unlike,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Get => "get",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::CreateComment => "create comment",
            Operation::GetComment => "get comment",
            Operation::DeleteComment => "delete comment",
            Operation::Like => "like",
            Operation::Unlike => "unlike",
        };
        f.write_str(name)
    }
}

/// Create/read/update/delete over one record type
///
/// Every default body refuses the call; services override exactly the
/// operations they list in `SUPPORTED`.
#[allow(async_fn_in_trait)]
pub trait CrudService<R: Record> {
    /// Resource name used in errors
    const RESOURCE: &'static str;

    /// Capability matrix for this resource
    const SUPPORTED: &'static [Operation];

    fn supports(operation: Operation) -> bool {
        Self::SUPPORTED.contains(&operation)
    }

    async fn create(&self, _record: &R) -> Result<R> {
        Err(Error::unsupported(Self::RESOURCE, Operation::Create))
    }

    async fn get(&self, _id: &str) -> Result<R> {
        Err(Error::unsupported(Self::RESOURCE, Operation::Get))
    }

    async fn update(&self, _record: &R) -> Result<R> {
        Err(Error::unsupported(Self::RESOURCE, Operation::Update))
    }

    /// Delete the record, returning the server's copy of it
    async fn delete(&self, _record: &R) -> Result<R> {
        Err(Error::unsupported(Self::RESOURCE, Operation::Delete))
    }
}

/// Extra query parameters for a request, kept in key order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: BTreeMap<String, String>,
}

impl QueryParams {
    /// Ask for activity stream metadata to be embedded in an activity
    pub const ACTIVITY_STREAM: &'static str = "activityStream";
    /// Ask for the poster identity to be embedded
    pub const POSTER_IDENTITY: &'static str = "poster_identity";
    /// Number of comments to embed
    pub const NUMBER_OF_COMMENTS: &'static str = "number_of_comments";
    /// Number of likes to embed
    pub const NUMBER_OF_LIKES: &'static str = "number_of_likes";

    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a parameter
    pub fn append(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a boolean flag in the server's `t`/`f` notation
    pub fn flag(self, key: impl Into<String>, enabled: bool) -> Self {
        self.append(key, if enabled { "t" } else { "f" })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Decode one record from a response body, attributing failures to `service`
pub(crate) fn decode_one<R: Record>(service: &'static str, body: &str) -> Result<R> {
    codec::decode_one(body).map_err(|e| ServiceError::parse(service, e).into())
}

pub(crate) fn decode_many<R: Record>(service: &'static str, body: &str) -> Result<Vec<R>> {
    codec::decode_many(body).map_err(|e| ServiceError::parse(service, e).into())
}

pub(crate) fn encode<R: Record>(service: &'static str, record: &R) -> Result<String> {
    codec::encode(record).map_err(|e| ServiceError::parse(service, e).into())
}
