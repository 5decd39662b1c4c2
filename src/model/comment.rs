//! Comment record

use chrono::{DateTime, Utc};

use super::{Activity, FieldStore, Identity, Record};
use crate::error::{Error, Result};

record_fields! {
    /// JSON fields of a comment
    pub enum CommentField {
        Id => ("id", Text),
        IdentityId => ("identityId", Text),
        Activity => ("activity", Record),
        Text => ("text", Text),
        PostedTime => ("postedTime", Integer),
        CreatedAt => ("createdAt", Text),
        PosterIdentity => ("posterIdentity", Record),
        ActivityId => ("activityId", Text),
    }
}

/// A comment posted on an activity
#[derive(Debug, Clone, Default)]
pub struct Comment {
    fields: FieldStore<CommentField>,
}

impl_record!(Comment, CommentField, "comment");

impl Comment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Comment carrying only its text, ready to be posted
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut comment = Self::new();
        comment.set_text(text);
        comment
    }

    pub fn id(&self) -> Result<Option<String>> {
        self.fields.get_as_string(CommentField::Id)
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.fields.set(CommentField::Id, id.into());
    }

    pub fn identity_id(&self) -> Result<Option<String>> {
        self.fields.get_as_string(CommentField::IdentityId)
    }

    pub fn set_identity_id(&mut self, identity_id: impl Into<String>) {
        self.fields.set(CommentField::IdentityId, identity_id.into());
    }

    /// The commented activity, when the payload embeds it
    pub fn activity(&mut self) -> Result<Option<&Activity>> {
        self.fields.nested_opt(CommentField::Activity)
    }

    pub fn set_activity(&mut self, activity: Activity) {
        self.fields.set_record(CommentField::Activity, activity);
    }

    /// Id of the commented activity
    ///
    /// Falls back to the embedded activity when `activityId` is not set.
    pub fn activity_id(&mut self) -> Result<Option<String>> {
        if let Some(id) = self.fields.get_as_string(CommentField::ActivityId)? {
            return Ok(Some(id));
        }
        match self.activity()? {
            Some(activity) => activity.id(),
            None => Ok(None),
        }
    }

    pub fn set_activity_id(&mut self, activity_id: impl Into<String>) {
        self.fields.set(CommentField::ActivityId, activity_id.into());
    }

    pub fn text(&self) -> Result<Option<String>> {
        self.fields.get_as_string(CommentField::Text)
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.fields.set(CommentField::Text, text.into());
    }

    pub fn posted_time(&self) -> Result<Option<i64>> {
        self.fields.get_as_i64(CommentField::PostedTime)
    }

    pub fn set_posted_time(&mut self, posted_time: i64) {
        self.fields.set(CommentField::PostedTime, posted_time);
    }

    pub fn posted_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.posted_time()?.and_then(DateTime::from_timestamp_millis))
    }

    pub fn created_at(&self) -> Result<Option<String>> {
        self.fields.get_as_string(CommentField::CreatedAt)
    }

    pub fn set_created_at(&mut self, created_at: impl Into<String>) {
        self.fields.set(CommentField::CreatedAt, created_at.into());
    }

    /// Identity that wrote the comment; empty when not embedded
    pub fn poster_identity(&mut self) -> Result<&Identity> {
        self.fields.nested(CommentField::PosterIdentity)
    }

    pub fn set_poster_identity(&mut self, identity: Identity) {
        self.fields.set_record(CommentField::PosterIdentity, identity);
    }

    pub(crate) fn require_id(&self) -> Result<String> {
        self.id()?
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::missing_field(Self::NAME, "id"))
    }
}
