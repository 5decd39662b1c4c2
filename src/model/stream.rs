//! Activity stream metadata record

use super::FieldStore;
use crate::error::Result;

record_fields! {
    /// JSON fields of activity stream metadata
    pub enum ActivityStreamField {
        Type => ("type", Text),
        PrettyId => ("prettyId", Text),
        FaviconUrl => ("faviconUrl", Text),
        Title => ("title", Text),
        PermaLink => ("permaLink", Text),
    }
}

/// Describes the stream an activity was posted to (a user or a space)
#[derive(Debug, Clone, Default)]
pub struct ActivityStream {
    fields: FieldStore<ActivityStreamField>,
}

impl_record!(ActivityStream, ActivityStreamField, "activity stream");

impl ActivityStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream type: `user` or `space`
    pub fn stream_type(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityStreamField::Type)
    }

    pub fn set_stream_type(&mut self, stream_type: impl Into<String>) {
        self.fields.set(ActivityStreamField::Type, stream_type.into());
    }

    pub fn pretty_id(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityStreamField::PrettyId)
    }

    pub fn set_pretty_id(&mut self, pretty_id: impl Into<String>) {
        self.fields.set(ActivityStreamField::PrettyId, pretty_id.into());
    }

    pub fn favicon_url(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityStreamField::FaviconUrl)
    }

    pub fn title(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityStreamField::Title)
    }

    pub fn perma_link(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityStreamField::PermaLink)
    }
}
