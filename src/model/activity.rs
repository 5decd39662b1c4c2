//! Activity record

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{ActivityStream, Comment, FieldStore, FieldValue, Identity, Record};
use crate::error::{Error, Result};

record_fields! {
    /// JSON fields of an activity
    pub enum ActivityField {
        Id => ("id", Text),
        Title => ("title", Text),
        Body => ("body", Text),
        TitleId => ("titleId", Text),
        AppId => ("appId", Text),
        Type => ("type", Text),
        PostedTime => ("postedTime", Integer),
        CreatedAt => ("createdAt", Text),
        Priority => ("priority", Double),
        TemplateParams => ("templateParams", Map),
        IdentityId => ("identityId", Text),
        Liked => ("liked", Boolean),
        PosterIdentity => ("posterIdentity", Record),
        Comments => ("comments", Records),
        TotalNumberOfComments => ("totalNumberOfComments", Integer),
        ActivityStream => ("activityStream", Record),
        TotalNumberOfLikes => ("totalNumberOfLikes", Integer),
        LikedByIdentities => ("likedByIdentities", Records),
    }
}

/// An entry of an activity stream
///
/// Nested fields (`posterIdentity`, `comments`, `activityStream`,
/// `likedByIdentities`) are decoded the first time their accessor runs, which
/// is why those accessors take `&mut self`.
#[derive(Debug, Clone, Default)]
pub struct Activity {
    fields: FieldStore<ActivityField>,
}

impl_record!(Activity, ActivityField, "activity");

impl Activity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityField::Id)
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.fields.set(ActivityField::Id, id.into());
    }

    pub fn title(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityField::Title)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.fields.set(ActivityField::Title, title.into());
    }

    pub fn body(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityField::Body)
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.fields.set(ActivityField::Body, body.into());
    }

    pub fn title_id(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityField::TitleId)
    }

    pub fn set_title_id(&mut self, title_id: impl Into<String>) {
        self.fields.set(ActivityField::TitleId, title_id.into());
    }

    pub fn app_id(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityField::AppId)
    }

    pub fn set_app_id(&mut self, app_id: impl Into<String>) {
        self.fields.set(ActivityField::AppId, app_id.into());
    }

    /// Activity type, e.g. `DEFAULT_ACTIVITY` or `exosocial:spaces`
    pub fn activity_type(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityField::Type)
    }

    pub fn set_activity_type(&mut self, activity_type: impl Into<String>) {
        self.fields.set(ActivityField::Type, activity_type.into());
    }

    /// Posting time in milliseconds since the epoch
    pub fn posted_time(&self) -> Result<Option<i64>> {
        self.fields.get_as_i64(ActivityField::PostedTime)
    }

    pub fn set_posted_time(&mut self, posted_time: i64) {
        self.fields.set(ActivityField::PostedTime, posted_time);
    }

    pub fn posted_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.posted_time()?.and_then(DateTime::from_timestamp_millis))
    }

    pub fn created_at(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityField::CreatedAt)
    }

    pub fn priority(&self) -> Result<Option<f64>> {
        self.fields.get_as_f64(ActivityField::Priority)
    }

    pub fn set_priority(&mut self, priority: f64) {
        self.fields.set(ActivityField::Priority, priority);
    }

    pub fn template_params(&self) -> Result<Option<&BTreeMap<String, String>>> {
        self.fields.get_as_map(ActivityField::TemplateParams)
    }

    pub fn set_template_params(&mut self, params: BTreeMap<String, String>) {
        self.fields.set(ActivityField::TemplateParams, params);
    }

    pub fn template_parameter(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .template_params()?
            .and_then(|params| params.get(name))
            .cloned())
    }

    /// Add one template parameter, creating the map if needed
    pub fn add_template_parameter(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let mut params = self.template_params()?.cloned().unwrap_or_default();
        params.insert(name.into(), value.into());
        self.set_template_params(params);
        Ok(())
    }

    /// Id of the identity that posted the activity
    pub fn identity_id(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ActivityField::IdentityId)
    }

    pub fn set_identity_id(&mut self, identity_id: impl Into<String>) {
        self.fields.set(ActivityField::IdentityId, identity_id.into());
    }

    /// Whether the current user likes this activity; absent means no
    pub fn is_liked(&self) -> Result<bool> {
        Ok(self.fields.get_as_bool(ActivityField::Liked)?.unwrap_or(false))
    }

    pub fn set_liked(&mut self, liked: bool) {
        self.fields.set(ActivityField::Liked, liked);
    }

    pub fn poster_identity(&mut self) -> Result<&Identity> {
        self.fields.nested(ActivityField::PosterIdentity)
    }

    pub fn set_poster_identity(&mut self, identity: Identity) {
        self.fields.set_record(ActivityField::PosterIdentity, identity);
    }

    /// Comments embedded in the payload (usually only the latest ones)
    pub fn comments(&mut self) -> Result<&[Comment]> {
        self.fields.nested_list(ActivityField::Comments)
    }

    pub fn set_comments(&mut self, comments: Vec<Comment>) {
        self.fields.set_records(ActivityField::Comments, comments);
    }

    pub fn total_number_of_comments(&self) -> Result<Option<i64>> {
        self.fields.get_as_i64(ActivityField::TotalNumberOfComments)
    }

    pub fn activity_stream(&mut self) -> Result<&ActivityStream> {
        self.fields.nested(ActivityField::ActivityStream)
    }

    pub fn set_activity_stream(&mut self, stream: ActivityStream) {
        self.fields.set_record(ActivityField::ActivityStream, stream);
    }

    pub fn total_number_of_likes(&self) -> Result<Option<i64>> {
        self.fields.get_as_i64(ActivityField::TotalNumberOfLikes)
    }

    pub fn liked_by_identities(&mut self) -> Result<&[Identity]> {
        self.fields.nested_list(ActivityField::LikedByIdentities)
    }

    pub fn set_liked_by_identities(&mut self, identities: Vec<Identity>) {
        self.fields
            .set_records(ActivityField::LikedByIdentities, identities);
    }

    /// Id of the activity, required to address it remotely
    pub(crate) fn require_id(&self) -> Result<String> {
        self.id()?
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::missing_field(Self::NAME, "id"))
    }

    /// Move the raw stream metadata of a freshly fetched copy into this activity
    pub(crate) fn adopt_activity_stream(&mut self, fetched: &mut Activity) {
        let value = fetched
            .fields
            .remove(ActivityField::ActivityStream)
            .unwrap_or(FieldValue::Null);
        self.fields.set(ActivityField::ActivityStream, value);
    }
}
