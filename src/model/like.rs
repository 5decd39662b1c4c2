//! Like record

use super::FieldStore;
use crate::error::Result;

record_fields! {
    pub enum LikeField {
        ActivityId => ("activityId", Text),
        IdentityId => ("identityId", Text),
    }
}

/// A like of an activity by an identity
#[derive(Debug, Clone, Default)]
pub struct Like {
    fields: FieldStore<LikeField>,
}

impl_record!(Like, LikeField, "like");

impl Like {
    pub fn new(activity_id: impl Into<String>, identity_id: Option<String>) -> Self {
        let mut like = Self::default();
        like.fields.set(LikeField::ActivityId, activity_id.into());
        if let Some(identity_id) = identity_id {
            like.fields.set(LikeField::IdentityId, identity_id);
        }
        like
    }

    pub fn activity_id(&self) -> Result<Option<String>> {
        self.fields.get_as_string(LikeField::ActivityId)
    }

    pub fn identity_id(&self) -> Result<Option<String>> {
        self.fields.get_as_string(LikeField::IdentityId)
    }
}
