//! Identity and profile records

use super::{FieldStore, Record};
use crate::error::{Error, Result};

record_fields! {
    /// JSON fields of an identity
    pub enum IdentityField {
        Id => ("id", Text),
        ProviderId => ("providerId", Text),
        RemoteId => ("remoteId", Text),
        Profile => ("profile", Record),
    }
}

record_fields! {
    /// JSON fields of an identity profile
    pub enum ProfileField {
        FullName => ("fullName", Text),
        AvatarUrl => ("avatarUrl", Text),
    }
}

/// A user or space known to the social platform
///
/// `providerId` names the identity provider (`organization` for users,
/// `space` for spaces) and `remoteId` the id within that provider.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    fields: FieldStore<IdentityField>,
}

impl_record!(Identity, IdentityField, "identity");

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Result<Option<String>> {
        self.fields.get_as_string(IdentityField::Id)
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.fields.set(IdentityField::Id, id.into());
    }

    pub fn provider_id(&self) -> Result<Option<String>> {
        self.fields.get_as_string(IdentityField::ProviderId)
    }

    pub fn set_provider_id(&mut self, provider_id: impl Into<String>) {
        self.fields.set(IdentityField::ProviderId, provider_id.into());
    }

    pub fn remote_id(&self) -> Result<Option<String>> {
        self.fields.get_as_string(IdentityField::RemoteId)
    }

    pub fn set_remote_id(&mut self, remote_id: impl Into<String>) {
        self.fields.set(IdentityField::RemoteId, remote_id.into());
    }

    pub fn profile(&mut self) -> Result<&Profile> {
        self.fields.nested(IdentityField::Profile)
    }

    pub fn set_profile(&mut self, profile: Profile) {
        self.fields.set_record(IdentityField::Profile, profile);
    }

    pub(crate) fn require_id(&self) -> Result<String> {
        self.id()?
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::missing_field(Self::NAME, "id"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Profile {
    fields: FieldStore<ProfileField>,
}

impl_record!(Profile, ProfileField, "profile");

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_name(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ProfileField::FullName)
    }

    pub fn set_full_name(&mut self, full_name: impl Into<String>) {
        self.fields.set(ProfileField::FullName, full_name.into());
    }

    pub fn avatar_url(&self) -> Result<Option<String>> {
        self.fields.get_as_string(ProfileField::AvatarUrl)
    }

    pub fn set_avatar_url(&mut self, avatar_url: impl Into<String>) {
        self.fields.set(ProfileField::AvatarUrl, avatar_url.into());
    }
}
