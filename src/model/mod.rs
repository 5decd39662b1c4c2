//! Field-backed record model
//!
//! Every resource (activity, comment, identity, like, ...) is a thin typed
//! view over a [`FieldStore`] keyed by a per-resource field enum. The field
//! enum is the wire contract: its JSON names must not change without a
//! protocol version bump.
//!
//! # Module Structure
//!
//! - [`field_store`] - dynamically-typed value storage with typed reads
//! - [`activity`], [`comment`], [`identity`], [`like`], [`stream`] - record variants

use std::fmt;

/// Declare a record's field enumeration together with its JSON names and kinds.
macro_rules! record_fields {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => ($key:literal, $kind:ident)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::model::FieldName for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $key),+
                }
            }

            fn kind(self) -> $crate::model::FieldKind {
                match self {
                    $(Self::$variant => $crate::model::FieldKind::$kind),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::model::FieldName::as_str(*self))
            }
        }
    };
}

/// Implement [`Record`] for a struct wrapping a single `fields` store.
macro_rules! impl_record {
    ($record:ident, $field:ident, $name:literal) => {
        impl $crate::model::Record for $record {
            type Field = $field;
            const NAME: &'static str = $name;

            fn fields(&self) -> &$crate::model::FieldStore<$field> {
                &self.fields
            }

            fn fields_mut(&mut self) -> &mut $crate::model::FieldStore<$field> {
                &mut self.fields
            }

            fn from_fields(fields: $crate::model::FieldStore<$field>) -> Self {
                Self { fields }
            }
        }
    };
}

pub mod field_store;

pub mod activity;
pub mod comment;
pub mod identity;
pub mod like;
pub mod stream;

pub use activity::{Activity, ActivityField};
pub use comment::{Comment, CommentField};
pub use field_store::{FieldStore, FieldValue};
pub use identity::{Identity, IdentityField, Profile, ProfileField};
pub use like::{Like, LikeField};
pub use stream::{ActivityStream, ActivityStreamField};

/// Declared value kind of a field
///
/// Drives decoding: scalar kinds are parsed eagerly, `Record` and `Records`
/// are kept as raw JSON until their accessor is first called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Double,
    Boolean,
    Map,
    Record,
    Records,
}

impl FieldKind {
    /// Whether values of this kind are decoded lazily
    pub fn is_nested(self) -> bool {
        matches!(self, FieldKind::Record | FieldKind::Records)
    }
}

/// Compile-time enumerated set of field names for one record variant
pub trait FieldName: Copy + Ord + fmt::Debug + Send + Sync + 'static {
    /// Every field of the variant
    const ALL: &'static [Self];

    /// JSON key on the wire
    fn as_str(self) -> &'static str;

    fn kind(self) -> FieldKind;

    /// Look up a field by its JSON key
    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == key)
    }
}

/// A resource record: a typed view over a [`FieldStore`]
///
/// This is the decode dispatch point: the codec is asked for a concrete
/// `R: Record` by the caller, never by inspecting the payload.
pub trait Record: Default + Clone + fmt::Debug + Send + Sync + 'static {
    type Field: FieldName;

    /// Resource name used in diagnostics
    const NAME: &'static str;

    fn fields(&self) -> &FieldStore<Self::Field>;

    fn fields_mut(&mut self) -> &mut FieldStore<Self::Field>;

    fn from_fields(fields: FieldStore<Self::Field>) -> Self;

    /// True when no field has been set
    fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}
