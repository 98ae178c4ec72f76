//! Codec error type
//!
//! Incomplete rules are never errors: the encoder drops them. Everything in
//! here points at a corrupt FieldMap or a query produced by something else.

use thiserror::Error;

use crate::field::FieldKind;

/// Fatal codec failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Rule subtype is not valid for its field kind
    #[error("unexpected subtype {sub_type} for {kind} field '{field}'")]
    UnexpectedSubType {
        field: String,
        kind: FieldKind,
        sub_type: String,
    },

    /// Rule names a field the FieldMap does not describe
    #[error("unexpected type: field '{0}' is not in the field map")]
    UnknownField(String),

    /// `not` wraps a clause whose negation has no filter-tree form
    #[error("unsupported negation of '{clause}' clause")]
    UnsupportedNegation { clause: String },
}

impl CodecError {
    pub fn unexpected_sub_type(field: &str, kind: FieldKind, sub_type: impl Into<String>) -> Self {
        Self::UnexpectedSubType {
            field: field.to_string(),
            kind,
            sub_type: sub_type.into(),
        }
    }

    pub fn unsupported_negation(clause: impl Into<String>) -> Self {
        Self::UnsupportedNegation {
            clause: clause.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
