//! API errors - the error body returned by the upstream service

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by REST calls and gateway `Error` frames.
///
/// Bodies are internally tagged by `type`; discriminators this client does not
/// know decode as [`ApiError::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ApiError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Not found")]
    NotFound,

    #[error("Unknown user")]
    UnknownUser,

    #[error("Unknown server")]
    UnknownServer,

    #[error("Unknown channel")]
    UnknownChannel,

    #[error("Unknown message")]
    UnknownMessage,

    #[error("Not a member of this server")]
    NotAMember,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation failed: {error}")]
    FailedValidation { error: String },

    #[error("Too many attachments: max {max}")]
    TooManyAttachments { max: usize },

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Empty message")]
    EmptyMessage,

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Missing permission: {permission}")]
    MissingPermission { permission: String },

    #[error("Missing user permission: {permission}")]
    MissingUserPermission { permission: String },

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid session")]
    InvalidSession,

    #[error("Bots cannot perform this action")]
    IsBot,

    #[error("Only bots can perform this action")]
    IsNotBot,

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Already in this server")]
    AlreadyInServer,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Already onboarded")]
    AlreadyOnboarded,

    // =========================================================================
    // Server-side Errors
    // =========================================================================
    #[error("Database error during {operation}")]
    DatabaseError {
        operation: String,
        #[serde(default)]
        collection: String,
    },

    #[error("Internal error")]
    InternalError,

    /// Discriminator not known to this client
    #[error("Unrecognised API error")]
    #[serde(other)]
    Unknown,
}

impl ApiError {
    /// Get the wire discriminator of this error
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::NotFound => "NotFound",
            Self::UnknownUser => "UnknownUser",
            Self::UnknownServer => "UnknownServer",
            Self::UnknownChannel => "UnknownChannel",
            Self::UnknownMessage => "UnknownMessage",
            Self::NotAMember => "NotAMember",

            // Validation
            Self::FailedValidation { .. } => "FailedValidation",
            Self::TooManyAttachments { .. } => "TooManyAttachments",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::EmptyMessage => "EmptyMessage",

            // Authorization
            Self::MissingPermission { .. } => "MissingPermission",
            Self::MissingUserPermission { .. } => "MissingUserPermission",
            Self::Forbidden => "Forbidden",
            Self::InvalidCredentials => "InvalidCredentials",
            Self::InvalidSession => "InvalidSession",
            Self::IsBot => "IsBot",
            Self::IsNotBot => "IsNotBot",

            // Conflict
            Self::AlreadyInServer => "AlreadyInServer",
            Self::UsernameTaken => "UsernameTaken",
            Self::AlreadyOnboarded => "AlreadyOnboarded",

            // Server-side
            Self::DatabaseError { .. } => "DatabaseError",
            Self::InternalError => "InternalError",
            Self::Unknown => "Unknown",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound
                | Self::UnknownUser
                | Self::UnknownServer
                | Self::UnknownChannel
                | Self::UnknownMessage
                | Self::NotAMember
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::FailedValidation { .. }
                | Self::TooManyAttachments { .. }
                | Self::PayloadTooLarge
                | Self::EmptyMessage
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::MissingPermission { .. }
                | Self::MissingUserPermission { .. }
                | Self::Forbidden
                | Self::InvalidCredentials
                | Self::InvalidSession
                | Self::IsBot
                | Self::IsNotBot
        )
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInServer | Self::UsernameTaken | Self::AlreadyOnboarded
        )
    }
}
