//! Frame classification for the read loop

use crate::protocol::Envelope;

/// What the read loop does with a frame after forwarding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FrameClass {
    Pong,
    Authenticated,
    /// Close without reconnecting
    Fatal(String),
    /// Reconnect
    Error(String),
    Other,
}

pub(crate) fn classify(envelope: &Envelope) -> FrameClass {
    match envelope.kind() {
        "Pong" => FrameClass::Pong,
        "Authenticated" => FrameClass::Authenticated,
        // Sent instead of an error frame when the token is unknown
        "NotFound" => FrameClass::Fatal("invalid credentials".to_string()),
        "InvalidSession" => FrameClass::Fatal("invalid session".to_string()),
        "OnboardingNotFinished" => FrameClass::Fatal("onboarding not finished".to_string()),
        "AlreadyAuthenticated" => FrameClass::Error("already authenticated".to_string()),
        _ => FrameClass::Other,
    }
}
