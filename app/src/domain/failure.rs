//! Classification of unexpected failures into fallback views.
//!
//! Rendering failures are caught either at the top level or around one
//! section of a screen. Section failures are sorted by message into access,
//! network, or generic problems so the fallback can offer the right escape.
//! Every fallback offers a reload or a way home.

use super::{Error, ErrorCode};

const ACCESS_MARKERS: &[&str] = &[
    "access denied",
    "permission denied",
    "not authorized",
    "not authorised",
    "unauthorized",
    "forbidden",
    "row-level security",
    "jwt",
];

const NETWORK_MARKERS: &[&str] = &[
    "network",
    "failed to fetch",
    "fetch failed",
    "timed out",
    "timeout",
    "connection",
    "offline",
];

/// Broad category of a failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The user lacks rights or the session expired.
    AccessDenied,
    /// The backend could not be reached.
    Network,
    /// Anything else.
    Generic,
}

impl FailureKind {
    /// Classify a raw failure message by case-insensitive substring.
    ///
    /// Access markers win over network markers.
    ///
    /// # Examples
    /// ```
    /// use wild_robot::domain::FailureKind;
    ///
    /// assert_eq!(FailureKind::classify("TypeError: Failed to fetch"), FailureKind::Network);
    /// assert_eq!(FailureKind::classify("JWT expired"), FailureKind::AccessDenied);
    /// assert_eq!(FailureKind::classify("undefined is not a function"), FailureKind::Generic);
    /// ```
    pub fn classify(message: &str) -> Self {
        let lowered = message.to_lowercase();
        let contains_any = |markers: &[&str]| markers.iter().any(|marker| lowered.contains(marker));
        if contains_any(ACCESS_MARKERS) {
            Self::AccessDenied
        } else if contains_any(NETWORK_MARKERS) {
            Self::Network
        } else {
            Self::Generic
        }
    }

    /// Classify a domain error, trusting its code before its message.
    pub fn from_error(error: &Error) -> Self {
        match error.code() {
            ErrorCode::Unauthorized | ErrorCode::Forbidden => Self::AccessDenied,
            ErrorCode::ServiceUnavailable => Self::Network,
            _ => Self::classify(error.message()),
        }
    }
}

/// Escape hatch offered by a fallback view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackAction {
    /// Re-run the failed section in place.
    Retry,
    /// Reload the whole application.
    Reload,
    /// Navigate to the user's home zone.
    GoHome,
}

/// Content of a fallback card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackView {
    kind: FailureKind,
    title: &'static str,
    body: &'static str,
    actions: &'static [FallbackAction],
}

impl FallbackView {
    /// Fallback for a failure that took down the whole application.
    pub fn top_level() -> Self {
        Self {
            kind: FailureKind::Generic,
            title: "Something went wrong",
            body: "The app hit an unexpected problem. Reload to try again.",
            actions: &[FallbackAction::Reload, FallbackAction::GoHome],
        }
    }

    /// Fallback for a failure confined to one section.
    pub fn section(kind: FailureKind) -> Self {
        match kind {
            FailureKind::AccessDenied => Self {
                kind,
                title: "Access denied",
                body: "You do not have permission to view this section.",
                actions: &[FallbackAction::GoHome],
            },
            FailureKind::Network => Self {
                kind,
                title: "Connection problem",
                body: "We could not reach the server. Check your connection and retry.",
                actions: &[FallbackAction::Retry, FallbackAction::Reload],
            },
            FailureKind::Generic => Self {
                kind,
                title: "This section failed to load",
                body: "Retry, or head back to your dashboard.",
                actions: &[FallbackAction::Retry, FallbackAction::GoHome],
            },
        }
    }

    /// Section fallback chosen from a raw failure message.
    pub fn for_message(message: &str) -> Self {
        Self::section(FailureKind::classify(message))
    }

    /// Failure category shown.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Card heading.
    pub fn title(&self) -> &'static str {
        self.title
    }

    /// Card text.
    pub fn body(&self) -> &'static str {
        self.body
    }

    /// Offered actions, primary first.
    pub fn actions(&self) -> &'static [FallbackAction] {
        self.actions
    }
}
