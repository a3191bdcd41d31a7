//! Voice command interpretation
//!
//! Keyword containment in a fixed priority order. Deliberately crude: it
//! tolerates sloppy transcripts ("please start navigation now") at the
//! cost of odd matches ("restart" triggers navigation). The precedence
//! order is part of the interface and must not change.

use crate::router::Route;

/// Actions a recognized voice command can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceAction {
    StartNavigation,
    WhereAmI,
    SavedRoutes,
    Settings,
    GoBack,
}

impl VoiceAction {
    /// Name used in spoken confirmations ("Opening {name}")
    #[must_use]
    pub const fn spoken_name(self) -> &'static str {
        match self {
            Self::StartNavigation => "navigation",
            Self::WhereAmI => "your current location",
            Self::SavedRoutes => "saved routes",
            Self::Settings => "settings",
            Self::GoBack => "previous screen",
        }
    }

    /// Screen this action dispatches to, if any
    #[must_use]
    pub const fn route(self) -> Option<Route> {
        match self {
            Self::StartNavigation => Some(Route::Navigation),
            Self::WhereAmI => Some(Route::Location),
            Self::SavedRoutes => Some(Route::SavedRoutes),
            Self::Settings => Some(Route::Settings),
            Self::GoBack => None,
        }
    }
}

/// Keyword precedence: first containment match wins
const KEYWORD_ACTIONS: [(&str, VoiceAction); 5] = [
    ("start", VoiceAction::StartNavigation),
    ("where", VoiceAction::WhereAmI),
    ("saved", VoiceAction::SavedRoutes),
    ("setting", VoiceAction::Settings),
    ("back", VoiceAction::GoBack),
];

/// Map a transcript to an action by case-insensitive substring match
///
/// Never fails: unrecognized text is `None`, and the caller treats it as
/// "no command".
#[must_use]
pub fn parse_voice_command(text: &str) -> Option<VoiceAction> {
    let lowered = text.to_lowercase();

    KEYWORD_ACTIONS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|&(_, action)| action)
}
