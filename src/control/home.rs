//! Home screen voice loop: prompt, listen, dispatch

use std::sync::Arc;
use std::time::Duration;

use crate::commands::{VoiceAction, parse_voice_command};
use crate::router::Navigator;
use crate::turn::TurnManager;

use super::{CancelToken, LoopState, transition};

const GREETING: &str = "Welcome to Eyeway, your navigation assistant.";

const PROMPT: &str = "You can speak a command now. Say start navigation, \
                      saved routes, where am I, or settings.";

/// Idle voice loop for the home screen
///
/// Prompts on a fixed cycle until a command is recognized and dispatched,
/// then terminates. One dispatch per run; the caller restarts the loop
/// when the user returns home.
pub struct HomeControlLoop {
    turns: TurnManager,
    navigator: Arc<dyn Navigator>,
    /// Delay between idle prompt cycles
    idle_delay: Duration,
    /// Advisory listening window passed to the recognizer
    listen_hint: Duration,
    /// Speak the greeting before the first prompt
    greet: bool,
}

impl HomeControlLoop {
    #[must_use]
    pub fn new(
        turns: TurnManager,
        navigator: Arc<dyn Navigator>,
        idle_delay: Duration,
        listen_hint: Duration,
    ) -> Self {
        Self {
            turns,
            navigator,
            idle_delay,
            listen_hint,
            greet: true,
        }
    }

    /// Skip the one-time greeting (used when returning to the home screen)
    #[must_use]
    pub const fn without_greeting(mut self) -> Self {
        self.greet = false;
        self
    }

    /// Run until a command dispatches or the token cancels
    ///
    /// Returns the dispatched action, or `None` on cancellation.
    pub async fn run(&self, cancel: &CancelToken) -> Option<VoiceAction> {
        if self.greet {
            self.turns.speak(GREETING).await;
        }

        loop {
            if cancel.is_cancelled() {
                return self.stop();
            }

            transition("home", LoopState::Prompting);
            let heard = self.turns.speak_then_listen(PROMPT, self.listen_hint).await;
            transition("home", LoopState::Listening);

            if cancel.is_cancelled() {
                return self.stop();
            }

            match heard {
                Some(text) => {
                    if let Some(action) = parse_voice_command(&text) {
                        transition("home", LoopState::Dispatching);

                        if let Some(route) = action.route() {
                            tracing::info!(command = ?action, heard = %text, "command dispatched");
                            self.turns
                                .speak(&format!("Opening {}.", action.spoken_name()))
                                .await;
                            self.navigator.push(route);
                            return Some(action);
                        }

                        // Go back has no target screen from home
                        self.navigator.back();
                        self.turns.speak("You are on the home screen.").await;
                    } else {
                        tracing::debug!(heard = %text, "unrecognized command");
                        self.turns
                            .speak(&format!(
                                "Command not recognized. I heard {text}. Please try again."
                            ))
                            .await;
                    }
                }
                None => {
                    self.turns
                        .speak("I didn't hear a command. Please try again.")
                        .await;
                }
            }

            transition("home", LoopState::Idle);
            if !cancel.sleep(self.idle_delay).await {
                return self.stop();
            }
        }
    }

    /// Cancellation path: silence pending speech and report stopped
    fn stop(&self) -> Option<VoiceAction> {
        transition("home", LoopState::Stopped);
        self.turns.stop_speaking();
        None
    }
}
