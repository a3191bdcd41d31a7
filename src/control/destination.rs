//! Destination capture loop for the navigation screen

use std::sync::Arc;
use std::time::Duration;

use crate::error::Error;
use crate::nav::{LocationProvider, RoutePlanner, RouteSummary};
use crate::turn::TurnManager;

use super::{CancelToken, LoopState, transition};

const DESTINATION_PROMPT: &str = "Where would you like to go?";

/// Voice loop that captures a destination and fetches a route
///
/// Confirms the heard destination with a yes/no turn before calling the
/// backend. "no" retries; "back" leaves the screen.
pub struct DestinationLoop {
    turns: TurnManager,
    planner: Arc<dyn RoutePlanner>,
    location: Arc<dyn LocationProvider>,
    /// Delay before re-prompting after an error
    retry_delay: Duration,
    /// Advisory listening window passed to the recognizer
    listen_hint: Duration,
}

impl DestinationLoop {
    #[must_use]
    pub fn new(
        turns: TurnManager,
        planner: Arc<dyn RoutePlanner>,
        location: Arc<dyn LocationProvider>,
        retry_delay: Duration,
        listen_hint: Duration,
    ) -> Self {
        Self {
            turns,
            planner,
            location,
            retry_delay,
            listen_hint,
        }
    }

    /// Run until a route is announced, the user backs out, or cancellation
    pub async fn run(&self, cancel: &CancelToken) -> Option<RouteSummary> {
        loop {
            if cancel.is_cancelled() {
                return self.stop();
            }

            transition("destination", LoopState::Prompting);
            let heard = self
                .turns
                .speak_then_listen(DESTINATION_PROMPT, self.listen_hint)
                .await;
            transition("destination", LoopState::Listening);

            if cancel.is_cancelled() {
                return self.stop();
            }

            let Some(destination) = heard else {
                self.turns.speak("I didn't catch a destination.").await;
                if !cancel.sleep(self.retry_delay).await {
                    return self.stop();
                }
                continue;
            };

            match self.confirm(&destination).await {
                Confirmation::Yes => {}
                Confirmation::Retry => continue,
                Confirmation::Back => {
                    self.turns.speak("Going back.").await;
                    return None;
                }
            }

            if cancel.is_cancelled() {
                return self.stop();
            }

            transition("destination", LoopState::Dispatching);
            match self.fetch_route(&destination).await {
                Ok(route) => {
                    self.turns.speak(&route.announcement()).await;
                    return Some(route);
                }
                Err(e) => {
                    let message = match e {
                        Error::Navigation(detail) => format!("Navigation error: {detail}"),
                        other => {
                            tracing::warn!(error = %other, "route request failed");
                            "Navigation request failed. Please try again.".to_string()
                        }
                    };
                    self.turns.speak(&message).await;
                    if !cancel.sleep(self.retry_delay).await {
                        return self.stop();
                    }
                }
            }
        }
    }

    /// One yes/no confirmation turn for the heard destination
    async fn confirm(&self, destination: &str) -> Confirmation {
        let prompt =
            format!("Did you say {destination}? Say yes to confirm, or no to try again.");
        let reply = self.turns.speak_then_listen(&prompt, self.listen_hint).await;

        match reply {
            Some(text) => {
                let lowered = text.to_lowercase();
                if lowered.contains("yes") {
                    Confirmation::Yes
                } else if lowered.contains("back") {
                    Confirmation::Back
                } else {
                    Confirmation::Retry
                }
            }
            None => Confirmation::Retry,
        }
    }

    async fn fetch_route(&self, destination: &str) -> crate::Result<RouteSummary> {
        let current = self.location.current_location().await?;
        self.planner.plan(current, destination).await
    }

    fn stop(&self) -> Option<RouteSummary> {
        transition("destination", LoopState::Stopped);
        self.turns.stop_speaking();
        None
    }
}

/// Outcome of the destination confirmation turn
enum Confirmation {
    Yes,
    Retry,
    Back,
}
