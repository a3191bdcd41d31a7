//! In-process screen routing

use std::sync::Mutex;

/// Screens the voice loops can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Navigation,
    Location,
    SavedRoutes,
    Settings,
}

impl Route {
    /// Path string for the screen
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Navigation => "/navigation",
            Self::Location => "/location",
            Self::SavedRoutes => "/routes",
            Self::Settings => "/modal",
        }
    }
}

/// Capability interface for screen navigation
pub trait Navigator: Send + Sync {
    /// Push a screen onto the stack
    fn push(&self, route: Route);

    /// Pop back to the previous screen
    fn back(&self);

    /// The screen currently on top
    fn current(&self) -> Route;
}

/// Simple in-process screen stack
///
/// Home is always the bottom of the stack and cannot be popped.
pub struct ScreenStack {
    stack: Mutex<Vec<Route>>,
}

impl ScreenStack {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: Mutex::new(vec![Route::Home]),
        }
    }
}

impl Default for ScreenStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for ScreenStack {
    fn push(&self, route: Route) {
        if let Ok(mut stack) = self.stack.lock() {
            tracing::info!(route = route.path(), "screen pushed");
            stack.push(route);
        }
    }

    fn back(&self) {
        if let Ok(mut stack) = self.stack.lock()
            && stack.len() > 1
        {
            let popped = stack.pop();
            tracing::info!(route = ?popped.map(Route::path), "screen popped");
        }
    }

    fn current(&self) -> Route {
        self.stack
            .lock()
            .ok()
            .and_then(|stack| stack.last().copied())
            .unwrap_or(Route::Home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_back_walk_the_stack() {
        let stack = ScreenStack::new();
        assert_eq!(stack.current(), Route::Home);

        stack.push(Route::Navigation);
        assert_eq!(stack.current(), Route::Navigation);

        stack.push(Route::Settings);
        assert_eq!(stack.current(), Route::Settings);

        stack.back();
        assert_eq!(stack.current(), Route::Navigation);
    }

    #[test]
    fn home_cannot_be_popped() {
        let stack = ScreenStack::new();
        stack.back();
        stack.back();
        assert_eq!(stack.current(), Route::Home);
    }
}
