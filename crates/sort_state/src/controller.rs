use shared::domain::SortAction;
use tracing::{debug, info};
use url::Url;

use crate::apply_sort_to_url;

/// Page controls and the action each one triggers.
pub const CONTROL_BINDINGS: &[(&str, SortAction)] = &[
    ("sortDateAsc", SortAction::DateAsc),
    ("sortDateDesc", SortAction::DateDesc),
    ("sortTitleAsc", SortAction::TitleAsc),
    ("sortTitleDesc", SortAction::TitleDesc),
];

pub fn action_for_control(control_id: &str) -> Option<SortAction> {
    CONTROL_BINDINGS
        .iter()
        .find(|(id, _)| *id == control_id)
        .map(|(_, action)| *action)
}

/// Owner of the document location.
pub trait Navigator {
    fn current_url(&self) -> Url;
    fn navigate(&mut self, target: Url);
}

/// In-memory location with a history of every navigation.
#[derive(Debug, Clone)]
pub struct HistoryNavigator {
    location: Url,
    history: Vec<Url>,
}

impl HistoryNavigator {
    pub fn new(location: Url) -> Self {
        Self {
            location,
            history: Vec::new(),
        }
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Targets navigated to, oldest first.
    pub fn history(&self) -> &[Url] {
        &self.history
    }
}

impl Navigator for HistoryNavigator {
    fn current_url(&self) -> Url {
        self.location.clone()
    }

    fn navigate(&mut self, target: Url) {
        self.history.push(target.clone());
        self.location = target;
    }
}

pub struct SortController<N> {
    navigator: N,
}

impl<N: Navigator> SortController<N> {
    pub fn new(navigator: N) -> Self {
        Self { navigator }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn into_navigator(self) -> N {
        self.navigator
    }

    /// Runs the action bound to `control_id`. Unbound ids are ignored.
    pub fn handle(&mut self, control_id: &str) -> Option<Url> {
        let Some(action) = action_for_control(control_id) else {
            debug!(control_id, "no sort action bound to control");
            return None;
        };
        Some(self.apply(action))
    }

    /// Re-reads the current location, rewrites its query and navigates.
    pub fn apply(&mut self, action: SortAction) -> Url {
        let current = self.navigator.current_url();
        let target = apply_sort_to_url(&current, action);
        info!(%action, from = %current, to = %target, "applying sort");
        self.navigator.navigate(target.clone());
        target
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
