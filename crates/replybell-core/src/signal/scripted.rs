//! In-memory host page driven by code instead of a browser.
//!
//! Used by the replay command and by tests. Clones share state: keep one
//! handle to drive the page and hand the other to the signal source.

use std::sync::{Arc, Mutex, MutexGuard};

use super::{Control, HostPage, Mutation, MutationObserver};
use crate::error::QueryError;

/// Label shown by [`ScriptedPage::set_busy`] while generating.
pub const SCRIPTED_STOP_LABEL: &str = "Stop";
/// Label shown by [`ScriptedPage::set_busy`] while idle.
pub const SCRIPTED_RUN_LABEL: &str = "Run";

#[derive(Debug, Default)]
struct PageState {
    controls: Vec<Control>,
    query_error: Option<QueryError>,
    focused: bool,
    observer: Option<MutationObserver>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    state: Arc<Mutex<PageState>>,
}

impl ScriptedPage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the rendered controls and report a child-list mutation.
    pub fn set_controls(&self, controls: Vec<Control>) {
        {
            let mut state = self.state();
            state.controls = controls;
            state.query_error = None;
        }
        self.mutate(&[Mutation::ChildList]);
    }

    /// Render a "Stop" control when busy, a disabled "Run" control otherwise.
    pub fn set_busy(&self, busy: bool) {
        let control = if busy {
            Control::new(SCRIPTED_STOP_LABEL)
        } else {
            Control::disabled(SCRIPTED_RUN_LABEL)
        };
        self.set_controls(vec![control]);
    }

    /// Make every following query fail until controls are set again.
    pub fn fail_queries(&self, error: QueryError) {
        self.state().query_error = Some(error);
    }

    pub fn set_focused(&self, focused: bool) {
        self.state().focused = focused;
    }

    pub fn has_focus(&self) -> bool {
        self.state().focused
    }

    pub fn is_observed(&self) -> bool {
        self.state().observer.is_some()
    }

    /// Deliver a mutation batch to the current observer, if any.
    pub fn mutate(&self, batch: &[Mutation]) -> bool {
        // Release the lock before the callback runs.
        let observer = self.state().observer.clone();
        observer.is_some_and(|observer| observer.notify(batch))
    }
}

impl HostPage for ScriptedPage {
    fn query_controls(&self) -> Result<Vec<Control>, QueryError> {
        let state = self.state();
        match &state.query_error {
            Some(error) => Err(error.clone()),
            None => Ok(state.controls.clone()),
        }
    }

    fn observe(&mut self, observer: MutationObserver) {
        self.state().observer = Some(observer);
    }

    fn disconnect(&mut self) {
        self.state().observer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_busy_renders_matching_controls() {
        let page = ScriptedPage::new();
        page.set_busy(true);
        assert_eq!(page.query_controls().unwrap(), vec![Control::new("Stop")]);
        page.set_busy(false);
        assert_eq!(page.query_controls().unwrap(), vec![Control::disabled("Run")]);
    }

    #[test]
    fn test_query_error_clears_on_next_render() {
        let page = ScriptedPage::new();
        page.fail_queries(QueryError::Malformed("not a list".into()));
        assert!(page.query_controls().is_err());
        page.set_busy(false);
        assert!(page.query_controls().is_ok());
    }

    #[test]
    fn test_unobserved_mutation_is_dropped() {
        let page = ScriptedPage::new();
        assert!(!page.mutate(&[Mutation::ChildList]));
    }
}
