//! Opaque selection controls.
//!
//! The cascade never reaches into a control's rendering. It writes options
//! and values through [`Selector`], and waits for [`Selector::ready`]
//! before the first write so a freshly mounted control does not drop it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use atlas_catalog::{Field, OptionSet};
use tokio::sync::watch;

use crate::selection::SelectionState;

#[async_trait]
pub trait Selector: Send + Sync {
    /// Resolves once the control can accept options and values.
    async fn ready(&self);

    /// Current value token, if any.
    fn value(&self) -> Option<String>;

    fn set_value(&self, value: Option<&str>);

    fn set_options(&self, options: &OptionSet);

    fn set_enabled(&self, enabled: bool);
}

#[async_trait]
impl<T: Selector + ?Sized> Selector for Arc<T> {
    async fn ready(&self) {
        self.as_ref().ready().await
    }

    fn value(&self) -> Option<String> {
        self.as_ref().value()
    }

    fn set_value(&self, value: Option<&str>) {
        self.as_ref().set_value(value)
    }

    fn set_options(&self, options: &OptionSet) {
        self.as_ref().set_options(options)
    }

    fn set_enabled(&self, enabled: bool) {
        self.as_ref().set_enabled(enabled)
    }
}

/// In-memory control, used by headless hosts and tests.
pub struct MemorySelector {
    inner: Mutex<MemoryState>,
    ready: watch::Sender<bool>,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    value: Option<String>,
    options: OptionSet,
    enabled: bool,
}

impl MemorySelector {
    /// A control that is ready immediately.
    pub fn new() -> Self {
        let selector = Self::pending();
        selector.mark_ready();
        selector
    }

    /// A control that is not ready until [`MemorySelector::mark_ready`].
    pub fn pending() -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            inner: Mutex::new(MemoryState { enabled: true, ..MemoryState::default() }),
            ready,
        }
    }

    pub fn mark_ready(&self) {
        self.ready.send_replace(true);
    }

    pub fn options(&self) -> OptionSet {
        self.state().options.clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemorySelector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Selector for MemorySelector {
    async fn ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives as long as `self`.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    fn value(&self) -> Option<String> {
        self.state().value.clone()
    }

    fn set_value(&self, value: Option<&str>) {
        self.state().value = value.map(str::to_string);
    }

    fn set_options(&self, options: &OptionSet) {
        self.state().options = options.clone();
    }

    fn set_enabled(&self, enabled: bool) {
        self.state().enabled = enabled;
    }
}

/// The three controls of one panel.
pub struct SelectorBindings {
    pub subject_a: Box<dyn Selector>,
    pub subject_b: Box<dyn Selector>,
    pub source: Box<dyn Selector>,
}

impl SelectorBindings {
    pub fn new(
        subject_a: Box<dyn Selector>,
        subject_b: Box<dyn Selector>,
        source: Box<dyn Selector>,
    ) -> Self {
        Self { subject_a, subject_b, source }
    }

    fn get(&self, field: Field) -> &dyn Selector {
        match field {
            Field::SubjectA => self.subject_a.as_ref(),
            Field::SubjectB => self.subject_b.as_ref(),
            Field::Source => self.source.as_ref(),
        }
    }

    /// Mirror a settled state into the controls.
    pub async fn publish(&self, state: &SelectionState) {
        for field in Field::ALL {
            let selector = self.get(field);
            selector.ready().await;
            selector.set_options(state.options(field));
            selector.set_value(state.get(field).map(|o| o.value.as_str()));
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        for field in Field::ALL {
            self.get(field).set_enabled(enabled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialize::initialize;
    use atlas_test_utils::fixtures::scenario_catalog;

    #[tokio::test]
    async fn test_publish_mirrors_values_and_options() {
        let catalog = scenario_catalog();
        let (state, _) = initialize(&catalog, None).unwrap();
        let host = Arc::new(MemorySelector::new());
        let bindings = SelectorBindings::new(
            Box::new(MemorySelector::new()),
            Box::new(host.clone()),
            Box::new(MemorySelector::new()),
        );

        bindings.publish(&state).await;
        assert_eq!(host.value().as_deref(), Some("E.coli-K12"));
        assert_eq!(host.options().labels(), vec!["E.coli-B", "E.coli-K12"]);
    }

    #[tokio::test]
    async fn test_publish_waits_for_pending_control() {
        let catalog = scenario_catalog();
        let (state, _) = initialize(&catalog, None).unwrap();
        let source = Arc::new(MemorySelector::pending());
        let bindings = Arc::new(SelectorBindings::new(
            Box::new(MemorySelector::new()),
            Box::new(MemorySelector::new()),
            Box::new(source.clone()),
        ));

        let task = tokio::spawn({
            let bindings = bindings.clone();
            async move { bindings.publish(&state).await }
        });
        tokio::task::yield_now().await;
        assert_eq!(source.value(), None);

        source.mark_ready();
        task.await.unwrap();
        assert_eq!(source.value().as_deref(), Some("Study1"));
    }

    #[test]
    fn test_disable_reaches_every_control() {
        let a = Arc::new(MemorySelector::new());
        let bindings = SelectorBindings::new(
            Box::new(a.clone()),
            Box::new(MemorySelector::new()),
            Box::new(MemorySelector::new()),
        );
        bindings.set_enabled(false);
        assert!(!a.is_enabled());
    }
}
