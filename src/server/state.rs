use std::sync::Arc;

use crate::trigger::Trigger;

#[derive(Debug)]
pub struct AppState<S> {
    pub trigger: Arc<Trigger<S>>,
}
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self { trigger: self.trigger.clone() }
    }
}
impl<S> AppState<S> {
    pub fn new(trigger: Trigger<S>) -> Self {
        Self { trigger: Arc::new(trigger) }
    }
}
