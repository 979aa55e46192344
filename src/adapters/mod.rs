// Adapters layer: concrete implementations of the domain ports.

use crate::domain::model::Visit;
use crate::domain::ports::Navigator;
use std::sync::{Mutex, PoisonError};

/// Keeps every visit in order, like a browser history stack.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    visits: Mutex<Vec<Visit>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visits(&self) -> Vec<Visit> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current(&self) -> Option<Visit> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Navigator for HistoryNavigator {
    fn visit(&self, visit: &Visit) {
        tracing::debug!("history push {}", visit.url);
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(visit.clone());
    }
}
