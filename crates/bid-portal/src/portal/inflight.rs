use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Tracks entity-edit actions that currently have a mutation in flight.
///
/// A second attempt at the same action while the first one still holds its
/// [`InFlightTicket`] is refused, mirroring a UI control that is disabled
/// while its request is pending.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InFlightError {
    #[error("'{0}' already has a request in flight")]
    Busy(String),
    #[error("in-flight registry unavailable")]
    Unavailable,
}

impl InFlightRegistry {
    pub fn begin(&self, action: impl Into<String>) -> Result<InFlightTicket, InFlightError> {
        let action = action.into();
        let mut guard = self.active.lock().map_err(|_| InFlightError::Unavailable)?;
        if !guard.insert(action.clone()) {
            return Err(InFlightError::Busy(action));
        }

        Ok(InFlightTicket {
            registry: Arc::clone(&self.active),
            action,
        })
    }

    pub fn is_pending(&self, action: &str) -> bool {
        self.active
            .lock()
            .map(|guard| guard.contains(action))
            .unwrap_or(false)
    }
}

/// Releases its action when dropped.
#[derive(Debug)]
pub struct InFlightTicket {
    registry: Arc<Mutex<HashSet<String>>>,
    action: String,
}

impl InFlightTicket {
    pub fn action(&self) -> &str {
        &self.action
    }
}

impl Drop for InFlightTicket {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.registry.lock() {
            guard.remove(&self.action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_actions_are_refused_until_released() {
        let registry = InFlightRegistry::default();
        let ticket = registry.begin("submit:eval-1").expect("first attempt");

        assert_eq!(
            registry.begin("submit:eval-1").map(|_| ()),
            Err(InFlightError::Busy("submit:eval-1".to_string()))
        );
        assert!(registry.is_pending("submit:eval-1"));

        drop(ticket);
        assert!(!registry.is_pending("submit:eval-1"));
        registry.begin("submit:eval-1").expect("released");
    }

    #[test]
    fn unrelated_actions_do_not_block_each_other() {
        let registry = InFlightRegistry::default();
        let _save = registry.begin("save:eval-1").expect("save");
        let _submit = registry.begin("submit:eval-2").expect("submit");
    }
}
