use std::collections::HashSet;

use parking_lot::Mutex;

pub const TUTORIAL_PASSED_KEY: &str = "k-is-pass-tutorial";

/// Session-scoped boolean flags.
pub trait TutorialFlagStore: Send + Sync {
    fn get(&self, key: &str) -> bool;
    fn set(&self, key: &str);
}

/// Flags that live as long as the process.
#[derive(Debug, Default)]
pub struct SessionFlagStore {
    flags: Mutex<HashSet<String>>,
}

impl SessionFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TutorialFlagStore for SessionFlagStore {
    fn get(&self, key: &str) -> bool {
        self.flags.lock().contains(key)
    }

    fn set(&self, key: &str) {
        if self.flags.lock().insert(key.to_string()) {
            tracing::debug!(key, "session flag set");
        }
    }
}
