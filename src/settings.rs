//! Runtime-mutable settings with change notification.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;

use crate::config::SyncSettings;
use crate::sync::{FilterPatternProvider, ListenerId, SettingKey, SettingsListener};

type SharedListener = Arc<dyn Fn(&SettingKey) + Send + Sync>;

/// Holds settings that may change while the catalog is live.
///
/// Listeners are invoked on the thread that made the change, after every
/// internal lock has been released, so a listener may read the store back.
#[derive(Default)]
pub struct SettingsStore {
    songs_filter_pattern: RwLock<Option<String>>,
    values: RwLock<HashMap<String, String>>,
    listeners: Mutex<Vec<(ListenerId, SharedListener)>>,
    next_listener: AtomicU64,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sync_settings(settings: &SyncSettings) -> Self {
        let store = Self::new();
        *store
            .songs_filter_pattern
            .write()
            .unwrap_or_else(PoisonError::into_inner) =
            normalize(settings.songs_filter_pattern.clone());
        store
    }

    /// Replace the songs filter pattern. Blank clears it.
    ///
    /// Returns `true` and notifies listeners only when the value changed.
    pub fn set_songs_filter_pattern(&self, pattern: Option<String>) -> bool {
        let pattern = normalize(pattern);
        {
            let mut current = self
                .songs_filter_pattern
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if *current == pattern {
                return false;
            }
            *current = pattern;
        }
        self.notify(&SettingKey::SongsFilterPattern);
        true
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Store a free-form setting. Returns `true` when the value changed.
    pub fn set_value(&self, name: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            if values.get(name) == Some(&value) {
                return false;
            }
            values.insert(name.to_string(), value);
        }
        self.notify(&SettingKey::Named(name.to_string()));
        true
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn notify(&self, key: &SettingKey) {
        let listeners: Vec<SharedListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        debug!(?key, listeners = listeners.len(), "setting changed");
        for listener in listeners {
            listener(key);
        }
    }
}

fn normalize(pattern: Option<String>) -> Option<String> {
    pattern.filter(|p| !p.trim().is_empty())
}

impl FilterPatternProvider for SettingsStore {
    fn songs_filter_pattern(&self) -> Option<String> {
        self.songs_filter_pattern
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn add_listener(&self, listener: SettingsListener) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::from(listener)));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(existing, _)| *existing != id);
    }
}
