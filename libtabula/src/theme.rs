//! Theme broadcast service.
//!
//! One `ThemeRegistry` owns the live [`ThemePalette`] for the whole process.
//! Widgets that need to react to theme switches register a listener once,
//! at creation time, and are notified synchronously on every palette swap.
//! There is no unregister operation; listeners are expected to live as long
//! as the widget that owns them.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, RwLock};

use eyre::{Context, Result};
use log::warn;

use crate::config::ThemePalette;

type ThemeListener = Arc<dyn Fn() + Send + Sync>;

pub struct ThemeRegistry {
    palette: RwLock<Arc<ThemePalette>>,
    listeners: Mutex<Vec<ThemeListener>>,
}

impl ThemeRegistry {
    #[must_use]
    pub fn new(initial: ThemePalette) -> Arc<Self> {
        Arc::new(Self {
            palette: RwLock::new(Arc::new(initial)),
            listeners: Mutex::new(Vec::new()),
        })
    }

    /// The live palette. Listeners re-read this during notification, so a
    /// listener invoked mid-broadcast already sees the new palette.
    #[must_use]
    pub fn palette(&self) -> Arc<ThemePalette> {
        self.palette
            .read()
            .expect("Failed to lock palette. Thread poisoned?")
            .clone()
    }

    /// Replaces the live palette wholesale and notifies every listener in
    /// registration order. A listener that panics is caught and skipped so
    /// one misbehaving widget cannot block the rest from updating.
    pub fn set_palette(&self, palette: ThemePalette) {
        *self
            .palette
            .write()
            .expect("Failed to lock palette. Thread poisoned?") = Arc::new(palette);
        self.notify();
    }

    /// Loads the named theme and makes it live. Unknown names resolve to the
    /// base palette; a theme file that fails to parse leaves the current
    /// palette untouched.
    pub fn select_theme(&self, theme_name: Option<String>) -> Result<()> {
        let palette =
            ThemePalette::new(theme_name).with_context(|| "Failed to set theme")?;
        self.set_palette(palette);
        Ok(())
    }

    pub fn register_listener(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners
            .lock()
            .expect("Failed to lock listeners. Thread poisoned?")
            .push(Arc::new(listener));
    }

    fn notify(&self) {
        // Snapshot so a listener may itself register further listeners.
        let listeners: Vec<ThemeListener> = self
            .listeners
            .lock()
            .expect("Failed to lock listeners. Thread poisoned?")
            .clone();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener())).is_err() {
                warn!("Theme listener panicked; skipping it for this update");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn set_palette_swaps_before_notifying() {
        let registry = ThemeRegistry::new(ThemePalette::default());
        let dark_bg = registry.palette().background;

        let seen = Arc::new(Mutex::new(Vec::new()));
        registry.register_listener({
            let registry = Arc::downgrade(&registry);
            let seen = seen.clone();
            move || {
                if let Some(registry) = registry.upgrade() {
                    seen.lock().unwrap().push(registry.palette().background);
                }
            }
        });

        registry.set_palette(ThemePalette::new(Some("light".to_string())).unwrap());
        let light_bg = registry.palette().background;

        assert_ne!(dark_bg, light_bg);
        assert_eq!(*seen.lock().unwrap(), vec![light_bg]);
    }

    #[test_log::test]
    fn panicking_listener_does_not_block_later_listeners() {
        let registry = ThemeRegistry::new(ThemePalette::default());
        let calls = Arc::new(AtomicUsize::new(0));

        registry.register_listener(|| panic!("broken widget"));
        registry.register_listener({
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        registry.set_palette(ThemePalette::default());
        registry.set_palette(ThemePalette::default());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn listeners_run_in_registration_order() {
        let registry = ThemeRegistry::new(ThemePalette::default());
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            registry.register_listener(move || order.lock().unwrap().push(tag));
        }

        registry.set_palette(ThemePalette::default());
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }
}
