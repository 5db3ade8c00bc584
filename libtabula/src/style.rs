//! Named style bindings derived from the live palette.
//!
//! A grid registers a style name once; the registry re-derives the rendering
//! parameters for every registered name whenever the theme changes, so
//! already-rendered grids pick up the new palette without being recreated.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ecolor::Color32;

use crate::config::{ColorRole, ThemePalette};
use crate::theme::ThemeRegistry;

/// Default row height for grid rows, in points.
pub const ROW_HEIGHT_NORMAL: f32 = 24.0;
/// Row height for dense grids (smaller text, less padding).
pub const ROW_HEIGHT_DENSE: f32 = 18.0;

/// Reference to a palette slot, or a fixed color that survives theme
/// changes unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorRef {
    Role(ColorRole),
    Literal(Color32),
}

impl ColorRef {
    /// Binds a raw color against the palette: a color equal to some role's
    /// current value is remembered as that role, anything else stays literal.
    #[must_use]
    pub fn from_color(color: Color32, palette: &ThemePalette) -> Self {
        match palette.role_of(color) {
            Some(role) => Self::Role(role),
            None => Self::Literal(color),
        }
    }

    #[must_use]
    pub fn resolve(&self, palette: &ThemePalette) -> Color32 {
        match self {
            Self::Role(role) => palette.role(*role),
            Self::Literal(color) => *color,
        }
    }
}

/// Rendering parameters for one named binding, fully resolved against a
/// palette snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridStyle {
    pub background: Color32,
    pub foreground: Color32,
    pub header_background: Color32,
    pub header_foreground: Color32,
    pub selection_background: Color32,
    pub border: Color32,
    pub row_height: f32,
}

#[derive(Clone, Copy, Debug)]
struct StyleBinding {
    header: ColorRef,
    dense: bool,
}

pub struct StyleRegistry {
    theme: Arc<ThemeRegistry>,
    bindings: Mutex<HashMap<String, StyleBinding>>,
    resolved: Mutex<HashMap<String, GridStyle>>,
}

impl StyleRegistry {
    /// Creates the registry and hooks it up to the theme broadcast, so every
    /// binding is re-derived on palette swaps for the rest of the process
    /// lifetime.
    #[must_use]
    pub fn new(theme: Arc<ThemeRegistry>) -> Arc<Self> {
        let registry = Arc::new(Self {
            theme: theme.clone(),
            bindings: Mutex::new(HashMap::new()),
            resolved: Mutex::new(HashMap::new()),
        });
        theme.register_listener({
            let registry = Arc::downgrade(&registry);
            move || {
                if let Some(registry) = registry.upgrade() {
                    registry.on_theme_changed();
                }
            }
        });
        registry
    }

    /// Registers (or re-registers) a style under `name`. A `header_color`
    /// matching a role's current value tracks that role across theme
    /// changes; any other color is kept as a literal; `None` uses the
    /// palette accent.
    pub fn apply_style(&self, name: &str, header_color: Option<Color32>) -> GridStyle {
        self.apply_style_opts(name, header_color, false)
    }

    pub fn apply_style_opts(
        &self,
        name: &str,
        header_color: Option<Color32>,
        dense: bool,
    ) -> GridStyle {
        let palette = self.theme.palette();
        let header = match header_color {
            Some(color) => ColorRef::from_color(color, &palette),
            None => ColorRef::Role(ColorRole::Accent),
        };
        let binding = StyleBinding { header, dense };
        let style = derive_style(binding, &palette);

        self.bindings
            .lock()
            .expect("Failed to lock style bindings. Thread poisoned?")
            .insert(name.to_string(), binding);
        self.resolved
            .lock()
            .expect("Failed to lock resolved styles. Thread poisoned?")
            .insert(name.to_string(), style);
        style
    }

    /// The currently resolved style for `name`, if registered.
    #[must_use]
    pub fn style(&self, name: &str) -> Option<GridStyle> {
        self.resolved
            .lock()
            .expect("Failed to lock resolved styles. Thread poisoned?")
            .get(name)
            .copied()
    }

    /// Re-derives every registered binding against the live palette. Invoked
    /// through the theme listener; callers never need to re-apply styles.
    pub fn on_theme_changed(&self) {
        let palette = self.theme.palette();
        let bindings = self
            .bindings
            .lock()
            .expect("Failed to lock style bindings. Thread poisoned?");
        let mut resolved = self
            .resolved
            .lock()
            .expect("Failed to lock resolved styles. Thread poisoned?");
        for (name, binding) in bindings.iter() {
            resolved.insert(name.clone(), derive_style(*binding, &palette));
        }
    }
}

fn derive_style(binding: StyleBinding, palette: &ThemePalette) -> GridStyle {
    GridStyle {
        background: palette.surface_alt,
        foreground: palette.text,
        header_background: palette.surface_raised,
        header_foreground: binding.header.resolve(palette),
        selection_background: palette.accent_alt,
        border: palette.border,
        row_height: if binding.dense {
            ROW_HEIGHT_DENSE
        } else {
            ROW_HEIGHT_NORMAL
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemePalette;

    fn registries() -> (Arc<ThemeRegistry>, Arc<StyleRegistry>) {
        let theme = ThemeRegistry::new(ThemePalette::default());
        let styles = StyleRegistry::new(theme.clone());
        (theme, styles)
    }

    #[test]
    fn role_matched_header_tracks_palette() {
        let (theme, styles) = registries();
        let accent = theme.palette().accent;
        styles.apply_style("B", Some(accent));

        theme.set_palette(ThemePalette::new(Some("light".to_string())).unwrap());

        let style = styles.style("B").expect("registered style");
        assert_eq!(style.header_foreground, theme.palette().accent);
        assert_eq!(style.background, theme.palette().surface_alt);
    }

    #[test]
    fn literal_header_survives_theme_change() {
        let (theme, styles) = registries();
        let literal = Color32::from_rgb(0x12, 0x34, 0x56);
        styles.apply_style("Custom", Some(literal));

        theme.set_palette(ThemePalette::new(Some("light".to_string())).unwrap());
        theme.set_palette(ThemePalette::new(Some("high-contrast".to_string())).unwrap());

        assert_eq!(
            styles.style("Custom").unwrap().header_foreground,
            literal
        );
    }

    #[test]
    fn styles_match_fresh_resolution_after_many_swaps() {
        let (theme, styles) = registries();
        styles.apply_style("A", None);
        styles.apply_style("B", Some(theme.palette().danger));

        for name in ["light", "dark", "high-contrast", "light"] {
            theme.set_palette(ThemePalette::new(Some(name.to_string())).unwrap());
        }

        let palette = theme.palette();
        let a = styles.style("A").unwrap();
        assert_eq!(a.header_foreground, palette.accent);
        assert_eq!(a.foreground, palette.text);
        let b = styles.style("B").unwrap();
        assert_eq!(b.header_foreground, palette.danger);
        assert_eq!(b.selection_background, palette.accent_alt);
    }

    #[test]
    fn reapplying_a_name_overwrites_the_binding() {
        let (theme, styles) = registries();
        styles.apply_style("B", Some(theme.palette().accent));
        styles.apply_style("B", Some(theme.palette().warn));

        assert_eq!(
            styles.style("B").unwrap().header_foreground,
            theme.palette().warn
        );

        theme.set_palette(ThemePalette::new(Some("light".to_string())).unwrap());
        assert_eq!(
            styles.style("B").unwrap().header_foreground,
            theme.palette().warn
        );
    }

    #[test]
    fn dense_binding_shrinks_row_height() {
        let (_theme, styles) = registries();
        let normal = styles.apply_style_opts("normal", None, false);
        let dense = styles.apply_style_opts("dense", None, true);
        assert!(dense.row_height < normal.row_height);
    }
}
