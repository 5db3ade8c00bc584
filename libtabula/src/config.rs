use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File};
use derive_more::Display;
use directories::ProjectDirs;
use ecolor::Color32;
use enum_iterator::Sequence;
use eyre::{Context, Report, Result};
use serde::de;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

macro_rules! theme {
    ($name:expr) => {
        (
            $name,
            include_str!(concat!("../../themes/", $name, ".toml")),
        )
    };
}

/// Built-in theme names and their corresponding embedded content
static BUILTIN_THEMES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        theme!("dark"),
        theme!("light"),
        theme!("high-contrast"),
    ])
});

pub static PROJECT_DIR: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("org", "tabula-project", "tabula"));
const THEMES_DIR: &str = "themes";

/// Named slot in a palette. Widgets reference colors through roles so a
/// binding can be re-resolved whenever the live palette is swapped.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, Sequence)]
pub enum ColorRole {
    Background,
    Surface,
    SurfaceAlt,
    SurfaceRaised,
    Border,
    Accent,
    AccentAlt,
    Hover,
    Text,
    TextDim,
    TextMid,
    Warn,
    Danger,
    Success,
}

/// The full named set of colors currently in effect. Swapped wholesale on
/// theme change, never mutated field by field, so listeners always observe
/// a consistent snapshot.
#[derive(Debug, Deserialize)]
pub struct ThemePalette {
    /// Window background behind all grid chrome
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub background: Color32,
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub surface: Color32,
    /// Background of grid bodies and text fields
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub surface_alt: Color32,
    /// Background of grid headers and bars
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub surface_raised: Color32,
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub border: Color32,
    /// Primary accent, default header foreground
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub accent: Color32,
    /// Secondary accent, selection background
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub accent_alt: Color32,
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub hover: Color32,
    /// Color used for text across the UI
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub text: Color32,
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub text_dim: Color32,
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub text_mid: Color32,
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub warn: Color32,
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub danger: Color32,
    #[serde(deserialize_with = "deserialize_hex_color")]
    pub success: Color32,

    /// Extra named colors available for tag styling
    #[serde(default = "default_colors", deserialize_with = "deserialize_color_map")]
    pub colors: HashMap<String, Color32>,

    /// List of theme names
    #[serde(default = "Vec::new")]
    pub theme_names: Vec<String>,
}

impl ThemePalette {
    /// Loads a palette by layering `default_theme.toml`, the named built-in
    /// theme, and any same-named theme file in the user config directory.
    pub fn new(theme_name: Option<String>) -> Result<Self> {
        use eyre::anyhow;

        let (mut theme, mut theme_names) = Self::generate_defaults(&theme_name);

        // Themes dropped into the config directory are selectable alongside
        // the built-in ones.
        if let Some(proj_dirs) = &*PROJECT_DIR {
            let config_themes_dir = proj_dirs.config_dir().join(THEMES_DIR);
            if let Ok(dir) = std::fs::read_dir(config_themes_dir) {
                for entry in dir.flatten() {
                    if let Ok(file_name) = entry.file_name().into_string()
                        && let Some(fname) = file_name.strip_suffix(".toml")
                        && !fname.is_empty()
                        && !theme_names.iter().any(|n| n == fname)
                    {
                        theme_names.push(fname.to_string());
                    }
                }
            }
        }

        if matches!(theme_name, Some(ref name) if !name.is_empty()) {
            let theme_path =
                Path::new(THEMES_DIR).join(theme_name.as_ref().unwrap().to_owned() + ".toml");
            if let Some(proj_dirs) = &*PROJECT_DIR {
                let config_theme_path = proj_dirs.config_dir().join(theme_path);
                if config_theme_path.exists() {
                    theme = theme.add_source(File::from(config_theme_path).required(false));
                }
            }
        }

        theme_names.sort();
        let theme = theme.set_override("theme_names", theme_names)?;

        theme
            .build()?
            .try_deserialize()
            .map_err(|e| anyhow!("Failed to parse theme {e}"))
    }

    fn generate_defaults(
        theme_name: &Option<String>,
    ) -> (ConfigBuilder<DefaultState>, Vec<String>) {
        let default_theme = String::from(include_str!("../../default_theme.toml"));

        let mut theme = Config::builder().add_source(config::File::from_str(
            &default_theme,
            config::FileFormat::Toml,
        ));

        let theme_names = all_theme_names();

        let override_theme = theme_name
            .as_ref()
            .and_then(|name| BUILTIN_THEMES.get(name.as_str()).copied())
            .unwrap_or("");

        theme = theme.add_source(config::File::from_str(
            override_theme,
            config::FileFormat::Toml,
        ));
        (theme, theme_names)
    }

    /// Current color of a role.
    #[must_use]
    pub fn role(&self, role: ColorRole) -> Color32 {
        match role {
            ColorRole::Background => self.background,
            ColorRole::Surface => self.surface,
            ColorRole::SurfaceAlt => self.surface_alt,
            ColorRole::SurfaceRaised => self.surface_raised,
            ColorRole::Border => self.border,
            ColorRole::Accent => self.accent,
            ColorRole::AccentAlt => self.accent_alt,
            ColorRole::Hover => self.hover,
            ColorRole::Text => self.text,
            ColorRole::TextDim => self.text_dim,
            ColorRole::TextMid => self.text_mid,
            ColorRole::Warn => self.warn,
            ColorRole::Danger => self.danger,
            ColorRole::Success => self.success,
        }
    }

    /// Reverse lookup: the role whose current value equals `color`, if any.
    #[must_use]
    pub fn role_of(&self, color: Color32) -> Option<ColorRole> {
        enum_iterator::all::<ColorRole>().find(|role| self.role(*role) == color)
    }

    #[must_use]
    pub fn get_color(&self, color: &str) -> Option<Color32> {
        self.colors.get(color).copied()
    }

    /// Picks whichever of `text` and `text_mid` has the higher contrast
    /// ratio against the given background.
    #[must_use]
    pub fn get_best_text_color(&self, backgroundcolor: Color32) -> Color32 {
        let l_text = get_luminance(self.text);
        let l_text_mid = get_luminance(self.text_mid);
        let l_background = get_luminance(backgroundcolor);

        let mut cr_text = (l_text + 0.05) / (l_background + 0.05);
        cr_text = cr_text.max(1. / cr_text);
        let mut cr_text_mid = (l_text_mid + 0.05) / (l_background + 0.05);
        cr_text_mid = cr_text_mid.max(1. / cr_text_mid);

        if cr_text > cr_text_mid {
            self.text
        } else {
            self.text_mid
        }
    }
}

impl Default for ThemePalette {
    fn default() -> Self {
        Self::new(None).expect("Failed to load default theme")
    }
}

fn get_luminance(color: Color32) -> f32 {
    let rg = if color.r() < 10 {
        f32::from(color.r()) / 3294.0
    } else {
        (f32::from(color.r()) / 269.0 + 0.0513).powf(2.4)
    };
    let gg = if color.g() < 10 {
        f32::from(color.g()) / 3294.0
    } else {
        (f32::from(color.g()) / 269.0 + 0.0513).powf(2.4)
    };
    let bg = if color.b() < 10 {
        f32::from(color.b()) / 3294.0
    } else {
        (f32::from(color.b()) / 269.0 + 0.0513).powf(2.4)
    };
    0.2126 * rg + 0.7152 * gg + 0.0722 * bg
}

fn default_colors() -> HashMap<String, Color32> {
    [
        ("Green", "00F5A0"),
        ("Blue", "00C8F8"),
        ("Purple", "6C5CE7"),
        ("Orange", "FF7043"),
        ("Yellow", "FFA502"),
        ("Red", "FF3B4E"),
        ("Pink", "FD79A8"),
    ]
    .iter()
    .map(|(name, hexcode)| {
        (
            name.to_string(),
            hex_string_to_color32(hexcode.to_string()).unwrap(),
        )
    })
    .collect()
}

fn hex_string_to_color32(mut str: String) -> Result<Color32> {
    let mut hex_str = String::new();
    if str.len() == 3 {
        for c in str.chars() {
            hex_str.push(c);
            hex_str.push(c);
        }
        str = hex_str;
    }
    if str.len() == 6 {
        let r = u8::from_str_radix(&str[0..2], 16)
            .with_context(|| format!("'{str}' is not a valid RGB hex color"))?;
        let g = u8::from_str_radix(&str[2..4], 16)
            .with_context(|| format!("'{str}' is not a valid RGB hex color"))?;
        let b = u8::from_str_radix(&str[4..6], 16)
            .with_context(|| format!("'{str}' is not a valid RGB hex color"))?;
        Ok(Color32::from_rgb(r, g, b))
    } else {
        eyre::Result::Err(Report::msg(format!("'{str}' is not a valid RGB hex color")))
    }
}

fn all_theme_names() -> Vec<String> {
    BUILTIN_THEMES
        .keys()
        .map(std::string::ToString::to_string)
        .collect()
}

fn deserialize_hex_color<'de, D>(deserializer: D) -> Result<Color32, D::Error>
where
    D: Deserializer<'de>,
{
    let buf = String::deserialize(deserializer)?;
    hex_string_to_color32(buf).map_err(de::Error::custom)
}

fn deserialize_color_map<'de, D>(deserializer: D) -> Result<HashMap<String, Color32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_hex_color")] Color32);

    let v = HashMap::<String, Wrapper>::deserialize(deserializer)?;
    Ok(v.into_iter().map(|(k, Wrapper(v))| (k, v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_loads() {
        let palette = ThemePalette::new(None).expect("default palette");
        assert_eq!(palette.background, Color32::from_rgb(0x0B, 0x0D, 0x12));
        assert!(palette.theme_names.iter().any(|n| n == "light"));
    }

    #[test]
    fn light_theme_overrides_base() {
        let palette = ThemePalette::new(Some("light".to_string())).expect("light palette");
        assert_eq!(palette.background, Color32::from_rgb(0xF0, 0xF2, 0xF8));
        assert_eq!(palette.text, Color32::from_rgb(0x1A, 0x1F, 0x36));
    }

    #[test]
    fn unknown_theme_name_falls_back_to_base() {
        let palette = ThemePalette::new(Some("no-such-theme".to_string())).expect("palette");
        assert_eq!(palette.background, Color32::from_rgb(0x0B, 0x0D, 0x12));
    }

    #[test]
    fn role_reverse_lookup_round_trips() {
        let palette = ThemePalette::default();
        for role in enum_iterator::all::<ColorRole>() {
            // Distinct roles may share a value; lookup must return a role
            // with that exact value.
            let found = palette.role_of(palette.role(role)).expect("role found");
            assert_eq!(palette.role(found), palette.role(role));
        }
    }

    #[test]
    fn role_of_rejects_foreign_color() {
        let palette = ThemePalette::default();
        assert_eq!(palette.role_of(Color32::from_rgb(1, 2, 3)), None);
    }

    #[test]
    fn hex_parsing_accepts_short_form() {
        assert_eq!(
            hex_string_to_color32("fff".to_string()).unwrap(),
            Color32::from_rgb(0xFF, 0xFF, 0xFF)
        );
        assert!(hex_string_to_color32("nope".to_string()).is_err());
    }
}
