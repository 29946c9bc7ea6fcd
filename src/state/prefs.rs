//! Viewer display preferences
//!
//! This struct stores the choices a visitor makes on the page (theme mode
//! and image tone). It is persisted per device in the local library and
//! survives reloads.

use serde::{Deserialize, Serialize};

/// Library key holding the theme mode
pub const THEME_KEY: &str = "theme_mode";
/// Library key holding the image tone
pub const IMAGE_TONE_KEY: &str = "image_tone";

/// Page theme
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Palette derived from the photographer's background color
    #[default]
    Color,
    /// Stock light theme
    Light,
}

impl ThemeMode {
    /// Parse a stored value. Only `"light"` selects the light theme.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("light") => Self::Light,
            _ => Self::Color,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Color => Self::Light,
            Self::Light => Self::Color,
        }
    }

    /// Text of the toggle button: names the mode a click switches to
    pub fn toggle_label(self) -> &'static str {
        match self {
            Self::Color => "Light",
            Self::Light => "Color",
        }
    }

    pub fn toggle_aria_label(self) -> &'static str {
        match self {
            Self::Color => "Switch to light mode",
            Self::Light => "Switch to color mode",
        }
    }
}

/// Photo rendering tone
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageTone {
    #[default]
    Color,
    /// Black and white
    Bw,
    /// ISO 400 film look
    Iso400,
}

impl ImageTone {
    /// Parse a stored value; unknown values mean full color.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("bw") => Self::Bw,
            Some("iso400") => Self::Iso400,
            _ => Self::Color,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Bw => "bw",
            Self::Iso400 => "iso400",
        }
    }

    /// Result of pressing the B/W button
    pub fn toggle_bw(self) -> Self {
        if self == Self::Bw {
            Self::Color
        } else {
            Self::Bw
        }
    }

    /// Result of pressing the ISO 400 button
    pub fn toggle_iso400(self) -> Self {
        if self == Self::Iso400 {
            Self::Color
        } else {
            Self::Iso400
        }
    }

    /// Body classes to enable for this tone
    pub fn body_classes(self) -> Vec<&'static str> {
        match self {
            Self::Color => vec![],
            Self::Bw => vec!["bw-enabled"],
            Self::Iso400 => vec!["iso400-enabled"],
        }
    }
}

/// All persisted viewer preferences
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub theme: ThemeMode,
    pub tone: ImageTone,
}

impl Preferences {
    /// Build preferences from stored key values
    pub fn from_stored(theme: Option<&str>, tone: Option<&str>) -> Self {
        Self {
            theme: ThemeMode::from_stored(theme),
            tone: ImageTone::from_stored(tone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_from_stored() {
        assert_eq!(ThemeMode::from_stored(Some("light")), ThemeMode::Light);
        assert_eq!(ThemeMode::from_stored(Some("color")), ThemeMode::Color);
        assert_eq!(ThemeMode::from_stored(Some("dark")), ThemeMode::Color);
        assert_eq!(ThemeMode::from_stored(None), ThemeMode::Color);
    }

    #[test]
    fn test_theme_toggle_and_labels() {
        assert_eq!(ThemeMode::Color.toggled(), ThemeMode::Light);
        assert_eq!(ThemeMode::Light.toggled(), ThemeMode::Color);
        assert_eq!(ThemeMode::Color.toggle_label(), "Light");
        assert_eq!(ThemeMode::Light.toggle_label(), "Color");
    }

    #[test]
    fn test_tone_from_stored() {
        assert_eq!(ImageTone::from_stored(Some("bw")), ImageTone::Bw);
        assert_eq!(ImageTone::from_stored(Some("iso400")), ImageTone::Iso400);
        assert_eq!(ImageTone::from_stored(Some("sepia")), ImageTone::Color);
        assert_eq!(ImageTone::from_stored(None), ImageTone::Color);
    }

    #[test]
    fn test_tone_toggles_are_exclusive() {
        assert_eq!(ImageTone::Color.toggle_bw(), ImageTone::Bw);
        assert_eq!(ImageTone::Bw.toggle_bw(), ImageTone::Color);
        assert_eq!(ImageTone::Iso400.toggle_bw(), ImageTone::Bw);
        assert_eq!(ImageTone::Bw.toggle_iso400(), ImageTone::Iso400);
        assert_eq!(ImageTone::Iso400.toggle_iso400(), ImageTone::Color);
    }

    #[test]
    fn test_stored_names_round_trip() {
        for tone in [ImageTone::Color, ImageTone::Bw, ImageTone::Iso400] {
            assert_eq!(ImageTone::from_stored(Some(tone.as_str())), tone);
        }
        for theme in [ThemeMode::Color, ThemeMode::Light] {
            assert_eq!(ThemeMode::from_stored(Some(theme.as_str())), theme);
        }
    }

    #[test]
    fn test_default_preferences() {
        let prefs = Preferences::default();
        assert_eq!(prefs, Preferences::from_stored(None, None));
        assert!(prefs.tone.body_classes().is_empty());
    }
}
