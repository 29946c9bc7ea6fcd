//! Theme application
//!
//! Turns the active theme mode and the photographer's background color into
//! the CSS custom-property updates for the document root.

use serde::Serialize;

use crate::color::{derive_palette, Palette, PALETTE_VARIABLES};
use crate::state::prefs::ThemeMode;

/// The page always renders with the light base stylesheet; color comes from
/// the palette variables layered on top.
pub const DATA_THEME: &str = "light";

/// One CSS custom property assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CssVariable {
    pub name: &'static str,
    pub value: String,
}

/// What to do with the palette variables on the document root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "variables", rename_all = "lowercase")]
pub enum ThemeVars {
    /// Set every variable
    Apply(Vec<CssVariable>),
    /// Remove every variable so the stylesheet defaults show through
    Reset(Vec<&'static str>),
}

impl ThemeVars {
    pub fn from_palette(palette: Option<&Palette>) -> Self {
        match palette {
            Some(palette) => Self::Apply(
                palette
                    .css_variables()
                    .into_iter()
                    .map(|(name, value)| CssVariable { name, value })
                    .collect(),
            ),
            None => Self::Reset(PALETTE_VARIABLES.to_vec()),
        }
    }

    /// Render as a `:root` rule. A reset renders as an empty rule.
    pub fn to_css(&self) -> String {
        let mut css = String::from(":root {\n");
        if let Self::Apply(vars) = self {
            for var in vars {
                css.push_str(&format!("  {}: {};\n", var.name, var.value));
            }
        }
        css.push_str("}\n");
        css
    }
}

/// Everything the page needs to reflect the theme mode
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeState {
    pub mode: ThemeMode,
    pub data_theme: &'static str,
    pub toggle_label: &'static str,
    pub toggle_aria_label: &'static str,
    pub palette: Option<Palette>,
    pub vars: ThemeVars,
}

/// Resolve the theme for a mode.
///
/// Color mode derives a palette from `background`; light mode, or a
/// background that isn't a valid color, resets the variables.
pub fn apply_theme(mode: ThemeMode, background: &str) -> ThemeState {
    let palette = match mode {
        ThemeMode::Color => derive_palette(background),
        ThemeMode::Light => None,
    };
    if mode == ThemeMode::Color && palette.is_none() && !background.is_empty() {
        tracing::warn!(background, "background color is not a valid hex color");
    }

    ThemeState {
        mode,
        data_theme: DATA_THEME,
        toggle_label: mode.toggle_label(),
        toggle_aria_label: mode.toggle_aria_label(),
        vars: ThemeVars::from_palette(palette.as_ref()),
        palette,
    }
}
