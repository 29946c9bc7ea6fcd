//! Color space conversion and theme palette derivation
//!
//! This module handles conversion between the color forms a theme needs:
//! - Hex strings (what photographers type into the settings table)
//! - RGB (8-bit channels, used for mixing)
//! - HSL (used to derive the accent hue)
//!
//! and derives a complete [`Palette`] from a single background color.

use serde::Serialize;
use std::fmt;

/// Luminance below which a background is treated as dark.
///
/// Deliberately lower than 0.5: the backgrounds photographers pick read as
/// dark enough for light text well before full darkness.
pub const DARK_LUMINANCE_THRESHOLD: f64 = 0.34;

/// Fixed text color on dark backgrounds
pub const DARK_TEXT: Rgb = Rgb::new(0xf5, 0xf5, 0xf7);
/// Fixed text color on light backgrounds
pub const LIGHT_TEXT: Rgb = Rgb::new(0x11, 0x11, 0x14);

const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);

const DARK_SHADOW: &str = "0 20px 44px rgba(0,0,0,0.42)";
const LIGHT_SHADOW: &str = "0 18px 40px rgba(25,28,35,0.08)";

/// Normalize a hex color string to `#rrggbb` lowercase form.
///
/// Accepts 3- or 6-digit hex with or without a leading `#`. Surrounding
/// whitespace is ignored. Returns `None` for anything else.
pub fn normalize_hex(input: &str) -> Option<String> {
    let value = input.trim().to_ascii_lowercase();
    let digits = value.strip_prefix('#').unwrap_or(&value);

    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    match digits.len() {
        3 => {
            let mut expanded = String::with_capacity(7);
            expanded.push('#');
            for c in digits.chars() {
                expanded.push(c);
                expanded.push(c);
            }
            Some(expanded)
        }
        6 => Some(format!("#{digits}")),
        _ => None,
    }
}

/// An 8-bit sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse any hex form accepted by [`normalize_hex`].
    pub fn from_hex(input: &str) -> Option<Self> {
        let normalized = normalize_hex(input)?;
        let int = u32::from_str_radix(&normalized[1..], 16).ok()?;
        Some(Self {
            r: ((int >> 16) & 0xff) as u8,
            g: ((int >> 8) & 0xff) as u8,
            b: (int & 0xff) as u8,
        })
    }

    /// Format as `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Build a color from unrounded channel values.
    ///
    /// Channels are rounded half-up and clamped to 0..=255.
    fn from_channels(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: round_channel(r),
            g: round_channel(g),
            b: round_channel(b),
        }
    }

    /// Linear interpolation toward `other`; `t` is clamped to [0, 1].
    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| f64::from(a) + (f64::from(b) - f64::from(a)) * t;
        Self::from_channels(
            lerp(self.r, other.r),
            lerp(self.g, other.g),
            lerp(self.b, other.b),
        )
    }

    /// Relative luminance per ITU-R BT.709 on linearized sRGB channels.
    pub fn relative_luminance(self) -> f64 {
        let r = srgb_to_linear(self.r);
        let g = srgb_to_linear(self.g);
        let b = srgb_to_linear(self.b);
        0.2126 * r + 0.7152 * g + 0.0722 * b
    }

    pub fn to_hsl(self) -> Hsl {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return Hsl { h: 0.0, s: 0.0, l };
        }

        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            ((g - b) / d + if g < b { 6.0 } else { 0.0 }) / 6.0
        } else if max == g {
            ((b - r) / d + 2.0) / 6.0
        } else {
            ((r - g) / d + 4.0) / 6.0
        };

        Hsl { h, s, l }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Hue, saturation and lightness, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    pub fn to_rgb(self) -> Rgb {
        if self.s == 0.0 {
            let v = round_channel(self.l * 255.0);
            return Rgb::new(v, v, v);
        }

        let q = if self.l < 0.5 {
            self.l * (1.0 + self.s)
        } else {
            self.l + self.s - self.l * self.s
        };
        let p = 2.0 * self.l - q;

        Rgb::from_channels(
            hue_to_channel(p, q, self.h + 1.0 / 3.0) * 255.0,
            hue_to_channel(p, q, self.h) * 255.0,
            hue_to_channel(p, q, self.h - 1.0 / 3.0) * 255.0,
        )
    }
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let mut t = t;
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

fn round_channel(v: f64) -> u8 {
    // Half-up rounding, matching how browsers round CSS channel math
    (v + 0.5).floor().clamp(0.0, 255.0) as u8
}

fn srgb_to_linear(channel: u8) -> f64 {
    let v = f64::from(channel) / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Whether a palette was derived for a dark or a light background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteTone {
    Dark,
    Light,
}

/// A theme derived from one background color
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Palette {
    pub tone: PaletteTone,
    pub background: Rgb,
    pub surface: Rgb,
    pub text: Rgb,
    pub muted: Rgb,
    pub border: Rgb,
    pub accent: Rgb,
    pub shadow: &'static str,
    pub canvas: Rgb,
    pub tile: Rgb,
}

impl Palette {
    pub fn is_dark(&self) -> bool {
        self.tone == PaletteTone::Dark
    }

    /// CSS custom properties applied to the document root, in order.
    pub fn css_variables(&self) -> Vec<(&'static str, String)> {
        vec![
            ("--bg-custom", self.background.to_hex()),
            ("--surface", self.surface.to_hex()),
            ("--text", self.text.to_hex()),
            ("--muted", self.muted.to_hex()),
            ("--border", self.border.to_hex()),
            ("--accent", self.accent.to_hex()),
            ("--shadow", self.shadow.to_string()),
            ("--gallery-canvas", self.canvas.to_hex()),
            ("--gallery-tile", self.tile.to_hex()),
        ]
    }
}

/// Names of every CSS variable a palette sets; cleared when no palette applies.
pub const PALETTE_VARIABLES: [&str; 9] = [
    "--bg-custom",
    "--surface",
    "--text",
    "--muted",
    "--border",
    "--accent",
    "--shadow",
    "--gallery-canvas",
    "--gallery-tile",
];

/// Derive a full theme palette from a background color.
///
/// Returns `None` when the input is not a valid hex color; callers should
/// then clear any previously applied palette.
///
/// # Algorithm
/// 1. Classify the background as dark or light by relative luminance
/// 2. Pick the fixed text color for that tone
/// 3. Mix surface/muted/border/canvas/tile at fixed per-tone ratios
/// 4. Rotate, saturate and re-light the background's HSL for the accent
pub fn derive_palette(base: &str) -> Option<Palette> {
    let bg = Rgb::from_hex(base)?;
    let dark = bg.relative_luminance() < DARK_LUMINANCE_THRESHOLD;
    let text = if dark { DARK_TEXT } else { LIGHT_TEXT };

    let surface = bg.mix(WHITE, if dark { 0.10 } else { 0.72 });
    let muted = text.mix(bg, if dark { 0.46 } else { 0.56 });
    let border = text.mix(bg, if dark { 0.72 } else { 0.84 });
    let canvas = bg.mix(BLACK, if dark { 0.20 } else { 0.10 });
    let tile = if dark {
        bg.mix(WHITE, 0.14)
    } else {
        bg.mix(BLACK, 0.08)
    };

    let hsl = bg.to_hsl();
    let accent = Hsl {
        h: (hsl.h + if dark { 0.06 } else { 0.08 }) % 1.0,
        s: (hsl.s + 0.22).clamp(0.20, 0.92),
        l: if dark {
            (hsl.l + 0.34).clamp(0.58, 0.76)
        } else {
            (hsl.l - 0.22).clamp(0.28, 0.52)
        },
    }
    .to_rgb();

    Some(Palette {
        tone: if dark {
            PaletteTone::Dark
        } else {
            PaletteTone::Light
        },
        background: bg,
        surface,
        text,
        muted,
        border,
        accent,
        shadow: if dark { DARK_SHADOW } else { LIGHT_SHADOW },
        canvas,
        tile,
    })
}
