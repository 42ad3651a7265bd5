//! Color types and categorical palettes.
//!
//! Colors are plain 8-bit RGBA values. Categorical palettes cycle by index so
//! series and category colors stay stable as long as their order is stable.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
    /// Alpha component (0-255, 255 = fully opaque).
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Create a new RGBA color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color (alpha = 255).
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Create a color with modified alpha.
    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidColor`] if the string is not a hex color.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        let bad = || Error::InvalidColor(hex.to_string());
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| bad());

        match digits.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (i, c) in digits.chars().enumerate() {
                    let v = byte(&c.to_string())?;
                    channels[i] = v * 17;
                }
                Ok(Self::rgb(channels[0], channels[1], channels[2]))
            }
            6 => Ok(Self::rgb(byte(&digits[0..2])?, byte(&digits[2..4])?, byte(&digits[4..6])?)),
            8 => Ok(Self::new(
                byte(&digits[0..2])?,
                byte(&digits[2..4])?,
                byte(&digits[4..6])?,
                byte(&digits[6..8])?,
            )),
            _ => Err(bad()),
        }
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    #[must_use]
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgba::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

const fn hex(v: u32) -> Rgba {
    Rgba::rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

/// An ordered list of colors assigned to categories by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette(Vec<Rgba>);

impl Palette {
    /// Ten-color categorical scheme (d3 `schemeCategory10`).
    pub const CATEGORY10: [Rgba; 10] = [
        hex(0x1f77b4),
        hex(0xff7f0e),
        hex(0x2ca02c),
        hex(0xd62728),
        hex(0x9467bd),
        hex(0x8c564b),
        hex(0xe377c2),
        hex(0x7f7f7f),
        hex(0xbcbd22),
        hex(0x17becf),
    ];

    /// Eight-color pastel scheme (ColorBrewer Set2).
    pub const SET2: [Rgba; 8] = [
        hex(0x66c2a5),
        hex(0xfc8d62),
        hex(0x8da0cb),
        hex(0xe78ac3),
        hex(0xa6d854),
        hex(0xffd92f),
        hex(0xe5c494),
        hex(0xb3b3b3),
    ];

    /// Twelve-color paired scheme (ColorBrewer Paired).
    pub const PAIRED: [Rgba; 12] = [
        hex(0xa6cee3),
        hex(0x1f78b4),
        hex(0xb2df8a),
        hex(0x33a02c),
        hex(0xfb9a99),
        hex(0xe31a1c),
        hex(0xfdbf6f),
        hex(0xff7f00),
        hex(0xcab2d6),
        hex(0x6a3d9a),
        hex(0xffff99),
        hex(0xb15928),
    ];

    /// Create a palette from colors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `colors` is empty.
    pub fn new(colors: Vec<Rgba>) -> Result<Self> {
        if colors.is_empty() {
            return Err(Error::config("palette", "a palette needs at least one color"));
        }
        Ok(Self(colors))
    }

    /// Parse a palette from hex strings.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry is not a hex color or the list is empty.
    pub fn from_hex(colors: &[&str]) -> Result<Self> {
        let parsed = colors.iter().map(|c| Rgba::from_hex(c)).collect::<Result<Vec<_>>>()?;
        Self::new(parsed)
    }

    /// `schemeCategory10`.
    #[must_use]
    pub fn category10() -> Self {
        Self(Self::CATEGORY10.to_vec())
    }

    /// `schemeSet2`.
    #[must_use]
    pub fn set2() -> Self {
        Self(Self::SET2.to_vec())
    }

    /// `schemePaired`.
    #[must_use]
    pub fn paired() -> Self {
        Self(Self::PAIRED.to_vec())
    }

    /// Color for the category at `index`, cycling when the palette is shorter.
    #[must_use]
    pub fn color(&self, index: usize) -> Rgba {
        if self.0.is_empty() {
            return Rgba::BLACK;
        }
        self.0[index % self.0.len()]
    }

    /// Number of distinct colors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the palette holds no colors (only reachable through deserialization).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The colors in order.
    #[must_use]
    pub fn colors(&self) -> &[Rgba] {
        &self.0
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::category10()
    }
}
