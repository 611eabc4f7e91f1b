//! Dock status model.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Lighting pattern.
///
/// The backend transmits effects as small integer codes; codes it never
/// produced map to [`Effect::Unknown`].
#[derive(ValueEnum, Default, PartialEq, Eq, Debug, Copy, Clone)]
pub enum Effect {
    #[default]
    Static,
    Breathing,
    Wave,
    Smooth,
    Race,
    Stack,
    #[value(skip)]
    Unknown,
}

impl Effect {
    /// Backend integer code for this effect.
    pub fn code(self) -> u8 {
        match self {
            Effect::Static => 1,
            Effect::Breathing => 3,
            Effect::Wave => 4,
            Effect::Smooth => 6,
            Effect::Race => 8,
            Effect::Stack => 10,
            Effect::Unknown => 0,
        }
    }

    /// Decode a backend effect code.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Effect::Static,
            3 => Effect::Breathing,
            4 => Effect::Wave,
            6 => Effect::Smooth,
            8 => Effect::Race,
            10 => Effect::Stack,
            _ => Effect::Unknown,
        }
    }
}

impl Display for Effect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Effect::Static => "Static",
            Effect::Breathing => "Breathing",
            Effect::Wave => "Wave",
            Effect::Smooth => "Smooth",
            Effect::Race => "Race",
            Effect::Stack => "Stack",
            Effect::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

/// Pattern speed for non-static effects.
#[derive(ValueEnum, Default, PartialEq, Eq, Debug, Copy, Clone)]
pub enum Speed {
    #[default]
    Normal,
    Medium,
    Fast,
    Turbo,
    #[value(skip)]
    Unknown,
}

impl Speed {
    /// Backend integer code for this speed.
    pub fn code(self) -> u8 {
        match self {
            Speed::Normal => 1,
            Speed::Medium => 2,
            Speed::Fast => 3,
            Speed::Turbo => 4,
            Speed::Unknown => 0,
        }
    }

    /// Decode a backend speed code.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Speed::Normal,
            2 => Speed::Medium,
            3 => Speed::Fast,
            4 => Speed::Turbo,
            _ => Speed::Unknown,
        }
    }
}

impl Display for Speed {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Speed::Normal => "Normal",
            Speed::Medium => "Medium",
            Speed::Fast => "Fast",
            Speed::Turbo => "Turbo",
            Speed::Unknown => "Unknown",
        };
        write!(f, "{}", name)
    }
}

/// RGB colour.
#[derive(Serialize, Deserialize, Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Colours offered by the colour selector.
pub const NAMED_COLOURS: [(&str, Rgb); 7] = [
    ("Red", Rgb { r: 255, g: 0, b: 0 }),
    ("Green", Rgb { r: 0, g: 255, b: 0 }),
    ("Blue", Rgb { r: 0, g: 0, b: 255 }),
    ("Yellow", Rgb { r: 255, g: 255, b: 0 }),
    ("Purple", Rgb { r: 255, g: 0, b: 255 }),
    ("Teal", Rgb { r: 0, g: 255, b: 255 }),
    ("White", Rgb { r: 255, g: 255, b: 255 }),
];

impl Rgb {
    /// Display name of the colour.
    ///
    /// Only the 7 full-intensity primaries/secondaries have names; every
    /// other triple is reported as "Unknown".
    pub fn name(self) -> &'static str {
        NAMED_COLOURS
            .iter()
            .find(|&&(_, rgb)| rgb == self)
            .map_or("Unknown", |&(name, _)| name)
    }
}

impl FromStr for Rgb {
    type Err = ();

    /// Parse either a `0xRRGGBB` literal or one of the selector colour names.
    fn from_str(s: &str) -> Result<Rgb, ()> {
        if let Some(chars) = s.strip_prefix("0x").filter(|_| s.len() == 8) {
            let mut colour = u32::from_str_radix(chars, 16).map_err(|_| ())?;
            let b = (colour & 0xff) as u8;
            colour >>= 8;
            let g = (colour & 0xff) as u8;
            colour >>= 8;
            let r = colour as u8;
            return Ok(Rgb { r, g, b });
        }

        NAMED_COLOURS
            .iter()
            .find(|&&(name, _)| name.eq_ignore_ascii_case(s))
            .map(|&(_, rgb)| rgb)
            .ok_or(())
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Full dock status record.
///
/// Snapshots are replaced wholesale on every fetch, never patched field by
/// field. The [`Default`] value doubles as the fallback applied when a fetch
/// does not succeed: everything off, zeroed and disconnected.
#[derive(Serialize, Deserialize, Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct DeviceSnapshot {
    /// Whether lighting output is on. Transmitted as `state`.
    #[serde(rename = "state")]
    pub enabled: bool,
    /// Raw effect code.
    pub effect: u8,
    /// Raw speed code. Meaningless while the effect is static.
    pub speed: u8,
    /// Static colour. Meaningful only for the static effect.
    pub colour: Rgb,
    /// Whether the dock hardware is reachable.
    pub connected: bool,
}

impl DeviceSnapshot {
    /// Decoded effect.
    pub fn effect(&self) -> Effect {
        Effect::from_code(self.effect)
    }

    /// Decoded speed.
    pub fn speed(&self) -> Speed {
        Speed::from_code(self.speed)
    }
}
