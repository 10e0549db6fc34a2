use crate::color::{Hsl, Rgb};
use crate::error::ThemeError;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// BACKGROUND STYLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackgroundStyle {
    #[default]
    Starfield,
    Nebula,
}

impl BackgroundStyle {
    pub const ALL: [BackgroundStyle; 2] = [BackgroundStyle::Starfield, BackgroundStyle::Nebula];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starfield => "starfield",
            Self::Nebula => "nebula",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Starfield => "Starfield",
            Self::Nebula => "Nebula",
        }
    }

    /// The other style; there are only two.
    pub fn toggled(self) -> Self {
        match self {
            Self::Starfield => Self::Nebula,
            Self::Nebula => Self::Starfield,
        }
    }
}

impl FromStr for BackgroundStyle {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            // "galaxy" is what older preference files stored
            "starfield" | "galaxy" => Ok(Self::Starfield),
            "nebula" => Ok(Self::Nebula),
            _ => Err(ThemeError::UnknownBackgroundStyle(s.to_string())),
        }
    }
}

impl fmt::Display for BackgroundStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// COLOR SCHEME
// ============================================================================

/// Accent hue applied on top of the dark/light base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorScheme {
    Red,
    Rose,
    Orange,
    Green,
    Blue,
    Yellow,
    Violet,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 7] = [
        ColorScheme::Red,
        ColorScheme::Rose,
        ColorScheme::Orange,
        ColorScheme::Green,
        ColorScheme::Blue,
        ColorScheme::Yellow,
        ColorScheme::Violet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Rose => "rose",
            Self::Orange => "orange",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Violet => "violet",
        }
    }

    /// Primary accent for this scheme.
    pub fn primary(self, dark_mode: bool) -> Hsl {
        match (self, dark_mode) {
            (Self::Red, _) => Hsl::new(0.0, 72.2, 50.6),
            (Self::Rose, _) => Hsl::new(346.8, 77.2, 49.8),
            (Self::Orange, true) => Hsl::new(20.5, 90.2, 48.2),
            (Self::Orange, false) => Hsl::new(24.6, 95.0, 53.1),
            (Self::Green, true) => Hsl::new(142.1, 70.6, 45.3),
            (Self::Green, false) => Hsl::new(142.1, 76.2, 36.3),
            (Self::Blue, true) => Hsl::new(217.2, 91.2, 59.8),
            (Self::Blue, false) => Hsl::new(221.2, 83.2, 53.3),
            (Self::Yellow, _) => Hsl::new(47.9, 95.8, 53.1),
            (Self::Violet, true) => Hsl::new(263.4, 70.0, 50.4),
            (Self::Violet, false) => Hsl::new(262.1, 83.3, 57.8),
        }
    }

    /// Star tint used by the starfield in light mode.
    fn light_star(self) -> Rgb {
        match self {
            Self::Red => Rgb::new(180.0, 30.0, 30.0),
            Self::Rose => Rgb::new(180.0, 30.0, 100.0),
            Self::Orange => Rgb::new(180.0, 80.0, 30.0),
            Self::Green => Rgb::new(30.0, 120.0, 60.0),
            Self::Blue => Rgb::new(30.0, 60.0, 120.0),
            Self::Yellow => Rgb::new(180.0, 150.0, 30.0),
            Self::Violet => Rgb::new(100.0, 30.0, 150.0),
        }
    }
}

impl FromStr for ColorScheme {
    type Err = ThemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ThemeError::UnknownColorScheme(s.to_string()))
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the persisted mode string.
pub fn parse_dark_mode(s: &str) -> Result<bool, ThemeError> {
    match s.trim().to_lowercase().as_str() {
        "dark" => Ok(true),
        "light" => Ok(false),
        _ => Err(ThemeError::UnknownThemeMode(s.to_string())),
    }
}

pub fn mode_str(dark_mode: bool) -> &'static str {
    if dark_mode {
        "dark"
    } else {
        "light"
    }
}

// ============================================================================
// THEME STATE
// ============================================================================

/// The current visual configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeState {
    pub background_style: BackgroundStyle,
    pub dark_mode: bool,
    pub color_scheme: Option<ColorScheme>,
}

impl Default for ThemeState {
    fn default() -> Self {
        Self {
            background_style: BackgroundStyle::Starfield,
            dark_mode: true,
            color_scheme: None,
        }
    }
}

impl ThemeState {
    /// Primary accent, falling back to the neutral foreground-ish default.
    pub fn primary(&self) -> Hsl {
        match self.color_scheme {
            Some(scheme) => scheme.primary(self.dark_mode),
            None if self.dark_mode => Hsl::new(0.0, 0.0, 98.0),
            None => Hsl::new(240.0, 5.9, 10.0),
        }
    }

    /// Base star color for the starfield: white in dark mode, the scheme's
    /// tint in light mode.
    pub fn star_color(&self) -> Rgb {
        if self.dark_mode {
            return Rgb::WHITE;
        }
        match self.color_scheme {
            Some(scheme) => scheme.light_star(),
            None => Rgb::new(60.0, 60.0, 120.0),
        }
    }

    pub fn effects(&self) -> ThemeEffects {
        ThemeEffects::for_style(self.background_style)
    }

    pub fn colors(&self) -> ThemeColors {
        ThemeColors::derive(self)
    }
}

// ============================================================================
// DERIVED STYLING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationStyle {
    Smooth,
    Cosmic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEffect {
    Glow,
    Cosmic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleEffect {
    Stars,
    Nebula,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Cosmic,
}

/// Per-style presentation hints for consumers that want to match the
/// background's mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeEffects {
    pub animation_style: AnimationStyle,
    pub text_effect: TextEffect,
    pub particle_effect: ParticleEffect,
    pub font_style: FontStyle,
}

impl ThemeEffects {
    pub fn for_style(style: BackgroundStyle) -> Self {
        match style {
            BackgroundStyle::Starfield => Self {
                animation_style: AnimationStyle::Smooth,
                text_effect: TextEffect::Glow,
                particle_effect: ParticleEffect::Stars,
                font_style: FontStyle::Normal,
            },
            BackgroundStyle::Nebula => Self {
                animation_style: AnimationStyle::Cosmic,
                text_effect: TextEffect::Cosmic,
                particle_effect: ParticleEffect::Nebula,
                font_style: FontStyle::Cosmic,
            },
        }
    }
}

/// Plain style values read by presentational consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeColors {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
    pub heading: Rgb,
    pub text: Rgb,
    pub muted_text: Rgb,
}

impl ThemeColors {
    pub fn derive(state: &ThemeState) -> Self {
        let primary = state.primary().to_rgb();
        if state.dark_mode {
            let secondary = Hsl::new(240.0, 3.7, 15.9).to_rgb();
            Self {
                primary,
                secondary,
                accent: secondary,
                heading: Rgb::WHITE,
                text: Hsl::new(0.0, 0.0, 98.0).to_rgb(),
                muted_text: Hsl::new(240.0, 5.0, 64.9).to_rgb(),
            }
        } else {
            let secondary = Hsl::new(240.0, 4.8, 95.9).to_rgb();
            let foreground = Hsl::new(240.0, 10.0, 3.9).to_rgb();
            let muted = Hsl::new(240.0, 3.8, 46.1).to_rgb();
            Self {
                primary,
                secondary,
                accent: secondary,
                heading: foreground,
                text: foreground,
                // muted text is dimmed further over the nebula's busier backdrop
                muted_text: match state.background_style {
                    BackgroundStyle::Nebula => muted.lerp(Rgb::WHITE, 0.2),
                    BackgroundStyle::Starfield => muted.lerp(Rgb::WHITE, 0.1),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_style_parse() {
        assert_eq!("starfield".parse(), Ok(BackgroundStyle::Starfield));
        assert_eq!("Nebula".parse(), Ok(BackgroundStyle::Nebula));
        assert_eq!("galaxy".parse(), Ok(BackgroundStyle::Starfield));
        assert_eq!(
            "wormhole".parse::<BackgroundStyle>(),
            Err(ThemeError::UnknownBackgroundStyle("wormhole".to_string()))
        );
    }

    #[test]
    fn test_color_scheme_round_trip_names() {
        for scheme in ColorScheme::ALL {
            assert_eq!(scheme.as_str().parse(), Ok(scheme));
        }
        assert!("teal".parse::<ColorScheme>().is_err());
    }

    #[test]
    fn test_star_color_follows_mode() {
        let mut state = ThemeState {
            color_scheme: Some(ColorScheme::Green),
            ..ThemeState::default()
        };
        assert_eq!(state.star_color(), Rgb::WHITE);
        state.dark_mode = false;
        assert_eq!(state.star_color(), Rgb::new(30.0, 120.0, 60.0));
        state.color_scheme = None;
        assert_eq!(state.star_color(), Rgb::new(60.0, 60.0, 120.0));
    }

    #[test]
    fn test_effects_per_style() {
        let effects = ThemeEffects::for_style(BackgroundStyle::Nebula);
        assert_eq!(effects.particle_effect, ParticleEffect::Nebula);
        assert_eq!(effects.font_style, FontStyle::Cosmic);
        let effects = ThemeEffects::for_style(BackgroundStyle::Starfield);
        assert_eq!(effects.text_effect, TextEffect::Glow);
    }

    #[test]
    fn test_mode_strings() {
        assert_eq!(parse_dark_mode("dark"), Ok(true));
        assert_eq!(parse_dark_mode(mode_str(false)), Ok(false));
        assert!(parse_dark_mode("system").is_err());
    }
}
