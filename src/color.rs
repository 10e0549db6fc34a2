use lazy_static::lazy_static;
use ratatui::style::{Color, Modifier};
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref HSL_PATTERN: Regex = Regex::new(
        r"^hsl\(\s*(-?[0-9.]+)(?:deg)?\s*[, ]\s*([0-9.]+)%\s*[, ]\s*([0-9.]+)%\s*\)$"
    )
    .expect("static hsl pattern");
}

/// An RGB color with floating point channels in `0.0..=255.0`.
///
/// Channels stay fractional so per-frame color transitions can creep toward
/// their target without rounding stalls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(255.0, 255.0, 255.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Builds a color from a `0xRRGGBB` literal.
    pub const fn from_hex(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xff) as f32,
            ((hex >> 8) & 0xff) as f32,
            (hex & 0xff) as f32,
        )
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    /// Moves this color a fraction `rate` of the remaining way to `target`.
    ///
    /// With `rate` in `0.0..=1.0` the distance to the target never grows and
    /// the color never passes it.
    pub fn approach(&mut self, target: Rgb, rate: f32) {
        *self = self.lerp(target, rate);
    }

    /// Euclidean distance in RGB space.
    pub fn distance(self, other: Rgb) -> f32 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    pub fn scale(self, factor: f32) -> Rgb {
        Rgb::new(self.r * factor, self.g * factor, self.b * factor)
    }

    /// Source-over blend of `self` onto `dst` with the given alpha.
    pub fn over(self, dst: Rgb, alpha: f32) -> Rgb {
        dst.lerp(self, alpha)
    }

    fn channel(v: f32) -> u8 {
        v.round().clamp(0.0, 255.0) as u8
    }

    pub fn to_color(self) -> Color {
        Color::Rgb(Self::channel(self.r), Self::channel(self.g), Self::channel(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}",
            Self::channel(self.r),
            Self::channel(self.g),
            Self::channel(self.b)
        )
    }
}

/// Hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    pub fn to_rgb(self) -> Rgb {
        let h = self.h.rem_euclid(360.0) / 360.0;
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);

        if s == 0.0 {
            let v = l * 255.0;
            return Rgb::new(v, v, v);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        let hue = |mut t: f32| {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        };

        Rgb::new(
            hue(h + 1.0 / 3.0) * 255.0,
            hue(h) * 255.0,
            hue(h - 1.0 / 3.0) * 255.0,
        )
    }

    /// Parses `hsl(h, s%, l%)` or the space separated `hsl(h s% l%)` form.
    pub fn parse(input: &str) -> Option<Hsl> {
        let caps = HSL_PATTERN.captures(input.trim())?;
        let h = caps.get(1)?.as_str().parse().ok()?;
        let s = caps.get(2)?.as_str().parse().ok()?;
        let l = caps.get(3)?.as_str().parse().ok()?;
        Some(Hsl::new(h, s, l))
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({} {}% {}%)", self.h, self.s, self.l)
    }
}

// ============================================================================
// COLOR PARSING
// ============================================================================

pub fn parse_color(color_str: &str) -> Color {
    match color_str.to_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        "white" => Color::White,
        // RGB format: #RRGGBB
        hex if hex.starts_with('#') && hex.len() == 7 => {
            let channel = |range: std::ops::Range<usize>| {
                hex.get(range).and_then(|h| u8::from_str_radix(h, 16).ok())
            };
            match (channel(1..3), channel(3..5), channel(5..7)) {
                (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
                _ => Color::White,
            }
        }
        hsl if hsl.starts_with("hsl(") => match Hsl::parse(hsl) {
            Some(hsl) => hsl.to_rgb().to_color(),
            None => Color::White,
        },
        _ => Color::White,
    }
}

pub fn parse_modifier(modifiers: &[String]) -> Modifier {
    let mut result = Modifier::empty();
    for modifier in modifiers {
        match modifier.to_lowercase().as_str() {
            "bold" => result |= Modifier::BOLD,
            "italic" => result |= Modifier::ITALIC,
            "underlined" => result |= Modifier::UNDERLINED,
            "dim" => result |= Modifier::DIM,
            "reversed" => result |= Modifier::REVERSED,
            _ => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(Hsl::new(0.0, 100.0, 50.0).to_rgb().to_color(), Color::Rgb(255, 0, 0));
        assert_eq!(Hsl::new(120.0, 100.0, 50.0).to_rgb().to_color(), Color::Rgb(0, 255, 0));
        assert_eq!(Hsl::new(240.0, 100.0, 50.0).to_rgb().to_color(), Color::Rgb(0, 0, 255));
        assert_eq!(Hsl::new(42.0, 0.0, 100.0).to_rgb(), Rgb::WHITE);
    }

    #[test]
    fn test_hsl_parse_both_syntaxes() {
        assert_eq!(Hsl::parse("hsl(262.1, 83.3%, 57.8%)"), Some(Hsl::new(262.1, 83.3, 57.8)));
        assert_eq!(Hsl::parse("hsl(0 72% 50%)"), Some(Hsl::new(0.0, 72.0, 50.0)));
        assert_eq!(Hsl::parse("hsl(nope)"), None);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("Cyan"), Color::Cyan);
        assert_eq!(parse_color("#ff8000"), Color::Rgb(255, 128, 0));
        assert_eq!(parse_color("hsl(0, 100%, 50%)"), Color::Rgb(255, 0, 0));
        assert_eq!(parse_color("#zzzzzz"), Color::White);
        assert_eq!(parse_color("mauve"), Color::White);
    }

    #[test]
    fn test_parse_color_multibyte_hex_falls_back() {
        // seven bytes, but the slice boundaries land inside 'é'
        assert_eq!(parse_color("#aé123"), Color::White);
        assert_eq!(parse_color("#\u{1F31F}ab"), Color::White);
    }

    #[test]
    fn test_approach_never_overshoots() {
        let target = Rgb::new(10.0, 200.0, 90.0);
        let mut color = Rgb::WHITE;
        let mut last = color.distance(target);
        for _ in 0..2000 {
            color.approach(target, 0.01);
            let d = color.distance(target);
            assert!(d <= last);
            last = d;
        }
        assert!(last < 1.0);
    }

    #[test]
    fn test_display_hex() {
        assert_eq!(Rgb::from_hex(0x030310).to_string(), "#030310");
    }
}
