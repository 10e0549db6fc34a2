use crate::color::Rgb;
use crate::engine::{
    oscillate, reference_scale, FieldSettings, ParticleField, COLOR_TRANSITION_RATE,
    REFERENCE_HEIGHT,
    REFERENCE_WIDTH,
};
use crate::host::Viewport;
use crate::raster::{GradientStop, Raster};
use crate::theme::{BackgroundStyle, ThemeState};
use rand::rngs::StdRng;
use rand::Rng;
use std::f32::consts::TAU;

// ============================================================================
// STARFIELD
// ============================================================================

pub const DEPTH: f32 = 1000.0;
pub const NEAR_PLANE: f32 = 1.0;

/// Pointer influence radius in reference pixels.
/// Fastest accepted depth speed, in units per millisecond.
pub const MAX_SPEED_FACTOR: f32 = 10.0;

pub const INTERACTION_RADIUS: f32 = 70.0;

/// Depth speed multiplier applied at the pointer's exact position; it
/// rises linearly to one at the edge of the radius.
const INTERACTION_DAMPING: f32 = 0.3;

/// Terminal pixels are coarse, so glows and spikes are drawn this much
/// larger than their reference size to stay visible.
const POINT_BOOST: f32 = 4.0;

const HALF_WIDTH: f32 = REFERENCE_WIDTH / 2.0;
const HALF_HEIGHT: f32 = REFERENCE_HEIGHT / 2.0;

const LIGHT_BACKDROP: [GradientStop; 3] = [
    GradientStop::new(0.0, Rgb::from_hex(0xe6f0ff), 1.0),
    GradientStop::new(0.5, Rgb::from_hex(0xf0f4ff), 1.0),
    GradientStop::new(1.0, Rgb::from_hex(0xe0ecff), 1.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub size: f32,
    /// Accent stars take the scheme tint; the rest stay white in dark mode.
    pub accent: bool,
    pub color: Rgb,
    pub target: Rgb,
    pub twinkle_speed: f32,
    pub twinkle_phase: f32,
}

impl Star {
    /// Brightness from depth: full at the viewer, zero at the far end.
    pub fn brightness(&self) -> f32 {
        let d = self.z / DEPTH;
        1.0 - d * d
    }
}

pub struct StarField {
    stars: Vec<Star>,
    viewport: Viewport,
    theme: ThemeState,
    speed_factor: f32,
    pointer: Option<(f32, f32)>,
    time: f64,
    rng: StdRng,
}

impl StarField {
    pub fn new(settings: &FieldSettings, viewport: Viewport) -> Self {
        let theme = settings.theme;
        let density = if theme.dark_mode { 0.5 } else { 0.4 };
        let count = (settings.star_count as f32 * density).floor() as usize;
        let mut rng = settings.rng();

        let stars = (0..count)
            .map(|_| {
                let accent = rng.gen_bool(0.5);
                let color = star_target(&theme, accent);
                let size = if theme.dark_mode {
                    rng.gen_range(0.2..1.0)
                } else {
                    rng.gen_range(0.3..1.2)
                };
                Star {
                    x: rng.gen_range(-HALF_WIDTH..HALF_WIDTH),
                    y: rng.gen_range(-HALF_HEIGHT..HALF_HEIGHT),
                    z: rng.gen_range(NEAR_PLANE + 1.0..=DEPTH),
                    size,
                    accent,
                    color,
                    target: color,
                    twinkle_speed: rng.gen_range(0.002..0.007),
                    twinkle_phase: rng.gen_range(0.0..TAU),
                }
            })
            .collect();

        Self {
            stars,
            viewport,
            theme,
            speed_factor: clamp_speed_factor(settings.speed_factor),
            pointer: None,
            time: 0.0,
            rng,
        }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Screen position of a star in raster pixels.
    pub fn project(&self, star: &Star) -> (f32, f32) {
        let scale = reference_scale(self.viewport);
        let cx = self.viewport.width as f32 / 2.0;
        let cy = self.viewport.height as f32 / 2.0;
        let k = star.z * 0.001;
        (cx + star.x / k * scale, cy + star.y / k * scale)
    }

    /// Depth step for one star given the unobstructed `distance`.
    fn depth_step(&self, star: &Star, distance: f32) -> f32 {
        let Some((px, py)) = self.pointer else {
            return distance;
        };
        let scale = reference_scale(self.viewport).max(f32::EPSILON);
        let (sx, sy) = self.project(star);
        let dist = ((sx - px).powi(2) + (sy - py).powi(2)).sqrt() / scale;
        if dist < INTERACTION_RADIUS {
            distance * (dist / INTERACTION_RADIUS) * INTERACTION_DAMPING
        } else {
            distance
        }
    }

    fn move_stars(&mut self, distance: f32) {
        if !distance.is_finite() {
            return;
        }
        for i in 0..self.stars.len() {
            let step = self.depth_step(&self.stars[i], distance);
            let star = &mut self.stars[i];
            star.z -= step;

            if star.z <= NEAR_PLANE {
                // wrap back into (NEAR_PLANE, DEPTH] however far it overshot
                let span = DEPTH - NEAR_PLANE;
                star.z = DEPTH - (NEAR_PLANE - star.z).rem_euclid(span);
                star.x = self.rng.gen_range(-HALF_WIDTH..HALF_WIDTH);
                star.y = self.rng.gen_range(-HALF_HEIGHT..HALF_HEIGHT);
            }
        }
    }

    fn draw_star(&self, raster: &mut Raster, star: &Star, x: f32, y: f32, scale: f32) {
        let dark = self.theme.dark_mode;
        let brightness = star.brightness();
        let twinkle = oscillate(self.time, star.twinkle_speed, star.twinkle_phase) * 0.3 + 0.7;
        let adjusted = brightness * twinkle;
        let color = star.color;

        // only the bright, large stars pay for a glow pass
        if brightness > 0.8 && star.size > 0.7 {
            let glow = star.size * adjusted * if dark { 3.0 } else { 2.0 };
            let alpha = adjusted * if dark { 0.7 } else { 0.6 };
            raster.fill_radial(
                x,
                y,
                (glow * scale * POINT_BOOST).max(1.5),
                &[
                    GradientStop::new(0.0, color, alpha),
                    GradientStop::new(1.0, color, 0.0),
                ],
            );
        }

        let opacity = if dark { adjusted } else { adjusted * 0.9 };
        let size = if dark { star.size } else { star.size * 1.2 };
        if !dark {
            raster.fill_disc(x, y, (size * scale).max(0.5) + 0.5, color.scale(0.5), 0.25);
        }
        raster.fill_disc(x, y, size * scale, color, opacity);

        if brightness > 0.8 && star.size > 0.8 {
            let spike = (star.size * 2.0 * scale * POINT_BOOST).max(1.0);
            raster.cross(x, y, spike, color, opacity * 0.5);
        }
    }
}

/// Non-finite or negative speeds stop the field; huge ones are capped.
pub fn clamp_speed_factor(speed: f32) -> f32 {
    if speed.is_finite() {
        speed.clamp(0.0, MAX_SPEED_FACTOR)
    } else {
        0.0
    }
}

/// Target color of a star under `theme`.
fn star_target(theme: &ThemeState, accent: bool) -> Rgb {
    if accent || !theme.dark_mode {
        theme.star_color()
    } else {
        Rgb::WHITE
    }
}

impl ParticleField for StarField {
    fn style(&self) -> BackgroundStyle {
        BackgroundStyle::Starfield
    }

    fn population(&self) -> usize {
        self.stars.len()
    }

    fn wants_pointer(&self) -> bool {
        true
    }

    fn set_pointer(&mut self, pointer: Option<(f32, f32)>) {
        self.pointer = pointer;
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn advance(&mut self, elapsed_ms: f32) {
        self.time += elapsed_ms as f64;
        self.move_stars(elapsed_ms * self.speed_factor);
    }

    fn elapsed_ms(&self) -> f64 {
        self.time
    }

    fn transition_colors(&mut self) {
        for star in &mut self.stars {
            star.color.approach(star.target, COLOR_TRANSITION_RATE);
        }
    }

    fn retint(&mut self, theme: &ThemeState) {
        self.theme = *theme;
        for star in &mut self.stars {
            star.target = star_target(theme, star.accent);
        }
    }

    fn draw(&self, raster: &mut Raster) {
        if self.theme.dark_mode {
            raster.fill(Rgb::BLACK);
        } else {
            raster.fill_diagonal(&LIGHT_BACKDROP);
        }

        let scale = reference_scale(self.viewport);
        for star in &self.stars {
            let (x, y) = self.project(star);
            if !self.viewport.contains(x, y) {
                continue;
            }
            self.draw_star(raster, star, x, y, scale);
        }
    }
}
