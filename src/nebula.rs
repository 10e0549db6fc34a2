use crate::color::{Hsl, Rgb};
use crate::engine::{
    oscillate, reference_scale, FieldSettings, ParticleField, COLOR_TRANSITION_RATE,
    REFERENCE_FRAME_MS,
};
use crate::host::Viewport;
use crate::raster::{sample_gradient, GradientStop, Raster};
use crate::theme::{BackgroundStyle, ThemeState};
use rand::rngs::StdRng;
use rand::Rng;
use std::f32::consts::TAU;

// ============================================================================
// NEBULA
// ============================================================================

// Elements never travel; they are only re-rolled when a resize leaves them
// outside the viewport.

pub const DUST_STAR_COUNT: usize = 700;
pub const CLOUD_COUNT: usize = 8;
pub const FILAMENT_COUNT: usize = 5;
pub const BRIGHT_STAR_COUNT: usize = 12;

const DARK_BACKDROP: Rgb = Rgb::from_hex(0x030310);
const LIGHT_BACKDROP: Rgb = Rgb::from_hex(0xf0f5ff);
const LIGHT_DUST: Rgb = Rgb::new(100.0, 120.0, 200.0);

/// Per-frame rotation rates are converted to per-millisecond ones.
fn per_ms(per_frame: f32) -> f32 {
    per_frame / REFERENCE_FRAME_MS
}

/// Opacity in the mode's range from a stored unit roll.
fn mode_opacity(dark: bool, roll: f32) -> f32 {
    if dark {
        0.1 + roll * 0.2
    } else {
        0.05 + roll * 0.15
    }
}

fn gas_color(dark: bool, hue: f32, light_lightness: f32) -> Rgb {
    if dark {
        Hsl::new(hue, 70.0, 60.0).to_rgb()
    } else {
        Hsl::new(hue, 60.0, light_lightness).to_rgb()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DustStar {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub opacity: f32,
    pub twinkle_speed: f32,
    pub color: Rgb,
    pub target: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NebulaCloud {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub opacity_roll: f32,
    pub hues: (f32, f32),
    pub colors: (Rgb, Rgb),
    pub targets: (Rgb, Rgb),
    pub rotation: f32,
    pub rotation_speed: f32,
    pub pulse_speed: f32,
    pub pulse_phase: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filament {
    pub x: f32,
    pub y: f32,
    pub length: f32,
    pub width: f32,
    pub angle: f32,
    pub hue: f32,
    pub color: Rgb,
    pub target: Rgb,
    pub opacity_roll: f32,
    pub rotation_speed: f32,
    pub wave_frequency: f32,
    pub wave_amplitude: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrightStar {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub glow_radius: f32,
    pub opacity_roll: f32,
    pub hue: f32,
    pub color: Rgb,
    pub target: Rgb,
    pub pulse_speed: f32,
    pub pulse_phase: f32,
}

impl BrightStar {
    fn tint(dark: bool, hue: f32) -> Rgb {
        if dark {
            Hsl::new(hue, 80.0, 70.0).to_rgb()
        } else {
            Hsl::new(hue, 70.0, 80.0).to_rgb()
        }
    }

    fn opacity(&self, dark: bool) -> f32 {
        if dark {
            0.4 + self.opacity_roll * 0.6
        } else {
            0.2 + self.opacity_roll * 0.4
        }
    }
}

pub struct NebulaField {
    dust: Vec<DustStar>,
    clouds: Vec<NebulaCloud>,
    filaments: Vec<Filament>,
    bright_stars: Vec<BrightStar>,
    viewport: Viewport,
    dark_mode: bool,
    time: f64,
    rng: StdRng,
}

impl NebulaField {
    pub fn new(settings: &FieldSettings, viewport: Viewport) -> Self {
        let dark = settings.theme.dark_mode;
        let dust_count = (DUST_STAR_COUNT as f32 * settings.density.max(0.0)).round() as usize;

        let mut field = Self {
            dust: Vec::with_capacity(dust_count),
            clouds: Vec::with_capacity(CLOUD_COUNT),
            filaments: Vec::with_capacity(FILAMENT_COUNT),
            bright_stars: Vec::with_capacity(BRIGHT_STAR_COUNT),
            viewport,
            dark_mode: dark,
            time: 0.0,
            rng: settings.rng(),
        };

        for _ in 0..dust_count {
            let star = field.new_dust();
            field.dust.push(star);
        }
        for _ in 0..CLOUD_COUNT {
            let cloud = field.new_cloud();
            field.clouds.push(cloud);
        }
        for _ in 0..FILAMENT_COUNT {
            let filament = field.new_filament();
            field.filaments.push(filament);
        }
        for _ in 0..BRIGHT_STAR_COUNT {
            let star = field.new_bright_star();
            field.bright_stars.push(star);
        }
        field
    }

    pub fn clouds(&self) -> &[NebulaCloud] {
        &self.clouds
    }

    pub fn filaments(&self) -> &[Filament] {
        &self.filaments
    }

    pub fn bright_stars(&self) -> &[BrightStar] {
        &self.bright_stars
    }

    pub fn dust(&self) -> &[DustStar] {
        &self.dust
    }

    fn random_point(&mut self) -> (f32, f32) {
        let w = self.viewport.width.max(1) as f32;
        let h = self.viewport.height.max(1) as f32;
        (self.rng.gen_range(0.0..w), self.rng.gen_range(0.0..h))
    }

    fn dust_color(&self) -> Rgb {
        if self.dark_mode {
            Rgb::WHITE
        } else {
            LIGHT_DUST
        }
    }

    fn new_dust(&mut self) -> DustStar {
        let (x, y) = self.random_point();
        let color = self.dust_color();
        DustStar {
            x,
            y,
            radius: self.rng.gen_range(0.5..2.0),
            opacity: self.rng.gen_range(0.2..1.0),
            twinkle_speed: self.rng.gen_range(0.0005..0.0015),
            color,
            target: color,
        }
    }

    fn new_cloud(&mut self) -> NebulaCloud {
        let (x, y) = self.random_point();
        let hue1 = self.rng.gen_range(0.0..360.0);
        let hue2 = (hue1 + 30.0 + self.rng.gen_range(0.0..60.0)) % 360.0;
        let colors = (
            gas_color(self.dark_mode, hue1, 80.0),
            gas_color(self.dark_mode, hue2, 85.0),
        );
        NebulaCloud {
            x,
            y,
            radius: self.rng.gen_range(150.0..450.0),
            opacity_roll: self.rng.gen_range(0.0..1.0),
            hues: (hue1, hue2),
            colors,
            targets: colors,
            rotation: self.rng.gen_range(0.0..TAU),
            rotation_speed: per_ms(self.rng.gen_range(-0.00005..0.00005)),
            pulse_speed: self.rng.gen_range(0.00005..0.00015),
            pulse_phase: self.rng.gen_range(0.0..TAU),
        }
    }

    fn new_filament(&mut self) -> Filament {
        let (x, y) = self.random_point();
        let hue = self.rng.gen_range(0.0..360.0);
        let color = gas_color(self.dark_mode, hue, 80.0);
        Filament {
            x,
            y,
            length: self.rng.gen_range(200.0..600.0),
            width: self.rng.gen_range(50.0..150.0),
            angle: self.rng.gen_range(0.0..TAU),
            hue,
            color,
            target: color,
            opacity_roll: self.rng.gen_range(0.0..1.0),
            rotation_speed: per_ms(self.rng.gen_range(-0.00005..0.00005)),
            wave_frequency: self.rng.gen_range(0.0005..0.0015),
            wave_amplitude: self.rng.gen_range(10.0..30.0),
        }
    }

    fn new_bright_star(&mut self) -> BrightStar {
        let (x, y) = self.random_point();
        let hue = self.rng.gen_range(200.0..260.0);
        let color = BrightStar::tint(self.dark_mode, hue);
        BrightStar {
            x,
            y,
            radius: self.rng.gen_range(1.0..3.0),
            glow_radius: self.rng.gen_range(20.0..50.0),
            opacity_roll: self.rng.gen_range(0.0..1.0),
            hue,
            color,
            target: color,
            pulse_speed: self.rng.gen_range(0.0001..0.0003),
            pulse_phase: self.rng.gen_range(0.0..TAU),
        }
    }

    /// Re-rolls every element whose anchor lies outside the viewport.
    fn recycle_out_of_bounds(&mut self) {
        let vp = self.viewport;
        let mut recycled = 0usize;

        for i in 0..self.dust.len() {
            if !vp.contains(self.dust[i].x, self.dust[i].y) {
                let (x, y) = self.random_point();
                self.dust[i].x = x;
                self.dust[i].y = y;
                recycled += 1;
            }
        }
        for i in 0..self.clouds.len() {
            if !vp.contains(self.clouds[i].x, self.clouds[i].y) {
                let (x, y) = self.random_point();
                self.clouds[i].x = x;
                self.clouds[i].y = y;
                recycled += 1;
            }
        }
        for i in 0..self.filaments.len() {
            if !vp.contains(self.filaments[i].x, self.filaments[i].y) {
                let (x, y) = self.random_point();
                self.filaments[i].x = x;
                self.filaments[i].y = y;
                recycled += 1;
            }
        }
        for i in 0..self.bright_stars.len() {
            if !vp.contains(self.bright_stars[i].x, self.bright_stars[i].y) {
                let (x, y) = self.random_point();
                self.bright_stars[i].x = x;
                self.bright_stars[i].y = y;
                recycled += 1;
            }
        }

        if recycled > 0 {
            tracing::debug!(recycled, "nebula elements moved into resized viewport");
        }
    }

    fn draw_filament(&self, raster: &mut Raster, filament: &Filament, scale: f32) {
        let opacity = mode_opacity(self.dark_mode, filament.opacity_roll);
        let half = filament.length * scale / 2.0;
        let width = filament.width * scale;
        let wave =
            oscillate(self.time, filament.wave_frequency, 0.0) * filament.wave_amplitude * scale;
        let stops = [
            GradientStop::new(0.0, filament.color, 0.0),
            GradientStop::new(0.2, filament.color, opacity),
            GradientStop::new(0.5, filament.color, opacity * 1.5),
            GradientStop::new(0.8, filament.color, opacity),
            GradientStop::new(1.0, filament.color, 0.0),
        ];

        // the band is bounded above and below by quadratic curves that share
        // their end points and bow with the wave
        let (top_end, top_ctrl) = (-width / 2.0 + wave, -width + wave * 2.0);
        let (bot_end, bot_ctrl) = (width / 2.0 - wave, width - wave * 2.0);
        let quad = |end: f32, ctrl: f32, t: f32| {
            let u = 1.0 - t;
            u * u * end + 2.0 * u * t * ctrl + t * t * end
        };

        let (sin, cos) = filament.angle.sin_cos();
        let extent = half + width + wave.abs() * 2.0;
        let (x0, x1) = ((filament.x - extent).floor() as i32, (filament.x + extent).ceil() as i32);
        let (y0, y1) = ((filament.y - extent).floor() as i32, (filament.y + extent).ceil() as i32);
        for py in y0.max(0)..=y1.min(raster.height() as i32 - 1) {
            for px in x0.max(0)..=x1.min(raster.width() as i32 - 1) {
                let dx = px as f32 + 0.5 - filament.x;
                let dy = py as f32 + 0.5 - filament.y;
                let u = dx * cos + dy * sin;
                let v = -dx * sin + dy * cos;
                if u.abs() > half {
                    continue;
                }
                let t = (u + half) / (2.0 * half);
                let top = quad(top_end, top_ctrl, t);
                let bottom = quad(bot_end, bot_ctrl, t);
                if v < top.min(bottom) || v > top.max(bottom) {
                    continue;
                }
                let (color, alpha) = sample_gradient(&stops, t);
                raster.blend(px, py, color, alpha);
            }
        }
    }

    fn draw_cloud(&self, raster: &mut Raster, cloud: &NebulaCloud, scale: f32) {
        let opacity = mode_opacity(self.dark_mode, cloud.opacity_roll);
        let pulse = oscillate(self.time, cloud.pulse_speed, cloud.pulse_phase) * 0.1 + 0.9;
        let radius = cloud.radius * scale * pulse;
        if radius <= 0.0 {
            return;
        }
        let (c1, c2) = cloud.colors;
        let stops = [
            GradientStop::new(0.0, c1, opacity * 1.5),
            GradientStop::new(0.5, c2, opacity),
            GradientStop::new(1.0, c1, 0.0),
        ];

        let (sin, cos) = cloud.rotation.sin_cos();
        let (x0, x1) = ((cloud.x - radius).floor() as i32, (cloud.x + radius).ceil() as i32);
        let (y0, y1) = ((cloud.y - radius).floor() as i32, (cloud.y + radius).ceil() as i32);
        for py in y0.max(0)..=y1.min(raster.height() as i32 - 1) {
            for px in x0.max(0)..=x1.min(raster.width() as i32 - 1) {
                let dx = px as f32 + 0.5 - cloud.x;
                let dy = py as f32 + 0.5 - cloud.y;
                let u = dx * cos + dy * sin;
                let v = -dx * sin + dy * cos;

                // irregular squashed outline: three lobes that slowly drift
                let theta = (v / 0.6).atan2(u);
                let reach = radius * (0.7 + oscillate(self.time, 0.0001, theta * 3.0) * 0.3);
                if (u * u + (v / 0.6).powi(2)).sqrt() > reach {
                    continue;
                }
                let d = (dx * dx + dy * dy).sqrt();
                let (color, alpha) = sample_gradient(&stops, d / radius);
                raster.blend(px, py, color, alpha);
            }
        }
    }

    fn draw_bright_star(&self, raster: &mut Raster, star: &BrightStar, scale: f32) {
        let pulse = oscillate(self.time, star.pulse_speed, star.pulse_phase) * 0.2 + 0.8;
        let opacity = star.opacity(self.dark_mode);
        raster.fill_radial(
            star.x,
            star.y,
            (star.glow_radius * scale * pulse).max(1.0),
            &[
                GradientStop::new(0.0, star.color, opacity * pulse),
                GradientStop::new(0.5, star.color, opacity * 0.5 * pulse),
                GradientStop::new(1.0, star.color, 0.0),
            ],
        );
        raster.fill_disc(star.x, star.y, star.radius * scale * pulse, star.color, 1.0);
        let spike = (star.radius * 4.0 * pulse * scale * 2.0).max(1.0);
        raster.cross(star.x, star.y, spike, star.color, 0.8);
    }
}

impl ParticleField for NebulaField {
    fn style(&self) -> BackgroundStyle {
        BackgroundStyle::Nebula
    }

    fn population(&self) -> usize {
        self.dust.len() + self.clouds.len() + self.filaments.len() + self.bright_stars.len()
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if !viewport.is_empty() {
            self.recycle_out_of_bounds();
        }
    }

    fn advance(&mut self, elapsed_ms: f32) {
        self.time += elapsed_ms as f64;
        for cloud in &mut self.clouds {
            cloud.rotation = (cloud.rotation + cloud.rotation_speed * elapsed_ms).rem_euclid(TAU);
        }
        for filament in &mut self.filaments {
            filament.angle = (filament.angle + filament.rotation_speed * elapsed_ms).rem_euclid(TAU);
        }
    }

    fn elapsed_ms(&self) -> f64 {
        self.time
    }

    fn transition_colors(&mut self) {
        for star in &mut self.dust {
            star.color.approach(star.target, COLOR_TRANSITION_RATE);
        }
        for cloud in &mut self.clouds {
            cloud.colors.0.approach(cloud.targets.0, COLOR_TRANSITION_RATE);
            cloud.colors.1.approach(cloud.targets.1, COLOR_TRANSITION_RATE);
        }
        for filament in &mut self.filaments {
            filament.color.approach(filament.target, COLOR_TRANSITION_RATE);
        }
        for star in &mut self.bright_stars {
            star.color.approach(star.target, COLOR_TRANSITION_RATE);
        }
    }

    fn retint(&mut self, theme: &ThemeState) {
        let dark = theme.dark_mode;
        self.dark_mode = dark;
        let dust = self.dust_color();
        for star in &mut self.dust {
            star.target = dust;
        }
        for cloud in &mut self.clouds {
            cloud.targets = (
                gas_color(dark, cloud.hues.0, 80.0),
                gas_color(dark, cloud.hues.1, 85.0),
            );
        }
        for filament in &mut self.filaments {
            filament.target = gas_color(dark, filament.hue, 80.0);
        }
        for star in &mut self.bright_stars {
            star.target = BrightStar::tint(dark, star.hue);
        }
    }

    fn draw(&self, raster: &mut Raster) {
        raster.fill(if self.dark_mode {
            DARK_BACKDROP
        } else {
            LIGHT_BACKDROP
        });

        let scale = reference_scale(self.viewport);
        for filament in &self.filaments {
            self.draw_filament(raster, filament, scale);
        }
        for cloud in &self.clouds {
            self.draw_cloud(raster, cloud, scale);
        }
        for star in &self.bright_stars {
            self.draw_bright_star(raster, star, scale);
        }

        let dust_alpha = if self.dark_mode { 1.0 } else { 0.8 };
        for star in &self.dust {
            let twinkle = oscillate(self.time, star.twinkle_speed, 0.0) * 0.3 + 0.7;
            raster.fill_disc(
                star.x,
                star.y,
                star.radius * scale,
                star.color,
                star.opacity * twinkle * dust_alpha,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(dark: bool) -> NebulaField {
        let mut settings = FieldSettings {
            seed: Some(11),
            density: 0.1,
            ..FieldSettings::default()
        };
        settings.theme.dark_mode = dark;
        settings.theme.background_style = BackgroundStyle::Nebula;
        NebulaField::new(&settings, Viewport::new(200, 100))
    }

    #[test]
    fn test_population_counts() {
        let field = field(true);
        assert_eq!(field.dust().len(), 70);
        assert_eq!(field.clouds().len(), CLOUD_COUNT);
        assert_eq!(field.filaments().len(), FILAMENT_COUNT);
        assert_eq!(field.bright_stars().len(), BRIGHT_STAR_COUNT);
        assert_eq!(field.population(), 70 + 8 + 5 + 12);
    }

    #[test]
    fn test_resize_recycles_into_bounds() {
        let mut field = field(true);
        let before = field.population();
        field.resize(Viewport::new(40, 20));
        assert_eq!(field.population(), before);
        let vp = Viewport::new(40, 20);
        assert!(field.dust().iter().all(|s| vp.contains(s.x, s.y)));
        assert!(field.clouds().iter().all(|c| vp.contains(c.x, c.y)));
        assert!(field.filaments().iter().all(|f| vp.contains(f.x, f.y)));
        assert!(field.bright_stars().iter().all(|s| vp.contains(s.x, s.y)));
    }

    #[test]
    fn test_rotation_is_time_scaled() {
        let mut a = field(true);
        let mut b = field(true);
        a.advance(160.0);
        for _ in 0..16 {
            b.advance(10.0);
        }
        for (ca, cb) in a.clouds().iter().zip(b.clouds()) {
            assert!((ca.rotation - cb.rotation).abs() < 1e-4);
        }
    }

    #[test]
    fn test_backdrop_by_mode() {
        let mut raster = Raster::new(200, 100);
        let mut dark = field(true);
        dark.dust.clear();
        dark.clouds.clear();
        dark.filaments.clear();
        dark.bright_stars.clear();
        dark.draw(&mut raster);
        assert_eq!(raster.pixel(0, 0), Some(DARK_BACKDROP));

        dark.retint(&ThemeState {
            dark_mode: false,
            ..ThemeState::default()
        });
        dark.draw(&mut raster);
        assert_eq!(raster.pixel(199, 99), Some(LIGHT_BACKDROP));
    }

    #[test]
    fn test_retint_moves_toward_light_palette() {
        let mut field = field(true);
        let light = ThemeState {
            dark_mode: false,
            ..ThemeState::default()
        };
        field.retint(&light);
        let d0 = field.clouds()[0].colors.0.distance(field.clouds()[0].targets.0);
        for _ in 0..100 {
            field.transition_colors();
        }
        let d1 = field.clouds()[0].colors.0.distance(field.clouds()[0].targets.0);
        assert!(d1 < d0);
        assert_eq!(field.dust()[0].target, LIGHT_DUST);
    }

    #[test]
    fn test_draw_changes_pixels_in_dark_mode() {
        let field = field(true);
        let mut raster = Raster::new(200, 100);
        field.draw(&mut raster);
        let lit = (0..100)
            .flat_map(|y| (0..200).map(move |x| (x, y)))
            .filter(|(x, y)| raster.pixel(*x, *y) != Some(DARK_BACKDROP))
            .count();
        assert!(lit > 0);
    }
}
