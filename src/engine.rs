use crate::host::Viewport;
use crate::nebula::NebulaField;
use crate::raster::Raster;
use crate::starfield::StarField;
use crate::theme::{BackgroundStyle, ThemeState};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// PARTICLE FIELDS
// ============================================================================

/// Fraction of the remaining distance a particle color moves toward its
/// target each frame.
pub const COLOR_TRANSITION_RATE: f32 = 0.01;

/// Nominal frame length the per-frame motion constants were tuned at.
pub const REFERENCE_FRAME_MS: f32 = 1000.0 / 60.0;

/// Width of the reference screen the geometry constants are expressed in.
pub const REFERENCE_WIDTH: f32 = 1600.0;

/// Height of the reference screen the geometry constants are expressed in.
pub const REFERENCE_HEIGHT: f32 = 900.0;

pub trait ParticleField {
    fn style(&self) -> BackgroundStyle;

    /// Number of particles of every kind. Constant for the life of a field.
    fn population(&self) -> usize;

    /// Whether the field reacts to pointer movement.
    fn wants_pointer(&self) -> bool {
        false
    }

    /// Pointer position in raster pixels, `None` once it leaves.
    fn set_pointer(&mut self, _pointer: Option<(f32, f32)>) {}

    fn resize(&mut self, viewport: Viewport);

    /// Advances the simulation clock and every particle by `elapsed_ms`.
    fn advance(&mut self, elapsed_ms: f32);

    /// Simulation time accumulated by `advance`.
    fn elapsed_ms(&self) -> f64;

    /// Moves every particle color one step toward its target.
    fn transition_colors(&mut self);

    /// Recomputes target colors (and the backdrop) for a new theme without
    /// rebuilding the population.
    fn retint(&mut self, theme: &ThemeState);

    /// Clears `raster` to the backdrop and draws every visible particle.
    fn draw(&self, raster: &mut Raster);
}

/// Construction inputs for a field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSettings {
    pub theme: ThemeState,
    /// Starfield population before the dark/light density factor.
    pub star_count: usize,
    /// Starfield depth units travelled per millisecond.
    pub speed_factor: f32,
    /// Multiplier on the nebula's dust star count.
    pub density: f32,
    /// Fixed seed for reproducible fields.
    pub seed: Option<u64>,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            theme: ThemeState::default(),
            star_count: 600,
            speed_factor: 0.02,
            density: 0.4,
            seed: None,
        }
    }
}

impl FieldSettings {
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// `sin(time * speed + phase)` with the product taken in f64, so phases stay
/// smooth however long the field has been running.
pub fn oscillate(time_ms: f64, speed: f32, phase: f32) -> f32 {
    (time_ms * f64::from(speed) + f64::from(phase)).sin() as f32
}

/// Builds the field for the settings' background style.
pub fn build_field(settings: &FieldSettings, viewport: Viewport) -> Box<dyn ParticleField> {
    match settings.theme.background_style {
        BackgroundStyle::Starfield => Box::new(StarField::new(settings, viewport)),
        BackgroundStyle::Nebula => Box::new(NebulaField::new(settings, viewport)),
    }
}

/// Scale from reference pixels to raster pixels.
pub fn reference_scale(viewport: Viewport) -> f32 {
    (viewport.width as f32 / REFERENCE_WIDTH).max(viewport.height as f32 / REFERENCE_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_field_matches_style() {
        let mut settings = FieldSettings {
            seed: Some(7),
            ..FieldSettings::default()
        };
        let vp = Viewport::new(160, 90);
        assert_eq!(build_field(&settings, vp).style(), BackgroundStyle::Starfield);
        settings.theme.background_style = BackgroundStyle::Nebula;
        assert_eq!(build_field(&settings, vp).style(), BackgroundStyle::Nebula);
    }

    #[test]
    fn test_oscillate_keeps_precision_after_long_runs() {
        // about eleven days in; f32 can no longer tell these frames apart
        let start = 1.0e9_f64;
        assert_eq!(start as f32, (start + 16.0) as f32);

        let (speed, phase) = (0.005_f32, 0.3_f32);
        let mut prev = None;
        for frame in 0..4 {
            let t = start + 16.0 * f64::from(frame);
            let value = oscillate(t, speed, phase);
            let reference = (t * f64::from(speed) + f64::from(phase)).sin();
            assert!((f64::from(value) - reference).abs() < 1e-6);
            assert_ne!(Some(value), prev);
            prev = Some(value);
        }
    }

    #[test]
    fn test_reference_scale() {
        assert_eq!(reference_scale(Viewport::new(160, 45)), 0.1);
        assert_eq!(reference_scale(Viewport::new(16, 90)), 0.1);
    }
}
