use crate::engine::ParticleField;
use crate::host::{FrameHandle, FrameId, Host, HostEvent, ListenerGuard, ListenerKind, Surface};
use crate::raster::Raster;
use crate::theme::{BackgroundStyle, ThemeState};
use tracing::{debug, error, trace};

// ============================================================================
// PARTICLE SESSION
// ============================================================================

pub struct ParticleFieldSession {
    field: Box<dyn ParticleField>,
    host: Host,
    surface: Option<Surface>,
    listeners: Vec<ListenerGuard>,
    frame: Option<FrameHandle>,
    alive: bool,
    started: bool,
    paused: bool,
    prev_time: Option<f64>,
    frames: u64,
}

impl std::fmt::Debug for ParticleFieldSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleFieldSession")
            .field("style", &self.field.style())
            .field("alive", &self.alive)
            .field("started", &self.started)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl ParticleFieldSession {
    pub fn new(field: Box<dyn ParticleField>, host: Host) -> Self {
        Self {
            field,
            host,
            surface: None,
            listeners: Vec::new(),
            frame: None,
            alive: true,
            started: false,
            paused: false,
            prev_time: None,
            frames: 0,
        }
    }

    /// Acquires the surface and listeners and schedules the first frame.
    ///
    /// Returns `false` when the session stays inert: already started,
    /// already disposed, or no surface could be had. A missing surface is
    /// logged and otherwise ignored; the backdrop is decoration.
    pub fn start(&mut self) -> bool {
        if !self.alive || self.started {
            return false;
        }
        self.started = true;

        let surface = match self.host.acquire_surface() {
            Ok(surface) => surface,
            Err(err) => {
                error!(%err, style = %self.field.style(), "no drawing surface, background disabled");
                return false;
            }
        };
        self.field.resize(surface.viewport());
        self.surface = Some(surface);

        self.listeners.push(self.host.listen(ListenerKind::Resize));
        if self.field.wants_pointer() {
            self.listeners.push(self.host.listen(ListenerKind::PointerMove));
        }
        self.frame = Some(self.host.request_frame());

        debug!(
            style = %self.field.style(),
            population = self.field.population(),
            "particle session started"
        );
        true
    }

    /// Releases the frame, listeners and surface. Safe to call any number of
    /// times, including before `start`.
    pub fn dispose(&mut self) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.frame = None;
        self.listeners.clear();
        self.surface = None;
        debug!(style = %self.field.style(), frames = self.frames, "particle session disposed");
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Alive and holding a surface.
    pub fn is_running(&self) -> bool {
        self.alive && self.surface.is_some()
    }

    pub fn style(&self) -> BackgroundStyle {
        self.field.style()
    }

    pub fn population(&self) -> usize {
        self.field.population()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn field(&self) -> &dyn ParticleField {
        self.field.as_ref()
    }

    pub fn raster(&self) -> Option<&Raster> {
        self.surface.as_ref().map(Surface::raster)
    }

    pub fn pending_frame(&self) -> Option<FrameId> {
        self.frame.as_ref().map(FrameHandle::id)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// While paused, frames keep drawing but simulation time stands still.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Starts a smooth color transition toward the new theme.
    pub fn retint(&mut self, theme: &ThemeState) {
        if self.alive {
            self.field.retint(theme);
        }
    }

    /// Runs one frame if `id` is the frame this session is waiting on.
    pub fn on_frame(&mut self, id: FrameId, now_ms: f64) -> bool {
        if !self.alive || self.pending_frame() != Some(id) {
            return false;
        }
        // fired; the handle no longer has anything to cancel
        self.frame = None;

        let elapsed = self.prev_time.map_or(0.0, |prev| (now_ms - prev).max(0.0));
        self.prev_time = Some(now_ms);

        if !self.paused && elapsed > 0.0 {
            self.field.advance(elapsed as f32);
        }
        if let Some(surface) = self.surface.as_mut() {
            self.field.draw(surface.raster_mut());
        }
        self.field.transition_colors();
        self.frames += 1;

        self.frame = Some(self.host.request_frame());
        trace!(id, elapsed, "frame");
        true
    }

    /// Delivers an input event if the session is alive and holds a listener
    /// for it. Returns whether the event was consumed.
    pub fn handle_event(&mut self, event: &HostEvent) -> bool {
        if !self.alive {
            return false;
        }
        let kind = event.kind();
        if !self
            .listeners
            .iter()
            .any(|l| l.kind() == kind && l.is_active())
        {
            return false;
        }

        match *event {
            HostEvent::Resize(viewport) => {
                if let Some(surface) = self.surface.as_mut() {
                    surface.resize(viewport);
                }
                self.field.resize(viewport);
            }
            HostEvent::PointerMove { x, y } => self.field.set_pointer(Some((x, y))),
            HostEvent::PointerLeave => self.field.set_pointer(None),
        }
        true
    }
}

impl Drop for ParticleFieldSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{build_field, FieldSettings};
    use crate::host::Viewport;

    fn session(host: &Host, style: BackgroundStyle) -> ParticleFieldSession {
        let mut settings = FieldSettings {
            seed: Some(42),
            star_count: 100,
            density: 0.1,
            ..FieldSettings::default()
        };
        settings.theme.background_style = style;
        ParticleFieldSession::new(build_field(&settings, host.viewport()), host.clone())
    }

    #[test]
    fn test_dispose_before_start_is_noop() {
        let host = Host::new(Viewport::new(80, 40));
        let mut s = session(&host, BackgroundStyle::Starfield);
        s.dispose();
        s.dispose();
        assert!(!s.is_alive());
        assert!(!s.start());
        assert_eq!(host.live_surfaces(), 0);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_start_acquires_and_dispose_releases() {
        let host = Host::new(Viewport::new(80, 40));
        let mut s = session(&host, BackgroundStyle::Starfield);
        assert!(s.start());
        assert!(!s.start());
        assert_eq!(host.live_surfaces(), 1);
        assert_eq!(host.listener_count(ListenerKind::Resize), 1);
        assert_eq!(host.listener_count(ListenerKind::PointerMove), 1);
        assert_eq!(host.pending_frames(), 1);

        s.dispose();
        assert_eq!(host.live_surfaces(), 0);
        assert_eq!(host.listener_count(ListenerKind::Resize), 0);
        assert_eq!(host.listener_count(ListenerKind::PointerMove), 0);
        assert_eq!(host.pending_frames(), 0);

        s.dispose();
        assert_eq!(host.live_surfaces(), 0);
    }

    #[test]
    fn test_nebula_has_no_pointer_listener() {
        let host = Host::new(Viewport::new(80, 40));
        let mut s = session(&host, BackgroundStyle::Nebula);
        s.start();
        assert_eq!(host.listener_count(ListenerKind::Resize), 1);
        assert_eq!(host.listener_count(ListenerKind::PointerMove), 0);
    }

    #[test]
    fn test_frames_chain_until_disposed() {
        let host = Host::new(Viewport::new(80, 40));
        let mut s = session(&host, BackgroundStyle::Starfield);
        s.start();
        let mut now = 0.0;
        for _ in 0..5 {
            let due = host.take_due_frames();
            assert_eq!(due.len(), 1);
            assert!(s.on_frame(due[0], now));
            now += 16.0;
        }
        assert_eq!(s.frames(), 5);

        let stale = host.take_due_frames();
        s.dispose();
        assert!(!s.on_frame(stale[0], now));
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_paused_frames_hold_the_field_still() {
        let host = Host::new(Viewport::new(80, 40));
        let mut s = session(&host, BackgroundStyle::Starfield);
        s.start();
        let fire = |s: &mut ParticleFieldSession, now: f64| {
            let due = host.take_due_frames();
            assert!(s.on_frame(due[0], now));
        };
        fire(&mut s, 0.0);
        fire(&mut s, 16.0);
        assert_eq!(s.field().elapsed_ms(), 16.0);

        s.set_paused(true);
        fire(&mut s, 32.0);
        let frozen = s.raster().cloned();
        assert!(frozen.is_some());
        for now in [100.0, 1_000.0, 60_000.0] {
            fire(&mut s, now);
            assert_eq!(s.field().elapsed_ms(), 16.0);
            assert_eq!(s.raster().cloned(), frozen);
        }
        assert_eq!(s.frames(), 6);

        // the paused stretch is not replayed on resume
        s.set_paused(false);
        fire(&mut s, 60_016.0);
        assert_eq!(s.field().elapsed_ms(), 32.0);
        assert_ne!(s.raster().cloned(), frozen);
    }

    #[test]
    fn test_missing_surface_stays_inert() {
        let host = Host::new(Viewport::new(80, 40));
        host.set_surfaces_enabled(false);
        let mut s = session(&host, BackgroundStyle::Starfield);
        assert!(!s.start());
        assert!(s.is_alive());
        assert!(!s.is_running());
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.listener_count(ListenerKind::Resize), 0);
    }

    #[test]
    fn test_resize_after_dispose_is_ignored() {
        let host = Host::new(Viewport::new(80, 40));
        let mut s = session(&host, BackgroundStyle::Starfield);
        s.start();
        assert!(s.handle_event(&HostEvent::Resize(Viewport::new(60, 30))));
        assert_eq!(s.raster().map(Raster::width), Some(60));
        s.dispose();
        assert!(!s.handle_event(&HostEvent::Resize(Viewport::new(100, 50))));
    }

    #[test]
    fn test_drop_disposes() {
        let host = Host::new(Viewport::new(80, 40));
        {
            let mut s = session(&host, BackgroundStyle::Nebula);
            s.start();
            assert_eq!(host.live_surfaces(), 1);
        }
        assert_eq!(host.live_surfaces(), 0);
        assert_eq!(host.pending_frames(), 0);
    }
}
