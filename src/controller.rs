use crate::engine::{build_field, FieldSettings};
use crate::host::{FrameId, Host, HostEvent};
use crate::raster::Raster;
use crate::session::ParticleFieldSession;
use crate::store::{ThemeChange, ThemeField};
use crate::theme::{BackgroundStyle, ThemeState};
use crossbeam_channel::Receiver;
use tracing::{debug, info};

// ============================================================================
// BACKGROUND CONTROLLER
// ============================================================================

// A style change disposes the running session before the next one is built.

#[derive(Debug)]
pub enum ControllerState {
    Idle,
    Active(ParticleFieldSession),
}

pub struct BackgroundController {
    host: Host,
    changes: Receiver<ThemeChange>,
    settings: FieldSettings,
    state: ControllerState,
    paused: bool,
    sessions_started: u64,
}

impl BackgroundController {
    /// `settings.theme` is replaced by the theme snapshot on mount.
    pub fn new(host: Host, changes: Receiver<ThemeChange>, settings: FieldSettings) -> Self {
        Self {
            host,
            changes,
            settings,
            state: ControllerState::Idle,
            paused: false,
            sessions_started: 0,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ControllerState::Idle)
    }

    pub fn active_style(&self) -> Option<BackgroundStyle> {
        match &self.state {
            ControllerState::Active(session) => Some(session.style()),
            ControllerState::Idle => None,
        }
    }

    pub fn session(&self) -> Option<&ParticleFieldSession> {
        match &self.state {
            ControllerState::Active(session) => Some(session),
            ControllerState::Idle => None,
        }
    }

    /// Number of sessions constructed over the controller's lifetime.
    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    pub fn raster(&self) -> Option<&Raster> {
        self.session().and_then(ParticleFieldSession::raster)
    }

    /// Idle to Active with the engine for `theme`. Mounting twice is a no-op.
    pub fn mount(&mut self, theme: ThemeState) {
        if !self.is_idle() {
            return;
        }
        info!(style = %theme.background_style, "mounting background");
        self.activate(theme);
    }

    /// Disposes the running session and returns to Idle.
    pub fn unmount(&mut self) {
        if let ControllerState::Active(mut session) =
            std::mem::replace(&mut self.state, ControllerState::Idle)
        {
            session.dispose();
            info!("background unmounted");
        }
    }

    fn activate(&mut self, theme: ThemeState) {
        // the old session must be gone before the new one asks for a surface
        self.unmount();

        self.settings.theme = theme;
        let field = build_field(&self.settings, self.host.viewport());
        let mut session = ParticleFieldSession::new(field, self.host.clone());
        session.set_paused(self.paused);
        session.start();
        self.sessions_started += 1;
        self.state = ControllerState::Active(session);
    }

    /// Applies every pending theme change. Returns how many were handled.
    pub fn sync(&mut self) -> usize {
        let changes: Vec<ThemeChange> = self.changes.try_iter().collect();
        for change in &changes {
            self.apply(change);
        }
        changes.len()
    }

    fn apply(&mut self, change: &ThemeChange) {
        if self.is_idle() {
            // keep the latest theme for when we mount
            self.settings.theme = change.current;
            return;
        }
        match change.field {
            ThemeField::BackgroundStyle => {
                if self.active_style() != Some(change.current.background_style) {
                    debug!(
                        from = ?self.active_style(),
                        to = %change.current.background_style,
                        "switching background"
                    );
                    self.activate(change.current);
                }
            }
            ThemeField::DarkMode | ThemeField::ColorScheme => {
                self.settings.theme = change.current;
                if let ControllerState::Active(session) = &mut self.state {
                    session.retint(&change.current);
                }
            }
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        if let ControllerState::Active(session) = &mut self.state {
            session.set_paused(paused);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Forwards a fired frame to the active session.
    pub fn on_frame(&mut self, id: FrameId, now_ms: f64) -> bool {
        match &mut self.state {
            ControllerState::Active(session) => session.on_frame(id, now_ms),
            ControllerState::Idle => false,
        }
    }

    /// Runs every due frame.
    pub fn run_due_frames(&mut self, now_ms: f64) -> usize {
        self.host
            .take_due_frames()
            .into_iter()
            .filter(|id| self.on_frame(*id, now_ms))
            .count()
    }

    /// Tracks the viewport on the host and forwards the event.
    pub fn handle_event(&mut self, event: &HostEvent) -> bool {
        if let HostEvent::Resize(viewport) = event {
            self.host.set_viewport(*viewport);
        }
        match &mut self.state {
            ControllerState::Active(session) => session.handle_event(event),
            ControllerState::Idle => false,
        }
    }
}

impl Drop for BackgroundController {
    fn drop(&mut self) {
        self.unmount();
    }
}
