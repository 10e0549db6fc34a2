use crate::config::Config;
use crate::controller::BackgroundController;
use crate::host::{Host, HostEvent, Viewport};
use crate::keys::matches_any;
use crate::overlay::Overlay;
use crate::raster::Raster;
use crate::store::{ThemeChange, ThemeStore};
use crate::theme::ThemeState;
use crossbeam_channel::Receiver;
use crossterm::event::{Event, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use tracing::{debug, info};

// ============================================================================
// APPLICATION STATE
// ============================================================================

pub struct App {
    pub config: Config,
    store: ThemeStore,
    host: Host,
    controller: BackgroundController,
    overlay: Overlay,
    overlay_changes: Receiver<ThemeChange>,
    canvas: Option<Raster>,
    should_quit: bool,
}

impl App {
    /// Wires the store to the controller and the overlay and mounts the
    /// background for a terminal of `cols` x `rows`.
    pub fn new(config: Config, mut store: ThemeStore, cols: u16, rows: u16) -> Self {
        let host = Host::new(Viewport::from_terminal(cols, rows));
        let settings = config.background.field_settings();
        let mut controller = BackgroundController::new(host.clone(), store.subscribe(), settings);
        let overlay_changes = store.subscribe();

        let theme = store.snapshot();
        controller.mount(theme);

        Self {
            config,
            store,
            host,
            controller,
            overlay: Overlay::new(&theme),
            overlay_changes,
            canvas: None,
            should_quit: false,
        }
    }

    pub fn theme(&self) -> ThemeState {
        self.store.snapshot()
    }

    pub fn store(&self) -> &ThemeStore {
        &self.store
    }

    pub fn controller(&self) -> &BackgroundController {
        &self.controller
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn is_paused(&self) -> bool {
        self.controller.is_paused()
    }

    /// Last composed frame: the particle field with the overlay on top.
    pub fn canvas(&self) -> Option<&Raster> {
        self.canvas.as_ref()
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn toggle_style(&mut self) {
        let style = self.store.toggle_background_style();
        info!(%style, "background style toggled");
        self.sync();
    }

    pub fn toggle_mode(&mut self) {
        let dark = self.store.toggle_dark_mode();
        info!(dark, "theme mode toggled");
        self.sync();
    }

    pub fn next_scheme(&mut self) {
        let scheme = self.store.cycle_color_scheme();
        info!(?scheme, "color scheme changed");
        self.sync();
    }

    pub fn toggle_pause(&mut self) {
        let paused = !self.controller.is_paused();
        self.controller.set_paused(paused);
        debug!(paused, "pause toggled");
    }

    /// Delivers pending theme changes to the background and the overlay.
    fn sync(&mut self) {
        self.controller.sync();
        for change in self.overlay_changes.try_iter() {
            self.overlay.apply(&change.current);
        }
    }

    /// Runs due frames and recomposes the canvas. Returns whether anything
    /// new was drawn.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        if self.controller.run_due_frames(now_ms) == 0 {
            return false;
        }
        self.compose();
        true
    }

    fn compose(&mut self) {
        let Some(raster) = self.controller.raster() else {
            self.canvas = None;
            return;
        };
        let canvas = self.canvas.get_or_insert_with(|| Raster::new(0, 0));
        canvas.clone_from(raster);
        self.overlay.render(canvas);
    }

    // ========================================================================
    // INPUT
    // ========================================================================

    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(cols, rows) => {
                let viewport = Viewport::from_terminal(*cols, *rows);
                debug!(width = viewport.width, height = viewport.height, "resize");
                self.controller.handle_event(&HostEvent::Resize(viewport));
            }
            Event::FocusLost => {
                self.controller.handle_event(&HostEvent::PointerLeave);
            }
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent) {
        let keys = &self.config.keys;
        if matches_any(&keys.quit, key) {
            self.quit();
        } else if matches_any(&keys.toggle_style, key) {
            self.toggle_style();
        } else if matches_any(&keys.toggle_mode, key) {
            self.toggle_mode();
        } else if matches_any(&keys.next_scheme, key) {
            self.next_scheme();
        } else if matches_any(&keys.pause, key) {
            self.toggle_pause();
        }
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent) {
        if let MouseEventKind::Moved | MouseEventKind::Drag(_) = mouse.kind {
            // center of the cell, in half-block pixels
            let event = HostEvent::PointerMove {
                x: mouse.column as f32 + 0.5,
                y: mouse.row as f32 * 2.0 + 1.0,
            };
            self.controller.handle_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ListenerKind;
    use crate::prefs::MemoryPreferences;
    use crate::theme::BackgroundStyle;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn app() -> App {
        let mut config = Config::default();
        config.background.seed = Some(3);
        config.background.star_count = 80;
        config.background.density = 0.05;
        let store = ThemeStore::load(Box::new(MemoryPreferences::new()), ThemeState::default());
        App::new(config, store, 40, 12)
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn test_mounts_on_creation() {
        let app = app();
        assert_eq!(app.controller().active_style(), Some(BackgroundStyle::Starfield));
        assert_eq!(app.host().live_surfaces(), 1);
        assert_eq!(app.host().viewport(), Viewport::new(40, 24));
    }

    #[test]
    fn test_keys_drive_theme() {
        let mut app = app();
        app.handle_event(&key('s'));
        assert_eq!(app.theme().background_style, BackgroundStyle::Nebula);
        assert_eq!(app.controller().active_style(), Some(BackgroundStyle::Nebula));

        app.handle_event(&key('m'));
        assert!(!app.theme().dark_mode);
        assert!(!app.overlay().gradient().is_none());

        app.handle_event(&key('c'));
        assert!(app.theme().color_scheme.is_some());

        app.handle_event(&key('p'));
        assert!(app.is_paused());

        app.handle_event(&key('q'));
        assert!(app.should_quit());
    }

    #[test]
    fn test_tick_composes_canvas() {
        let mut app = app();
        assert!(app.canvas().is_none());
        assert!(app.tick(0.0));
        assert_eq!(app.canvas().map(Raster::width), Some(40));
        assert!(app.tick(16.0));
    }

    #[test]
    fn test_resize_reaches_host_and_session() {
        let mut app = app();
        app.handle_event(&Event::Resize(60, 20));
        assert_eq!(app.host().viewport(), Viewport::new(60, 40));
        app.tick(0.0);
        assert_eq!(app.canvas().map(Raster::height), Some(40));
    }

    #[test]
    fn test_rapid_toggles_keep_one_surface() {
        let mut app = app();
        for _ in 0..10 {
            app.handle_event(&key('s'));
        }
        assert_eq!(app.host().live_surfaces(), 1);
        assert_eq!(app.host().pending_frames(), 1);
        assert_eq!(app.host().listener_count(ListenerKind::PointerMove), 1);
    }
}
