use starscape::controller::BackgroundController;
use starscape::engine::FieldSettings;
use starscape::host::{Host, HostEvent, ListenerKind, Viewport};
use starscape::prefs::MemoryPreferences;
use starscape::store::ThemeStore;
use starscape::theme::{BackgroundStyle, ColorScheme, ThemeState};

fn setup() -> (ThemeStore, BackgroundController, Host) {
    let host = Host::new(Viewport::new(120, 60));
    let mut store = ThemeStore::load(Box::new(MemoryPreferences::new()), ThemeState::default());
    let settings = FieldSettings {
        seed: Some(11),
        star_count: 120,
        density: 0.1,
        ..FieldSettings::default()
    };
    let mut controller = BackgroundController::new(host.clone(), store.subscribe(), settings);
    controller.mount(store.snapshot());
    (store, controller, host)
}

/// Drives a few frames so every session has a chain in flight.
fn run_frames(controller: &mut BackgroundController, start_ms: f64, frames: usize) -> f64 {
    let mut now = start_ms;
    for _ in 0..frames {
        controller.run_due_frames(now);
        now += 16.0;
    }
    now
}

#[test]
fn starfield_to_nebula_and_back_leaves_one_engine() {
    let (mut store, mut controller, host) = setup();
    let now = run_frames(&mut controller, 0.0, 3);

    store.set_background_style(BackgroundStyle::Nebula);
    controller.sync();
    let now = run_frames(&mut controller, now, 3);

    store.set_background_style(BackgroundStyle::Starfield);
    controller.sync();
    run_frames(&mut controller, now, 3);

    assert_eq!(controller.active_style(), Some(BackgroundStyle::Starfield));
    assert_eq!(host.live_surfaces(), 1);
    assert_eq!(host.pending_frames(), 1);
    assert_eq!(host.listener_count(ListenerKind::Resize), 1);
    assert_eq!(host.listener_count(ListenerKind::PointerMove), 1);
}

#[test]
fn rapid_toggles_never_leave_two_surfaces() {
    let (mut store, mut controller, host) = setup();
    for i in 0..10 {
        store.toggle_background_style();
        controller.sync();
        assert!(host.live_surfaces() <= 1);
        if i % 3 == 0 {
            controller.run_due_frames(i as f64 * 5.0);
        }
    }
    assert_eq!(host.live_surfaces(), 1);
    assert_eq!(host.pending_frames(), 1);
    assert_eq!(controller.sessions_started(), 11);
}

#[test]
fn toggles_batched_between_syncs_settle_on_final_style() {
    let (mut store, mut controller, host) = setup();
    for _ in 0..5 {
        store.toggle_background_style();
    }
    controller.sync();
    assert_eq!(controller.active_style(), Some(BackgroundStyle::Nebula));
    assert_eq!(host.live_surfaces(), 1);
}

#[test]
fn mode_and_scheme_changes_keep_the_session() {
    let (mut store, mut controller, host) = setup();
    run_frames(&mut controller, 0.0, 2);
    store.set_dark_mode(false);
    store.set_color_scheme(Some(ColorScheme::Violet));
    controller.sync();
    run_frames(&mut controller, 32.0, 2);

    assert_eq!(controller.sessions_started(), 1);
    assert!(controller.session().map_or(0, |s| s.frames()) >= 4);
    assert_eq!(host.live_surfaces(), 1);
}

#[test]
fn stale_frame_from_disposed_session_is_ignored() {
    let (mut store, mut controller, host) = setup();
    let stale = host.take_due_frames();
    assert_eq!(stale.len(), 1);

    store.toggle_background_style();
    controller.sync();
    assert!(!controller.on_frame(stale[0], 0.0));

    let fresh = host.take_due_frames();
    assert_eq!(fresh.len(), 1);
    assert!(controller.on_frame(fresh[0], 0.0));
}

#[test]
fn resize_after_unmount_is_ignored() {
    let (_store, mut controller, host) = setup();
    controller.unmount();
    assert!(!controller.handle_event(&HostEvent::Resize(Viewport::new(40, 20))));
    assert_eq!(host.live_surfaces(), 0);
    assert_eq!(host.listener_count(ListenerKind::Resize), 0);
}

#[test]
fn missing_surface_degrades_to_no_background() {
    let host = Host::new(Viewport::new(80, 40));
    host.set_surfaces_enabled(false);
    let mut store = ThemeStore::load(Box::new(MemoryPreferences::new()), ThemeState::default());
    let mut controller =
        BackgroundController::new(host.clone(), store.subscribe(), FieldSettings::default());
    controller.mount(store.snapshot());

    assert!(controller.raster().is_none());
    assert_eq!(controller.run_due_frames(0.0), 0);
    assert_eq!(host.pending_frames(), 0);
}
