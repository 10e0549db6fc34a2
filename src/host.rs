use crate::error::HostError;
use crate::raster::Raster;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use tracing::trace;

// ============================================================================
// HOST
// ============================================================================

// Every acquisition hands back a guard that releases the resource on drop.

/// Drawing area in raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// A terminal of `cols` x `rows` cells holds two pixels per cell
    /// vertically.
    pub fn from_terminal(cols: u16, rows: u16) -> Self {
        Self::new(cols, rows.saturating_mul(2))
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= 0.0 && y >= 0.0 && x < self.width as f32 && y < self.height as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Resize,
    PointerMove,
}

/// Input delivered to sessions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Resize(Viewport),
    /// Pointer position in raster pixels.
    PointerMove { x: f32, y: f32 },
    PointerLeave,
}

impl HostEvent {
    pub fn kind(&self) -> ListenerKind {
        match self {
            HostEvent::Resize(_) => ListenerKind::Resize,
            HostEvent::PointerMove { .. } | HostEvent::PointerLeave => ListenerKind::PointerMove,
        }
    }
}

/// Identifies one requested frame.
pub type FrameId = u64;

#[derive(Debug, Default)]
struct HostState {
    viewport: Viewport,
    next_id: u64,
    surfaces_enabled: bool,
    surface_owner: Option<u64>,
    listeners: HashMap<u64, ListenerKind>,
    pending_frames: BTreeSet<FrameId>,
}

impl HostState {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Shared handle to the host. Cloning is cheap; all clones see the same
/// state.
#[derive(Debug, Clone)]
pub struct Host {
    inner: Rc<RefCell<HostState>>,
}

impl Host {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            inner: Rc::new(RefCell::new(HostState {
                viewport,
                surfaces_enabled: true,
                ..HostState::default()
            })),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.inner.borrow().viewport
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.inner.borrow_mut().viewport = viewport;
    }

    /// Disables surface creation, as on a host without a drawable area.
    pub fn set_surfaces_enabled(&self, enabled: bool) {
        self.inner.borrow_mut().surfaces_enabled = enabled;
    }

    /// Hands out the single drawing surface, sized to the viewport.
    pub fn acquire_surface(&self) -> Result<Surface, HostError> {
        let mut state = self.inner.borrow_mut();
        let vp = state.viewport;
        if !state.surfaces_enabled || vp.is_empty() {
            return Err(HostError::SurfaceUnavailable {
                width: vp.width,
                height: vp.height,
            });
        }
        if state.surface_owner.is_some() {
            return Err(HostError::SurfaceBusy);
        }
        let id = state.allocate();
        state.surface_owner = Some(id);
        trace!(id, "surface acquired");
        Ok(Surface {
            id,
            host: self.clone(),
            raster: Raster::new(vp.width, vp.height),
        })
    }

    pub fn listen(&self, kind: ListenerKind) -> ListenerGuard {
        let mut state = self.inner.borrow_mut();
        let id = state.allocate();
        state.listeners.insert(id, kind);
        trace!(id, ?kind, "listener registered");
        ListenerGuard {
            id,
            kind,
            host: self.clone(),
        }
    }

    /// Asks for a callback on the next frame.
    pub fn request_frame(&self) -> FrameHandle {
        let mut state = self.inner.borrow_mut();
        let id = state.allocate();
        state.pending_frames.insert(id);
        FrameHandle {
            id,
            host: self.clone(),
        }
    }

    /// Removes and returns every frame due now, oldest first.
    pub fn take_due_frames(&self) -> Vec<FrameId> {
        let mut state = self.inner.borrow_mut();
        std::mem::take(&mut state.pending_frames).into_iter().collect()
    }

    pub fn live_surfaces(&self) -> usize {
        usize::from(self.inner.borrow().surface_owner.is_some())
    }

    pub fn listener_count(&self, kind: ListenerKind) -> usize {
        self.inner
            .borrow()
            .listeners
            .values()
            .filter(|k| **k == kind)
            .count()
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.borrow().pending_frames.len()
    }

    fn release_surface(&self, id: u64) {
        let mut state = self.inner.borrow_mut();
        if state.surface_owner == Some(id) {
            state.surface_owner = None;
            trace!(id, "surface released");
        }
    }

    fn release_listener(&self, id: u64) -> bool {
        self.inner.borrow_mut().listeners.remove(&id).is_some()
    }

    fn is_listening(&self, id: u64) -> bool {
        self.inner.borrow().listeners.contains_key(&id)
    }

    fn cancel_frame(&self, id: FrameId) {
        self.inner.borrow_mut().pending_frames.remove(&id);
    }
}

/// Exclusive drawing surface; dropping it gives the surface back.
#[derive(Debug)]
pub struct Surface {
    id: u64,
    host: Host,
    raster: Raster,
}

impl Surface {
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn raster_mut(&mut self) -> &mut Raster {
        &mut self.raster
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.raster.width(), self.raster.height())
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.raster.resize(viewport.width, viewport.height);
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.host.release_surface(self.id);
    }
}

/// A registered listener; unregisters on drop.
#[derive(Debug)]
pub struct ListenerGuard {
    id: u64,
    kind: ListenerKind,
    host: Host,
}

impl ListenerGuard {
    pub fn kind(&self) -> ListenerKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.host.is_listening(self.id)
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if self.host.release_listener(self.id) {
            trace!(id = self.id, kind = ?self.kind, "listener removed");
        }
    }
}

/// A requested frame; cancels the request on drop if it has not fired.
#[derive(Debug)]
pub struct FrameHandle {
    id: FrameId,
    host: Host,
}

impl FrameHandle {
    pub fn id(&self) -> FrameId {
        self.id
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        self.host.cancel_frame(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_surface_at_a_time() {
        let host = Host::new(Viewport::new(40, 20));
        let first = host.acquire_surface().unwrap();
        assert_eq!(host.acquire_surface().unwrap_err(), HostError::SurfaceBusy);
        assert_eq!(host.live_surfaces(), 1);
        drop(first);
        assert_eq!(host.live_surfaces(), 0);
        assert!(host.acquire_surface().is_ok());
    }

    #[test]
    fn test_surface_unavailable() {
        let host = Host::new(Viewport::new(0, 20));
        assert!(matches!(
            host.acquire_surface(),
            Err(HostError::SurfaceUnavailable { width: 0, .. })
        ));
        host.set_viewport(Viewport::new(10, 10));
        host.set_surfaces_enabled(false);
        assert!(host.acquire_surface().is_err());
    }

    #[test]
    fn test_listener_guard_releases() {
        let host = Host::new(Viewport::new(10, 10));
        let guard = host.listen(ListenerKind::Resize);
        let _pointer = host.listen(ListenerKind::PointerMove);
        assert!(guard.is_active());
        assert_eq!(host.listener_count(ListenerKind::Resize), 1);
        drop(guard);
        assert_eq!(host.listener_count(ListenerKind::Resize), 0);
        assert_eq!(host.listener_count(ListenerKind::PointerMove), 1);
    }

    #[test]
    fn test_frame_cancel_on_drop() {
        let host = Host::new(Viewport::new(10, 10));
        let a = host.request_frame();
        let b = host.request_frame();
        assert_eq!(host.pending_frames(), 2);
        drop(a);
        assert_eq!(host.take_due_frames(), vec![b.id()]);
        assert_eq!(host.pending_frames(), 0);
        drop(b);
        assert_eq!(host.pending_frames(), 0);
    }

    #[test]
    fn test_viewport_from_terminal() {
        assert_eq!(Viewport::from_terminal(80, 24), Viewport::new(80, 48));
        assert!(Viewport::new(3, 3).contains(2.9, 0.0));
        assert!(!Viewport::new(3, 3).contains(3.0, 0.0));
    }
}
