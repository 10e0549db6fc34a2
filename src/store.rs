use crate::error::ThemeError;
use crate::prefs::{PreferenceStorage, COLOR_SCHEME_KEY, SPACE_THEME_KEY, THEME_MODE_KEY};
use crate::theme::{mode_str, parse_dark_mode, BackgroundStyle, ColorScheme, ThemeState};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info, warn};

// ============================================================================
// THEME STORE
// ============================================================================

// Every field has a single setter; nothing else mutates theme state.

/// Which field a change touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeField {
    BackgroundStyle,
    DarkMode,
    ColorScheme,
}

/// Broadcast after every effective mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeChange {
    pub field: ThemeField,
    pub previous: ThemeState,
    pub current: ThemeState,
}

pub struct ThemeStore {
    state: ThemeState,
    storage: Box<dyn PreferenceStorage>,
    subscribers: Vec<Sender<ThemeChange>>,
}

impl std::fmt::Debug for ThemeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeStore")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl ThemeStore {
    /// Builds the store from the persisted record. Missing keys take the
    /// value from `defaults`; unrecognized values fall back to the default
    /// member and are logged.
    pub fn load(storage: Box<dyn PreferenceStorage>, defaults: ThemeState) -> Self {
        let mut state = defaults;

        if let Some(raw) = storage.get(SPACE_THEME_KEY) {
            match raw.parse::<BackgroundStyle>() {
                Ok(style) => state.background_style = style,
                Err(err) => {
                    warn!(%err, "ignoring persisted background style");
                    state.background_style = BackgroundStyle::default();
                }
            }
        }

        if let Some(raw) = storage.get(COLOR_SCHEME_KEY) {
            match parse_scheme(&raw) {
                Ok(scheme) => state.color_scheme = scheme,
                Err(err) => {
                    warn!(%err, "ignoring persisted color scheme");
                    state.color_scheme = None;
                }
            }
        }

        if let Some(raw) = storage.get(THEME_MODE_KEY) {
            match parse_dark_mode(&raw) {
                Ok(dark) => state.dark_mode = dark,
                Err(err) => warn!(%err, "ignoring persisted theme mode"),
            }
        }

        info!(
            style = %state.background_style,
            dark = state.dark_mode,
            scheme = ?state.color_scheme,
            "theme loaded"
        );

        Self {
            state,
            storage,
            subscribers: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> ThemeState {
        self.state
    }

    /// Registers a new subscriber. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<ThemeChange> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // ===== Mutations =====

    /// Returns whether the state changed.
    pub fn set_background_style(&mut self, style: BackgroundStyle) -> bool {
        if self.state.background_style == style {
            return false;
        }
        let next = ThemeState {
            background_style: style,
            ..self.state
        };
        self.commit(next, ThemeField::BackgroundStyle);
        true
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) -> bool {
        if self.state.dark_mode == dark_mode {
            return false;
        }
        let next = ThemeState {
            dark_mode,
            ..self.state
        };
        self.commit(next, ThemeField::DarkMode);
        true
    }

    pub fn set_color_scheme(&mut self, color_scheme: Option<ColorScheme>) -> bool {
        if self.state.color_scheme == color_scheme {
            return false;
        }
        let next = ThemeState {
            color_scheme,
            ..self.state
        };
        self.commit(next, ThemeField::ColorScheme);
        true
    }

    /// String entry point; an unknown value is rejected and the current
    /// style kept.
    pub fn set_background_style_str(&mut self, raw: &str) -> Result<bool, ThemeError> {
        let style = raw.parse()?;
        Ok(self.set_background_style(style))
    }

    /// Accepts a scheme name, or `""`/`"none"` to clear the scheme.
    pub fn set_color_scheme_str(&mut self, raw: &str) -> Result<bool, ThemeError> {
        let scheme = parse_scheme(raw)?;
        Ok(self.set_color_scheme(scheme))
    }

    pub fn toggle_background_style(&mut self) -> BackgroundStyle {
        let next = self.state.background_style.toggled();
        self.set_background_style(next);
        next
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        let next = !self.state.dark_mode;
        self.set_dark_mode(next);
        next
    }

    /// Steps through no scheme, then each scheme in order, then back.
    pub fn cycle_color_scheme(&mut self) -> Option<ColorScheme> {
        let next = match self.state.color_scheme {
            None => Some(ColorScheme::ALL[0]),
            Some(current) => ColorScheme::ALL
                .iter()
                .position(|s| *s == current)
                .and_then(|i| ColorScheme::ALL.get(i + 1).copied()),
        };
        self.set_color_scheme(next);
        next
    }

    fn commit(&mut self, next: ThemeState, field: ThemeField) {
        let previous = self.state;
        self.state = next;
        self.persist(field);

        let change = ThemeChange {
            field,
            previous,
            current: next,
        };
        debug!(?field, current = ?next, "theme changed");
        self.subscribers.retain(|tx| tx.send(change).is_ok());
    }

    fn persist(&mut self, field: ThemeField) {
        let result = match field {
            ThemeField::BackgroundStyle => self
                .storage
                .set(SPACE_THEME_KEY, self.state.background_style.as_str()),
            ThemeField::ColorScheme => match self.state.color_scheme {
                Some(scheme) => self.storage.set(COLOR_SCHEME_KEY, scheme.as_str()),
                None => self.storage.remove(COLOR_SCHEME_KEY),
            },
            ThemeField::DarkMode => self
                .storage
                .set(THEME_MODE_KEY, mode_str(self.state.dark_mode)),
        };
        if let Err(err) = result {
            warn!(%err, ?field, "failed to persist theme preference");
        }
    }
}

fn parse_scheme(raw: &str) -> Result<Option<ColorScheme>, ThemeError> {
    match raw.trim() {
        "" => Ok(None),
        s if s.eq_ignore_ascii_case("none") => Ok(None),
        s => s.parse().map(Some),
    }
}
