use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Rejected theme values at the store boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThemeError {
    /// Not one of the known background styles.
    #[error("unknown background style: {0:?}")]
    UnknownBackgroundStyle(String),

    /// Not one of the known color schemes.
    #[error("unknown color scheme: {0:?}")]
    UnknownColorScheme(String),

    /// Neither "dark" nor "light".
    #[error("unknown theme mode: {0:?}")]
    UnknownThemeMode(String),
}

/// Failures reading or writing the preference record.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    /// No platform config directory could be determined.
    #[error("could not determine a config directory")]
    NoConfigDir,
}

/// Failures acquiring host resources.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    /// The viewport has no area to draw into.
    #[error("drawing surface unavailable: viewport is {width}x{height}")]
    SurfaceUnavailable { width: u16, height: u16 },

    /// Another session still holds the drawing surface.
    #[error("drawing surface is already owned by another session")]
    SurfaceBusy,
}
