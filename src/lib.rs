pub mod app;
pub mod color;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod host;
pub mod keys;
pub mod logging;
pub mod nebula;
pub mod overlay;
pub mod prefs;
pub mod raster;
pub mod session;
pub mod starfield;
pub mod store;
pub mod theme;
pub mod ui;
