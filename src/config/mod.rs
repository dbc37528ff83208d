//! Configuration management for trawl.
//!
//! Port lists live in a YAML file, application settings in a JSON file under
//! the XDG configuration directory.

mod ports;
mod settings;

pub use ports::PortConfig;
pub use settings::{AppSettings, Paths};
