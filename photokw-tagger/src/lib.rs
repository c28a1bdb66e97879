//! photokw-tagger library interface
//!
//! Keeps the keyword, people, event and location tags of photo files in step
//! with the catalog's keyword hierarchy. Exposes public APIs for the `photokw`
//! binary and for integration testing.

pub mod config;
pub mod error;
pub mod geocode;
pub mod metadata;
pub mod services;
pub mod tags;

pub use crate::config::{Overrides, Settings};
pub use crate::error::{TaggerError, TaggerResult};
pub use crate::metadata::{GeoStatus, MetadataRecord};
