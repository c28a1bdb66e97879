//! # photokw Common Library
//!
//! Shared code for the photokw tools including:
//! - Keyword hierarchy model (paths, trees, tab-indented export files)
//! - Hidden keyword filtering
//! - Face name to people keyword resolution and unknown-people tidying
//! - Configuration loading

pub mod config;
pub mod error;
pub mod keywords;

pub use error::{Error, Result};
pub use keywords::{KeywordPath, KeywordTree, SEPARATOR};
