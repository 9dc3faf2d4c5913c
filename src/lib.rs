//! Player stat cards and perceptual image fingerprints.

pub mod canvas;
pub mod card;
pub mod config;
pub mod error_codes;
pub mod fingerprint;
pub mod format;
pub mod logging;
pub mod panel;
pub mod similarity;
pub mod text;
