//! Import and export of device rasters.
//!
//! Rasters move between tools in two forms: PGM masks for quick
//! inspection and pipelines that want pixels, GDSII for layout tools.

pub mod gds;
pub mod pgm;
