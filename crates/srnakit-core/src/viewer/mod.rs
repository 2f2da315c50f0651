//! Generation of self-contained HTML viewer pages.
//!
//! Pages embed structure text and confidence arrays directly, so a single
//! file can be shared and opened anywhere; the only external fetch is the
//! 3Dmol.js runtime from its CDN. [`structures`] builds the multi-structure
//! browser, [`confidence`] the prediction-confidence page.

pub mod confidence;
pub mod html;
pub mod payload;
pub mod structures;
