// ============================================================================
// OPS — CPU image operations
// ============================================================================
//
//   film.rs    — the film color model (per-pixel transform + frame renderer)
//   grain.rs   — hashed value noise and fBm used for grain
//   compare.rs — before/after split composite
// ============================================================================

pub mod compare;
pub mod film;
pub mod grain;

pub use film::{FilmTuning, FrameInputs};
