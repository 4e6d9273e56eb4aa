#![allow(clippy::too_many_arguments)]

//! Film-stock emulation: a per-pixel color model (curves, warmth, saturation,
//! contrast, halation, bloom, grain, fade, vignette), the parameter and preset
//! catalog that drives it, and a renderer state machine over GPU and CPU
//! backends.

pub mod cli;
pub mod error;
pub mod gpu;
pub mod io;
pub mod logger;
pub mod ops;
pub mod params;
pub mod presets;

pub use error::{CompareError, IntakeError, RenderError, ShaderStage};
pub use gpu::{CpuBackend, FilmRenderer, RenderBackend, RenderOutcome, RendererState, WgpuBackend};
pub use ops::film::{FilmTuning, FrameInputs};
pub use params::{CurveTriple, FilmParameter, FilmParameters, ParameterState, PartialFilmParameters, PresetLabel};
pub use presets::{FilmCharacteristics, FilmPresetName, PresetKind};
