// ============================================================================
// FILM PARAMETERS — unified tunables, partial edits, and the active selection
// ============================================================================
//
// One schema covers both preset lineages: the flat scalar look (grain, warmth,
// contrast, ...) and the richer film-stock curves (per-channel toe/mid/shoulder
// triples, highlight/shadow multipliers, monochrome flag).  Fields the flat
// lineage never sets default to neutral so the two stay interchangeable.
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::presets::FilmPresetName;

/// Per-channel response curve: `pow(x, 1/toe) * mid + (1 - mid) * shoulder`.
/// `(1, 1, 1)` is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveTriple {
    pub toe: f32,
    pub mid: f32,
    pub shoulder: f32,
}

impl CurveTriple {
    pub const NEUTRAL: CurveTriple = CurveTriple { toe: 1.0, mid: 1.0, shoulder: 1.0 };

    pub const fn new(toe: f32, mid: f32, shoulder: f32) -> Self {
        Self { toe, mid, shoulder }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.toe, self.mid, self.shoulder]
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    fn sanitized(self) -> Self {
        Self {
            toe: clamp_finite(self.toe, 0.1, 4.0, 1.0),
            mid: clamp_finite(self.mid, 0.0, 2.0, 1.0),
            shoulder: clamp_finite(self.shoulder, 0.0, 2.0, 1.0),
        }
    }
}

impl Default for CurveTriple {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl From<[f32; 3]> for CurveTriple {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// The full parameter vector consumed by the color model.
///
/// Every field is accepted as-is; [`FilmParameters::sanitized`] clamps into the
/// working range right before rendering, so user-typed values never fail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilmParameters {
    pub grain_intensity: f32, // 0..1
    pub warmth: f32,          // 0..1, 0.5 = neutral
    pub contrast: f32,        // 0..1, S-curve strength = 1 + contrast
    pub saturation: f32,      // 0..1.5, 1 = unchanged
    pub vignette: f32,        // 0..1
    pub fade: f32,            // 0..1
    pub halation: f32,        // 0..1
    pub bloom: f32,           // 0..1

    pub highlights: f32,      // multiplier, 1 = neutral
    pub shadows: f32,         // multiplier, 1 = neutral
    pub grain_size: f32,      // pixels per grain cell
    pub red_curve: CurveTriple,
    pub green_curve: CurveTriple,
    pub blue_curve: CurveTriple,
    pub black_and_white: bool,
}

impl Default for FilmParameters {
    fn default() -> Self {
        Self {
            grain_intensity: 0.0,
            warmth: 0.5,
            contrast: 0.0,
            saturation: 1.0,
            vignette: 0.0,
            fade: 0.0,
            halation: 0.0,
            bloom: 0.0,
            highlights: 1.0,
            shadows: 1.0,
            grain_size: 1.0,
            red_curve: CurveTriple::NEUTRAL,
            green_curve: CurveTriple::NEUTRAL,
            blue_curve: CurveTriple::NEUTRAL,
            black_and_white: false,
        }
    }
}

impl FilmParameters {
    /// Neutral parameters: the pipeline is the identity.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Clamp every field into the range the color model works in.
    /// Non-finite values fall back to the neutral value of that field.
    pub fn sanitized(&self) -> Self {
        Self {
            grain_intensity: clamp_finite(self.grain_intensity, 0.0, 1.0, 0.0),
            warmth: clamp_finite(self.warmth, 0.0, 1.0, 0.5),
            contrast: clamp_finite(self.contrast, 0.0, 1.0, 0.0),
            saturation: clamp_finite(self.saturation, 0.0, 1.5, 1.0),
            vignette: clamp_finite(self.vignette, 0.0, 1.0, 0.0),
            fade: clamp_finite(self.fade, 0.0, 1.0, 0.0),
            halation: clamp_finite(self.halation, 0.0, 1.0, 0.0),
            bloom: clamp_finite(self.bloom, 0.0, 1.0, 0.0),
            highlights: clamp_finite(self.highlights, 0.0, 2.0, 1.0),
            shadows: clamp_finite(self.shadows, 0.0, 2.0, 1.0),
            grain_size: clamp_finite(self.grain_size, 0.25, 8.0, 1.0),
            red_curve: self.red_curve.sanitized(),
            green_curve: self.green_curve.sanitized(),
            blue_curve: self.blue_curve.sanitized(),
            black_and_white: self.black_and_white,
        }
    }

    /// Signed warmth shift in [-1, 1]; 0 is neutral.
    pub fn signed_warmth(&self) -> f32 {
        (self.warmth - 0.5) * 2.0
    }

    /// S-curve strength handed to the contrast stage; 1 is the identity.
    pub fn contrast_strength(&self) -> f32 {
        1.0 + self.contrast
    }

    /// Whether the output is luminance-only.
    pub fn is_monochrome(&self) -> bool {
        self.black_and_white || self.saturation <= 0.0
    }

    pub fn get(&self, field: FilmParameter) -> f32 {
        match field {
            FilmParameter::GrainIntensity => self.grain_intensity,
            FilmParameter::Warmth => self.warmth,
            FilmParameter::Contrast => self.contrast,
            FilmParameter::Saturation => self.saturation,
            FilmParameter::Vignette => self.vignette,
            FilmParameter::Fade => self.fade,
            FilmParameter::Halation => self.halation,
            FilmParameter::Bloom => self.bloom,
            FilmParameter::Highlights => self.highlights,
            FilmParameter::Shadows => self.shadows,
            FilmParameter::GrainSize => self.grain_size,
        }
    }

    pub fn set(&mut self, field: FilmParameter, value: f32) {
        let slot = match field {
            FilmParameter::GrainIntensity => &mut self.grain_intensity,
            FilmParameter::Warmth => &mut self.warmth,
            FilmParameter::Contrast => &mut self.contrast,
            FilmParameter::Saturation => &mut self.saturation,
            FilmParameter::Vignette => &mut self.vignette,
            FilmParameter::Fade => &mut self.fade,
            FilmParameter::Halation => &mut self.halation,
            FilmParameter::Bloom => &mut self.bloom,
            FilmParameter::Highlights => &mut self.highlights,
            FilmParameter::Shadows => &mut self.shadows,
            FilmParameter::GrainSize => &mut self.grain_size,
        };
        *slot = value;
    }
}

/// `f32::clamp` propagates NaN; the color model must never see one.
pub(crate) fn clamp_finite(v: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if v.is_finite() { v.clamp(lo, hi) } else { fallback }
}

// ============================================================================
// SCALAR FIELD KEYS
// ============================================================================

/// Statically-typed key for single-field edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilmParameter {
    GrainIntensity,
    Warmth,
    Contrast,
    Saturation,
    Vignette,
    Fade,
    Halation,
    Bloom,
    Highlights,
    Shadows,
    GrainSize,
}

impl FilmParameter {
    pub fn all() -> &'static [FilmParameter] {
        &[
            FilmParameter::GrainIntensity,
            FilmParameter::Warmth,
            FilmParameter::Contrast,
            FilmParameter::Saturation,
            FilmParameter::Vignette,
            FilmParameter::Fade,
            FilmParameter::Halation,
            FilmParameter::Bloom,
            FilmParameter::Highlights,
            FilmParameter::Shadows,
            FilmParameter::GrainSize,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilmParameter::GrainIntensity => "grainIntensity",
            FilmParameter::Warmth => "warmth",
            FilmParameter::Contrast => "contrast",
            FilmParameter::Saturation => "saturation",
            FilmParameter::Vignette => "vignette",
            FilmParameter::Fade => "fade",
            FilmParameter::Halation => "halation",
            FilmParameter::Bloom => "bloom",
            FilmParameter::Highlights => "highlights",
            FilmParameter::Shadows => "shadows",
            FilmParameter::GrainSize => "grainSize",
        }
    }
}

// ============================================================================
// PARTIAL EDITS
// ============================================================================

/// A sparse edit: only `Some` fields overwrite the base they are merged onto.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartialFilmParameters {
    pub grain_intensity: Option<f32>,
    pub warmth: Option<f32>,
    pub contrast: Option<f32>,
    pub saturation: Option<f32>,
    pub vignette: Option<f32>,
    pub fade: Option<f32>,
    pub halation: Option<f32>,
    pub bloom: Option<f32>,
    pub highlights: Option<f32>,
    pub shadows: Option<f32>,
    pub grain_size: Option<f32>,
    pub red_curve: Option<CurveTriple>,
    pub green_curve: Option<CurveTriple>,
    pub blue_curve: Option<CurveTriple>,
    pub black_and_white: Option<bool>,
}

impl PartialFilmParameters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn merge_onto(&self, base: &FilmParameters) -> FilmParameters {
        FilmParameters {
            grain_intensity: self.grain_intensity.unwrap_or(base.grain_intensity),
            warmth: self.warmth.unwrap_or(base.warmth),
            contrast: self.contrast.unwrap_or(base.contrast),
            saturation: self.saturation.unwrap_or(base.saturation),
            vignette: self.vignette.unwrap_or(base.vignette),
            fade: self.fade.unwrap_or(base.fade),
            halation: self.halation.unwrap_or(base.halation),
            bloom: self.bloom.unwrap_or(base.bloom),
            highlights: self.highlights.unwrap_or(base.highlights),
            shadows: self.shadows.unwrap_or(base.shadows),
            grain_size: self.grain_size.unwrap_or(base.grain_size),
            red_curve: self.red_curve.unwrap_or(base.red_curve),
            green_curve: self.green_curve.unwrap_or(base.green_curve),
            blue_curve: self.blue_curve.unwrap_or(base.blue_curve),
            black_and_white: self.black_and_white.unwrap_or(base.black_and_white),
        }
    }

    /// Overlay `other` on top of `self` (fields set in `other` win).
    pub fn overlay(&self, other: &PartialFilmParameters) -> PartialFilmParameters {
        PartialFilmParameters {
            grain_intensity: other.grain_intensity.or(self.grain_intensity),
            warmth: other.warmth.or(self.warmth),
            contrast: other.contrast.or(self.contrast),
            saturation: other.saturation.or(self.saturation),
            vignette: other.vignette.or(self.vignette),
            fade: other.fade.or(self.fade),
            halation: other.halation.or(self.halation),
            bloom: other.bloom.or(self.bloom),
            highlights: other.highlights.or(self.highlights),
            shadows: other.shadows.or(self.shadows),
            grain_size: other.grain_size.or(self.grain_size),
            red_curve: other.red_curve.or(self.red_curve),
            green_curve: other.green_curve.or(self.green_curve),
            blue_curve: other.blue_curve.or(self.blue_curve),
            black_and_white: other.black_and_white.or(self.black_and_white),
        }
    }
}

// ============================================================================
// ACTIVE SELECTION
// ============================================================================

/// Which catalog entry the active parameters came from.
///
/// `Custom` has no catalog entry; it only says the values were hand-edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PresetLabel {
    #[default]
    Custom,
    Preset(FilmPresetName),
}

impl PresetLabel {
    pub const CUSTOM_ID: &'static str = "custom";

    pub fn id(&self) -> &'static str {
        match self {
            PresetLabel::Custom => Self::CUSTOM_ID,
            PresetLabel::Preset(name) => name.id(),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, PresetLabel::Custom)
    }
}

impl fmt::Display for PresetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for PresetLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_lowercase();
        if id == Self::CUSTOM_ID {
            return Ok(PresetLabel::Custom);
        }
        FilmPresetName::from_id(&id)
            .map(PresetLabel::Preset)
            .ok_or_else(|| format!("unknown preset '{}'", s))
    }
}

/// Active parameters plus the label of where they came from.
///
/// Every edit that does not come straight from the catalog flips the label to
/// [`PresetLabel::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ParameterState {
    parameters: FilmParameters,
    label: PresetLabel,
}

impl ParameterState {
    pub fn new(parameters: FilmParameters, label: PresetLabel) -> Self {
        Self { parameters, label }
    }

    pub fn parameters(&self) -> &FilmParameters {
        &self.parameters
    }

    pub fn label(&self) -> PresetLabel {
        self.label
    }

    pub fn apply_preset(&mut self, name: FilmPresetName) {
        self.parameters = name.parameters();
        self.label = PresetLabel::Preset(name);
    }

    /// Apply a label; `Custom` keeps the current values.
    pub fn apply_label(&mut self, label: PresetLabel) {
        match label {
            PresetLabel::Custom => self.label = PresetLabel::Custom,
            PresetLabel::Preset(name) => self.apply_preset(name),
        }
    }

    /// Merge a sparse edit.  Returns `false` (and changes nothing) when empty.
    pub fn apply_parameters(&mut self, partial: &PartialFilmParameters) -> bool {
        if partial.is_empty() {
            return false;
        }
        self.parameters = partial.merge_onto(&self.parameters);
        self.label = PresetLabel::Custom;
        true
    }

    pub fn set_parameters(&mut self, parameters: FilmParameters) {
        self.parameters = parameters;
        self.label = PresetLabel::Custom;
    }

    pub fn update_parameter(&mut self, field: FilmParameter, value: f32) {
        self.parameters.set(field, value);
        self.label = PresetLabel::Custom;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_neutral() {
        let p = FilmParameters::default();
        assert_eq!(p.signed_warmth(), 0.0);
        assert_eq!(p.contrast_strength(), 1.0);
        assert!(p.red_curve.is_neutral() && p.green_curve.is_neutral() && p.blue_curve.is_neutral());
        assert!(!p.is_monochrome());
    }

    #[test]
    fn sanitized_clamps_instead_of_rejecting() {
        let p = FilmParameters {
            grain_intensity: 7.0,
            warmth: -3.0,
            saturation: 9.0,
            vignette: f32::NAN,
            grain_size: 0.0,
            ..FilmParameters::default()
        };
        let s = p.sanitized();
        assert_eq!(s.grain_intensity, 1.0);
        assert_eq!(s.warmth, 0.0);
        assert_eq!(s.saturation, 1.5);
        assert_eq!(s.vignette, 0.0);
        assert_eq!(s.grain_size, 0.25);
    }

    #[test]
    fn zero_saturation_is_monochrome() {
        let p = FilmParameters { saturation: 0.0, ..FilmParameters::default() };
        assert!(p.is_monochrome());
    }

    #[test]
    fn partial_merge_only_touches_set_fields() {
        let base = FilmParameters { fade: 0.3, ..FilmParameters::default() };
        let edit = PartialFilmParameters { warmth: Some(0.8), ..Default::default() };
        let merged = edit.merge_onto(&base);
        assert_eq!(merged.warmth, 0.8);
        assert_eq!(merged.fade, 0.3);
        assert_eq!(merged.saturation, 1.0);
    }

    #[test]
    fn overlay_prefers_later_fields() {
        let a = PartialFilmParameters { warmth: Some(0.2), fade: Some(0.1), ..Default::default() };
        let b = PartialFilmParameters { warmth: Some(0.9), ..Default::default() };
        let o = a.overlay(&b);
        assert_eq!(o.warmth, Some(0.9));
        assert_eq!(o.fade, Some(0.1));
    }

    #[test]
    fn partial_parses_camel_case_json() {
        let json = r#"{ "grainIntensity": 0.4, "redCurve": { "toe": 1.1, "mid": 1.0, "shoulder": 1.0 } }"#;
        let partial: PartialFilmParameters = serde_json::from_str(json).unwrap();
        assert_eq!(partial.grain_intensity, Some(0.4));
        assert_eq!(partial.red_curve, Some(CurveTriple::new(1.1, 1.0, 1.0)));
        assert_eq!(partial.bloom, None);
    }

    #[test]
    fn missing_fields_default_to_neutral() {
        let p: FilmParameters = serde_json::from_str(r#"{ "fade": 0.2 }"#).unwrap();
        assert_eq!(p.fade, 0.2);
        assert!(p.blue_curve.is_neutral());
        assert!(!p.black_and_white);
    }

    #[test]
    fn preset_then_edit_becomes_custom() {
        let mut state = ParameterState::default();
        state.apply_preset(FilmPresetName::Portra);
        assert_eq!(state.label(), PresetLabel::Preset(FilmPresetName::Portra));
        assert_eq!(*state.parameters(), FilmPresetName::Portra.parameters());

        state.update_parameter(FilmParameter::Fade, 0.42);
        assert_eq!(state.label(), PresetLabel::Custom);
        assert_eq!(state.parameters().fade, 0.42);
    }

    #[test]
    fn empty_partial_keeps_preset_label() {
        let mut state = ParameterState::default();
        state.apply_preset(FilmPresetName::Gold);
        assert!(!state.apply_parameters(&PartialFilmParameters::default()));
        assert_eq!(state.label(), PresetLabel::Preset(FilmPresetName::Gold));
    }

    #[test]
    fn custom_label_round_trips() {
        assert_eq!("custom".parse::<PresetLabel>().unwrap(), PresetLabel::Custom);
        assert_eq!(PresetLabel::Custom.to_string(), "custom");
        assert!("not-a-film".parse::<PresetLabel>().is_err());
    }

    #[test]
    fn field_accessors_agree() {
        let mut p = FilmParameters::default();
        for (i, field) in FilmParameter::all().iter().enumerate() {
            p.set(*field, i as f32 * 0.1);
            assert_eq!(p.get(*field), i as f32 * 0.1);
        }
    }
}
