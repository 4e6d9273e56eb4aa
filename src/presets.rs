// ============================================================================
// PRESET CATALOG — named looks and film stocks, one parameter type
// ============================================================================
//
// Two families share the catalog:
//   * flat looks (portra, gold, ilford-hp5, ...) tuned with the scalar sliders
//   * film stocks (kodak-gold-200, cinestill-800t, ...) described through
//     `FilmCharacteristics` (per-channel curves, multiplicative contrast,
//     signed warmth) and converted into `FilmParameters` on lookup
//
// "custom" is deliberately absent: it is `PresetLabel::Custom`, not an entry.
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::params::{CurveTriple, FilmParameters};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilmPresetName {
    // ---- Flat looks ----
    Portra,
    Ektar,
    Gold,
    Superia,
    Cinestill,
    #[serde(rename = "ilford-hp5")]
    IlfordHp5,
    TriX,
    Faded,
    Vintage,

    // ---- Film stocks ----
    #[serde(rename = "kodak-gold-200")]
    KodakGold200,
    #[serde(rename = "kodak-ultramax-400")]
    KodakUltramax400,
    #[serde(rename = "kodak-portra-400")]
    KodakPortra400,
    #[serde(rename = "fujifilm-superia-400")]
    FujifilmSuperia400,
    #[serde(rename = "fujifilm-velvia-50")]
    FujifilmVelvia50,
    #[serde(rename = "fujifilm-provia-100f")]
    FujifilmProvia100f,
    #[serde(rename = "ilford-hp5-plus-400")]
    IlfordHp5Plus400,
    #[serde(rename = "kodak-tri-x-400")]
    KodakTriX400,
    #[serde(rename = "ilford-fp4-plus-125")]
    IlfordFp4Plus125,
    #[serde(rename = "kodak-t-max-100")]
    KodakTMax100,
    #[serde(rename = "cinestill-800t")]
    Cinestill800t,
}

/// Color vs monochrome, for grouping in pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    Color,
    BlackAndWhite,
}

impl PresetKind {
    pub fn label(&self) -> &'static str {
        match self {
            PresetKind::Color => "Color",
            PresetKind::BlackAndWhite => "Black & White",
        }
    }
}

impl FilmPresetName {
    pub fn all() -> &'static [FilmPresetName] {
        use FilmPresetName::*;
        &[
            Portra, Ektar, Gold, Superia, Cinestill, IlfordHp5, TriX, Faded, Vintage,
            KodakGold200, KodakUltramax400, KodakPortra400, FujifilmSuperia400,
            FujifilmVelvia50, FujifilmProvia100f, IlfordHp5Plus400, KodakTriX400,
            IlfordFp4Plus125, KodakTMax100, Cinestill800t,
        ]
    }

    /// Stable identifier used on the command line and in JSON.
    pub fn id(&self) -> &'static str {
        use FilmPresetName::*;
        match self {
            Portra => "portra",
            Ektar => "ektar",
            Gold => "gold",
            Superia => "superia",
            Cinestill => "cinestill",
            IlfordHp5 => "ilford-hp5",
            TriX => "tri-x",
            Faded => "faded",
            Vintage => "vintage",
            KodakGold200 => "kodak-gold-200",
            KodakUltramax400 => "kodak-ultramax-400",
            KodakPortra400 => "kodak-portra-400",
            FujifilmSuperia400 => "fujifilm-superia-400",
            FujifilmVelvia50 => "fujifilm-velvia-50",
            FujifilmProvia100f => "fujifilm-provia-100f",
            IlfordHp5Plus400 => "ilford-hp5-plus-400",
            KodakTriX400 => "kodak-tri-x-400",
            IlfordFp4Plus125 => "ilford-fp4-plus-125",
            KodakTMax100 => "kodak-t-max-100",
            Cinestill800t => "cinestill-800t",
        }
    }

    pub fn from_id(id: &str) -> Option<FilmPresetName> {
        let id = id.trim();
        Self::all().iter().copied().find(|p| p.id().eq_ignore_ascii_case(id))
    }

    pub fn display_name(&self) -> &'static str {
        use FilmPresetName::*;
        match self {
            Portra => "Portra",
            Ektar => "Ektar",
            Gold => "Gold",
            Superia => "Superia",
            Cinestill => "CineStill",
            IlfordHp5 => "Ilford HP5",
            TriX => "Tri-X",
            Faded => "Faded",
            Vintage => "Vintage",
            other => other
                .film_stock()
                .map(|c| c.name)
                .unwrap_or("Unknown"),
        }
    }

    pub fn kind(&self) -> PresetKind {
        if self.parameters().black_and_white {
            PresetKind::BlackAndWhite
        } else {
            PresetKind::Color
        }
    }

    /// Whether this entry comes from the film-stock family.
    pub fn is_film_stock(&self) -> bool {
        self.film_stock().is_some()
    }

    /// Concrete parameters for this entry.
    pub fn parameters(&self) -> FilmParameters {
        if let Some(stock) = self.film_stock() {
            return stock.to_parameters();
        }
        flat_preset(*self)
    }

    /// Characteristics for the film-stock family; `None` for flat looks.
    pub fn film_stock(&self) -> Option<FilmCharacteristics> {
        use FilmPresetName::*;
        let c = match self {
            KodakGold200 => FilmCharacteristics {
                name: "Kodak Gold 200",
                grain: 0.15,
                contrast: 1.08,
                saturation: 1.15,
                warmth: 0.12,
                highlights: 0.95,
                shadows: 1.05,
                red_curve: CurveTriple::new(1.08, 0.98, 1.02),
                green_curve: CurveTriple::new(0.95, 1.0, 0.98),
                blue_curve: CurveTriple::new(0.88, 0.92, 0.95),
                halation: 0.0,
                black_and_white: false,
                grain_size: 1.2,
            },
            KodakUltramax400 => FilmCharacteristics {
                name: "Kodak Ultramax 400",
                grain: 0.22,
                contrast: 1.12,
                saturation: 1.25,
                warmth: 0.08,
                highlights: 0.92,
                shadows: 1.08,
                red_curve: CurveTriple::new(1.1, 1.02, 1.05),
                green_curve: CurveTriple::new(0.98, 1.05, 1.0),
                blue_curve: CurveTriple::new(0.9, 0.95, 0.98),
                halation: 0.0,
                black_and_white: false,
                grain_size: 1.5,
            },
            KodakPortra400 => FilmCharacteristics {
                name: "Kodak Portra 400",
                grain: 0.12,
                contrast: 1.05,
                saturation: 1.08,
                warmth: 0.05,
                highlights: 0.98,
                shadows: 1.02,
                red_curve: CurveTriple::new(1.02, 1.0, 1.01),
                green_curve: CurveTriple::new(0.98, 1.0, 0.99),
                blue_curve: CurveTriple::new(0.96, 0.98, 0.99),
                halation: 0.0,
                black_and_white: false,
                grain_size: 1.0,
            },
            FujifilmSuperia400 => FilmCharacteristics {
                name: "Fujifilm Superia 400",
                grain: 0.2,
                contrast: 1.1,
                saturation: 1.18,
                warmth: -0.05,
                highlights: 0.93,
                shadows: 1.06,
                red_curve: CurveTriple::new(1.05, 1.0, 1.02),
                green_curve: CurveTriple::new(0.95, 1.08, 1.02),
                blue_curve: CurveTriple::new(0.92, 1.05, 1.08),
                halation: 0.0,
                black_and_white: false,
                grain_size: 1.4,
            },
            FujifilmVelvia50 => FilmCharacteristics {
                name: "Fujifilm Velvia 50",
                grain: 0.08,
                contrast: 1.25,
                saturation: 1.45,
                warmth: 0.02,
                highlights: 0.88,
                shadows: 1.15,
                red_curve: CurveTriple::new(1.15, 1.08, 1.1),
                green_curve: CurveTriple::new(0.95, 1.12, 1.08),
                blue_curve: CurveTriple::new(0.88, 1.05, 1.15),
                halation: 0.0,
                black_and_white: false,
                grain_size: 0.8,
            },
            FujifilmProvia100f => FilmCharacteristics {
                name: "Fujifilm Provia 100F",
                grain: 0.1,
                contrast: 1.08,
                saturation: 1.12,
                warmth: 0.0,
                highlights: 0.96,
                shadows: 1.04,
                halation: 0.0,
                grain_size: 0.9,
                ..FilmCharacteristics::neutral("Fujifilm Provia 100F")
            },
            IlfordHp5Plus400 => FilmCharacteristics {
                grain: 0.28,
                contrast: 1.15,
                highlights: 0.9,
                shadows: 1.12,
                grain_size: 1.6,
                ..FilmCharacteristics::monochrome("Ilford HP5 Plus 400")
            },
            KodakTriX400 => FilmCharacteristics {
                grain: 0.32,
                contrast: 1.22,
                highlights: 0.88,
                shadows: 1.18,
                grain_size: 1.8,
                ..FilmCharacteristics::monochrome("Kodak Tri-X 400")
            },
            IlfordFp4Plus125 => FilmCharacteristics {
                grain: 0.18,
                contrast: 1.12,
                highlights: 0.93,
                shadows: 1.08,
                grain_size: 1.2,
                ..FilmCharacteristics::monochrome("Ilford FP4 Plus 125")
            },
            KodakTMax100 => FilmCharacteristics {
                grain: 0.12,
                contrast: 1.18,
                highlights: 0.92,
                shadows: 1.1,
                grain_size: 0.9,
                ..FilmCharacteristics::monochrome("Kodak T-Max 100")
            },
            Cinestill800t => FilmCharacteristics {
                name: "CineStill 800T",
                grain: 0.25,
                contrast: 1.08,
                saturation: 1.15,
                warmth: 0.15,
                highlights: 0.85,
                shadows: 1.05,
                red_curve: CurveTriple::new(1.12, 1.05, 1.08),
                green_curve: CurveTriple::new(0.95, 1.0, 0.98),
                blue_curve: CurveTriple::new(0.85, 0.88, 0.92),
                halation: 0.35,
                black_and_white: false,
                grain_size: 1.5,
            },
            _ => return None,
        };
        Some(c)
    }
}

impl std::fmt::Display for FilmPresetName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Scalar looks.  Curves stay neutral; contrast and warmth use the flat ranges.
fn flat_preset(name: FilmPresetName) -> FilmParameters {
    use FilmPresetName::*;
    let base = FilmParameters::default();
    match name {
        Portra => FilmParameters {
            grain_intensity: 0.12,
            warmth: 0.58,
            contrast: 0.08,
            saturation: 0.95,
            vignette: 0.15,
            fade: 0.05,
            halation: 0.05,
            bloom: 0.1,
            ..base
        },
        Ektar => FilmParameters {
            grain_intensity: 0.08,
            warmth: 0.55,
            contrast: 0.22,
            saturation: 1.3,
            vignette: 0.2,
            bloom: 0.05,
            ..base
        },
        Gold => FilmParameters {
            grain_intensity: 0.18,
            warmth: 0.68,
            contrast: 0.12,
            saturation: 1.12,
            vignette: 0.25,
            fade: 0.08,
            bloom: 0.1,
            ..base
        },
        Superia => FilmParameters {
            grain_intensity: 0.2,
            warmth: 0.45,
            contrast: 0.15,
            saturation: 1.15,
            vignette: 0.2,
            fade: 0.04,
            ..base
        },
        Cinestill => FilmParameters {
            grain_intensity: 0.22,
            warmth: 0.4,
            contrast: 0.1,
            saturation: 1.1,
            vignette: 0.3,
            fade: 0.06,
            halation: 0.6,
            bloom: 0.35,
            ..base
        },
        IlfordHp5 => FilmParameters {
            grain_intensity: 0.3,
            contrast: 0.2,
            saturation: 0.0,
            vignette: 0.3,
            fade: 0.03,
            grain_size: 1.6,
            black_and_white: true,
            ..base
        },
        TriX => FilmParameters {
            grain_intensity: 0.35,
            contrast: 0.3,
            saturation: 0.0,
            vignette: 0.35,
            grain_size: 1.8,
            black_and_white: true,
            ..base
        },
        Faded => FilmParameters {
            grain_intensity: 0.15,
            warmth: 0.55,
            contrast: 0.0,
            saturation: 0.75,
            vignette: 0.2,
            fade: 0.45,
            bloom: 0.15,
            ..base
        },
        Vintage => FilmParameters {
            grain_intensity: 0.28,
            warmth: 0.72,
            contrast: 0.1,
            saturation: 0.8,
            vignette: 0.45,
            fade: 0.25,
            halation: 0.15,
            bloom: 0.2,
            grain_size: 1.4,
            ..base
        },
        // Film stocks never reach here; `parameters` resolves them first.
        _ => base,
    }
}

// ============================================================================
// FILM STOCK CHARACTERISTICS (alternate schema)
// ============================================================================

/// Film-stock description in the richer per-channel schema.
///
/// Differences from [`FilmParameters`]: `contrast` is the multiplicative S-curve
/// strength (1 = neutral) and `warmth` is signed (0 = neutral).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilmCharacteristics {
    pub name: &'static str,
    pub grain: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub warmth: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub red_curve: CurveTriple,
    pub green_curve: CurveTriple,
    pub blue_curve: CurveTriple,
    pub halation: f32,
    pub black_and_white: bool,
    pub grain_size: f32,
}

impl FilmCharacteristics {
    pub fn neutral(name: &'static str) -> Self {
        Self {
            name,
            grain: 0.0,
            contrast: 1.0,
            saturation: 1.0,
            warmth: 0.0,
            highlights: 1.0,
            shadows: 1.0,
            red_curve: CurveTriple::NEUTRAL,
            green_curve: CurveTriple::NEUTRAL,
            blue_curve: CurveTriple::NEUTRAL,
            halation: 0.0,
            black_and_white: false,
            grain_size: 1.0,
        }
    }

    fn monochrome(name: &'static str) -> Self {
        Self {
            saturation: 0.0,
            black_and_white: true,
            ..Self::neutral(name)
        }
    }

    pub fn to_parameters(&self) -> FilmParameters {
        FilmParameters {
            grain_intensity: self.grain,
            warmth: 0.5 + self.warmth * 0.5,
            contrast: self.contrast - 1.0,
            saturation: self.saturation,
            vignette: 0.0,
            fade: 0.0,
            halation: self.halation,
            bloom: 0.0,
            highlights: self.highlights,
            shadows: self.shadows,
            grain_size: self.grain_size,
            red_curve: self.red_curve,
            green_curve: self.green_curve,
            blue_curve: self.blue_curve,
            black_and_white: self.black_and_white,
        }
    }

    /// Project flat parameters into the stock schema.  Vignette, fade and
    /// bloom have no counterpart and are dropped.
    pub fn from_parameters(name: &'static str, p: &FilmParameters) -> Self {
        Self {
            name,
            grain: p.grain_intensity,
            contrast: p.contrast_strength(),
            saturation: p.saturation,
            warmth: p.signed_warmth(),
            highlights: p.highlights,
            shadows: p.shadows,
            red_curve: p.red_curve,
            green_curve: p.green_curve,
            blue_curve: p.blue_curve,
            halation: p.halation,
            black_and_white: p.black_and_white,
            grain_size: p.grain_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_parse_back() {
        let mut seen = std::collections::HashSet::new();
        for p in FilmPresetName::all() {
            assert!(seen.insert(p.id()), "duplicate id {}", p.id());
            assert_eq!(FilmPresetName::from_id(p.id()), Some(*p));
        }
        assert_eq!(FilmPresetName::from_id("custom"), None);
    }

    #[test]
    fn serde_uses_catalog_ids() {
        for p in FilmPresetName::all() {
            let json = serde_json::to_string(p).unwrap();
            assert_eq!(json, format!("\"{}\"", p.id()));
        }
    }

    #[test]
    fn stock_ids_deserialize() {
        for p in FilmPresetName::all() {
            let parsed: FilmPresetName = serde_json::from_str(&format!("\"{}\"", p.id())).unwrap();
            assert_eq!(parsed, *p);
        }
        assert!(serde_json::from_str::<FilmPresetName>("\"kodak-gold200\"").is_err());
    }

    #[test]
    fn monochrome_entries_are_grouped() {
        assert_eq!(FilmPresetName::IlfordHp5.kind(), PresetKind::BlackAndWhite);
        assert_eq!(FilmPresetName::KodakTriX400.kind(), PresetKind::BlackAndWhite);
        assert_eq!(FilmPresetName::Cinestill800t.kind(), PresetKind::Color);
    }

    #[test]
    fn stock_conversion_maps_schemas() {
        let stock = FilmPresetName::Cinestill800t.film_stock().unwrap();
        let p = stock.to_parameters();
        assert!((p.contrast - 0.08).abs() < 1e-6);
        assert!((p.signed_warmth() - 0.15).abs() < 1e-6);
        assert_eq!(p.halation, 0.35);
        assert_eq!(p.blue_curve, CurveTriple::new(0.85, 0.88, 0.92));

        let back = FilmCharacteristics::from_parameters(stock.name, &p);
        assert!((back.contrast - stock.contrast).abs() < 1e-6);
        assert!((back.warmth - stock.warmth).abs() < 1e-6);
        assert_eq!(back.red_curve, stock.red_curve);
    }

    #[test]
    fn flat_looks_have_no_stock_view() {
        assert!(FilmPresetName::Portra.film_stock().is_none());
        assert!(FilmPresetName::KodakPortra400.is_film_stock());
        assert_eq!(FilmPresetName::KodakPortra400.display_name(), "Kodak Portra 400");
    }

    #[test]
    fn catalog_values_sit_inside_working_ranges() {
        for p in FilmPresetName::all() {
            let params = p.parameters();
            assert_eq!(params, params.sanitized(), "{} leaves the working range", p.id());
        }
    }
}
