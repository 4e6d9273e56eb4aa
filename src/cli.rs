// ============================================================================
// filmstock CLI — batch film emulation from the command line
// ============================================================================
//
// Usage examples:
//   filmstock -i photo.jpg --preset portra
//   filmstock -i shots/*.png --preset ilford-hp5 --output-dir out/
//   filmstock -i photo.jpg --params look.json --grain 0.4 -o graded.png
//   filmstock -i photo.jpg --preset cinestill --compare 50 --format png
//   filmstock --list-presets
//
// Rendering uses the GPU when an adapter is available and falls back to the
// CPU backend otherwise (or when --cpu is given).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::gpu::{CpuBackend, FilmRenderer, RenderBackend, RendererState, WgpuBackend};
use crate::io::{self, DEFAULT_EXPORT_QUALITY, ExportFormat};
use crate::ops::compare::split_compare;
use crate::ops::film::FilmTuning;
use crate::params::{PartialFilmParameters, PresetLabel};
use crate::presets::FilmPresetName;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Film-stock emulation for PNG and JPEG photos.
#[derive(Parser, Debug)]
#[command(
    name = "filmstock",
    version,
    about = "Apply film-stock emulation (grain, curves, halation, bloom) to photos",
    long_about = "Render PNG/JPEG photos through a film emulation model and write the\n\
                  result next to the input as filmstock-<name>.<ext>.\n\n\
                  Example:\n  \
                  filmstock -i photo.jpg --preset portra\n  \
                  filmstock -i *.png --preset ilford-hp5 --output-dir out/"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.jpg", "shots/*.png").
    #[arg(short, long, required_unless_present = "list_presets", num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Preset id (see --list-presets). "custom" starts from neutral values.
    #[arg(short, long, value_name = "NAME")]
    pub preset: Option<PresetLabel>,

    /// JSON file with parameter overrides (camelCase keys, any subset).
    #[arg(long, value_name = "FILE.json")]
    pub params: Option<PathBuf>,

    /// JSON file with model constants (thresholds, sample counts, ...).
    #[arg(long, value_name = "FILE.json")]
    pub tuning: Option<PathBuf>,

    #[arg(long, value_name = "0..1")]
    pub grain: Option<f32>,
    #[arg(long, value_name = "0..1")]
    pub warmth: Option<f32>,
    #[arg(long, value_name = "0..1")]
    pub contrast: Option<f32>,
    #[arg(long, value_name = "0..1.5")]
    pub saturation: Option<f32>,
    #[arg(long, value_name = "0..1")]
    pub vignette: Option<f32>,
    #[arg(long, value_name = "0..1")]
    pub fade: Option<f32>,
    #[arg(long, value_name = "0..1")]
    pub halation: Option<f32>,
    #[arg(long, value_name = "0..1")]
    pub bloom: Option<f32>,
    #[arg(long, value_name = "0..2")]
    pub highlights: Option<f32>,
    #[arg(long, value_name = "0..2")]
    pub shadows: Option<f32>,
    #[arg(long, value_name = "PIXELS")]
    pub grain_size: Option<f32>,
    /// Force black-and-white output.
    #[arg(long)]
    pub bw: bool,

    /// Output format: png or jpeg. Defaults to the --output extension, then
    /// to the input's own format.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<ExportFormat>,

    /// JPEG quality in 0..1.
    #[arg(short, long, default_value_t = DEFAULT_EXPORT_QUALITY, value_name = "0..1")]
    pub quality: f32,

    /// Write a before/after split instead of the plain result; the original
    /// shows left of PERCENT.
    #[arg(long, value_name = "PERCENT")]
    pub compare: Option<f32>,

    /// Skip the GPU and render on the CPU.
    #[arg(long)]
    pub cpu: bool,

    /// GPU power preference: "high performance", "low power".
    #[arg(long, default_value = "high performance", value_name = "PREFERENCE")]
    pub gpu: String,

    /// Print the preset catalog and exit.
    #[arg(long)]
    pub list_presets: bool,

    /// Debug-level logging and per-file timing.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Parameter overrides given as individual flags.
    fn flag_edits(&self) -> PartialFilmParameters {
        PartialFilmParameters {
            grain_intensity: self.grain,
            warmth: self.warmth,
            contrast: self.contrast,
            saturation: self.saturation,
            vignette: self.vignette,
            fade: self.fade,
            halation: self.halation,
            bloom: self.bloom,
            highlights: self.highlights,
            shadows: self.shadows,
            grain_size: self.grain_size,
            black_and_white: self.bw.then_some(true),
            ..Default::default()
        }
    }
}

/// Everything that is the same for every file of a batch.
struct Job {
    preset: PresetLabel,
    edits: PartialFilmParameters,
    tuning: FilmTuning,
    format: Option<ExportFormat>,
    quality: f32,
    compare: Option<f32>,
    output: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    if args.list_presets {
        print_presets();
        return ExitCode::SUCCESS;
    }

    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let file_edits = match &args.params {
        Some(path) => match read_json::<PartialFilmParameters>(path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => PartialFilmParameters::default(),
    };
    let tuning = match &args.tuning {
        Some(path) => match read_json::<FilmTuning>(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => FilmTuning::default(),
    };

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
        return ExitCode::FAILURE;
    }

    let job = Job {
        preset: args.preset.unwrap_or_default(),
        edits: file_edits.overlay(&args.flag_edits()),
        tuning,
        format: args.format.or_else(|| args.output.as_deref().and_then(format_from_path)),
        quality: args.quality,
        compare: args.compare,
        output: args.output.clone(),
        output_dir: args.output_dir.clone(),
        verbose: args.verbose,
    };

    if !args.cpu {
        match WgpuBackend::new(&args.gpu).and_then(FilmRenderer::new) {
            Ok(mut renderer) => return process_all(&mut renderer, &inputs, &job),
            Err(e) => log::warn!("GPU renderer unavailable ({}), using the CPU renderer", e),
        }
    }

    match FilmRenderer::new(CpuBackend::new()) {
        Ok(mut renderer) => process_all(&mut renderer, &inputs, &job),
        Err(e) => {
            eprintln!("error: could not start the renderer: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn process_all<B: RenderBackend>(renderer: &mut FilmRenderer<B>, inputs: &[PathBuf], job: &Job) -> ExitCode {
    if let Err(e) = renderer.set_tuning(job.tuning) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }
    log::info!("rendering {} file(s) with {}", inputs.len(), renderer.backend().name());

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || job.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        match run_one(renderer, input_path, job) {
            Ok(output_path) => {
                if job.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                log::error!("{}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one<B: RenderBackend>(renderer: &mut FilmRenderer<B>, input: &Path, job: &Job) -> Result<PathBuf, String> {
    // -- Step 1: Load ----------------------------------------------------
    let loaded = io::load_source(input).map_err(|e| format!("load failed: {}", e))?;
    renderer.load_image(&loaded.image).map_err(|e| e.to_string())?;

    // -- Step 2: Parameters (each edit redraws) --------------------------
    match job.preset {
        PresetLabel::Preset(name) => renderer.apply_preset(name),
        PresetLabel::Custom => renderer.reset_parameters(),
    }
    .map_err(|e| e.to_string())?;
    renderer.apply_parameters(&job.edits).map_err(|e| e.to_string())?;
    if renderer.state() != RendererState::Rendered {
        renderer.render().map_err(|e| e.to_string())?;
    }

    // -- Step 3: Encode + save -------------------------------------------
    let format = job.format.unwrap_or_else(|| ExportFormat::from(loaded.format));
    let bytes = match job.compare {
        Some(position) => {
            let processed = renderer.read_pixels().map_err(|e| e.to_string())?;
            let split = split_compare(&loaded.image, &processed, position).map_err(|e| e.to_string())?;
            io::encode_image(&split, format, job.quality).map_err(|e| format!("encode failed: {}", e))?
        }
        None => renderer.export_image(format, job.quality).map_err(|e| e.to_string())?,
    };

    let output = build_output_path(input, job.output.as_deref(), job.output_dir.as_deref(), format);
    std::fs::write(&output, bytes).map_err(|e| format!("save failed: {}", e))?;
    Ok(output)
}

// ============================================================================
// Helpers
// ============================================================================

fn print_presets() {
    for name in FilmPresetName::all() {
        let stock = if name.is_film_stock() { " (film stock)" } else { "" };
        println!("{:<22} {:<28} {}{}", name.id(), name.display_name(), name.kind().label(), stock);
    }
    println!("{:<22} {}", PresetLabel::CUSTOM_ID, "neutral starting point");
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid JSON in '{}': {}", path.display(), e))
}

fn format_from_path(path: &Path) -> Option<ExportFormat> {
    path.extension().and_then(|e| e.to_str()).and_then(|e| e.parse().ok())
}

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    log::warn!("pattern '{}' matched no files", pattern);
                }
            }
            Err(e) => {
                log::warn!("invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` joined with `filmstock-<stem>.<ext>`
/// 3. `filmstock-<stem>.<ext>` next to the input
fn build_output_path(input: &Path, output: Option<&Path>, output_dir: Option<&Path>, format: ExportFormat) -> PathBuf {
    if let Some(out) = output {
        return out.to_path_buf();
    }
    let name = input.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let file_name = io::export_file_name(&name, format);
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.parent().unwrap_or(Path::new(".")).join(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_priority() {
        let input = Path::new("shots/beach.jpg");
        assert_eq!(
            build_output_path(input, Some(Path::new("x.png")), Some(Path::new("out")), ExportFormat::Png),
            PathBuf::from("x.png")
        );
        assert_eq!(
            build_output_path(input, None, Some(Path::new("out")), ExportFormat::Jpeg),
            PathBuf::from("out/filmstock-beach.jpg")
        );
        assert_eq!(
            build_output_path(input, None, None, ExportFormat::Png),
            PathBuf::from("shots/filmstock-beach.png")
        );
    }

    #[test]
    fn flags_parse_into_edits() {
        let args = CliArgs::parse_from([
            "filmstock", "-i", "a.jpg", "--preset", "ilford-hp5", "--grain", "0.3", "--bw", "--format", "jpg",
        ]);
        assert_eq!(args.preset, Some(PresetLabel::Preset(FilmPresetName::IlfordHp5)));
        assert_eq!(args.format, Some(ExportFormat::Jpeg));
        let edits = args.flag_edits();
        assert_eq!(edits.grain_intensity, Some(0.3));
        assert_eq!(edits.black_and_white, Some(true));
        assert_eq!(edits.warmth, None);
    }

    #[test]
    fn list_presets_needs_no_input() {
        let args = CliArgs::try_parse_from(["filmstock", "--list-presets"]).unwrap();
        assert!(args.list_presets && args.input.is_empty());
        assert!(CliArgs::try_parse_from(["filmstock"]).is_err());
    }

    #[test]
    fn output_format_follows_extension() {
        assert_eq!(format_from_path(Path::new("a/b.JPG")), Some(ExportFormat::Jpeg));
        assert_eq!(format_from_path(Path::new("a/b.tif")), None);
    }
}
