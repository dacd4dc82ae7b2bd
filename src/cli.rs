// ============================================================================
// Rasterly CLI — headless batch processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   rasterly -i photo.png -o small.png --resize 320x240
//   rasterly -i photo.jpg -o out.bmp                     (format inferred from output ext)
//   rasterly -i "shots/*.png" --output-dir gray/ --grayscale --format jpeg
//   rasterly -i scan.png -o fixed.png --crop 10,10,400,300 --rotate 90 --contrast 20
//
// Every file goes through a real EditorSession, so each step is the same
// operation an interactive user would apply.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::canvas::Rect;
use crate::components::dialogs::SaveFormat;
use crate::io::save_image;
use crate::ops::adjustments::Filter;
use crate::project::EditorSession;
use crate::surface::FrameRecorder;
use crate::{log_err, log_info};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Rasterly headless image processor.
#[derive(Parser, Debug)]
#[command(
    name = "rasterly",
    version,
    about = "Rasterly headless batch image processor",
    long_about = "Crop, resize, rotate and filter image files without an interactive\n\
                  session. Reads anything the image codecs understand; writes PNG,\n\
                  JPEG or BMP.\n\n\
                  Steps run in this order: crop, resize, rotate, grayscale, invert,\n\
                  brightness/contrast.\n\n\
                  Example:\n  \
                  rasterly -i photo.png -o small.png --resize 320x240\n  \
                  rasterly -i \"*.jpg\" --output-dir out/ --grayscale --format png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, bmp.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1–100). Defaults to the `jpeg_quality` setting.
    #[arg(short, long, value_name = "1-100", value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Crop to X,Y,W,H before anything else.
    #[arg(long, value_name = "X,Y,W,H", value_parser = parse_crop)]
    pub crop: Option<Rect>,

    /// Resample to WxH.
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    pub resize: Option<(u32, u32)>,

    /// Rotate counter-clockwise by DEG degrees (canvas grows to fit).
    #[arg(long, value_name = "DEG", allow_negative_numbers = true)]
    pub rotate: Option<f64>,

    #[arg(long)]
    pub grayscale: bool,

    #[arg(long)]
    pub invert: bool,

    /// Brightness adjustment, -100..100.
    #[arg(long, value_name = "N", allow_negative_numbers = true,
          value_parser = clap::value_parser!(i32).range(-100..=100))]
    pub brightness: Option<i32>,

    /// Contrast adjustment, -100..100.
    #[arg(long, value_name = "N", allow_negative_numbers = true,
          value_parser = clap::value_parser!(i32).range(-100..=100))]
    pub contrast: Option<i32>,

    /// Print per-file steps and timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Filters in the order they are applied.
    pub fn filters(&self) -> Vec<Filter> {
        let mut filters = Vec::new();
        if self.grayscale {
            filters.push(Filter::Grayscale);
        }
        if self.invert {
            filters.push(Filter::Invert);
        }
        if self.brightness.is_some() || self.contrast.is_some() {
            filters.push(Filter::BrightnessContrast {
                brightness: self.brightness.unwrap_or(0),
                contrast: self.contrast.unwrap_or(0),
            });
        }
        filters
    }
}

fn parse_crop(s: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, w, h] = parts.as_slice() else {
        return Err(format!("expected X,Y,W,H, got '{}'", s));
    };
    let x = x.parse::<i32>().map_err(|e| format!("bad X: {}", e))?;
    let y = y.parse::<i32>().map_err(|e| format!("bad Y: {}", e))?;
    let w = w.parse::<u32>().map_err(|e| format!("bad W: {}", e))?;
    let h = h.parse::<u32>().map_err(|e| format!("bad H: {}", e))?;
    if w == 0 || h == 0 {
        return Err("crop width and height must be positive".to_string());
    }
    Ok(Rect::from_origin_size(x, y, w, h))
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("bad width: {}", e))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("bad height: {}", e))?;
    Ok((w, h))
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs, default_quality: u8) -> ExitCode {
    // Resolve glob patterns / literal paths → concrete PathBufs
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    // Multiple inputs require --output-dir, not --output
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let save_format = parse_format(args.format.as_deref(), args.output.as_deref());
    let quality = args.quality.unwrap_or(default_quality);

    // Create output directory if specified
    if let Some(dir) = &args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("error: could not create output directory '{}': {}", dir.display(), e);
            return ExitCode::FAILURE;
        }
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let Some(output_path) =
            build_output_path(input_path, args.output.as_deref(), args.output_dir.as_deref(), save_format)
        else {
            eprintln!("  error: cannot determine output path for '{}'.", input_path.display());
            any_failure = true;
            continue;
        };

        match run_one(input_path, &output_path, &args, save_format, quality) {
            Ok(frames) => {
                log_info!("cli: {} -> {}", input_path.display(), output_path.display());
                if args.verbose || multi {
                    println!(
                        "  → {} ({} frame(s), {:.0}ms)",
                        output_path.display(),
                        frames,
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                log_err!("cli: {}: {}", input_path.display(), e);
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

/// Returns how many frames the session presented along the way.
fn run_one(
    input: &Path,
    output: &Path,
    args: &CliArgs,
    format: SaveFormat,
    quality: u8,
) -> Result<usize, String> {
    // -- Step 1: Load ----------------------------------------------------
    let mut session = EditorSession::new(1, 1, crate::canvas::TRANSPARENT)
        .map_err(|e| e.to_string())?
        .with_surface(FrameRecorder::new());
    session.open(input).map_err(|e| format!("load failed: {}", e))?;

    // -- Step 2: Geometry ------------------------------------------------
    if let Some(rect) = args.crop {
        session.crop(rect).map_err(|e| format!("crop failed: {}", e))?;
        verbose_step(args, "crop", &session);
    }
    if let Some((w, h)) = args.resize {
        session.resize(w, h).map_err(|e| format!("resize failed: {}", e))?;
        verbose_step(args, "resize", &session);
    }
    if let Some(angle) = args.rotate {
        session.rotate(angle);
        verbose_step(args, "rotate", &session);
    }

    // -- Step 3: Filters -------------------------------------------------
    for filter in args.filters() {
        session.apply_filter(filter);
        verbose_step(args, filter.label(), &session);
    }

    // -- Step 4: Save ----------------------------------------------------
    save_image(session.buffer(), output, format, quality).map_err(|e| format!("save failed: {}", e))?;

    Ok(session.surface().frame_count())
}

fn verbose_step(args: &CliArgs, step: &str, session: &EditorSession<FrameRecorder>) {
    if args.verbose {
        let buf = session.buffer();
        println!("  {} → {}x{}", step, buf.width(), buf.height());
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
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
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    if let Some(f) = format_arg {
        return SaveFormat::from_extension(f).unwrap_or_default();
    }
    output.and_then(SaveFormat::from_path).unwrap_or_default()
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}
