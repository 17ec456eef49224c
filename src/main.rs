use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pdf_imaging::config::CompressionOptions;
use pdf_imaging::extract::{DEFAULT_RESOLVE_TIMEOUT, extract_images};
use pdf_imaging::pipeline::compressor::compress_document;
use pdf_imaging::pipeline::paginate::capture_to_document;
use pdf_imaging::render::RenderEngine;

const USAGE: &str = "Usage: pdf_imaging <command> [options] <args>
  extract  <input.pdf>...             write <input>.images.zip next to each input
  compress <input.pdf> <output.pdf>   re-encode every page as a lossy full-page image
  paginate <capture.png> <output.pdf> slice a tall capture into fixed-height pages
Options:
  --options <file.yaml>   load compression options from YAML
  --quality <1-100>       JPEG quality (default 50)
  --dpi <36-600>          capture resolution (default 150)
  --no-full-page          apply the graphics quality floor
  --page-size <WxH>       page size in points for paginate (default 612x792)";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{USAGE}");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("pdf_imaging {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let command = args[0].as_str();
    let (options, positional) = match parse_options(&args[1..]) {
        Ok(parsed) => parsed,
        Err(msg) => {
            eprintln!("ERROR: {msg}");
            return ExitCode::FAILURE;
        }
    };

    match command {
        "extract" => run_extract(&positional),
        "compress" => run_compress(&positional, &options),
        "paginate" => run_paginate(&positional, &options),
        other => {
            eprintln!("ERROR: Unknown command '{other}'");
            eprintln!("{USAGE}");
            ExitCode::FAILURE
        }
    }
}

struct CliOptions {
    compression: CompressionOptions,
    page_size_pts: (f64, f64),
}

/// Split flags from positional arguments. Flag values from `--options` are
/// applied first, explicit flags override them.
fn parse_options(args: &[String]) -> Result<(CliOptions, Vec<String>), String> {
    let mut compression = CompressionOptions::default();
    // US Letter in points.
    let mut page_size_pts = (612.0, 792.0);
    let mut positional = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--options" => {
                let path = next_value(args, &mut i, arg)?;
                compression = CompressionOptions::from_file(Path::new(&path))
                    .map_err(|e| format!("Failed to load {path}: {e}"))?;
            }
            "--quality" => {
                let value = next_value(args, &mut i, arg)?;
                compression.image_quality = value
                    .parse()
                    .map_err(|_| format!("Invalid quality: '{value}'"))?;
            }
            "--dpi" => {
                let value = next_value(args, &mut i, arg)?;
                compression.dpi = value.parse().map_err(|_| format!("Invalid dpi: '{value}'"))?;
            }
            "--no-full-page" => compression.full_page_mode = false,
            "--page-size" => {
                let value = next_value(args, &mut i, arg)?;
                let (w, h) = value
                    .split_once('x')
                    .ok_or_else(|| format!("Invalid page size: '{value}' (expected WxH)"))?;
                let w: f64 = w.parse().map_err(|_| format!("Invalid page width: '{w}'"))?;
                let h: f64 = h
                    .parse()
                    .map_err(|_| format!("Invalid page height: '{h}'"))?;
                page_size_pts = (w, h);
            }
            _ => positional.push(args[i].clone()),
        }
        i += 1;
    }

    compression.validate().map_err(|e| e.to_string())?;

    Ok((
        CliOptions {
            compression,
            page_size_pts,
        },
        positional,
    ))
}

fn next_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("Missing value for {flag}"))
}

#[cfg(feature = "render")]
fn create_engine() -> Option<pdf_imaging::render::pdfium::PdfiumEngine> {
    match pdf_imaging::render::pdfium::PdfiumEngine::new() {
        Ok(engine) => Some(engine),
        Err(e) => {
            eprintln!("WARNING: rendering engine unavailable: {e}");
            None
        }
    }
}

#[cfg(not(feature = "render"))]
fn create_engine() -> Option<NoEngine> {
    None
}

#[cfg(not(feature = "render"))]
struct NoEngine;

#[cfg(not(feature = "render"))]
impl RenderEngine for NoEngine {
    fn open<'a>(
        &'a self,
        _pdf_bytes: &[u8],
    ) -> pdf_imaging::Result<Box<dyn pdf_imaging::render::PageRenderer + 'a>> {
        Err(pdf_imaging::PdfImagingError::render(
            "built without the `render` feature",
        ))
    }
}

/// One archive per input; a failing input does not stop the remaining ones.
fn run_extract(inputs: &[String]) -> ExitCode {
    if inputs.is_empty() {
        eprintln!("ERROR: extract requires at least one input PDF");
        return ExitCode::FAILURE;
    }

    let engine = create_engine();
    let engine_ref = engine.as_ref().map(|e| e as &dyn RenderEngine);

    let mut has_error = false;
    for input in inputs {
        let result = std::fs::read(input)
            .map_err(pdf_imaging::PdfImagingError::from)
            .and_then(|bytes| extract_images(&bytes, engine_ref, DEFAULT_RESOLVE_TIMEOUT))
            .and_then(|archive| {
                let output = archive_path(input);
                std::fs::write(&output, archive)?;
                Ok(output)
            });

        match result {
            Ok(output) => eprintln!("OK: {input} -> {}", output.display()),
            Err(e) => {
                eprintln!("ERROR: {input}: {e}");
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn archive_path(input: &str) -> PathBuf {
    let path = Path::new(input);
    match path.file_stem() {
        Some(stem) => path.with_file_name(format!("{}.images.zip", stem.to_string_lossy())),
        None => PathBuf::from(format!("{input}.images.zip")),
    }
}

fn run_compress(positional: &[String], options: &CliOptions) -> ExitCode {
    let [input, output] = positional else {
        eprintln!("ERROR: compress requires <input.pdf> <output.pdf>");
        return ExitCode::FAILURE;
    };

    let Some(engine) = create_engine() else {
        eprintln!("ERROR: compress requires a rendering engine");
        return ExitCode::FAILURE;
    };

    let result = std::fs::read(input)
        .map_err(pdf_imaging::PdfImagingError::from)
        .and_then(|bytes| compress_document(&bytes, &options.compression, &engine))
        .and_then(|pdf| {
            std::fs::write(output, pdf)?;
            Ok(())
        });

    match result {
        Ok(()) => {
            eprintln!("OK: {input} -> {output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: {input} -> {output}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_paginate(positional: &[String], options: &CliOptions) -> ExitCode {
    let [input, output] = positional else {
        eprintln!("ERROR: paginate requires <capture.png> <output.pdf>");
        return ExitCode::FAILURE;
    };

    let (width_pts, height_pts) = options.page_size_pts;
    let result = image::open(input)
        .map_err(pdf_imaging::PdfImagingError::from)
        .and_then(|capture| {
            capture_to_document(
                &capture.to_rgba8(),
                width_pts,
                height_pts,
                &options.compression,
            )
        })
        .and_then(|pdf| {
            std::fs::write(output, pdf)?;
            Ok(())
        });

    match result {
        Ok(()) => {
            eprintln!("OK: {input} -> {output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("ERROR: {input} -> {output}: {e}");
            ExitCode::FAILURE
        }
    }
}
