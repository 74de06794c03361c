//! Renders one level to a PNG, or dumps its decoded descriptors.
//!
//! Usage:
//!   sefview <assets-dir> <mode> <level> [--out <png>] [--scroll <x>,<y>]
//!           [--size <w>x<h>] [--elapsed-ms <n>] [--settings <file>]
//!           [--open <door>]... [--close <door>]... [--dump] [--log <file>] [--verbose]
//!   sefview <assets-dir> --cursor <name> [--verbose]

use std::env;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Context;
use serde_json::json;

use sef_core::DecodeStatus;
use sefview::assets::DirectorySource;
use sefview::level::{load_cursor, load_level};
use sefview::render_cache::RenderingCache;
use sefview::settings::{default_settings_path, load_settings_at};
use sefview::surface::RasterSurface;

const USAGE: &str = "Usage: sefview <assets-dir> <mode> <level> [--out <png>] [--scroll <x>,<y>] \
[--size <w>x<h>] [--elapsed-ms <n>] [--settings <file>] [--open <door>] [--close <door>] \
[--dump] [--log <file>] [--verbose]\n\
       sefview <assets-dir> --cursor <name> [--verbose]";

#[derive(Debug)]
struct Options {
    assets_dir: PathBuf,
    mode: Option<String>,
    level: Option<String>,
    out: Option<PathBuf>,
    scroll: (i32, i32),
    size: (u32, u32),
    elapsed: Duration,
    settings: Option<PathBuf>,
    cursor: Option<String>,
    door_changes: Vec<(String, bool)>,
    dump: bool,
    log_file: Option<String>,
    verbose: bool,
}

fn usage_error(message: &str) -> ! {
    eprintln!("Error: {message}");
    eprintln!("{USAGE}");
    process::exit(1);
}

fn parse_pair<T: std::str::FromStr>(raw: &str, separator: char) -> Option<(T, T)> {
    let (a, b) = raw.split_once(separator)?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

fn parse_args(args: &[String]) -> Options {
    let mut positional = Vec::new();
    let mut options = Options {
        assets_dir: PathBuf::new(),
        mode: None,
        level: None,
        out: None,
        scroll: (0, 0),
        size: (800, 600),
        elapsed: Duration::ZERO,
        settings: None,
        cursor: None,
        door_changes: Vec::new(),
        dump: false,
        log_file: None,
        verbose: false,
    };

    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        let mut value = || {
            i += 1;
            match args.get(i) {
                Some(v) => v.clone(),
                None => usage_error(&format!("{arg} requires an argument")),
            }
        };
        match arg {
            "--out" => options.out = Some(PathBuf::from(value())),
            "--scroll" => {
                let raw = value();
                options.scroll = parse_pair(&raw, ',')
                    .unwrap_or_else(|| usage_error(&format!("bad --scroll value '{raw}'")));
            }
            "--size" => {
                let raw = value();
                options.size = parse_pair(&raw, 'x')
                    .filter(|(w, h): &(u32, u32)| *w > 0 && *h > 0)
                    .unwrap_or_else(|| usage_error(&format!("bad --size value '{raw}'")));
            }
            "--elapsed-ms" => {
                let raw = value();
                let ms: u64 = raw
                    .parse()
                    .unwrap_or_else(|_| usage_error(&format!("bad --elapsed-ms value '{raw}'")));
                options.elapsed = Duration::from_millis(ms);
            }
            "--settings" => options.settings = Some(PathBuf::from(value())),
            "--cursor" => options.cursor = Some(value()),
            "--open" => options.door_changes.push((value(), true)),
            "--close" => options.door_changes.push((value(), false)),
            "--log" => options.log_file = Some(value()),
            "--dump" => options.dump = true,
            "--verbose" => options.verbose = true,
            "--help" | "-h" => {
                println!("{USAGE}");
                process::exit(0);
            }
            other if other.starts_with("--") => usage_error(&format!("unknown argument {other}")),
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    match positional.next() {
        Some(dir) => options.assets_dir = PathBuf::from(dir),
        None => usage_error("missing asset directory"),
    }
    options.mode = positional.next();
    options.level = positional.next();
    if positional.next().is_some() {
        usage_error("too many arguments");
    }
    if options.cursor.is_none() && options.level.is_none() {
        usage_error("missing game mode and level");
    }
    options
}

fn show_cursor(source: &DirectorySource, name: &str) -> anyhow::Result<()> {
    let decoded = load_cursor(source, name)?;
    let cursor = &decoded.value;
    let report = json!({
        "name": name,
        "status": decoded.status,
        "header": cursor.header,
        "frames": cursor.frames.iter().map(|f| f.len()).collect::<Vec<_>>(),
        "rates": cursor.rates,
        "sequence": cursor.sequence,
        "total_duration_ms": cursor.total_duration().as_millis() as u64,
        "frame_offsets_ms": cursor
            .frame_offsets()
            .iter()
            .map(|d| d.as_millis() as u64)
            .collect::<Vec<_>>(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serializing cursor report")?
    );
    Ok(())
}

fn run(options: Options) -> anyhow::Result<()> {
    let source = DirectorySource::new(&options.assets_dir);

    if let Some(name) = &options.cursor {
        return show_cursor(&source, name);
    }

    let (Some(mode), Some(level_name)) = (&options.mode, &options.level) else {
        anyhow::bail!("missing game mode and level");
    };

    let mut level = load_level(&source, mode, level_name)
        .with_context(|| format!("loading level {mode}/{level_name}"))?;
    if level.status != DecodeStatus::Complete {
        log::warn!("Level {level_name} was only partially decoded");
    }

    if options.dump {
        let report = json!({
            "mode": level.mode,
            "level": level.name,
            "status": level.status,
            "strings": level.strings,
            "scene": level.scene,
            "descriptor": level.descriptor,
            "animation_table": level.animation_table,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serializing level")?
        );
        return Ok(());
    }

    let settings_path = options.settings.unwrap_or_else(default_settings_path);
    let settings = load_settings_at(&settings_path);

    let mut cache = RenderingCache::new(settings);
    cache.build(&level);

    let mut toggled = false;
    for (name, opened) in &options.door_changes {
        if level.set_door_opened(name, *opened) {
            toggled = true;
        } else {
            log::warn!("No door named '{name}' in level {level_name}");
        }
    }
    if toggled {
        cache.invalidate();
    }

    let (width, height) = options.size;
    let mut surface = RasterSurface::new(width, height);
    cache.draw(&level, &mut surface, options.scroll, options.elapsed);

    for label in surface.labels() {
        log::debug!("label '{}' at {},{}", label.text, label.x, label.y);
    }

    let out = options
        .out
        .unwrap_or_else(|| PathBuf::from(format!("{level_name}.png")));
    surface
        .into_image()
        .save(&out)
        .with_context(|| format!("writing {}", out.display()))?;
    log::info!("Wrote {}", out.display());
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args);

    let log_level = if options.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    sef_core::initialize_logger(log_level, options.log_file.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to initialize logger: {}. Exiting.", e);
        process::exit(1);
    });

    if let Err(e) = run(options) {
        log::error!("{e:#}");
        process::exit(1);
    }
}
