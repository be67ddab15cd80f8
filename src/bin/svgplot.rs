//! Plot SVG line art on a pen plotter or vinyl cutter
#![deny(warnings)]

use std::{
    env,
    fs::{self, File},
    io::{Read, Write},
};
use svgplot::*;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

type Error = Box<dyn std::error::Error>;

const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Show,
    Bounds,
    Plot,
}

/// Plot settings given as individual flags, they take precedence over `-C`
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Overrides {
    scale: Option<Scalar>,
    offset_x: Option<Scalar>,
    offset_y: Option<Scalar>,
    overcut: Option<Scalar>,
    no_mirror: bool,
}

impl Overrides {
    fn apply(&self, mut config: PlotConfig) -> PlotConfig {
        config.scale = self.scale.unwrap_or(config.scale);
        config.offset_x = self.offset_x.unwrap_or(config.offset_x);
        config.offset_y = self.offset_y.unwrap_or(config.offset_y);
        config.overcut = self.overcut.unwrap_or(config.overcut);
        config.mirror_y = config.mirror_y && !self.no_mirror;
        config
    }
}

#[derive(Debug)]
struct Args {
    input_file: String,
    device: Option<String>,
    dialect: Option<Dialect>,
    config: PlotConfig,
    action: Action,
}

impl Args {
    fn parse() -> Result<Args, Error> {
        let mut result = Args {
            input_file: String::new(),
            device: None,
            dialect: None,
            config: PlotConfig::default(),
            action: Action::Show,
        };
        let mut positional = 0;
        let mut config_file = None;
        let mut overrides = Overrides::default();
        let mut args = env::args();
        let cmd = args.next().unwrap_or_else(|| "svgplot".to_owned());
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "-h" => {
                    positional = 0;
                    break;
                }
                "-d" => {
                    result.device = Some(args.next().ok_or("-d requires argument")?);
                }
                "-l" => {
                    let dialect = args.next().ok_or("-l requires argument")?;
                    result.dialect = Some(dialect.parse()?);
                }
                "-s" => {
                    overrides.scale = Some(args.next().ok_or("-s requires argument")?.parse()?);
                }
                "-x" => {
                    overrides.offset_x = Some(args.next().ok_or("-x requires argument")?.parse()?);
                }
                "-y" => {
                    overrides.offset_y = Some(args.next().ok_or("-y requires argument")?.parse()?);
                }
                "-c" => {
                    overrides.overcut = Some(args.next().ok_or("-c requires argument")?.parse()?);
                }
                "-n" => {
                    overrides.no_mirror = true;
                }
                "-C" => {
                    config_file = Some(args.next().ok_or("-C requires argument")?);
                }
                _ => {
                    positional += 1;
                    match positional {
                        1 => result.input_file = arg,
                        2 => {
                            result.action = match arg.as_ref() {
                                "show" | "s" => Action::Show,
                                "bounds" => Action::Bounds,
                                "plot" => Action::Plot,
                                _ => return Err(format!("unknown action: {}", arg).into()),
                            }
                        }
                        _ => return Err("unexpected positional argument".into()),
                    }
                }
            }
        }
        if positional < 1 {
            eprintln!("Plot SVG line art on a pen plotter or vinyl cutter");
            eprintln!("\nUSAGE:");
            eprintln!(
                "    {} [-d <device>] [-l <language>] [-s <scale>] [-x <offset>] [-y <offset>] [-c <overcut>] [-n] [-C <config.json>] <file.svg> [show|bounds|plot]",
                cmd
            );
            eprintln!("\nARGS:");
            eprintln!(
                "    -d <device>        device path (default: first /dev/ttyUSB*, '-' means stdout)"
            );
            eprintln!("    -l <language>      plotter language: hpgl or dpml");
            eprintln!("    -s <scale>         scale (default: 1.0)");
            eprintln!("    -x <offset>        x offset in mm (default: 0.0)");
            eprintln!("    -y <offset>        y offset in mm (default: 0.0)");
            eprintln!("    -c <overcut>       overcut in mm (default: 0.0)");
            eprintln!("    -n                 do not mirror the y axis");
            eprintln!("    -C <config.json>   load plot settings from JSON file, flags above override it");
            eprintln!("    <file.svg>         SVG file with width/height in mm ('-' means stdin)");
            eprintln!("    show               show drawing size and plot settings (default)");
            eprintln!("    bounds             move the pen around the plot area without drawing");
            eprintln!("    plot               plot the drawing");
            std::process::exit(1);
        }
        if let Some(path) = config_file {
            result.config = load_config(&path)?;
        }
        result.config = overrides.apply(result.config);
        result.config.validate()?;
        Ok(result)
    }

    /// Explicit device or the first USB serial device
    fn device(&self) -> String {
        if let Some(device) = &self.device {
            return device.clone();
        }
        let mut candidates: Vec<String> = fs::read_dir("/dev")
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with("ttyUSB"))
            .collect();
        candidates.sort();
        candidates
            .into_iter()
            .next()
            .map_or_else(|| DEFAULT_DEVICE.to_owned(), |name| format!("/dev/{}", name))
    }
}

#[cfg(feature = "serde")]
fn load_config(path: &str) -> Result<PlotConfig, Error> {
    Ok(PlotConfig::from_json(File::open(path)?)?)
}

#[cfg(not(feature = "serde"))]
fn load_config(_path: &str) -> Result<PlotConfig, Error> {
    Err("loading configuration requires `serde` feature".into())
}

/// Load document from the file
fn document_load(path: &str) -> Result<Document, Error> {
    let mut contents = String::new();
    if path != "-" {
        File::open(path)?.read_to_string(&mut contents)?;
    } else {
        std::io::stdin().read_to_string(&mut contents)?;
    }
    Ok(tracing::debug_span!("[parse]").in_scope(|| Document::parse(&contents))?)
}

/// Write commands to the device, `-` means stdout
fn device_write(device: &str, commands: &str) -> Result<(), Error> {
    let _span = tracing::debug_span!("[write]", device, bytes = commands.len()).entered();
    if device != "-" {
        let mut file = File::create(device)?;
        file.write_all(commands.as_bytes())?;
        file.flush()?;
    } else {
        let mut stdout = std::io::stdout();
        stdout.write_all(commands.as_bytes())?;
        stdout.flush()?;
    }
    Ok(())
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse()?;
    let device = args.device();
    let config = args.config;

    let document = document_load(&args.input_file)?;
    let drawing = tracing::debug_span!("[drawing]")
        .in_scope(|| document.drawing(config.mirror_y))?;

    let dialect = match (args.action, args.dialect) {
        (Action::Show, _) => {
            eprintln!("{}", drawing.summary(&config)?);
            eprintln!(
                "Device:    device: {}  language: {}",
                device,
                args.dialect.map_or("-", |dialect| dialect.name())
            );
            return Ok(());
        }
        (_, None) => return Err("language not set, use -l hpgl|dpml".into()),
        (_, Some(dialect)) => dialect,
    };

    let commands = match args.action {
        Action::Bounds => {
            let outline = drawing.bounds_outline(&config)?;
            encode(&outline, dialect, false, 0.0, 0.0)
        }
        _ => {
            let placed = tracing::debug_span!("[plot]").in_scope(|| drawing.plot(&config))?;
            encode(&placed, dialect, true, config.offset_x, config.offset_y)
        }
    };
    tracing::info!(
        "[{:?}] device={} language={} bytes={}",
        args.action,
        device,
        dialect,
        commands.len()
    );
    device_write(&device, &commands)
}
