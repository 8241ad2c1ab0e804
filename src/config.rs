use std::fs::OpenOptions;
use std::path::PathBuf;

use clap::Parser;
use env_logger::{Builder, Env, Target};

#[derive(Parser, Debug, Clone)]
#[command(name = "tui-globe", version, about)]
pub struct Args {
    /// GeoJSON FeatureCollection of country boundaries
    #[arg(long, default_value = "data/ne_110m_admin_0_countries.json")]
    pub data: PathBuf,

    /// Globe radius in world units; the camera and fog scale with it
    #[arg(long, default_value_t = 2.0, value_parser = parse_radius)]
    pub radius: f64,

    /// Number of background stars in globe mode
    #[arg(long, default_value_t = 1000)]
    pub stars: usize,

    /// Build outlines only; clicks never select anything
    #[arg(long, default_value_t = false)]
    pub no_picking: bool,

    /// Append a JSON line to this file for every selected country
    #[arg(long)]
    pub notify: Option<PathBuf>,

    /// Write logs here. The terminal belongs to the map, so without this
    /// nothing is logged.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn interactive(&self) -> bool {
        !self.no_picking
    }
}

fn parse_radius(s: &str) -> Result<f64, String> {
    let radius: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(format!("radius must be a positive number, got {radius}"))
    }
}

/// Route `log` output to `--log-file`, filtered by `RUST_LOG` (default `info`)
pub fn init_logging(args: &Args) -> std::io::Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}
