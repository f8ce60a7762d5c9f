mod parser;

use crate::parser::{PointParser, Points};
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use densmap::{AxisScale, DensityAxes, DensityConfig, Dpi, Event, Fade, Figure, Limit, Origin, PAN_ZOOM_MODE, Stretch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{BufRead, BufReader};
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(version, about = "render a point cloud as a density map")]
pub struct Args {
    #[clap(help = "table of `x y [weight]` rows; \"-\" reads stdin", default_value = "-")]
    pub input: String,

    #[clap(long, help = "generate this many gaussian points instead of reading input")]
    pub demo: Option<usize>,

    #[clap(long, help = "random seed for --demo", default_value = "0")]
    pub seed: u64,

    #[clap(short = 'c', long, help = "yaml file with density options; flags override it")]
    pub config: Option<String>,

    #[clap(short = 'o', long, help = "output filename (.png or .svg)", default_value = "density.png")]
    pub output: String,

    #[clap(long, help = "figure width in inches", default_value = "6.4")]
    pub width: f64,

    #[clap(long, help = "figure height in inches", default_value = "4.8")]
    pub height: f64,

    #[clap(long, help = "figure pixels per inch", default_value = "100")]
    pub figure_dpi: f64,

    #[clap(long, help = "density map samples per inch, or \"native\" to follow the figure", value_parser = parse_dpi)]
    pub dpi: Option<Dpi>,

    #[clap(short = 'd', long, help = "bin size multiplier while panning")]
    pub downsample_factor: Option<usize>,

    #[clap(long, help = "single color ramp up to this color (name or hex)")]
    pub color: Option<String>,

    #[clap(long, help = "what the low end of a --color ramp fades to")]
    pub fade: Option<Fade>,

    #[clap(long, help = "viridis, magma, or gray")]
    pub colormap: Option<String>,

    #[clap(long, help = "layer opacity in [0, 1]")]
    pub alpha: Option<f64>,

    #[clap(long, help = "color stretch")]
    pub norm: Option<Stretch>,

    #[clap(long, help = "lower color limit: a number, min, max, median, or pNN", allow_hyphen_values = true)]
    pub vmin: Option<String>,

    #[clap(long, help = "upper color limit: a number, min, max, median, or pNN", allow_hyphen_values = true)]
    pub vmax: Option<String>,

    #[clap(long, help = "which end of the view row 0 sits at")]
    pub origin: Option<Origin>,

    #[clap(long, help = "x limits as \"left,right\" (defaults to the data range)", value_parser = parse_pair, allow_hyphen_values = true)]
    pub xlim: Option<(f64, f64)>,

    #[clap(long, help = "y limits as \"bottom,top\" (defaults to the data range)", value_parser = parse_pair, allow_hyphen_values = true)]
    pub ylim: Option<(f64, f64)>,

    #[clap(long, help = "log-scaled x axis")]
    pub xlog: bool,

    #[clap(long, help = "log-scaled y axis")]
    pub ylog: bool,

    #[clap(long, help = "keep the last image while panning instead of recomputing")]
    pub no_update_while_interacting: bool,

    #[clap(long, help = "render as if a pan/zoom drag were in progress")]
    pub interacting: bool,
}

fn parse_dpi(s: &str) -> Result<Dpi> {
    if s == "native" {
        return Ok(Dpi::Native);
    }
    let dpi = s.parse::<f64>().map_err(|_| anyhow!("dpi should be a number or \"native\", got {s:?}"))?;
    Ok(Dpi::Fixed(dpi))
}

fn parse_pair(s: &str) -> Result<(f64, f64)> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| anyhow!("expected two comma-separated numbers, got {s:?}"))?;
    let num = |v: &str| v.trim().parse::<f64>().map_err(|_| anyhow!("not a number: {v:?}"));
    Ok((num(a)?, num(b)?))
}

impl Args {
    fn density_config(&self) -> Result<DensityConfig> {
        let mut config = match &self.config {
            Some(path) => DensityConfig::load(path)?,
            None => DensityConfig::default(),
        };
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        if let Some(factor) = self.downsample_factor {
            config.downsample_factor = factor;
        }
        if self.color.is_some() {
            config.color = self.color.clone();
        }
        if let Some(fade) = self.fade {
            config.fade = fade;
        }
        if let Some(colormap) = &self.colormap {
            config.colormap = colormap.clone();
            if self.color.is_none() {
                config.color = None;
            }
        }
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(norm) = self.norm {
            config.norm = norm;
        }
        if let Some(vmin) = &self.vmin {
            config.vmin = Some(vmin.parse::<Limit>()?);
        }
        if let Some(vmax) = &self.vmax {
            config.vmax = Some(vmax.parse::<Limit>()?);
        }
        if let Some(origin) = self.origin {
            config.origin = origin;
        }
        if self.no_update_while_interacting {
            config.update_while_interacting = false;
        }
        config.validate()?;
        Ok(config)
    }

    fn load_points(&self) -> Result<Points> {
        if let Some(n) = self.demo {
            return Ok(gaussian_clusters(n, self.seed));
        }
        let reader: Box<dyn BufRead> = if self.input == "-" {
            Box::new(BufReader::new(std::io::stdin()))
        } else {
            let file = std::fs::File::open(&self.input).with_context(|| format!("failed to open {}", self.input))?;
            Box::new(BufReader::new(file))
        };
        Points::from_parser(PointParser::new(reader.lines())).with_context(|| format!("failed to parse {}", self.input))
    }
}

fn standard_normal(rng: &mut StdRng) -> f64 {
    // Box-Muller
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn gaussian_clusters(n: usize, seed: u64) -> Points {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points = Points::default();
    for i in 0..n {
        let (a, b) = (standard_normal(&mut rng), standard_normal(&mut rng));
        let (x, y) = if i % 3 == 0 {
            (3.0 + 0.5 * a, 2.0 + 0.5 * b)
        } else {
            (a + 0.3 * b, 0.5 * a + 0.8 * b)
        };
        points.x.push(x);
        points.y.push(y);
    }
    points
}

fn log_invocation(args: impl Iterator<Item = String>) {
    let line = args
        .map(|a| if a.contains(char::is_whitespace) { format!("{a:?}") } else { a })
        .collect::<Vec<_>>()
        .join(" ");
    log::info!("invoked as: {line}");
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    log_invocation(std::env::args());

    let config = args.density_config()?;
    let points = args.load_points()?;
    if points.is_empty() {
        log::warn!("no points to bin; the density map will be blank");
    }
    log::info!(
        "{} points{}",
        points.len(),
        if points.weights.is_some() { " with weights" } else { "" }
    );

    let mut axes: DensityAxes = DensityAxes::new(Figure {
        size: (args.width, args.height),
        dpi: args.figure_dpi,
        resize_debounce: Some(Duration::from_millis(500)),
    });
    if args.xlog {
        axes.set_xscale(AxisScale::Log);
    }
    if args.ylog {
        axes.set_yscale(AxisScale::Log);
    }
    axes.scatter_density(points.x, points.y, points.weights, &config)?;
    if let Some((left, right)) = args.xlim {
        axes.set_xlim(left, right);
    }
    if let Some((bottom, top)) = args.ylim {
        axes.set_ylim(bottom, top);
    }

    if args.interacting {
        axes.set_tool_mode(Some(PAN_ZOOM_MODE));
        axes.dispatch(Event::Press);
    }
    axes.save(&args.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_dpi() {
        assert_eq!(parse_pair("-1, 2.5").unwrap(), (-1.0, 2.5));
        assert!(parse_pair("1").is_err());
        assert_eq!(parse_dpi("native").unwrap(), Dpi::Native);
        assert_eq!(parse_dpi("150").unwrap(), Dpi::Fixed(150.0));
        assert!(parse_dpi("high").is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from(["densmap", "--demo", "10", "--colormap", "magma", "--vmax", "p95", "-d", "2"]);
        let config = args.density_config().unwrap();
        assert_eq!(config.colormap, "magma");
        assert_eq!(config.downsample_factor, 2);
        assert!(config.vmax.is_some());
        assert!(config.update_while_interacting);

        let args = Args::parse_from(["densmap", "--color", "#0044ff", "--fade", "white"]);
        let config = args.density_config().unwrap();
        assert_eq!(config.fade, Fade::White);
        assert!(matches!(config.resolve_colormap().unwrap(), densmap::Colormap::Single(m) if m.fade == Fade::White));

        let args = Args::parse_from(["densmap", "--downsample-factor", "0"]);
        assert!(args.density_config().is_err());
    }

    #[test]
    fn demo_points_are_reproducible() {
        let a = gaussian_clusters(100, 7);
        let b = gaussian_clusters(100, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 100);
        assert!(a.x.iter().all(|v| v.is_finite()));
    }
}
