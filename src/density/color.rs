use anyhow::{Result, anyhow, bail};
use clap::ValueEnum;
use hex_color::HexColor;
use plotters::prelude::{BlackWhite, Color, RGBAColor, RGBColor, ViridisRGB};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fade {
    #[default]
    Transparent,
    White,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SingleColorMap {
    pub color: RGBColor,
    pub fade: Fade,
}

impl SingleColorMap {
    pub fn new(color: RGBColor) -> SingleColorMap {
        SingleColorMap {
            color,
            fade: Fade::Transparent,
        }
    }

    pub fn with_fade(self, fade: Fade) -> SingleColorMap {
        SingleColorMap { fade, ..self }
    }

    pub fn get_color(&self, t: f64) -> RGBAColor {
        let t = t.clamp(0.0, 1.0);
        match self.fade {
            Fade::Transparent => self.color.mix(t),
            Fade::White => {
                let RGBColor(r, g, b) = self.color;
                RGBAColor(lerp(255, r, t), lerp(255, g, t), lerp(255, b, t), 1.0)
            }
        }
    }
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

const MAGMA: [(u8, u8, u8); 9] = [
    (0x00, 0x00, 0x04),
    (0x1c, 0x10, 0x44),
    (0x4f, 0x12, 0x7b),
    (0x81, 0x25, 0x81),
    (0xb5, 0x36, 0x7a),
    (0xe5, 0x50, 0x64),
    (0xfb, 0x87, 0x61),
    (0xfe, 0xc2, 0x87),
    (0xfc, 0xfd, 0xbf),
];

#[derive(Clone, Debug, PartialEq)]
pub struct GradientMap {
    anchors: Vec<RGBColor>,
}

impl GradientMap {
    pub fn new(anchors: Vec<RGBColor>) -> Result<GradientMap> {
        if anchors.len() < 2 {
            bail!("a gradient needs at least two anchor colors");
        }
        Ok(GradientMap { anchors })
    }

    fn from_table(table: &[(u8, u8, u8)]) -> GradientMap {
        GradientMap {
            anchors: table.iter().map(|&(r, g, b)| RGBColor(r, g, b)).collect(),
        }
    }

    pub fn get_color(&self, t: f64) -> RGBAColor {
        let pos = t.clamp(0.0, 1.0) * (self.anchors.len() - 1) as f64;
        let i = (pos as usize).min(self.anchors.len() - 2);
        let frac = pos - i as f64;
        let (RGBColor(r0, g0, b0), RGBColor(r1, g1, b1)) = (self.anchors[i], self.anchors[i + 1]);
        RGBAColor(lerp(r0, r1, frac), lerp(g0, g1, frac), lerp(b0, b1, frac), 1.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Colormap {
    Single(SingleColorMap),
    #[default]
    Viridis,
    Gray,
    Gradient(GradientMap),
}

impl Colormap {
    pub fn named(name: &str) -> Result<Colormap> {
        match name {
            "viridis" => Ok(Colormap::Viridis),
            "magma" => Ok(Colormap::Gradient(GradientMap::from_table(&MAGMA))),
            "gray" | "grey" => Ok(Colormap::Gray),
            _ => bail!("unknown colormap: {name:?} (expected viridis, magma, or gray)"),
        }
    }

    pub fn get_color(&self, t: f64) -> RGBAColor {
        let t = t.clamp(0.0, 1.0);
        match self {
            Colormap::Single(m) => m.get_color(t),
            Colormap::Viridis => ViridisRGB::get_color(t).to_rgba(),
            Colormap::Gray => BlackWhite::get_color(t).to_rgba(),
            Colormap::Gradient(m) => m.get_color(t),
        }
    }
}

pub fn parse_color(s: &str) -> Result<RGBColor> {
    let named = match s {
        "black" => Some(RGBColor(0, 0, 0)),
        "white" => Some(RGBColor(255, 255, 255)),
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 128, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        "orange" => Some(RGBColor(255, 165, 0)),
        "purple" => Some(RGBColor(128, 0, 128)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        _ => None,
    };
    if let Some(color) = named {
        return Ok(color);
    }
    let hex = HexColor::parse(s).map_err(|e| anyhow!("failed to parse color {s:?}: {e}"))?;
    Ok(RGBColor(hex.r, hex.g, hex.b))
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stretch {
    #[default]
    Linear,
    Log,
    Sqrt,
}

/// Maps a value into [0, 1] given the display range, then applies a stretch.
/// Literal `vmin` / `vmax` here take over the surface's clim when installed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Normalize {
    pub stretch: Stretch,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    pub log_a: f64,
}

impl Normalize {
    pub fn new(stretch: Stretch) -> Normalize {
        Normalize {
            stretch,
            vmin: None,
            vmax: None,
            log_a: 1000.0,
        }
    }

    pub fn with_limits(self, vmin: Option<f64>, vmax: Option<f64>) -> Normalize {
        Normalize { vmin, vmax, ..self }
    }

    pub fn scale(&self, v: f64, vmin: f64, vmax: f64) -> f64 {
        let span = vmax - vmin;
        let t = if span > 0.0 && span.is_finite() {
            ((v - vmin) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        match self.stretch {
            Stretch::Linear => t,
            Stretch::Log => (self.log_a * t).ln_1p() / self.log_a.ln_1p(),
            Stretch::Sqrt => t.sqrt(),
        }
    }
}

impl Default for Normalize {
    fn default() -> Normalize {
        Normalize::new(Stretch::Linear)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ColorPicker<'a> {
    colormap: &'a Colormap,
    norm: Normalize,
    vmin: f64,
    vmax: f64,
    alpha: f64,
}

impl<'a> ColorPicker<'a> {
    pub fn new(colormap: &'a Colormap, norm: Normalize, (vmin, vmax): (f64, f64), alpha: f64) -> ColorPicker<'a> {
        ColorPicker {
            colormap,
            norm,
            vmin,
            vmax,
            alpha,
        }
    }

    pub fn get_color(&self, v: f64) -> Option<RGBAColor> {
        if v.is_nan() {
            return None;
        }
        let RGBAColor(r, g, b, a) = self.colormap.get_color(self.norm.scale(v, self.vmin, self.vmax));
        Some(RGBAColor(r, g, b, a * self.alpha))
    }
}
