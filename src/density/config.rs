// @file config.rs
// @brief density surface options, loadable from yaml

use crate::density::clim::{Limit, Reducer};
use crate::density::color::{Colormap, Fade, Normalize, SingleColorMap, Stretch, parse_color};
use crate::density::provider::DensityProvider;
use crate::density::surface::{DensitySurface, Dpi, Origin};
use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum DpiRepr {
    Value(f64),
    Name(String),
}

impl TryFrom<DpiRepr> for Dpi {
    type Error = anyhow::Error;

    fn try_from(repr: DpiRepr) -> Result<Dpi> {
        match repr {
            DpiRepr::Value(v) => Ok(Dpi::Fixed(v)),
            DpiRepr::Name(s) if s == "native" => Ok(Dpi::Native),
            DpiRepr::Name(s) => Err(anyhow!("dpi should be a number or \"native\", got {s:?}")),
        }
    }
}

impl From<Dpi> for DpiRepr {
    fn from(dpi: Dpi) -> DpiRepr {
        match dpi {
            Dpi::Fixed(v) => DpiRepr::Value(v),
            Dpi::Native => DpiRepr::Name("native".to_string()),
        }
    }
}

mod dpi_serde {
    use super::{Dpi, DpiRepr};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(dpi: &Dpi, s: S) -> Result<S::Ok, S::Error> {
        DpiRepr::from(*dpi).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Dpi, D::Error> {
        Dpi::try_from(DpiRepr::deserialize(d)?).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DensityConfig {
    #[serde(with = "dpi_serde")]
    pub dpi: Dpi,
    pub downsample_factor: usize,
    pub update_while_interacting: bool,
    pub origin: Origin,
    pub color: Option<String>,
    pub fade: Fade,
    pub colormap: String,
    pub alpha: f64,
    pub norm: Stretch,
    pub vmin: Option<Limit>,
    pub vmax: Option<Limit>,
}

impl Default for DensityConfig {
    fn default() -> DensityConfig {
        DensityConfig {
            dpi: Dpi::default(),
            downsample_factor: 4,
            update_while_interacting: true,
            origin: Origin::default(),
            color: None,
            fade: Fade::default(),
            colormap: "viridis".to_string(),
            alpha: 1.0,
            norm: Stretch::default(),
            vmin: None,
            vmax: None,
        }
    }
}

impl DensityConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<DensityConfig> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).with_context(|| format!("failed to open config {}", path.display()))?;
        let config: DensityConfig =
            serde_yaml::from_reader(file).with_context(|| format!("failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.downsample_factor < 1 {
            bail!("downsample_factor should be a strictly positive integer, got {}", self.downsample_factor);
        }
        if let Dpi::Fixed(d) = self.dpi
            && !(d > 0.0 && d.is_finite())
        {
            bail!("dpi should be a positive number, got {d}");
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            bail!("alpha should be within [0, 1], got {}", self.alpha);
        }
        self.resolve_colormap()?;
        Ok(())
    }

    pub fn resolve_colormap(&self) -> Result<Colormap> {
        match &self.color {
            Some(color) => Ok(Colormap::Single(SingleColorMap::new(parse_color(color)?).with_fade(self.fade))),
            None => Colormap::named(&self.colormap),
        }
    }

    pub fn apply<P: DensityProvider>(&self, surface: &mut DensitySurface<P>) -> Result<()> {
        self.validate()?;
        surface.set_dpi(self.dpi)?;
        surface.set_origin(self.origin);
        surface.set_colormap(self.resolve_colormap()?);
        surface.set_alpha(self.alpha)?;
        surface.set_update_while_interacting(self.update_while_interacting);
        surface.set_normalization(Normalize::new(self.norm));
        surface.set_clim(
            self.vmin.clone().unwrap_or(Limit::Derived(Reducer::Min)),
            self.vmax.clone().unwrap_or(Limit::Derived(Reducer::Max)),
        );
        Ok(())
    }
}

impl<P: DensityProvider> DensitySurface<P> {
    pub fn with_config(provider: P, config: &DensityConfig) -> Result<DensitySurface<P>> {
        let mut surface = DensitySurface::new(provider);
        config.apply(&mut surface)?;
        Ok(surface)
    }
}
