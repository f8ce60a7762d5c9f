use anyhow::{Result, bail};
use std::fmt;
use std::str::FromStr;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

impl AxisScale {
    pub fn transform(self, v: f64) -> f64 {
        match self {
            AxisScale::Linear => v,
            AxisScale::Log if v > 0.0 => v.log10(),
            AxisScale::Log => f64::NAN,
        }
    }

    pub fn transform_range(self, (min, max): (f64, f64)) -> (f64, f64) {
        (self.transform(min), self.transform(max))
    }
}

impl FromStr for AxisScale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(AxisScale::Linear),
            "log" => Ok(AxisScale::Log),
            _ => bail!("unexpected axis scale: {s:?} (expected \"linear\" or \"log\")"),
        }
    }
}

impl fmt::Display for AxisScale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AxisScale::Linear => write!(f, "linear"),
            AxisScale::Log => write!(f, "log"),
        }
    }
}
