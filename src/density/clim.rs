use crate::density::array::DensityArray;
use anyhow::{Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

#[derive(Clone)]
pub enum Reducer {
    Min,
    Max,
    Median,
    Percentile(f64),
    Custom(Rc<dyn Fn(&DensityArray) -> f64>),
}

impl Reducer {
    pub fn custom<F>(f: F) -> Reducer
    where
        F: Fn(&DensityArray) -> f64 + 'static,
    {
        Reducer::Custom(Rc::new(f))
    }

    pub fn apply(&self, array: &DensityArray) -> f64 {
        match self {
            Reducer::Min => array.nanmin(),
            Reducer::Max => array.nanmax(),
            Reducer::Median => array.nanpercentile(50.0),
            Reducer::Percentile(q) => array.nanpercentile(*q),
            Reducer::Custom(f) => f(array),
        }
    }
}

impl FromStr for Reducer {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "min" => return Ok(Reducer::Min),
            "max" => return Ok(Reducer::Max),
            "median" => return Ok(Reducer::Median),
            _ => {}
        }
        let re = Regex::new(r"^p(\d+(?:\.\d+)?)$")?;
        let q = re
            .captures(s)
            .and_then(|c| c[1].parse::<f64>().ok())
            .filter(|q| *q <= 100.0)
            .ok_or_else(|| anyhow!("unknown limit {s:?} (expected a number, min, max, median, or pNN)"))?;
        Ok(Reducer::Percentile(q))
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Reducer::Min => write!(f, "min"),
            Reducer::Max => write!(f, "max"),
            Reducer::Median => write!(f, "median"),
            Reducer::Percentile(q) => write!(f, "p{q}"),
            Reducer::Custom(_) => write!(f, "custom"),
        }
    }
}

/// One end of the display range: a literal, or derived from each freshly
/// computed array.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(try_from = "LimitRepr", into = "LimitRepr")]
pub enum Limit {
    Value(f64),
    Derived(Reducer),
}

impl Limit {
    pub fn resolve(&self, array: &DensityArray) -> f64 {
        match self {
            Limit::Value(v) => *v,
            Limit::Derived(r) => r.apply(array),
        }
    }
}

impl From<f64> for Limit {
    fn from(v: f64) -> Limit {
        Limit::Value(v)
    }
}

impl From<Reducer> for Limit {
    fn from(r: Reducer) -> Limit {
        Limit::Derived(r)
    }
}

impl FromStr for Limit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(v) = s.parse::<f64>() {
            return Ok(Limit::Value(v));
        }
        Ok(Limit::Derived(s.parse()?))
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum LimitRepr {
    Value(f64),
    Name(String),
}

impl TryFrom<LimitRepr> for Limit {
    type Error = anyhow::Error;

    fn try_from(repr: LimitRepr) -> Result<Self> {
        match repr {
            LimitRepr::Value(v) => Ok(Limit::Value(v)),
            LimitRepr::Name(s) => s.parse(),
        }
    }
}

impl From<Limit> for LimitRepr {
    fn from(limit: Limit) -> LimitRepr {
        match limit {
            Limit::Value(v) => LimitRepr::Value(v),
            Limit::Derived(r) => LimitRepr::Name(format!("{r:?}")),
        }
    }
}
