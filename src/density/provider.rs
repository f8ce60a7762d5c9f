use crate::density::array::DensityArray;
use crate::density::scale::AxisScale;
use anyhow::Result;
use std::fmt;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ResolutionMode {
    #[default]
    Full,
    Reduced,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BinRequest {
    pub bins: (usize, usize),
    pub range: ((f64, f64), (f64, f64)),
    pub scales: (AxisScale, AxisScale),
}

impl BinRequest {
    pub fn x_scale(&self) -> AxisScale {
        self.scales.0
    }

    pub fn y_scale(&self) -> AxisScale {
        self.scales.1
    }
}

/// Produces a density array for the visible region on demand.
///
/// `downres` / `upres` return whether the resolution mode actually changed,
/// so that redundant switches do not trigger a recomputation.
pub trait DensityProvider {
    fn compute(&mut self, request: &BinRequest) -> Result<DensityArray>;

    fn downsample_factor(&self) -> usize {
        1
    }

    fn resolution_mode(&self) -> ResolutionMode {
        ResolutionMode::Full
    }

    fn downres(&mut self) -> bool {
        false
    }

    fn upres(&mut self) -> bool {
        false
    }

    fn set_resolution_mode(&mut self, mode: ResolutionMode) -> bool {
        match mode {
            ResolutionMode::Full => self.upres(),
            ResolutionMode::Reduced => self.downres(),
        }
    }
}

impl<P: DensityProvider + ?Sized> DensityProvider for Box<P> {
    fn compute(&mut self, request: &BinRequest) -> Result<DensityArray> {
        (**self).compute(request)
    }

    fn downsample_factor(&self) -> usize {
        (**self).downsample_factor()
    }

    fn resolution_mode(&self) -> ResolutionMode {
        (**self).resolution_mode()
    }

    fn downres(&mut self) -> bool {
        (**self).downres()
    }

    fn upres(&mut self) -> bool {
        (**self).upres()
    }
}

pub struct DensityFn<F> {
    func: F,
}

impl<F> DensityFn<F>
where
    F: FnMut(&BinRequest) -> DensityArray,
{
    pub fn new(func: F) -> DensityFn<F> {
        DensityFn { func }
    }
}

impl<F> DensityProvider for DensityFn<F>
where
    F: FnMut(&BinRequest) -> DensityArray,
{
    fn compute(&mut self, request: &BinRequest) -> Result<DensityArray> {
        Ok((self.func)(request))
    }
}

impl<F> fmt::Debug for DensityFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("DensityFn")
    }
}
