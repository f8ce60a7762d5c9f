// @file fixed.rs
// @brief density provider over a static in-memory point set

use crate::density::array::DensityArray;
use crate::density::histogram::{histogram2d, histogram2d_mean};
use crate::density::provider::{BinRequest, DensityProvider, ResolutionMode};
use crate::density::scale::AxisScale;
use anyhow::{Result, bail};

#[derive(Clone, Debug, Default)]
struct Channel {
    full: Vec<f64>,
    sub: Vec<f64>,
}

impl Channel {
    fn new(full: Vec<f64>, step: usize) -> Channel {
        let sub = full.iter().copied().step_by(step).collect();
        Channel { full, sub }
    }

    fn log10(&self, step: usize) -> Channel {
        Channel::new(self.full.iter().map(|&v| AxisScale::Log.transform(v)).collect(), step)
    }

    fn get(&self, mode: ResolutionMode) -> &[f64] {
        match mode {
            ResolutionMode::Full => &self.full,
            ResolutionMode::Reduced => &self.sub,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Coordinate {
    linear: Channel,
    log: Option<Channel>,
}

impl Coordinate {
    fn new(v: Vec<f64>, step: usize) -> Coordinate {
        Coordinate {
            linear: Channel::new(v, step),
            log: None,
        }
    }

    fn channel(&mut self, scale: AxisScale, step: usize, transforms: &mut usize) -> &Channel {
        match scale {
            AxisScale::Linear => &self.linear,
            AxisScale::Log => self.log.get_or_insert_with(|| {
                *transforms += 1;
                let log = self.linear.log10(step);
                let invalid = log.full.iter().filter(|v| v.is_nan()).count();
                log::debug!("log10 cache built for {} values ({} non-positive)", log.full.len(), invalid);
                log
            }),
        }
    }
}

fn check_lengths(x: usize, y: usize, c: Option<usize>) -> Result<()> {
    if x != y {
        bail!("x and y should have the same length ({x} != {y})");
    }
    if let Some(c) = c
        && c != x
    {
        bail!("weights should have the same length as x and y ({c} != {x})");
    }
    Ok(())
}

/// Bins a fixed set of `(x, y[, c])` points.
///
/// With a weight channel `c` bound, each bin holds the mean of the weights
/// of the points that fall in it, and NaN where none do. In reduced mode only
/// every `factor²`-th point is binned, into a grid `factor` times coarser
/// along each axis.
#[derive(Clone, Debug)]
pub struct FixedPointSet {
    x: Coordinate,
    y: Coordinate,
    c: Option<Channel>,
    factor: usize,
    mode: ResolutionMode,
    log_transforms: usize,
}

impl FixedPointSet {
    pub fn new(x: Vec<f64>, y: Vec<f64>, downsample_factor: usize) -> Result<FixedPointSet> {
        if downsample_factor < 1 {
            bail!("downsample factor should be a strictly positive integer, got {downsample_factor}");
        }
        let mut set = FixedPointSet {
            x: Coordinate::default(),
            y: Coordinate::default(),
            c: None,
            factor: downsample_factor,
            mode: ResolutionMode::Full,
            log_transforms: 0,
        };
        set.set_xy(x, y)?;
        Ok(set)
    }

    pub fn with_weights(mut self, c: Vec<f64>) -> Result<FixedPointSet> {
        self.set_c(Some(c))?;
        Ok(self)
    }

    fn step(&self) -> usize {
        self.factor * self.factor
    }

    pub fn len(&self) -> usize {
        self.x.linear.full.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set_xy(&mut self, x: Vec<f64>, y: Vec<f64>) -> Result<()> {
        check_lengths(x.len(), y.len(), self.c.as_ref().map(|c| c.full.len()))?;
        let step = self.step();
        self.x = Coordinate::new(x, step);
        self.y = Coordinate::new(y, step);
        Ok(())
    }

    pub fn set_c(&mut self, c: Option<Vec<f64>>) -> Result<()> {
        check_lengths(self.len(), self.len(), c.as_ref().map(Vec::len))?;
        let step = self.step();
        self.c = c.map(|c| Channel::new(c, step));
        Ok(())
    }

    /// Replaces coordinates and weights together. Nothing changes on error.
    pub fn set_data(&mut self, x: Vec<f64>, y: Vec<f64>, c: Option<Vec<f64>>) -> Result<()> {
        check_lengths(x.len(), y.len(), c.as_ref().map(Vec::len))?;
        let step = self.step();
        self.x = Coordinate::new(x, step);
        self.y = Coordinate::new(y, step);
        self.c = c.map(|c| Channel::new(c, step));
        Ok(())
    }

    pub fn has_weights(&self) -> bool {
        self.c.is_some()
    }

    pub fn log_transforms(&self) -> usize {
        self.log_transforms
    }
}

impl DensityProvider for FixedPointSet {
    fn compute(&mut self, request: &BinRequest) -> Result<DensityArray> {
        let (ny, nx) = request.bins;
        let ((ymin, ymax), (xmin, xmax)) = request.range;
        let (mode, step, factor) = (self.mode, self.step(), self.factor);

        let xrange = request.x_scale().transform_range((xmin, xmax));
        let yrange = request.y_scale().transform_range((ymin, ymax));
        let x = self.x.channel(request.x_scale(), step, &mut self.log_transforms).get(mode);
        let y = self.y.channel(request.y_scale(), step, &mut self.log_transforms).get(mode);

        let bins = match mode {
            ResolutionMode::Full => (ny, nx),
            ResolutionMode::Reduced => (ny / factor, nx / factor),
        };
        log::debug!("binning {} points into {}x{} ({:?})", x.len(), bins.0, bins.1, mode);

        let array = match &self.c {
            None => histogram2d(y, x, None, bins, (yrange, xrange)),
            Some(c) => histogram2d_mean(y, x, c.get(mode), bins, (yrange, xrange)),
        };
        Ok(array)
    }

    fn downsample_factor(&self) -> usize {
        self.factor
    }

    fn resolution_mode(&self) -> ResolutionMode {
        self.mode
    }

    fn downres(&mut self) -> bool {
        if self.factor == 1 || self.mode == ResolutionMode::Reduced {
            return false;
        }
        self.mode = ResolutionMode::Reduced;
        true
    }

    fn upres(&mut self) -> bool {
        if self.factor == 1 || self.mode == ResolutionMode::Full {
            return false;
        }
        self.mode = ResolutionMode::Full;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn request(bins: (usize, usize), range: ((f64, f64), (f64, f64))) -> BinRequest {
        BinRequest {
            bins,
            range,
            scales: (AxisScale::Linear, AxisScale::Linear),
        }
    }

    fn uniform(n: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let x = (0..n).map(|_| rng.random_range(0.0..10.0)).collect();
        let y = (0..n).map(|_| rng.random_range(0.0..10.0)).collect();
        (x, y)
    }

    #[test]
    fn rejects_zero_factor_and_mismatched_lengths() {
        assert!(FixedPointSet::new(vec![1.0], vec![1.0], 0).is_err());
        assert!(FixedPointSet::new(vec![1.0, 2.0], vec![1.0], 2).is_err());
        let set = FixedPointSet::new(vec![1.0, 2.0], vec![1.0, 2.0], 2).unwrap();
        assert!(set.with_weights(vec![1.0]).is_err());
    }

    #[test]
    fn set_xy_keeps_weight_length_in_check() {
        let mut set = FixedPointSet::new(vec![1.0, 2.0], vec![1.0, 2.0], 2)
            .unwrap()
            .with_weights(vec![3.0, 4.0])
            .unwrap();
        assert!(set.set_xy(vec![1.0], vec![1.0]).is_err());
        set.set_c(None).unwrap();
        set.set_xy(vec![1.0], vec![1.0]).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn set_data_is_all_or_nothing() {
        let mut set = FixedPointSet::new(vec![1.0, 2.0], vec![1.0, 2.0], 2)
            .unwrap()
            .with_weights(vec![5.0, 7.0])
            .unwrap();
        assert!(set.set_data(vec![0.1, 0.2, 0.3], vec![0.1], None).is_err());
        assert!(set.set_data(vec![0.1, 0.2, 0.3], vec![0.1; 3], Some(vec![1.0])).is_err());
        assert_eq!(set.len(), 2);
        assert!(set.has_weights());

        set.set_data(vec![0.1, 0.2, 0.3], vec![0.1; 3], None).unwrap();
        assert_eq!(set.len(), 3);
        assert!(!set.has_weights());
    }

    #[test]
    fn full_resolution_counts_every_point_in_view() {
        let (x, y) = uniform(5000, 7);
        let mut set = FixedPointSet::new(x, y, 4).unwrap();
        let a = set.compute(&request((37, 53), ((0.0, 10.0), (0.0, 10.0)))).unwrap();
        assert_eq!(a.shape(), (37, 53));
        assert_eq!(a.nansum(), 5000.0);
    }

    #[test]
    fn reduced_mode_uses_coarse_grid_and_strided_points() {
        let (x, y) = uniform(1000, 3);
        let mut set = FixedPointSet::new(x, y, 3).unwrap();
        assert!(set.downres());
        assert!(!set.downres());
        let a = set.compute(&request((20, 31), ((0.0, 10.0), (0.0, 10.0)))).unwrap();
        assert_eq!(a.shape(), (6, 10));
        // every 9th point: indices 0, 9, ..., 999
        assert_eq!(a.nansum(), 112.0);
        assert!(set.upres());
        assert!(!set.upres());
    }

    #[test]
    fn factor_one_never_switches() {
        let (x, y) = uniform(100, 1);
        let mut set = FixedPointSet::new(x, y, 1).unwrap();
        let req = request((8, 8), ((0.0, 10.0), (0.0, 10.0)));
        let full = set.compute(&req).unwrap();
        assert!(!set.downres());
        assert_eq!(set.resolution_mode(), ResolutionMode::Full);
        assert_eq!(set.compute(&req).unwrap(), full);
    }

    #[test]
    fn log_axis_matches_manual_transform() {
        let (x, y) = uniform(2000, 11);
        let (x, y): (Vec<f64>, Vec<f64>) = (x.iter().map(|v| v + 1.0).collect(), y.iter().map(|v| v + 1.0).collect());
        let mut logged = FixedPointSet::new(x.clone(), y.clone(), 2).unwrap();
        let a = logged
            .compute(&BinRequest {
                bins: (16, 16),
                range: ((1.0, 11.0), (1.0, 11.0)),
                scales: (AxisScale::Log, AxisScale::Linear),
            })
            .unwrap();

        let lx = x.iter().map(|v| v.log10()).collect();
        let mut manual = FixedPointSet::new(lx, y, 2).unwrap();
        let b = manual
            .compute(&request((16, 16), ((1.0, 11.0), (0.0, 11.0f64.log10()))))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn log_cache_is_built_once_per_axis_and_reset_by_set_xy() {
        let mut set = FixedPointSet::new(vec![1.0, 10.0], vec![1.0, 10.0], 2).unwrap();
        let req = BinRequest {
            bins: (4, 4),
            range: ((1.0, 10.0), (1.0, 10.0)),
            scales: (AxisScale::Log, AxisScale::Log),
        };
        set.compute(&req).unwrap();
        set.compute(&req).unwrap();
        set.downres();
        set.compute(&req).unwrap();
        assert_eq!(set.log_transforms(), 2);

        set.set_xy(vec![2.0], vec![2.0]).unwrap();
        set.compute(&req).unwrap();
        assert_eq!(set.log_transforms(), 4);
    }

    #[test]
    fn non_positive_values_fall_outside_log_bins() {
        let mut set = FixedPointSet::new(vec![-1.0, 0.0, 1.0, 10.0], vec![5.0; 4], 2).unwrap();
        let a = set
            .compute(&BinRequest {
                bins: (1, 2),
                range: ((0.0, 10.0), (1.0, 10.0)),
                scales: (AxisScale::Log, AxisScale::Linear),
            })
            .unwrap();
        assert_eq!(a.values(), &[1.0, 1.0]);
    }

    #[test]
    fn weighted_points_average_per_bin() {
        let mut set = FixedPointSet::new(vec![0.5; 4], vec![0.5; 4], 4)
            .unwrap()
            .with_weights(vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        let a = set.compute(&request((2, 2), ((0.0, 2.0), (0.0, 2.0)))).unwrap();
        assert_eq!(a.get(0, 0), Some(2.5));
        assert_eq!(a.values().iter().filter(|v| v.is_nan()).count(), 3);
    }
}
