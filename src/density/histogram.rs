// @file histogram.rs
// @brief fixed-width 2D histogram kernel

use crate::density::array::DensityArray;

/// Maps coordinates onto `n` equal-width bins spanning `[min, max]`.
///
/// A value on a bin's lower edge belongs to that bin; `max` itself lands in
/// the last bin. Anything outside the range (or NaN) has no bin.
#[derive(Copy, Clone, Debug)]
struct BinEdges {
    min: f64,
    max: f64,
    n: usize,
    scale: f64,
}

impl BinEdges {
    fn new(n: usize, (min, max): (f64, f64)) -> Option<BinEdges> {
        if n == 0 || !min.is_finite() || !max.is_finite() || max <= min {
            return None;
        }
        Some(BinEdges {
            min,
            max,
            n,
            scale: n as f64 / (max - min),
        })
    }

    fn index(&self, v: f64) -> Option<usize> {
        if !(v >= self.min && v <= self.max) {
            return None;
        }
        let i = ((v - self.min) * self.scale) as usize;
        Some(i.min(self.n - 1))
    }
}

/// Counts (or sums `weights` of) the points `(x[i], y[i])` into a
/// `bins = (ny, nx)` grid over `range = ((ymin, ymax), (xmin, xmax))`.
///
/// A degenerate axis (no bins, zero or negative span, non-finite bounds)
/// yields an empty grid. Points past the end of `weights` are not binned.
pub fn histogram2d(
    y: &[f64],
    x: &[f64],
    weights: Option<&[f64]>,
    bins: (usize, usize),
    range: ((f64, f64), (f64, f64)),
) -> DensityArray {
    let (ny, nx) = bins;
    let (Some(ye), Some(xe)) = (BinEdges::new(ny, range.0), BinEdges::new(nx, range.1)) else {
        return DensityArray::zeros(0, 0);
    };

    let mut array = DensityArray::zeros(ny, nx);
    for (i, (&yv, &xv)) in y.iter().zip(x.iter()).enumerate() {
        let Some(w) = weights.map_or(Some(1.0), |w| w.get(i).copied()) else {
            break;
        };
        let (Some(row), Some(col)) = (ye.index(yv), xe.index(xv)) else {
            continue;
        };
        *array.get_mut(row, col) += w;
    }
    array
}

pub fn histogram2d_mean(
    y: &[f64],
    x: &[f64],
    weights: &[f64],
    bins: (usize, usize),
    range: ((f64, f64), (f64, f64)),
) -> DensityArray {
    let n = weights.len().min(x.len()).min(y.len());
    let (y, x) = (&y[..n], &x[..n]);
    let mut sum = histogram2d(y, x, Some(weights), bins, range);
    let count = histogram2d(y, x, None, bins, range);
    sum.divide_by(&count);
    sum
}
