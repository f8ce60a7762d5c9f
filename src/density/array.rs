// @file array.rs
// @brief row-major 2D density grid

use std::fmt;

/// A `ny × nx` grid of counts or per-bin averages, stored row-major.
///
/// Row 0 is the bottom of the view unless the surface flipped it for an
/// upper origin. Bins without data hold NaN.
#[derive(Clone, Default, PartialEq)]
pub struct DensityArray {
    ny: usize,
    nx: usize,
    data: Vec<f64>,
}

impl DensityArray {
    pub fn zeros(ny: usize, nx: usize) -> DensityArray {
        DensityArray::filled(ny, nx, 0.0)
    }

    pub fn filled(ny: usize, nx: usize, value: f64) -> DensityArray {
        DensityArray {
            ny,
            nx,
            data: vec![value; ny * nx],
        }
    }

    pub fn from_vec(ny: usize, nx: usize, data: Vec<f64>) -> Option<DensityArray> {
        if data.len() != ny * nx {
            return None;
        }
        Some(DensityArray { ny, nx, data })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.ny || col >= self.nx {
            return None;
        }
        Some(self.data[row * self.nx + col])
    }

    pub(crate) fn get_mut(&mut self, row: usize, col: usize) -> &mut f64 {
        &mut self.data[row * self.nx + col]
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // a zero-width grid has no rows
        self.data.chunks(self.nx.max(1)).take(if self.nx == 0 { 0 } else { self.ny })
    }

    pub fn flip_rows(&mut self) {
        if self.nx == 0 {
            return;
        }
        let nx = self.nx;
        for row in 0..self.ny / 2 {
            let other = self.ny - 1 - row;
            let (head, tail) = self.data.split_at_mut(other * nx);
            head[row * nx..(row + 1) * nx].swap_with_slice(&mut tail[..nx]);
        }
    }

    pub fn flip_cols(&mut self) {
        if self.nx == 0 {
            return;
        }
        for row in self.data.chunks_mut(self.nx) {
            row.reverse();
        }
    }

    pub(crate) fn divide_by(&mut self, other: &DensityArray) {
        debug_assert_eq!(self.shape(), other.shape());
        for (v, &d) in self.data.iter_mut().zip(other.data.iter()) {
            *v = if d == 0.0 { f64::NAN } else { *v / d };
        }
    }

    fn finite(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().copied().filter(|v| !v.is_nan())
    }

    pub fn nanmin(&self) -> f64 {
        self.finite().fold(f64::NAN, f64::min)
    }

    pub fn nanmax(&self) -> f64 {
        self.finite().fold(f64::NAN, f64::max)
    }

    pub fn nansum(&self) -> f64 {
        self.finite().sum()
    }

    pub fn nanpercentile(&self, q: f64) -> f64 {
        let mut v = self.finite().collect::<Vec<_>>();
        if v.is_empty() {
            return f64::NAN;
        }
        v.sort_by(f64::total_cmp);
        let rank = q.clamp(0.0, 100.0) / 100.0 * (v.len() - 1) as f64;
        let (lo, hi) = (rank.floor() as usize, rank.ceil() as usize);
        v[lo] + (v[hi] - v[lo]) * (rank - lo as f64)
    }
}

impl fmt::Debug for DensityArray {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DensityArray({}x{}, sum={})", self.ny, self.nx, self.nansum())
    }
}
