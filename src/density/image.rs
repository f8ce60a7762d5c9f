// @file image.rs
// @brief paints a surface's density image onto a plotters drawing area

use crate::density::color::ColorPicker;
use crate::density::host::ViewHost;
use crate::density::provider::DensityProvider;
use crate::density::scale::AxisScale;
use crate::density::surface::{DensitySurface, Origin, RenderedImage};
use anyhow::Result;
use plotters::element::{Drawable, PointCollection};
use plotters::prelude::*;
use plotters_backend::DrawingErrorKind;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewWindow {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub scales: (AxisScale, AxisScale),
}

impl ViewWindow {
    pub fn of(view: &dyn ViewHost) -> Result<ViewWindow> {
        let scales = (view.xscale().parse::<AxisScale>()?, view.yscale().parse::<AxisScale>()?);
        Ok(ViewWindow {
            x: scales.0.transform_range(view.xlim()),
            y: scales.1.transform_range(view.ylim()),
            scales,
        })
    }
}

// n bins spanning lo..hi, in either order
fn bin_index(v: f64, (lo, hi): (f64, f64), n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let f = (v - lo) / (hi - lo);
    if !(0.0..1.0).contains(&f) {
        return None;
    }
    Some(((f * n as f64) as usize).min(n - 1))
}

/// A surface's last image resampled onto panel pixels by nearest-neighbour
/// lookup, so an image computed for an older view lands where its extent is.
pub struct DensityImage<'a> {
    image: &'a RenderedImage,
    picker: ColorPicker<'a>,
    origin: Origin,
    window: ViewWindow,
    extent_x: (f64, f64),
    extent_y: (f64, f64),
}

impl<'a> DensityImage<'a> {
    pub fn new<P: DensityProvider>(surface: &'a DensitySurface<P>, window: ViewWindow) -> Option<DensityImage<'a>> {
        let image = surface.image()?;
        let picker = surface.color_picker()?;
        let e = image.extent;
        Some(DensityImage {
            image,
            picker,
            origin: surface.origin(),
            window,
            extent_x: window.scales.0.transform_range((e.xmin, e.xmax)),
            extent_y: window.scales.1.transform_range((e.ymin, e.ymax)),
        })
    }

    pub fn value_at(&self, (px, py): (u32, u32), (width, height): (u32, u32)) -> Option<f64> {
        if px >= width || py >= height {
            return None;
        }
        let (ny, nx) = self.image.array.shape();
        let (left, right) = self.window.x;
        let (bottom, top) = self.window.y;
        let u = left + (px as f64 + 0.5) / width as f64 * (right - left);
        let v = top + (py as f64 + 0.5) / height as f64 * (bottom - top);

        let col = bin_index(u, self.extent_x, nx)?;
        let row = bin_index(v, self.extent_y, ny)?;
        let row = match self.origin {
            Origin::Lower => row,
            Origin::Upper => ny - 1 - row,
        };
        self.image.array.get(row, col)
    }
}

impl<'a> PointCollection<'a, (i32, i32)> for &'a DensityImage<'_> {
    type Point = &'a (i32, i32);
    type IntoIter = std::iter::Once<&'a (i32, i32)>;

    fn point_iter(self) -> Self::IntoIter {
        std::iter::once(&(0, 0)) // fills the whole parent area
    }
}

impl<DB> Drawable<DB> for DensityImage<'_>
where
    DB: DrawingBackend,
{
    fn draw<I>(&self, mut pos: I, backend: &mut DB, dim: (u32, u32)) -> Result<(), DrawingErrorKind<DB::ErrorType>>
    where
        I: Iterator<Item = (i32, i32)>,
    {
        let Some(pos) = pos.next() else {
            return Ok(());
        };
        for py in 0..dim.1 {
            for px in 0..dim.0 {
                let Some(color) = self.value_at((px, py), dim).and_then(|v| self.picker.get_color(v)) else {
                    continue;
                };
                if color.3 <= 0.0 {
                    continue;
                }
                backend.draw_pixel((pos.0 + px as i32, pos.1 + py as i32), color.to_backend_color())?;
            }
        }
        Ok(())
    }
}
