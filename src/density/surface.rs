// @file surface.rs
// @brief density surface: view geometry in, oriented and scaled density image out

use crate::density::array::DensityArray;
use crate::density::clim::{Limit, Reducer};
use crate::density::color::{ColorPicker, Colormap, Normalize, SingleColorMap};
use crate::density::controller::{InteractionController, InteractionState};
use crate::density::fixed::FixedPointSet;
use crate::density::host::{DebounceTimer, EventKind, EventSource, Subscription, ViewHost};
use crate::density::provider::{BinRequest, DensityProvider, ResolutionMode};
use crate::density::scale::AxisScale;
use anyhow::{Result, bail};
use clap::ValueEnum;
use plotters::prelude::RGBColor;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Dpi {
    Fixed(f64),
    Native,
}

impl Default for Dpi {
    fn default() -> Dpi {
        Dpi::Fixed(72.0)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Lower,
    Upper,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Extent {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

#[derive(Clone, Debug)]
pub struct RenderedImage {
    pub array: DensityArray,
    pub extent: Extent,
    pub clim: (f64, f64),
}

fn spans((lo, hi): (f64, f64)) -> bool {
    lo.is_finite() && hi.is_finite() && hi > lo
}

fn bin_count(inches: f64, dpi: f64) -> usize {
    let n = (inches * dpi).round();
    if n.is_finite() && n > 0.0 { n as usize } else { 0 }
}

pub struct DensitySurface<P = Box<dyn DensityProvider>> {
    provider: Option<P>,
    dpi: Dpi,
    origin: Origin,
    colormap: Colormap,
    alpha: f64,
    norm: Normalize,
    vmin: Limit,
    vmax: Limit,
    controller: InteractionController,
    image: Option<RenderedImage>,
    rendered: bool,
    stale: bool,
    subscriptions: Vec<Subscription>,
}

impl<P: DensityProvider> DensitySurface<P> {
    pub fn new(provider: P) -> DensitySurface<P> {
        DensitySurface {
            provider: Some(provider),
            dpi: Dpi::default(),
            origin: Origin::default(),
            colormap: Colormap::default(),
            alpha: 1.0,
            norm: Normalize::default(),
            vmin: Limit::Derived(Reducer::Min),
            vmax: Limit::Derived(Reducer::Max),
            controller: InteractionController::new(true),
            image: None,
            rendered: false,
            stale: true,
            subscriptions: Vec::new(),
        }
    }

    pub fn provider(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    pub fn provider_mut(&mut self) -> Option<&mut P> {
        self.stale = true;
        self.provider.as_mut()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn has_rendered(&self) -> bool {
        self.rendered
    }

    pub fn image(&self) -> Option<&RenderedImage> {
        self.image.as_ref()
    }

    pub fn extent(&self) -> Option<Extent> {
        self.image.as_ref().map(|i| i.extent)
    }

    pub fn state(&self) -> InteractionState {
        self.controller.state()
    }

    pub fn timer(&self) -> Option<&dyn DebounceTimer> {
        self.controller.timer()
    }

    pub fn dpi(&self) -> Dpi {
        self.dpi
    }

    pub fn set_dpi(&mut self, dpi: Dpi) -> Result<()> {
        if let Dpi::Fixed(d) = dpi
            && !(d > 0.0 && d.is_finite())
        {
            bail!("dpi should be a positive number, got {d}");
        }
        self.dpi = dpi;
        self.stale = true;
        Ok(())
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Origin) {
        self.origin = origin;
        self.stale = true;
    }

    pub fn colormap(&self) -> &Colormap {
        &self.colormap
    }

    pub fn set_color(&mut self, color: RGBColor) {
        self.set_colormap(Colormap::Single(SingleColorMap::new(color)));
    }

    pub fn set_colormap(&mut self, colormap: Colormap) {
        self.colormap = colormap;
        self.stale = true;
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&alpha) {
            bail!("alpha should be within [0, 1], got {alpha}");
        }
        self.alpha = alpha;
        self.stale = true;
        Ok(())
    }

    pub fn clim(&self) -> (&Limit, &Limit) {
        (&self.vmin, &self.vmax)
    }

    pub fn set_clim(&mut self, vmin: impl Into<Limit>, vmax: impl Into<Limit>) {
        self.vmin = vmin.into();
        self.vmax = vmax.into();
        self.stale = true;
    }

    pub fn norm(&self) -> &Normalize {
        &self.norm
    }

    pub fn set_normalization(&mut self, norm: Normalize) {
        if let Some(vmin) = norm.vmin {
            self.vmin = Limit::Value(vmin);
        }
        if let Some(vmax) = norm.vmax {
            self.vmax = Limit::Value(vmax);
        }
        self.norm = norm;
        self.stale = true;
    }

    pub fn update_while_interacting(&self) -> bool {
        self.controller.update_while_interacting()
    }

    pub fn set_update_while_interacting(&mut self, update: bool) {
        self.controller.set_update_while_interacting(update);
    }

    pub fn resolution_mode(&self) -> ResolutionMode {
        self.provider.as_ref().map_or(ResolutionMode::Full, |p| p.resolution_mode())
    }

    pub fn set_resolution_mode(&mut self, mode: ResolutionMode) {
        if let Some(p) = self.provider.as_mut()
            && p.set_resolution_mode(mode)
        {
            self.stale = true;
        }
    }

    /// Subscribes to press/release, and to resize when the host can time a
    /// debounce (`timer` is `Some`).
    pub fn attach(&mut self, events: &mut dyn EventSource, timer: Option<Box<dyn DebounceTimer>>) {
        self.subscriptions.push(events.connect(EventKind::Press));
        self.subscriptions.push(events.connect(EventKind::Release));
        if timer.is_some() {
            self.subscriptions.push(events.connect(EventKind::Resize));
        }
        self.controller.set_timer(timer);
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Releases subscriptions, the timer, the provider and the last image.
    pub fn teardown(&mut self, events: &mut dyn EventSource) {
        for s in self.subscriptions.drain(..) {
            events.disconnect(s);
        }
        self.controller.teardown();
        self.provider = None;
        self.image = None;
    }

    pub fn on_press(&mut self, tool_mode: Option<&str>) {
        if let Some(p) = self.provider.as_mut() {
            self.stale |= self.controller.press(tool_mode, p);
        }
    }

    pub fn on_release(&mut self) {
        if let Some(p) = self.provider.as_mut() {
            self.stale |= self.controller.release(p);
        }
    }

    pub fn on_resize(&mut self) {
        if let Some(p) = self.provider.as_mut() {
            self.stale |= self.controller.resize(self.rendered, p);
        }
    }

    pub fn on_timer(&mut self) {
        if let Some(p) = self.provider.as_mut() {
            self.stale |= self.controller.timer_fired(p);
        }
    }

    /// Recomputes the image for the current view, unless an interaction has
    /// frozen the previous one.
    pub fn render(&mut self, view: &dyn ViewHost) -> Result<()> {
        let x_scale = view.xscale().parse::<AxisScale>()?;
        let y_scale = view.yscale().parse::<AxisScale>()?;
        let Some(provider) = self.provider.as_mut() else {
            log::warn!("render requested on a torn-down density surface");
            return Ok(());
        };
        if self.controller.is_frozen() && self.image.is_some() {
            self.stale = false;
            return Ok(());
        }

        let (xmin, xmax) = view.xlim();
        let (ymin, ymax) = view.ylim();
        let extent = Extent { xmin, xmax, ymin, ymax };

        let dpi = match self.dpi {
            Dpi::Fixed(d) => d,
            Dpi::Native => view.device_dpi(),
        };
        let (width, height) = view.panel_size();
        let (nx, ny) = (bin_count(width, dpi), bin_count(height, dpi));

        let (flip_x, flip_y) = (xmin > xmax, ymin > ymax);
        let request = BinRequest {
            bins: (ny, nx),
            range: ((ymin.min(ymax), ymin.max(ymax)), (xmin.min(xmax), xmin.max(xmax))),
            scales: (x_scale, y_scale),
        };
        // zero-area views bin nothing
        let mut array = if nx > 0
            && ny > 0
            && spans(x_scale.transform_range(request.range.1))
            && spans(y_scale.transform_range(request.range.0))
        {
            provider.compute(&request)?
        } else {
            DensityArray::zeros(0, 0)
        };
        log::debug!(
            "density map {}x{} ({:?}) for x {:?} y {:?}",
            array.shape().0,
            array.shape().1,
            provider.resolution_mode(),
            request.range.1,
            request.range.0
        );

        if flip_x {
            array.flip_cols();
        }
        if flip_y {
            array.flip_rows();
        }
        if self.origin == Origin::Upper {
            array.flip_rows();
        }

        let clim = (self.vmin.resolve(&array), self.vmax.resolve(&array));
        self.image = Some(RenderedImage { array, extent, clim });
        self.rendered = true;
        self.stale = false;
        Ok(())
    }

    pub(crate) fn color_picker(&self) -> Option<ColorPicker<'_>> {
        let image = self.image.as_ref()?;
        Some(ColorPicker::new(&self.colormap, self.norm, image.clim, self.alpha))
    }
}

impl DensitySurface<FixedPointSet> {
    /// Replaces the point set; `weights`, when given, switches the map to
    /// per-bin averages.
    pub fn bind(&mut self, x: Vec<f64>, y: Vec<f64>, weights: Option<Vec<f64>>) -> Result<()> {
        let Some(p) = self.provider.as_mut() else {
            bail!("cannot bind data to a torn-down density surface");
        };
        p.set_data(x, y, weights)?;
        self.stale = true;
        Ok(())
    }

    pub fn set_xy(&mut self, x: Vec<f64>, y: Vec<f64>) -> Result<()> {
        if let Some(p) = self.provider.as_mut() {
            p.set_xy(x, y)?;
            self.stale = true;
        }
        Ok(())
    }

    pub fn set_c(&mut self, c: Option<Vec<f64>>) -> Result<()> {
        if let Some(p) = self.provider.as_mut() {
            p.set_c(c)?;
            self.stale = true;
        }
        Ok(())
    }
}

impl<P> fmt::Debug for DensitySurface<P> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DensitySurface")
            .field("attached", &self.provider.is_some())
            .field("dpi", &self.dpi)
            .field("origin", &self.origin)
            .field("state", &self.controller.state())
            .field("stale", &self.stale)
            .field("image", &self.image)
            .finish()
    }
}
