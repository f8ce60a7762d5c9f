// @file axes.rs
// @brief headless figure/axes hosting density layers, rendered with plotters

use crate::density::config::DensityConfig;
use crate::density::fixed::FixedPointSet;
use crate::density::host::{DebounceTimer, Event, EventKind, EventSource, SingleShotTimer, Subscription, ViewHost};
use crate::density::image::{DensityImage, ViewWindow};
use crate::density::provider::DensityProvider;
use crate::density::scale::AxisScale;
use crate::density::surface::DensitySurface;
use anyhow::{Result, bail};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Figure {
    pub size: (f64, f64),
    pub dpi: f64,
    pub resize_debounce: Option<Duration>,
}

impl Default for Figure {
    fn default() -> Figure {
        Figure {
            size: (6.4, 4.8),
            dpi: 100.0,
            resize_debounce: Some(Duration::from_millis(500)),
        }
    }
}

impl Figure {
    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |inches: f64| (inches * self.dpi).round().max(0.0) as u32;
        (px(self.size.0), px(self.size.1))
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PanelPosition {
    pub left: f64,
    pub bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for PanelPosition {
    fn default() -> PanelPosition {
        PanelPosition {
            left: 0.125,
            bottom: 0.11,
            width: 0.775,
            height: 0.77,
        }
    }
}

impl PanelPosition {
    pub fn new(left: f64, bottom: f64, width: f64, height: f64) -> Result<PanelPosition> {
        let pos = PanelPosition { left, bottom, width, height };
        let fits = |start: f64, len: f64| start >= 0.0 && len >= 0.0 && start + len <= 1.0;
        if !fits(left, width) || !fits(bottom, height) {
            bail!("panel position should lie within the figure, got {pos:?}");
        }
        Ok(pos)
    }
}

#[derive(Clone, Debug)]
struct AxesView {
    figure: Figure,
    position: PanelPosition,
    xlim: (f64, f64),
    ylim: (f64, f64),
    xscale: String,
    yscale: String,
}

impl AxesView {
    fn panel_pixels(&self) -> ((i32, i32), (u32, u32)) {
        let (w, h) = self.figure.pixel_size();
        let (w, h) = (w as f64, h as f64);
        let p = &self.position;
        let left = (p.left * w).round();
        let top = ((1.0 - p.bottom - p.height) * h).round();
        let width = (p.width * w).round();
        let height = (p.height * h).round();
        ((left as i32, top as i32), (width as u32, height as u32))
    }
}

impl ViewHost for AxesView {
    fn xlim(&self) -> (f64, f64) {
        self.xlim
    }

    fn ylim(&self) -> (f64, f64) {
        self.ylim
    }

    fn xscale(&self) -> &str {
        &self.xscale
    }

    fn yscale(&self) -> &str {
        &self.yscale
    }

    fn panel_size(&self) -> (f64, f64) {
        (
            self.figure.size.0 * self.position.width,
            self.figure.size.1 * self.position.height,
        )
    }

    fn device_dpi(&self) -> f64 {
        self.figure.dpi
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

#[derive(Debug, Default)]
struct EventBus {
    next: u64,
    routes: HashMap<u64, (LayerId, EventKind)>,
    owner: Option<LayerId>,
}

impl EventBus {
    fn subscribers(&self, kind: EventKind) -> Vec<LayerId> {
        let mut ids = self
            .routes
            .values()
            .filter(|(_, k)| *k == kind)
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        ids.sort();
        ids.dedup();
        ids
    }
}

impl EventSource for EventBus {
    fn connect(&mut self, kind: EventKind) -> Subscription {
        self.next += 1;
        if let Some(owner) = self.owner {
            self.routes.insert(self.next, (owner, kind));
        }
        Subscription { id: self.next, kind }
    }

    fn disconnect(&mut self, subscription: Subscription) {
        self.routes.remove(&subscription.id);
    }
}

/// An offscreen axes holding density layers, drawn bottom to top in the order
/// they were added.
#[derive(Debug)]
pub struct DensityAxes<P = FixedPointSet> {
    view: AxesView,
    tool_mode: Option<String>,
    bus: EventBus,
    layers: Vec<(LayerId, DensitySurface<P>)>,
    next_layer: u64,
}

impl<P: DensityProvider> DensityAxes<P> {
    pub fn new(figure: Figure) -> DensityAxes<P> {
        DensityAxes {
            view: AxesView {
                figure,
                position: PanelPosition::default(),
                xlim: (0.0, 1.0),
                ylim: (0.0, 1.0),
                xscale: AxisScale::Linear.to_string(),
                yscale: AxisScale::Linear.to_string(),
            },
            tool_mode: None,
            bus: EventBus::default(),
            layers: Vec::new(),
            next_layer: 0,
        }
    }

    pub fn figure(&self) -> &Figure {
        &self.view.figure
    }

    pub fn position(&self) -> PanelPosition {
        self.view.position
    }

    pub fn set_position(&mut self, position: PanelPosition) {
        self.view.position = position;
        self.mark_all_stale();
    }

    pub fn view(&self) -> &dyn ViewHost {
        &self.view
    }

    pub fn xlim(&self) -> (f64, f64) {
        self.view.xlim
    }

    pub fn ylim(&self) -> (f64, f64) {
        self.view.ylim
    }

    pub fn set_xlim(&mut self, left: f64, right: f64) {
        self.view.xlim = (left, right);
        self.mark_all_stale();
    }

    pub fn set_ylim(&mut self, bottom: f64, top: f64) {
        self.view.ylim = (bottom, top);
        self.mark_all_stale();
    }

    pub fn set_xscale(&mut self, scale: AxisScale) {
        self.view.xscale = scale.to_string();
        self.mark_all_stale();
    }

    pub fn set_yscale(&mut self, scale: AxisScale) {
        self.view.yscale = scale.to_string();
        self.mark_all_stale();
    }

    pub fn tool_mode(&self) -> Option<&str> {
        self.tool_mode.as_deref()
    }

    pub fn set_tool_mode(&mut self, mode: Option<&str>) {
        self.tool_mode = mode.map(str::to_string);
    }

    fn mark_all_stale(&mut self) {
        for (_, layer) in self.layers.iter_mut() {
            layer.mark_stale();
        }
    }

    pub fn add_layer(&mut self, mut surface: DensitySurface<P>) -> LayerId {
        self.next_layer += 1;
        let id = LayerId(self.next_layer);
        let timer = self
            .view
            .figure
            .resize_debounce
            .map(|interval| Box::new(SingleShotTimer::new(interval)) as Box<dyn DebounceTimer>);

        self.bus.owner = Some(id);
        surface.attach(&mut self.bus, timer);
        self.bus.owner = None;

        self.layers.push((id, surface));
        log::debug!("added density layer {:?}", id);
        id
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.layers.iter().map(|(id, _)| *id)
    }

    pub fn layer(&self, id: LayerId) -> Option<&DensitySurface<P>> {
        self.layers.iter().find(|(i, _)| *i == id).map(|(_, l)| l)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut DensitySurface<P>> {
        self.layers.iter_mut().find(|(i, _)| *i == id).map(|(_, l)| l)
    }

    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        let Some(index) = self.layers.iter().position(|(i, _)| *i == id) else {
            return false;
        };
        let (_, mut layer) = self.layers.remove(index);
        layer.teardown(&mut self.bus);
        log::debug!("removed density layer {:?}", id);
        true
    }

    pub fn dispatch(&mut self, event: Event) {
        if let Event::Resize { width, height } = event {
            let dpi = self.view.figure.dpi;
            self.view.figure.size = (width as f64 / dpi, height as f64 / dpi);
            self.mark_all_stale();
        }

        for id in self.bus.subscribers(event.kind()) {
            let tool_mode = self.tool_mode.as_deref();
            let Some((_, layer)) = self.layers.iter_mut().find(|(i, _)| *i == id) else {
                continue;
            };
            match event {
                Event::Press => layer.on_press(tool_mode),
                Event::Release => layer.on_release(),
                Event::Resize { .. } => layer.on_resize(),
            }
        }
    }

    pub fn poll_timers(&mut self, now: Instant) -> usize {
        let mut fired = 0;
        for (_, layer) in self.layers.iter_mut() {
            if layer.timer().is_some_and(|t| t.is_due(now)) {
                layer.on_timer();
                fired += 1;
            }
        }
        fired
    }

    pub fn draw(&mut self) -> Result<()> {
        for (_, layer) in self.layers.iter_mut() {
            if layer.is_stale() {
                layer.render(&self.view)?;
            }
        }
        Ok(())
    }

    fn paint<DB>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let (origin, (width, height)) = self.view.panel_pixels();
        let panel = root.clone().shrink(origin, (width, height));

        let window = ViewWindow::of(&self.view)?;
        for (_, layer) in self.layers.iter() {
            if let Some(image) = DensityImage::new(layer, window) {
                panel.draw(&image)?;
            }
        }
        if width > 0 && height > 0 {
            let corner = (width as i32 - 1, height as i32 - 1);
            panel.draw(&Rectangle::new([(0, 0), corner], BLACK.stroke_width(1)))?;
        }
        root.present()?;
        Ok(())
    }

    pub fn render_rgb(&mut self) -> Result<Vec<u8>> {
        self.draw()?;
        let (w, h) = self.view.figure.pixel_size();
        let mut buf = vec![0u8; w as usize * h as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
            self.paint(&root)?;
        }
        Ok(buf)
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.draw()?;
        let dim = self.view.figure.pixel_size();
        match path.extension().and_then(|e| e.to_str()) {
            Some("png") => self.paint(&BitMapBackend::new(path, dim).into_drawing_area())?,
            Some("svg") => self.paint(&SVGBackend::new(path, dim).into_drawing_area())?,
            _ => bail!("output should be a .png or .svg file, got {}", path.display()),
        }
        log::info!("wrote {}", path.display());
        Ok(())
    }
}

impl DensityAxes<FixedPointSet> {
    pub fn scatter_density(
        &mut self,
        x: Vec<f64>,
        y: Vec<f64>,
        weights: Option<Vec<f64>>,
        config: &DensityConfig,
    ) -> Result<LayerId> {
        let xlim = finite_range(&x).map(nonsingular);
        let ylim = finite_range(&y).map(nonsingular);

        let mut points = FixedPointSet::new(x, y, config.downsample_factor)?;
        if let Some(c) = weights {
            points = points.with_weights(c)?;
        }
        let surface = DensitySurface::with_config(points, config)?;

        if let Some((lo, hi)) = xlim {
            self.set_xlim(lo, hi);
        }
        if let Some((lo, hi)) = ylim {
            self.set_ylim(lo, hi);
        }
        Ok(self.add_layer(surface))
    }
}

fn finite_range(v: &[f64]) -> Option<(f64, f64)> {
    v.iter().filter(|v| v.is_finite()).fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    })
}

// widens a single-valued range by 5% of the value, or to +-0.05 around zero
fn nonsingular((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else if lo == 0.0 {
        (-0.05, 0.05)
    } else {
        (lo - 0.05 * lo.abs(), hi + 0.05 * hi.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::density::controller::InteractionState;
    use crate::density::host::PAN_ZOOM_MODE;
    use crate::density::provider::ResolutionMode;

    fn figure() -> Figure {
        Figure {
            size: (2.0, 1.0),
            dpi: 50.0,
            resize_debounce: Some(Duration::from_millis(500)),
        }
    }

    fn axes_with_points() -> (DensityAxes, LayerId) {
        let mut axes: DensityAxes = DensityAxes::new(figure());
        axes.set_position(PanelPosition::new(0.0, 0.0, 1.0, 1.0).unwrap());
        let x = (0..=100).map(|i| i as f64 / 10.0).collect::<Vec<_>>();
        let y = x.iter().map(|v| v * 2.0).collect();
        let config = DensityConfig {
            dpi: crate::density::surface::Dpi::Fixed(10.0),
            downsample_factor: 2,
            ..DensityConfig::default()
        };
        let id = axes.scatter_density(x, y, None, &config).unwrap();
        (axes, id)
    }

    #[test]
    fn scatter_density_fits_limits() {
        let (axes, _) = axes_with_points();
        assert_eq!(axes.xlim(), (0.0, 10.0));
        assert_eq!(axes.ylim(), (0.0, 20.0));
        assert_eq!(finite_range(&[f64::NAN, 3.0, -1.0, f64::INFINITY]), Some((-1.0, 3.0)));
        assert_eq!(finite_range(&[]), None);
        assert_eq!(nonsingular((2.0, 2.0)), (1.9, 2.1));
        assert_eq!(nonsingular((0.0, 0.0)), (-0.05, 0.05));
        assert_eq!(nonsingular((-1.0, 3.0)), (-1.0, 3.0));
    }

    #[test]
    fn panel_geometry() {
        let axes: DensityAxes = DensityAxes::new(figure());
        assert_eq!(axes.figure().pixel_size(), (100, 50));
        let (w, h) = axes.view().panel_size();
        assert!((w - 1.55).abs() < 1e-9 && (h - 0.77).abs() < 1e-9);
        assert!(PanelPosition::new(0.5, 0.0, 0.6, 1.0).is_err());
    }

    #[test]
    fn draw_uses_panel_bins() {
        let (mut axes, id) = axes_with_points();
        axes.draw().unwrap();
        let layer = axes.layer(id).unwrap();
        assert_eq!(layer.image().unwrap().array.shape(), (10, 20));
        assert_eq!(layer.image().unwrap().array.nansum(), 101.0);
        assert!(!layer.is_stale());
    }

    #[test]
    fn press_routes_only_in_pan_zoom() {
        let (mut axes, id) = axes_with_points();
        axes.draw().unwrap();

        axes.dispatch(Event::Press);
        assert_eq!(axes.layer(id).unwrap().state(), InteractionState::Idle);

        axes.set_tool_mode(Some(PAN_ZOOM_MODE));
        axes.dispatch(Event::Press);
        assert_eq!(axes.layer(id).unwrap().resolution_mode(), ResolutionMode::Reduced);
        axes.draw().unwrap();
        assert_eq!(axes.layer(id).unwrap().image().unwrap().array.shape(), (5, 10));

        axes.dispatch(Event::Release);
        axes.draw().unwrap();
        assert_eq!(axes.layer(id).unwrap().image().unwrap().array.shape(), (10, 20));
    }

    #[test]
    fn resize_is_debounced_by_polling() {
        let (mut axes, id) = axes_with_points();
        axes.draw().unwrap();

        axes.dispatch(Event::Resize { width: 50, height: 50 });
        assert_eq!(axes.figure().size, (1.0, 1.0));
        axes.draw().unwrap();
        assert_eq!(axes.layer(id).unwrap().image().unwrap().array.shape(), (10, 20));

        assert_eq!(axes.poll_timers(Instant::now()), 0);
        assert_eq!(axes.poll_timers(Instant::now() + Duration::from_secs(1)), 1);
        assert_eq!(axes.layer(id).unwrap().state(), InteractionState::Idle);
        axes.draw().unwrap();
        assert_eq!(axes.layer(id).unwrap().image().unwrap().array.shape(), (10, 10));
    }

    #[test]
    fn resize_without_timer_support_recomputes_at_once() {
        let mut axes: DensityAxes = DensityAxes::new(Figure {
            resize_debounce: None,
            ..figure()
        });
        axes.set_position(PanelPosition::new(0.0, 0.0, 1.0, 1.0).unwrap());
        let config = DensityConfig {
            dpi: crate::density::surface::Dpi::Fixed(10.0),
            ..DensityConfig::default()
        };
        let id = axes.scatter_density(vec![0.0, 1.0], vec![0.0, 1.0], None, &config).unwrap();
        axes.draw().unwrap();
        axes.dispatch(Event::Resize { width: 50, height: 50 });
        axes.draw().unwrap();
        assert_eq!(axes.layer(id).unwrap().image().unwrap().array.shape(), (10, 10));
    }

    #[test]
    fn remove_layer_releases_subscriptions() {
        let (mut axes, id) = axes_with_points();
        assert_eq!(axes.bus.routes.len(), 3);
        assert!(axes.remove_layer(id));
        assert!(axes.bus.routes.is_empty());
        assert!(!axes.remove_layer(id));
        assert_eq!(axes.layer_ids().count(), 0);
        axes.dispatch(Event::Press);
    }

    #[test]
    fn rejects_unknown_extension() {
        let (mut axes, _) = axes_with_points();
        assert!(axes.save("figure.bmp").is_err());
    }
}
