mod array;
mod axes;
mod clim;
mod color;
mod config;
mod controller;
mod fixed;
mod histogram;
mod host;
mod image;
mod provider;
mod scale;
mod surface;

pub use array::DensityArray;
pub use axes::{DensityAxes, Figure, LayerId, PanelPosition};
pub use clim::{Limit, Reducer};
pub use color::{Colormap, Fade, GradientMap, Normalize, SingleColorMap, Stretch, parse_color};
pub use config::DensityConfig;
pub use controller::{InteractionController, InteractionState};
pub use fixed::FixedPointSet;
pub use histogram::{histogram2d, histogram2d_mean};
pub use host::{DebounceTimer, Event, EventKind, EventSource, PAN_ZOOM_MODE, SingleShotTimer, Subscription, ViewHost};
pub use image::{DensityImage, ViewWindow};
pub use provider::{BinRequest, DensityFn, DensityProvider, ResolutionMode};
pub use scale::AxisScale;
pub use surface::{DensitySurface, Dpi, Extent, Origin, RenderedImage};
