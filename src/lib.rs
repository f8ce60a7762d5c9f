pub mod density;

pub use density::{
    AxisScale, BinRequest, Colormap, DensityArray, DensityAxes, DensityConfig, DensityFn, DensityProvider, DensitySurface,
    Dpi, Event, EventKind, EventSource, Extent, Fade, Figure, FixedPointSet, LayerId, Limit, Normalize, Origin,
    PAN_ZOOM_MODE, PanelPosition, Reducer, ResolutionMode, SingleColorMap, Stretch, ViewHost,
};
