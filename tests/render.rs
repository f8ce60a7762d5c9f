use densmap::{DensityAxes, DensityConfig, Dpi, Event, Figure, PAN_ZOOM_MODE, PanelPosition};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WIDTH: usize = 100;

fn axes() -> DensityAxes {
    let mut axes: DensityAxes = DensityAxes::new(Figure {
        size: (2.0, 2.0),
        dpi: 50.0,
        resize_debounce: None,
    });
    axes.set_position(PanelPosition::new(0.0, 0.0, 1.0, 1.0).unwrap());
    axes
}

fn config(color: &str) -> DensityConfig {
    DensityConfig {
        color: Some(color.to_string()),
        dpi: Dpi::Fixed(25.0),
        ..DensityConfig::default()
    }
}

fn cluster(at: f64, n: usize) -> (Vec<f64>, Vec<f64>) {
    (vec![at; n], vec![at; n])
}

fn pixel(buf: &[u8], x: usize, y: usize) -> [u8; 3] {
    let i = (y * WIDTH + x) * 3;
    [buf[i], buf[i + 1], buf[i + 2]]
}

// data (0.5, 0.5) and (1.5, 1.5) on a 0..2 view of 100x100 pixels
const LOW: (usize, usize) = (25, 74);
const HIGH: (usize, usize) = (75, 24);

#[test]
fn renders_single_color_layer_to_rgb() {
    let mut axes = axes();
    let (x, y) = cluster(0.5, 500);
    axes.scatter_density(x, y, None, &config("red")).unwrap();
    axes.set_xlim(0.0, 2.0);
    axes.set_ylim(0.0, 2.0);

    let buf = axes.render_rgb().unwrap();
    assert_eq!(buf.len(), WIDTH * WIDTH * 3);
    assert_eq!(pixel(&buf, LOW.0, LOW.1), [255, 0, 0]);
    assert_eq!(pixel(&buf, HIGH.0, HIGH.1), [255, 255, 255]);
    // panel frame
    assert_eq!(pixel(&buf, 0, 0), [0, 0, 0]);
}

#[test]
fn overlays_two_layers_and_removes_one() {
    let mut axes = axes();
    let (x, y) = cluster(0.5, 500);
    let red = axes.scatter_density(x, y, None, &config("red")).unwrap();
    let (x, y) = cluster(1.5, 500);
    axes.scatter_density(x, y, None, &config("blue")).unwrap();
    axes.set_xlim(0.0, 2.0);
    axes.set_ylim(0.0, 2.0);

    let buf = axes.render_rgb().unwrap();
    assert_eq!(pixel(&buf, LOW.0, LOW.1), [255, 0, 0]);
    assert_eq!(pixel(&buf, HIGH.0, HIGH.1), [0, 0, 255]);

    assert!(axes.remove_layer(red));
    let buf = axes.render_rgb().unwrap();
    assert_eq!(pixel(&buf, LOW.0, LOW.1), [255, 255, 255]);
    assert_eq!(pixel(&buf, HIGH.0, HIGH.1), [0, 0, 255]);
}

#[test]
fn frozen_image_moves_with_the_view() {
    let mut axes = axes();
    let (x, y) = cluster(0.5, 500);
    let config = DensityConfig {
        update_while_interacting: false,
        ..config("red")
    };
    let id = axes.scatter_density(x, y, None, &config).unwrap();
    axes.set_xlim(0.0, 2.0);
    axes.set_ylim(0.0, 2.0);
    axes.draw().unwrap();

    axes.set_tool_mode(Some(PAN_ZOOM_MODE));
    axes.dispatch(Event::Press);
    axes.set_xlim(-0.5, 1.5);
    let buf = axes.render_rgb().unwrap();
    assert_eq!(axes.layer(id).unwrap().extent().unwrap().xmin, 0.0);
    assert_eq!(pixel(&buf, LOW.0, LOW.1), [255, 255, 255]);
    assert_eq!(pixel(&buf, LOW.0 + 25, LOW.1), [255, 0, 0]);

    axes.dispatch(Event::Release);
    axes.draw().unwrap();
    assert_eq!(axes.layer(id).unwrap().extent().unwrap().xmin, -0.5);
}

#[test]
fn fitted_limits_keep_every_point() {
    let mut rng = StdRng::seed_from_u64(42);
    let x = (0..2000).map(|_| rng.random::<f64>() * 10.0).collect::<Vec<_>>();
    let y = (0..2000).map(|_| rng.random::<f64>() - 3.0).collect::<Vec<_>>();
    let mut axes = axes();
    let id = axes.scatter_density(x, y, None, &DensityConfig::default()).unwrap();
    axes.draw().unwrap();
    let image = axes.layer(id).unwrap().image().unwrap();
    assert_eq!(image.array.nansum(), 2000.0);
    assert_eq!(image.clim.1, image.array.nanmax());
}

#[test]
fn saves_png_and_svg() {
    let dir = tempfile::tempdir().unwrap();
    let mut axes = axes();
    let (x, y) = cluster(0.5, 10);
    axes.scatter_density(x, y, None, &config("green")).unwrap();

    let png = dir.path().join("density.png");
    axes.save(&png).unwrap();
    let bytes = std::fs::read(&png).unwrap();
    assert_eq!(&bytes[..4], b"\x89PNG");

    let svg = dir.path().join("density.svg");
    axes.save(&svg).unwrap();
    let text = std::fs::read_to_string(&svg).unwrap();
    assert!(text.contains("<svg"));

    assert!(axes.save(dir.path().join("density.txt")).is_err());
}
