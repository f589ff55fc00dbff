//! Decorative shapes and their non-overlapping grid placement.

use std::collections::HashSet;
use std::f64::consts::TAU;

use rand::Rng;

use crate::color::Rgba;
use crate::config::LoaderConfig;
use crate::render::{Point, Surface};

/// Shared look of every shape in a field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeStyle {
    pub color: Rgba,
    /// Opacity ceiling of the pulse
    pub max_opacity: f64,
}

impl ShapeStyle {
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            color: config.shape_color,
            max_opacity: config.max_opacity.clamp(0.0, 1.0),
        }
    }
}

/// A pulsing disc.
///
/// Position, radius and flash rate never change; only the phase advances,
/// and only when the shape is rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    radius: u32,
    center: Point,
    flash_rate: f64,
    phase: f64,
}

impl Shape {
    pub fn new(center: Point, radius: u32, flash_rate: f64, phase: f64) -> Self {
        Self {
            radius,
            center,
            flash_rate,
            phase,
        }
    }

    /// Create a shape at `center` with random radius, flash rate and phase.
    pub fn random<R: Rng>(center: Point, config: &LoaderConfig, rng: &mut R) -> Self {
        let radius_max = config.radius_max.max(config.radius_min);
        Self {
            radius: rng.random_range(config.radius_min..=radius_max),
            center,
            flash_rate: rng.random::<f64>() * config.max_flash_rate.max(0.0),
            phase: rng.random::<f64>(),
        }
    }

    #[inline]
    pub fn radius(&self) -> u32 {
        self.radius
    }

    #[inline]
    pub fn center(&self) -> Point {
        self.center
    }

    #[inline]
    pub fn flash_rate(&self) -> f64 {
        self.flash_rate
    }

    #[inline]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Opacity for the current phase: one full pulse per unit of phase,
    /// mapped into `0.0..=max_opacity`.
    pub fn opacity(&self, max_opacity: f64) -> f64 {
        ((TAU * self.phase).sin() + 1.0) / 2.0 * max_opacity
    }

    /// Advance the phase and paint the disc.
    pub fn render<S: Surface + ?Sized>(&mut self, surface: &mut S, style: &ShapeStyle) {
        self.phase += self.flash_rate;
        let color = style.color.with_alpha(self.opacity(style.max_opacity));
        surface.fill_circle(self.center, self.radius as f64, color);
    }
}

/// Smallest cell edge a grid accepts, in pixels.
pub const MIN_CELL_SIZE: f64 = 1.0;

/// Partition of the surface into roughly square cells with an occupancy map.
///
/// Only claimed cells are stored, so memory follows the number of shapes
/// rather than the number of cells.
#[derive(Clone, Debug)]
pub struct CellGrid {
    rows: usize,
    cols: usize,
    cell_width: f64,
    cell_height: f64,
    occupied: HashSet<(usize, usize)>,
}

impl CellGrid {
    /// Grid of `floor(dimension / cell_size)` rows and columns, at least one
    /// of each. `cell_size` below [`MIN_CELL_SIZE`] (or NaN) is raised to it.
    pub fn new(width: f64, height: f64, cell_size: f64) -> Self {
        let cell_size = if cell_size >= MIN_CELL_SIZE {
            cell_size
        } else {
            MIN_CELL_SIZE
        };
        let rows = ((height / cell_size) as usize).max(1);
        let cols = ((width / cell_size) as usize).max(1);
        Self {
            rows,
            cols,
            cell_width: (width.max(0.0) / cols as f64).trunc(),
            cell_height: (height.max(0.0) / rows as f64).trunc(),
            occupied: HashSet::new(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// Number of claimed cells.
    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }

    /// Geometric centre of a cell.
    pub fn center(&self, row: usize, col: usize) -> Point {
        Point::new(
            self.cell_width * (col as f64 + 0.5),
            self.cell_height * (row as f64 + 0.5),
        )
    }

    /// `(row, col)` of the cell containing `point`, if any.
    pub fn cell_of(&self, point: Point) -> Option<(usize, usize)> {
        if self.cell_width <= 0.0 || self.cell_height <= 0.0 || point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let row = (point.y / self.cell_height) as usize;
        let col = (point.x / self.cell_width) as usize;
        (row < self.rows && col < self.cols).then_some((row, col))
    }

    /// Pick random cells until a free one turns up or `attempts` picks have
    /// been spent. The free cell is marked occupied and its centre returned.
    pub fn claim_random<R: Rng>(&mut self, rng: &mut R, attempts: u32) -> Option<Point> {
        for _ in 0..attempts {
            let row = rng.random_range(0..self.rows);
            let col = rng.random_range(0..self.cols);
            if self.occupied.insert((row, col)) {
                return Some(self.center(row, col));
            }
        }
        None
    }
}

/// The shapes of one loading session, in creation order.
#[derive(Clone, Debug)]
pub struct ShapeField {
    shapes: Vec<Shape>,
    style: ShapeStyle,
}

impl ShapeField {
    /// Place up to `config.shape_count` shapes on a `width` x `height`
    /// surface, one per grid cell.
    ///
    /// A shape whose placement runs out of attempts is dropped, so the field
    /// may hold fewer shapes than requested and never more than the grid has
    /// cells.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use kandinsky_canvas_core::{LoaderConfig, ShapeField};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let field = ShapeField::generate(400.0, 400.0, &LoaderConfig::default(), &mut rng);
    /// assert!(!field.is_empty() && field.len() <= 16);
    /// ```
    pub fn generate<R: Rng>(width: f64, height: f64, config: &LoaderConfig, rng: &mut R) -> Self {
        let mut grid = CellGrid::new(width, height, config.cell_size);
        let mut shapes = Vec::with_capacity(config.shape_count.min(grid.cell_count()));
        for _ in 0..config.shape_count {
            if let Some(center) = grid.claim_random(rng, config.placement_attempts) {
                shapes.push(Shape::random(center, config, rng));
            }
        }
        tracing::debug!(
            requested = config.shape_count,
            placed = shapes.len(),
            rows = grid.rows(),
            cols = grid.cols(),
            "generated shape field"
        );
        Self {
            shapes,
            style: ShapeStyle::from_config(config),
        }
    }

    /// A field with no shapes.
    pub fn empty(style: ShapeStyle) -> Self {
        Self {
            shapes: Vec::new(),
            style,
        }
    }

    #[inline]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    #[inline]
    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    /// Render every shape in creation order.
    pub fn render<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        for shape in &mut self.shapes {
            shape.render(surface, &self.style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{DrawCommand, RecordingSurface};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn config_with(shape_count: usize) -> LoaderConfig {
        LoaderConfig {
            shape_count,
            ..LoaderConfig::default()
        }
    }

    #[test]
    fn grid_dimensions() {
        let grid = CellGrid::new(400.0, 400.0, 100.0);
        assert_eq!((grid.rows(), grid.cols()), (4, 4));

        let grid = CellGrid::new(1024.0, 768.0, 100.0);
        assert_eq!((grid.rows(), grid.cols()), (7, 10));
        assert_eq!(grid.center(0, 0), Point::new(51.0, 54.5));

        // Smaller than one cell still yields a single cell
        let grid = CellGrid::new(50.0, 30.0, 100.0);
        assert_eq!(grid.cell_count(), 1);
        assert_eq!(grid.center(0, 0), Point::new(25.0, 15.0));
    }

    #[test]
    fn centers_use_column_for_x_and_row_for_y() {
        let grid = CellGrid::new(300.0, 200.0, 100.0);
        assert_eq!(grid.center(1, 2), Point::new(250.0, 150.0));
        assert_eq!(grid.cell_of(Point::new(250.0, 150.0)), Some((1, 2)));
        assert_eq!(grid.cell_of(Point::new(350.0, 150.0)), None);
    }

    #[test]
    fn claim_gives_up_on_full_grid() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut grid = CellGrid::new(100.0, 100.0, 100.0);
        assert!(grid.claim_random(&mut rng, 10).is_some());
        assert!(grid.claim_random(&mut rng, 10).is_none());
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn zero_attempts_places_nothing() {
        let mut rng = StdRng::seed_from_u64(2);
        let config = LoaderConfig {
            placement_attempts: 0,
            ..LoaderConfig::default()
        };
        let field = ShapeField::generate(400.0, 400.0, &config, &mut rng);
        assert!(field.is_empty());
    }

    #[test]
    fn shapes_never_share_a_cell() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let field = ShapeField::generate(800.0, 600.0, &config_with(30), &mut rng);
            let grid = CellGrid::new(800.0, 600.0, 100.0);

            let mut cells = HashSet::new();
            for shape in field.shapes() {
                let cell = grid.cell_of(shape.center()).expect("center inside grid");
                assert!(cells.insert(cell), "seed {seed}: cell {cell:?} used twice");
            }
        }
    }

    #[test]
    fn never_more_shapes_than_cells() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            // 3x2 grid, 30 requested
            let field = ShapeField::generate(300.0, 200.0, &config_with(30), &mut rng);
            assert!(field.len() <= 6, "seed {seed}: {} shapes", field.len());
            assert!(!field.is_empty());
        }
    }

    #[test]
    fn tiny_cell_size_is_clamped() {
        let grid = CellGrid::new(400.0, 400.0, 1e-6);
        assert_eq!((grid.rows(), grid.cols()), (400, 400));
        assert_eq!(grid.occupied_count(), 0);

        let nan = CellGrid::new(400.0, 300.0, f64::NAN);
        assert_eq!((nan.rows(), nan.cols()), (300, 400));

        let mut rng = StdRng::seed_from_u64(8);
        let config = LoaderConfig {
            cell_size: 1e-6,
            ..LoaderConfig::default()
        };
        let field = ShapeField::generate(400.0, 400.0, &config, &mut rng);
        assert!(!field.is_empty() && field.len() <= 30);

        let cells: HashSet<_> = field
            .shapes()
            .iter()
            .map(|s| grid.cell_of(s.center()).expect("center inside grid"))
            .collect();
        assert_eq!(cells.len(), field.len());
    }

    #[test]
    fn large_grid_places_every_requested_shape() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            // 20x20 cells, 30 requested
            let field = ShapeField::generate(2000.0, 2000.0, &config_with(30), &mut rng);
            assert!(field.len() <= 30);
            assert_eq!(field.len(), 30, "seed {seed}");
        }
    }

    #[test]
    fn random_attributes_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = ShapeField::generate(2000.0, 2000.0, &config_with(100), &mut rng);
        assert!(!field.is_empty());
        for shape in field.shapes() {
            assert!((20..=50).contains(&shape.radius()));
            assert!((0.0..0.03).contains(&shape.flash_rate()));
            assert!((0.0..1.0).contains(&shape.phase()));
            let c = shape.center();
            assert!(c.x > 0.0 && c.x < 2000.0 && c.y > 0.0 && c.y < 2000.0);
        }
    }

    #[test]
    fn phase_advances_by_flash_rate() {
        let mut shape = Shape::new(Point::new(10.0, 10.0), 20, 0.0125, 0.5);
        let style = ShapeStyle::from_config(&LoaderConfig::default());
        let mut surface = RecordingSurface::new(100.0, 100.0);

        let mut expected = shape.phase();
        for _ in 0..200 {
            let before = shape.phase();
            shape.render(&mut surface, &style);
            expected += 0.0125;
            assert!(shape.phase() > before);
            assert_eq!(shape.phase(), expected);
        }
        assert_eq!(surface.circle_count(), 200);
    }

    #[test]
    fn opacity_pulses_within_ceiling() {
        let max = 0.8;
        let at = |phase: f64| Shape::new(Point::default(), 20, 0.0, phase).opacity(max);

        assert!((at(0.0) - 0.4).abs() < 1e-12);
        assert!((at(0.25) - 0.8).abs() < 1e-12);
        assert!(at(0.75).abs() < 1e-12);
        assert!((at(1.25) - at(0.25)).abs() < 1e-9);

        for i in 0..1000 {
            let value = at(i as f64 * 0.0137);
            assert!((0.0..=max).contains(&value));
        }
    }

    #[test]
    fn render_paints_gray_disc_at_center() {
        let mut shape = Shape::new(Point::new(150.0, 50.0), 33, 0.0, 0.25);
        let style = ShapeStyle::from_config(&LoaderConfig::default());
        let mut surface = RecordingSurface::new(300.0, 100.0);
        shape.render(&mut surface, &style);

        match &surface.commands()[0] {
            DrawCommand::Circle { center, radius, color } => {
                assert_eq!(*center, Point::new(150.0, 50.0));
                assert_eq!(*radius, 33.0);
                assert_eq!((color.r, color.g, color.b), (100, 100, 100));
                assert!((color.alpha - 0.8).abs() < 1e-12);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn field_renders_in_creation_order() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut field = ShapeField::generate(500.0, 500.0, &config_with(10), &mut rng);
        let centers: Vec<Point> = field.shapes().iter().map(Shape::center).collect();

        let mut surface = RecordingSurface::new(500.0, 500.0);
        field.render(&mut surface);
        let drawn: Vec<Point> = surface
            .commands()
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Circle { center, .. } => Some(*center),
                _ => None,
            })
            .collect();
        assert_eq!(drawn, centers);
    }
}
