//! Default sizes and tuning constants (all lengths in 1/100 mm)

/// Radius around a shape border that still counts as a hit
pub const FIND_RADIUS: f64 = 150.0;
/// Tolerance used when snapping a port to a candidate location
pub const PORT_SNAP_RADIUS: f64 = 200.0;

/// Fraction of the neighbour chord used for auto-derived control points
pub const SMOOTHING_FACTOR: f64 = 0.2;
/// Parameter steps per cubic segment
pub const CUBIC_STEPS: usize = 10;
/// Parameter steps per quadratic segment
pub const QUADRATIC_STEPS: usize = 9;
/// Control coordinates closer than this on one axis are treated as a straight segment
pub const STRAIGHT_AXIS_EPSILON: f64 = 1.0;

/// Cubic handle factor of a quarter circle: 4/3 (sqrt(2) - 1)
pub const KAPPA: f64 = 0.552_284_749_830_793_4;

/// Default item size used by fresh graph items
pub const ITEM_WIDTH: f64 = 3000.0;
pub const ITEM_HEIGHT: f64 = 2000.0;

/// Decimal places written for formula constants produced by shape builders
pub const FORMULA_PRECISION: usize = 6;
