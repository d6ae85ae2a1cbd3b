//! Planar geometry on a local tangent plane.
//!
//! Obstacle clearance is evaluated in meters on an equirectangular
//! projection centred on the segment being tested.  Over the few hundred
//! meters a planning leg spans, the projection error is far below the
//! safety margins involved.
//!
//! | Function | Role |
//! |----------|------|
//! | [`segment_intersects_circle`] | Closest-point-on-segment clearance test. |
//! | [`segments_intersect`]        | Signed-area (determinant) crossing test. |

use usv_types::Position;

use crate::geo::{EARTH_RADIUS_M, distance};

// ────────────────────────────────────────────────────────────────────────────
// LocalFrame
// ────────────────────────────────────────────────────────────────────────────

/// Equirectangular projection anchored at `origin`.
///
/// `project` maps a position to `(east_m, north_m)` relative to the origin.
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame {
    origin: Position,
    meters_per_deg_lat: f64,
    meters_per_deg_lon: f64,
}

impl LocalFrame {
    pub fn new(origin: Position) -> Self {
        let meters_per_deg_lat = EARTH_RADIUS_M.to_radians();
        Self {
            origin,
            meters_per_deg_lat,
            meters_per_deg_lon: meters_per_deg_lat * origin.latitude.to_radians().cos(),
        }
    }

    pub fn project(&self, p: Position) -> (f64, f64) {
        let mut d_lon = p.longitude - self.origin.longitude;
        // Take the short way across the antimeridian.
        if d_lon > 180.0 {
            d_lon -= 360.0;
        } else if d_lon < -180.0 {
            d_lon += 360.0;
        }
        (
            d_lon * self.meters_per_deg_lon,
            (p.latitude - self.origin.latitude) * self.meters_per_deg_lat,
        )
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Intersection tests
// ────────────────────────────────────────────────────────────────────────────

/// True when the segment `start → end` passes within `radius_m` of `center`.
///
/// Either endpoint lying inside the circle counts as an intersection.
pub fn segment_intersects_circle(
    start: Position,
    end: Position,
    center: Position,
    radius_m: f64,
) -> bool {
    if distance(start, center) <= radius_m || distance(end, center) <= radius_m {
        return true;
    }

    let frame = LocalFrame::new(start);
    let (dx, dy) = frame.project(end);
    let (cx, cy) = frame.project(center);

    let length_sq = dx * dx + dy * dy;
    if length_sq == 0.0 {
        // Degenerate segment: the endpoint check above already covered it.
        return false;
    }

    let t = ((cx * dx + cy * dy) / length_sq).clamp(0.0, 1.0);
    let (px, py) = (t * dx, t * dy);
    (cx - px).hypot(cy - py) <= radius_m
}

/// True when segment `p1 → p2` crosses or touches segment `p3 → p4`.
pub fn segments_intersect(p1: Position, p2: Position, p3: Position, p4: Position) -> bool {
    let frame = LocalFrame::new(p1);
    let (x1, y1) = frame.project(p1);
    let (x2, y2) = frame.project(p2);
    let (x3, y3) = frame.project(p3);
    let (x4, y4) = frame.project(p4);

    let d1 = (x1 - x3) * (y4 - y3) - (y1 - y3) * (x4 - x3);
    let d2 = (x2 - x3) * (y4 - y3) - (y2 - y3) * (x4 - x3);
    let d3 = (x3 - x1) * (y2 - y1) - (y3 - y1) * (x2 - x1);
    let d4 = (x4 - x1) * (y2 - y1) - (y4 - y1) * (x2 - x1);

    if [d1, d2, d3, d4].iter().all(|d| d.abs() <= COLLINEAR_EPS) {
        return overlaps((x1, x2), (x3, x4)) && overlaps((y1, y2), (y3, y4));
    }

    d1 * d2 <= 0.0 && d3 * d4 <= 0.0
}

// Signed areas below this (m²) count as collinear.
const COLLINEAR_EPS: f64 = 1e-9;

fn overlaps((a0, a1): (f64, f64), (b0, b1): (f64, f64)) -> bool {
    a0.min(a1) <= b0.max(b1) && b0.min(b1) <= a0.max(a1)
}
