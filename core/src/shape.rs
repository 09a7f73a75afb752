// Geometry helpers for per-pixel rasterisation.

#[inline]
fn cross(ax: f32, ay: f32, bx: f32, by: f32) -> f32 { ax * by - ay * bx }

/// Inclusive point-in-triangle test: points on an edge count as inside.
pub fn point_in_triangle(px: f32, py: f32, p1: (f32, f32), p2: (f32, f32), p3: (f32, f32)) -> bool {
    let (x1, y1) = p1;
    let (x2, y2) = p2;
    let (x3, y3) = p3;
    let c1 = cross(x2 - x1, y2 - y1, px - x1, py - y1);
    let c2 = cross(x3 - x2, y3 - y2, px - x2, py - y2);
    let c3 = cross(x1 - x3, y1 - y3, px - x3, py - y3);
    let has_neg = (c1 < 0.0) || (c2 < 0.0) || (c3 < 0.0);
    let has_pos = (c1 > 0.0) || (c2 > 0.0) || (c3 > 0.0);
    !(has_neg && has_pos)
}

/// Whether (px, py) lies inside a rounded square of side `side` with corner
/// radius `radius`, centred on (cx, cy).
pub fn in_rounded_square(px: f32, py: f32, cx: f32, cy: f32, side: f32, radius: f32) -> bool {
    let half = side * 0.5;
    let dx = (px - cx).abs();
    let dy = (py - cy).abs();
    if dx > half || dy > half {
        return false;
    }
    // distance into the corner region
    let qx = dx - (half - radius);
    let qy = dy - (half - radius);
    if qx <= 0.0 || qy <= 0.0 {
        return true;
    }
    qx * qx + qy * qy <= radius * radius
}
