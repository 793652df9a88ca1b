use crate::{
    systems::clustering::Cluster,
    video::{Colour, Frame},
    Point2D,
};

pub const CLUSTER_POINT_COLOUR: Colour = (0, 0, 255);
pub const CENTROID_COLOUR: Colour = (0, 255, 0);
pub const PREDICTED_COLOUR: Colour = (255, 0, 0);
pub const LINK_COLOUR: Colour = (255, 255, 0);

/// Draw a filled disc of the given radius.
pub fn draw_disc(frame: &mut Frame, centre: Point2D, radius: i32, colour: Colour) {
    let (cx, cy) = (centre.0.round() as i32, centre.1.round() as i32);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                frame.set_pixel(cx + dx, cy + dy, colour);
            }
        }
    }
}

/// Draw a one-pixel ring of the given radius.
pub fn draw_ring(frame: &mut Frame, centre: Point2D, radius: i32, colour: Colour) {
    let (cx, cy) = (centre.0.round() as i32, centre.1.round() as i32);
    let inner = (radius - 1) * (radius - 1);
    let outer = (radius + 1) * (radius + 1);
    for dy in -radius - 1..=radius + 1 {
        for dx in -radius - 1..=radius + 1 {
            let d2 = dx * dx + dy * dy;
            if d2 > inner && d2 < outer {
                frame.set_pixel(cx + dx, cy + dy, colour);
            }
        }
    }
}

/// Draw a straight line segment (Bresenham).
pub fn draw_line(frame: &mut Frame, from: Point2D, to: Point2D, colour: Colour) {
    let (mut x0, mut y0) = (from.0.round() as i32, from.1.round() as i32);
    let (x1, y1) = (to.0.round() as i32, to.1.round() as i32);

    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        frame.set_pixel(x0, y0, colour);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Mark one cluster: small discs on member points, a ring at the centroid.
pub fn draw_cluster(frame: &mut Frame, cluster: &Cluster) {
    for point in cluster.points.iter() {
        draw_disc(frame, *point, 2, CLUSTER_POINT_COLOUR);
    }
    if let Some(centre) = cluster.centroid() {
        draw_ring(frame, centre, 6, CENTROID_COLOUR);
    }
}

/// Diagnostic overlay: the filter's estimated position, linked back to the
/// measured centroid it was corrected with.
pub fn draw_prediction(frame: &mut Frame, measured: Point2D, predicted: Point2D) {
    draw_ring(frame, predicted, 6, PREDICTED_COLOUR);
    draw_line(frame, measured, predicted, LINK_COLOUR);
}
