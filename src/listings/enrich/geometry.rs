use crate::listings::domain::Coordinates;

/// Mean Earth radius (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

pub fn is_valid(point: Coordinates) -> bool {
    point.latitude.is_finite()
        && point.longitude.is_finite()
        && point.latitude.abs() <= 90.0
        && point.longitude.abs() <= 180.0
}

/// Great-circle distance in kilometres.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();
    EARTH_RADIUS_KM * c
}

/// Shortest distance in metres from `point` to any segment of `polyline`.
///
/// Segments are projected onto a plane tangent at `point`, which is exact enough at
/// neighbourhood scale.
pub fn distance_to_polyline_m(point: Coordinates, polyline: &[Coordinates]) -> f64 {
    match polyline {
        [] => f64::INFINITY,
        [single] => haversine_km(point, *single) * 1000.0,
        _ => polyline
            .windows(2)
            .map(|segment| {
                let start = project(point, segment[0]);
                let end = project(point, segment[1]);
                distance_to_segment(start, end)
            })
            .fold(f64::INFINITY, f64::min),
    }
}

fn project(origin: Coordinates, point: Coordinates) -> (f64, f64) {
    let radius_m = EARTH_RADIUS_KM * 1000.0;
    let x = (point.longitude - origin.longitude).to_radians()
        * origin.latitude.to_radians().cos()
        * radius_m;
    let y = (point.latitude - origin.latitude).to_radians() * radius_m;
    (x, y)
}

/// Distance from the origin to the segment `start..end` in the projected plane.
fn distance_to_segment(start: (f64, f64), end: (f64, f64)) -> f64 {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq == 0.0 {
        0.0
    } else {
        ((-start.0 * dx - start.1 * dy) / length_sq).clamp(0.0, 1.0)
    };
    let nearest = (start.0 + t * dx, start.1 + t * dy);
    nearest.0.hypot(nearest.1)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
