//! Conversions between velocity components and speed/direction.
//!
//! Direction follows the meteorological convention: the compass bearing the
//! wind blows *from*, in degrees.

/// Wind speed and direction from the horizontal components `(u, v)`.
pub fn speed_direction(u: f64, v: f64) -> (f64, f64) {
    let speed = u.hypot(v);
    let direction = 180.0 + u.atan2(v).to_degrees();
    (speed, direction)
}

/// Horizontal components `(u, v)` from wind speed and direction.
pub fn components(speed: f64, direction: f64) -> (f64, f64) {
    let angle = (270.0 - direction).to_radians();
    (speed * angle.cos(), speed * angle.sin())
}
