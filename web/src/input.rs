use twofold_core::Direction;

/// Minimum travel, in CSS pixels, for a touch to count as a swipe.
pub(crate) const SWIPE_THRESHOLD: f64 = 30.0;

pub(crate) fn direction_for_key(key: &str) -> Option<Direction> {
    match key {
        "ArrowUp" => Some(Direction::Up),
        "ArrowDown" => Some(Direction::Down),
        "ArrowLeft" => Some(Direction::Left),
        "ArrowRight" => Some(Direction::Right),
        _ => None,
    }
}

/// Direction of a swipe from `start` to `end` along its dominant axis.
///
/// Screen coordinates grow rightwards and downwards. Travel must exceed
/// [`SWIPE_THRESHOLD`]; ties between the axes go to the vertical one.
pub(crate) fn swipe_direction(start: (f64, f64), end: (f64, f64)) -> Option<Direction> {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;

    if dx.abs() > dy.abs() {
        if dx.abs() <= SWIPE_THRESHOLD {
            None
        } else if dx > 0.0 {
            Some(Direction::Right)
        } else {
            Some(Direction::Left)
        }
    } else if dy.abs() <= SWIPE_THRESHOLD {
        None
    } else if dy > 0.0 {
        Some(Direction::Down)
    } else {
        Some(Direction::Up)
    }
}
