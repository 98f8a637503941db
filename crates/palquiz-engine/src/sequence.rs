use std::collections::HashSet;

/// Find the position after `current` whose question has not been answered,
/// walking `order` cyclically.
///
/// Returns `None` once a full sweep finds nothing left to answer, so callers
/// keep their position unchanged. `current` itself is considered last.
pub fn next_position(order: &[u32], current: usize, answered: &HashSet<u32>) -> Option<usize> {
    let n = order.len();
    if n == 0 {
        return None;
    }

    let start = current % n;
    let mut position = start;
    loop {
        position = (position + 1) % n;
        if !answered.contains(&order[position]) {
            return Some(position);
        }
        if position == start {
            return None;
        }
    }
}
