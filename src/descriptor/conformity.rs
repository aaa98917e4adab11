//! Length conformity between command lists and their delay list

/// True when `delays` has exactly one entry per gap between `items`
pub fn is_length_conformant<T>(items: &[T], delays: &[u64]) -> bool {
    items.len() <= 1 || items.len() == delays.len() + 1
}

/// Pad `delays` with `default_delay` until every gap between `items` has one.
///
/// Over-long delay lists are left alone.
pub fn enforce_length_conformity<T>(items: &[T], delays: &mut Vec<u64>, default_delay: u64) {
    if is_length_conformant(items, delays) {
        return;
    }

    let gaps = items.len() - 1;
    if delays.len() < gaps {
        delays.resize(gaps, default_delay);
    }
}
