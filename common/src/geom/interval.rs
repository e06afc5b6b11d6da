pub type Span = (i64, i64);

/// Sorts spans and merges the ones that overlap or abut.
pub fn merge(mut spans: Vec<Span>) -> Vec<Span> {
    spans.retain(|&(lo, hi)| hi > lo);
    spans.sort_unstable();

    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for (lo, hi) in spans {
        match merged.last_mut() {
            Some(last) if lo <= last.1 => last.1 = last.1.max(hi),
            _ => merged.push((lo, hi)),
        }
    }
    merged
}

/// Removes every blocked span from `base`, returning what is left in X order.
///
/// Blocked spans that only touch `base` at an end point remove nothing and do not
/// leave zero-width pieces behind.
pub fn subtract(base: Span, blocked: &[Span]) -> Vec<Span> {
    let mut pieces = Vec::new();
    let mut cursor = base.0;

    for (lo, hi) in merge(blocked.to_vec()) {
        if hi <= cursor || lo >= base.1 {
            continue;
        }
        if lo > cursor {
            pieces.push((cursor, lo));
        }
        cursor = cursor.max(hi);
        if cursor >= base.1 {
            break;
        }
    }
    if cursor < base.1 {
        pieces.push((cursor, base.1));
    }
    pieces
}

/// True when `[lo, hi)` intersects any of the sorted, disjoint `spans`.
pub fn intersects_any(spans: &[Span], lo: i64, hi: i64) -> bool {
    let idx = spans.partition_point(|&(_, s_hi)| s_hi <= lo);
    spans.get(idx).is_some_and(|&(s_lo, _)| s_lo < hi)
}

/// True when `[lo, hi)` lies entirely inside one of the sorted, disjoint `spans`.
pub fn covered_by(spans: &[Span], lo: i64, hi: i64) -> bool {
    let idx = spans.partition_point(|&(_, s_hi)| s_hi <= lo);
    spans
        .get(idx)
        .is_some_and(|&(s_lo, s_hi)| s_lo <= lo && s_hi >= hi)
}

/// Rounds `x` up onto the site grid anchored at `origin`.
pub fn snap_up(x: i64, origin: i64, pitch: i64) -> i64 {
    origin + (x - origin + pitch - 1).div_euclid(pitch) * pitch
}

/// Rounds `x` down onto the site grid anchored at `origin`.
pub fn snap_down(x: i64, origin: i64, pitch: i64) -> i64 {
    origin + (x - origin).div_euclid(pitch) * pitch
}
