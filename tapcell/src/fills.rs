use std::collections::{BTreeMap, HashSet};
use tap_common::db::core::LayoutDB;
use tap_common::db::indices::MasterId;
use tap_common::geom::interval::{self, Span};

/// X-range taken by a filler cell in the row whose bottom edge is `y_min`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FilledSite {
    pub y_min: i64,
    pub x_min: i64,
    pub x_max: i64,
}

/// Filled sites grouped by row Y. Ranges of one row are kept sorted and disjoint;
/// touching or overlapping ranges are merged on insertion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowFills {
    rows: BTreeMap<i64, Vec<Span>>,
}

impl RowFills {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sites<I: IntoIterator<Item = FilledSite>>(sites: I) -> Self {
        let mut grouped: BTreeMap<i64, Vec<Span>> = BTreeMap::new();
        for site in sites {
            grouped
                .entry(site.y_min)
                .or_default()
                .push((site.x_min, site.x_max));
        }
        let rows = grouped
            .into_iter()
            .map(|(y, spans)| (y, interval::merge(spans)))
            .filter(|(_, spans)| !spans.is_empty())
            .collect();
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn row(&self, y_min: i64) -> &[Span] {
        self.rows.get(&y_min).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_filled(&self, y_min: i64, x_min: i64, x_max: i64) -> bool {
        interval::intersects_any(self.row(y_min), x_min, x_max)
    }

    pub fn record(&mut self, site: FilledSite) {
        if site.x_max <= site.x_min {
            return;
        }
        let spans = self.rows.entry(site.y_min).or_default();
        let start = spans.partition_point(|&(_, hi)| hi < site.x_min);
        let mut end = start;
        let mut merged = (site.x_min, site.x_max);
        while end < spans.len() && spans[end].0 <= merged.1 {
            merged.0 = merged.0.min(spans[end].0);
            merged.1 = merged.1.max(spans[end].1);
            end += 1;
        }
        if start == end {
            spans.insert(start, merged);
        } else {
            spans[start] = merged;
            spans.drain(start + 1..end);
        }
    }

    /// Every merged range as a `FilledSite`, ordered by Y then X.
    pub fn sites(&self) -> impl Iterator<Item = FilledSite> + '_ {
        self.rows.iter().flat_map(|(&y_min, spans)| {
            spans.iter().map(move |&(x_min, x_max)| FilledSite {
                y_min,
                x_min,
                x_max,
            })
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = (i64, &[Span])> + '_ {
        self.rows.iter().map(|(&y, spans)| (y, spans.as_slice()))
    }
}

/// Rebuilds occupancy from the live instances of the given filler masters.
pub fn collect_fills(db: &LayoutDB, filler_masters: &[MasterId]) -> RowFills {
    let masters: HashSet<MasterId> = filler_masters.iter().copied().collect();
    RowFills::from_sites(
        db.insts()
            .filter(|(_, inst)| masters.contains(&inst.master))
            .map(|(_, inst)| {
                let bbox = db.placed_bbox(inst);
                FilledSite {
                    y_min: bbox.min.y,
                    x_min: bbox.min.x,
                    x_max: bbox.max.x,
                }
            }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(y_min: i64, x_min: i64, x_max: i64) -> FilledSite {
        FilledSite {
            y_min,
            x_min,
            x_max,
        }
    }

    #[test]
    fn record_merges_neighbors() {
        let mut fills = RowFills::new();
        fills.record(site(0, 50, 60));
        fills.record(site(0, 0, 10));
        fills.record(site(0, 20, 30));
        assert_eq!(fills.row(0), &[(0, 10), (20, 30), (50, 60)]);

        fills.record(site(0, 10, 20));
        assert_eq!(fills.row(0), &[(0, 30), (50, 60)]);

        fills.record(site(0, 25, 55));
        assert_eq!(fills.row(0), &[(0, 60)]);
        assert!(fills.row(100).is_empty());
    }

    #[test]
    fn filled_query_is_per_row() {
        let fills = RowFills::from_sites([site(0, 0, 10), site(100, 40, 60), site(100, 50, 70)]);
        assert!(fills.is_filled(0, 5, 15));
        assert!(!fills.is_filled(0, 10, 20));
        assert!(!fills.is_filled(100, 0, 40));
        assert!(fills.is_filled(100, 65, 80));
        assert_eq!(
            fills.sites().collect::<Vec<_>>(),
            vec![site(0, 0, 10), site(100, 40, 70)]
        );
    }
}
