//! Mosaic layout engine
//!
//! Packs images into rows of exactly [`GRID_COLUMNS`] column units. Each image
//! gets a column span from its aspect ratio; every image in a row shares one
//! row span derived from the row's mean aspect ratio.
//!
//! The breakpoints below were tuned by eye against a reference design. Keep
//! them as they are.

use serde::Serialize;

use super::metrics::ViewportClass;

/// Column units in one gallery row
pub const GRID_COLUMNS: u8 = 12;

/// Grid cell span for one image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutSpan {
    /// Columns out of [`GRID_COLUMNS`]
    pub columns: u8,
    /// Row-height multiplier (in row units)
    pub row_units: u8,
}

impl LayoutSpan {
    pub const fn new(columns: u8, row_units: u8) -> Self {
        Self { columns, row_units }
    }

    /// Span used for any slot the packer did not assign.
    pub const fn fallback(viewport: ViewportClass) -> Self {
        match viewport {
            ViewportClass::Mobile => Self::new(12, 6),
            ViewportClass::Desktop => Self::new(4, 5),
        }
    }
}

/// Replace non-finite or non-positive ratios with 1.0.
pub fn sanitize_ratio(ratio: f64) -> f64 {
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    }
}

/// Preferred column span for an aspect ratio.
pub fn preferred_columns(ratio: f64, viewport: ViewportClass) -> u8 {
    let ratio = sanitize_ratio(ratio);
    let columns = match viewport {
        ViewportClass::Mobile => {
            if ratio >= 1.35 {
                12
            } else {
                6
            }
        }
        ViewportClass::Desktop => {
            if ratio >= 1.9 {
                6
            } else if ratio >= 1.45 {
                5
            } else if ratio >= 1.05 {
                4
            } else if ratio >= 0.8 {
                3
            } else {
                2
            }
        }
    };
    columns.min(GRID_COLUMNS)
}

/// Shared row span for a row with the given mean aspect ratio.
pub fn row_units_for(mean_ratio: f64, viewport: ViewportClass) -> u8 {
    match viewport {
        ViewportClass::Mobile => {
            if mean_ratio < 0.95 {
                8
            } else {
                6
            }
        }
        ViewportClass::Desktop => {
            if mean_ratio < 0.9 {
                7
            } else if mean_ratio > 1.5 {
                4
            } else {
                5
            }
        }
    }
}

/// Distribute a row's column deficit one unit at a time, left to right.
///
/// Passes repeat until the row sums to [`GRID_COLUMNS`] or no item has
/// headroom left.
pub fn fill_row(columns: &mut [u8]) {
    let mut sum: u32 = columns.iter().map(|&c| u32::from(c)).sum();
    let target = u32::from(GRID_COLUMNS);

    while sum < target {
        let mut updated = false;
        for col in columns.iter_mut() {
            if sum >= target {
                break;
            }
            if *col < GRID_COLUMNS {
                *col += 1;
                sum += 1;
                updated = true;
            }
        }
        if !updated {
            break;
        }
    }
}

/// Row being accumulated by the packer
#[derive(Default)]
struct PendingRow {
    indices: Vec<usize>,
    columns: Vec<u8>,
    ratios: Vec<f64>,
    sum: u32,
}

impl PendingRow {
    fn push(&mut self, index: usize, columns: u8, ratio: f64) {
        self.indices.push(index);
        self.columns.push(columns);
        self.ratios.push(ratio);
        self.sum += u32::from(columns);
    }

    fn flush(&mut self, viewport: ViewportClass, out: &mut [Option<LayoutSpan>]) {
        if self.indices.is_empty() {
            return;
        }

        fill_row(&mut self.columns);
        let mean = self.ratios.iter().sum::<f64>() / self.ratios.len() as f64;
        let row_units = row_units_for(mean, viewport);

        for (&index, &columns) in self.indices.iter().zip(&self.columns) {
            out[index] = Some(LayoutSpan::new(columns, row_units));
        }

        *self = Self::default();
    }
}

/// Assign a grid span to every image, in input order.
///
/// Greedy single pass: items accumulate into a row until the next one would
/// overflow it (flush first) or the row hits exactly 12 units (flush now).
pub fn build_layout(ratios: &[f64], viewport: ViewportClass) -> Vec<LayoutSpan> {
    let mut spans: Vec<Option<LayoutSpan>> = vec![None; ratios.len()];
    let mut row = PendingRow::default();
    let target = u32::from(GRID_COLUMNS);

    for (index, &raw) in ratios.iter().enumerate() {
        let ratio = sanitize_ratio(raw);
        let columns = preferred_columns(ratio, viewport);

        if row.sum + u32::from(columns) > target {
            row.flush(viewport, &mut spans);
        }

        row.push(index, columns, ratio);

        if row.sum == target {
            row.flush(viewport, &mut spans);
        }
    }
    row.flush(viewport, &mut spans);

    spans
        .into_iter()
        .map(|span| span.unwrap_or_else(|| LayoutSpan::fallback(viewport)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESKTOP: ViewportClass = ViewportClass::Desktop;
    const MOBILE: ViewportClass = ViewportClass::Mobile;

    /// Split spans back into rows by walking the packer's rules.
    fn rows_of(spans: &[LayoutSpan], ratios: &[f64], viewport: ViewportClass) -> Vec<Vec<u8>> {
        let mut rows = Vec::new();
        let mut current = Vec::new();
        let mut sum = 0u32;
        for (span, &ratio) in spans.iter().zip(ratios) {
            let preferred = u32::from(preferred_columns(ratio, viewport));
            if sum + preferred > 12 {
                rows.push(std::mem::take(&mut current));
                sum = 0;
            }
            current.push(span.columns);
            sum += preferred;
            if sum == 12 {
                rows.push(std::mem::take(&mut current));
                sum = 0;
            }
        }
        if !current.is_empty() {
            rows.push(current);
        }
        rows
    }

    #[test]
    fn test_preferred_columns_desktop_breakpoints() {
        assert_eq!(preferred_columns(2.5, DESKTOP), 6);
        assert_eq!(preferred_columns(1.9, DESKTOP), 6);
        assert_eq!(preferred_columns(1.6, DESKTOP), 5);
        assert_eq!(preferred_columns(1.45, DESKTOP), 5);
        assert_eq!(preferred_columns(1.2, DESKTOP), 4);
        assert_eq!(preferred_columns(1.05, DESKTOP), 4);
        assert_eq!(preferred_columns(1.0, DESKTOP), 3);
        assert_eq!(preferred_columns(0.8, DESKTOP), 3);
        assert_eq!(preferred_columns(0.66, DESKTOP), 2);
    }

    #[test]
    fn test_preferred_columns_mobile_breakpoints() {
        assert_eq!(preferred_columns(1.35, MOBILE), 12);
        assert_eq!(preferred_columns(1.78, MOBILE), 12);
        assert_eq!(preferred_columns(1.34, MOBILE), 6);
        assert_eq!(preferred_columns(0.5, MOBILE), 6);
    }

    #[test]
    fn test_malformed_ratios_behave_like_square() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.0, -2.0] {
            assert_eq!(preferred_columns(bad, DESKTOP), preferred_columns(1.0, DESKTOP));
            assert_eq!(sanitize_ratio(bad), 1.0);
        }
        let spans = build_layout(&[f64::NAN, -1.0, 0.0, f64::INFINITY], DESKTOP);
        assert_eq!(spans, vec![LayoutSpan::new(3, 5); 4]);
    }

    #[test]
    fn test_empty_input() {
        assert!(build_layout(&[], DESKTOP).is_empty());
        assert!(build_layout(&[], MOBILE).is_empty());
    }

    #[test]
    fn test_output_length_matches_input() {
        for len in 0..40 {
            let ratios: Vec<f64> = (0..len).map(|i| 0.5 + (i % 7) as f64 * 0.3).collect();
            assert_eq!(build_layout(&ratios, DESKTOP).len(), len);
            assert_eq!(build_layout(&ratios, MOBILE).len(), len);
        }
    }

    #[test]
    fn test_wide_then_portraits_never_overflow() {
        let ratios = [2.0, 0.9, 0.9];
        let spans = build_layout(&ratios, DESKTOP);
        // 6 + 3 + 3 closes exactly at 12
        assert_eq!(
            spans,
            vec![LayoutSpan::new(6, 5), LayoutSpan::new(3, 5), LayoutSpan::new(3, 5)]
        );
        for row in rows_of(&spans, &ratios, DESKTOP) {
            assert!(row.iter().map(|&c| u32::from(c)).sum::<u32>() <= 12);
        }
    }

    #[test]
    fn test_overflow_flushes_before_adding() {
        // 6 + 5 = 11, next 4 would overflow -> first row padded to 12
        let ratios = [2.0, 1.5, 1.2];
        let spans = build_layout(&ratios, DESKTOP);
        assert_eq!(spans[0].columns + spans[1].columns, 12);
        // Mean ratio 1.75 -> short row
        assert_eq!(spans[0], LayoutSpan::new(7, 4));
        assert_eq!(spans[1], LayoutSpan::new(5, 4));
        // Last row alone: 4 padded to 12
        assert_eq!(spans[2], LayoutSpan::new(12, 5));
    }

    #[test]
    fn test_deficit_spreads_left_to_right() {
        let mut columns = [2, 2, 3];
        fill_row(&mut columns);
        assert_eq!(columns, [4, 4, 4]);

        let mut columns = [3, 3];
        fill_row(&mut columns);
        assert_eq!(columns, [6, 6]);

        let mut columns = [5, 2, 2];
        fill_row(&mut columns);
        assert_eq!(columns, [6, 3, 3]);
    }

    #[test]
    fn test_fill_row_stops_without_headroom() {
        let mut columns = [12];
        fill_row(&mut columns);
        assert_eq!(columns, [12]);

        let mut empty: [u8; 0] = [];
        fill_row(&mut empty);
    }

    #[test]
    fn test_rows_sum_to_twelve() {
        let ratios = [0.66, 0.75, 1.5, 1.0, 1.33, 2.4, 0.8, 0.7, 1.1, 1.9, 0.5, 1.25];
        for viewport in [DESKTOP, MOBILE] {
            let spans = build_layout(&ratios, viewport);
            for row in rows_of(&spans, &ratios, viewport) {
                let sum: u32 = row.iter().map(|&c| u32::from(c)).sum();
                assert_eq!(sum, 12, "{viewport:?} row {row:?}");
            }
        }
    }

    #[test]
    fn test_row_units_shared_within_row() {
        // Portrait-heavy row gets taller tiles
        let spans = build_layout(&[0.66, 0.66, 0.66, 0.66, 0.66, 0.66], DESKTOP);
        assert!(spans.iter().all(|s| *s == LayoutSpan::new(2, 7)));

        // Panoramas get short rows
        let spans = build_layout(&[2.0, 2.0], DESKTOP);
        assert!(spans.iter().all(|s| *s == LayoutSpan::new(6, 4)));
    }

    #[test]
    fn test_row_units_thresholds() {
        assert_eq!(row_units_for(0.89, DESKTOP), 7);
        assert_eq!(row_units_for(0.9, DESKTOP), 5);
        assert_eq!(row_units_for(1.5, DESKTOP), 5);
        assert_eq!(row_units_for(1.51, DESKTOP), 4);
        assert_eq!(row_units_for(0.94, MOBILE), 8);
        assert_eq!(row_units_for(0.95, MOBILE), 6);
    }

    #[test]
    fn test_mobile_pairs_portraits_and_isolates_landscapes() {
        let spans = build_layout(&[0.7, 0.7, 1.5, 0.8], MOBILE);
        assert_eq!(spans[0], LayoutSpan::new(6, 8));
        assert_eq!(spans[1], LayoutSpan::new(6, 8));
        assert_eq!(spans[2], LayoutSpan::new(12, 6));
        // Lone trailing portrait padded to full width
        assert_eq!(spans[3], LayoutSpan::new(12, 8));
    }

    #[test]
    fn test_build_layout_is_idempotent() {
        let ratios = [1.0, 0.66, 1.5, 2.2, 0.8, 1.33, 0.75];
        for viewport in [DESKTOP, MOBILE] {
            assert_eq!(build_layout(&ratios, viewport), build_layout(&ratios, viewport));
        }
    }

    #[test]
    fn test_columns_always_in_range() {
        let ratios: Vec<f64> = (1..200).map(|i| i as f64 / 40.0).collect();
        for viewport in [DESKTOP, MOBILE] {
            for span in build_layout(&ratios, viewport) {
                assert!((1..=12).contains(&span.columns));
            }
        }
    }

    #[test]
    fn test_fallback_spans() {
        assert_eq!(LayoutSpan::fallback(MOBILE), LayoutSpan::new(12, 6));
        assert_eq!(LayoutSpan::fallback(DESKTOP), LayoutSpan::new(4, 5));
    }
}
