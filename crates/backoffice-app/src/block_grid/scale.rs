//! Column and row span fitting for block grid entries.

/// Option in `options` closest to `target`, ignoring options above `max`.
///
/// Ties go to the smaller option. `None` when no option fits.
pub fn closest_column_span_option(target: u32, options: &[u32], max: u32) -> Option<u32> {
    options
        .iter()
        .copied()
        .filter(|&option| option <= max)
        .min_by_key(|&option| (option.abs_diff(target), option))
}

/// Column span an entry ends up with when asked for `requested`.
///
/// Snaps to the closest relevant option, or to the full layout width when
/// there are no options.
pub fn calc_column_span(requested: u32, relevant_options: &[u32], layout_columns: u32) -> u32 {
    if relevant_options.is_empty() {
        return layout_columns;
    }
    closest_column_span_option(requested, relevant_options, layout_columns).unwrap_or(layout_columns)
}

/// `requested` limited to `[min, max]`. A misconfigured range (`min > max`)
/// resolves to `min`.
pub fn clamp_row_span(requested: u32, min: u32, max: u32) -> u32 {
    requested.min(max).max(min)
}

/// Options that fit in `layout_columns`, ascending and without repeats.
pub fn relevant_column_span_options(options: &[u32], layout_columns: u32) -> Vec<u32> {
    let mut relevant: Vec<u32> = options
        .iter()
        .copied()
        .filter(|&option| option <= layout_columns)
        .collect();
    relevant.sort_unstable();
    relevant.dedup();
    relevant
}

/// Decides how requested spans map onto allowed spans.
pub trait ScaleStrategy: Send + Sync {
    /// Column span for a request of `requested` columns.
    fn column_span(&self, requested: u32, relevant_options: &[u32], layout_columns: u32) -> u32;

    /// Row span for a request of `requested` rows.
    fn row_span(&self, requested: u32, min: u32, max: u32) -> u32 {
        clamp_row_span(requested, min, max)
    }
}

/// Snap to the closest allowed option.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapToOptions;

impl ScaleStrategy for SnapToOptions {
    fn column_span(&self, requested: u32, relevant_options: &[u32], layout_columns: u32) -> u32 {
        calc_column_span(requested, relevant_options, layout_columns)
    }
}
