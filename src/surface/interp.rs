//! Row-wise gap filling and smoothing on the surface grid.

/// Fill empty buckets from the nearest non-empty bucket.
///
/// Equidistant gaps take the left neighbor. A row with no data at all is
/// filled with zeros.
pub(crate) fn nearest_fill(row: &[Option<f64>]) -> Vec<f64> {
    let known: Vec<usize> = row
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|_| i))
        .collect();
    if known.is_empty() {
        return vec![0.0; row.len()];
    }

    row.iter()
        .enumerate()
        .map(|(i, v)| {
            if let Some(value) = v {
                return *value;
            }
            // First known index to the right of i; its predecessor is the left neighbor.
            let right_pos = known.partition_point(|&k| k < i);
            let left = right_pos.checked_sub(1).map(|p| known[p]);
            let right = known.get(right_pos).copied();
            let source = match (left, right) {
                (Some(l), Some(r)) if i - l <= r - i => l,
                (Some(_), Some(r)) => r,
                (Some(l), None) => l,
                (None, Some(r)) => r,
                (None, None) => return 0.0,
            };
            row[source].unwrap_or(0.0)
        })
        .collect()
}

/// Three-point centered moving average; edge cells average the neighbors they have.
pub(crate) fn smooth3(row: &[f64]) -> Vec<f64> {
    let n = row.len();
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(1);
            let hi = (i + 1).min(n - 1);
            let window = &row[lo..=hi];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn fill_prefers_left_on_ties() {
        let row = [Some(1.0), None, Some(3.0)];
        assert_eq!(nearest_fill(&row), vec![1.0, 1.0, 3.0]);
    }

    #[test]
    fn fill_takes_closer_neighbor() {
        let row = [Some(1.0), None, None, None, Some(5.0), None];
        assert_eq!(nearest_fill(&row), vec![1.0, 1.0, 1.0, 5.0, 5.0, 5.0]);
    }

    #[test]
    fn fill_extends_edges() {
        let row = [None, None, Some(2.0), None];
        assert_eq!(nearest_fill(&row), vec![2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn empty_row_fills_with_zero() {
        assert_eq!(nearest_fill(&[None, None, None]), vec![0.0; 3]);
        assert!(nearest_fill(&[]).is_empty());
    }

    #[test]
    fn smoothing_uses_available_neighbors_at_edges() {
        let out = smooth3(&[3.0, 6.0, 9.0, 0.0]);
        assert_abs_diff_eq!(out[0], 4.5, epsilon = 1e-15);
        assert_abs_diff_eq!(out[1], 6.0, epsilon = 1e-15);
        assert_abs_diff_eq!(out[2], 5.0, epsilon = 1e-15);
        assert_abs_diff_eq!(out[3], 4.5, epsilon = 1e-15);
    }

    #[test]
    fn smoothing_keeps_constant_rows() {
        assert_eq!(smooth3(&[0.25; 5]), vec![0.25; 5]);
        assert_eq!(smooth3(&[0.7]), vec![0.7]);
        assert!(smooth3(&[]).is_empty());
    }
}
