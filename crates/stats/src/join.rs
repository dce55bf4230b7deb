/// Merge-joins a submission's id-sorted probability column against a wanted
/// id universe (also sorted ascending), e.g. a round's validation/test/live
/// partition ids. The result always has `wanted.len()` entries so it stays
/// positionally aligned with any parallel per-id array (e.g. cluster
/// assignments): an id present in `wanted` but absent from the submission
/// yields `NaN` rather than shrinking the output, matching the spec's
/// "rows outside are ignored" clause run in reverse — a submission missing
/// a consulted row simply contributes no value for it instead of shifting
/// every later value out of alignment.
pub fn join_by_id(ids: &[String], values: &[f64], wanted: &[String]) -> Vec<f64> {
    let mut out = Vec::with_capacity(wanted.len());
    let mut i = 0usize;
    for w in wanted {
        while i < ids.len() && ids[i].as_str() < w.as_str() {
            i += 1;
        }
        if i < ids.len() && ids[i] == *w {
            out.push(values[i]);
        } else {
            out.push(f64::NAN);
        }
    }
    out
}

/// Merge-joins two id-sorted probability columns down to their common ids,
/// preserving ascending id order in both outputs. Used to pair two
/// submissions by row-id before computing Pearson correlation, per the
/// design note resolving the "pair by row-id" open question: two
/// submissions only line up positionally once restricted to the ids they
/// both cover.
pub fn join_common(
    ids_a: &[String],
    a: &[f64],
    ids_b: &[String],
    b: &[f64],
) -> (Vec<f64>, Vec<f64>) {
    let mut out_a = Vec::new();
    let mut out_b = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    while i < ids_a.len() && j < ids_b.len() {
        match ids_a[i].cmp(&ids_b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out_a.push(a[i]);
                out_b.push(b[j]);
                i += 1;
                j += 1;
            }
        }
    }
    (out_a, out_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_by_id_picks_out_wanted_rows_in_order() {
        let ids = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        let values = vec![1.0, 2.0, 3.0, 4.0];
        let wanted = vec!["b".into(), "d".into()];
        assert_eq!(join_by_id(&ids, &values, &wanted), vec![2.0, 4.0]);
    }

    #[test]
    fn join_by_id_fills_missing_ids_with_nan_to_preserve_alignment() {
        let ids = vec!["a".into(), "c".into()];
        let values = vec![1.0, 3.0];
        let wanted = vec!["a".into(), "b".into(), "c".into()];
        let joined = join_by_id(&ids, &values, &wanted);
        assert_eq!(joined.len(), 3);
        assert_eq!(joined[0], 1.0);
        assert!(joined[1].is_nan());
        assert_eq!(joined[2], 3.0);
    }

    #[test]
    fn join_common_keeps_only_shared_ids() {
        let ids_a = vec!["a".into(), "b".into(), "c".into()];
        let a = vec![1.0, 2.0, 3.0];
        let ids_b = vec!["b".into(), "c".into(), "d".into()];
        let b = vec![20.0, 30.0, 40.0];
        let (ja, jb) = join_common(&ids_a, &a, &ids_b, &b);
        assert_eq!(ja, vec![2.0, 3.0]);
        assert_eq!(jb, vec![20.0, 30.0]);
    }
}
