use crate::ClusteringError;
use std::path::Path;

/// One tournament-data partition: row ids and their feature vectors, both
/// sorted ascending by id.
pub struct Partition {
    pub ids: Vec<String>,
    pub features: Vec<Vec<f64>>,
}

/// Feature matrix to fit on, plus the three tournament partitions to
/// predict against.
pub struct Dataset {
    pub training: Vec<Vec<f64>>,
    pub validation: Partition,
    pub test: Partition,
    pub live: Partition,
}

struct Columns {
    feature_indices: Vec<usize>,
    id_index: Option<usize>,
    data_type_index: Option<usize>,
}

/// Loads `numerai_training_data.csv` and `numerai_tournament_data.csv` from
/// a dataset directory (as produced by unpacking the round's archive).
pub fn load(dataset_dir: &Path) -> Result<Dataset, ClusteringError> {
    let training_path = dataset_dir.join("numerai_training_data.csv");
    let tournament_path = dataset_dir.join("numerai_tournament_data.csv");

    let (training_cols, training_rows) = read_rows(&training_path)?;
    let training: Vec<Vec<f64>> = training_rows
        .iter()
        .filter_map(|row| extract_features(row, &training_cols.feature_indices))
        .collect();

    let (tournament_cols, tournament_rows) = read_rows(&tournament_path)?;
    let id_idx = tournament_cols
        .id_index
        .ok_or(ClusteringError::MissingColumn("id"))?;
    let type_idx = tournament_cols
        .data_type_index
        .ok_or(ClusteringError::MissingColumn("data_type"))?;

    let mut validation = Vec::new();
    let mut test = Vec::new();
    let mut live = Vec::new();
    for row in &tournament_rows {
        let id = row.get(id_idx).cloned().unwrap_or_default();
        let data_type = row.get(type_idx).map(String::as_str).unwrap_or("");
        let features = match extract_features(row, &tournament_cols.feature_indices) {
            Some(f) => f,
            None => continue,
        };
        match data_type {
            "validation" => validation.push((id, features)),
            "test" => test.push((id, features)),
            "live" => live.push((id, features)),
            _ => {}
        }
    }

    let mut training = training;
    training.extend(
        tournament_rows
            .iter()
            .filter_map(|row| extract_features(row, &tournament_cols.feature_indices)),
    );

    Ok(Dataset {
        training,
        validation: into_partition(validation),
        test: into_partition(test),
        live: into_partition(live),
    })
}

fn into_partition(mut rows: Vec<(String, Vec<f64>)>) -> Partition {
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    let (ids, features) = rows.into_iter().unzip();
    Partition { ids, features }
}

fn extract_features(row: &[String], feature_cols: &[usize]) -> Option<Vec<f64>> {
    let mut features = Vec::with_capacity(feature_cols.len());
    for &col in feature_cols {
        let value: f64 = row.get(col)?.parse().ok()?;
        if value.is_nan() {
            return None;
        }
        features.push(value);
    }
    Some(features)
}

/// A validation-partition row's era and label, joined against a submission
/// by id to compute per-era consistency (§4.E.1). Lives alongside the
/// cluster-feature loader because both read the same tournament CSV; this
/// path just keeps different columns.
pub struct ValidationRow {
    pub id: String,
    pub era: String,
    pub target: f64,
}

/// Loads `id`, `era`, `target` for every `data_type == validation` row,
/// sorted ascending by id so the ingress consumer can merge-join it against
/// a submission's id-sorted probability column.
pub fn load_validation_rows(dataset_dir: &Path) -> Result<Vec<ValidationRow>, ClusteringError> {
    let tournament_path = dataset_dir.join("numerai_tournament_data.csv");
    let mut reader = csv::Reader::from_path(&tournament_path)?;
    let headers = reader.headers()?.clone();
    let id_idx = headers
        .iter()
        .position(|h| h == "id")
        .ok_or(ClusteringError::MissingColumn("id"))?;
    let type_idx = headers
        .iter()
        .position(|h| h == "data_type")
        .ok_or(ClusteringError::MissingColumn("data_type"))?;
    let target_idx = headers
        .iter()
        .position(|h| h == "target")
        .ok_or(ClusteringError::MissingColumn("target"))?;
    let era_idx = headers
        .iter()
        .position(|h| h == "era")
        .ok_or(ClusteringError::MissingColumn("era"))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.get(type_idx) != Some("validation") {
            continue;
        }
        let id = record.get(id_idx).unwrap_or_default().to_string();
        let era = record.get(era_idx).unwrap_or_default().to_string();
        let target: f64 = match record.get(target_idx).and_then(|s| s.parse().ok()) {
            Some(v) => v,
            None => continue,
        };
        rows.push(ValidationRow { id, era, target });
    }
    rows.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(rows)
}

/// Row counts of the tournament CSV's three partitions, read independently
/// of any cached [`crate::RoundFeatures`]. The round-restart detector
/// (§4.D) compares these against a memoized `RoundFeatures`'s partition
/// vector lengths *before* indexing into them, rather than catching an
/// out-of-range panic.
pub fn partition_id_counts(dataset_dir: &Path) -> Result<(usize, usize, usize), ClusteringError> {
    let tournament_path = dataset_dir.join("numerai_tournament_data.csv");
    let mut reader = csv::Reader::from_path(&tournament_path)?;
    let headers = reader.headers()?.clone();
    let type_idx = headers
        .iter()
        .position(|h| h == "data_type")
        .ok_or(ClusteringError::MissingColumn("data_type"))?;

    let (mut val, mut test, mut live) = (0usize, 0usize, 0usize);
    for record in reader.records() {
        let record = record?;
        match record.get(type_idx) {
            Some("validation") => val += 1,
            Some("test") => test += 1,
            Some("live") => live += 1,
            _ => {}
        }
    }
    Ok((val, test, live))
}

fn read_rows(path: &Path) -> Result<(Columns, Vec<Vec<String>>), ClusteringError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let columns = Columns {
        feature_indices: headers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.contains("feature"))
            .map(|(i, _)| i)
            .collect(),
        id_index: headers.iter().position(|h| h == "id"),
        data_type_index: headers.iter().position(|h| h == "data_type"),
    };
    if columns.feature_indices.is_empty() {
        return Err(ClusteringError::NoFeatureColumns);
    }
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tournament(dir: &Path) {
        let mut f = std::fs::File::create(dir.join("numerai_tournament_data.csv")).unwrap();
        writeln!(f, "id,era,data_type,feature1,target").unwrap();
        writeln!(f, "v1,era1,validation,0.1,1").unwrap();
        writeln!(f, "v2,era1,validation,0.2,0").unwrap();
        writeln!(f, "v3,era2,validation,0.3,1").unwrap();
        writeln!(f, "s1,era1,test,0.4,").unwrap();
        writeln!(f, "l1,era1,live,0.5,").unwrap();
    }

    #[test]
    fn load_validation_rows_keeps_only_validation_sorted_by_id() {
        let dir = tempfile::tempdir().unwrap();
        write_tournament(dir.path());
        let rows = load_validation_rows(dir.path()).unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["v1", "v2", "v3"]);
        assert_eq!(rows[0].era, "era1");
        assert_eq!(rows[2].target, 1.0);
    }

    #[test]
    fn partition_id_counts_matches_partition_sizes() {
        let dir = tempfile::tempdir().unwrap();
        write_tournament(dir.path());
        assert_eq!(partition_id_counts(dir.path()).unwrap(), (3, 1, 1));
    }
}
