use crate::error::{AppError, Result};
use crate::schema::{COLUMNS_TO_DROP, LABEL_COLUMN};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::Path;
use tracing::info;

/// Labeled training table: feature matrix, binary labels, and the ordered
/// column names the matrix was built from. Column order is fixed here and
/// reproduced exactly by every later pipeline stage.
#[derive(Debug, Clone)]
pub struct TrainingTable {
    pub features: Array2<f64>,
    pub labels: Vec<u8>,
    pub columns: Vec<String>,
}

impl TrainingTable {
    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&y| y == 1).count()
    }

    pub fn negative_count(&self) -> usize {
        self.labels.len() - self.positive_count()
    }

    /// Stratified train/test split with a fixed seed.
    ///
    /// Each class is shuffled and split independently so the held-out set
    /// preserves the label ratio. Both classes must be present.
    pub fn stratified_split(&self, test_size: f64, seed: u64) -> Result<(TrainingTable, TrainingTable)> {
        if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
            return Err(AppError::Data(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }

        let mut pos: Vec<usize> = Vec::new();
        let mut neg: Vec<usize> = Vec::new();
        for (i, &y) in self.labels.iter().enumerate() {
            if y == 1 {
                pos.push(i);
            } else {
                neg.push(i);
            }
        }
        if pos.is_empty() || neg.is_empty() {
            return Err(AppError::Data(
                "stratified split requires both classes in the training table".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        pos.shuffle(&mut rng);
        neg.shuffle(&mut rng);

        let take = |n: usize| -> usize {
            let raw = (n as f64 * test_size).round() as usize;
            raw.clamp(1, n.saturating_sub(1).max(1))
        };
        let (test_pos, train_pos) = pos.split_at(take(pos.len()));
        let (test_neg, train_neg) = neg.split_at(take(neg.len()));

        let mut train_idx: Vec<usize> = train_pos.iter().chain(train_neg.iter()).copied().collect();
        let mut test_idx: Vec<usize> = test_pos.iter().chain(test_neg.iter()).copied().collect();
        train_idx.sort_unstable();
        test_idx.sort_unstable();

        Ok((self.subset(&train_idx), self.subset(&test_idx)))
    }

    fn subset(&self, indices: &[usize]) -> TrainingTable {
        TrainingTable {
            features: self.features.select(Axis(0), indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            columns: self.columns.clone(),
        }
    }
}

/// Load the training CSV, dropping identifier/leakage columns and
/// extracting the binary label vector.
///
/// Columns in the drop list are removed when present and ignored when
/// absent; a missing label column is a data error.
pub fn load_training_table<P: AsRef<Path>>(path: P) -> Result<TrainingTable> {
    let path = path.as_ref();
    info!("loading training table from {}", path.display());

    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let label_idx = headers
        .iter()
        .position(|h| h == LABEL_COLUMN)
        .ok_or_else(|| {
            AppError::Data(format!(
                "label column '{}' not found in {}",
                LABEL_COLUMN,
                path.display()
            ))
        })?;

    let mut keep: Vec<(usize, String)> = Vec::new();
    let mut dropped: Vec<&str> = Vec::new();
    for (i, name) in headers.iter().enumerate() {
        if i == label_idx {
            continue;
        }
        if COLUMNS_TO_DROP.contains(&name) {
            dropped.push(name);
            continue;
        }
        keep.push((i, name.to_string()));
    }
    if !dropped.is_empty() {
        info!("dropped non-feature columns: {:?}", dropped);
    }
    if keep.is_empty() {
        return Err(AppError::Data(format!(
            "no feature columns remain in {}",
            path.display()
        )));
    }

    let mut rows: Vec<f64> = Vec::new();
    let mut labels: Vec<u8> = Vec::new();
    for (row_no, record) in reader.records().enumerate() {
        let record = record?;

        let label_raw = record.get(label_idx).unwrap_or("").trim();
        let label: f64 = label_raw.parse().map_err(|_| {
            AppError::Data(format!(
                "row {}: label '{}' is not numeric",
                row_no + 1,
                label_raw
            ))
        })?;
        labels.push(if label != 0.0 { 1 } else { 0 });

        for (col_idx, name) in &keep {
            let raw = record.get(*col_idx).unwrap_or("").trim();
            let value: f64 = raw.parse().map_err(|_| {
                AppError::Data(format!(
                    "row {}: column '{}' value '{}' is not numeric",
                    row_no + 1,
                    name,
                    raw
                ))
            })?;
            rows.push(value);
        }
    }

    let n_samples = labels.len();
    if n_samples == 0 {
        return Err(AppError::Data(format!("{} contains no rows", path.display())));
    }

    let columns: Vec<String> = keep.into_iter().map(|(_, name)| name).collect();
    let features = Array2::from_shape_vec((n_samples, columns.len()), rows)
        .map_err(|e| AppError::Internal(format!("failed to shape feature matrix: {}", e)))?;

    info!(
        "loaded {} rows, {} feature columns",
        n_samples,
        columns.len()
    );

    Ok(TrainingTable {
        features,
        labels,
        columns,
    })
}
