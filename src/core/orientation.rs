use crate::core::time_domain::is_time_label;
use crate::domain::model::{Cell, Orientation, RowMatrix};
use serde::{Deserialize, Serialize};

/// 方向設定：自動偵測或強制指定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationMode {
    #[default]
    Auto,
    Normal,
    Transposed,
}

/// Detects whether time runs along the header row.
///
/// The matrix is in normal orientation when its first row's second cell is numeric,
/// or is a text label recognized by one of the time domains (e.g. `1990s`).
pub fn detect_orientation(rows: &RowMatrix) -> Orientation {
    let probe = rows.first().and_then(|row| row.get(1));
    match probe {
        Some(Cell::Number(_)) => Orientation::Normal,
        Some(Cell::Text(label)) if is_time_label(label) => Orientation::Normal,
        _ => Orientation::Transposed,
    }
}

pub fn transpose(rows: RowMatrix) -> RowMatrix {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut columns: RowMatrix = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();

    for row in rows {
        let len = row.len();
        for (index, cell) in row.into_iter().enumerate() {
            columns[index].push(cell);
        }
        for column in columns.iter_mut().skip(len) {
            column.push(Cell::Empty);
        }
    }

    columns
}

/// Brings the matrix into normal orientation, returning the orientation it was found in.
pub fn normalize(rows: RowMatrix, mode: OrientationMode) -> (RowMatrix, Orientation) {
    let orientation = match mode {
        OrientationMode::Auto => detect_orientation(&rows),
        OrientationMode::Normal => Orientation::Normal,
        OrientationMode::Transposed => Orientation::Transposed,
    };

    match orientation {
        Orientation::Normal => (rows, orientation),
        Orientation::Transposed => {
            tracing::info!("🔄 Time runs down the first column, transposing input");
            (transpose(rows), orientation)
        }
    }
}
