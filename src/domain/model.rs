use serde::{Deserialize, Serialize};
use std::fmt;

/// 上傳檔案中的單一儲存格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    /// Parses a raw CSV field. Blank fields become `Empty`, finite numbers become `Number`.
    pub fn from_field(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Cell::Number(n),
            _ => Cell::Text(trimmed.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Number(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The cell as a label string; integral numbers drop the trailing `.0`.
    pub fn label(&self) -> String {
        match self {
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Empty => String::new(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// 解析後的二維表格；第一列與第一欄保留給標籤
pub type RowMatrix = Vec<Vec<Cell>>;

/// A data point value: numeric when the cell parsed as a number, text otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    Number(f64),
    Text(String),
}

impl PointValue {
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Number(n) => Some(PointValue::Number(*n)),
            Cell::Text(s) => Some(PointValue::Text(s.clone())),
            Cell::Empty => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: String,
    pub y: PointValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityValues {
    pub id: usize,
    pub key: String,
    pub values: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    pub values: Vec<EntityValues>,
}

/// 映射後送往匯入 API 的資料結構
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportData {
    pub variables: Vec<Variable>,
}

impl ImportData {
    /// Distinct time labels across all variables, in first-seen order.
    pub fn time_labels(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.variables
            .iter()
            .flat_map(|v| v.values.iter())
            .flat_map(|e| e.values.iter())
            .filter(|p| seen.insert(p.x.clone()))
            .map(|p| p.x.clone())
            .collect()
    }

    /// Distinct entity keys across all variables, in first-seen order.
    pub fn entity_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.variables
            .iter()
            .flat_map(|v| v.values.iter())
            .filter(|e| seen.insert(e.key.clone()))
            .map(|e| e.key.clone())
            .collect()
    }

    pub fn point_count(&self) -> usize {
        self.variables
            .iter()
            .flat_map(|v| v.values.iter())
            .map(|e| e.values.len())
            .sum()
    }
}

/// A validated time label bucketed into its calendar period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeValue {
    pub d: String,
    pub l: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ed: Option<String>,
    pub td: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Normal,
    Transposed,
}

/// Extract 階段的輸出
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub file_name: String,
    pub raw_data: String,
    pub rows: RowMatrix,
    pub orientation: Orientation,
}

/// Transform 階段的輸出
#[derive(Debug, Clone)]
pub struct MappedImport {
    pub file_name: String,
    pub raw_data: String,
    pub data: ImportData,
    pub times: std::collections::HashMap<String, TimeValue>,
    pub unmatched_entities: Vec<String>,
}
