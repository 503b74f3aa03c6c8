use serde::{Deserialize, Serialize};

/// One spreadsheet cell as read from the workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// String form used for row/column labels. Whole numbers print without
    /// a fractional part so a plate column `1.0` becomes `"1"`.
    pub fn label(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A single worksheet with its first column taken as the row index and its
/// first row as the column header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSheet {
    pub name: String,
    /// Header cells, excluding the index header.
    pub columns: Vec<Cell>,
    /// Index cell for each data row.
    pub index: Vec<Cell>,
    /// Data cells, `rows[i].len() == columns.len()`.
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    /// Build a sheet from the full cell grid. The first row is the header,
    /// the first cell of every row is its index label; fully blank rows are
    /// skipped and short rows are padded with [`Cell::Empty`].
    pub fn from_grid(name: impl Into<String>, grid: Vec<Vec<Cell>>) -> Self {
        let mut lines = grid
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()));
        let columns: Vec<Cell> = lines
            .next()
            .map(|header| header.into_iter().skip(1).collect())
            .unwrap_or_default();
        let width = columns.len();
        let mut index = Vec::new();
        let mut rows = Vec::new();
        for line in lines {
            let mut cells = line.into_iter();
            index.push(cells.next().unwrap_or(Cell::Empty));
            let mut row: Vec<Cell> = cells.take(width).collect();
            row.resize(width, Cell::Empty);
            rows.push(row);
        }
        Self {
            name: name.into(),
            columns,
            index,
            rows,
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }
}

/// All sheets of one uploaded workbook, in workbook order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetMap {
    sheets: Vec<RawSheet>,
}

impl SheetMap {
    pub fn new(sheets: Vec<RawSheet>) -> Self {
        Self { sheets }
    }

    pub fn get(&self, name: &str) -> Option<&RawSheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawSheet> {
        self.sheets.iter()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Numeric readings of one channel: `values[t][w]` is the reading of
/// `wells[w]` at `times[t]`. Missing readings are `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelTimeSeries {
    pub times: Vec<f64>,
    pub wells: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl ChannelTimeSeries {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Reading at `(time, well)`, or `None` when either key is absent.
    pub fn get(&self, time: f64, well: &str) -> Option<f64> {
        let t = self.times.iter().position(|&candidate| candidate == time)?;
        let w = self.wells.iter().position(|candidate| candidate == well)?;
        self.values.get(t).and_then(|row| row.get(w)).copied()
    }

    /// The first row whose time equals `time` exactly.
    pub fn row_at(&self, time: f64) -> Option<&[f64]> {
        let t = self.times.iter().position(|&candidate| candidate == time)?;
        self.values.get(t).map(Vec::as_slice)
    }
}

/// One (Time, Well, Value) observation joined with its plate metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TidyRow {
    #[serde(rename = "Time")]
    pub time: f64,
    #[serde(rename = "Well")]
    pub well: String,
    #[serde(rename = "Value")]
    pub value: f64,
    #[serde(rename = "Treatment")]
    pub treatment: String,
    #[serde(rename = "CellType")]
    pub cell_type: String,
}

/// Mean and sample standard deviation over all wells of one
/// (Time, Treatment, CellType) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRow {
    #[serde(rename = "Time")]
    pub time: f64,
    #[serde(rename = "Treatment")]
    pub treatment: String,
    #[serde(rename = "CellType")]
    pub cell_type: String,
    #[serde(rename = "MeanValue")]
    pub mean: f64,
    #[serde(rename = "StdValue")]
    pub std: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_uses_first_row_and_column_as_labels() {
        let sheet = RawSheet::from_grid(
            "phase",
            vec![
                vec!["Time".into(), "A1".into(), "A2".into()],
                vec![Cell::Number(0.0), "10,0".into()],
                vec![Cell::Empty, Cell::Empty, Cell::Empty],
                vec![Cell::Number(1.0), "15,0".into(), "25,0".into()],
            ],
        );
        assert_eq!(sheet.width(), 2);
        assert_eq!(sheet.height(), 2);
        assert_eq!(sheet.rows[0][1], Cell::Empty);
        assert_eq!(sheet.index[1], Cell::Number(1.0));
    }

    #[test]
    fn whole_numbers_label_without_fraction() {
        assert_eq!(Cell::Number(3.0).label(), "3");
        assert_eq!(Cell::Number(2.5).label(), "2.5");
        assert_eq!(Cell::Text("B".into()).label(), "B");
    }

    #[test]
    fn sheet_map_preserves_order() {
        let map = SheetMap::new(vec![
            RawSheet::from_grid("treatments", vec![]),
            RawSheet::from_grid("phase", vec![]),
        ]);
        assert_eq!(map.names(), vec!["treatments", "phase"]);
        assert!(map.contains("phase"));
        assert!(map.get("red").is_none());
    }
}
