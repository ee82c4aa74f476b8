use std::fmt::Write;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn opt_text(value: Option<&str>) -> Self {
        value.map_or(Self::Empty, |v| Self::Text(v.to_string()))
    }

    pub fn count(value: usize) -> Self {
        Self::Int(value as i64)
    }

    pub fn opt_float(value: Option<f64>) -> Self {
        value.map_or(Self::Empty, Self::Float)
    }

    #[cfg(test)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Text(v) => v.clone(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => format!("{v:.2}"),
            Self::Empty => String::new(),
        }
    }
}

/// Ordered report output: named columns and rows of cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<T, I, S>(title: T, columns: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` under the column called `name`.
    #[cfg(test)]
    pub fn cell(&self, row: usize, name: &str) -> Option<&Cell> {
        let index = self.column(name)?;
        self.rows.get(row)?.get(index)
    }
}

pub fn to_markdown(table: &Table) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## {}", table.title);
    let _ = writeln!(output);

    if table.is_empty() {
        let _ = writeln!(output, "No records found.");
        return output;
    }

    let _ = writeln!(output, "| {} |", table.columns.join(" | "));
    let _ = writeln!(
        output,
        "|{}",
        table.columns.iter().map(|_| "---|").collect::<String>()
    );
    for row in &table.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|c| c.render().replace('|', "\\|"))
            .collect();
        let _ = writeln!(output, "| {} |", cells.join(" | "));
    }

    output
}

pub fn to_csv(table: &Table) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(Cell::render))?;
    }
    let bytes = writer.into_inner()?;
    Ok(String::from_utf8(bytes)?)
}
