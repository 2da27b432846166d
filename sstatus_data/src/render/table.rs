use std::fmt;

use itertools::Itertools as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Column {
    label: String,
    align: Align,
}

/// Plain text table, columns as wide as their widest cell (or label), separated by ` | `.
/// A dashed rule goes under the header and after the last row.
///
/// ```text
/// GpuType | a100 | Total
/// ----------------------
/// Free    | 3    | 3
/// Used    | 1    | 1
/// ----------------------
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(self, label: impl Into<String>) -> Self {
        self.aligned_column(label, Align::Left)
    }

    pub fn aligned_column(mut self, label: impl Into<String>, align: Align) -> Self {
        self.columns.push(Column {
            label: label.into(),
            align,
        });
        self
    }

    /// Missing cells are left empty, extra ones are dropped.
    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row = cells.into_iter().map(Into::into).collect_vec();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                self.rows
                    .iter()
                    .map(|row| display_width(&row[i]))
                    .fold(display_width(&column.label), usize::max)
            })
            .collect_vec()
    }

    fn line<'a>(&self, cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
        cells
            .zip(widths)
            .zip(&self.columns)
            .map(|((cell, &width), column)| pad(cell, width, column.align))
            .join(" | ")
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        let header = self.line(self.columns.iter().map(|column| column.label.as_str()), &widths);
        let rule = "-".repeat(display_width(&header));

        writeln!(f, "{header}")?;
        writeln!(f, "{rule}")?;
        for row in &self.rows {
            writeln!(f, "{}", self.line(row.iter().map(String::as_str), &widths))?;
        }
        writeln!(f, "{rule}")
    }
}

/// Columns `text` takes up in a terminal. Emoji (the rank medals) are two columns wide.
pub fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| match c {
            '\u{1F300}'..='\u{1FAFF}' => 2,
            _ => 1,
        })
        .sum()
}

fn pad(cell: &str, width: usize, align: Align) -> String {
    let fill = " ".repeat(width.saturating_sub(display_width(cell)));
    match align {
        Align::Left => format!("{cell}{fill}"),
        Align::Right => format!("{fill}{cell}"),
    }
}

#[allow(non_snake_case)]
#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn Table__display__widths_from_cells_and_labels() {
        let mut table = Table::new().column("Name").aligned_column("#", Align::Right);
        table.row(["a", "1"]);
        table.row(["long name", "12"]);

        let expected = [
            "Name      |  #",
            "--------------",
            "a         |  1",
            "long name | 12",
            "--------------",
        ]
        .map(|line| format!("{line}\n"))
        .concat();
        assert_eq!(table.to_string(), expected);
    }

    #[test]
    fn Table__display__no_rows() {
        let table = Table::new().column("GpuType").column("Total");
        assert!(table.is_empty());
        assert_eq!(table.to_string(), "GpuType | Total\n---------------\n---------------\n");
    }

    #[test]
    fn Table__row__fills_missing_cells() {
        let mut table = Table::new().column("a").column("b").column("c");
        table.row(["1"]);
        table.row(["1", "2", "3", "4"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.to_string().lines().nth(2), Some("1 |   |  "));
        assert_eq!(table.to_string().lines().nth(3), Some("1 | 2 | 3"));
    }

    #[test]
    fn Table__display__medals_line_up() {
        let mut table = Table::new().aligned_column("#", Align::Right).column("User");
        table.row(["🥇", "alice"]);
        table.row(["4", "bob"]);
        let text = table.to_string();
        assert_eq!(text.lines().map(display_width).unique().count(), 1);
        assert_eq!(text.lines().nth(3), Some(" 4 | bob  "));
    }

    #[test]
    fn display_width__() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("🥇"), 2);
        assert_eq!(display_width("🥉 x"), 4);
        assert_eq!(display_width(""), 0);
    }
}
