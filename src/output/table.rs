//! Plain text table rendering

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Alignment {
    Left,
    Right,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
}

impl Column {
    pub fn left(header: &str, min_width: usize) -> Self {
        Self {
            header: header.to_string(),
            alignment: Alignment::Left,
            min_width,
        }
    }

    pub fn right(header: &str, min_width: usize) -> Self {
        Self {
            header: header.to_string(),
            alignment: Alignment::Right,
            min_width,
        }
    }
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// Bordered table; columns grow to fit the widest cell
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<RowData>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: RowData) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .fold(column.min_width.max(column.header.chars().count()), usize::max)
            })
            .collect()
    }

    /// Render with header row and borders
    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let border = horizontal_border(&widths);
        let headers: Vec<String> = self.columns.iter().map(|c| c.header.clone()).collect();

        let mut lines = vec![border.clone(), self.render_row(&headers, &widths), border.clone()];
        for row in &self.rows {
            lines.push(self.render_row(row, &widths));
        }
        lines.push(border);
        lines.join("\n")
    }

    fn render_row(&self, data: &[String], widths: &[usize]) -> String {
        let mut row = String::from("|");
        for (idx, width) in widths.iter().enumerate() {
            let cell = data.get(idx).map(String::as_str).unwrap_or("");
            let alignment = self.columns[idx].alignment;
            row.push(' ');
            row.push_str(&align_text(cell, *width, alignment));
            row.push_str(" |");
        }
        row
    }
}

fn horizontal_border(widths: &[usize]) -> String {
    let mut border = String::from("+");
    for width in widths {
        border.push_str(&"-".repeat(width + 2));
        border.push('+');
    }
    border
}

/// Pad text to `width` characters
fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.to_string();
    }

    let padding = " ".repeat(width - len);
    match alignment {
        Alignment::Left => format!("{}{}", text, padding),
        Alignment::Right => format!("{}{}", padding, text),
    }
}
