use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, Table, TableComponent};

use crate::utils::truncation::truncate_chars;

/// Line budget for one table block, footer included.
pub const MAX_TABLE_LINES: usize = 34;
/// Longer names (SKU descriptions mostly) are cut to this many characters.
pub const MAX_NAME_CHARS: usize = 45;
/// Data rows that fit in a table without a footer.
pub const MAX_DATA_ROWS: usize = MAX_TABLE_LINES - 2;

/// Cost table meant for a monospace code block.
///
/// The first column is left-aligned, the rest right-aligned. When there are
/// more rows than fit in the line budget, trailing rows are dropped; the
/// footer is always kept.
#[derive(Debug, Clone)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    footer: Option<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            footer: None,
        }
    }

    pub fn row(&mut self, mut cells: Vec<String>) {
        if let Some(name) = cells.first_mut() {
            let cut = truncate_chars(name, MAX_NAME_CHARS).len();
            name.truncate(cut);
        }
        self.rows.push(cells);
    }

    pub fn footer(&mut self, cells: Vec<String>) {
        self.footer = Some(cells);
    }

    /// Number of data rows that fit in the line budget.
    pub fn data_capacity(&self) -> usize {
        match self.footer {
            Some(_) => MAX_DATA_ROWS - 2,
            None => MAX_DATA_ROWS,
        }
    }

    pub fn render(&self) -> String {
        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_style(TableComponent::HeaderLines, '-');
        table.set_header(self.headers.iter().map(Cell::new));

        for cells in self.rows.iter().take(self.data_capacity()) {
            table.add_row(cells.iter().map(Cell::new));
        }
        if let Some(footer) = &self.footer {
            table.add_row(footer.iter().map(Cell::new));
        }

        for (i, column) in table.column_iter_mut().enumerate() {
            column.set_padding((0, 2));
            if i > 0 {
                column.set_cell_alignment(CellAlignment::Right);
            }
        }

        let rendered = table.to_string();
        let mut lines: Vec<String> = rendered.lines().map(|l| l.trim_end().to_string()).collect();
        // Repeat the header rule above the footer row
        if self.footer.is_some() && lines.len() > 2 {
            let rule = lines[1].clone();
            lines.insert(lines.len() - 1, rule);
        }
        lines.join("\n")
    }
}
