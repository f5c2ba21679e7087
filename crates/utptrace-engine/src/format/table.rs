use crate::width::{display_width, fit_to_width};

/// Narrowest the flexible column may be squeezed to
pub const MIN_FLEX_WIDTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub align: Align,
}

impl Column {
    pub fn left(header: &str) -> Self {
        Self {
            header: header.to_string(),
            align: Align::Left,
        }
    }

    pub fn right(header: &str) -> Self {
        Self {
            header: header.to_string(),
            align: Align::Right,
        }
    }
}

/// A bordered table whose `flex` column absorbs the difference between the
/// natural width and the requested width.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
    footer: Option<Vec<String>>,
    flex: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>, flex: usize) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            footer: None,
            flex,
        }
    }

    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells.into_iter().map(|c| single_line(&c)).collect());
    }

    pub fn set_footer(&mut self, cells: Vec<String>) {
        self.footer = Some(cells.into_iter().map(|c| single_line(&c)).collect());
    }

    /// Column widths after fitting to `max_width`
    pub fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                self.rows
                    .iter()
                    .chain(self.footer.iter())
                    .filter_map(|row| row.get(index))
                    .map(|cell| display_width(cell))
                    .fold(display_width(&column.header), usize::max)
            })
            .collect();

        if self.flex >= widths.len() {
            return widths;
        }

        let natural = rendered_width(&widths);
        let current = widths[self.flex];
        widths[self.flex] = if natural < max_width {
            current + (max_width - natural)
        } else if natural > max_width {
            let floor = display_width(&self.columns[self.flex].header)
                .max(MIN_FLEX_WIDTH)
                .min(current);
            current.saturating_sub(natural - max_width).max(floor)
        } else {
            current
        };
        widths
    }

    pub fn render(&self, max_width: usize) -> Vec<String> {
        let widths = self.column_widths(max_width);
        let headers: Vec<String> = self.columns.iter().map(|c| c.header.clone()).collect();

        let mut lines = vec![border(&widths, '┌', '┬', '┐')];
        lines.push(self.row_line(&headers, &widths));
        lines.push(border(&widths, '├', '┼', '┤'));
        for row in &self.rows {
            lines.push(self.row_line(row, &widths));
        }
        if let Some(footer) = &self.footer {
            lines.push(border(&widths, '├', '┼', '┤'));
            lines.push(self.row_line(footer, &widths));
        }
        lines.push(border(&widths, '└', '┴', '┘'));
        lines
    }

    fn row_line(&self, cells: &[String], widths: &[usize]) -> String {
        let rendered: Vec<String> = widths
            .iter()
            .zip(&self.columns)
            .enumerate()
            .map(|(index, (width, column))| {
                let cell = cells.get(index).map(String::as_str).unwrap_or("");
                format!(" {} ", fit_to_width(cell, *width, column.align == Align::Right))
            })
            .collect();
        format!("│{}│", rendered.join("│"))
    }
}

/// Total columns of a table with the given content widths, borders included
pub fn rendered_width(widths: &[usize]) -> usize {
    widths.iter().sum::<usize>() + 3 * widths.len() + 1
}

fn border(widths: &[usize], left: char, middle: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}", left, segments.join(&middle.to_string()), right)
}

fn single_line(cell: &str) -> String {
    cell.replace(['\r', '\n', '\t'], " ")
}
