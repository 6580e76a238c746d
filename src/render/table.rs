//! Grid tables for reStructuredText and pipe tables for Markdown.

use unicode_width::UnicodeWidthStr;

/// Width of every column: the widest line of any cell, headings included.
#[must_use]
pub fn compute_column_widths(headings: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = Vec::new();
    for row in std::iter::once(headings).chain(rows.iter().map(Vec::as_slice)) {
        if row.len() > widths.len() {
            widths.resize(row.len(), 0);
        }
        for (index, value) in row.iter().enumerate() {
            for line in value.lines() {
                widths[index] = widths[index].max(line.width());
            }
        }
    }
    widths
}

/// One logical row; multi-line cells spread over several physical lines.
fn push_row(lines: &mut Vec<String>, widths: &[usize], row: &[String], sep: char) {
    let mut physical: Vec<Vec<&str>> = vec![vec![""; widths.len()]];
    for (column, value) in row.iter().enumerate() {
        for (index, line) in value.lines().enumerate() {
            if index >= physical.len() {
                physical.push(vec![""; widths.len()]);
            }
            physical[index][column] = line;
        }
    }
    for cells in physical {
        let mut out = String::new();
        out.push(sep);
        for (column, cell) in cells.iter().enumerate() {
            out.push(' ');
            out.push_str(cell);
            out.push_str(&" ".repeat(1 + widths[column] - cell.width()));
            out.push(sep);
        }
        lines.push(out);
    }
}

fn push_rule(lines: &mut Vec<String>, widths: &[usize], edge: char, fill: char, corner: char) {
    let mut out = String::new();
    out.push(corner);
    for width in widths {
        out.push(edge);
        out.extend(std::iter::repeat(fill).take(*width));
        out.push(edge);
        out.push(corner);
    }
    lines.push(out);
}

/// reStructuredText grid table.
#[must_use]
pub fn render_rst_table(headings: &[String], rows: &[Vec<String>]) -> String {
    let widths = compute_column_widths(headings, rows);
    let mut lines = Vec::new();
    push_rule(&mut lines, &widths, '-', '-', '+');
    push_row(&mut lines, &widths, headings, '|');
    push_rule(&mut lines, &widths, '=', '=', '+');
    for row in rows {
        push_row(&mut lines, &widths, row, '|');
        push_rule(&mut lines, &widths, '-', '-', '+');
    }
    lines.join("\n")
}

/// Markdown pipe table. Pipes inside cells are escaped.
#[must_use]
pub fn render_md_table(headings: &[String], rows: &[Vec<String>]) -> String {
    let escape = |row: &[String]| -> Vec<String> {
        row.iter()
            .map(|cell| cell.replace('|', "\\|").replace('\n', " "))
            .collect()
    };
    let headings = escape(headings);
    let rows: Vec<Vec<String>> = rows.iter().map(|row| escape(row)).collect();

    let widths = compute_column_widths(&headings, &rows);
    let mut lines = Vec::new();
    push_row(&mut lines, &widths, &headings, '|');
    push_rule(&mut lines, &widths, ' ', '-', '|');
    for row in &rows {
        push_row(&mut lines, &widths, row, '|');
    }
    lines.join("\n")
}
