//! Box-drawn text tables
//!
//! Every row is separated by a rule, cells are left-aligned and padded by
//! one space on each side. Short rows are padded with empty cells.

pub fn render(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&rule(&widths, '╔', '═', '╤', '╗'));

    for (index, row) in rows.iter().enumerate() {
        if index > 0 {
            out.push_str(&rule(&widths, '╟', '─', '┼', '╢'));
        }

        out.push('║');
        for (i, width) in widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            let padding = width - cell.chars().count();
            out.push(' ');
            out.push_str(cell);
            out.push_str(&" ".repeat(padding + 1));
            out.push(if i + 1 == columns { '║' } else { '│' });
        }
        out.push('\n');
    }

    out.push_str(&rule(&widths, '╚', '═', '╧', '╝'));
    out
}

fn rule(widths: &[usize], left: char, fill: char, join: char, right: char) -> String {
    let segments: Vec<String> = widths
        .iter()
        .map(|w| fill.to_string().repeat(w + 2))
        .collect();
    format!("{}{}{}\n", left, segments.join(&join.to_string()), right)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_render_grid() {
        let rendered = render(&[row(&["Category", "Amount"]), row(&["Net", "$1.00"])]);
        let expected = "\
╔══════════╤════════╗
║ Category │ Amount ║
╟──────────┼────────╢
║ Net      │ $1.00  ║
╚══════════╧════════╝
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let rendered = render(&[row(&["a", "b"]), row(&["c"])]);
        assert!(rendered.contains("║ c │   ║"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render(&[]), "");
    }
}
