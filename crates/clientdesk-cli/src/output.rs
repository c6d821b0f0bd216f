use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Amounts and ids line up on the right.
fn is_numeric(cell: &str) -> bool {
    let trimmed = cell.trim_start_matches(['-', '$']);
    !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
}

fn pad(cell: &str, width: usize, right: bool) -> String {
    if right {
        format!("{cell:>width$}")
    } else {
        format!("{cell:width$}")
    }
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    for line in render_table(headers, &rows) {
        println!("{}", line.trim_end());
    }
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    // A column is right-aligned when every non-empty cell in it is numeric.
    let mut right: Vec<bool> = vec![true; headers.len()];
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(headers.len()) {
            widths[i] = widths[i].max(cell.chars().count());
            if !cell.is_empty() && !is_numeric(cell) {
                right[i] = false;
            }
        }
    }
    if rows.is_empty() {
        right.iter_mut().for_each(|r| *r = false);
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| pad(h, widths[i], right[i]))
        .collect();
    lines.push(header_row.join("  "));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    lines.push(sep.join("  "));

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                pad(cell, w, right.get(i).copied().unwrap_or(false))
            })
            .collect();
        lines.push(cells.join("  "));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_detection() {
        assert!(is_numeric("$2,324"));
        assert!(is_numeric("-$50"));
        assert!(is_numeric("12"));
        assert!(!is_numeric("Booking"));
        assert!(!is_numeric("$"));
    }

    #[test]
    fn money_column_right_aligned() {
        let rows = vec![
            vec!["Growth".to_string(), "$2,000".to_string()],
            vec!["Online booking".to_string(), "$300".to_string()],
        ];
        let lines = render_table(&["ITEM", "AMOUNT"], &rows);
        assert_eq!(lines[0], "ITEM            AMOUNT");
        assert_eq!(lines[2], "Growth          $2,000");
        assert_eq!(lines[3], "Online booking    $300");
    }
}
