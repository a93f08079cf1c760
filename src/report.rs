use crate::table::Table;
use serde::Serialize;

/// Counts shown to the operator after a file is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_rows: usize,
    pub qualified_rows: usize,
}

/// Renders up to `limit` rows of the named columns as an aligned text table.
/// Columns the table does not have are skipped.
pub fn render_preview(table: &Table, columns: &[&str], limit: usize) -> String {
    let selected: Vec<(&str, Vec<String>)> = columns
        .iter()
        .filter_map(|name| {
            let cells = table.column(name)?;
            Some((*name, cells.take(limit).map(|c| c.to_string()).collect()))
        })
        .collect();

    let widths: Vec<usize> = selected
        .iter()
        .map(|(name, values)| {
            values.iter().map(|v| v.chars().count()).fold(name.chars().count(), usize::max)
        })
        .collect();

    let mut out = String::new();
    let header: Vec<String> = selected.iter().map(|(n, _)| n.to_string()).collect();
    push_line(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, &rule, &widths);
    for i in 0..table.len().min(limit) {
        let row: Vec<String> = selected.iter().map(|(_, values)| values[i].clone()).collect();
        push_line(&mut out, &row, &widths);
    }
    if table.len() > limit {
        out.push_str(&format!("... {} more row(s)\n", table.len() - limit));
    }
    out
}

fn push_line(out: &mut String, values: &[String], widths: &[usize]) {
    let cells: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(v, w)| format!("{:<width$}", v, width = *w))
        .collect();
    out.push_str(cells.join(" | ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    #[test]
    fn renders_selected_columns_and_truncates() {
        let table = Table::new(
            vec!["Cliente".into(), "Status".into(), "Valor Total".into()],
            vec![
                vec![Cell::Text("Ana".into()), Cell::Text("x".into()), Cell::Float(10.5)],
                vec![Cell::Text("Bruno".into()), Cell::Text("y".into()), Cell::Int(7)],
            ],
        );
        let out = render_preview(&table, &["Cliente", "Valor Total", "Email"], 1);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Cliente | Valor Total");
        assert_eq!(lines[1], "------- | -----------");
        assert_eq!(lines[2], "Ana     | 10.5");
        assert_eq!(lines[3], "... 1 more row(s)");
    }
}
