use crate::api::models::{Entity, FieldErrors};
use crate::utils::text::{single_line, truncate_text_unicode};
use chrono::{DateTime, Local, NaiveDateTime};
use comfy_table::{Attribute, Cell, Color, Table, presets};
use crossterm::terminal;
use serde_json::Value;

/// Columns shown before every other field, when present.
const LEADING_COLUMNS: &[&str] = &["id"];

/// Formatter for entity lists and records
pub struct TableDisplay {
    max_width: Option<usize>,
    use_colors: bool,
    cell_width: usize,
}

impl TableDisplay {
    pub fn new() -> Self {
        Self {
            max_width: Self::detect_terminal_width(),
            use_colors: true,
            cell_width: 40,
        }
    }

    /// Detect terminal width, clamped to a readable range
    fn detect_terminal_width() -> Option<usize> {
        match terminal::size() {
            Ok((cols, _rows)) => Some((cols as usize).clamp(40, 200)),
            Err(_) => Some(80),
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Maximum display width of a single cell
    pub fn with_cell_width(mut self, width: usize) -> Self {
        self.cell_width = width.max(4);
        self
    }

    /// Column order for a set of rows: `id` first, then fields in the order
    /// they first appear. Nested collections are left out.
    pub fn columns(rows: &[Entity]) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for leading in LEADING_COLUMNS {
            if rows.iter().any(|row| row.contains_key(*leading)) {
                columns.push(leading.to_string());
            }
        }
        for row in rows {
            for (key, value) in row {
                if value.is_array() || columns.iter().any(|c| c == key) {
                    continue;
                }
                columns.push(key.clone());
            }
        }
        columns
    }

    /// Render entities as a table
    pub fn render_entities(&self, rows: &[Entity]) -> String {
        if rows.is_empty() {
            return "No records found".to_string();
        }

        let columns = Self::columns(rows);
        let mut table = self.new_table();

        table.set_header(
            columns
                .iter()
                .map(|name| self.header_cell(name))
                .collect::<Vec<_>>(),
        );

        for row in rows {
            let cells: Vec<Cell> = columns
                .iter()
                .map(|column| {
                    let text = row
                        .get(column)
                        .map(|value| format_cell(column, value))
                        .unwrap_or_else(|| "-".to_string());
                    Cell::new(truncate_text_unicode(&text, self.cell_width))
                })
                .collect();
            table.add_row(cells);
        }

        table.to_string()
    }

    /// Render a single entity as a two-column field/value table
    pub fn render_record(&self, entity: &Entity) -> String {
        let mut table = self.new_table();
        table.set_header(vec![self.header_cell("field"), self.header_cell("value")]);

        for column in Self::columns(std::slice::from_ref(entity)) {
            if let Some(value) = entity.get(&column) {
                table.add_row(vec![Cell::new(&column), Cell::new(format_cell(&column, value))]);
            }
        }
        table.to_string()
    }

    /// Render server-side validation messages, one line per message
    pub fn render_field_errors(&self, errors: &FieldErrors) -> String {
        let mut table = self.new_table();
        table.set_header(vec![self.header_cell("field"), self.header_cell("error")]);

        for (field, messages) in errors.fields() {
            for message in messages {
                let field_cell = if self.use_colors {
                    Cell::new(field).fg(Color::Red)
                } else {
                    Cell::new(field)
                };
                table.add_row(vec![field_cell, Cell::new(message)]);
            }
        }
        table.to_string()
    }

    fn new_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
        self.configure_table_width(&mut table);
        table
    }

    fn header_cell(&self, name: &str) -> Cell {
        if self.use_colors {
            Cell::new(name)
                .add_attribute(Attribute::Bold)
                .fg(Color::Cyan)
        } else {
            Cell::new(name)
        }
    }

    /// Set table width to match the terminal size
    fn configure_table_width(&self, table: &mut Table) {
        let width = match self.max_width {
            // borders and padding
            Some(w) if w > 20 => w - 6,
            Some(w) => w.max(40),
            None => 80,
        };
        table.set_width(width as u16);
    }
}

impl Default for TableDisplay {
    fn default() -> Self {
        Self::new()
    }
}

/// Text for one cell. Timestamps are shown in local time, nested objects by
/// their `name` (or first scalar field) and collections by their size.
pub fn format_cell(column: &str, value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) if column.ends_with("_at") => format_timestamp(s),
        Value::String(s) => single_line(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => (if *b { "yes" } else { "no" }).to_string(),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(fields) => fields
            .get("name")
            .or_else(|| fields.values().find(|v| v.is_string() || v.is_number()))
            .map(|v| format_cell("", v))
            .unwrap_or_else(|| "{}".to_string()),
    }
}

fn format_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(value: Value) -> Entity {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_columns_put_id_first_and_skip_collections() {
        let rows = vec![
            entity(json!({"name": "Widget", "id": 1, "tags": ["a"]})),
            entity(json!({"id": 2, "stock": 5})),
        ];
        assert_eq!(TableDisplay::columns(&rows), vec!["id", "name", "stock"]);
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell("discount", &Value::Null), "-");
        assert_eq!(format_cell("active", &json!(true)), "yes");
        assert_eq!(format_cell("note", &json!("two\nlines")), "two lines");
        assert_eq!(
            format_cell("customer", &json!({"id": 4, "name": "Acme"})),
            "Acme"
        );
        assert_eq!(
            format_cell("phone", &json!({"phone_number": "555-0100"})),
            "555-0100"
        );
        assert_eq!(
            format_cell("updated_at", &json!("2024-03-01 10:20:30")),
            "2024-03-01 10:20"
        );
        assert_eq!(format_cell("created_at", &json!("yesterday")), "yesterday");
    }

    #[test]
    fn test_render_entities() {
        let display = TableDisplay::new().with_colors(false).with_max_width(120);
        let rows = vec![entity(json!({"id": 7, "name": "倉庫管理システム"}))];
        let output = display.render_entities(&rows);
        assert!(output.contains("id"));
        assert!(output.contains("倉庫管理システム"));
        assert_eq!(display.render_entities(&[]), "No records found");
    }

    #[test]
    fn test_render_field_errors() {
        let display = TableDisplay::new().with_colors(false);
        let mut errors = FieldErrors::default();
        errors.push("email", "The email has already been taken.");
        let output = display.render_field_errors(&errors);
        assert!(output.contains("email"));
        assert!(output.contains("already been taken"));
    }
}
