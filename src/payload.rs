use crate::config::PayloadConfig;
use crate::error::{LeadError, Result};
use crate::table::Table;
use serde_json::{Map, Value};

/// One qualified row, reshaped into the field names the webhook expects.
pub type PayloadItem = Map<String, Value>;

/// Projects qualified rows onto the configured payload fields.
///
/// With no fields configured every column is sent under its report header.
/// Missing values are sent as `""` so the body always serializes.
pub fn build_payload(table: &Table, config: &PayloadConfig) -> Result<Vec<PayloadItem>> {
    let projection: Vec<(usize, &str)> = if config.fields.is_empty() {
        table.headers().iter().enumerate().map(|(i, h)| (i, h.as_str())).collect()
    } else {
        let missing = table.missing_columns(config.fields.iter().map(|f| f.column.as_str()));
        if !missing.is_empty() {
            return Err(LeadError::MissingColumns { missing });
        }
        config
            .fields
            .iter()
            .filter_map(|f| table.column_index(&f.column).map(|i| (i, f.field.as_str())))
            .collect()
    };

    let items = table
        .rows()
        .iter()
        .map(|row| {
            projection
                .iter()
                .map(|(idx, field)| (field.to_string(), row[*idx].to_json()))
                .collect()
        })
        .collect();
    Ok(items)
}
