use crate::config::Config;
use crate::constants::ORDERS_SENT_SENTINEL;
use crate::error::{LeadError, Result};
use crate::table::{Cell, Table};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// The fixed business rule, resolved against configured column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualifierRules {
    pub required_columns: Vec<String>,
    pub status_column: String,
    pub orders_sent_column: String,
    pub dedup_column: String,
    pub qualifying_status: String,
}

impl QualifierRules {
    pub fn from_config(config: &Config) -> Self {
        let mut required_columns: Vec<String> =
            config.columns.required().iter().map(|c| c.to_string()).collect();
        let dedup = config.dedup_column().to_string();
        if !required_columns.contains(&dedup) {
            required_columns.push(dedup.clone());
        }
        Self {
            required_columns,
            status_column: config.columns.status.clone(),
            orders_sent_column: config.columns.orders_sent.clone(),
            dedup_column: dedup,
            qualifying_status: config.qualifier.qualifying_status.clone(),
        }
    }
}

/// Reads the "orders sent" count. Anything that is not a number maps to -1,
/// which never qualifies.
pub fn coerce_orders_sent(cell: &Cell) -> f64 {
    let value = match cell {
        Cell::Int(i) => *i as f64,
        Cell::Float(f) => *f,
        Cell::Bool(b) => f64::from(u8::from(*b)),
        Cell::Text(s) => s.trim().parse::<f64>().unwrap_or(ORDERS_SENT_SENTINEL),
        Cell::Empty => ORDERS_SENT_SENTINEL,
    };
    if value.is_finite() {
        value
    } else {
        ORDERS_SENT_SENTINEL
    }
}

/// Selects first-time customers with a saved order.
///
/// A row qualifies when its status equals the qualifying status exactly and its
/// orders-sent count is zero. Among rows sharing a dedup value only the first is
/// kept. Output order follows input order.
#[derive(Debug, Clone)]
pub struct Qualifier {
    rules: QualifierRules,
}

impl Qualifier {
    pub fn new(rules: QualifierRules) -> Self {
        Self { rules }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(QualifierRules::from_config(config))
    }

    pub fn rules(&self) -> &QualifierRules {
        &self.rules
    }

    #[instrument(skip_all, fields(rows = table.len()))]
    pub fn qualify(&self, table: &Table) -> Result<Table> {
        let missing = table.missing_columns(self.rules.required_columns.iter().map(String::as_str));
        if !missing.is_empty() {
            return Err(LeadError::MissingColumns { missing });
        }

        let index = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| LeadError::MissingColumns { missing: vec![name.to_string()] })
        };
        let status_idx = index(&self.rules.status_column)?;
        let orders_idx = index(&self.rules.orders_sent_column)?;
        let dedup_idx = index(&self.rules.dedup_column)?;

        let mut coerced = table.clone();
        coerced.map_column(orders_idx, |cell| Cell::Float(coerce_orders_sent(cell)));

        let mut seen = HashSet::new();
        let qualified = coerced.filter_rows(|row| {
            let status_ok = row[status_idx].as_text() == Some(self.rules.qualifying_status.as_str());
            let orders_ok = matches!(row[orders_idx], Cell::Float(n) if n == 0.0);
            status_ok && orders_ok && seen.insert(row[dedup_idx].dedup_key())
        });

        debug!(qualified = qualified.len(), "Qualification finished");
        Ok(qualified)
    }
}
