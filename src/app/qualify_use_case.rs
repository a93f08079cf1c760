use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::error::{LeadError, Result};
use crate::ingest::{self, TableFormat};
use crate::memo::QualifierCache;
use crate::metrics::QualifierMetrics;
use crate::phone::normalize_phone_cell;
use crate::qualifier::Qualifier;
use crate::report::RunSummary;
use crate::table::{Cell, Table};

/// Result of running one uploaded report through the qualifier.
#[derive(Debug, Clone)]
pub struct QualifyOutcome {
    pub summary: RunSummary,
    pub qualified: Arc<Table>,
}

/// Use case for turning an uploaded report into the set of qualified leads
pub struct QualifyUseCase {
    config: Config,
    qualifier: Qualifier,
    cache: Arc<QualifierCache>,
}

impl QualifyUseCase {
    pub fn new(config: Config, cache: Arc<QualifierCache>) -> Self {
        let qualifier = Qualifier::from_config(&config);
        Self { config, qualifier, cache }
    }

    /// Create a use case with a cache matching `qualifier.cache` and
    /// `qualifier.cache_capacity` in the config
    pub fn from_config(config: Config) -> Self {
        let cache = if config.qualifier.cache {
            QualifierCache::with_capacity(config.qualifier.cache_capacity)
        } else {
            QualifierCache::disabled()
        };
        Self::new(config, Arc::new(cache))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run_path(&self, path: &Path) -> Result<QualifyOutcome> {
        let table = ingest::load_path(path, &self.config.input).map_err(Self::track_rejection)?;
        self.run_table(&table)
    }

    pub fn run_bytes(&self, bytes: &[u8], format: TableFormat) -> Result<QualifyOutcome> {
        let table = ingest::load_bytes(bytes, format, &self.config.input).map_err(Self::track_rejection)?;
        self.run_table(&table)
    }

    #[instrument(skip_all, fields(rows = table.len()))]
    pub fn run_table(&self, table: &Table) -> Result<QualifyOutcome> {
        let qualified = self.cache.qualify(&self.qualifier, table).map_err(Self::track_rejection)?;
        let qualified = if self.config.qualifier.normalize_phone {
            Arc::new(self.normalize_phones(&qualified))
        } else {
            qualified
        };

        let summary = RunSummary { total_rows: table.len(), qualified_rows: qualified.len() };
        QualifierMetrics::record_run(summary.total_rows, summary.qualified_rows);
        info!(total = summary.total_rows, qualified = summary.qualified_rows, "Report qualified");
        Ok(QualifyOutcome { summary, qualified })
    }

    fn normalize_phones(&self, table: &Table) -> Table {
        let mut normalized = table.clone();
        if let Some(idx) = normalized.column_index(&self.config.columns.phone) {
            normalized.map_column(idx, |cell| Cell::from_text(&normalize_phone_cell(cell)));
        }
        normalized
    }

    fn track_rejection(err: LeadError) -> LeadError {
        let reason = match &err {
            LeadError::MissingColumns { .. } => "missing_columns",
            LeadError::MalformedInput(_) | LeadError::Csv(_) => "malformed_input",
            _ => "other",
        };
        warn!(reason, error = %err, "Upload rejected");
        QualifierMetrics::record_rejected_upload(reason);
        err
    }
}
