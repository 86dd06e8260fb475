//! Populate-script generation.
//!
//! [`ScriptGenerator`] walks the configured sources in load order and writes
//! one script: `BEGIN TRANSACTION;`, a `-- Populating <table>` block of
//! `INSERT` statements per source, then `COMMIT;`.
//!
//! Every per-file problem (missing file, missing schema, empty file, unknown
//! header column, unreadable or undecodable content) is logged and skips only
//! that file. A table's statements are staged in memory and written once the
//! whole file has been read, so a skipped file never contributes a partial
//! block. Only failures on the output itself abort the run.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use itertools::Itertools;
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::{
    config::Config,
    format::{Literal, classify_value, quote_identifier},
    io_utils,
    plan::{SourceEntry, TableNaming},
    schema::{ColumnType, TableSchema},
};

pub const BEGIN_TRANSACTION: &str = "BEGIN TRANSACTION;";
pub const COMMIT: &str = "COMMIT;";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationMode {
    /// Validate headers against the schema and format by declared type.
    #[default]
    SchemaAware,
    /// No schema: values that parse as numbers are emitted bare.
    Untyped,
}

impl GenerationMode {
    /// Schema lookups are case-insensitive, so schema-aware tables are
    /// lower-cased; untyped tables keep the file's spelling.
    pub fn table_naming(self) -> TableNaming {
        match self {
            GenerationMode::SchemaAware => TableNaming::FoldCase,
            GenerationMode::Untyped => TableNaming::Preserve,
        }
    }
}

#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("source file {path:?} not found")]
    NotFound { path: PathBuf },
    #[error("no schema defined for table '{table}'")]
    SchemaMissing { table: String },
    #[error("{path:?} is empty")]
    Empty { path: PathBuf },
    #[error("column '{column}' in {path:?} is not defined for table '{table}'")]
    UnknownColumn {
        path: PathBuf,
        table: String,
        column: String,
    },
    #[error("{0:#}")]
    Failed(anyhow::Error),
}

impl SkipReason {
    fn log(&self, file: &str) {
        match self {
            SkipReason::NotFound { .. }
            | SkipReason::SchemaMissing { .. }
            | SkipReason::Empty { .. } => warn!("Skipping {file}: {self}"),
            SkipReason::UnknownColumn { .. } => {
                error!("Skipping {file}: {self}; no rows inserted")
            }
            SkipReason::Failed(_) => error!("Error processing {file}: {self}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    /// INSERT statements emitted.
    pub rows: usize,
    pub blank_rows: usize,
    /// Rows dropped because their cell count differs from the header.
    pub skipped_rows: usize,
    pub type_mismatches: usize,
}

#[derive(Debug)]
pub struct TableReport {
    pub file: String,
    pub table: String,
    pub outcome: Result<TableStats, SkipReason>,
}

impl TableReport {
    pub fn is_populated(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn stats(&self) -> Option<&TableStats> {
        self.outcome.as_ref().ok()
    }
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    pub tables: Vec<TableReport>,
}

impl GenerationReport {
    pub fn table(&self, table: &str) -> Option<&TableReport> {
        self.tables.iter().find(|report| report.table == table)
    }

    pub fn populated(&self) -> usize {
        self.tables.iter().filter(|report| report.is_populated()).count()
    }

    pub fn skipped(&self) -> usize {
        self.tables.len() - self.populated()
    }

    pub fn total_rows(&self) -> usize {
        self.tables
            .iter()
            .filter_map(TableReport::stats)
            .map(|stats| stats.rows)
            .sum()
    }
}

struct RenderedTable {
    sql: String,
    stats: TableStats,
}

pub struct ScriptGenerator {
    config: Config,
    mode: GenerationMode,
    encoding: &'static Encoding,
}

impl ScriptGenerator {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            mode: GenerationMode::default(),
            encoding: UTF_8,
        }
    }

    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Writes the script to `output`, or stdout when `output` is `-`.
    ///
    /// The load order is checked before the output is created.
    pub fn generate_to_path(&self, input_dir: &Path, output: &Path) -> Result<GenerationReport> {
        self.config.validate(self.mode.table_naming())?;
        let mut writer = io_utils::open_output_writer(output)?;
        self.generate(input_dir, &mut writer)
            .with_context(|| format!("Writing populate script to {output:?}"))
    }

    pub fn generate<W>(&self, input_dir: &Path, writer: &mut W) -> Result<GenerationReport>
    where
        W: Write + ?Sized,
    {
        let order = self.config.sources.ordered(self.mode.table_naming())?;
        let mut report = GenerationReport::default();

        writeln!(writer, "{BEGIN_TRANSACTION}\n")?;
        for source in order {
            let (table_report, rendered) = self.process_source(input_dir, source);
            if let Some(rendered) = rendered {
                writer.write_all(rendered.sql.as_bytes())?;
            }
            report.tables.push(table_report);
        }
        writeln!(writer, "{COMMIT}")?;
        writer.flush()?;
        Ok(report)
    }

    fn table_name(&self, source: &SourceEntry) -> String {
        let stem = source.table_stem().unwrap_or(&source.file);
        self.mode.table_naming().table_name(stem)
    }

    fn process_source(
        &self,
        input_dir: &Path,
        source: &SourceEntry,
    ) -> (TableReport, Option<RenderedTable>) {
        let table = self.table_name(source);
        let path = input_dir.join(&source.file);
        let result = self.render_source(&path, &table);
        let (outcome, rendered) = match result {
            Ok(rendered) => {
                info!(
                    "Populated {table} from {}: {} row(s)",
                    source.file, rendered.stats.rows
                );
                (Ok(rendered.stats), Some(rendered))
            }
            Err(reason) => {
                reason.log(&source.file);
                (Err(reason), None)
            }
        };
        let report = TableReport {
            file: source.file.clone(),
            table,
            outcome,
        };
        (report, rendered)
    }

    fn render_source(&self, path: &Path, table: &str) -> Result<RenderedTable, SkipReason> {
        if !path.exists() {
            return Err(SkipReason::NotFound {
                path: path.to_path_buf(),
            });
        }
        let schema = match self.mode {
            GenerationMode::SchemaAware => {
                Some(
                    self.config
                        .tables
                        .get(table)
                        .ok_or_else(|| SkipReason::SchemaMissing {
                            table: table.to_string(),
                        })?,
                )
            }
            GenerationMode::Untyped => None,
        };
        info!("Processing {path:?} -> {table} table...");
        self.render_table(path, table, schema)
    }

    fn render_table(
        &self,
        path: &Path,
        table: &str,
        schema: Option<&TableSchema>,
    ) -> Result<RenderedTable, SkipReason> {
        use std::fmt::Write as _;

        let mut reader = io_utils::open_csv_reader_from_path(path).map_err(SkipReason::Failed)?;
        let headers = io_utils::reader_headers(&mut reader, self.encoding)
            .with_context(|| format!("Reading headers from {path:?}"))
            .map_err(SkipReason::Failed)?
            .ok_or_else(|| SkipReason::Empty {
                path: path.to_path_buf(),
            })?;

        let types: Vec<Option<ColumnType>> = match schema {
            Some(schema) => schema
                .resolve_headers(&headers)
                .map_err(|column| SkipReason::UnknownColumn {
                    path: path.to_path_buf(),
                    table: table.to_string(),
                    column: column.to_string(),
                })?
                .into_iter()
                .map(Some)
                .collect(),
            None => vec![None; headers.len()],
        };
        debug!(
            "Column types for {table}: {}",
            headers
                .iter()
                .zip(&types)
                .map(|(name, ty)| match ty {
                    Some(ty) => format!("{name}:{ty}"),
                    None => format!("{name}:untyped"),
                })
                .join(", ")
        );

        let columns = headers.iter().map(|name| quote_identifier(name)).join(", ");
        let mut stats = TableStats::default();
        let mut sql = format!("-- Populating {table}\n");

        for (row_idx, record) in reader.byte_records().enumerate() {
            let line = row_idx + 2;
            let record = record
                .with_context(|| format!("Reading row {line} in {path:?}"))
                .map_err(SkipReason::Failed)?;
            let cells = io_utils::decode_record(&record, self.encoding)
                .with_context(|| format!("Decoding row {line} in {path:?}"))
                .map_err(SkipReason::Failed)?;

            if cells.iter().all(|cell| cell.is_empty()) {
                stats.blank_rows += 1;
                continue;
            }
            if cells.len() != headers.len() {
                warn!(
                    "Skipping row {line} in {path:?}: expected {} column(s) but found {}",
                    headers.len(),
                    cells.len()
                );
                stats.skipped_rows += 1;
                continue;
            }

            let values = cells
                .iter()
                .zip(&types)
                .zip(&headers)
                .map(|((cell, expected), header)| {
                    classify_value(Some(cell.as_str()), *expected).unwrap_or_else(|mismatch| {
                        warn!(
                            "Row {line} in {path:?}, column '{header}': {mismatch}; inserting NULL"
                        );
                        stats.type_mismatches += 1;
                        Literal::Null
                    })
                })
                .join(", ");
            let _ = writeln!(sql, "INSERT INTO {table} ({columns}) VALUES ({values});");
            stats.rows += 1;
        }
        sql.push('\n');

        Ok(RenderedTable { sql, stats })
    }
}
