//! Ordered list of source files and the tables they populate.
//!
//! Statements run in emission order inside one transaction, so parents have
//! to be populated before children. The built-in plan is the hand-maintained
//! order of the rental database. Plans loaded from configuration may also
//! declare `depends_on` edges; [`LoadPlan::ordered`] then performs a stable
//! topological sort that only moves a source when one of its prerequisites
//! would otherwise come later.

use std::{collections::HashMap, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const RENTAL_SOURCES: &[&str] = &[
    "address.csv",
    "batteries.csv",
    "battery_type.csv",
    "drone_model.csv",
    "drones.csv",
    "equip_model.csv",
    "equipment.csv",
    "mechanics.csv",
    "members.csv",
    "order_price.csv",
    "orders.csv",
    "rent.csv",
    "rentals.csv",
    "repair.csv",
    "reviews.csv",
    "transports.csv",
    "warehouse.csv",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Source '{file}' does not name a table")]
    InvalidFileName { file: String },
    #[error("Table '{table}' is listed more than once")]
    DuplicateTable { table: String },
    #[error("Table '{table}' depends on '{dependency}', which is not a listed source")]
    UnknownDependency { table: String, dependency: String },
    #[error("Dependency cycle between tables: {}", tables.join(", "))]
    Cycle { tables: Vec<String> },
}

/// How a file stem becomes a table name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableNaming {
    /// Lower-cased; `Members.csv` and `members.csv` name the same table.
    #[default]
    FoldCase,
    /// Kept as written; table names compare case-sensitively.
    Preserve,
}

impl TableNaming {
    pub fn table_name(self, stem: &str) -> String {
        match self {
            TableNaming::FoldCase => stem.to_lowercase(),
            TableNaming::Preserve => stem.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub file: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl SourceEntry {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn depends_on<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(tables.into_iter().map(Into::into));
        self
    }

    /// Base name of the file with its extension removed.
    pub fn table_stem(&self) -> Option<&str> {
        table_stem(&self.file)
    }
}

pub fn table_stem(file: &str) -> Option<&str> {
    Path::new(file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadPlan {
    pub sources: Vec<SourceEntry>,
}

impl LoadPlan {
    pub fn new(sources: Vec<SourceEntry>) -> Self {
        Self { sources }
    }

    pub fn from_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(files.into_iter().map(SourceEntry::new).collect())
    }

    pub fn rental() -> Self {
        Self::from_files(RENTAL_SOURCES.iter().copied())
    }

    /// Returns the sources in processing order.
    ///
    /// Among sources whose prerequisites are satisfied, the earliest declared
    /// one is emitted first, so a plan without edges keeps its declared order.
    /// Duplicate detection and `depends_on` lookups use the table names
    /// `naming` produces.
    pub fn ordered(&self, naming: TableNaming) -> Result<Vec<&SourceEntry>, PlanError> {
        let mut positions: HashMap<String, usize> = HashMap::with_capacity(self.sources.len());
        for (idx, source) in self.sources.iter().enumerate() {
            let stem = source
                .table_stem()
                .ok_or_else(|| PlanError::InvalidFileName {
                    file: source.file.clone(),
                })?;
            let table = naming.table_name(stem);
            if positions.insert(table.clone(), idx).is_some() {
                return Err(PlanError::DuplicateTable { table });
            }
        }

        let mut prerequisites: Vec<Vec<usize>> = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let mut deps = Vec::with_capacity(source.depends_on.len());
            for dependency in &source.depends_on {
                let key = naming.table_name(dependency.trim());
                let idx = positions
                    .get(&key)
                    .copied()
                    .ok_or_else(|| PlanError::UnknownDependency {
                        table: source.table_stem().unwrap_or(&source.file).to_string(),
                        dependency: dependency.clone(),
                    })?;
                deps.push(idx);
            }
            prerequisites.push(deps);
        }

        let mut emitted = vec![false; self.sources.len()];
        let mut order = Vec::with_capacity(self.sources.len());
        while order.len() < self.sources.len() {
            let next = (0..self.sources.len()).find(|&idx| {
                !emitted[idx] && prerequisites[idx].iter().all(|&dep| emitted[dep])
            });
            match next {
                Some(idx) => {
                    emitted[idx] = true;
                    order.push(&self.sources[idx]);
                }
                None => {
                    let tables = self
                        .sources
                        .iter()
                        .zip(&emitted)
                        .filter(|(_, done)| !**done)
                        .map(|(source, _)| source.table_stem().unwrap_or(&source.file).to_string())
                        .collect();
                    return Err(PlanError::Cycle { tables });
                }
            }
        }
        Ok(order)
    }
}
