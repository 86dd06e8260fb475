use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    plan::{LoadPlan, TableNaming},
    schema::SchemaCatalog,
};

/// Everything the generator needs besides the input directory: which files
/// to read, in what order, and the column types of each target table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub sources: LoadPlan,
    #[serde(default)]
    pub tables: SchemaCatalog,
}

impl Config {
    pub fn new(sources: LoadPlan, tables: SchemaCatalog) -> Self {
        Self { sources, tables }
    }

    /// Built-in configuration for the rental database.
    pub fn rental() -> Self {
        Self::new(LoadPlan::rental(), SchemaCatalog::rental())
    }

    /// Parses the YAML file. The load order is not checked here because
    /// duplicate detection depends on how the run names its tables; see
    /// [`Config::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).with_context(|| format!("Parsing config YAML {path:?}"))
    }

    pub fn validate(&self, naming: TableNaming) -> Result<()> {
        self.sources
            .ordered(naming)
            .context("Validating source load order")?;
        Ok(())
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing config to YAML")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::rental()
    }
}
