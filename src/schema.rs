//! Column-type schema used to decide how each CSV cell is rendered as SQL.
//!
//! A [`SchemaCatalog`] maps a target table name to a [`TableSchema`], an
//! ordered list of [`ColumnDef`] entries tagged with a [`ColumnType`]. Only
//! two semantic types exist: values of a [`ColumnType::String`] column are
//! always quoted, values of a [`ColumnType::Numeric`] column are emitted as
//! bare literals (or `NULL` when they do not parse).
//!
//! Table keys are stored lower-cased and column lookups are case-insensitive,
//! so `UserDist` in a CSV header resolves to the `userDist` definition.
//!
//! [`SchemaCatalog::rental`] returns the compiled-in catalog for the drone and
//! equipment rental database.

use std::{collections::BTreeMap, fmt, str::FromStr};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Numeric,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Numeric => "numeric",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &["string", "numeric"]
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "string" | "text" | "varchar" => Ok(ColumnType::String),
            "numeric" | "number" | "float" | "real" | "integer" | "int" => {
                Ok(ColumnType::Numeric)
            }
            _ => Err(anyhow!(
                "Unknown column type '{value}'. Supported types: {}",
                ColumnType::variants().join(", ")
            )),
        }
    }
}

impl Serialize for ColumnType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        ColumnType::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub datatype: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, datatype: ColumnType) -> Self {
        Self {
            name: name.into(),
            datatype,
        }
    }

    pub fn matches_header(&self, header: &str) -> bool {
        self.name.to_lowercase() == header.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSchema {
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    pub fn column(&self, header: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.matches_header(header))
    }

    /// Resolves every header to its declared type, in header order.
    ///
    /// Returns the first header that has no definition as the error so the
    /// caller can name it when rejecting the file.
    pub fn resolve_headers<'h>(
        &self,
        headers: &'h [String],
    ) -> Result<Vec<ColumnType>, &'h str> {
        headers
            .iter()
            .map(|header| {
                self.column(header)
                    .map(|column| column.datatype)
                    .ok_or(header.as_str())
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SchemaCatalog {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: &str, schema: TableSchema) {
        self.tables.insert(table.to_lowercase(), schema);
    }

    pub fn with_table(mut self, table: &str, schema: TableSchema) -> Self {
        self.insert(table, schema);
        self
    }

    pub fn get(&self, table: &str) -> Option<&TableSchema> {
        self.tables.get(&table.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Compiled-in schema of the rental database.
    pub fn rental() -> Self {
        RENTAL_TABLES
            .iter()
            .fold(Self::new(), |catalog, (table, columns)| {
                let schema = TableSchema::new(
                    columns
                        .iter()
                        .map(|(name, datatype)| ColumnDef::new(*name, *datatype))
                        .collect(),
                );
                catalog.with_table(table, schema)
            })
    }
}

impl<'de> Deserialize<'de> for SchemaCatalog {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, TableSchema>::deserialize(deserializer)?;
        let mut catalog = SchemaCatalog::new();
        for (table, schema) in raw {
            if catalog.get(&table).is_some() {
                return Err(de::Error::custom(format!(
                    "Table '{table}' is defined more than once (names are case-insensitive)"
                )));
            }
            catalog.insert(&table, schema);
        }
        Ok(catalog)
    }
}

use ColumnType::{Numeric as N, String as S};

type StaticTable = (&'static str, &'static [(&'static str, ColumnType)]);

const RENTAL_TABLES: &[StaticTable] = &[
    ("address", &[("address", S), ("userDist", N)]),
    (
        "batteries",
        &[
            ("serialNum", S),
            ("batteryType", S),
            ("chargeLevel", N),
            ("droneSerialNum", S),
        ],
    ),
    (
        "battery_type",
        &[("batteryType", S), ("capacity", N), ("voltage", N)],
    ),
    (
        "drone_model",
        &[
            ("model", S),
            ("manufacturer", S),
            ("maxSpeed", N),
            ("flightTime", N),
            ("weightCapacity", N),
        ],
    ),
    (
        "drones",
        &[
            ("serialNum", S),
            ("name", S),
            ("model", S),
            ("status", S),
            ("weightCapacity", N),
            ("year", N),
            ("warehouseID", S),
        ],
    ),
    (
        "equip_model",
        &[("model", S), ("manufacturer", S), ("type", S)],
    ),
    (
        "equipment",
        &[
            ("serialNum", S),
            ("description", S),
            ("type", S),
            ("model", S),
            ("year", N),
            ("status", S),
            ("warehouseID", S),
            ("renterID", S),
            ("weight", N),
            ("length", N),
            ("width", N),
            ("height", N),
        ],
    ),
    (
        "mechanics",
        &[
            ("mechanicID", S),
            ("fname", S),
            ("lname", S),
            ("phone", S),
            ("email", S),
            ("warehouseID", S),
        ],
    ),
    (
        "members",
        &[
            ("userID", S),
            ("fname", S),
            ("lname", S),
            ("address", S),
            ("phone", S),
            ("email", S),
            ("startDate", S),
            ("warehouseDistance", N),
        ],
    ),
    ("order_price", &[("orderNum", S), ("price", N)]),
    (
        "orders",
        &[
            ("orderNum", S),
            ("serialNum", S),
            ("warehouseID", S),
            ("orderDate", S),
            ("quantity", N),
            ("estimatedArrival", S),
            ("arrivalDate", S),
        ],
    ),
    ("rent", &[("checkOutID", S), ("rentalFees", N)]),
    (
        "rentals",
        &[
            ("checkOutID", S),
            ("serialNum", S),
            ("userID", S),
            ("checkOutDate", S),
            ("dueDate", S),
            ("returnDate", S),
            ("rentalFees", N),
            ("Returns", S),
        ],
    ),
    (
        "repair",
        &[
            ("repairID", S),
            ("serialNum", S),
            ("mechanicID", S),
            ("repairDate", S),
            ("description", S),
            ("cost", N),
        ],
    ),
    (
        "reviews",
        &[
            ("reviewID", S),
            ("userID", S),
            ("serialNum", S),
            ("rating", N),
            ("comment", S),
            ("reviewDate", S),
        ],
    ),
    (
        "transports",
        &[
            ("dSerialNum", S),
            ("eSerialNum", S),
            ("type", S),
            ("date", S),
        ],
    ),
    (
        "warehouse",
        &[
            ("warehouseID", S),
            ("city", S),
            ("address", S),
            ("phone", S),
            ("managerName", S),
            ("storageCapacity", N),
            ("droneCapacity", N),
        ],
    ),
];
