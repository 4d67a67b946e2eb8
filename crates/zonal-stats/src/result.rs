//! Result table: one row per region, in region order.

use serde::Serialize;
use zonal_common::{FieldNames, RegionId};

use crate::error::{Result, ZonalError};

/// Statistic for one region. `value` is `None` when the region had no
/// contributing cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub id: RegionId,
    pub value: Option<f32>,
}

impl ResultRow {
    pub fn new(id: RegionId, value: Option<f32>) -> Self {
        Self { id, value }
    }

    pub fn has_data(&self) -> bool {
        self.value.is_some()
    }
}

/// An extra column carried alongside the statistic, already rendered as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<String>,
}

/// Counts of regions with and without a statistic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultCounts {
    pub regions: usize,
    pub with_data: usize,
    pub no_data: usize,
}

/// Region identifier → statistic, ordered like the input region set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    fields: FieldNames,
    rows: Vec<ResultRow>,
    columns: Vec<Column>,
}

impl ResultTable {
    pub fn new(fields: FieldNames, rows: Vec<ResultRow>) -> Self {
        Self {
            fields,
            rows,
            columns: Vec::new(),
        }
    }

    /// Attach a passthrough column; it must have one value per row and a
    /// name not already used by the table.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<String>) -> Result<Self> {
        let name = name.into();
        if values.len() != self.rows.len() {
            return Err(ZonalError::Config(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        if name == self.fields.identifier
            || name == self.fields.statistic
            || self.column(&name).is_some()
        {
            return Err(ZonalError::Config(format!("duplicate column '{}'", name)));
        }
        self.columns.push(Column { name, values });
        Ok(self)
    }

    pub fn fields(&self) -> &FieldNames {
        &self.fields
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// All column names in export order: identifier, statistic, passthrough.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names = vec![self.fields.identifier.as_str(), self.fields.statistic.as_str()];
        names.extend(self.columns.iter().map(|c| c.name.as_str()));
        names
    }

    pub fn get(&self, id: &RegionId) -> Option<&ResultRow> {
        self.rows.iter().find(|r| &r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }

    pub fn counts(&self) -> ResultCounts {
        let with_data = self.rows.iter().filter(|r| r.has_data()).count();
        ResultCounts {
            regions: self.rows.len(),
            with_data,
            no_data: self.rows.len() - with_data,
        }
    }

    /// `(identifier, statistic)` pairs in row order.
    pub fn pairs(&self) -> Vec<(RegionId, Option<f32>)> {
        self.rows.iter().map(|r| (r.id.clone(), r.value)).collect()
    }

    /// [`pairs`](Self::pairs) with identifiers rendered the way the
    /// exporter writes them.
    pub fn exported_pairs(&self) -> Vec<(String, Option<f32>)> {
        self.rows.iter().map(|r| (r.id.to_string(), r.value)).collect()
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
