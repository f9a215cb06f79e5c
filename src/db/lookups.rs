use anyhow::{Context, Result};

use super::Store;
use crate::models::LookupField;

impl Store {
    /// Distinct non-empty values of an autocomplete column. Spellings that
    /// differ only by case are kept apart; ordering sorts by lowercase first
    /// and falls back to the original text so ties come out deterministic.
    pub fn distinct_values(&self, field: LookupField) -> Result<Vec<String>> {
        let column = field.column();
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT DISTINCT {column} FROM books
                 WHERE {column} IS NOT NULL AND {column} <> ''
                 ORDER BY LOWER({column}), {column}"
            ))
            .with_context(|| format!("failed to prepare {column} lookup"))?;

        let mut rows = stmt
            .query([])
            .with_context(|| format!("failed to execute {column} lookup"))?;

        let mut values = Vec::new();
        while let Some(row) = rows.next().context("failed to fetch lookup row")? {
            let value: String = row.get(0).context("failed to read lookup value")?;
            values.push(value);
        }

        Ok(values)
    }

    /// Name-based variant for callers holding a raw column name. Names outside
    /// the allow-list produce an empty list instead of an error.
    pub fn distinct_values_named(&self, column: &str) -> Result<Vec<String>> {
        match LookupField::from_column(column) {
            Some(field) => self.distinct_values(field),
            None => {
                tracing::debug!(column, "rejected lookup on non-autocomplete column");
                Ok(Vec::new())
            }
        }
    }
}
