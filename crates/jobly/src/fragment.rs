//! Parameterized SQL fragments for partial updates and dynamic filters.
//!
//! Both builders take an ordered [`FieldValues`] and a [`FieldMap`] and return a
//! [`Fragment`]: a piece of SQL with `$1..$N` placeholders and the N values to
//! bind, in placeholder order. Values never appear in the SQL text.
//!
//! ```ignore
//! use jobly::{FieldMap, FieldValues, build_update_fragment};
//!
//! const COLUMNS: FieldMap<'static> = FieldMap::new(&[("firstName", "first_name")]);
//!
//! let data = FieldValues::new().with("firstName", "Aliya").with("age", 32);
//! let set = build_update_fragment(&data, &COLUMNS)?;
//! assert_eq!(set.sql(), r#""first_name"=$1, "age"=$2"#);
//!
//! let sql = format!("UPDATE users SET {} WHERE id = ${}", set.sql(), set.next_placeholder());
//! ```

use crate::error::{JoblyError, JoblyResult};
use crate::fields::{FieldMap, FieldValues};
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// SQL text plus the values bound to its placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    sql: String,
    values: Vec<Value>,
}

impl Fragment {
    /// The empty fragment: no SQL, no values.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.values)
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Number of placeholders (and values) in the fragment.
    pub fn param_count(&self) -> usize {
        self.values.len()
    }

    /// Index of the first placeholder a caller may append after this fragment.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }

    /// Get parameter references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|v| v as &(dyn ToSql + Sync))
            .collect()
    }
}

fn quote_column(column: &str) -> String {
    format!("\"{}\"", column.replace('"', "\"\""))
}

/// Filter key whose text value is always a substring search.
const NAME_KEY: &str = "name";

/// Predicate prefixes ending in `LIKE`/`ILIKE` take a substring pattern.
fn is_pattern_predicate(prefix: &str) -> bool {
    let upper = prefix.trim_end().to_ascii_uppercase();
    upper.ends_with(" LIKE") || upper.ends_with(" ILIKE")
}

/// Build the assignment list of an `UPDATE ... SET` statement.
///
/// Each key becomes `"<column>"=$<i>` where the column is `columns.resolve(key)`
/// and `i` counts from 1 in key order. Fails with [`JoblyError::InvalidInput`]
/// when `values` is empty.
pub fn build_update_fragment(values: &FieldValues, columns: &FieldMap<'_>) -> JoblyResult<Fragment> {
    if values.is_empty() {
        return Err(JoblyError::invalid_input("No data"));
    }

    let mut assignments = Vec::with_capacity(values.len());
    let mut bound = Vec::with_capacity(values.len());
    for (idx, (key, value)) in values.iter().enumerate() {
        let column = columns.resolve(key);
        assignments.push(format!("{}=${}", quote_column(column), idx + 1));
        bound.push(value.clone());
    }

    Ok(Fragment {
        sql: assignments.join(", "),
        values: bound,
    })
}

/// Build a `WHERE` clause from filter values.
///
/// Each key must be listed in `predicates`; its prefix (e.g. `"salary >= "`) is
/// followed by the key's placeholder, and predicates are joined with `AND`.
/// Text values under the `name` key, or of any `LIKE`/`ILIKE` predicate, are
/// bound as `%value%`. An empty
/// `values` yields [`Fragment::empty`]. Unknown keys fail with
/// [`JoblyError::InvalidInput`].
///
/// `values` is not modified; wildcard-wrapped values live only in the result.
pub fn build_filter_fragment(
    values: &FieldValues,
    predicates: &FieldMap<'_>,
) -> JoblyResult<Fragment> {
    if values.is_empty() {
        return Ok(Fragment::empty());
    }

    let mut conditions = Vec::with_capacity(values.len());
    let mut bound = Vec::with_capacity(values.len());
    for (idx, (key, value)) in values.iter().enumerate() {
        let prefix = predicates
            .get(key)
            .ok_or_else(|| JoblyError::invalid_input(format!("Unsupported filter: {key}")))?;

        let value = match value {
            Value::Text(s) if key == NAME_KEY || is_pattern_predicate(prefix) => {
                Value::Text(format!("%{s}%"))
            }
            other => other.clone(),
        };

        conditions.push(format!("{}${}", prefix, idx + 1));
        bound.push(value);
    }

    Ok(Fragment {
        sql: format!("WHERE {}", conditions.join(" AND ")),
        values: bound,
    })
}
