//! Logical field names, their values, and their physical counterparts.
//!
//! API-facing names are camelCase (`numEmployees`), columns are snake_case
//! (`num_employees`). A [`FieldMap`] translates between the two, or from a
//! logical name to a predicate prefix such as `"salary >= "` when building
//! filters. Lookups fall back to the logical name, so a map only lists the
//! names that differ.

use crate::value::Value;

/// Static lookup table from logical field name to column name or predicate prefix.
///
/// Usually declared as a `const` next to the model that owns it:
///
/// ```ignore
/// const COLUMNS: FieldMap<'static> = FieldMap::new(&[
///     ("numEmployees", "num_employees"),
///     ("logoUrl", "logo_url"),
/// ]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMap<'a> {
    entries: &'a [(&'a str, &'a str)],
}

impl FieldMap<'static> {
    /// A map with no entries: every key resolves to itself.
    pub const EMPTY: Self = FieldMap { entries: &[] };
}

impl<'a> FieldMap<'a> {
    pub const fn new(entries: &'a [(&'a str, &'a str)]) -> Self {
        Self { entries }
    }

    /// Mapped value for `key`, if the table lists it.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.entries
            .iter()
            .find(|(logical, _)| *logical == key)
            .map(|(_, physical)| *physical)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Mapped value for `key`, or `key` itself when unmapped.
    pub fn resolve<'k>(&self, key: &'k str) -> &'k str
    where
        'a: 'k,
    {
        self.get(key).unwrap_or(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve `key` through `table`, falling back to `key` unchanged.
pub fn resolve<'k>(key: &'k str, table: &FieldMap<'k>) -> &'k str {
    table.resolve(key)
}

/// Ordered mapping from logical field name to value.
///
/// Keys keep their first insertion position; inserting an existing key
/// replaces its value in place. Fragment placeholders follow this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    entries: Vec<(String, Value)>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
        self
    }

    /// Insert `key` only when `value` is `Some`.
    pub fn insert_opt<T: Into<Value>>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        if let Some(v) = value {
            self.insert(key, v);
        }
        self
    }

    /// Builder-style [`FieldValues::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for FieldValues
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (k, v) in iter {
            values.insert(k, v);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER_COLUMNS: FieldMap<'static> = FieldMap::new(&[
        ("firstName", "first_name"),
        ("lastName", "last_name"),
        ("isAdmin", "is_admin"),
    ]);

    #[test]
    fn resolve_mapped_key() {
        assert_eq!(USER_COLUMNS.resolve("firstName"), "first_name");
        assert_eq!(resolve("isAdmin", &USER_COLUMNS), "is_admin");
    }

    #[test]
    fn resolve_falls_back_to_key() {
        assert_eq!(USER_COLUMNS.resolve("age"), "age");
        assert_eq!(FieldMap::EMPTY.resolve("title"), "title");
        assert!(!USER_COLUMNS.contains("age"));
    }

    #[test]
    fn resolve_with_runtime_table() {
        let owned = vec![("a".to_string(), "col_a".to_string())];
        let borrowed: Vec<(&str, &str)> = owned
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let map = FieldMap::new(&borrowed);
        assert_eq!(map.resolve("a"), "col_a");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn insert_keeps_first_position() {
        let mut values = FieldValues::new();
        values.insert("a", 1).insert("b", 2).insert("a", 3);

        let keys: Vec<_> = values.keys().collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(values.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn insert_opt_skips_none() {
        let mut values = FieldValues::new();
        values
            .insert_opt("name", Some("arn"))
            .insert_opt("minEmployees", None::<i32>);
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn collect_from_pairs() {
        let values: FieldValues = [("firstName", Value::from("Aliya")), ("age", Value::from(32))]
            .into_iter()
            .collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("age"), Some(&Value::Int(32)));
    }
}
