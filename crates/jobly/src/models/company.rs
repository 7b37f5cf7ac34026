//! Companies.

use super::double_option;
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::fields::{FieldMap, FieldValues};
use crate::fragment::{build_filter_fragment, build_update_fragment};
use crate::row::{FromRow, RowExt, from_rows};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

const SELECT_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

/// A company as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

/// A company together with its jobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyDetail {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<CompanyJob>,
}

/// A job as listed under its company.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyJob {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
}

/// Input for [`Company::create`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub num_employees: Option<i32>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Partial update for [`Company::update`]. The handle cannot change.
///
/// Nullable columns use `Option<Option<T>>`: `None` leaves the column alone,
/// `Some(None)` sets it to NULL.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub num_employees: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
}

impl CompanyPatch {
    /// Fields present in the patch, keyed by their API names.
    pub fn to_field_values(&self) -> FieldValues {
        let mut values = FieldValues::new();
        values
            .insert_opt("name", self.name.clone())
            .insert_opt("description", self.description.clone())
            .insert_opt("numEmployees", self.num_employees)
            .insert_opt("logoUrl", self.logo_url.clone());
        values
    }
}

/// Search criteria for [`Company::find_all`]. All fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyFilter {
    /// Case-insensitive substring of the company name.
    pub name: Option<String>,
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
}

impl CompanyFilter {
    /// Filter values keyed by their API names.
    ///
    /// Fails when `minEmployees` exceeds `maxEmployees`.
    pub fn to_field_values(&self) -> JoblyResult<FieldValues> {
        if let (Some(min), Some(max)) = (self.min_employees, self.max_employees) {
            if min > max {
                return Err(JoblyError::invalid_input(
                    "minEmployees cannot be greater than maxEmployees",
                ));
            }
        }

        let mut values = FieldValues::new();
        values
            .insert_opt("name", self.name.clone())
            .insert_opt("minEmployees", self.min_employees)
            .insert_opt("maxEmployees", self.max_employees);
        Ok(values)
    }
}

impl FromRow for Company {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            description: row.try_get_column("description")?,
            num_employees: row.try_get_column("num_employees")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

impl FromRow for CompanyJob {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
        })
    }
}

impl Company {
    /// API field name → column, for partial updates.
    pub const UPDATE_COLUMNS: FieldMap<'static> =
        FieldMap::new(&[("numEmployees", "num_employees"), ("logoUrl", "logo_url")]);

    /// API field name → predicate prefix, for filtered listing.
    pub const FILTERS: FieldMap<'static> = FieldMap::new(&[
        ("name", "name ILIKE "),
        ("minEmployees", "num_employees >= "),
        ("maxEmployees", "num_employees <= "),
    ]);

    /// Create a company.
    ///
    /// Fails with [`JoblyError::InvalidInput`] when the handle is taken.
    pub async fn create(conn: &impl GenericClient, new: &NewCompany) -> JoblyResult<Company> {
        let existing = conn
            .query_opt(
                "SELECT handle FROM companies WHERE handle = $1",
                &[&new.handle],
            )
            .await?;
        if existing.is_some() {
            return Err(JoblyError::invalid_input(format!(
                "Duplicate company: {}",
                new.handle
            )));
        }

        let sql = format!(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SELECT_COLUMNS}"
        );
        let row = conn
            .query_one(
                &sql,
                &[
                    &new.handle,
                    &new.name,
                    &new.description,
                    &new.num_employees,
                    &new.logo_url,
                ],
            )
            .await?;
        let company = Company::from_row(&row)?;

        tracing::info!(target: "jobly.model", handle = %company.handle, "company created");
        Ok(company)
    }

    /// List companies matching `filter`, ordered by name.
    pub async fn find_all(
        conn: &impl GenericClient,
        filter: &CompanyFilter,
    ) -> JoblyResult<Vec<Company>> {
        let clause = build_filter_fragment(&filter.to_field_values()?, &Self::FILTERS)?;

        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM companies");
        if !clause.is_empty() {
            sql.push(' ');
            sql.push_str(clause.sql());
        }
        sql.push_str(" ORDER BY name");

        let rows = conn.query(&sql, &clause.params_ref()).await?;
        from_rows(&rows)
    }

    /// Fetch a company and its jobs.
    pub async fn get(conn: &impl GenericClient, handle: &str) -> JoblyResult<CompanyDetail> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM companies WHERE handle = $1");
        let row = conn
            .query_opt(&sql, &[&handle])
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))?;
        let company = Company::from_row(&row)?;

        let job_rows = conn
            .query(
                "SELECT id, title, salary, equity FROM jobs WHERE company_handle = $1 ORDER BY id",
                &[&handle],
            )
            .await?;

        Ok(CompanyDetail {
            company,
            jobs: from_rows(&job_rows)?,
        })
    }

    /// Apply a partial update; only fields present in `patch` change.
    pub async fn update(
        conn: &impl GenericClient,
        handle: &str,
        patch: &CompanyPatch,
    ) -> JoblyResult<Company> {
        let set = build_update_fragment(&patch.to_field_values(), &Self::UPDATE_COLUMNS)?;
        let sql = format!(
            "UPDATE companies SET {} WHERE handle = ${} RETURNING {SELECT_COLUMNS}",
            set.sql(),
            set.next_placeholder()
        );

        let mut params: Vec<&(dyn ToSql + Sync)> = set.params_ref();
        params.push(&handle);

        let row = conn
            .query_opt(&sql, &params)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))?;
        Company::from_row(&row)
    }

    /// Delete a company (its jobs go with it).
    pub async fn remove(conn: &impl GenericClient, handle: &str) -> JoblyResult<()> {
        conn.query_opt(
            "DELETE FROM companies WHERE handle = $1 RETURNING handle",
            &[&handle],
        )
        .await?
        .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))?;

        tracing::info!(target: "jobly.model", handle, "company removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn patch_keeps_declared_order_and_explicit_nulls() {
        let patch: CompanyPatch = serde_json::from_str(
            r#"{"logoUrl": null, "name": "New", "numEmployees": 10}"#,
        )
        .unwrap();
        let values = patch.to_field_values();

        let keys: Vec<_> = values.keys().collect();
        assert_eq!(keys, ["name", "numEmployees", "logoUrl"]);
        assert_eq!(values.get("logoUrl"), Some(&Value::Null));
        assert_eq!(values.get("description"), None);
    }

    #[test]
    fn patch_maps_to_snake_case_columns() {
        let patch = CompanyPatch {
            num_employees: Some(Some(10)),
            logo_url: Some(Some("http://new.img".into())),
            ..Default::default()
        };
        let set = build_update_fragment(&patch.to_field_values(), &Company::UPDATE_COLUMNS).unwrap();

        assert_eq!(set.sql(), r#""num_employees"=$1, "logo_url"=$2"#);
        assert_eq!(set.next_placeholder(), 3);
    }

    #[test]
    fn empty_patch_is_invalid() {
        let set = build_update_fragment(
            &CompanyPatch::default().to_field_values(),
            &Company::UPDATE_COLUMNS,
        );
        assert!(set.unwrap_err().is_invalid_input());
    }

    #[test]
    fn patch_rejects_handle_change() {
        let parsed: Result<CompanyPatch, _> = serde_json::from_str(r#"{"handle": "c2"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn filter_builds_where_clause() {
        let filter = CompanyFilter {
            name: Some("arn".into()),
            min_employees: Some(2),
            max_employees: Some(3),
        };
        let clause =
            build_filter_fragment(&filter.to_field_values().unwrap(), &Company::FILTERS).unwrap();

        assert_eq!(
            clause.sql(),
            "WHERE name ILIKE $1 AND num_employees >= $2 AND num_employees <= $3"
        );
        assert_eq!(
            clause.values(),
            &[Value::from("%arn%"), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn filter_rejects_inverted_range() {
        let filter = CompanyFilter {
            min_employees: Some(10),
            max_employees: Some(1),
            ..Default::default()
        };
        let err = filter.to_field_values().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn default_filter_is_empty() {
        assert!(CompanyFilter::default().to_field_values().unwrap().is_empty());
    }

    #[test]
    fn detail_serializes_flat() {
        let detail = CompanyDetail {
            company: Company {
                handle: "c1".into(),
                name: "C1".into(),
                description: "Desc1".into(),
                num_employees: Some(1),
                logo_url: None,
            },
            jobs: vec![CompanyJob {
                id: 1,
                title: "j1".into(),
                salary: Some(100000),
                equity: Some(Decimal::new(1, 2)),
            }],
        };
        let json = serde_json::to_value(&detail).unwrap();

        assert_eq!(json["handle"], "c1");
        assert_eq!(json["numEmployees"], 1);
        assert_eq!(json["logoUrl"], serde_json::Value::Null);
        assert_eq!(json["jobs"][0]["equity"], "0.01");
    }
}
