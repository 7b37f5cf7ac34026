//! Jobs.

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

const SELECT_COLUMNS: &str = "id, title, salary, equity, company_handle";

/// A job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    /// Fraction of the company offered, `0..=1`.
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// Input for [`Job::create`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// Partial update for [`Job::update`].
///
/// Only the title, salary and equity can change; id and company are fixed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub equity: Option<Option<Decimal>>,
}

impl JobPatch {
    pub fn to_field_values(&self) -> FieldValues {
        let mut values = FieldValues::new();
        values
            .insert_opt("title", self.title.clone())
            .insert_opt("salary", self.salary)
            .insert_opt("equity", self.equity);
        values
    }
}

/// Search criteria for [`Job::find_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobFilter {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    pub min_salary: Option<i32>,
    /// `true` keeps only jobs with non-zero equity; `false` is the same as absent.
    pub has_equity: Option<bool>,
}

impl JobFilter {
    pub fn to_field_values(&self) -> FieldValues {
        let mut values = FieldValues::new();
        values
            .insert_opt("title", self.title.clone())
            .insert_opt("minSalary", self.min_salary);
        if self.has_equity == Some(true) {
            values.insert("hasEquity", 0);
        }
        values
    }
}

impl FromRow for Job {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

fn no_job(id: i32) -> JoblyError {
    JoblyError::not_found(format!("No job by id: {id}"))
}

impl Job {
    /// Update fields share their column names.
    pub const UPDATE_COLUMNS: FieldMap<'static> = FieldMap::EMPTY;

    /// API field name → predicate prefix, for filtered listing.
    pub const FILTERS: FieldMap<'static> = FieldMap::new(&[
        ("title", "title ILIKE "),
        ("minSalary", "salary >= "),
        ("hasEquity", "equity > "),
    ]);

    /// Create a job. An unknown company handle fails as a foreign key violation.
    pub async fn create(conn: &impl GenericClient, new: &NewJob) -> JoblyResult<Job> {
        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {SELECT_COLUMNS}"
        );
        let row = conn
            .query_one(
                &sql,
                &[&new.title, &new.salary, &new.equity, &new.company_handle],
            )
            .await?;
        let job = Job::from_row(&row)?;

        tracing::info!(target: "jobly.model", id = job.id, company = %job.company_handle, "job created");
        Ok(job)
    }

    /// List jobs matching `filter`, ordered by id.
    pub async fn find_all(conn: &impl GenericClient, filter: &JobFilter) -> JoblyResult<Vec<Job>> {
        let clause = build_filter_fragment(&filter.to_field_values(), &Self::FILTERS)?;

        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM jobs");
        if !clause.is_empty() {
            sql.push(' ');
            sql.push_str(clause.sql());
        }
        sql.push_str(" ORDER BY id");

        let rows = conn.query(&sql, &clause.params_ref()).await?;
        from_rows(&rows)
    }

    pub async fn get(conn: &impl GenericClient, id: i32) -> JoblyResult<Job> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM jobs WHERE id = $1");
        let row = conn
            .query_opt(&sql, &[&id])
            .await?
            .ok_or_else(|| no_job(id))?;
        Job::from_row(&row)
    }

    /// Apply a partial update; only fields present in `patch` change.
    pub async fn update(conn: &impl GenericClient, id: i32, patch: &JobPatch) -> JoblyResult<Job> {
        let set = build_update_fragment(&patch.to_field_values(), &Self::UPDATE_COLUMNS)?;
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = ${} RETURNING {SELECT_COLUMNS}",
            set.sql(),
            set.next_placeholder()
        );

        let mut params: Vec<&(dyn ToSql + Sync)> = set.params_ref();
        params.push(&id);

        let row = conn
            .query_opt(&sql, &params)
            .await?
            .ok_or_else(|| no_job(id))?;
        Job::from_row(&row)
    }

    pub async fn remove(conn: &impl GenericClient, id: i32) -> JoblyResult<()> {
        conn.query_opt("DELETE FROM jobs WHERE id = $1 RETURNING id", &[&id])
            .await?
            .ok_or_else(|| no_job(id))?;

        tracing::info!(target: "jobly.model", id, "job removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn has_equity_true_filters_positive_equity() {
        let filter = JobFilter {
            title: Some("j".into()),
            min_salary: Some(300000),
            has_equity: Some(true),
        };
        let clause = build_filter_fragment(&filter.to_field_values(), &Job::FILTERS).unwrap();

        assert_eq!(
            clause.sql(),
            "WHERE title ILIKE $1 AND salary >= $2 AND equity > $3"
        );
        assert_eq!(
            clause.values(),
            &[Value::from("%j%"), Value::Int(300000), Value::Int(0)]
        );
    }

    #[test]
    fn has_equity_false_adds_no_predicate() {
        let filter = JobFilter {
            has_equity: Some(false),
            ..Default::default()
        };
        let clause = build_filter_fragment(&filter.to_field_values(), &Job::FILTERS).unwrap();
        assert!(clause.is_empty());
    }

    #[test]
    fn filter_from_query_params() {
        let filter: JobFilter =
            serde_json::from_str(r#"{"minSalary": 299999, "hasEquity": true}"#).unwrap();
        assert_eq!(filter.min_salary, Some(299999));
        assert_eq!(filter.has_equity, Some(true));

        let unknown: Result<JobFilter, _> = serde_json::from_str(r#"{"salary": 1}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn patch_uses_column_names_verbatim() {
        let patch: JobPatch =
            serde_json::from_str(r#"{"title": "j1-new", "equity": null}"#).unwrap();
        let set = build_update_fragment(&patch.to_field_values(), &Job::UPDATE_COLUMNS).unwrap();

        assert_eq!(set.sql(), r#""title"=$1, "equity"=$2"#);
        assert_eq!(set.values(), &[Value::from("j1-new"), Value::Null]);
    }

    #[test]
    fn patch_rejects_id_and_company_changes() {
        assert!(serde_json::from_str::<JobPatch>(r#"{"id": "12"}"#).is_err());
        assert!(serde_json::from_str::<JobPatch>(r#"{"companyHandle": "c2"}"#).is_err());
    }

    #[test]
    fn job_serializes_equity_as_string() {
        let job = Job {
            id: 1,
            title: "j1".into(),
            salary: Some(100000),
            equity: Some(Decimal::new(1, 2)),
            company_handle: "c1".into(),
        };
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["equity"], "0.01");
        assert_eq!(json["companyHandle"], "c1");
    }
}
