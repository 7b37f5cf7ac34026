//! # jobly
//!
//! Companies and jobs on PostgreSQL, with hand-written SQL and a small
//! parameterized fragment builder for the dynamic parts.
//!
//! ## Fragment builder
//!
//! Partial updates and search filters arrive as field → value mappings keyed
//! by API names. [`build_update_fragment`] and [`build_filter_fragment`] turn
//! them into SQL with `$1..$N` placeholders plus the values to bind:
//!
//! ```ignore
//! use jobly::{FieldMap, FieldValues, build_filter_fragment};
//!
//! const FILTERS: FieldMap<'static> = FieldMap::new(&[
//!     ("name", "name ILIKE "),
//!     ("minEmployees", "num_employees >= "),
//! ]);
//!
//! let filters = FieldValues::new().with("name", "arn").with("minEmployees", 2);
//! let clause = build_filter_fragment(&filters, &FILTERS)?;
//! assert_eq!(clause.sql(), "WHERE name ILIKE $1 AND num_employees >= $2");
//!
//! let rows = client
//!     .query(&format!("SELECT * FROM companies {} ORDER BY name", clause.sql()), &clause.params_ref())
//!     .await?;
//! ```
//!
//! ## Models
//!
//! [`Company`] and [`Job`] expose `create`, `find_all`, `get`, `update` and
//! `remove` over any [`GenericClient`] (a connection, a transaction, or a
//! [`TracedClient`]):
//!
//! ```ignore
//! let client = jobly::connect(&jobly::DbConfig::from_env()?).await?;
//! let jobs = Job::find_all(&client, &JobFilter { has_equity: Some(true), ..Default::default() }).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod fields;
pub mod fragment;
pub mod logging;
pub mod models;
pub mod row;
pub mod value;

pub use client::GenericClient;
pub use config::{DbConfig, connect};
pub use error::{JoblyError, JoblyResult};
pub use fields::{FieldMap, FieldValues, resolve};
pub use fragment::{Fragment, build_filter_fragment, build_update_fragment};
pub use logging::{SqlLogConfig, TracedClient};
pub use models::{
    Company, CompanyDetail, CompanyFilter, CompanyJob, CompanyPatch, Job, JobFilter, JobPatch,
    NewCompany, NewJob,
};
pub use row::{FromRow, RowExt};
pub use value::Value;
