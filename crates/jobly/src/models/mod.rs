//! Company and job records and their queries.
//!
//! Each model owns its field maps as `const`s and builds its UPDATE and
//! filtered SELECT statements through [`crate::fragment`].

pub mod company;
pub mod job;

pub use company::{Company, CompanyDetail, CompanyFilter, CompanyJob, CompanyPatch, NewCompany};
pub use job::{Job, JobFilter, JobPatch, NewJob};

use serde::{Deserialize, Deserializer};

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
