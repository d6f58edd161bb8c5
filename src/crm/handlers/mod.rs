pub mod analytics;
pub mod contacts;
pub mod deals;
pub mod leads;
pub mod sales_reps;
pub mod team;

pub use analytics::*;
pub use contacts::*;
pub use deals::*;
pub use leads::*;
pub use sales_reps::*;
pub use team::*;

use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::error::CrmError;

/// Decodes a request body so that bad enum labels surface as validation
/// errors with the usual JSON error shape.
pub(crate) fn from_json<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, CrmError> {
    serde_json::from_value(body).map_err(|e| CrmError::Validation(e.to_string()))
}

/// `None` for an absent, empty or `all` user filter.
pub(crate) fn parse_user_filter(raw: Option<&str>) -> Result<Option<Uuid>, CrmError> {
    match raw.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(id) => Uuid::parse_str(id)
            .map(Some)
            .map_err(|_| CrmError::Validation(format!("invalid user id '{id}'"))),
    }
}
