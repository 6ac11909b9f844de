use serde::Deserialize;
use uuid::Uuid;

use super::error::{WebError, WebResult};
use crate::pagination::{PageRequest, lenient_int};
use crate::store::RecordFilter;

/// Query string shared by every list endpoint. Filters a resource does not
/// index simply match nothing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
    pub statut: Option<String>,
    pub client_id: Option<String>,
    pub technicien_id: Option<String>,
    pub mission_id: Option<String>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    pub fn filter(&self) -> WebResult<RecordFilter> {
        Ok(RecordFilter {
            statut: non_blank(self.statut.as_deref()).map(str::to_string),
            client_id: parse_optional_id("clientId", self.client_id.as_deref())?,
            technicien_id: parse_optional_id("technicienId", self.technicien_id.as_deref())?,
            mission_id: parse_optional_id("missionId", self.mission_id.as_deref())?,
            search: non_blank(self.search.as_deref()).map(str::to_string),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_optional_id(field: &str, raw: Option<&str>) -> WebResult<Option<Uuid>> {
    non_blank(raw)
        .map(|raw| {
            Uuid::parse_str(raw)
                .map_err(|_| WebError::Input(format!("{field} must be a valid UUID")))
        })
        .transpose()
}

pub fn parse_id(raw: &str) -> WebResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| WebError::Input(format!("invalid id '{raw}'")))
}
