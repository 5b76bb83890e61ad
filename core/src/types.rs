//! Records produced by the pipeline.

use serde::{Deserialize, Serialize};

/// Current conditions for one location, as reported by the weather API.
///
/// Built only from a document that parsed completely and had every extracted
/// field present with the expected type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    pub location_id: String,
    pub condition_text: String,
    pub condition_code: u32,
    /// Timestamp exactly as sent, e.g. `2015-09-25T22:45:00-07:00`.
    pub last_update: String,
}
