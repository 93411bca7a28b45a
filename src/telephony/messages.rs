use serde::{Deserialize, Serialize};

use super::provider::CallStatus;

/// Call resource returned by `Calls.json` and `Calls/{sid}.json`
#[derive(Debug, Serialize, Deserialize)]
pub struct CallResource {
    pub sid: String,
    pub status: CallStatus,
}

/// Page returned by `Recordings.json`
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordingPage {
    #[serde(default)]
    pub recordings: Vec<RecordingResource>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordingResource {
    pub sid: String,
    /// Account-relative resource path, e.g. `/2010-04-01/Accounts/AC…/Recordings/RE….json`
    pub uri: String,
    #[serde(default)]
    pub call_sid: Option<String>,
}

/// Error body Twilio attaches to 4xx/5xx responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<u32>,
    pub message: String,
}
