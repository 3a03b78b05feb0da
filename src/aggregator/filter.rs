//! Ping eligibility and date bucketing.

use crate::parser::Ping;
use crate::utils::config::{BUILD_DATE_PREFIX_LEN, SUPPORTED_OS};
use crate::utils::error::ParseError;

/// A ping that passed the platform and usage checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedPing {
    /// Build date as YYYYMMDD
    pub date: String,

    /// Subsession usage in seconds, always > 0
    pub usage_seconds: u64,
}

/// Decide whether a ping contributes to the report
///
/// **Public** - shared by the aggregator and the tracked summaries
///
/// # Returns
/// * `Ok(Some(_))` - admitted, with its date key and usage
/// * `Ok(None)` - wrong platform or no usage; silently excluded
///
/// # Errors
/// * `ParseError::InvalidBuildId` - build id has no date prefix
pub fn admit(ping: &Ping) -> Result<Option<AdmittedPing>, ParseError> {
    if ping.os_name != SUPPORTED_OS || ping.subsession_length <= 0 {
        return Ok(None);
    }

    let date = date_key(&ping.build_id)?;

    Ok(Some(AdmittedPing {
        date: date.to_string(),
        usage_seconds: ping.subsession_length as u64,
    }))
}

/// Date portion of a build id
///
/// **Public** - e.g. "20170317987654321" -> "20170317"
pub fn date_key(build_id: &str) -> Result<&str, ParseError> {
    match build_id.get(..BUILD_DATE_PREFIX_LEN) {
        Some(prefix) if prefix.bytes().all(|b| b.is_ascii_digit()) => Ok(prefix),
        _ => Err(ParseError::InvalidBuildId(build_id.to_string())),
    }
}
