use crate::{StepRecord, UpliftError};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Hash parameter that carries the encoded pipeline.
pub const STEPS_PARAM: &str = "steps";

/// Packs step records into a URL-safe token: JSON, then base64 without padding.
pub fn encode_pipeline(records: &[StepRecord]) -> Result<String, UpliftError> {
    let json = serde_json::to_vec(records)
        .map_err(|error| UpliftError::ShareLink(format!("failed to encode pipeline: {error}")))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

pub fn decode_pipeline(encoded: &str) -> Result<Vec<StepRecord>, UpliftError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded.trim())
        .map_err(|error| UpliftError::ShareLink(format!("invalid base64 payload: {error}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|error| UpliftError::ShareLink(format!("invalid pipeline payload: {error}")))
}

/// Parses the query part of a location hash such as `#/uplift?steps=...`.
///
/// A fragment starting with `#` contributes only what follows its first `?`; any
/// other input is read as a bare query string.
pub fn hash_params(fragment: &str) -> BTreeMap<String, String> {
    let query = match fragment.strip_prefix('#') {
        Some(hash) => hash.split_once('?').map(|(_, query)| query).unwrap_or_default(),
        None => fragment.strip_prefix('?').unwrap_or(fragment),
    };
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Builds `#<route>?steps=<encoded>`.
pub fn share_fragment(route: &str, records: &[StepRecord]) -> Result<String, UpliftError> {
    let encoded = encode_pipeline(records)?;
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(STEPS_PARAM, &encoded)
        .finish();
    Ok(format!("#{}?{query}", route.trim_start_matches('#')))
}

/// Extracts and decodes the step records carried by a share fragment.
pub fn records_from_fragment(fragment: &str) -> Result<Vec<StepRecord>, UpliftError> {
    let params = hash_params(fragment);
    let encoded = params
        .get(STEPS_PARAM)
        .ok_or_else(|| UpliftError::ShareLink(format!("missing '{STEPS_PARAM}' parameter")))?;
    decode_pipeline(encoded)
}
