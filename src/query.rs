// Query string helper: appends parameters to an endpoint URL.

use crate::error::{Result, WhapiError};
use reqwest::Url;

/// Append `params` to the query of `base`, keeping any query it already has.
///
/// Values are form-encoded. Empty values are kept as `key=`; the group
/// endpoint rejects requests without its empty `markingPeriodId`.
pub fn add_queries(base: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(base).map_err(|e| WhapiError::InvalidUrl {
        url: base.to_string(),
        message: e.to_string(),
    })?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in params {
            pairs.append_pair(k, v);
        }
    }
    Ok(url.into())
}
