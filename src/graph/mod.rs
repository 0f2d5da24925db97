//! Client side of the remote mail API.

pub mod folders;
pub mod http;
pub mod messages;
pub mod retry;
pub mod types;

use url::Url;

use crate::error::{Error, Result};

pub const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Appends path segments to the API base, percent-encoding each one.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<String> {
    let mut url =
        Url::parse(base).map_err(|e| Error::config(format!("invalid API base '{base}': {e}")))?;
    url.path_segments_mut()
        .map_err(|()| Error::config(format!("API base '{base}' cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.to_string())
}

/// OData key addressing: `collection('key')`.
pub(crate) fn keyed(collection: &str, key: &str) -> String {
    format!("{collection}('{}')", key.replace('\'', "''"))
}
