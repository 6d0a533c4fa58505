use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::error;

use super::{SPIDER_NAME, SPIDER_VERSION};
use crate::db::repo::Repo;
use crate::db::NewMissedItem;
use crate::error::Error;

const MESSAGE_LIMIT: usize = 255;
const SNAPSHOT_LIMIT: usize = 1000;

/// Turns failures into missed-item rows. Recording must never abort the
/// crawl: a secondary failure while writing the row is logged and swallowed.
pub struct Recorder<R> {
    repo: Arc<R>,
}

impl<R: Repo> Recorder<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn record(&self, error: &Error, location: &str, url: &str) {
        self.write(error, location, url, None).await
    }

    pub async fn record_with_item<T: Serialize>(
        &self,
        error: &Error,
        location: &str,
        url: &str,
        item: &T,
    ) {
        let snapshot = serde_json::to_string(item)
            .ok()
            .map(|s| truncate(&s, SNAPSHOT_LIMIT));
        self.write(error, location, url, snapshot).await
    }

    async fn write(&self, error: &Error, location: &str, url: &str, failed_data: Option<String>) {
        error!("error encountered: {} at {}", error, url);

        let (file, function) = match location.rsplit_once("::") {
            Some((file, function)) => (file.to_string(), function.to_string()),
            None => (env!("CARGO_PKG_NAME").to_string(), location.to_string()),
        };

        let item = NewMissedItem {
            spider_name: SPIDER_NAME.to_string(),
            spider_version: SPIDER_VERSION.to_string(),
            location_script_file: file,
            location_script_function: function,
            trace_back: Some(error_chain(error)),
            error_type: error.kind().to_string(),
            error_name: truncate(&error.to_string(), MESSAGE_LIMIT),
            item_url: url.to_string(),
            error_timestamp: Utc::now(),
            failed_data,
        };

        if let Err(record_error) = self.repo.insert_missed_item(item).await {
            error!(
                "critical error logging to missed items table: {}",
                record_error
            );
        }
    }
}

/// Walks the `source()` chain into a replay-friendly text form, the closest
/// analog of the traceback the missed-items table was designed around.
fn error_chain(error: &Error) -> String {
    let mut chain = format!("{:?}", error);
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        chain.push_str("\ncaused by: ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

fn truncate(value: &str, limit: usize) -> String {
    value.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ééé", 2), "éé");
        assert_eq!(truncate("ab", 10), "ab");
    }

    #[test]
    fn error_chain_includes_causes() {
        let parse_error = "not a url".parse::<url::Url>().unwrap_err();
        let chain = error_chain(&Error::UrlParseError(parse_error));
        assert!(chain.contains("caused by:"));
    }
}
