use mentions_core::SourceId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_id} responded with status {status}")]
    Status { source_id: SourceId, status: u16 },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON decode error for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    #[error("all {attempted} {source_id} queries failed")]
    AllQueriesFailed { source_id: SourceId, attempted: usize },
}
