//! Error types for the search path / 搜索链路的错误类型

use thiserror::Error;

/// Failure of a single search request / 单次搜索请求的失败
///
/// `Transport` and `Engine` are the transport failures of the index call;
/// neither is retried here.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Index engine unreachable, timed out or returned an unreadable body / 索引引擎不可达或超时
    #[error("index request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Index engine answered with a non-success status / 索引引擎返回错误状态
    #[error("index engine returned {status}: {body}")]
    Engine { status: u16, body: String },

    /// A hit's source payload does not match the hotel document schema / 文档反序列化失败
    #[error("failed to decode hit {id}: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid search criteria: {0}")]
    InvalidCriteria(String),

    /// Index name cannot be used as a path segment of the engine URL / 索引名非法
    #[error("invalid index name {index:?}: {reason}")]
    IndexName { index: String, reason: String },
}

impl SearchError {
    /// Whether the failure came from the index call itself / 是否为传输层失败
    pub fn is_transport(&self) -> bool {
        matches!(self, SearchError::Transport(_) | SearchError::Engine { .. })
    }
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
