#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("failure writing graph file '{path}': {source}")]
    FileWrite {
        path: String,
        source: std::io::Error,
    },
    #[error("internal graph error: {0}")]
    Internal(String),
}
