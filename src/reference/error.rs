use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Not an image reference: {0:?}")]
    NoMatch(String),

    #[error("Invalid reference pattern: {0}")]
    InvalidPattern(String),

    #[error("Line {line}: {source}")]
    InvalidLine {
        line: usize,
        #[source]
        source: Box<ParseError>,
    },
}
