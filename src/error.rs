use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("unparseable location {location:?} in record {record}")]
    #[diagnostic(help("fix the record with an annotation or extend the location grammar"))]
    UnparseableLocation { record: String, location: String },

    #[error("failed to read input records: {0}")]
    InputRead(String),

    #[error("invalid input record on line {line}: {message}")]
    InputParse { line: usize, message: String },

    #[error("failed to read annotations file at {0}")]
    AnnotationRead(PathBuf),

    #[error("invalid annotation on line {line}: {message}")]
    AnnotationParse { line: usize, message: String },

    #[error("unknown metadata field: {0}")]
    UnknownField(String),

    #[error("invalid value {value:?} for field {field}")]
    InvalidFieldValue { field: String, value: String },

    #[error("failed to read location hierarchy at {0}")]
    HierarchyRead(PathBuf),

    #[error("invalid location hierarchy row {line}: {message}")]
    HierarchyParse { line: usize, message: String },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid provider: {0}")]
    InvalidProvider(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to write output: {0}")]
    Output(String),
}
