// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Section {0} has no heading aliases configured")]
    NoAliases(String),

    #[error("Regular expression error: {0}")]
    RegexError(String),
}

#[derive(Error, Debug, PartialEq)]
pub enum GradeError {
    #[error("Grades report has no rubric parts")]
    NoParts,

    #[error("Rubric part '{0}' has no items")]
    EmptyPart(String),

    #[error("Grade {score} for '{item}' is outside the range {min}-{max}")]
    OutOfRange {
        item: String,
        score: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid grade '{0}', expected a number")]
    NotANumber(String),

    #[error("Invalid score range {min}-{max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("Label '{0}' appears more than once")]
    DuplicateLabel(String),

    #[error("Grade collection is not finished")]
    Unfinished,
}

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chart '{0}' has no bars")]
    NoBars(String),
}

#[derive(Error, Debug)]
pub enum ComposeError {
    #[error("Configuration error: {0}")]
    InvalidGrades(#[from] GradeError),

    #[error("Chart rendering failed: {0}")]
    Chart(#[from] ChartError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Cannot write {0}: close the document if it is open in another program and try again")]
    OutputLocked(PathBuf),

    #[error("Cannot read narrative file {path}: {source}")]
    NarrativeUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode),

    #[error("No API key configured")]
    MissingApiKey,

    #[error("Language model returned no text")]
    EmptyResponse,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Invalid grades: {0}")]
    Grades(#[from] GradeError),

    #[error("Composition failed: {0}")]
    Compose(#[from] ComposeError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
