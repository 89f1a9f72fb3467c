use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Config file parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Input file not found: {path}")]
    InputNotFound { path: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Archive error: {message}")]
    ArchiveError { message: String },

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    FileSystem,
    Archive,
    Configuration,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl HarvestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HarvestError::HttpError(_) | HarvestError::RetriesExhausted { .. } => {
                ErrorCategory::Network
            }
            HarvestError::IoError(_) | HarvestError::SerializationError(_) => {
                ErrorCategory::FileSystem
            }
            HarvestError::ZipError(_) | HarvestError::ArchiveError { .. } => {
                ErrorCategory::Archive
            }
            HarvestError::TomlError(_)
            | HarvestError::ConfigError { .. }
            | HarvestError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            HarvestError::InputNotFound { .. } => ErrorCategory::Input,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::FileSystem | ErrorCategory::Archive => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            HarvestError::InputNotFound { path } => {
                format!("Create {} with one page URL per line", path)
            }
            HarvestError::InvalidConfigValueError { field, .. } => {
                format!("Check the '{}' setting on the command line or in the config file", field)
            }
            HarvestError::TomlError(_) | HarvestError::ConfigError { .. } => {
                "Check the config file syntax".to_string()
            }
            HarvestError::HttpError(_) | HarvestError::RetriesExhausted { .. } => {
                "Check network connectivity and that the URL is reachable".to_string()
            }
            HarvestError::IoError(_) | HarvestError::SerializationError(_) => {
                "Check free disk space and write permissions on the output directory".to_string()
            }
            HarvestError::ZipError(_) | HarvestError::ArchiveError { .. } => {
                "Inspect the retained image directory and rerun".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Input error: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::FileSystem => format!("File system problem: {}", self),
            ErrorCategory::Archive => format!("Could not build archive: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
