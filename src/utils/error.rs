use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// 伺服器回傳的欄位驗證錯誤 (每個欄位保留第一則訊息)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub message: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 解析 `{"message": "...", "errors": {"field": ["msg"] | "msg"}}`
    pub fn from_json(body: &serde_json::Value) -> Self {
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);

        let mut fields = BTreeMap::new();
        if let Some(serde_json::Value::Object(errors)) = body.get("errors") {
            for (field, value) in errors {
                let first = match value {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Array(items) => items
                        .iter()
                        .find_map(|item| item.as_str().map(str::to_string)),
                    _ => None,
                };
                if let Some(msg) = first {
                    fields.insert(field.clone(), msg);
                }
            }
        }

        Self { message, fields }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}", message)?,
            None => write!(f, "The given data was invalid")?,
        }
        if !self.fields.is_empty() {
            let fields: Vec<&str> = self.fields.keys().map(String::as_str).collect();
            write!(f, " ({})", fields.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("HTTP transport failed: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Unknown route: {name}")]
    UnknownRoute { name: String },

    #[error("Route {route} requires parameter '{param}'")]
    MissingRouteParameter { route: String, param: String },

    #[error("Invalid filter {key}: {reason}")]
    InvalidFilter { key: String, reason: String },

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Server responded with {status}")]
    HttpStatus { status: u16, body: String },

    #[error("A submission is already in progress for this form")]
    AlreadyProcessing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Routing,
    Validation,
    NotFound,
    Network,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MarketError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MarketError::ConfigValidationError { .. }
            | MarketError::InvalidConfigValueError { .. }
            | MarketError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MarketError::UnknownRoute { .. } | MarketError::MissingRouteParameter { .. } => {
                ErrorCategory::Routing
            }
            MarketError::Validation(_) => ErrorCategory::Validation,
            MarketError::NotFound { .. } => ErrorCategory::NotFound,
            MarketError::TransportError(_)
            | MarketError::HttpStatus { .. }
            | MarketError::UrlError(_) => ErrorCategory::Network,
            MarketError::InvalidFilter { .. } | MarketError::AlreadyProcessing => {
                ErrorCategory::Input
            }
            MarketError::IoError(_) | MarketError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Validation => ErrorSeverity::Low,
            ErrorCategory::NotFound | ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Routing => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MarketError::Validation(errors) => {
                let mut lines = vec![errors
                    .message
                    .clone()
                    .unwrap_or_else(|| "Please correct the highlighted fields".to_string())];
                for (field, message) in &errors.fields {
                    lines.push(format!("  {}: {}", field, message));
                }
                lines.join("\n")
            }
            MarketError::NotFound { resource } => {
                format!("The requested {} could not be found", resource)
            }
            MarketError::TransportError(_) | MarketError::HttpStatus { .. } => {
                "Something went wrong while talking to the server".to_string()
            }
            MarketError::AlreadyProcessing => {
                "Please wait, the form is still submitting".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the configuration file and environment variables"
            }
            ErrorCategory::Routing => "Check the route name and pass every required --param",
            ErrorCategory::Validation => "Fix the listed fields and submit again",
            ErrorCategory::NotFound => "Verify the record still exists",
            ErrorCategory::Network => "Check server.base_url and that the server is reachable",
            ErrorCategory::Input => "Check the filter key and value",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_from_json_body() {
        let body = serde_json::json!({
            "message": "The name field is required.",
            "errors": {
                "name": ["The name field is required.", "The name must be a string."],
                "price": "The price must be a number.",
                "ignored": 42
            }
        });

        let errors = ValidationErrors::from_json(&body);
        assert_eq!(errors.message.as_deref(), Some("The name field is required."));
        assert_eq!(errors.get("name"), Some("The name field is required."));
        assert_eq!(errors.get("price"), Some("The price must be a number."));
        assert_eq!(errors.get("ignored"), None);
    }

    #[test]
    fn test_severity_follows_category() {
        let err = MarketError::UnknownRoute {
            name: "user.dashboard.hotels.update".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Routing);
        assert_eq!(err.severity(), ErrorSeverity::High);

        let err = MarketError::NotFound {
            resource: "hotel".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.user_friendly_message(), "The requested hotel could not be found");
    }
}
