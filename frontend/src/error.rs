//! 错误类型
//!
//! 按层划分：传输层 `HttpError`，网关层 `ApiError`，认证层 `ProviderError` / `AuthError`，
//! 以及本地校验类错误。`Display` 输出即为展示给用户的文案。

use thiserror::Error;

// =========================================================
// 传输层
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("request build failed: {0}")]
    RequestBuild(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("response read failed: {0}")]
    ResponseRead(String),
}

// =========================================================
// 网关层
// =========================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("{operation} failed with status {status}")]
    Status { operation: &'static str, status: u16 },
    #[error("{operation} failed: {source}")]
    Network {
        operation: &'static str,
        #[source]
        source: HttpError,
    },
    #[error("{operation} returned an unexpected response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },
}

impl ApiError {
    pub fn operation(&self) -> &'static str {
        match self {
            ApiError::Status { operation, .. }
            | ApiError::Network { operation, .. }
            | ApiError::Decode { operation, .. } => operation,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 5xx
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }
}

// =========================================================
// 认证层
// =========================================================

/// 认证服务返回的原始错误，`code` 形如 `auth/wrong-password`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new("auth/network-request-failed", message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("This account has been disabled")]
    UserDisabled,
    #[error("No account found with this email")]
    UserNotFound,
    #[error("Incorrect password")]
    WrongPassword,
    #[error("Invalid email or password")]
    InvalidCredential,
    #[error("Too many failed login attempts. Please try again later")]
    TooManyRequests,
    #[error("Network error. Please check your connection")]
    Network,
    #[error("An account with this email already exists")]
    EmailInUse,
    #[error("Password should be at least 6 characters")]
    WeakPassword,
    #[error("Authentication is not configured")]
    NotConfigured,
    #[error("You are not signed in")]
    NotSignedIn,
    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// 将认证服务错误码翻译为用户文案；未知错误码使用服务自带的信息，缺失时用 `fallback`
    pub fn from_provider(err: ProviderError, fallback: &str) -> Self {
        let code = err.code.strip_prefix("auth/").unwrap_or(&err.code);
        match code {
            "invalid-email" => AuthError::InvalidEmail,
            "user-disabled" => AuthError::UserDisabled,
            "user-not-found" => AuthError::UserNotFound,
            "wrong-password" => AuthError::WrongPassword,
            "invalid-credential" => AuthError::InvalidCredential,
            "too-many-requests" => AuthError::TooManyRequests,
            "network-request-failed" => AuthError::Network,
            "email-already-in-use" => AuthError::EmailInUse,
            "weak-password" => AuthError::WeakPassword,
            "not-configured" => AuthError::NotConfigured,
            _ if err.message.trim().is_empty() => AuthError::Other(fallback.to_string()),
            _ => AuthError::Other(err.message),
        }
    }
}

// =========================================================
// 本地校验
// =========================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Please fill in all required fields")]
    MissingRequiredFields,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password should be at least 6 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Please select a date that is not in the past")]
    DateInPast,
    #[error("Please enter a valid date")]
    InvalidDate,
    #[error("Name cannot be empty")]
    EmptyName,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("File size must be less than {max_mb}MB")]
    TooLarge { max_mb: u32 },
    #[error("Please select a valid image file")]
    NotAnImage,
    #[error("Failed to read file: {0}")]
    Read(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location unavailable")]
    Unavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Geolocation is not supported by this browser")]
    Unsupported,
}

impl GeolocationError {
    /// `GeolocationPositionError.code`
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => GeolocationError::PermissionDenied,
            3 => GeolocationError::Timeout,
            _ => GeolocationError::Unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("Google Maps API key is not configured")]
    MissingApiKey,
    #[error("Failed to load Google Maps: {0}")]
    ScriptLoad(String),
    #[error("Failed to initialize map: {0}")]
    Init(String),
}
