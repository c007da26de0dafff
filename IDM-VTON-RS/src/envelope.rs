use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "Virtual try-on completed successfully";

/// `error_type` used for GPU quota failures.
pub const QUOTA_EXCEEDED: &str = "QUOTA_EXCEEDED";

pub const QUOTA_MESSAGE: &str =
    "Hugging Face GPU 할당량을 초과했습니다. 내일 다시 시도하거나 Hugging Face Pro를 구독하세요.";

/// The one JSON object printed per invocation.
///
/// Unset fields are left out of the output, so a success carries
/// `success, result_image, message` and a failure carries
/// `success, error, error_type[, original_error]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_error: Option<String>,
}

impl Envelope {
    fn empty(success: bool) -> Self {
        Self {
            success,
            result_image: None,
            message: None,
            error: None,
            error_type: None,
            original_error: None,
        }
    }

    pub fn success(result_image: impl Into<String>) -> Self {
        Self {
            result_image: Some(result_image.into()),
            message: Some(SUCCESS_MESSAGE.to_string()),
            ..Self::empty(true)
        }
    }

    pub fn failure(error: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            error_type: Some(error_type.into()),
            ..Self::empty(false)
        }
    }

    /// GPU quota failure, keeping the raw upstream text for diagnostics.
    pub fn quota(original_error: impl Into<String>) -> Self {
        Self {
            error: Some(QUOTA_MESSAGE.to_string()),
            error_type: Some(QUOTA_EXCEEDED.to_string()),
            original_error: Some(original_error.into()),
            ..Self::empty(false)
        }
    }

    /// Wrong number of arguments.
    pub fn usage(program: &str) -> Self {
        Self {
            error: Some(format!(
                "Usage: {} <user_image_url> <garment_image_url> <category>",
                program
            )),
            ..Self::empty(false)
        }
    }

    /// The tool cannot start at all (e.g. no usable HTTP/TLS backend).
    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::empty(false)
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.success {
            0
        } else {
            1
        }
    }

    /// Pretty-printed JSON, two-space indent, non-ASCII left unescaped.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| r#"{"success": false, "error": "failed to encode result"}"#.into())
    }
}
