use std::path::PathBuf;
use std::time::Duration;

use crate::classify::QuotaMatcher;
use crate::request::TryOnParams;

pub const DEFAULT_SPACE: &str = "yisol/IDM-VTON";
pub const DEFAULT_HUB_ENDPOINT: &str = "https://huggingface.co";
pub const DEFAULT_TEMP_DIR: &str = "/tmp/lookfit_tryon";

/// Environment variables checked, in order, for a Hugging Face token.
pub const TOKEN_ENV_VARS: [&str; 2] = ["HF_TOKEN", "HUGGING_FACE_HUB_TOKEN"];

/// Configuration for a try-on run.
///
/// Use [`TryOnConfig::builder()`] to override pieces, or
/// [`TryOnConfig::default()`] for the stock IDM-VTON setup.
#[derive(Debug, Clone)]
pub struct TryOnConfig {
    /// Space id (`owner/name`) or a direct Gradio app URL.
    pub space: String,

    /// Hub API base used to look up a Space's host.
    pub hub_endpoint: String,

    /// Scratch directory for downloaded inputs and fetched outputs.
    /// File names inside it are fixed and overwritten on every run.
    pub temp_dir: PathBuf,

    /// Timeout for fetching each input image URL.
    pub download_timeout: Duration,

    /// Limit on the whole prediction. `None` waits indefinitely.
    pub predict_timeout: Option<Duration>,

    pub hf_token: Option<String>,

    pub quota: QuotaMatcher,

    /// When set, the result is copied here under a fresh unique name.
    pub result_dir: Option<PathBuf>,

    pub params: TryOnParams,
}

impl Default for TryOnConfig {
    fn default() -> Self {
        Self {
            space: DEFAULT_SPACE.to_string(),
            hub_endpoint: DEFAULT_HUB_ENDPOINT.to_string(),
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            download_timeout: Duration::from_secs(30),
            predict_timeout: None,
            hf_token: None,
            quota: QuotaMatcher::default(),
            result_dir: None,
            params: TryOnParams::default(),
        }
    }
}

impl TryOnConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> TryOnConfigBuilder {
        TryOnConfigBuilder::default()
    }

    pub fn user_image_path(&self) -> PathBuf {
        self.temp_dir.join("user.jpg")
    }

    pub fn garment_image_path(&self) -> PathBuf {
        self.temp_dir.join("garment.jpg")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.join("result")
    }
}

/// First non-empty token from [`TOKEN_ENV_VARS`].
pub fn hf_token_from_env() -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// Builder for [`TryOnConfig`].
#[derive(Default)]
pub struct TryOnConfigBuilder {
    config: TryOnConfig,
}

impl TryOnConfigBuilder {
    /// Target a different Space id or app URL.
    pub fn with_space(mut self, space: impl Into<String>) -> Self {
        self.config.space = space.into();
        self
    }

    pub fn with_hub_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.hub_endpoint = endpoint.into();
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.config.download_timeout = timeout;
        self
    }

    pub fn with_predict_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.predict_timeout = timeout;
        self
    }

    pub fn with_hf_token(mut self, token: Option<String>) -> Self {
        self.config.hf_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Add quota patterns on top of the defaults.
    pub fn with_quota_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.quota = self.config.quota.with_patterns(patterns);
        self
    }

    pub fn with_result_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.result_dir = dir;
        self
    }

    pub fn with_params(mut self, params: TryOnParams) -> Self {
        self.config.params = params;
        self
    }

    /// Build the final [`TryOnConfig`].
    pub fn build(self) -> TryOnConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = TryOnConfig::default();
        assert_eq!(c.space, "yisol/IDM-VTON");
        assert_eq!(c.hub_endpoint, "https://huggingface.co");
        assert_eq!(c.download_timeout, Duration::from_secs(30));
        assert!(c.predict_timeout.is_none());
        assert!(c.result_dir.is_none());
        assert_eq!(c.quota.patterns().len(), 3);
        assert_eq!(c.user_image_path(), PathBuf::from("/tmp/lookfit_tryon/user.jpg"));
        assert_eq!(c.garment_image_path(), PathBuf::from("/tmp/lookfit_tryon/garment.jpg"));
        assert_eq!(c.output_dir(), PathBuf::from("/tmp/lookfit_tryon/result"));
    }

    #[test]
    fn test_builder() {
        let c = TryOnConfig::builder()
            .with_space("http://127.0.0.1:7860")
            .with_temp_dir("/var/tmp/vton")
            .with_predict_timeout(Some(Duration::from_secs(300)))
            .with_hf_token(Some(String::new()))
            .with_quota_patterns(["exceeded your GPU quota"])
            .with_params(TryOnParams::default().seed(1))
            .build();
        assert_eq!(c.space, "http://127.0.0.1:7860");
        assert_eq!(c.user_image_path(), PathBuf::from("/var/tmp/vton/user.jpg"));
        assert_eq!(c.predict_timeout, Some(Duration::from_secs(300)));
        assert!(c.hf_token.is_none());
        assert!(c.quota.matches("You have exceeded your GPU quota"));
        assert_eq!(c.params.seed, 1);
    }
}
