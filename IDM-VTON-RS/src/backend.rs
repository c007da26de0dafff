use reqwest::Client;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::client::GradioClient;
use crate::config::TryOnConfig;
use crate::error::TryOnError;
use crate::request::{TryOnOutput, TryOnParams};

/// The remote half of a try-on: take two local images, return the artifacts.
///
/// The primary artifact's `path` must be something the caller can hand back
/// to the user as-is.
pub trait TryOnBackend {
    fn predict(
        &self,
        user: &Path,
        garment: &Path,
        params: &TryOnParams,
    ) -> impl Future<Output = Result<TryOnOutput, TryOnError>> + Send;
}

/// Backend that drives a Gradio Space and downloads the result locally.
#[derive(Debug, Clone)]
pub struct GradioBackend {
    http: Client,
    space: String,
    hub_endpoint: String,
    token: Option<String>,
    output_dir: PathBuf,
    timeout: Option<Duration>,
}

impl GradioBackend {
    pub fn from_config(http: Client, config: &TryOnConfig) -> Self {
        Self {
            http,
            space: config.space.clone(),
            hub_endpoint: config.hub_endpoint.clone(),
            token: config.hf_token.clone(),
            output_dir: config.output_dir(),
            timeout: config.predict_timeout,
        }
    }
}

impl TryOnBackend for GradioBackend {
    async fn predict(
        &self,
        user: &Path,
        garment: &Path,
        params: &TryOnParams,
    ) -> Result<TryOnOutput, TryOnError> {
        let client = GradioClient::connect(
            self.http.clone(),
            &self.space,
            &self.hub_endpoint,
            self.token.clone(),
        )
        .await?;

        let user_file = client.upload(user).await?;
        let garment_file = client.upload(garment).await?;
        let data = params.payload(&user_file, &garment_file);

        let outputs = client.predict(&params.api_name, data, self.timeout).await?;
        let output = TryOnOutput::from_outputs(&outputs)?;

        // Only the composited image is fetched; the mask stays a remote reference.
        let local = client.download(output.primary(), &self.output_dir).await?;
        debug!(remote = %output.primary().path, local = %local.display(), "fetched result");

        Ok(output.with_primary_path(local.to_string_lossy()))
    }
}
