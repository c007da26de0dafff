use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::{GradioBackend, TryOnBackend};
use crate::config::TryOnConfig;
use crate::envelope::Envelope;
use crate::error::TryOnError;
use crate::request::TryOnRequest;
use crate::source::resolve_image;

/// Runs one try-on against the configured Space.
///
/// Each call makes at most one prediction. There is no retry and nothing is
/// cached between calls.
///
/// # Example
/// ```no_run
/// use idm_vton::{TryOnConfig, TryOnRequest, VirtualTryOn};
///
/// # async fn example() {
/// let tryon = VirtualTryOn::new(reqwest::Client::new(), TryOnConfig::default());
/// let request = TryOnRequest::new("https://example.com/me.jpg", "/srv/shirt.jpg", "upper_body");
/// let envelope = tryon.run(&request).await;
/// println!("{}", envelope.to_json());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct VirtualTryOn<B = GradioBackend> {
    http: Client,
    config: TryOnConfig,
    backend: B,
}

impl VirtualTryOn<GradioBackend> {
    /// Invoker backed by the Gradio Space named in `config`.
    pub fn new(http: Client, config: TryOnConfig) -> Self {
        let backend = GradioBackend::from_config(http.clone(), &config);
        Self {
            http,
            config,
            backend,
        }
    }
}

impl<B: TryOnBackend> VirtualTryOn<B> {
    /// Invoker with a custom remote backend.
    pub fn with_backend(http: Client, config: TryOnConfig, backend: B) -> Self {
        Self {
            http,
            config,
            backend,
        }
    }

    pub fn config(&self) -> &TryOnConfig {
        &self.config
    }

    /// Run the request and fold every outcome into an [`Envelope`].
    pub async fn run(&self, request: &TryOnRequest) -> Envelope {
        match self.try_run(request).await {
            Ok(result_image) => Envelope::success(result_image),
            Err(e) => self.config.quota.classify(&e),
        }
    }

    /// Run the request and return the result image path.
    pub async fn try_run(&self, request: &TryOnRequest) -> Result<String, TryOnError> {
        let cfg = &self.config;
        info!(
            user = %request.user_image,
            garment = %request.garment_image,
            category = %request.category,
            space = %cfg.space,
            "starting virtual try-on"
        );

        tokio::fs::create_dir_all(&cfg.temp_dir)
            .await
            .map_err(|e| TryOnError::Io {
                context: format!("Cannot create {}", cfg.temp_dir.display()),
                source: e,
            })?;

        let user = resolve_image(
            &self.http,
            &request.user_image,
            &cfg.user_image_path(),
            cfg.download_timeout,
        )
        .await?;
        let garment = resolve_image(
            &self.http,
            &request.garment_image,
            &cfg.garment_image_path(),
            cfg.download_timeout,
        )
        .await?;

        let output = self.backend.predict(&user, &garment, &cfg.params).await?;
        if let Some(mask) = output.mask() {
            debug!(mask = %mask.path, "ignoring mask output");
        }
        let result = output.into_primary().path;
        info!(result = %result, "virtual try-on finished");

        match &cfg.result_dir {
            Some(dir) => archive(Path::new(&result), dir)
                .await
                .map(|p| p.to_string_lossy().into_owned()),
            None => Ok(result),
        }
    }
}

/// Copy the result into `dir` under a fresh `<uuid>.<ext>` name.
async fn archive(result: &Path, dir: &Path) -> Result<PathBuf, TryOnError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| TryOnError::Io {
            context: format!("Cannot create {}", dir.display()),
            source: e,
        })?;

    let ext = result
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .unwrap_or("png");
    let target = dir.join(format!("{}.{}", Uuid::new_v4(), ext));

    tokio::fs::copy(result, &target)
        .await
        .map_err(|e| TryOnError::Io {
            context: format!("Cannot copy {} to {}", result.display(), target.display()),
            source: e,
        })?;
    debug!(from = %result.display(), to = %target.display(), "copied result");

    Ok(target)
}
