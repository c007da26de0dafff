//! `virtual-tryon <user_image> <garment_image> <category>`
//!
//! Prints exactly one JSON envelope on stdout and exits 0 on success, 1 on
//! any failure. Logs go to stderr (`RUST_LOG`, default `warn`).

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use idm_vton::config::{hf_token_from_env, DEFAULT_HUB_ENDPOINT, DEFAULT_SPACE, DEFAULT_TEMP_DIR};
use idm_vton::{Envelope, TryOnConfig, TryOnRequest, VirtualTryOn};

const PROGRAM: &str = env!("CARGO_BIN_NAME");

#[derive(Parser, Debug)]
#[command(
    name = "virtual-tryon",
    version,
    about = "Virtual try-on via the hosted IDM-VTON Space",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// Person photo, URL or local path
    #[arg(allow_hyphen_values = true)]
    user_image: String,

    /// Garment photo, URL or local path
    #[arg(allow_hyphen_values = true)]
    garment_image: String,

    /// Garment category (upper_body, lower_body, dresses)
    #[arg(allow_hyphen_values = true)]
    category: String,

    /// Space id or direct Gradio app URL
    #[arg(long, env = "VTON_SPACE", default_value = DEFAULT_SPACE)]
    space: String,

    /// Hub API base used to resolve the Space host
    #[arg(long, env = "VTON_HUB_ENDPOINT", default_value = DEFAULT_HUB_ENDPOINT)]
    hub_endpoint: String,

    /// Scratch directory for inputs and fetched outputs
    #[arg(long, env = "VTON_TEMP_DIR", default_value = DEFAULT_TEMP_DIR)]
    temp_dir: PathBuf,

    /// Copy the result here under a unique name and report that path
    #[arg(long, env = "VTON_RESULT_DIR")]
    result_dir: Option<PathBuf>,

    /// Give up on the prediction after this many seconds
    #[arg(long = "timeout", env = "VTON_PREDICT_TIMEOUT")]
    timeout_secs: Option<u64>,

    /// Extra substring that marks an error as a GPU quota refusal
    #[arg(long = "quota-pattern")]
    quota_patterns: Vec<String>,
}

impl Cli {
    fn config(&self) -> TryOnConfig {
        TryOnConfig::builder()
            .with_space(&self.space)
            .with_hub_endpoint(&self.hub_endpoint)
            .with_temp_dir(&self.temp_dir)
            .with_result_dir(self.result_dir.clone())
            .with_predict_timeout(self.timeout_secs.map(Duration::from_secs))
            .with_hf_token(hf_token_from_env())
            .with_quota_patterns(self.quota_patterns.iter().cloned())
            .build()
    }

    fn request(&self) -> TryOnRequest {
        TryOnRequest::new(&self.user_image, &self.garment_image, &self.category)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    // Every parse failure, `--help` included, answers with the usage envelope.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            tracing::debug!(error = %e, "rejected arguments");
            finish(Envelope::usage(PROGRAM));
        }
    };

    let http = match reqwest::Client::builder().build() {
        Ok(http) => http,
        Err(e) => finish(Envelope::unavailable(format!("HTTP client unavailable: {}", e))),
    };

    let tryon = VirtualTryOn::new(http, cli.config());
    let envelope = tryon.run(&cli.request()).await;
    finish(envelope);
}

fn finish(envelope: Envelope) -> ! {
    println!("{}", envelope.to_json());
    process::exit(envelope.exit_code());
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
