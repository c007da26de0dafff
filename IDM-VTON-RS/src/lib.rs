//! # idm-vton
//!
//! Virtual try-on through the hosted [IDM-VTON](https://huggingface.co/spaces/yisol/IDM-VTON)
//! Gradio Space.
//!
//! Takes a person photo and a garment photo (URLs or local paths), uploads
//! both to the Space, runs its `/tryon` endpoint once, and reports the
//! composited image as a JSON [`Envelope`]. The model runs remotely. This
//! crate only moves files and shapes the result.
//!
//! ## Features
//!
//! - **Image resolution**: URLs are downloaded to fixed scratch files and
//!   local paths pass straight through
//! - **Typed Gradio client**: Space host lookup, `/upload`, the `/call`
//!   event stream, and output download
//! - **Tagged outputs**: [`TryOnOutput`] separates result-only from
//!   result-plus-mask replies
//! - **Quota detection**: GPU quota refusals get their own
//!   `QUOTA_EXCEEDED` envelope, with configurable match patterns
//!
//! ## Quick Start
//!
//! ```no_run
//! use idm_vton::{TryOnConfig, TryOnRequest, VirtualTryOn};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TryOnConfig::builder()
//!         .with_hf_token(idm_vton::config::hf_token_from_env())
//!         .build();
//!     let tryon = VirtualTryOn::new(reqwest::Client::new(), config);
//!
//!     let envelope = tryon
//!         .run(&TryOnRequest::new("person.jpg", "https://example.com/shirt.jpg", "upper_body"))
//!         .await;
//!
//!     println!("{}", envelope.to_json());
//!     std::process::exit(envelope.exit_code());
//! }
//! ```

pub mod backend;
pub mod classify;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod request;
pub mod source;
pub mod tryon;
pub mod types;

pub use backend::{GradioBackend, TryOnBackend};
pub use classify::QuotaMatcher;
pub use client::GradioClient;
pub use config::{TryOnConfig, TryOnConfigBuilder};
pub use envelope::Envelope;
pub use error::{GradioError, TryOnError};
pub use request::{TryOnOutput, TryOnParams, TryOnRequest};
pub use source::{resolve_image, ImageSource};
pub use tryon::VirtualTryOn;
pub use types::{FileData, SpaceInfo};
