//! Run one try-on against the public IDM-VTON Space using the library API.
//!
//! ```sh
//! HF_TOKEN=hf_... cargo run --example tryon -- person.jpg https://example.com/shirt.jpg
//! ```

use idm_vton::config::hf_token_from_env;
use idm_vton::{GradioClient, TryOnConfig, TryOnParams, TryOnRequest, VirtualTryOn};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(user), Some(garment)) = (args.next(), args.next()) else {
        eprintln!("Usage: tryon <user_image> <garment_image>");
        std::process::exit(1);
    };

    let http = reqwest::Client::new();
    let token = hf_token_from_env();

    // Check the Space is reachable before uploading anything
    let client = GradioClient::connect(
        http.clone(),
        idm_vton::config::DEFAULT_SPACE,
        idm_vton::config::DEFAULT_HUB_ENDPOINT,
        token.clone(),
    )
    .await?;
    println!("Space host: {}", client.info().host);

    let config = TryOnConfig::builder()
        .with_hf_token(token)
        .with_params(TryOnParams::default().denoise_steps(40).seed(7))
        .build();
    let tryon = VirtualTryOn::new(http, config);

    let envelope = tryon
        .run(&TryOnRequest::new(user, garment, "upper_body"))
        .await;
    println!("{}", envelope.to_json());

    Ok(())
}
