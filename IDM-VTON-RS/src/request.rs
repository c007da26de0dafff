use serde_json::{json, Value};

use crate::error::TryOnError;
use crate::types::FileData;

/// What the caller asked for: two image references and a garment category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryOnRequest {
    pub user_image: String,
    pub garment_image: String,
    /// `upper_body`, `lower_body` or `dresses`. Logged only; the `/tryon`
    /// endpoint takes no category input.
    pub category: String,
}

impl TryOnRequest {
    pub fn new(
        user_image: impl Into<String>,
        garment_image: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            user_image: user_image.into(),
            garment_image: garment_image.into(),
            category: category.into(),
        }
    }
}

/// Fixed inputs sent alongside the two images to IDM-VTON's `/tryon`.
///
/// # Example
/// ```
/// use idm_vton::{FileData, TryOnParams};
///
/// let params = TryOnParams::default().denoise_steps(40);
/// let data = params.payload(&FileData::new("/tmp/u.jpg"), &FileData::new("/tmp/g.jpg"));
///
/// assert_eq!(data.len(), 7);
/// assert_eq!(data[5], 40);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TryOnParams {
    pub api_name: String,
    pub garment_description: String,
    pub auto_mask: bool,
    pub auto_crop: bool,
    pub denoise_steps: u32,
    pub seed: i64,
}

impl Default for TryOnParams {
    fn default() -> Self {
        Self {
            api_name: "/tryon".to_string(),
            garment_description: String::new(),
            auto_mask: true,
            auto_crop: false,
            denoise_steps: 30,
            seed: 42,
        }
    }
}

impl TryOnParams {
    /// Set the endpoint name.
    pub fn api_name(mut self, name: impl Into<String>) -> Self {
        self.api_name = name.into();
        self
    }

    /// Set the free-text garment description.
    pub fn garment_description(mut self, text: impl Into<String>) -> Self {
        self.garment_description = text.into();
        self
    }

    /// Let the Space segment the garment region itself.
    pub fn auto_mask(mut self, enabled: bool) -> Self {
        self.auto_mask = enabled;
        self
    }

    /// Let the Space crop the person image before synthesis.
    pub fn auto_crop(mut self, enabled: bool) -> Self {
        self.auto_crop = enabled;
        self
    }

    pub fn denoise_steps(mut self, steps: u32) -> Self {
        self.denoise_steps = steps;
        self
    }

    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the positional `data` array for the prediction.
    ///
    /// The person image goes in as an ImageEditor value with no layers; the
    /// rest follow the endpoint's parameter order.
    pub fn payload(&self, user: &FileData, garment: &FileData) -> Vec<Value> {
        vec![
            json!({
                "background": user,
                "layers": [],
                "composite": null,
            }),
            json!(garment),
            json!(self.garment_description),
            json!(self.auto_mask),
            json!(self.auto_crop),
            json!(self.denoise_steps),
            json!(self.seed),
        ]
    }
}

/// Artifacts returned by a completed try-on.
#[derive(Debug, Clone, PartialEq)]
pub enum TryOnOutput {
    /// Just the composited image.
    Single(FileData),
    /// The composited image plus the garment mask the Space used.
    WithMask { result: FileData, mask: FileData },
}

impl TryOnOutput {
    /// Interpret the outputs of a `complete` event.
    ///
    /// One output is a [`TryOnOutput::Single`]. Two or more give
    /// [`TryOnOutput::WithMask`], with anything past the mask ignored. If the
    /// mask slot holds no file, the result still comes back as `Single`.
    pub fn from_outputs(outputs: &[Value]) -> Result<Self, TryOnError> {
        let first = outputs
            .first()
            .ok_or_else(|| TryOnError::InvalidOutput("no outputs".into()))?;
        let result = FileData::from_value(first)
            .ok_or_else(|| TryOnError::InvalidOutput(first.to_string()))?;

        match outputs.get(1).and_then(FileData::from_value) {
            Some(mask) => Ok(TryOnOutput::WithMask { result, mask }),
            None => Ok(TryOnOutput::Single(result)),
        }
    }

    /// The composited image, whichever shape the output had.
    pub fn primary(&self) -> &FileData {
        match self {
            TryOnOutput::Single(result) | TryOnOutput::WithMask { result, .. } => result,
        }
    }

    pub fn mask(&self) -> Option<&FileData> {
        match self {
            TryOnOutput::Single(_) => None,
            TryOnOutput::WithMask { mask, .. } => Some(mask),
        }
    }

    pub fn into_primary(self) -> FileData {
        match self {
            TryOnOutput::Single(result) | TryOnOutput::WithMask { result, .. } => result,
        }
    }

    /// Repoint the primary artifact, e.g. at a downloaded local copy.
    pub fn with_primary_path(mut self, path: impl Into<String>) -> Self {
        match &mut self {
            TryOnOutput::Single(result) | TryOnOutput::WithMask { result, .. } => {
                result.path = path.into();
                result.url = None;
            }
        }
        self
    }
}
