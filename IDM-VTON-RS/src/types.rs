use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Reference to a file held by a Gradio server, in the shape the API
/// accepts as input and returns as output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileData {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default = "file_data_meta")]
    pub meta: Value,
}

fn file_data_meta() -> Value {
    json!({"_type": "gradio.FileData"})
}

impl FileData {
    /// Reference a server-side path with no other metadata.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: None,
            orig_name: None,
            size: None,
            mime_type: None,
            meta: file_data_meta(),
        }
    }

    /// Read a file reference out of an output value. Accepts either a
    /// `FileData` object or a bare path string.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::new(s.clone())),
            Value::Object(obj) if obj.get("path").map(Value::is_string).unwrap_or(false) => {
                serde_json::from_value(value.clone()).ok()
            }
            _ => None,
        }
    }

    /// File name to use when saving locally: the last component of
    /// `orig_name`, else of `path`, else `"output"`. Never contains a
    /// separator, so joining it onto a directory stays inside that directory.
    pub fn file_name(&self) -> String {
        self.orig_name
            .as_deref()
            .and_then(last_component)
            .or_else(|| last_component(&self.path))
            .unwrap_or("output")
            .to_string()
    }
}

fn last_component(name: &str) -> Option<&str> {
    name.rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .filter(|s| *s != "." && *s != "..")
}

/// Connection details for a running Gradio app.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceInfo {
    /// Base URL of the app, without trailing slash.
    pub host: String,
    /// Route prefix from `/config` (`/gradio_api` on Gradio 5, empty before).
    pub api_prefix: String,
    pub version: Option<String>,
}

impl SpaceInfo {
    /// Full URL for an API route, e.g. `route("/upload")`.
    pub fn route(&self, path: &str) -> String {
        format!("{}{}{}", self.host, self.api_prefix, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_data_from_string() {
        let fd = FileData::from_value(&json!("/tmp/gradio/abc/image.png")).unwrap();
        assert_eq!(fd.path, "/tmp/gradio/abc/image.png");
        assert_eq!(fd.file_name(), "image.png");
        assert_eq!(fd.meta["_type"], "gradio.FileData");
    }

    #[test]
    fn test_file_data_from_object() {
        let fd = FileData::from_value(&json!({
            "path": "/tmp/gradio/abc/image.webp",
            "url": "https://x.hf.space/file=/tmp/gradio/abc/image.webp",
            "orig_name": "result.webp",
            "size": 1024,
            "mime_type": null,
            "meta": {"_type": "gradio.FileData"}
        }))
        .unwrap();
        assert_eq!(fd.orig_name.as_deref(), Some("result.webp"));
        assert_eq!(fd.size, Some(1024));
        assert_eq!(fd.file_name(), "result.webp");
    }

    #[test]
    fn test_file_name_drops_directories() {
        let mut fd = FileData::new("/tmp/gradio/out/image.png");
        fd.orig_name = Some("../../x.png".into());
        assert_eq!(fd.file_name(), "x.png");

        fd.orig_name = Some("/abs/x.png".into());
        assert_eq!(fd.file_name(), "x.png");

        fd.orig_name = Some("..\\..\\win.png".into());
        assert_eq!(fd.file_name(), "win.png");

        fd.orig_name = Some("..".into());
        assert_eq!(fd.file_name(), "image.png");

        let fd = FileData::new("/tmp/gradio/..");
        assert_eq!(fd.file_name(), "output");
    }

    #[test]
    fn test_file_data_rejects_non_files() {
        assert!(FileData::from_value(&json!(null)).is_none());
        assert!(FileData::from_value(&json!(42)).is_none());
        assert!(FileData::from_value(&json!("")).is_none());
        assert!(FileData::from_value(&json!({"url": "x"})).is_none());
    }

    #[test]
    fn test_file_data_serializes_meta() {
        let json = serde_json::to_value(FileData::new("/tmp/a.jpg")).unwrap();
        assert_eq!(json, json!({"path": "/tmp/a.jpg", "meta": {"_type": "gradio.FileData"}}));
    }

    #[test]
    fn test_space_route() {
        let info = SpaceInfo {
            host: "https://yisol-idm-vton.hf.space".into(),
            api_prefix: "/gradio_api".into(),
            version: None,
        };
        assert_eq!(
            info.route("/upload"),
            "https://yisol-idm-vton.hf.space/gradio_api/upload"
        );
    }
}
