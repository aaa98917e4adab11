//! Resolves a button index against its group descriptor file

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::{enforce_length_conformity, GroupDescriptor, OscCommand};
use crate::error::ResolveError;

/// Everything a button needs from its descriptor entry, ready to display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedButton {
    pub title: String,
    pub image_url: String,
    pub image_url_pressed: String,
    pub scripts: Vec<String>,
    pub script_cmds: Vec<String>,
    pub osc_commands: Vec<OscCommand>,
    pub delays: Vec<u64>,
}

/// Reads descriptor files and materializes button records
#[derive(Debug, Clone)]
pub struct DescriptorResolver {
    default_delay_ms: u64,
}

impl DescriptorResolver {
    pub fn new(default_delay_ms: u64) -> Self {
        Self { default_delay_ms }
    }

    /// Resolve button `index` of `descriptor_file`.
    ///
    /// The file is re-read on every call. Indices past the end of `files`
    /// resolve to an all-defaults button. Image problems are logged and
    /// produce an empty image; only descriptor problems are errors.
    pub async fn resolve(
        &self,
        descriptor_file: &Path,
        index: usize,
    ) -> Result<ResolvedButton, ResolveError> {
        let descriptor = read_descriptor(descriptor_file).await?;
        let record = descriptor.record(index);

        let image_url = image_data_url(record.image.as_deref().unwrap_or(""), descriptor_file).await;
        let image_url_pressed =
            image_data_url(record.image_pressed.as_deref().unwrap_or(""), descriptor_file).await;

        let mut delays = record.delays;
        enforce_length_conformity(&record.script, &mut delays, self.default_delay_ms);
        enforce_length_conformity(&record.script_cmd, &mut delays, self.default_delay_ms);
        enforce_length_conformity(&record.osc_commands, &mut delays, self.default_delay_ms);

        debug!(
            "Resolved {:?}[{}]: {} scripts, {} inline, {} osc, {} delays",
            descriptor_file,
            index,
            record.script.len(),
            record.script_cmd.len(),
            record.osc_commands.len(),
            delays.len()
        );

        Ok(ResolvedButton {
            title: record.title.unwrap_or_else(|| format!("button {}", index + 1)),
            image_url,
            image_url_pressed,
            scripts: record.script,
            script_cmds: record.script_cmd,
            osc_commands: record.osc_commands,
            delays,
        })
    }
}

async fn read_descriptor(path: &Path) -> Result<GroupDescriptor, ResolveError> {
    let unavailable = |source| ResolveError::Unavailable {
        path: path.to_path_buf(),
        source,
    };

    fs::metadata(path).await.map_err(unavailable)?;
    let data = fs::read_to_string(path).await.map_err(unavailable)?;

    serde_json::from_str(&data).map_err(|source| ResolveError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Path of an image referenced from a descriptor. Relative paths start at
/// the descriptor's directory; absolute ones replace it.
fn image_path(image: &str, descriptor_file: &Path) -> PathBuf {
    match descriptor_file.parent() {
        Some(dir) => dir.join(image),
        None => PathBuf::from(image),
    }
}

/// Embed an image file as a `data:` URL.
///
/// An empty path yields an empty string without touching the filesystem.
/// Missing or unreadable files are logged and also yield an empty string.
pub async fn image_data_url(image: &str, descriptor_file: &Path) -> String {
    if image.is_empty() {
        return String::new();
    }

    let path = image_path(image, descriptor_file);
    match fs::read(&path).await {
        Ok(bytes) => format!(
            "data:{};base64,{}",
            image_mime_type(&path, &bytes),
            STANDARD.encode(&bytes)
        ),
        Err(e) => {
            warn!("Image {:?} unavailable: {}", path, e);
            String::new()
        }
    }
}

/// MIME type from the image content, then the extension, then PNG
fn image_mime_type(path: &Path, bytes: &[u8]) -> String {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type().to_string();
    }

    mime_guess::from_path(path)
        .first()
        .filter(|mime| mime.type_() == mime_guess::mime::IMAGE)
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| "image/png".to_string())
}
