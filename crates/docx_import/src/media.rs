//! Media inliner
//!
//! Turns embedded package media into `data:` URIs so the imported markup
//! is self-contained. Failures are per asset and never abort an import.

use crate::error::AssetInlineFailure;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

/// Class put on placeholder images for assets that failed to inline
pub const PLACEHOLDER_CLASS: &str = "docx-image-missing";

/// 1x1 transparent GIF
const PLACEHOLDER_GIF_BASE64: &str = "R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

/// Data URI of the placeholder image
pub fn placeholder_data_uri() -> String {
    InlineResource {
        mime_type: "image/gif".to_string(),
        base64_payload: PLACEHOLDER_GIF_BASE64.to_string(),
    }
    .to_data_uri()
}

/// An embedded binary found in the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    /// Part path inside the package, e.g. `word/media/image1.png`
    pub original_ref: String,
    /// Type declared by `[Content_Types].xml`, if any
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl MediaAsset {
    pub fn new(original_ref: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            original_ref: original_ref.into(),
            content_type,
            bytes,
        }
    }
}

/// An asset ready to embed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineResource {
    pub mime_type: String,
    pub base64_payload: String,
}

impl InlineResource {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_payload)
    }
}

/// Raster formats recognized by signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    WebP,
}

impl RasterFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
            RasterFormat::Gif => "image/gif",
            RasterFormat::Bmp => "image/bmp",
            RasterFormat::Tiff => "image/tiff",
            RasterFormat::WebP => "image/webp",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(RasterFormat::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(RasterFormat::Jpeg),
            "image/gif" => Some(RasterFormat::Gif),
            "image/bmp" | "image/x-bmp" | "image/x-ms-bmp" => Some(RasterFormat::Bmp),
            "image/tiff" | "image/tif" => Some(RasterFormat::Tiff),
            "image/webp" => Some(RasterFormat::WebP),
            _ => None,
        }
    }

    /// Detect the format from the leading bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(RasterFormat::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(RasterFormat::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(RasterFormat::Gif)
        } else if bytes.starts_with(b"BM") && bytes.len() > 14 {
            Some(RasterFormat::Bmp)
        } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
            Some(RasterFormat::Tiff)
        } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
            Some(RasterFormat::WebP)
        } else {
            None
        }
    }
}

/// MIME type implied by a file extension
pub fn mime_from_extension(path: &str) -> Option<&'static str> {
    let (_, ext) = path.rsplit_once('.')?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => return None,
    };
    Some(mime)
}

/// Converts media assets to inline resources
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaInliner;

impl MediaInliner {
    pub fn new() -> Self {
        Self
    }

    /// Inline one asset.
    ///
    /// The declared type comes from the package, then the file extension.
    /// A declared raster type must agree with the bytes; other image types
    /// are taken as declared. With nothing usable declared, the bytes are
    /// sniffed.
    pub fn inline(&self, asset: &MediaAsset) -> Result<InlineResource, AssetInlineFailure> {
        if asset.bytes.is_empty() {
            return Err(AssetInlineFailure::Empty(asset.original_ref.clone()));
        }

        let declared = asset
            .content_type
            .as_deref()
            .filter(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
            .map(str::to_string)
            .or_else(|| mime_from_extension(&asset.original_ref).map(str::to_string));
        let sniffed = RasterFormat::sniff(&asset.bytes);

        let mime_type = match declared {
            Some(declared) => match RasterFormat::from_mime(&declared) {
                Some(format) if sniffed == Some(format) => format.mime_type().to_string(),
                Some(_) => {
                    return Err(AssetInlineFailure::SignatureMismatch {
                        reference: asset.original_ref.clone(),
                        declared,
                    })
                }
                None => declared.trim().to_ascii_lowercase(),
            },
            None => match sniffed {
                Some(format) => format.mime_type().to_string(),
                None => return Err(AssetInlineFailure::UnknownType(asset.original_ref.clone())),
            },
        };

        Ok(InlineResource {
            mime_type,
            base64_payload: STANDARD.encode(&asset.bytes),
        })
    }

    /// Inline every asset concurrently on the blocking pool.
    ///
    /// Results come back in input order, one per asset.
    pub async fn inline_all(
        &self,
        assets: Vec<MediaAsset>,
    ) -> Vec<Result<InlineResource, AssetInlineFailure>> {
        let mut results: Vec<Result<InlineResource, AssetInlineFailure>> = assets
            .iter()
            .map(|asset| {
                Err(AssetInlineFailure::Unreadable {
                    reference: asset.original_ref.clone(),
                    reason: "inlining task did not complete".to_string(),
                })
            })
            .collect();

        let mut tasks = JoinSet::new();
        for (index, asset) in assets.into_iter().enumerate() {
            let inliner = *self;
            tasks.spawn_blocking(move || (index, inliner.inline(&asset)));
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = result,
                Err(e) => tracing::warn!("Media inlining task failed: {}", e),
            }
        }
        results
    }
}
