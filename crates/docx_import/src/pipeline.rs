//! Document import pipeline
//!
//! Package bytes in, document tree and envelope markup out. Reading and
//! parsing the package is blocking work; [`DocumentImporter::convert_async`]
//! moves it to the blocking pool and inlines media concurrently.

use crate::assemble::{assemble, image_references, AssemblyContext, ImageSource};
use crate::content_types::{content_type_values, ContentTypes};
use crate::diagnostics::Diagnostic;
use crate::document::{parse_body, BodyElement};
use crate::error::{AssetInlineFailure, ConversionError, ConversionResult};
use crate::media::{InlineResource, MediaAsset, MediaInliner};
use crate::numbering::Numbering;
use crate::options::ImportOptions;
use crate::reader::DocxReader;
use crate::relationships::{
    rels_path_for, relationship_types, resolve_target, Relationships, TargetMode,
};
use crate::styles::StyleNames;
use doc_model::{to_markup, DocumentTree};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Cursor;
use std::time::Instant;

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const ROOT_RELS_PART: &str = "_rels/.rels";
const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// Result of a successful conversion
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Envelope markup, ready for the editor
    pub markup: String,
    #[serde(skip)]
    pub tree: DocumentTree,
    pub diagnostics: Vec<Diagnostic>,
}

/// The original bytes, for a client-side preview
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewPayload {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Return the package unchanged, labelled with the DOCX content type
pub fn passthrough(bytes: Vec<u8>) -> PreviewPayload {
    PreviewPayload {
        content_type: content_type_values::DOCX,
        bytes,
    }
}

/// Convert with default options
pub fn convert(bytes: &[u8]) -> ConversionResult<ConversionOutput> {
    DocumentImporter::default().convert(bytes)
}

/// Convert with default options off the async runtime's worker threads
pub async fn convert_async(bytes: Vec<u8>) -> ConversionResult<ConversionOutput> {
    DocumentImporter::default().convert_async(bytes).await
}

/// Converts DOCX packages with a fixed set of options
#[derive(Debug, Clone, Default)]
pub struct DocumentImporter {
    options: ImportOptions,
    inliner: MediaInliner,
}

impl DocumentImporter {
    pub fn new(options: ImportOptions) -> Self {
        Self {
            options,
            inliner: MediaInliner::new(),
        }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Convert on the current thread
    pub fn convert(&self, bytes: &[u8]) -> ConversionResult<ConversionOutput> {
        let started = Instant::now();
        tracing::info!("Starting DOCX conversion ({} bytes)", bytes.len());

        let mut package = Package::read(bytes)?;
        let assets = package.take_assets();
        let inlined = assets.iter().map(|asset| self.inliner.inline(asset)).collect();
        self.finish(package, inlined, started)
    }

    /// Convert with package reading on the blocking pool and media inlined
    /// concurrently
    pub async fn convert_async(&self, bytes: Vec<u8>) -> ConversionResult<ConversionOutput> {
        let started = Instant::now();
        tracing::info!("Starting DOCX conversion ({} bytes)", bytes.len());

        let mut package = tokio::task::spawn_blocking(move || Package::read(&bytes))
            .await
            .map_err(|e| ConversionError::Task(e.to_string()))??;
        let assets = package.take_assets();
        let inlined = self.inliner.inline_all(assets).await;
        self.finish(package, inlined, started)
    }

    fn finish(
        &self,
        package: Package,
        inlined: Vec<Result<InlineResource, AssetInlineFailure>>,
        started: Instant,
    ) -> ConversionResult<ConversionOutput> {
        let mut diagnostics = Vec::new();
        let mut images = HashMap::new();
        let mut inlined = inlined.into_iter();

        for (rel_id, slot) in package.media {
            let result = match slot {
                MediaSlot::Linked(url) => Ok(ImageSource::Resolved(url)),
                MediaSlot::Failed(failure) => Err(failure),
                MediaSlot::Embedded(_) | MediaSlot::Taken => match inlined.next() {
                    Some(Ok(resource)) => Ok(ImageSource::Resolved(resource.to_data_uri())),
                    Some(Err(failure)) => Err(failure),
                    None => Err(AssetInlineFailure::Unreadable {
                        reference: rel_id.clone(),
                        reason: "no inlining result".to_string(),
                    }),
                },
            };
            let source = result.unwrap_or_else(|failure| {
                tracing::warn!("Image {} replaced by placeholder: {}", rel_id, failure);
                diagnostics.push(Diagnostic::asset_failure(&failure));
                ImageSource::Failed
            });
            images.insert(rel_id, source);
        }

        let (blocks, assembly_diagnostics) = assemble(
            &package.body,
            AssemblyContext {
                options: &self.options,
                styles: &package.styles,
                numbering: &package.numbering,
                rels: &package.rels,
                images: &images,
            },
        );
        diagnostics.extend(assembly_diagnostics);

        let mut tree = DocumentTree::from_blocks(blocks);
        tree.layout = self.options.layout();
        tree.validate()?;
        let markup = to_markup(&tree);

        tracing::info!(
            "DOCX conversion finished in {:?}: {} blocks, {} images, {} diagnostics",
            started.elapsed(),
            tree.blocks.len(),
            images.len(),
            diagnostics.len()
        );

        Ok(ConversionOutput {
            markup,
            tree,
            diagnostics,
        })
    }
}

// ============================================================================
// Package reading
// ============================================================================

/// An image reference and what the package holds for it
enum MediaSlot {
    Embedded(MediaAsset),
    /// Moved out for inlining; the result arrives in the same order
    Taken,
    /// External image; the URL is used as is
    Linked(String),
    Failed(AssetInlineFailure),
}

/// Everything read from the package before assembly
struct Package {
    body: Vec<BodyElement>,
    styles: StyleNames,
    numbering: Numbering,
    rels: Relationships,
    media: Vec<(String, MediaSlot)>,
}

impl Package {
    fn read(bytes: &[u8]) -> ConversionResult<Self> {
        let mut reader = DocxReader::new(Cursor::new(bytes))?;

        let content_types = ContentTypes::parse(&reader.read_file_as_string(CONTENT_TYPES_PART)?)?;
        let main_part = Self::main_part(&mut reader)?;
        if let Some(declared) = content_types.get_content_type(&main_part) {
            let is_word = [
                content_type_values::MAIN_DOCUMENT,
                content_type_values::MACRO_DOCUMENT,
                content_type_values::TEMPLATE_DOCUMENT,
            ]
            .contains(&declared);
            if !is_word {
                return Err(ConversionError::InvalidStructure(format!(
                    "main part {main_part} is {declared}, not a word-processing document"
                )));
            }
        }

        let main_xml = reader.read_file_as_string(&main_part)?;
        let rels = match reader.read_optional_string(&rels_path_for(&main_part))? {
            Some(xml) => Relationships::parse(&xml)?,
            None => Relationships::new(),
        };

        if rels.is_empty() {
            tracing::debug!("Main part {} has no relationships", main_part);
        }

        let styles = match Self::related_part(&mut reader, &rels, &main_part, relationship_types::STYLES)? {
            Some(xml) => StyleNames::parse(&xml)?,
            None => StyleNames::new(),
        };
        if styles.is_empty() {
            tracing::debug!("No paragraph or character styles; style IDs are used as names");
        }
        let numbering =
            match Self::related_part(&mut reader, &rels, &main_part, relationship_types::NUMBERING)? {
                Some(xml) => Numbering::parse(&xml)?,
                None => Numbering::new(),
            };

        let body = parse_body(&main_xml)?;
        let media = image_references(&body)
            .into_iter()
            .map(|rel_id| {
                let slot = Self::media_slot(&mut reader, &rels, &content_types, &main_part, &rel_id);
                (rel_id, slot)
            })
            .collect();

        tracing::debug!(
            "Read package: main part {}, {} relationships, {} styles",
            main_part,
            rels.len(),
            styles.len()
        );

        Ok(Self {
            body,
            styles,
            numbering,
            rels,
            media,
        })
    }

    /// Main document part named by the root relationships
    fn main_part(reader: &mut DocxReader<Cursor<&[u8]>>) -> ConversionResult<String> {
        if let Some(xml) = reader.read_optional_string(ROOT_RELS_PART)? {
            let rels = Relationships::parse(&xml)?;
            let main = rels
                .get_by_type(relationship_types::DOCUMENT)
                .or_else(|| rels.get_by_type(relationship_types::DOCUMENT_STRICT));
            if let Some(rel) = main {
                return Ok(resolve_target("", &rel.target));
            }
        }
        if reader.file_exists(DEFAULT_MAIN_PART) {
            Ok(DEFAULT_MAIN_PART.to_string())
        } else {
            Err(ConversionError::MissingPart(DEFAULT_MAIN_PART.to_string()))
        }
    }

    fn related_part(
        reader: &mut DocxReader<Cursor<&[u8]>>,
        rels: &Relationships,
        main_part: &str,
        rel_type: &str,
    ) -> ConversionResult<Option<String>> {
        match rels.get_by_type(rel_type) {
            Some(rel) => reader.read_optional_string(&resolve_target(main_part, &rel.target)),
            None => Ok(None),
        }
    }

    fn media_slot(
        reader: &mut DocxReader<Cursor<&[u8]>>,
        rels: &Relationships,
        content_types: &ContentTypes,
        main_part: &str,
        rel_id: &str,
    ) -> MediaSlot {
        let Some(rel) = rels.get(rel_id) else {
            return MediaSlot::Failed(AssetInlineFailure::Missing(rel_id.to_string()));
        };
        if rel.rel_type != relationship_types::IMAGE {
            return MediaSlot::Failed(AssetInlineFailure::Unreadable {
                reference: rel_id.to_string(),
                reason: format!("relationship points to {}, not an image", rel.target),
            });
        }
        if rel.target_mode == TargetMode::External {
            return MediaSlot::Linked(rel.target.clone());
        }

        let path = resolve_target(main_part, &rel.target);
        if !reader.file_exists(&path) {
            return MediaSlot::Failed(AssetInlineFailure::Missing(path));
        }
        match reader.read_file_as_bytes(&path) {
            Ok(bytes) => {
                let content_type = content_types.get_content_type(&path).map(str::to_string);
                MediaSlot::Embedded(MediaAsset::new(path, content_type, bytes))
            }
            Err(e) => MediaSlot::Failed(AssetInlineFailure::Unreadable {
                reference: path,
                reason: e.to_string(),
            }),
        }
    }

    /// Move embedded assets out for inlining, in slot order
    fn take_assets(&mut self) -> Vec<MediaAsset> {
        self.media
            .iter_mut()
            .filter_map(|(_, slot)| match std::mem::replace(slot, MediaSlot::Taken) {
                MediaSlot::Embedded(asset) => Some(asset),
                other => {
                    *slot = other;
                    None
                }
            })
            .collect()
    }
}
