//! Import a package in the background and edit it through a session

use doc_model::{Position, Selection, TextDirection};
use docx_import::DocumentImporter;
use edit_engine::ToolbarAction;
use session::{EditorSettings, ImportHandle, SessionRegistry, SettingsManager};
use std::io::{Cursor, Write};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Lease Agreement</w:t></w:r></w:p>
    <w:p><w:r><w:t>The Tenant agrees.</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

fn docx() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/document.xml", DOCUMENT),
    ] {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_import_then_edit() {
    let settings = EditorSettings::default();
    let importer = DocumentImporter::new(settings.import.to_options());
    let output = ImportHandle::spawn(importer, docx()).join().await.unwrap();

    let registry = SessionRegistry::new(settings.editing);
    let session = registry.open("Lease", output).await;
    assert!(session.diagnostics().is_empty());
    assert_eq!(session.snapshot().word_count, 5);

    let mut updates = session.subscribe();
    session
        .set_selection(Selection::new(
            Position::new(vec![1], 0),
            Position::new(vec![1], 3),
        ))
        .await
        .unwrap();
    assert!(session
        .execute_action(&ToolbarAction::ToggleUnderline)
        .await
        .unwrap());

    updates.changed().await.unwrap();
    let snapshot = updates.borrow().clone();
    assert!(snapshot.markup.starts_with("<div class=\"docx-content\" dir=\"rtl\""));
    assert!(snapshot.markup.contains("<p><u>The</u> Tenant agrees.</p>"));
    assert!(snapshot.can_undo);

    assert!(session.undo().await);
    assert!(session.snapshot().markup.contains("<p>The Tenant agrees.</p>"));
}

#[tokio::test]
async fn test_settings_file_drives_import() {
    let dir = TempDir::new().unwrap();
    let mut manager = SettingsManager::new(dir.path());
    let mut settings = EditorSettings::default();
    settings.import.direction = Some(TextDirection::Ltr);
    settings.import.typography = None;
    manager.update(settings).await.unwrap();

    let mut reloaded = SettingsManager::new(dir.path());
    let settings = reloaded.load().await.unwrap().clone();
    let importer = DocumentImporter::new(settings.import.to_options());
    let output = ImportHandle::spawn(importer, docx()).join().await.unwrap();

    assert!(output
        .markup
        .starts_with("<div class=\"docx-content\" dir=\"ltr\"><p>Lease Agreement</p>"));
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let registry = SessionRegistry::default();
    let first = registry.open_markup("First", "<p>Alpha</p>").await.unwrap();
    let second = registry.open_markup("Second", "<p>Beta</p>").await.unwrap();
    assert_ne!(first.id(), second.id());

    first
        .set_selection(Selection::new(
            Position::new(vec![0], 0),
            Position::new(vec![0], 5),
        ))
        .await
        .unwrap();
    first.execute_action(&ToolbarAction::ToggleBold).await.unwrap();

    assert_eq!(first.snapshot().markup, "<p><strong>Alpha</strong></p>");
    assert_eq!(second.snapshot().markup, "<p>Beta</p>");
    assert_eq!(registry.len().await, 2);
}
