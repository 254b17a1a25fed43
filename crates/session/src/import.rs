//! Cancellable background import

use crate::{Result, SessionError};
use docx_import::{ConversionOutput, ConversionResult, DocumentImporter};
use tokio::task::JoinHandle;

/// A DOCX conversion running on the runtime
///
/// Nothing reaches a session until the caller joins the handle and opens one
/// from the output, so cancelling never leaves a half-imported document.
#[derive(Debug)]
pub struct ImportHandle {
    task: JoinHandle<ConversionResult<ConversionOutput>>,
}

impl ImportHandle {
    /// Start converting `bytes`. Must be called within a tokio runtime.
    pub fn spawn(importer: DocumentImporter, bytes: Vec<u8>) -> Self {
        let task = tokio::spawn(async move { importer.convert_async(bytes).await });
        Self { task }
    }

    /// Stop the conversion; a later [`join`](Self::join) reports cancellation
    pub fn cancel(&self) {
        tracing::debug!("import cancelled");
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the conversion to finish
    pub async fn join(self) -> Result<ConversionOutput> {
        match self.task.await {
            Ok(result) => Ok(result?),
            Err(e) if e.is_cancelled() => Err(SessionError::ImportCancelled),
            Err(e) => Err(SessionError::ImportTask(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bad_bytes_surface_conversion_error() {
        let handle = ImportHandle::spawn(DocumentImporter::default(), b"not a package".to_vec());
        assert!(matches!(
            handle.join().await,
            Err(SessionError::Conversion(docx_import::ConversionError::Zip(_)))
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_cancel_before_start() {
        // On a current-thread runtime the task cannot run before the abort.
        let handle = ImportHandle::spawn(DocumentImporter::default(), vec![0; 16]);
        handle.cancel();
        assert!(matches!(handle.join().await, Err(SessionError::ImportCancelled)));
    }
}
