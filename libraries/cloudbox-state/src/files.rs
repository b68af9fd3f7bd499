//! File state module: the file collection and the five file operations.
//!
//! Operations take the [`Session`] they run under. The token is captured
//! when the call starts; signing out while it is in flight does not change
//! the token it uses, so the server answers with 401 and the stale call
//! settles as an unauthorized rejection.
//!
//! Deletion is optimistic and two-phase: the record leaves the collection
//! as soon as the delete is dispatched and is tracked as a
//! [`PendingDeletion`]. A confirmed delete drops the entry; a failed one is
//! kept as [`DeletionPhase::Failed`] and the record stays out of the
//! collection until the consumer reconciles, either with
//! [`Store::fetch_all`] or [`Store::revert_failed_deletions`].

use crate::error::Rejection;
use crate::session::Session;
use crate::store::Store;
use cloudbox_client::{validate_file_type, ClientError, FileRecord, PreviewDescriptor, UploadFile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Status of one kind of operation.
///
/// Shared by every call of that kind: with two uploads in flight the first
/// to settle moves the flag out of `InFlight` while the second is still
/// running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    #[default]
    Idle,
    InFlight,
    Failed,
}

impl OperationStatus {
    pub fn is_in_flight(self) -> bool {
        self == OperationStatus::InFlight
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionPhase {
    /// Removed locally, server has not answered yet
    Tentative,
    /// Server refused; the record is still out of the collection
    Failed(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    pub record: FileRecord,
    pub phase: DeletionPhase,
}

/// File slice of the state tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileState {
    /// Ordered collection, unique by id
    pub files: Vec<FileRecord>,
    pub fetch_status: OperationStatus,
    pub upload_status: OperationStatus,
    pub delete_status: OperationStatus,
    pub error: Option<Rejection>,
    pub pending_deletions: Vec<PendingDeletion>,
}

#[derive(Debug, Clone)]
pub enum FileAction {
    FetchAllPending,
    FetchAllFulfilled(Vec<FileRecord>),
    FetchAllRejected(Rejection),
    UploadPending,
    UploadFulfilled(FileRecord),
    UploadRejected(Rejection),
    DeletePending(String),
    DeleteFulfilled(String),
    DeleteRejected { file_id: String, rejection: Rejection },
    FailedDeletionsReverted,
    DownloadRejected(Rejection),
    PreviewRejected(Rejection),
    ClearError,
    Reset,
}

impl FileState {
    pub fn contains(&self, file_id: &str) -> bool {
        self.files.iter().any(|f| f.id == file_id)
    }

    pub fn reduce(&mut self, action: FileAction) {
        match action {
            FileAction::FetchAllPending => {
                self.fetch_status = OperationStatus::InFlight;
            }
            FileAction::FetchAllFulfilled(files) => {
                self.fetch_status = OperationStatus::Idle;
                self.files = dedup_by_id(files);
                // A full refresh is the reconciliation point for failed deletes
                self.pending_deletions
                    .retain(|p| p.phase == DeletionPhase::Tentative);
            }
            FileAction::FetchAllRejected(rejection) => {
                self.fetch_status = OperationStatus::Failed;
                self.error = Some(rejection);
            }
            FileAction::UploadPending => {
                self.upload_status = OperationStatus::InFlight;
            }
            FileAction::UploadFulfilled(record) => {
                self.upload_status = OperationStatus::Idle;
                self.files.retain(|f| f.id != record.id);
                self.files.insert(0, record);
            }
            FileAction::UploadRejected(rejection) => {
                self.upload_status = OperationStatus::Failed;
                self.error = Some(rejection);
            }
            FileAction::DeletePending(file_id) => {
                self.delete_status = OperationStatus::InFlight;
                if let Some(index) = self.files.iter().position(|f| f.id == file_id) {
                    let record = self.files.remove(index);
                    self.pending_deletions.push(PendingDeletion {
                        record,
                        phase: DeletionPhase::Tentative,
                    });
                }
            }
            FileAction::DeleteFulfilled(file_id) => {
                self.delete_status = OperationStatus::Idle;
                self.pending_deletions.retain(|p| p.record.id != file_id);
            }
            FileAction::DeleteRejected { file_id, rejection } => {
                self.delete_status = OperationStatus::Failed;
                for pending in &mut self.pending_deletions {
                    if pending.record.id == file_id {
                        pending.phase = DeletionPhase::Failed(rejection.clone());
                    }
                }
                self.error = Some(rejection);
            }
            FileAction::FailedDeletionsReverted => {
                let (failed, tentative): (Vec<_>, Vec<_>) =
                    std::mem::take(&mut self.pending_deletions)
                        .into_iter()
                        .partition(|p| matches!(p.phase, DeletionPhase::Failed(_)));
                self.pending_deletions = tentative;

                for pending in failed.into_iter().rev() {
                    if !self.contains(&pending.record.id) {
                        self.files.insert(0, pending.record);
                    }
                }
            }
            FileAction::DownloadRejected(rejection) | FileAction::PreviewRejected(rejection) => {
                self.error = Some(rejection);
            }
            FileAction::ClearError => {
                self.error = None;
            }
            FileAction::Reset => {
                *self = FileState::default();
            }
        }
    }
}

fn dedup_by_id(files: Vec<FileRecord>) -> Vec<FileRecord> {
    let mut seen = HashSet::with_capacity(files.len());
    let total = files.len();
    let unique: Vec<FileRecord> = files
        .into_iter()
        .filter(|f| seen.insert(f.id.clone()))
        .collect();

    if unique.len() != total {
        warn!(
            duplicates = total - unique.len(),
            "Server returned duplicate file ids; keeping first occurrence"
        );
    }
    unique
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadOutcome {
    pub file_id: String,
    pub file_name: String,
}

impl Store {
    /// Replace the collection with the server's list.
    pub async fn fetch_all(&self, session: &Session) -> Result<Vec<FileRecord>, Rejection> {
        self.dispatch(FileAction::FetchAllPending);

        match self.client().files(Some(&session.token)).list().await {
            Ok(files) => {
                self.dispatch(FileAction::FetchAllFulfilled(files.clone()));
                Ok(files)
            }
            Err(e) => {
                let rejection = self.reject(session, e);
                self.dispatch(FileAction::FetchAllRejected(rejection.clone()));
                Err(rejection)
            }
        }
    }

    /// Upload one file and put the stored record at the front of the
    /// collection once the server confirms it.
    ///
    /// Files outside the allow-list are rejected without a request.
    pub async fn upload(
        &self,
        session: &Session,
        file: &UploadFile,
    ) -> Result<FileRecord, Rejection> {
        if let Err(e) = validate_file_type(&file.file_name, &file.mime_type) {
            let rejection = Rejection::from(e);
            self.dispatch(FileAction::UploadRejected(rejection.clone()));
            return Err(rejection);
        }

        self.dispatch(FileAction::UploadPending);

        match self.client().files(Some(&session.token)).upload(file).await {
            Ok(record) => {
                self.dispatch(FileAction::UploadFulfilled(record.clone()));
                Ok(record)
            }
            Err(e) => {
                let rejection = self.reject(session, e);
                self.dispatch(FileAction::UploadRejected(rejection.clone()));
                Err(rejection)
            }
        }
    }

    /// Upload files one after another.
    ///
    /// Each file settles on its own; a failure does not stop the rest.
    pub async fn upload_batch(
        &self,
        session: &Session,
        files: &[UploadFile],
    ) -> Vec<Result<FileRecord, Rejection>> {
        let mut results = Vec::with_capacity(files.len());

        for (index, file) in files.iter().enumerate() {
            debug!(index, total = files.len(), file = %file.file_name, "Batch upload");
            results.push(self.upload(session, file).await);
        }

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(total = files.len(), failed, "Batch upload finished");
        results
    }

    /// Remove a file, optimistically.
    ///
    /// The record leaves the collection before the request is sent and is
    /// not put back if the server refuses.
    pub async fn delete(&self, session: &Session, file_id: &str) -> Result<(), Rejection> {
        self.dispatch(FileAction::DeletePending(file_id.to_string()));

        match self.client().files(Some(&session.token)).delete(file_id).await {
            Ok(()) => {
                self.dispatch(FileAction::DeleteFulfilled(file_id.to_string()));
                info!(file_id = %file_id, "File deleted");
                Ok(())
            }
            Err(e) => {
                let rejection = self.reject(session, e);
                self.dispatch(FileAction::DeleteRejected {
                    file_id: file_id.to_string(),
                    rejection: rejection.clone(),
                });
                Err(rejection)
            }
        }
    }

    /// Put records whose deletion failed back at the front of the collection.
    pub fn revert_failed_deletions(&self) {
        self.dispatch(FileAction::FailedDeletionsReverted);
    }

    /// Download a file and hand it to the host.
    pub async fn download(
        &self,
        session: &Session,
        file_id: &str,
    ) -> Result<DownloadOutcome, Rejection> {
        let file = match self.client().files(Some(&session.token)).download(file_id).await {
            Ok(file) => file,
            Err(e) => {
                let rejection = self.reject(session, e);
                self.dispatch(FileAction::DownloadRejected(rejection.clone()));
                return Err(rejection);
            }
        };

        if let Err(e) = self.host().save_file(&file.file_name, file.contents).await {
            let rejection = Rejection::from(ClientError::Io(e));
            self.dispatch(FileAction::DownloadRejected(rejection.clone()));
            return Err(rejection);
        }

        Ok(DownloadOutcome {
            file_id: file.file_id,
            file_name: file.file_name,
        })
    }

    /// Fetch a preview descriptor and ask the host to open its URL.
    pub async fn preview(
        &self,
        session: &Session,
        file_id: &str,
    ) -> Result<PreviewDescriptor, Rejection> {
        let descriptor = match self.client().files(Some(&session.token)).preview(file_id).await {
            Ok(descriptor) => descriptor,
            Err(e) => {
                let rejection = self.reject(session, e);
                self.dispatch(FileAction::PreviewRejected(rejection.clone()));
                return Err(rejection);
            }
        };

        if let Some(url) = descriptor.url() {
            if let Err(e) = self.host().open_url(url).await {
                let rejection = Rejection::from(ClientError::Io(e));
                self.dispatch(FileAction::PreviewRejected(rejection.clone()));
                return Err(rejection);
            }
        }

        Ok(descriptor)
    }

    /// Reset the file module's error field.
    pub fn clear_error(&self) {
        self.dispatch(FileAction::ClearError);
    }
}
