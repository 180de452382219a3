//! Document workspace against in-memory repositories: loading composed
//! structures, editing the draft, and the save action.

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use backoffice_app::notification::{NotificationColor, NotificationContext};
use backoffice_app::repository::{FieldError, RepositoryError};
use backoffice_app::workspace::model::{ContainerType, Document};
use backoffice_app::workspace::{
    DocumentWorkspaceContext, SaveWorkspaceAction, SaveableWorkspaceContext, WorkspaceContext,
    DOCUMENT_WORKSPACE_CONTEXT, SAVE_ERRORS_CATEGORY, WORKSPACE_CONTEXT,
};
use backoffice_app::WorkspaceError;
use backoffice_core::{BooleanState, ContextRegistry, ControllerHost, Observable, State};
use backoffice_testkit::{
    cycle_types, diamond_types, document, DocumentCall, InMemoryDocumentRepository,
    InMemoryDocumentTypeRepository,
};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Notify;

fn setup(
    documents: Arc<InMemoryDocumentRepository>,
    types: Arc<InMemoryDocumentTypeRepository>,
) -> (ControllerHost, Arc<DocumentWorkspaceContext>) {
    let root = ContextRegistry::new().create_root("app");
    let workspace = DocumentWorkspaceContext::new(&root, documents, types).unwrap();
    (root, workspace)
}

#[tokio::test]
async fn test_load_fetches_each_composed_type_once() {
    let documents = InMemoryDocumentRepository::with_documents(vec![document("doc-1", "Home")]);
    let types = InMemoryDocumentTypeRepository::with_types(diamond_types());
    let (_root, workspace) = setup(documents, types.clone());

    workspace.load("doc-1").await.unwrap();

    let mut requested = types.requests();
    requested.sort();
    assert_eq!(requested, vec!["A", "B", "C", "D"]);
    assert_eq!(workspace.structure().get_document_types().len(), 4);
    assert_eq!(
        workspace
            .structure()
            .root_containers(ContainerType::Tab)
            .get_value()
            .len(),
        4
    );
    assert!(!workspace.get_is_new());
    assert_eq!(workspace.entity_key().as_deref(), Some("doc-1"));
}

#[tokio::test]
async fn test_load_terminates_on_cyclic_compositions() {
    let mut doc = document("doc-1", "Home");
    doc.content_type_key = Some("X".into());
    let documents = InMemoryDocumentRepository::with_documents(vec![doc]);
    let types = InMemoryDocumentTypeRepository::with_types(cycle_types());
    let (_root, workspace) = setup(documents, types.clone());

    workspace.load("doc-1").await.unwrap();

    assert_eq!(types.requests(), vec!["X", "Y"]);
    assert_eq!(workspace.structure().get_document_types().len(), 2);
}

#[tokio::test]
async fn test_missing_document_leaves_draft_empty() {
    let (_root, workspace) = setup(
        InMemoryDocumentRepository::new(),
        InMemoryDocumentTypeRepository::with_types(diamond_types()),
    );

    let err = workspace.load("missing").await.unwrap_err();

    assert_matches!(err, WorkspaceError::NotFound { key } if key == "missing");
    assert_eq!(workspace.get_data(), None);
}

#[tokio::test]
async fn test_name_and_property_edits_replace_by_identity() {
    let documents = InMemoryDocumentRepository::with_documents(vec![document("doc-1", "Home")]);
    let (_root, workspace) = setup(documents, InMemoryDocumentTypeRepository::with_types(diamond_types()));
    workspace.load("doc-1").await.unwrap();

    assert!(workspace.set_name("Forside", Some("da-dk"), None));
    assert!(workspace.set_name("Start", None, None));
    assert!(!workspace.set_name("Start", None, None));
    assert_eq!(workspace.name(Some("da-dk"), None).get_value().as_deref(), Some("Forside"));
    assert_eq!(workspace.variants().get_value().len(), 2);

    workspace.set_property_value("title", json!("one"), None, None);
    workspace.set_property_value("title", json!("en"), Some("en-us"), None);
    workspace.set_property_value("title", json!("two"), None, None);

    let invariant = workspace.property_values_of(None, None).get_value();
    assert_eq!(invariant.len(), 1);
    assert_eq!(invariant[0].value, json!("two"));
    assert_eq!(
        workspace
            .property_value_of_alias("title", Some("en-us"), None)
            .get_value()
            .map(|p| p.value),
        Some(json!("en"))
    );
}

#[tokio::test]
async fn test_create_rejected_by_validation_keeps_entity_new() {
    let documents = InMemoryDocumentRepository::new();
    documents.fail_create(Some(RepositoryError::Validation {
        errors: vec![FieldError::new("name", "Name is required")],
    }));
    let (_root, workspace) = setup(documents.clone(), InMemoryDocumentTypeRepository::with_types(Vec::new()));
    workspace.create_scaffold(Some("parent")).await.unwrap();
    let notifications = Arc::new(NotificationContext::new(std::time::Duration::from_secs(6)));
    let action = SaveWorkspaceAction::new(workspace.clone()).with_notifications(notifications.clone());
    assert_eq!(action.label(), "Create");

    let err = action.execute().await.unwrap_err();

    assert_matches!(err, WorkspaceError::Validation { .. });
    assert!(workspace.get_is_new());
    assert_eq!(
        workspace.validation_errors().get_value(),
        Some(vec![FieldError::new("name", "Name is required")])
    );
    let shown = notifications.get_notifications();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].color(), NotificationColor::Warning);
    assert_eq!(shown[0].data().message, "Name is required");
    assert!(notifications.get_available_fragments(Some(SAVE_ERRORS_CATEGORY)).is_empty());

    documents.fail_create(None);
    action.execute().await.unwrap();

    assert!(!workspace.get_is_new());
    assert_eq!(workspace.validation_errors().get_value(), None);
    assert_eq!(action.label(), "Save");
    assert!(documents.stored("new-document").is_some());
}

#[tokio::test]
async fn test_save_of_existing_document_updates() {
    let documents = InMemoryDocumentRepository::with_documents(vec![document("doc-1", "Home")]);
    let (_root, workspace) = setup(documents.clone(), InMemoryDocumentTypeRepository::with_types(diamond_types()));
    workspace.load("doc-1").await.unwrap();
    workspace.set_name("Welcome", None, None);

    SaveWorkspaceAction::new(workspace.clone()).execute().await.unwrap();

    assert!(documents.calls().contains(&DocumentCall::Update("doc-1".into())));
    assert_eq!(documents.stored("doc-1").unwrap().variants[0].name, "Welcome");
}

#[tokio::test]
async fn test_transport_failure_is_peeked_as_danger() {
    let documents = InMemoryDocumentRepository::with_documents(vec![document("doc-1", "Home")]);
    documents.fail_update(Some(RepositoryError::Transport {
        message: "503".into(),
    }));
    let (_root, workspace) = setup(documents, InMemoryDocumentTypeRepository::with_types(diamond_types()));
    workspace.load("doc-1").await.unwrap();
    let notifications = Arc::new(NotificationContext::new(std::time::Duration::from_secs(6)));

    let err = SaveWorkspaceAction::new(workspace.clone())
        .with_notifications(notifications.clone())
        .execute()
        .await
        .unwrap_err();

    assert_matches!(err, WorkspaceError::Repository { .. });
    let shown = notifications.get_notifications();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].color(), NotificationColor::Danger);
}

#[tokio::test]
async fn test_second_save_while_first_in_flight_is_refused() {
    let documents = InMemoryDocumentRepository::with_documents(vec![document("doc-1", "Home")]);
    let gate = Arc::new(Notify::new());
    documents.hold_writes(gate.clone());
    let (_root, workspace) = setup(documents.clone(), InMemoryDocumentTypeRepository::with_types(diamond_types()));
    workspace.load("doc-1").await.unwrap();

    let (first, second, ()) = futures::join!(workspace.save(), workspace.save(), async {
        tokio::task::yield_now().await;
        gate.notify_one();
    });

    assert_matches!(first, Ok(()));
    assert_matches!(second, Err(WorkspaceError::SaveInProgress));
    let updates = documents
        .calls()
        .into_iter()
        .filter(|c| matches!(c, DocumentCall::Update(_)))
        .count();
    assert_eq!(updates, 1);
}

#[tokio::test]
async fn test_destroyed_workspace_refuses_work() {
    let documents = InMemoryDocumentRepository::with_documents(vec![document("doc-1", "Home")]);
    let (_root, workspace) = setup(documents.clone(), InMemoryDocumentTypeRepository::with_types(diamond_types()));
    workspace.load("doc-1").await.unwrap();

    workspace.destroy();

    assert_matches!(workspace.save().await, Err(WorkspaceError::Destroyed));
    assert_matches!(workspace.load("doc-1").await, Err(WorkspaceError::Destroyed));
    assert!(!workspace.set_name("After", None, None));
    assert!(workspace.host().is_destroyed());
}

#[tokio::test]
async fn test_destroy_during_load_discards_the_response() {
    let documents = InMemoryDocumentRepository::with_documents(vec![document("doc-1", "Home")]);
    let gate = Arc::new(Notify::new());
    documents.hold_reads(gate.clone());
    let (_root, workspace) = setup(documents, InMemoryDocumentTypeRepository::with_types(diamond_types()));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _data = workspace.data().subscribe(move |d: &Option<Document>| sink.lock().push(d.is_some()));
    let new_flags = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&new_flags);
    let _is_new = workspace.is_new().subscribe(move |v: &bool| sink.lock().push(*v));

    let (loaded, ()) = futures::join!(workspace.load("doc-1"), async {
        tokio::task::yield_now().await;
        workspace.destroy();
        gate.notify_one();
    });

    assert_matches!(loaded, Err(WorkspaceError::Destroyed));
    assert_eq!(workspace.get_data(), None);
    assert_eq!(*seen.lock(), vec![false]);
    assert_eq!(*new_flags.lock(), vec![false]);
}

#[tokio::test]
async fn test_destroy_during_save_keeps_draft_unpersisted() {
    let documents = InMemoryDocumentRepository::with_documents(vec![document("doc-1", "Home")]);
    let (_root, workspace) = setup(documents.clone(), InMemoryDocumentTypeRepository::with_types(diamond_types()));
    workspace.load("doc-1").await.unwrap();
    workspace.set_name("Renamed", None, None);
    let gate = Arc::new(Notify::new());
    documents.hold_writes(gate.clone());

    let (saved, ()) = futures::join!(workspace.save(), async {
        tokio::task::yield_now().await;
        workspace.destroy();
        gate.notify_one();
    });

    assert_matches!(saved, Err(WorkspaceError::Destroyed));
    assert!(documents.calls().contains(&DocumentCall::Update("doc-1".into())));
    assert_eq!(documents.stored("doc-1").unwrap().variants[0].name, "Home");
}

#[tokio::test]
async fn test_action_finds_workspace_through_host() {
    let documents = InMemoryDocumentRepository::with_documents(vec![document("doc-1", "Home")]);
    let (_root, workspace) = setup(documents, InMemoryDocumentTypeRepository::with_types(diamond_types()));
    workspace.load("doc-1").await.unwrap();
    let footer = workspace.host().create_child("footer").unwrap();

    let action = SaveWorkspaceAction::from_host(&footer).await.unwrap();

    assert_eq!(action.label(), "Save");
    action.execute().await.unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Discriminated lookup
// ─────────────────────────────────────────────────────────────────────────────

struct MediaWorkspace {
    is_new: BooleanState,
    errors: State<Option<Vec<FieldError>>>,
}

impl WorkspaceContext for MediaWorkspace {
    fn entity_type(&self) -> &str {
        "media"
    }

    fn entity_key(&self) -> Option<String> {
        Some("media-1".into())
    }

    fn is_new(&self) -> Observable<bool> {
        self.is_new.as_observable()
    }

    fn get_is_new(&self) -> bool {
        self.is_new.get_value()
    }

    fn set_is_new(&self, is_new: bool) {
        self.is_new.set_value(is_new);
    }

    fn destroy(&self) {}
}

#[async_trait]
impl SaveableWorkspaceContext for MediaWorkspace {
    async fn save(&self) -> Result<(), WorkspaceError> {
        Ok(())
    }

    async fn create(&self) -> Result<(), WorkspaceError> {
        Ok(())
    }

    fn set_validation_errors(&self, errors: Option<Vec<FieldError>>) {
        self.errors.set_value(errors);
    }

    fn validation_errors(&self) -> Observable<Option<Vec<FieldError>>> {
        self.errors.as_observable()
    }
}

#[tokio::test]
async fn test_document_token_skips_other_workspaces() {
    let documents = InMemoryDocumentRepository::with_documents(vec![document("doc-1", "Home")]);
    let (_root, workspace) = setup(documents, InMemoryDocumentTypeRepository::with_types(diamond_types()));
    workspace.load("doc-1").await.unwrap();

    let media_host = workspace.host().create_child("media-picker").unwrap();
    let media: Arc<dyn SaveableWorkspaceContext> = Arc::new(MediaWorkspace {
        is_new: BooleanState::new(false),
        errors: State::new(None),
    });
    media_host.provide(&WORKSPACE_CONTEXT, media).unwrap();
    let editor = media_host.create_child("editor").unwrap();

    let nearest = editor.get(&WORKSPACE_CONTEXT).unwrap();
    let document_workspace = editor.get(&DOCUMENT_WORKSPACE_CONTEXT).unwrap();

    assert_eq!(nearest.entity_type(), "media");
    assert_eq!(document_workspace.entity_type(), "document");
    assert_eq!(document_workspace.entity_key().as_deref(), Some("doc-1"));
}
