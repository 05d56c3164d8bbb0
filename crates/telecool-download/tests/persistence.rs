//! Manager persistence through `JsonStateRepository`.

use std::sync::Arc;

use telecool_core::{
    NoopTransferEmitter, RateCap, SourceRef, TransferManagerConfig, TransferManagerPort,
    TransferRequest, TransferStateRepositoryPort,
};
use telecool_download::{
    FsMediaSource, JsonStateRepository, TransferManagerDeps, TransferManagerImpl,
    build_transfer_manager,
};

fn manager(library: &std::path::Path, state: &std::path::Path) -> Arc<TransferManagerImpl> {
    Arc::new(build_transfer_manager(TransferManagerDeps {
        source: Arc::new(FsMediaSource::new(library)),
        state_repo: Arc::new(JsonStateRepository::new(state)),
        emitter: Arc::new(NoopTransferEmitter::new()),
        config: TransferManagerConfig::default(),
    }))
}

#[tokio::test]
async fn completed_history_survives_restart() {
    let library = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let state_dir = tempfile::tempdir().unwrap();
    let state = state_dir.path().join("state.json");

    std::fs::create_dir_all(library.path().join("chat")).unwrap();
    std::fs::write(library.path().join("chat/11"), b"0123456789").unwrap();

    {
        let mgr = manager(library.path(), &state);
        mgr.restore().await.unwrap();
        let id = Arc::clone(&mgr)
            .enqueue(
                TransferRequest::new(SourceRef::new("chat", 11))
                    .with_display_name("notes.txt")
                    .with_destination(out.path().to_string_lossy()),
            )
            .await
            .unwrap();
        mgr.wait_for(&id).await.unwrap();
        mgr.set_rate_cap(RateCap::PRO).await.unwrap();
    }

    let mgr = manager(library.path(), &state);
    assert_eq!(mgr.restore().await.unwrap(), 1);

    let completed = mgr.list_completed().await;
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].display_name, "notes.txt");
    assert_eq!(completed[0].total_bytes, 10);

    let persisted = JsonStateRepository::new(&state).load().await.unwrap();
    assert_eq!(persisted.settings.rate_cap(), RateCap::PRO);
}

#[tokio::test]
async fn clearing_history_is_persisted() {
    let library = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let state_dir = tempfile::tempdir().unwrap();
    let state = state_dir.path().join("state.json");

    std::fs::create_dir_all(library.path().join("chat")).unwrap();
    std::fs::write(library.path().join("chat/1"), b"a").unwrap();
    std::fs::write(library.path().join("chat/2"), b"b").unwrap();

    let mgr = manager(library.path(), &state);
    for message in [1, 2] {
        let id = Arc::clone(&mgr)
            .enqueue(
                TransferRequest::new(SourceRef::new("chat", message))
                    .with_destination(out.path().to_string_lossy()),
            )
            .await
            .unwrap();
        mgr.wait_for(&id).await.unwrap();
    }
    assert!(out.path().join("file_1").exists());
    assert!(out.path().join("file_2").exists());

    let first = mgr.list_completed().await[0].id;
    mgr.remove(&first).await.unwrap();
    assert_eq!(
        JsonStateRepository::new(&state).load().await.unwrap().completed.len(),
        1
    );

    assert_eq!(mgr.clear_completed().await.unwrap(), 1);
    assert!(
        JsonStateRepository::new(&state)
            .load()
            .await
            .unwrap()
            .completed
            .is_empty()
    );
}
