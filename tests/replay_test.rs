mod common;

use common::*;
use perpindex::chain::MockChainReader;
use perpindex::config::ProjectorConfig;
use perpindex::domain::{Block, Side};
use perpindex::events::{ChainRecord, EventKind, LogEvent, PoolAdded};
use perpindex::{Projector, ReplayReport, Replayer, Repository};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn log_line(address: perpindex::Address, ts: i64, log_index: i64, kind: EventKind) -> String {
    serde_json::to_string(&ChainRecord::Log(LogEvent {
        meta: meta(address, ts, log_index),
        kind,
    }))
    .unwrap()
}

fn block_line(number: i64) -> String {
    serde_json::to_string(&ChainRecord::Block(Block {
        hash: format!("0xblock{}", number),
        parent_hash: "0xparent".to_string(),
        uncles_hash: "0x00".to_string(),
        author: "0xminer".to_string(),
        state_root: "0xs".to_string(),
        transactions_root: "0xt".to_string(),
        receipts_root: "0xr".to_string(),
        number,
        gas_used: amt(0),
        gas_limit: amt(0),
        timestamp: T0,
        difficulty: amt(0),
        total_difficulty: amt(0),
        size: None,
    }))
    .unwrap()
}

fn write_stream(dir: &TempDir) -> PathBuf {
    let increase_line = log_line(pool(), T0 + 10, 0, increase('5', Side::Long, 1000, 5));
    let lines = [
        log_line(
            order_manager(),
            T0,
            0,
            EventKind::PoolAdded(PoolAdded { pool: pool() }),
        ),
        block_line(1000),
        increase_line.clone(),
        increase_line,
        "{not json".to_string(),
        String::new(),
        log_line(addr('b'), T0 + 20, 0, increase('6', Side::Long, 1000, 5)),
    ];
    let path = dir.path().join("events.ndjson");
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

async fn replay(repo: &Arc<Repository>, path: &Path, dedupe: bool) -> ReplayReport {
    let projector = Projector::restore(
        repo.clone(),
        Arc::new(MockChainReader::new()),
        ProjectorConfig::default(),
    )
    .await
    .unwrap();
    let mut replayer = Replayer::new(projector, repo.clone(), dedupe);
    replayer.replay_file(path).await.unwrap()
}

#[tokio::test]
async fn test_replay_with_dedupe() {
    let (repo, dir) = setup_repo().await;
    let path = write_stream(&dir);

    let report = replay(&repo, &path, true).await;
    assert_eq!(
        report,
        ReplayReport {
            blocks: 1,
            logs: 2,
            ignored: 1,
            skipped_duplicates: 1,
            skipped_malformed: 1,
        }
    );
    let pool_row = repo.load_pool(&pool()).await.unwrap().unwrap();
    assert_eq!(pool_row.total_volume, amt(1000));
    assert!(repo.load_block("0xblock1000").await.unwrap().is_some());
}

#[tokio::test]
async fn test_second_replay_skips_everything_seen() {
    let (repo, dir) = setup_repo().await;
    let path = write_stream(&dir);
    replay(&repo, &path, true).await;

    let report = replay(&repo, &path, true).await;
    assert_eq!(report.blocks, 0);
    assert_eq!(report.logs, 0);
    assert_eq!(report.skipped_duplicates, 5);
    let pool_row = repo.load_pool(&pool()).await.unwrap().unwrap();
    assert_eq!(pool_row.total_volume, amt(1000));
}

#[tokio::test]
async fn test_replay_without_dedupe_applies_duplicates() {
    let (repo, dir) = setup_repo().await;
    let path = write_stream(&dir);

    let report = replay(&repo, &path, false).await;
    assert_eq!(report.logs, 3);
    assert_eq!(report.skipped_duplicates, 0);
    let pool_row = repo.load_pool(&pool()).await.unwrap().unwrap();
    assert_eq!(pool_row.total_volume, amt(2000));
}

#[tokio::test]
async fn test_restore_registers_stored_pools() {
    let (repo, dir) = setup_repo().await;
    let path = write_stream(&dir);
    replay(&repo, &path, true).await;

    let mut projector = Projector::restore(
        repo.clone(),
        Arc::new(MockChainReader::new()),
        ProjectorConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(projector.registry().pool_count(), 1);

    let log = LogEvent {
        meta: meta(pool(), T0 + 30, 0),
        kind: increase('5', Side::Long, 500, 1),
    };
    assert!(projector.process(&log).await.unwrap());
    let pool_row = repo.load_pool(&pool()).await.unwrap().unwrap();
    assert_eq!(pool_row.total_volume, amt(1500));
}

#[tokio::test]
async fn test_missing_stream_file_is_an_error() {
    let (repo, dir) = setup_repo().await;
    let projector = Projector::new(
        repo.clone(),
        Arc::new(MockChainReader::new()),
        ProjectorConfig::default(),
    );
    let mut replayer = Replayer::new(projector, repo, true);
    let result = replayer
        .replay_file(&dir.path().join("missing.ndjson"))
        .await;
    assert!(result.is_err());
}
