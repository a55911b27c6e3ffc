//! Feeds a newline-delimited JSON stream of [`ChainRecord`]s to the projector in order.

use crate::db::Repository;
use crate::domain::Block;
use crate::events::{ChainRecord, LogEvent};
use crate::projector::{Projector, ProjectorError};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub blocks: usize,
    pub logs: usize,
    /// Logs from contracts that are not registered sources.
    pub ignored: usize,
    pub skipped_duplicates: usize,
    pub skipped_malformed: usize,
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Projector(#[from] ProjectorError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

pub struct Replayer {
    projector: Projector,
    repo: Arc<Repository>,
    dedupe: bool,
}

impl Replayer {
    /// With `dedupe` set, logs are skipped when their `<txHash>-<logIndex>` identity was
    /// already processed and blocks when their hash is already stored.
    pub fn new(projector: Projector, repo: Arc<Repository>, dedupe: bool) -> Self {
        Self {
            projector,
            repo,
            dedupe,
        }
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub async fn replay_file(&mut self, path: &Path) -> Result<ReplayReport, ReplayError> {
        let file = tokio::fs::File::open(path).await?;
        info!(path = %path.display(), dedupe = self.dedupe, "replay started");
        let report = self.replay_reader(BufReader::new(file)).await?;
        info!(
            blocks = report.blocks,
            logs = report.logs,
            ignored = report.ignored,
            skipped_duplicates = report.skipped_duplicates,
            skipped_malformed = report.skipped_malformed,
            "replay finished"
        );
        Ok(report)
    }

    pub async fn replay_reader<R>(&mut self, reader: R) -> Result<ReplayReport, ReplayError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut report = ReplayReport::default();
        let mut lines = reader.lines();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = match serde_json::from_str::<ChainRecord>(line) {
                Ok(record) => record,
                Err(e) => {
                    warn!(line = line_no, error = %e, "malformed record skipped");
                    report.skipped_malformed += 1;
                    continue;
                }
            };
            self.apply(record, &mut report).await?;
        }

        Ok(report)
    }

    pub async fn apply(
        &mut self,
        record: ChainRecord,
        report: &mut ReplayReport,
    ) -> Result<(), ReplayError> {
        match record {
            ChainRecord::Block(block) => self.apply_block(&block, report).await,
            ChainRecord::Log(log) => self.apply_log(&log, report).await,
        }
    }

    async fn apply_block(
        &mut self,
        block: &Block,
        report: &mut ReplayReport,
    ) -> Result<(), ReplayError> {
        if self.dedupe && self.repo.load_block(&block.hash).await?.is_some() {
            debug!(hash = %block.hash, number = block.number, "duplicate block skipped");
            report.skipped_duplicates += 1;
            return Ok(());
        }
        self.projector.handle_block(block).await?;
        report.blocks += 1;
        Ok(())
    }

    async fn apply_log(
        &mut self,
        log: &LogEvent,
        report: &mut ReplayReport,
    ) -> Result<(), ReplayError> {
        let event_id = log.meta.event_id();
        if self.dedupe && self.repo.is_event_processed(&event_id).await? {
            debug!(%event_id, event = log.kind.name(), "duplicate log skipped");
            report.skipped_duplicates += 1;
            return Ok(());
        }

        if self.projector.process(log).await? {
            report.logs += 1;
        } else {
            report.ignored += 1;
        }
        if self.dedupe {
            self.repo
                .mark_event_processed(&event_id, log.meta.block_number)
                .await?;
        }
        Ok(())
    }
}
