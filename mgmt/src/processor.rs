// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Serialized application of configuration batches.
//!
//! Northbound front ends hand modification batches to the [`ConfigService`];
//! a dedicated processor thread owns the [`WriterRegistry`] and applies one
//! batch at a time, so at most one `update` ever runs against the device.
//! Once a batch starts it runs to completion (applied or reverted); there is
//! no mid-batch cancellation. Reads bypass the processor and query the
//! shared [`ReaderRegistry`] directly.

use derive_builder::Builder;
use model::{DataObject, Identifier, ModificationBatch};
use std::io::Error;
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error as ThisError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};
use translate::{ReadError, ReaderRegistry, WriteError, WriterRegistry};

/// The reasons a batch submission may fail
#[derive(Debug, ThisError)]
pub enum ProcessorError {
    #[error("Configuration processor has terminated")]
    Terminated,
    #[error(transparent)]
    Write(#[from] WriteError),
}

enum ConfigRequest {
    Apply {
        batch: ModificationBatch,
        reply: oneshot::Sender<Result<(), WriteError>>,
    },
}

/// Parameters of the configuration processor.
#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct ProcessorParams {
    pub writers: WriterRegistry,
    pub readers: Arc<ReaderRegistry>,
    #[builder(default = 64)]
    pub channel_depth: usize,
}

/// Cloneable handle to the running processor.
#[derive(Clone)]
pub struct ConfigService {
    tx: mpsc::Sender<ConfigRequest>,
    readers: Arc<ReaderRegistry>,
}

impl ConfigService {
    /// Apply one batch as a unit. Resolves once the batch has been fully
    /// applied or fully reverted.
    pub async fn apply(&self, batch: ModificationBatch) -> Result<(), ProcessorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ConfigRequest::Apply {
                batch,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ProcessorError::Terminated)?;
        reply_rx.await.map_err(|_| ProcessorError::Terminated)??;
        Ok(())
    }

    /// Current state of one node.
    pub fn read(&self, id: &Identifier) -> Result<Option<DataObject>, ReadError> {
        self.readers.read(id)
    }

    /// Current state of all entries of a wildcarded list.
    pub fn read_list(&self, id: &Identifier) -> Result<Vec<DataObject>, ReadError> {
        self.readers.read_list(id)
    }

    /// Current state of the whole tree.
    pub fn read_all(&self) -> Result<Vec<DataObject>, ReadError> {
        self.readers.read_all()
    }
}

/// Start the configuration processor thread.
pub fn start_processor(params: ProcessorParams) -> Result<(ConfigService, JoinHandle<()>), Error> {
    debug!("Starting configuration processor...");
    let ProcessorParams {
        writers,
        readers,
        channel_depth,
    } = params;
    let (tx, mut rx) = mpsc::channel(channel_depth);
    let service = ConfigService { tx, readers };

    let handle = std::thread::Builder::new()
        .name("config-processor".to_string())
        .spawn(move || {
            /* create runtime */
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .expect("Tokio runtime creation failed");

            rt.block_on(async move {
                let mut writers = writers;
                info!("Configuration processor started");
                while let Some(request) = rx.recv().await {
                    match request {
                        ConfigRequest::Apply { batch, reply } => {
                            debug!("Applying batch of {} modification(s)...", batch.len());
                            let result = writers.update(&batch);
                            match &result {
                                Ok(()) => info!("Successfully applied batch"),
                                Err(err) => error!("Failed to apply batch: {err}"),
                            }
                            /* the submitter may have given up waiting */
                            let _ = reply.send(result);
                        }
                    }
                }
                info!("Configuration processor terminated");
            });
        })?;
    Ok((service, handle))
}
