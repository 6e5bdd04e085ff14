//! Background sorter actor.
//!
//! The render loop posts self-contained jobs and polls for results; it never
//! waits on the worker. Superseded results are dropped by the driver via the
//! request id, so the worker itself has no cancellation protocol.

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::order::{sort_by_depth, SortError};

/// A sort job posted by the render driver.
///
/// Centroids are immutable for the scene's lifetime and shared by handle;
/// everything else is owned by the message.
#[derive(Clone, Debug)]
pub struct SortRequest {
    pub num_triangles: u32,
    /// `3 * num_triangles` floats.
    pub centers: Arc<[f32]>,
    /// Column-major model-view matrix.
    pub view_matrix: [f32; 16],
    pub request_id: u32,
}

/// A completed (or failed) sort, tagged with the request that produced it.
#[derive(Debug)]
pub struct SortResponse {
    pub request_id: u32,
    pub result: Result<Vec<u32>, SortError>,
}

/// Handle to the sorter thread. Dropping it shuts the thread down.
pub struct SortWorker {
    requests: Option<Sender<SortRequest>>,
    responses: Receiver<SortResponse>,
    thread: Option<JoinHandle<()>>,
}

impl SortWorker {
    pub fn spawn() -> io::Result<Self> {
        let (request_tx, request_rx) = unbounded::<SortRequest>();
        let (response_tx, response_rx) = unbounded();

        let thread = std::thread::Builder::new()
            .name("splat-sorter".into())
            .spawn(move || {
                while let Ok(request) = request_rx.recv() {
                    let result =
                        sort_by_depth(request.num_triangles, &request.centers, &request.view_matrix);
                    let response = SortResponse {
                        request_id: request.request_id,
                        result,
                    };
                    if response_tx.send(response).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            requests: Some(request_tx),
            responses: response_rx,
            thread: Some(thread),
        })
    }

    /// Post a job without blocking. Returns false if the worker is gone.
    pub fn submit(&self, request: SortRequest) -> bool {
        match &self.requests {
            Some(tx) => tx.send(request).is_ok(),
            None => false,
        }
    }

    /// Non-blocking poll for the next completed sort.
    pub fn try_result(&self) -> Option<SortResponse> {
        self.responses.try_recv().ok()
    }
}

impl Drop for SortWorker {
    fn drop(&mut self) {
        // Closing the request channel ends the worker's receive loop.
        self.requests.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
