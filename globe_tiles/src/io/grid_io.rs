use std::sync::Arc;

use futures::StreamExt;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use futures::future::AbortHandle;

use super::Fetch;
use super::runtime::Runtime;
use crate::grid::{Aborted, GridFetcher, GridRequest, TileGrid};

type Notify = Arc<dyn Fn() + Send + Sync>;

/// Fetches grids on a separate thread, so that a renderer can ask for them every frame
/// without blocking. Only the newest request matters, the older one gets aborted.
pub struct GridIo<F> {
    /// Grids to be fetched by the IO thread.
    request_tx: UnboundedSender<GridRequest>,

    /// Grids that got fetched.
    grid_rx: UnboundedReceiver<TileGrid>,

    fetcher: GridFetcher<F>,

    #[allow(dead_code)] // Significant Drop
    runtime: Runtime,
}

impl<F> GridIo<F>
where
    F: Fetch + Send + Sync + 'static,
{
    /// `notify` is called from the IO thread each time a grid is ready, e.g. to request
    /// a repaint.
    pub fn new(fetcher: GridFetcher<F>, notify: impl Fn() + Send + Sync + 'static) -> Self {
        let (request_tx, request_rx) = unbounded();
        let (grid_tx, grid_rx) = unbounded();

        // This will run concurrently in a loop, handing grids over via channels.
        let runtime = Runtime::new(serve_continuously(
            fetcher.clone(),
            request_rx,
            grid_tx,
            Arc::new(notify),
        ));

        Self {
            request_tx,
            grid_rx,
            fetcher,
            runtime,
        }
    }

    pub fn request(&self, request: GridRequest) {
        log::trace!("Requested grid: {request:?}");
        if let Err(e) = self.request_tx.unbounded_send(request) {
            log::error!("IO thread is dead: {e}");
        }
    }

    /// Newest grid fetched since the last call, if any.
    pub fn poll(&mut self) -> Option<TileGrid> {
        let mut newest = None;

        loop {
            match self.grid_rx.try_next() {
                Ok(Some(grid)) => newest = Some(grid),
                Ok(None) => {
                    log::error!("IO thread is dead.");
                    break;
                }
                // Nothing more was fetched.
                Err(_) => break,
            }
        }

        newest
    }

    pub fn is_loading(&self) -> bool {
        self.fetcher.is_loading()
    }
}

async fn serve_continuously<F>(
    fetcher: GridFetcher<F>,
    mut request_rx: UnboundedReceiver<GridRequest>,
    grid_tx: UnboundedSender<TileGrid>,
    notify: Notify,
) where
    F: Fetch + Send + Sync + 'static,
{
    let mut outstanding: Option<AbortHandle> = None;

    while let Some(request) = request_rx.next().await {
        if let Some(previous) = outstanding.take() {
            previous.abort();
        }

        let (handle, registration) = AbortHandle::new_pair();
        outstanding = Some(handle);

        let fetcher = fetcher.clone();
        let grid_tx = grid_tx.clone();
        let notify = Arc::clone(&notify);

        tokio::spawn(async move {
            match fetcher.tiles_abortable(&request, registration).await {
                Ok(grid) => {
                    if grid_tx.unbounded_send(grid).is_ok() {
                        notify();
                    } else {
                        log::debug!("Nobody waits for the grid anymore.");
                    }
                }
                Err(Aborted) => log::debug!("Grid request was superseded."),
            }
        });
    }

    log::debug!("Grid fetch loop finished.");
}
