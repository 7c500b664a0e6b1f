//! Dedicated thread running the IO future on a single-threaded Tokio runtime.

use std::thread::JoinHandle;

use tokio::sync::oneshot;

pub struct Runtime {
    thread: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl Runtime {
    pub fn new<F>(io: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let thread = match std::thread::Builder::new()
            .name("globe_tiles-io".to_owned())
            .spawn(move || run(io, shutdown_rx))
        {
            Ok(thread) => Some(thread),
            Err(e) => {
                log::error!("Could not spawn the IO thread, nothing will be downloaded: {e}.");
                None
            }
        };

        Self {
            thread,
            shutdown_tx: Some(shutdown_tx),
        }
    }
}

fn run<F>(io: F, shutdown_rx: oneshot::Receiver<()>)
where
    F: Future<Output = ()> + Send + 'static,
{
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Could not create the Tokio runtime, nothing will be downloaded: {e}.");
            return;
        }
    };

    runtime.spawn(io);

    // Dropped sender means the same as an explicit shutdown.
    let _ = runtime.block_on(shutdown_rx);
    log::debug!("IO runtime is shutting down.");
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            // IO thread might be dead already, nothing to do in this case.
            let _ = shutdown_tx.send(());
        }

        if let Some(thread) = self.thread.take() {
            log::debug!("Waiting for the IO thread to exit.");
            if thread.join().is_err() {
                log::error!("IO thread panicked.");
            }
        }
    }
}
