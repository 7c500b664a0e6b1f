//! Everything that talks to the network.

mod fetch;
mod grid_io;
pub mod http;
mod runtime;

pub use fetch::Fetch;
pub use grid_io::GridIo;
pub use http::{FetchError, HeaderValue, HttpFetch, HttpOptions, MaxParallelDownloads, Stats};
