use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use tokio::sync::{AcquireError, Semaphore};

use super::Fetch;

pub use reqwest::header::HeaderValue;

/// Controls how [`HttpFetch`] uses the HTTP protocol.
pub struct HttpOptions {
    /// User agent to be sent to the imagery servers. Some of them (such as OpenStreetMap)
    /// reject requests which do not identify the application.
    /// <https://operations.osmfoundation.org/policies/tiles/>
    pub user_agent: Option<HeaderValue>,

    /// Use the default value when in doubt.
    pub max_parallel_downloads: MaxParallelDownloads,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            user_agent: Some(HeaderValue::from_static(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
            ))),
            max_parallel_downloads: MaxParallelDownloads::default(),
        }
    }
}

/// Maximum number of downloads running at once, shared by every provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxParallelDownloads(pub usize);

impl Default for MaxParallelDownloads {
    /// Same as browsers allow per host.
    /// <https://stackoverflow.com/questions/985431/max-parallel-http-connections-in-a-browser>
    fn default() -> Self {
        Self(6)
    }
}

impl MaxParallelDownloads {
    /// Custom limit. Check the terms of use of each imagery provider first, exceeding their
    /// rate limits may get you throttled or banned.
    pub fn value_manually_confirmed_with_provider_limits(value: usize) -> Self {
        Self(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("download slots are gone")]
    Closed(#[from] AcquireError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of images that are currently being downloaded.
    pub in_progress: usize,
}

/// Counts a download as in progress for as long as it lives.
struct InProgress(Arc<Mutex<Stats>>);

impl InProgress {
    fn start(stats: &Arc<Mutex<Stats>>) -> Self {
        stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_progress += 1;
        Self(Arc::clone(stats))
    }
}

impl Drop for InProgress {
    fn drop(&mut self) {
        let mut stats = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        stats.in_progress = stats.in_progress.saturating_sub(1);
    }
}

/// Downloads images via HTTP(S), never running more than
/// [`HttpOptions::max_parallel_downloads`] requests at once. Clones share the limit.
#[derive(Clone)]
pub struct HttpFetch {
    client: reqwest::Client,
    user_agent: Option<HeaderValue>,
    permits: Arc<Semaphore>,
    stats: Arc<Mutex<Stats>>,
}

impl Default for HttpFetch {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetch {
    /// Construct new [`HttpFetch`] with default [`HttpOptions`].
    pub fn new() -> Self {
        Self::with_options(HttpOptions::default())
    }

    /// Construct new [`HttpFetch`] with supplied [`HttpOptions`].
    pub fn with_options(options: HttpOptions) -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: options.user_agent,
            permits: Arc::new(Semaphore::new(options.max_parallel_downloads.0)),
            stats: Arc::new(Mutex::new(Stats::default())),
        }
    }

    pub fn stats(&self) -> Stats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Fetch for HttpFetch {
    type Error = FetchError;

    async fn fetch(&self, url: &str) -> Result<Bytes, Self::Error> {
        let _permit = self.permits.acquire().await?;
        let _in_progress = InProgress::start(&self.stats);

        let mut request = self.client.get(url);
        if let Some(user_agent) = &self.user_agent {
            request = request.header(reqwest::header::USER_AGENT, user_agent.clone());
        }

        let response = request.send().await?;
        log::debug!("Downloaded '{url}': {}.", response.status());

        Ok(response.error_for_status()?.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypermocker::{StatusCode, hyper::header};
    use std::time::Duration;

    #[tokio::test]
    async fn default_user_agent() {
        let _ = env_logger::try_init();

        let server = hypermocker::Server::bind().await;
        let mut anticipated = server.anticipate("/3/1/2.png");
        let fetch = HttpFetch::new();
        let url = server.url("/3/1/2.png");

        let download = tokio::spawn(async move { fetch.fetch(&url).await });

        let request = anticipated.expect().await;
        assert_eq!(
            request.headers().get(header::USER_AGENT),
            Some(&HeaderValue::from_static(concat!(
                "globe_tiles",
                "/",
                env!("CARGO_PKG_VERSION"),
            ))),
            "user agent should identify the crate"
        );

        anticipated.respond("image");
        assert_eq!(download.await.unwrap().unwrap(), Bytes::from_static(b"image"));
    }

    #[tokio::test]
    async fn custom_user_agent_header() {
        let _ = env_logger::try_init();

        let server = hypermocker::Server::bind().await;
        let mut anticipated = server.anticipate("/3/1/2.png");
        let fetch = HttpFetch::with_options(HttpOptions {
            user_agent: Some(HeaderValue::from_static("MyApp")),
            ..Default::default()
        });
        let url = server.url("/3/1/2.png");

        let download = tokio::spawn(async move { fetch.fetch(&url).await });

        let request = anticipated.expect().await;
        assert_eq!(
            request.headers().get(header::USER_AGENT),
            Some(&HeaderValue::from_static("MyApp")),
            "custom user agent should be sent"
        );

        anticipated.respond("image");
        download.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn http_errors_are_errors() {
        let _ = env_logger::try_init();

        let server = hypermocker::Server::bind().await;
        server.serve("/missing.png", StatusCode::NOT_FOUND, "");

        let result = HttpFetch::new().fetch(&server.url("/missing.png")).await;
        let status = match &result {
            Err(FetchError::Http(e)) => e.status(),
            _ => None,
        };
        assert_eq!(status, Some(StatusCode::NOT_FOUND), "{result:?}");
    }

    #[tokio::test]
    async fn there_can_be_limited_number_of_downloads_at_once() {
        let _ = env_logger::try_init();

        let server = hypermocker::Server::bind().await;
        let mut first = server.anticipate("/1.png");
        let mut second = server.anticipate("/2.png");
        let mut third = server.anticipate("/3.png");

        let limit = MaxParallelDownloads::value_manually_confirmed_with_provider_limits(2);
        let fetch = HttpFetch::with_options(HttpOptions {
            max_parallel_downloads: limit,
            ..Default::default()
        });

        let downloads: Vec<_> = ["/1.png", "/2.png", "/3.png"]
            .into_iter()
            .map(|path| {
                let fetch = fetch.clone();
                let url = server.url(path);
                tokio::spawn(async move { fetch.fetch(&url).await })
            })
            .collect();

        first.expect().await;
        second.expect().await;

        // Make sure the third one does not come while two are still going.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(server.hits("/3.png"), 0, "third download should wait");
        assert_eq!(fetch.stats().in_progress, 2, "two downloads are going");

        first.respond("1");
        third.expect().await;
        second.respond("2");
        third.respond("3");

        for download in downloads {
            download.await.unwrap().unwrap();
        }
        assert_eq!(fetch.stats(), Stats::default(), "nothing is going anymore");
    }
}
