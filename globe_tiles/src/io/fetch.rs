use bytes::Bytes;

/// Source of raw image bytes, addressed by URL. [`crate::HttpFetch`] is the real one, tests
/// swap in their own.
pub trait Fetch {
    type Error: std::error::Error + Sync + Send;

    fn fetch(&self, url: &str) -> impl Future<Output = Result<Bytes, Self::Error>> + Send;
}
