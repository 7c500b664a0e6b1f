//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};

use crate::io::Fetch;

/// Encoded PNG of the given size.
pub(crate) fn png(width: u32, height: u32) -> Bytes {
    let image = RgbaImage::from_pixel(width, height, Rgba([10, 200, 30, 255]));
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    Bytes::from(buffer.into_inner())
}

#[derive(Debug, thiserror::Error)]
#[error("no response for '{0}'")]
pub(crate) struct NoResponse(String);

#[derive(Default)]
struct State {
    bodies: HashMap<String, Bytes>,
    everything: Option<Bytes>,
    calls: Vec<String>,
}

/// In-memory [`Fetch`] which remembers every call. Clones share the state, so a test can keep
/// one while the other is owned by the loader.
#[derive(Clone, Default)]
pub(crate) struct FakeFetch(Arc<Mutex<State>>);

impl FakeFetch {
    /// Every fetch fails.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Every URL responds with a small PNG.
    pub fn serving_everything() -> Self {
        let fetch = Self::default();
        fetch.0.lock().unwrap().everything = Some(png(8, 8));
        fetch
    }

    /// Respond to `url` with `body`.
    pub fn serve(self, url: &str, body: Bytes) -> Self {
        self.0.lock().unwrap().bodies.insert(url.to_owned(), body);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().calls.clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().calls.len()
    }
}

impl Fetch for FakeFetch {
    type Error = NoResponse;

    async fn fetch(&self, url: &str) -> Result<Bytes, Self::Error> {
        let response = {
            let mut state = self.0.lock().unwrap();
            state.calls.push(url.to_owned());
            state
                .bodies
                .get(url)
                .or(state.everything.as_ref())
                .cloned()
        };

        // Like a real network, do not respond in the same poll.
        tokio::task::yield_now().await;

        response.ok_or_else(|| NoResponse(url.to_owned()))
    }
}
