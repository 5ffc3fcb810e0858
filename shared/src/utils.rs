use std::future::Future;

use futures_util::TryStreamExt;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::io::StreamReader;

/// Generic watcher for streaming API responses.
///
/// Every line is decoded and handed to `handle_event`, which is awaited before
/// the next line is read so events are processed one at a time, in emission order.
/// Returns when the stream ends or the request fails.
pub async fn watch_stream<T, F, Fut>(url: &str, mut handle_event: F)
where
    T: DeserializeOwned,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = ()>,
{
    let client = Client::new();
    match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let byte_stream = resp.bytes_stream().map_err(std::io::Error::other);
            let stream_reader = StreamReader::new(byte_stream);
            let mut lines = BufReader::new(stream_reader).lines();

            tracing::debug!(url=%url, "Started watching stream");

            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<T>(&line) {
                    Ok(event) => handle_event(event).await,
                    Err(e) => tracing::warn!("Failed to deserialize line: {}\nError: {}", line, e),
                }
            }

            tracing::warn!(url=%url, "Watch stream ended");
        }
        Ok(resp) => tracing::error!(status=%resp.status(), "Watch request failed: HTTP"),
        Err(err) => tracing::error!(error=%err, "Watch request error"),
    }
}
