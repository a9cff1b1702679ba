// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod filename;

pub use filename::{download_filename, extension_for};

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::DownloadError;
use crate::http::HttpClient;
use crate::player::Track;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Suffix for files still being written
const PARTIAL_SUFFIX: &str = ".partial";

/// Save a track's audio into `output_dir`
///
/// The body is streamed into `<name>.partial` and renamed once complete, so
/// an interrupted download never leaves a file under the final name.
/// Returns the path of the finished file.
pub async fn download_track<C: HttpClient + ?Sized>(
    client: &C,
    track: &Track,
    output_dir: &Path,
    reporter: &SharedProgressReporter,
) -> Result<PathBuf, DownloadError> {
    let filename = download_filename(&track.title, track.mime_type.as_deref());
    let final_path = output_dir.join(&filename);
    let partial_path = output_dir.join(format!("{filename}{PARTIAL_SUFFIX}"));

    let result = stream_to_file(client, track, &partial_path, reporter).await;
    let bytes_downloaded = match result {
        Ok(bytes) => bytes,
        Err(error) => {
            // Best effort; the partial may not exist yet
            let _ = tokio::fs::remove_file(&partial_path).await;
            return Err(error);
        }
    };

    reporter.report(ProgressEvent::Finalizing {
        title: track.title.clone(),
    });

    if let Err(source) = tokio::fs::rename(&partial_path, &final_path).await {
        let _ = tokio::fs::remove_file(&partial_path).await;
        return Err(DownloadError::FinalizeFailed {
            path: final_path,
            source,
        });
    }

    debug!(path = %final_path.display(), bytes_downloaded, "download finished");

    reporter.report(ProgressEvent::DownloadCompleted {
        title: track.title.clone(),
        path: final_path.clone(),
        bytes_downloaded,
    });

    Ok(final_path)
}

async fn stream_to_file<C: HttpClient + ?Sized>(
    client: &C,
    track: &Track,
    output_path: &Path,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let url = track.source_url.as_str();

    let response = client
        .get_stream(url)
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if response.status >= 400 {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    reporter.report(ProgressEvent::DownloadStarting {
        title: track.title.clone(),
        content_length: response.content_length,
    });

    let mut file =
        File::create(output_path)
            .await
            .map_err(|e| DownloadError::FileCreateFailed {
                path: output_path.to_path_buf(),
                source: e,
            })?;

    let mut bytes_downloaded: u64 = 0;
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::FileWriteFailed {
                path: output_path.to_path_buf(),
                source: e,
            })?;

        bytes_downloaded += chunk.len() as u64;

        reporter.report(ProgressEvent::DownloadProgress {
            title: track.title.clone(),
            bytes_downloaded,
            total_bytes: response.content_length,
        });
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    Ok(bytes_downloaded)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bytes::Bytes;
    use tempfile::tempdir;

    use crate::http::{ByteStream, BytesResponse, Headers, HttpResponse};
    use crate::progress::NoopReporter;
    use crate::progress::tests::RecordingReporter;

    /// Serves a fixed body and counts stream requests
    pub(crate) struct MockAudioServer {
        pub response_data: Vec<u8>,
        pub status: u16,
        pub requests: Mutex<Vec<String>>,
    }

    impl MockAudioServer {
        pub fn new(status: u16, data: &[u8]) -> Self {
            Self {
                response_data: data.to_vec(),
                status,
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HttpClient for MockAudioServer {
        async fn get_bytes(
            &self,
            url: &str,
            _headers: &Headers,
        ) -> Result<BytesResponse, reqwest::Error> {
            self.requests.lock().unwrap().push(url.to_string());
            Ok(BytesResponse {
                status: self.status,
                body: Bytes::from(self.response_data.clone()),
            })
        }

        async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            self.requests.lock().unwrap().push(url.to_string());
            let data = self.response_data.clone();
            let len = data.len() as u64;

            let stream: ByteStream =
                Box::pin(futures::stream::once(async move { Ok(Bytes::from(data)) }));

            Ok(HttpResponse {
                status: self.status,
                content_type: Some("audio/mpeg".to_string()),
                content_length: Some(len),
                body: stream,
            })
        }
    }

    pub(crate) fn make_track() -> Track {
        Track {
            id: 42,
            source_url: "https://example.com/episode.mp3".to_string(),
            title: "Test Episode".to_string(),
            artwork_url: None,
            duration_hint: Some(1800.0),
            mime_type: Some("audio/mpeg".to_string()),
        }
    }

    #[tokio::test]
    async fn download_writes_file() {
        let dir = tempdir().unwrap();
        let client = MockAudioServer::new(200, b"test audio content");
        let reporter = NoopReporter::shared();

        let path = download_track(&client, &make_track(), dir.path(), &reporter)
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("Test Episode.mpeg"));
        assert_eq!(std::fs::read(&path).unwrap(), b"test audio content");
        assert!(!dir.path().join("Test Episode.mpeg.partial").exists());
    }

    #[tokio::test]
    async fn download_fails_on_http_error() {
        let dir = tempdir().unwrap();
        let client = MockAudioServer::new(404, b"Not Found");
        let reporter = NoopReporter::shared();

        let result = download_track(&client, &make_track(), dir.path(), &reporter).await;

        match result.unwrap_err() {
            DownloadError::HttpStatus { status, .. } => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got {other:?}"),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failed_write_leaves_no_partial() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let client = MockAudioServer::new(200, b"audio");
        let reporter = NoopReporter::shared();

        let result = download_track(&client, &make_track(), &missing, &reporter).await;

        assert!(matches!(
            result,
            Err(DownloadError::FileCreateFailed { .. })
        ));
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn download_reports_progress_in_order() {
        let dir = tempdir().unwrap();
        let client = MockAudioServer::new(200, b"0123456789");
        let recorder = Arc::new(RecordingReporter::default());
        let reporter: SharedProgressReporter = recorder.clone();

        download_track(&client, &make_track(), dir.path(), &reporter)
            .await
            .unwrap();

        let events = recorder.events.lock().unwrap();
        assert!(matches!(
            events[0],
            ProgressEvent::DownloadStarting {
                content_length: Some(10),
                ..
            }
        ));
        assert!(matches!(
            events[1],
            ProgressEvent::DownloadProgress {
                bytes_downloaded: 10,
                ..
            }
        ));
        assert!(matches!(events[2], ProgressEvent::Finalizing { .. }));
        assert!(matches!(
            events[3],
            ProgressEvent::DownloadCompleted {
                bytes_downloaded: 10,
                ..
            }
        ));
    }
}
