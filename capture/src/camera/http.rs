use frame_lapse_common::config::{CameraConfig, CameraMode};
use futures_util::StreamExt;
use std::time::Duration;
use tracing::{debug, info};

use super::mjpeg::{boundary_from_content_type, FirstPartParser};
use super::{CaptureDevice, Orientation};
use crate::CaptureError;

/// Network camera reachable over HTTP, either as a single-frame endpoint or
/// as an MJPEG stream.
pub struct HttpCamera {
    client: reqwest::Client,
    url: String,
    /// `mjpeg` mode: read the first part of a multipart stream.
    streaming: bool,
    quality: u8,
    orientation: Orientation,
}

impl HttpCamera {
    pub fn open(config: &CameraConfig) -> Result<Self, CaptureError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(CaptureError::HttpConnect)?;

        info!(url = config.url, mode = ?config.mode, "configured camera client");

        Ok(Self {
            client,
            url: config.url.clone(),
            streaming: config.mode == CameraMode::Mjpeg,
            quality: config.quality,
            orientation: Orientation::default(),
        })
    }

    async fn get(&self) -> Result<reqwest::Response, CaptureError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(CaptureError::HttpConnect)?;

        if !response.status().is_success() {
            return Err(CaptureError::HttpStatus(response.status().as_u16()));
        }
        Ok(response)
    }

    async fn fetch_snapshot(&self) -> Result<Vec<u8>, CaptureError> {
        let response = self.get().await?;
        let jpeg = response.bytes().await.map_err(CaptureError::HttpStream)?;
        Ok(jpeg.to_vec())
    }

    /// Read the stream until the first complete part, then drop the connection.
    async fn fetch_first_part(&self) -> Result<Vec<u8>, CaptureError> {
        let response = self.get().await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        let boundary = boundary_from_content_type(content_type);
        debug!(boundary, "reading first MJPEG part");

        let mut parser = FirstPartParser::new(&boundary);
        let mut byte_stream = response.bytes_stream();
        while let Some(chunk) = byte_stream.next().await {
            let chunk = chunk.map_err(CaptureError::HttpStream)?;
            if let Some(jpeg) = parser.push(&chunk) {
                return Ok(jpeg);
            }
        }
        Err(CaptureError::StreamEnded)
    }
}

impl CaptureDevice for HttpCamera {
    fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    async fn capture(&mut self) -> Result<Vec<u8>, CaptureError> {
        let raw = if self.streaming {
            self.fetch_first_part().await?
        } else {
            self.fetch_snapshot().await?
        };
        debug!(bytes = raw.len(), "frame received from camera");

        Ok(self.orientation.apply(&raw, self.quality)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer a single request with `response`, then close the connection.
    async fn serve_once(response: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(&response).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/frame")
    }

    fn camera(url: String, mode: CameraMode) -> HttpCamera {
        HttpCamera::open(&CameraConfig {
            url,
            mode,
            ..Default::default()
        })
        .unwrap()
    }

    fn multipart_head() -> Vec<u8> {
        b"HTTP/1.1 200 OK\r\n\
          Content-Type: multipart/x-mixed-replace; boundary=cam\r\n\
          Connection: close\r\n\r\n"
            .to_vec()
    }

    #[tokio::test]
    async fn snapshot_body_is_the_frame() {
        let url = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\njpeg".to_vec()).await;
        let mut cam = camera(url, CameraMode::Snapshot);

        assert_eq!(cam.capture().await.unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let url = serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_vec(),
        )
        .await;
        let mut cam = camera(url, CameraMode::Snapshot);

        let err = cam.capture().await.unwrap_err();
        assert!(matches!(err, CaptureError::HttpStatus(404)));
    }

    #[tokio::test]
    async fn mjpeg_returns_first_part() {
        let mut response = multipart_head();
        response.extend_from_slice(b"--cam\r\nContent-Type: image/jpeg\r\n\r\nfirst\r\n");
        response.extend_from_slice(b"--cam\r\nContent-Type: image/jpeg\r\n\r\nsecond\r\n");
        response.extend_from_slice(b"--cam\r\n");
        let url = serve_once(response).await;
        let mut cam = camera(url, CameraMode::Mjpeg);

        assert_eq!(cam.capture().await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn mjpeg_closed_mid_part_is_stream_ended() {
        let mut response = multipart_head();
        response.extend_from_slice(b"--cam\r\nContent-Type: image/jpeg\r\n\r\nhalf a fr");
        let url = serve_once(response).await;
        let mut cam = camera(url, CameraMode::Mjpeg);

        let err = cam.capture().await.unwrap_err();
        assert!(matches!(err, CaptureError::StreamEnded));
    }

    #[tokio::test]
    async fn unreachable_camera_is_a_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let mut cam = camera(format!("http://{addr}/frame"), CameraMode::Snapshot);

        let err = cam.capture().await.unwrap_err();
        assert!(matches!(err, CaptureError::HttpConnect(_)));
    }
}
