//! UPLOAD: post a local file to the VM host.
//!
//! The file travels as a single `multipart/form-data` part to
//! `<local_vmhost>/file/upload/<machine id>`; the host's reply becomes the
//! frame value.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::InstallerConfig;
use crate::core::stack::Frame;
use crate::installer::Installer;
use crate::mirror::UrlBuilder;

const FIELD_NAME: &str = "icon";
const FILE_NAME: &str = "img.png";

#[derive(Debug, Clone)]
pub struct UploadHandler {
    urls: UrlBuilder,
    timeout: Duration,
}

impl UploadHandler {
    pub fn new(urls: UrlBuilder, timeout: Duration) -> Self {
        Self { urls, timeout }
    }

    pub fn from_config(config: &InstallerConfig) -> Self {
        Self::new(config.url_builder(), config.http_timeout())
    }

    /// Endpoint receiving uploads from machine `id`.
    pub fn url_for(&self, id: Uuid) -> String {
        self.urls
            .build_local_vmhost(&format!("/file/upload/{}", id.hyphenated()))
    }

    fn post(&self, url: &str, file: &Path) -> Result<String> {
        let content = std::fs::read(file)
            .with_context(|| format!("cannot read {}", file.display()))?;
        let boundary = format!("recipe-{}", Uuid::new_v4().simple());
        let body = multipart_body(&boundary, &content);

        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let response = agent
            .post(url)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={}", boundary),
            )
            .send_bytes(&body)
            .map_err(|e| anyhow::anyhow!("upload failed: {}", e))?;

        response.into_string().context("unreadable upload response")
    }
}

/// One form part holding `content`, framed by `boundary`.
fn multipart_body(boundary: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 256);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{FIELD_NAME}\"; filename=\"{FILE_NAME}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

impl super::Handler for UploadHandler {
    fn handle(&self, parameter: &str, installer: &mut Installer<'_>) -> Result<Frame> {
        let url = self.url_for(installer.facts().unique_id());
        debug!(%url, file = parameter, "uploading");
        let reply = self
            .post(&url, Path::new(parameter))
            .with_context(|| format!("cannot upload file {}", parameter))?;
        Ok(Frame::new(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_uses_machine_id() {
        let handler = UploadHandler::new(
            UrlBuilder::new("http://mirror", "http://vmhost/"),
            Duration::from_secs(5),
        );
        let id = Uuid::from_u128(7);
        assert_eq!(
            handler.url_for(id),
            "http://vmhost/file/upload/00000000-0000-0000-0000-000000000007"
        );
    }

    #[test]
    fn test_multipart_body_layout() {
        let body = String::from_utf8(multipart_body("b0", b"PNG")).unwrap();
        assert_eq!(
            body,
            "--b0\r\n\
             Content-Disposition: form-data; name=\"icon\"; filename=\"img.png\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             PNG\r\n--b0--\r\n"
        );
    }
}
