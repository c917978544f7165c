//! URL construction for the software mirror and the local VM host.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SOFTWARE_MIRROR: &str = "https://admin.testchameleon.com/media";
pub const DEFAULT_LOCAL_VMHOST: &str = "http://vmhost-local.testchameleon.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlBuilder {
    software_mirror: String,
    local_vmhost: String,
}

impl Default for UrlBuilder {
    fn default() -> Self {
        Self {
            software_mirror: DEFAULT_SOFTWARE_MIRROR.to_string(),
            local_vmhost: DEFAULT_LOCAL_VMHOST.to_string(),
        }
    }
}

impl UrlBuilder {
    pub fn new(software_mirror: impl Into<String>, local_vmhost: impl Into<String>) -> Self {
        Self {
            software_mirror: software_mirror.into(),
            local_vmhost: local_vmhost.into(),
        }
    }

    pub fn software_mirror(&self) -> &str {
        &self.software_mirror
    }

    pub fn local_vmhost(&self) -> &str {
        &self.local_vmhost
    }

    /// URL of a file on the software mirror.
    pub fn build_software_download(&self, path: &str) -> String {
        join(&self.software_mirror, path)
    }

    /// URL of an endpoint on the local VM host.
    pub fn build_local_vmhost(&self, path: &str) -> String {
        join(&self.local_vmhost, path)
    }
}

/// Join base and path with exactly one slash between them.
fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Whether a DOWNLOAD parameter is a complete URL rather than a mirror path.
pub fn is_absolute_url(parameter: &str) -> bool {
    ["http://", "https://", "ftp://"]
        .iter()
        .any(|scheme| parameter.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_software_download_single_slash() {
        let urls = UrlBuilder::new("https://mirror.example/media/", "http://host");
        assert_eq!(
            urls.build_software_download("/firefox/setup.exe"),
            "https://mirror.example/media/firefox/setup.exe"
        );
        assert_eq!(
            urls.build_software_download("firefox/setup.exe"),
            "https://mirror.example/media/firefox/setup.exe"
        );
    }

    #[test]
    fn test_local_vmhost() {
        let urls = UrlBuilder::default();
        assert_eq!(
            urls.build_local_vmhost("file/upload/abc"),
            format!("{}/file/upload/abc", DEFAULT_LOCAL_VMHOST)
        );
    }

    #[test]
    fn test_is_absolute_url() {
        assert!(is_absolute_url("https://example.com/a.zip"));
        assert!(is_absolute_url("ftp://example.com/a.zip"));
        assert!(!is_absolute_url("chrome/installer.exe"));
        assert!(!is_absolute_url("file:///tmp/a"));
    }
}
