//! HTTP plumbing for discovery and site checks.

use crate::error::{ResolverError, Result};
use crate::resolve::SecurityMode;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

/// The two clients discovery runs on: a patient default and an impatient
/// 5-second probe used to fail `https` early in insecure mode before the
/// plain-`http` fallback.
#[derive(Debug)]
pub(crate) struct HttpClients {
    patient: Client,
    impatient: Client,
}

impl HttpClients {
    pub(crate) fn new() -> Result<Self> {
        let build = |timeout: Option<Duration>| {
            Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|err| ResolverError::ClientBuild {
                    message: err.to_string(),
                })
        };
        Ok(Self {
            patient: build(None)?,
            impatient: build(Some(Duration::from_secs(5)))?,
        })
    }

    /// GET `url`, requiring a 200 response.
    pub(crate) fn get(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "http get");
        let response = self
            .patient
            .get(url)
            .send()
            .map_err(|err| ResolverError::Http {
                url: url.to_string(),
                message: err.to_string(),
                status: None,
            })?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ResolverError::Http {
                url: url.to_string(),
                message: status.to_string(),
                status: Some(status.as_u16()),
            });
        }
        response.bytes().map(|b| b.to_vec()).map_err(|err| {
            ResolverError::Http {
                url: url.to_string(),
                message: err.to_string(),
                status: None,
            }
        })
    }

    /// Fetch the discovery page for `import_path`, preferring `https`.
    ///
    /// In secure mode only `https` is tried. In insecure mode `https` goes
    /// through the impatient client and a failure falls back to `http`.
    /// Non-200 responses are accepted: sites are allowed to serve their
    /// `go-import` tags on a 404 page.
    pub(crate) fn discovery_page(
        &self,
        import_path: &str,
        security: SecurityMode,
    ) -> Result<(String, Vec<u8>)> {
        let fetch = |scheme: &str| -> Result<(String, Vec<u8>)> {
            let url = format!("{scheme}://{import_path}?go-get=1");
            debug!(%url, "discovery fetch");
            let client = if security == SecurityMode::Insecure && scheme == "https" {
                &self.impatient
            } else {
                &self.patient
            };
            let response = client.get(&url).send().map_err(|err| ResolverError::Http {
                url: url.clone(),
                message: err.to_string(),
                status: None,
            })?;
            let body = response.bytes().map_err(|err| ResolverError::Http {
                url: url.clone(),
                message: err.to_string(),
                status: None,
            })?;
            Ok((url, body.to_vec()))
        };

        match fetch("https") {
            Ok(found) => Ok(found),
            Err(err) => {
                if security == SecurityMode::Insecure {
                    fetch("http").map_err(|http_err| prefix_message("http/https fetch", http_err))
                } else {
                    Err(prefix_message("https fetch", err))
                }
            }
        }
    }
}

fn prefix_message(what: &str, err: ResolverError) -> ResolverError {
    match err {
        ResolverError::Http {
            url,
            message,
            status,
        } => ResolverError::Http {
            url,
            message: format!("{what}: {message}"),
            status,
        },
        other => other,
    }
}
