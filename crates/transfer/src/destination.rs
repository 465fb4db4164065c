//! Destination descriptor classification.

use std::path::PathBuf;

use contracts::HarnessError;

/// Parsed destination descriptor
///
/// The scheme prefix is the sole dispatch key, chosen once per run and never
/// re-evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Object-store API style A (`gsapi://bucket[/prefix]`), JSON-API media
    /// upload
    Gsapi {
        bucket: String,
        prefix: Option<String>,
    },
    /// Object-store API style B (`boto://` or `minio://bucket[/prefix]`),
    /// path-style PUT against an S3-compatible endpoint
    S3 {
        bucket: String,
        prefix: Option<String>,
    },
    /// Generic HTTP PUT (`http://` / `https://`); the full URL is the base
    Http { base: String },
    /// External high-throughput parallel copy (`bbcp://host/path`)
    Bbcp { host: String, path: PathBuf },
    /// Secure-shell copy (`scp://host/path`); the path is relative to the
    /// remote user's home unless written `scp://host//abs/path`
    Scp { host: String, path: PathBuf },
}

impl Destination {
    /// Classify a destination descriptor by scheme prefix.
    ///
    /// Pure classification, performs no I/O.
    ///
    /// # Errors
    /// - [`HarnessError::UnrecognizedDestination`] when no scheme matches
    /// - [`HarnessError::ConfigValidation`] when a recognized scheme has a
    ///   malformed remainder
    pub fn parse(url: &str) -> Result<Self, HarnessError> {
        if let Some(rest) = url.strip_prefix("gsapi://") {
            let (bucket, prefix) = split_bucket(rest, url)?;
            return Ok(Self::Gsapi { bucket, prefix });
        }
        if let Some(rest) = url
            .strip_prefix("boto://")
            .or_else(|| url.strip_prefix("minio://"))
        {
            let (bucket, prefix) = split_bucket(rest, url)?;
            return Ok(Self::S3 { bucket, prefix });
        }
        if url.starts_with("https://") || url.starts_with("http://") {
            return Ok(Self::Http {
                base: url.to_string(),
            });
        }
        if let Some(rest) = url.strip_prefix("bbcp://") {
            let (host, path) = split_host_path(rest, url)?;
            return Ok(Self::Bbcp { host, path });
        }
        if let Some(rest) = url.strip_prefix("scp://") {
            let (host, path) = split_host_path(rest, url)?;
            return Ok(Self::Scp { host, path });
        }
        Err(HarnessError::unrecognized_destination(url))
    }

    /// Backend name for logs and metrics.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Gsapi { .. } => "gsapi",
            Self::S3 { .. } => "s3",
            Self::Http { .. } => "http",
            Self::Bbcp { .. } => "bbcp",
            Self::Scp { .. } => "scp",
        }
    }
}

fn split_bucket(rest: &str, url: &str) -> Result<(String, Option<String>), HarnessError> {
    let (bucket, prefix) = match rest.split_once('/') {
        Some((bucket, prefix)) => {
            let prefix = prefix.trim_end_matches('/');
            (bucket, (!prefix.is_empty()).then(|| prefix.to_string()))
        }
        None => (rest, None),
    };
    if bucket.is_empty() {
        return Err(HarnessError::config_validation(
            "destination",
            format!("missing bucket in '{url}'"),
        ));
    }
    Ok((bucket.to_string(), prefix))
}

fn split_host_path(rest: &str, url: &str) -> Result<(String, PathBuf), HarnessError> {
    let (host, path) = rest.split_once('/').ok_or_else(|| {
        HarnessError::config_validation("destination", format!("expected host/path in '{url}'"))
    })?;
    if host.is_empty() || path.is_empty() {
        return Err(HarnessError::config_validation(
            "destination",
            format!("expected host/path in '{url}'"),
        ));
    }
    Ok((host.to_string(), PathBuf::from(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gsapi_with_prefix() {
        let dest = Destination::parse("gsapi://rubin-transfer/staging/night1").unwrap();
        assert_eq!(
            dest,
            Destination::Gsapi {
                bucket: "rubin-transfer".into(),
                prefix: Some("staging/night1".into()),
            }
        );
    }

    #[test]
    fn test_gsapi_without_prefix() {
        let dest = Destination::parse("gsapi://rubin-transfer").unwrap();
        assert_eq!(
            dest,
            Destination::Gsapi {
                bucket: "rubin-transfer".into(),
                prefix: None,
            }
        );
        // A bare trailing slash means no prefix as well
        let dest = Destination::parse("gsapi://rubin-transfer/").unwrap();
        assert!(matches!(dest, Destination::Gsapi { prefix: None, .. }));
    }

    #[test]
    fn test_boto_and_minio_share_a_backend() {
        let boto = Destination::parse("boto://bucket/prefix").unwrap();
        let minio = Destination::parse("minio://bucket/prefix").unwrap();
        assert_eq!(boto, minio);
        assert_eq!(boto.backend_name(), "s3");
    }

    #[test]
    fn test_http_keeps_full_url() {
        let dest = Destination::parse("https://upload.example.org/exposures").unwrap();
        assert_eq!(
            dest,
            Destination::Http {
                base: "https://upload.example.org/exposures".into(),
            }
        );
        // http is not swallowed by the https prefix check
        assert!(matches!(
            Destination::parse("http://example.test").unwrap(),
            Destination::Http { .. }
        ));
    }

    #[test]
    fn test_bbcp_host_path() {
        let dest = Destination::parse("bbcp://relay-01/export/staging").unwrap();
        assert_eq!(
            dest,
            Destination::Bbcp {
                host: "relay-01".into(),
                path: PathBuf::from("export/staging"),
            }
        );
    }

    #[test]
    fn test_scp_absolute_remote_path() {
        let dest = Destination::parse("scp://archiver//data/staging").unwrap();
        assert_eq!(
            dest,
            Destination::Scp {
                host: "archiver".into(),
                path: PathBuf::from("/data/staging"),
            }
        );
    }

    #[test]
    fn test_unrecognized_scheme() {
        for url in ["ftp://host/path", "gs://bucket", "file:///tmp/x", "not-a-url"] {
            let err = Destination::parse(url).unwrap_err();
            assert!(
                matches!(err, HarnessError::UnrecognizedDestination { .. }),
                "{url} gave {err}"
            );
        }
    }

    #[test]
    fn test_malformed_remainders_fail_validation() {
        for url in ["gsapi://", "bbcp://hostonly", "scp://host/", "bbcp:///path"] {
            let err = Destination::parse(url).unwrap_err();
            assert!(
                matches!(err, HarnessError::ConfigValidation { .. }),
                "{url} gave {err}"
            );
        }
    }
}
