//! # Integration Tests
//!
//! End-to-end scenarios for the exposure streamer.
//!
//! Covers:
//! - staged uploads arriving in index order over HTTP
//! - fan-out failure isolation between sensor workers
//! - run-configuration loading across formats

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::{Method, StatusCode, Uri};
    use axum::routing::any;
    use axum::Router;

    /// One recorded request: method, path-and-query, body bytes.
    #[derive(Clone)]
    pub struct RecordedRequest {
        pub method: String,
        pub uri: String,
        pub body: Vec<u8>,
    }

    #[derive(Clone, Default)]
    pub struct Recorded {
        pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
        fail_marker: Option<String>,
    }

    impl Recorded {
        pub fn uris(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|request| request.uri.clone())
                .collect()
        }
    }

    /// Local upload endpoint on an ephemeral port.
    ///
    /// Every request is recorded with its method and full path-and-query;
    /// requests whose URI contains `fail_marker` additionally get a 500
    /// response.
    pub async fn spawn_put_server(fail_marker: Option<&str>) -> (String, Recorded) {
        let state = Recorded {
            requests: Arc::default(),
            fail_marker: fail_marker.map(str::to_string),
        };
        let app = Router::new()
            .route("/{*path}", any(record_request))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), state)
    }

    async fn record_request(
        State(state): State<Recorded>,
        method: Method,
        uri: Uri,
        body: Bytes,
    ) -> StatusCode {
        let uri = uri.to_string();
        state.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            uri: uri.clone(),
            body: body.to_vec(),
        });
        match &state.fail_marker {
            Some(marker) if uri.contains(marker) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::path::Path;

    use contracts::{RunConfig, SensorSelection, StartTime};
    use simulator::RunOptions;
    use transfer::SessionConfig;

    use crate::support::spawn_put_server;

    const PAYLOAD: &[u8] = b"SIMPLE  =                    T / conforms to FITS standard";

    /// Config whose baseline (today 00:00) is already past, so every
    /// exposure runs immediately.
    fn immediate_config(destination: String, inputdir: &Path, tempdir: &Path) -> RunConfig {
        let starttime: StartTime = "00:00".parse().unwrap();
        let mut config = RunConfig::new(destination, starttime, 2);
        config.interval = 0;
        config.inputdir = inputdir.to_path_buf();
        config.tempdir = tempdir.to_path_buf();
        config
    }

    /// End-to-end: one sensor, two exposures, HTTP destination.
    ///
    /// Verifies the whole chain: scheduling (late path), staging into the
    /// scratch tree, and sequence-ordered PUTs with the source bytes.
    #[tokio::test]
    async fn test_e2e_http_uploads_in_index_order() {
        let (base, recorded) = spawn_put_server(None).await;
        let input = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("S00.fits"), PAYLOAD).unwrap();

        let mut config = immediate_config(base, input.path(), scratch.path());
        config.sensors = SensorSelection::Names(vec!["S00".into()]);

        let summary = simulator::run(config, SessionConfig::default(), RunOptions::default())
            .await
            .unwrap();

        assert!(summary.all_succeeded());
        assert_eq!(summary.total_exposures(), 2);

        let puts = recorded.requests.lock().unwrap().clone();
        assert_eq!(puts.len(), 2);
        // Sequence numbers 0 and 1, strictly in index order
        assert!(puts[0].uri.contains("_00000_S00.fits"), "got {}", puts[0].uri);
        assert!(puts[1].uri.contains("_00001_S00.fits"), "got {}", puts[1].uri);
        // Uncompressed staging forwards the source bytes verbatim
        assert!(puts.iter().all(|request| request.body == PAYLOAD));
    }

    /// Fan-out isolation: a transfer failure in one worker's second exposure
    /// leaves the sibling worker untouched.
    #[tokio::test]
    async fn test_transfer_failure_isolated_to_one_worker() {
        let (base, recorded) = spawn_put_server(Some("_00001_SB")).await;
        let input = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        std::fs::write(input.path().join("S00.fits"), PAYLOAD).unwrap();

        let mut config = immediate_config(base, input.path(), scratch.path());
        config.numexp = 3;
        config.sensors = SensorSelection::Names(vec!["SA".into(), "SB".into()]);

        let summary = simulator::run(config, SessionConfig::default(), RunOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.workers.len(), 2);
        assert_eq!(summary.failed_workers(), 1);

        let failed = summary.workers.iter().find(|w| !w.succeeded()).unwrap();
        assert_eq!(failed.sensor, "SB");
        assert_eq!(failed.stats.exposures_completed, 1);

        let survivor = summary.workers.iter().find(|w| w.succeeded()).unwrap();
        assert_eq!(survivor.sensor, "SA");
        assert_eq!(survivor.stats.exposures_completed, 3);

        let uris = recorded.uris();
        // SA ran all three exposures
        assert_eq!(uris.iter().filter(|u| u.contains("_SA")).count(), 3);
        assert!(uris.iter().any(|u| u.contains("_00002_SA")));
        // SB aborted after the injected failure, no third upload
        assert!(!uris.iter().any(|u| u.contains("_00002_SB")));
    }

    /// Gzip staging rewrites the extension and uploads the compressed body.
    #[tokio::test]
    async fn test_e2e_compressed_uploads_use_gz_extension() {
        let (base, recorded) = spawn_put_server(None).await;
        let input = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        // Repetitive payload so gzip actually shrinks it
        std::fs::write(input.path().join("S00.fits"), PAYLOAD.repeat(64)).unwrap();

        let mut config = immediate_config(base, input.path(), scratch.path());
        config.numexp = 1;
        config.sensors = SensorSelection::Names(vec!["S00".into()]);
        config.compress = Some(contracts::Compression::Gzip);

        let summary = simulator::run(config, SessionConfig::default(), RunOptions::default())
            .await
            .unwrap();
        assert!(summary.all_succeeded());

        let puts = recorded.requests.lock().unwrap().clone();
        assert_eq!(puts.len(), 1);
        assert!(puts[0].uri.ends_with(".fits.gz"), "got {}", puts[0].uri);
        assert!(puts[0].body.len() < PAYLOAD.len() * 64);
    }
}

#[cfg(test)]
mod backend_tests {
    use std::path::Path;

    use contracts::Uploader;
    use transfer::{Destination, SessionConfig, TransferSession};

    use crate::support::spawn_put_server;

    const PAYLOAD: &[u8] = b"SIMPLE  =                    T / conforms to FITS standard";
    const RELATIVE: &str = "2026-08-23/2026082314053/MC_O_20260823_14053_S00.fits";

    /// Place a staged file under the scratch root, parents included.
    fn stage_file(scratch: &Path, relative: &Path) {
        let path = scratch.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, PAYLOAD).unwrap();
    }

    async fn connect(destination: &str, endpoint: String) -> TransferSession {
        let config = SessionConfig {
            endpoint,
            credential_file: None,
        };
        let destination = Destination::parse(destination).unwrap();
        TransferSession::connect(&destination, &config).await.unwrap()
    }

    /// Object-store style A: sentinel probe at connect, then a media upload
    /// POST carrying the prefixed object key and the staged bytes.
    #[tokio::test]
    async fn test_gsapi_media_upload_request_shape() {
        let (base, recorded) = spawn_put_server(None).await;
        let scratch = tempfile::tempdir().unwrap();
        let relative = Path::new(RELATIVE);
        stage_file(scratch.path(), relative);

        let mut session = connect("gsapi://rubin-transfer/staging", base).await;
        session.transfer(scratch.path(), relative).await.unwrap();

        let requests = recorded.requests.lock().unwrap().clone();
        assert_eq!(requests[0].method, "GET");
        assert!(
            requests[0].uri.contains("/storage/v1/b/rubin-transfer/o/.null"),
            "probe hit {}",
            requests[0].uri
        );

        let upload = requests.iter().find(|r| r.method == "POST").unwrap();
        assert!(
            upload.uri.starts_with("/upload/storage/v1/b/rubin-transfer/o?"),
            "got {}",
            upload.uri
        );
        assert!(upload.uri.contains("uploadType=media"));
        // The object key rides in the name parameter, prefix included
        let decoded = upload.uri.replace("%2F", "/");
        assert!(
            decoded.contains(&format!("name=staging/{RELATIVE}")),
            "got {}",
            upload.uri
        );
        assert_eq!(upload.body, PAYLOAD);
    }

    /// Object-store style B: empty sentinel PUT at connect, then a
    /// path-style PUT at `/{bucket}/{key}`.
    #[tokio::test]
    async fn test_s3_path_style_put_request_shape() {
        let (base, recorded) = spawn_put_server(None).await;
        let scratch = tempfile::tempdir().unwrap();
        let relative = Path::new(RELATIVE);
        stage_file(scratch.path(), relative);

        let mut session = connect("minio://bucket/staging", base).await;
        session.transfer(scratch.path(), relative).await.unwrap();

        let requests = recorded.requests.lock().unwrap().clone();
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].uri, "/bucket/.null");
        assert!(requests[0].body.is_empty());

        let upload = requests.last().unwrap();
        assert_eq!(upload.method, "PUT");
        assert_eq!(upload.uri, format!("/bucket/staging/{RELATIVE}"));
        assert_eq!(upload.body, PAYLOAD);
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::ConfigLoader;

    /// The same run described in TOML and JSON loads identically.
    #[test]
    fn test_config_formats_agree() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("run.toml");
        std::fs::write(
            &toml_path,
            "destination = \"gsapi://bucket/staging\"\n\
             starttime = \"14:05\"\n\
             numexp = 10\n\
             sensors = [\"R22_S11\", \"R22_S12\"]\n\
             compress = \"gzip\"\n",
        )
        .unwrap();

        let json_path = dir.path().join("run.json");
        std::fs::write(
            &json_path,
            r#"{
                "destination": "gsapi://bucket/staging",
                "starttime": "14:05",
                "numexp": 10,
                "sensors": ["R22_S11", "R22_S12"],
                "compress": "gzip"
            }"#,
        )
        .unwrap();

        let from_toml = ConfigLoader::load_from_path(&toml_path).unwrap();
        let from_json = ConfigLoader::load_from_path(&json_path).unwrap();

        assert_eq!(from_toml.destination, from_json.destination);
        assert_eq!(from_toml.starttime, from_json.starttime);
        assert_eq!(from_toml.numexp, from_json.numexp);
        assert_eq!(from_toml.sensors.len(), from_json.sensors.len());
        assert_eq!(from_toml.compress, from_json.compress);
    }
}
