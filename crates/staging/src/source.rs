//! Source-image lookup with fallback.

use std::path::{Path, PathBuf};
use tracing::debug;

use contracts::{HarnessError, SensorName};

/// Default per-run source image, used when nothing sensor-specific matches.
pub const DEFAULT_SOURCE_FILE: &str = "S00.fits";

/// Resolve the source image for one sensor.
///
/// An explicit `inputfile` bypasses the directory search but must exist.
///
/// # Errors
/// Returns [`HarnessError::InputNotFound`] when nothing matches.
pub fn resolve_source(
    inputfile: Option<&Path>,
    inputdir: &Path,
    sensor: &SensorName,
) -> Result<PathBuf, HarnessError> {
    if let Some(path) = inputfile {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(HarnessError::input_not_found(sensor.as_str(), path));
    }
    find_source_image(inputdir, sensor)
}

/// Search `root` for a source image matching `sensor`.
///
/// Fallback order:
/// 1. `<root>/<sensor>.fits`
/// 2. any `*.fits` whose stem ends with the sensor's short tag
///    (lexicographically first match)
/// 3. `<root>/S00.fits`
pub fn find_source_image(root: &Path, sensor: &SensorName) -> Result<PathBuf, HarnessError> {
    let exact = root.join(format!("{sensor}.fits"));
    if exact.is_file() {
        return Ok(exact);
    }

    let tag = sensor.short_tag();
    if let Ok(entries) = std::fs::read_dir(root) {
        let mut matches: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("fits"))
            .filter(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| stem.ends_with(tag))
            })
            .collect();
        matches.sort();
        if let Some(found) = matches.into_iter().next() {
            debug!(sensor = %sensor, source = %found.display(), "Matched source image by short tag");
            return Ok(found);
        }
    }

    let fallback = root.join(DEFAULT_SOURCE_FILE);
    if fallback.is_file() {
        debug!(sensor = %sensor, source = %fallback.display(), "Using default source image");
        return Ok(fallback);
    }

    Err(HarnessError::input_not_found(sensor.as_str(), root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        std::fs::write(path, b"SIMPLE  =                    T").unwrap();
    }

    #[test]
    fn test_exact_name_wins() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("R22_S11.fits"));
        touch(&dir.path().join("S00.fits"));

        let found = find_source_image(dir.path(), &"R22_S11".into()).unwrap();
        assert_eq!(found, dir.path().join("R22_S11.fits"));
    }

    #[test]
    fn test_partial_match_on_short_tag() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("MC_O_20211231_000123_R22_S11.fits"));

        let found = find_source_image(dir.path(), &"R22_S11".into()).unwrap();
        assert_eq!(found, dir.path().join("MC_O_20211231_000123_R22_S11.fits"));
    }

    #[test]
    fn test_default_file_fallback() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("S00.fits"));

        let found = find_source_image(dir.path(), &"R99_S99".into()).unwrap();
        assert_eq!(found, dir.path().join("S00.fits"));
    }

    #[test]
    fn test_nothing_matches() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("notes.txt"));

        let err = find_source_image(dir.path(), &"R22_S11".into()).unwrap_err();
        assert!(matches!(err, HarnessError::InputNotFound { .. }));
    }

    #[test]
    fn test_explicit_inputfile() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("custom.fits");
        touch(&file);

        let found = resolve_source(Some(&file), dir.path(), &"S00".into()).unwrap();
        assert_eq!(found, file);

        let missing = dir.path().join("absent.fits");
        let err = resolve_source(Some(&missing), dir.path(), &"S00".into()).unwrap_err();
        assert!(matches!(err, HarnessError::InputNotFound { .. }));
    }
}
