//! Exposure staging: copy or compress one source image into the scratch
//! tree.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use contracts::{compressed_path, Compression, HarnessError};

/// Stage one exposure.
///
/// Copies `source` to `scratch_root/relative`, or pipes it through the
/// chosen compressor into the extension-rewritten path. Parent directories
/// are created as needed. Returns the final relative path of the staged
/// artifact.
///
/// The file work runs on the blocking thread pool; the staged file is fully
/// written and closed before this returns.
///
/// # Errors
/// Any copy, compress, or subprocess failure is a [`HarnessError::Staging`].
pub async fn stage(
    source: &Path,
    scratch_root: &Path,
    relative: &Path,
    compression: Option<Compression>,
) -> Result<PathBuf, HarnessError> {
    let source = source.to_path_buf();
    let scratch_root = scratch_root.to_path_buf();
    let task_relative = relative.to_path_buf();

    tokio::task::spawn_blocking(move || {
        stage_blocking(&source, &scratch_root, &task_relative, compression)
    })
    .await
    .map_err(|e| HarnessError::staging(relative, format!("staging task failed: {e}")))?
}

fn stage_blocking(
    source: &Path,
    scratch_root: &Path,
    relative: &Path,
    compression: Option<Compression>,
) -> Result<PathBuf, HarnessError> {
    let target = scratch_root.join(relative);
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| HarnessError::staging(relative, format!("mkdir failed: {e}")))?;
    }

    debug!(
        source = %source.display(),
        target = %target.display(),
        "Copying source image"
    );

    match compression {
        None => {
            copy_verbatim(source, &target, relative)?;
            Ok(relative.to_path_buf())
        }
        Some(Compression::Gzip) => {
            let final_relative = compressed_path(relative, Compression::Gzip);
            gzip_into(source, &scratch_root.join(&final_relative), relative)?;
            Ok(final_relative)
        }
        Some(Compression::Fpack) => {
            copy_verbatim(source, &target, relative)?;
            fpack_in_place(&target, relative)?;
            let final_relative = compressed_path(relative, Compression::Fpack);
            let packed = scratch_root.join(&final_relative);
            if !packed.is_file() {
                return Err(HarnessError::staging(
                    final_relative,
                    "fpack reported success but produced no output",
                ));
            }
            Ok(final_relative)
        }
    }
}

fn copy_verbatim(source: &Path, target: &Path, relative: &Path) -> Result<(), HarnessError> {
    std::fs::copy(source, target).map_err(|e| {
        HarnessError::staging(
            relative,
            format!("copy from {} failed: {e}", source.display()),
        )
    })?;
    Ok(())
}

fn gzip_into(source: &Path, target: &Path, relative: &Path) -> Result<(), HarnessError> {
    let mut input = File::open(source).map_err(|e| {
        HarnessError::staging(relative, format!("open {} failed: {e}", source.display()))
    })?;
    let output = File::create(target)
        .map_err(|e| HarnessError::staging(relative, format!("create failed: {e}")))?;

    let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
    std::io::copy(&mut input, &mut encoder)
        .map_err(|e| HarnessError::staging(relative, format!("gzip failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| HarnessError::staging(relative, format!("gzip finish failed: {e}")))?;
    Ok(())
}

/// Run the external packer on an already-staged copy.
///
/// `fpack` writes `<file>.fz` next to its input and keeps the input file.
fn fpack_in_place(target: &Path, relative: &Path) -> Result<(), HarnessError> {
    let output = Command::new("fpack")
        .arg(target)
        .output()
        .map_err(|e| HarnessError::staging(relative, format!("failed to run fpack: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(HarnessError::staging(
            relative,
            format!("fpack exited with {}: {}", output.status, stderr.trim()),
        ));
    }
    Ok(())
}
