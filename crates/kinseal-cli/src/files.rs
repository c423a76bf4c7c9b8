//! Per-file seal/open jobs used by `kinseal encrypt` and `kinseal decrypt`.
//!
//! Sealed files use the envelope framing `[12-byte nonce][ciphertext][tag]`.
//! Outputs are written to a uniquely named temporary sibling (mode 0600) and
//! persisted into place, so a failed open never leaves a partial plaintext
//! behind. With `overwrite` off the final step refuses to replace a file,
//! even one created by a concurrent job after the up-front check.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kinseal_crypto::{CryptoResult, Envelope, OsEntropy, Sealer, SymmetricKey};

/// What happened to one input file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// A single seal or open job. Cheap to clone across tasks.
#[derive(Debug, Clone)]
pub struct Job {
    pub key: Arc<SymmetricKey>,
    pub context: Arc<[u8]>,
    pub overwrite: bool,
}

/// `photo.png` -> `photo.png.sealed` (in `out_dir` if given)
pub fn sealed_path(input: &Path, out_dir: Option<&Path>, extension: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{name}.{extension}"))
}

/// `photo.png.sealed` -> `photo.png`; anything else gets `.opened` appended.
pub fn opened_path(input: &Path, out_dir: Option<&Path>, extension: &str) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = format!(".{extension}");
    let stem = match name.strip_suffix(&suffix) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => format!("{name}.opened"),
    };
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(stem)
}

/// Reject a batch in which two inputs would land on the same output path.
pub fn ensure_distinct_outputs<'a, I>(outputs: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a Path, &'a Path)>,
{
    let mut seen: HashSet<&Path> = HashSet::new();
    for (input, output) in outputs {
        if !seen.insert(output) {
            anyhow::bail!(
                "{} would be written twice (again from {}); nothing was processed",
                output.display(),
                input.display()
            );
        }
    }
    Ok(())
}

impl Job {
    pub async fn seal(&self, input: PathBuf, output: PathBuf) -> Result<FileOutcome> {
        self.refuse_clobber(&output)?;

        let plaintext = tokio::fs::read(&input)
            .await
            .with_context(|| format!("reading {}", input.display()))?;
        let bytes_in = plaintext.len() as u64;

        let key = Arc::clone(&self.key);
        let context = Arc::clone(&self.context);
        let sealed = tokio::task::spawn_blocking(move || {
            Sealer::new(OsEntropy)
                .encrypt_bound(&plaintext, &key, &context)
                .map(|envelope| envelope.to_bytes())
        })
        .await
        .context("sealing task panicked")?
        .with_context(|| format!("sealing {}", input.display()))?;

        let bytes_out = sealed.len() as u64;
        write_atomic(&output, sealed, self.overwrite).await?;

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            bytes_in,
            bytes_out,
            "sealed"
        );
        Ok(FileOutcome {
            input,
            output,
            bytes_in,
            bytes_out,
        })
    }

    pub async fn open(&self, input: PathBuf, output: PathBuf) -> Result<FileOutcome> {
        self.refuse_clobber(&output)?;

        let sealed = tokio::fs::read(&input)
            .await
            .with_context(|| format!("reading {}", input.display()))?;
        let bytes_in = sealed.len() as u64;

        let key = Arc::clone(&self.key);
        let context = Arc::clone(&self.context);
        let plaintext = tokio::task::spawn_blocking(move || -> CryptoResult<Vec<u8>> {
            let envelope = Envelope::from_bytes(&sealed)?;
            Sealer::new(OsEntropy).decrypt_bound(
                envelope.ciphertext(),
                &key,
                envelope.nonce(),
                &context,
            )
        })
        .await
        .context("opening task panicked")?
        .with_context(|| format!("opening {}", input.display()))?;

        let bytes_out = plaintext.len() as u64;
        write_atomic(&output, plaintext, self.overwrite).await?;

        tracing::info!(
            input = %input.display(),
            output = %output.display(),
            bytes_in,
            bytes_out,
            "opened"
        );
        Ok(FileOutcome {
            input,
            output,
            bytes_in,
            bytes_out,
        })
    }

    fn refuse_clobber(&self, output: &Path) -> Result<()> {
        if !self.overwrite && output.exists() {
            return Err(clobber_error(output));
        }
        Ok(())
    }
}

fn clobber_error(output: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "{} already exists (set output.overwrite = true to replace)",
        output.display()
    )
}

async fn write_atomic(path: &Path, data: Vec<u8>, overwrite: bool) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    tokio::fs::create_dir_all(&parent)
        .await
        .with_context(|| format!("creating {}", parent.display()))?;

    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        // Dropped (and removed) on every early return below
        let mut tmp = tempfile::Builder::new()
            .prefix(".kinseal-")
            .suffix(".tmp")
            .tempfile_in(&parent)
            .with_context(|| format!("creating temporary file in {}", parent.display()))?;
        let written = tmp.write_all(&data);
        written
            .and_then(|()| tmp.as_file().sync_all())
            .with_context(|| format!("writing {}", tmp.path().display()))?;

        let persisted = if overwrite {
            tmp.persist(&path)
        } else {
            tmp.persist_noclobber(&path)
        };
        match persisted {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Err(clobber_error(&path)),
            Err(e) => Err(e.error).with_context(|| format!("persisting {}", path.display())),
        }
    })
    .await
    .context("write task panicked")?
}
