//! Key persistence for the CLI: a single line of base64 in a 0600 file.
//!
//! Resolution order when opening or sealing: explicit `--key-file` path,
//! then the environment variable named by `key.env_var`, then `key.file`.

use std::io::Write;
use std::path::{Path, PathBuf};

use kinseal_crypto::{export_key, import_key, SymmetricKey};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::config::{expand_tilde, KeyConfig};
use crate::error::{KinsealError, KinsealResult};

/// Where a resolved key came from (for log lines; never the key itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    File(PathBuf),
    Env(String),
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::File(path) => write!(f, "file {}", path.display()),
            KeySource::Env(var) => write!(f, "env ${var}"),
        }
    }
}

/// Write `key` as base64 to `path`, creating parent directories.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn write_key_file(path: &Path, key: &SymmetricKey, force: bool) -> KinsealResult<()> {
    if path.exists() && !force {
        return Err(KinsealError::KeyFile(format!(
            "{} already exists (use --force to replace it)",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // `mode` only applies on create; a forced replace keeps the old bits
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    let mut encoded = export_key(key);
    encoded.push('\n');
    let written = file.write_all(encoded.as_bytes());
    encoded.zeroize();
    written?;
    file.sync_all()?;

    tracing::debug!(path = %path.display(), "wrote key file");
    Ok(())
}

/// Read and import a key file written by [`write_key_file`].
pub fn read_key_file(path: &Path) -> KinsealResult<SymmetricKey> {
    let mut content = std::fs::read_to_string(path).map_err(|e| {
        KinsealError::KeyFile(format!("reading {}: {e}", path.display()))
    })?;
    warn_if_exposed(path);

    let key = import_key(content.trim());
    content.zeroize();
    Ok(key?)
}

/// Import a key held in a secret string (env var, keychain, prompt).
pub fn key_from_secret(secret: &SecretString) -> KinsealResult<SymmetricKey> {
    Ok(import_key(secret.expose_secret().trim())?)
}

/// Resolve the sealing key: CLI flag > env var > config key file.
pub fn resolve_key(
    override_path: Option<&Path>,
    config: &KeyConfig,
) -> KinsealResult<(SymmetricKey, KeySource)> {
    if let Some(path) = override_path {
        return Ok((read_key_file(path)?, KeySource::File(path.to_path_buf())));
    }

    if !config.env_var.is_empty() {
        if let Ok(value) = std::env::var(&config.env_var) {
            let secret = SecretString::from(value);
            let key = key_from_secret(&secret)?;
            return Ok((key, KeySource::Env(config.env_var.clone())));
        }
    }

    let path = expand_tilde(&config.file);
    if !path.exists() {
        return Err(KinsealError::KeyFile(format!(
            "no key found: set ${}, pass --key-file, or run `kinseal keygen` to create {}",
            config.env_var,
            path.display()
        )));
    }
    Ok((read_key_file(&path)?, KeySource::File(path)))
}

#[cfg(unix)]
fn warn_if_exposed(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = std::fs::metadata(path) {
        let mode = meta.permissions().mode();
        if mode & 0o077 != 0 {
            tracing::warn!(
                path = %path.display(),
                mode = format!("{:o}", mode & 0o777),
                "key file is readable by other users; chmod 600 recommended"
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_exposed(_path: &Path) {}
