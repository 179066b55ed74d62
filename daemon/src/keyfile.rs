//! Private key files: one line of hex.

use std::path::Path;

use prand_crypto::keypair_from_private;
use prand_types::{KeyPair, PrivateKey};

use crate::config::ConfigError;

pub fn load_keypair(path: &Path) -> Result<KeyPair, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let private = PrivateKey::from_hex(&content).map_err(|source| ConfigError::Key {
        field: path.display().to_string(),
        source,
    })?;
    Ok(keypair_from_private(private))
}

/// Write `keypair`'s private key to `path`, readable by the owner only.
/// Refuses to overwrite an existing file.
pub fn write_keypair(path: &Path, keypair: &KeyPair) -> Result<(), ConfigError> {
    use std::io::Write;

    let io = |e: std::io::Error| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(io)?;
    writeln!(file, "{}", keypair.private.to_hex()).map_err(io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prand_crypto::generate_keypair;

    #[test]
    fn written_key_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.key");
        let keypair = generate_keypair();
        write_keypair(&path, &keypair).unwrap();
        assert_eq!(load_keypair(&path).unwrap().public, keypair.public);
    }

    #[test]
    fn existing_key_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.key");
        write_keypair(&path, &generate_keypair()).unwrap();
        assert!(matches!(
            write_keypair(&path, &generate_keypair()),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn garbage_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.key");
        std::fs::write(&path, "not hex").unwrap();
        assert!(matches!(load_keypair(&path), Err(ConfigError::Key { .. })));
    }
}
