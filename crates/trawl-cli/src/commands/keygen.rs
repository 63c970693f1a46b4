// crates/trawl-cli/src/commands/keygen.rs
//
// `trawl keygen`: create the hotkey the daemon signs miner calls with.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use trawl_core::crypto::Keypair;
use trawl_core::identity::NodeIdentity;

/// Hotkey generation command.
#[derive(Debug, Args)]
pub struct KeygenCmd {
    /// Where to write the hex-encoded secret (default: ~/.trawl/keys/hotkey.secret).
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Overwrite an existing key file.
    #[arg(long)]
    pub force: bool,
}

/// Run the keygen command.
pub async fn run(cmd: &KeygenCmd) -> Result<(), Box<dyn std::error::Error>> {
    let path = match &cmd.out {
        Some(p) => p.clone(),
        None => default_hotkey_path()?,
    };
    let keypair = write_hotkey(&path, cmd.force)?;
    let identity = NodeIdentity::from_keypair(0, &keypair);

    println!("Hotkey created.");
    println!("  Public key: {}", hex::encode(keypair.public_key_bytes()));
    println!("  DID:        {}", identity.did);
    println!("  Secret:     {}", path.display());
    Ok(())
}

fn default_hotkey_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let home = dirs::home_dir().ok_or("Cannot determine home directory")?;
    Ok(home.join(".trawl").join("keys").join("hotkey.secret"))
}

/// Generate a keypair and write its secret to `path`.
fn write_hotkey(path: &Path, force: bool) -> Result<Keypair, Box<dyn std::error::Error>> {
    if path.exists() && !force {
        return Err(format!(
            "{} already exists; pass --force to replace it",
            path.display()
        )
        .into());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let keypair = Keypair::generate();
    fs::write(path, hex::encode(keypair.secret_bytes()))?;
    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_secret_round_trips_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("hotkey.secret");

        let keypair = write_hotkey(&path, false).unwrap();
        let loaded = Keypair::from_secret_hex(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded.public_key_bytes(), keypair.public_key_bytes());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hotkey.secret");

        let first = write_hotkey(&path, false).unwrap();
        assert!(write_hotkey(&path, false).is_err());
        let second = write_hotkey(&path, true).unwrap();
        assert_ne!(first.public_key_bytes(), second.public_key_bytes());
    }
}
