//! JSON I/O handling for CLI
//!
//! - Output: a single JSON object on stdout per command
//! - Key files: `{"secret_key": "<base64>"}`

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{CliError, CliResult};
use crate::identity::Keypair;

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });
    write_line(&response)
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_line(&response)
}

fn write_line(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct KeyFile {
    secret_key: String,
}

/// Load a signing keypair from a key file
pub fn read_keypair(path: &Path) -> CliResult<Keypair> {
    let content = fs::read_to_string(path)
        .map_err(|e| CliError::key_file(format!("Failed to read {}: {}", path.display(), e)))?;
    let file: KeyFile = serde_json::from_str(&content)
        .map_err(|e| CliError::key_file(format!("Malformed key file {}: {}", path.display(), e)))?;
    Keypair::from_base64(&file.secret_key)
        .map_err(|e| CliError::key_file(format!("Bad secret in {}: {}", path.display(), e)))
}

/// Key files hold a signing secret; owner read/write only
#[cfg(unix)]
const KEY_FILE_MODE: u32 = 0o600;

/// Write a key file, refusing to replace an existing one unless `force`
pub fn write_keypair(path: &Path, keypair: &Keypair, force: bool) -> CliResult<()> {
    if path.exists() && !force {
        return Err(CliError::key_file(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    let file = KeyFile {
        secret_key: keypair.secret_base64(),
    };
    let contents = serde_json::to_string_pretty(&file)?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(KEY_FILE_MODE);

    let mut out = options
        .open(path)
        .map_err(|e| CliError::key_file(format!("Failed to create {}: {}", path.display(), e)))?;
    // mode only applies on creation; a forced overwrite keeps the old bits
    #[cfg(unix)]
    out.set_permissions(fs::Permissions::from_mode(KEY_FILE_MODE))?;
    out.write_all(contents.as_bytes())?;
    out.sync_all()?;
    Ok(())
}
