// Token loading. The token is read once at startup and never written back.

use std::io;
use std::path::Path;

use crate::error::{PointsError, Result};

/// Read the credential file and return its trimmed contents.
///
/// An empty file is rejected here rather than producing requests the
/// server would refuse one by one.
pub fn load_token(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|source| PointsError::Credentials {
        path: path.to_path_buf(),
        source,
    })?;
    let token = raw.trim();
    if token.is_empty() {
        return Err(PointsError::Credentials {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, "token file is empty"),
        });
    }
    Ok(token.to_string())
}
