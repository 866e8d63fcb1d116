use std::path::Path;

use tracing::debug;

use crate::error::{Result, TransportError};

/// Numeric key shared by every process that opens the same channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelKey(pub i32);

impl ChannelKey {
    /// Key that always creates a new, unshared channel.
    pub const PRIVATE: ChannelKey = ChannelKey(0);

    /// Derive a key from an existing path and a project id.
    ///
    /// Uses the same formula as `ftok(3)` on glibc and the BSDs, so keys agree
    /// with other programs that call `ftok` on the same path:
    /// `(proj & 0xff) << 24 | (st_dev & 0xff) << 16 | (st_ino & 0xffff)`.
    #[cfg(unix)]
    pub fn from_path(path: impl AsRef<Path>, proj_id: u8) -> Result<Self> {
        use std::os::unix::fs::MetadataExt;

        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| TransportError::KeyPath {
            path: path.to_path_buf(),
            source: e,
        })?;

        let key = (u32::from(proj_id) << 24)
            | (((metadata.dev() & 0xff) as u32) << 16)
            | ((metadata.ino() & 0xffff) as u32);
        let key = ChannelKey(key as i32);
        debug!(?path, proj_id, key = key.0, "derived channel key");
        Ok(key)
    }

    /// Whether this is the private key.
    pub fn is_private(self) -> bool {
        self == Self::PRIVATE
    }

    /// The raw host key.
    pub fn raw(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0 as u32)
    }
}
