//! File movement between the host and the containers, plus a scope-bound
//! remote temp file.

use std::path::Path;

use log::{debug, warn};
use uuid::Uuid;

use crate::container::Container;
use crate::error::Result;
use crate::process;

/// Directory inside the containers used for scoped uploads.
pub const CONTAINER_TMP: &str = "/tmp";

impl Container {
    /// `docker cp` a local file or directory into `container` at `remote`.
    pub fn copy_from_local(&self, local: &Path, remote: &str, container: &str) -> Result<()> {
        let src = local.display().to_string();
        let dst = format!("{container}:{remote}");
        process::run("docker", ["cp", src.as_str(), dst.as_str()])?.into_transfer_result()?;
        Ok(())
    }

    /// `docker cp` a path out of `container` to the local filesystem.
    pub fn download_from_container(&self, remote: &str, local: &Path, container: &str) -> Result<()> {
        let src = format!("{container}:{remote}");
        let dst = local.display().to_string();
        process::run("docker", ["cp", src.as_str(), dst.as_str()])?.into_transfer_result()?;
        Ok(())
    }

    /// Recursive forced removal inside `container`.
    pub fn delete(&self, path: &str, container: &str) -> Result<()> {
        process::exec(container, ["rm", "-rf", path])?.into_transfer_result()?;
        Ok(())
    }

    /// Upload `local` to a randomly named path under [`CONTAINER_TMP`] inside
    /// `container`. The file lives as long as the returned handle: it is
    /// removed on [`TempFile::release`] or on drop, including during unwind.
    pub fn upload_temp_file(&self, local: &Path, container: &str) -> Result<TempFile<'_>> {
        let remote = format!("{}/{}", CONTAINER_TMP, Uuid::new_v4());
        self.copy_from_local(local, &remote, container)?;
        debug!("uploaded {} to {container}:{remote}", local.display());
        Ok(TempFile {
            owner: self,
            container: container.to_string(),
            remote,
            released: false,
        })
    }
}

/// An ephemeral file inside one container, owned by the scope holding this
/// handle. Cleanup is best effort: if the container goes away mid-scope, drop
/// only logs the failure.
#[derive(Debug)]
pub struct TempFile<'a> {
    owner: &'a Container,
    container: String,
    remote: String,
    released: bool,
}

impl TempFile<'_> {
    /// Path of the file inside the container.
    pub fn path(&self) -> &str {
        &self.remote
    }

    /// Remove the remote file now and surface any failure, instead of
    /// waiting for drop.
    pub fn release(mut self) -> Result<()> {
        self.delete_remote()
    }

    fn delete_remote(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.owner.delete(&self.remote, &self.container)
    }
}

impl Drop for TempFile<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.delete_remote() {
            warn!("failed to remove {}:{}: {e}", self.container, self.remote);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_paths_live_under_the_container_tmp_dir() {
        // the remote path is derived before any docker call happens
        let remote = format!("{}/{}", CONTAINER_TMP, Uuid::new_v4());
        assert!(remote.starts_with("/tmp/"));
    }

    #[test]
    fn temp_paths_are_unique_per_acquisition() {
        let a = format!("{}/{}", CONTAINER_TMP, Uuid::new_v4());
        let b = format!("{}/{}", CONTAINER_TMP, Uuid::new_v4());
        assert_ne!(a, b);
    }
}
