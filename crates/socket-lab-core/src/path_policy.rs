use crate::error::{LabError, LabResult};
use socket_lab_abstract::TransferConfig;
use std::path::{Component, Path, PathBuf};

/// How the file receiver turns the path named by the first datagram into a
/// local file path. The path arrives from the network and is untrusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPolicy {
    /// Relative paths only, joined onto `base_dir`. Absolute paths and `..`
    /// components are rejected.
    Sandboxed { base_dir: PathBuf },
    /// Use the path exactly as received.
    Trusted,
}

impl PathPolicy {
    pub fn from_config(config: &TransferConfig) -> Self {
        if config.trust_paths {
            PathPolicy::Trusted
        } else {
            PathPolicy::Sandboxed {
                base_dir: config.base_dir.clone(),
            }
        }
    }

    /// Decode and resolve the raw payload of a path datagram.
    pub fn resolve_payload(&self, payload: &[u8]) -> LabResult<PathBuf> {
        if payload.is_empty() {
            return Err(LabError::EmptyPath);
        }
        let requested = std::str::from_utf8(payload)
            .map_err(|_| LabError::InvalidPath(String::from_utf8_lossy(payload).into_owned()))?;
        if requested.contains('\0') {
            return Err(LabError::InvalidPath(requested.to_string()));
        }
        self.resolve(requested)
    }

    pub fn resolve(&self, requested: &str) -> LabResult<PathBuf> {
        if requested.is_empty() {
            return Err(LabError::EmptyPath);
        }
        match self {
            PathPolicy::Trusted => Ok(PathBuf::from(requested)),
            PathPolicy::Sandboxed { base_dir } => {
                let mut relative = PathBuf::new();
                for component in Path::new(requested).components() {
                    match component {
                        Component::Normal(part) => relative.push(part),
                        Component::CurDir => {}
                        Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                            return Err(LabError::UnsafePath(requested.to_string()));
                        }
                    }
                }
                if relative.as_os_str().is_empty() {
                    return Err(LabError::InvalidPath(requested.to_string()));
                }
                Ok(base_dir.join(relative))
            }
        }
    }
}
