use crate::config::{EchoConfig, LabConfig, TransferConfig};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// On-disk configuration profile. Every field is optional and only the
/// fields present replace the defaults.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct LabProfile {
    #[serde(default)]
    pub echo: EchoOverride,
    #[serde(default)]
    pub transfer: TransferOverride,
}

impl LabProfile {
    pub fn apply_to(&self, config: &mut LabConfig) {
        self.echo.apply_to(&mut config.echo);
        self.transfer.apply_to(&mut config.transfer);
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct EchoOverride {
    pub bind: Option<SocketAddr>,
    pub server: Option<SocketAddr>,
    pub backlog: Option<u32>,
    pub max_frame: Option<usize>,
}

impl EchoOverride {
    pub fn apply_to(&self, config: &mut EchoConfig) {
        if let Some(v) = self.bind {
            config.bind = v;
        }
        if let Some(v) = self.server {
            config.server = v;
        }
        if let Some(v) = self.backlog {
            config.backlog = v;
        }
        if let Some(v) = self.max_frame {
            config.max_frame = v;
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct TransferOverride {
    pub bind: Option<SocketAddr>,
    pub buffer_size: Option<usize>,
    pub base_dir: Option<PathBuf>,
    pub trust_paths: Option<bool>,
    pub pin_sender: Option<bool>,
    pub idle_timeout_ms: Option<u64>,
}

impl TransferOverride {
    pub fn apply_to(&self, config: &mut TransferConfig) {
        if let Some(v) = self.bind {
            config.bind = v;
        }
        if let Some(v) = self.buffer_size {
            config.buffer_size = v;
        }
        if let Some(v) = &self.base_dir {
            config.base_dir = v.clone();
        }
        if let Some(v) = self.trust_paths {
            config.trust_paths = v;
        }
        if let Some(v) = self.pin_sender {
            config.pin_sender = v;
        }
        if let Some(v) = self.idle_timeout_ms {
            config.idle_timeout_ms = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_keeps_defaults() {
        let mut config = LabConfig::default();
        LabProfile::default().apply_to(&mut config);
        assert_eq!(config, LabConfig::default());
    }

    #[test]
    fn present_fields_replace_defaults() {
        let mut config = LabConfig::default();
        let profile = LabProfile {
            echo: EchoOverride {
                backlog: Some(16),
                ..Default::default()
            },
            transfer: TransferOverride {
                base_dir: Some(PathBuf::from("received")),
                idle_timeout_ms: Some(250),
                ..Default::default()
            },
        };
        profile.apply_to(&mut config);

        assert_eq!(config.echo.backlog, 16);
        assert_eq!(config.echo.max_frame, EchoConfig::default().max_frame);
        assert_eq!(config.transfer.base_dir, PathBuf::from("received"));
        assert_eq!(config.transfer.idle_timeout_ms, Some(250));
        assert!(!config.transfer.trust_paths);
    }

    #[test]
    fn later_overrides_win() {
        let mut config = EchoConfig::default();
        let from_file = EchoOverride {
            bind: Some("127.0.0.1:9000".parse().unwrap()),
            backlog: Some(8),
            ..Default::default()
        };
        let from_flags = EchoOverride {
            bind: Some("127.0.0.1:9100".parse().unwrap()),
            ..Default::default()
        };
        from_file.apply_to(&mut config);
        from_flags.apply_to(&mut config);

        assert_eq!(config.bind, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.backlog, 8);
    }
}
