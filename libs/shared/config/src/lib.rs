use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_ID_WIDTH: usize = 3;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    pub id_width: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            id_width: DEFAULT_ID_WIDTH,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let data_dir = match env::var("CLINIC_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => Some(PathBuf::from(dir)),
            _ => {
                warn!("CLINIC_DATA_DIR not set, records will only be kept in memory");
                None
            }
        };

        let bind_addr = env::var("CLINIC_BIND_ADDR")
            .ok()
            .and_then(|raw| match raw.parse::<SocketAddr>() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    warn!("CLINIC_BIND_ADDR '{}' is not a socket address, using {}", raw, DEFAULT_BIND_ADDR);
                    None
                }
            })
            .unwrap_or(defaults.bind_addr);

        let id_width = env::var("CLINIC_ID_WIDTH")
            .ok()
            .and_then(|raw| match raw.parse::<usize>() {
                Ok(width) if (1..=12).contains(&width) => Some(width),
                _ => {
                    warn!("CLINIC_ID_WIDTH '{}' is invalid, using {}", raw, DEFAULT_ID_WIDTH);
                    None
                }
            })
            .unwrap_or(defaults.id_width);

        Self {
            data_dir,
            bind_addr,
            id_width,
        }
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }
}
