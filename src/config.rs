//! Configuration management for the PDF rendering service

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub browser: BrowserConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Operator-pinned Chromium executable, tried before discovery.
    pub executable_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Explicit asset directory; when unset, conventional locations are
    /// probed in order.
    pub dir: Option<PathBuf>,
    /// Re-read template files on every render (template iteration mode).
    pub hot_reload: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            browser: BrowserConfig {
                executable_path: PathBuf::from("/usr/bin/chromium"),
            },
            assets: AssetConfig {
                dir: None,
                hot_reload: false,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let hot_flag = env::var("PDF_TEMPLATES_HOT")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .unwrap_or(8080),
            },
            browser: BrowserConfig {
                executable_path: env::var("CHROME_EXECUTABLE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/usr/bin/chromium")),
            },
            assets: AssetConfig {
                dir: env::var("ASSETS_DIR").ok().map(PathBuf::from),
                hot_reload: app_env != "production" || hot_flag,
            },
        }
    }
}
