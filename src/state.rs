//! Application state management

use std::sync::Arc;

use crate::assets::AssetCache;
use crate::config::Config;
use crate::palette::{PalettePicker, StubPalette};
use crate::service::PdfService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    assets: Arc<AssetCache>,
    pdf_service: PdfService,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let assets = Arc::new(AssetCache::new(&config.assets));
        let palette: Arc<dyn PalettePicker> = Arc::new(StubPalette);
        let pdf_service = PdfService::new(config.browser.clone(), assets.clone(), palette);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                assets,
                pdf_service,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn assets(&self) -> &AssetCache {
        &self.inner.assets
    }

    pub fn pdf_service(&self) -> &PdfService {
        &self.inner.pdf_service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::TemplateKey;
    use crate::config::{AssetConfig, BrowserConfig, Config, ServerConfig};

    #[tokio::test]
    async fn state_exposes_config_and_asset_cache() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("book-template-softcover.html"), "{{PAGES}}").unwrap();

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 9090,
            },
            browser: BrowserConfig {
                executable_path: "/usr/bin/chromium".into(),
            },
            assets: AssetConfig {
                dir: Some(dir.path().to_path_buf()),
                hot_reload: false,
            },
        };
        let state = AppState::new(config);

        assert_eq!(state.config().server.port, 9090);
        let templates = state.assets().templates().await.unwrap();
        assert!(templates.get(TemplateKey::Softcover).is_some());
    }
}
