// Application state module
// Composition root: turns configuration into the registry and handler chain

use std::sync::Arc;

use super::types::{Config, GroupKind};
use crate::asset::AssetLoader;
use crate::handler::{self, ComboHandler, ComboOptions, GroupOptions, Router};
use crate::http::MimeTable;
use crate::registry::GroupRegistry;

/// Application state shared by every connection of one worker
pub struct AppState {
    pub config: Config,
    pub registry: Arc<GroupRegistry>,
    pub router: Router,
}

impl AppState {
    /// Register every configured group, then put the combo handler (if
    /// enabled) in front of the group handlers.
    pub fn new(config: &Config, loader: Arc<dyn AssetLoader>) -> Self {
        let mut registry = GroupRegistry::new();
        let mut group_handlers = Vec::with_capacity(config.groups.len());
        for group in &config.groups {
            let options = GroupOptions {
                root: config.root.clone(),
                max_age: group.max_age,
            };
            let loader = Arc::clone(&loader);
            let handler = match &group.kind {
                GroupKind::Map { urls } => {
                    handler::map(&mut registry, loader, &group.name, urls.clone(), options)
                }
                GroupKind::Folder { path } => {
                    handler::folder(&mut registry, loader, &group.name, path, options)
                }
            };
            group_handlers.push(handler);
        }
        let registry = Arc::new(registry);

        let mut router = Router::new();
        if config.combo.enabled {
            let mime = Arc::new(MimeTable::with_overrides(&config.combo.mime_types));
            let options = ComboOptions {
                base: config.combo.base.clone(),
                separator: config.combo.separator.clone(),
                max_age: config.combo.max_age,
            };
            tracing::info!(base = %options.base, "enabling combo");
            router.push(ComboHandler::new(
                Arc::clone(&registry),
                loader,
                mime,
                options,
            ));
        }
        for handler in group_handlers {
            router.push(handler);
        }

        Self {
            config: config.clone(),
            registry,
            router,
        }
    }
}
