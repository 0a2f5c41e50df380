//! Group handlers
//!
//! Serve single files through a registered group. Explicit-map groups report
//! failures to the caller; folder groups answer errors themselves.

use super::{Flow, RouteHandler};
use crate::asset::AssetLoader;
use crate::error::Result;
use crate::http::{MaxAge, MimeTable, ServeRequest, ServeResponse};
use crate::registry::{Group, GroupRegistry, Resolution};
use crate::send::{Delivery, ErrorPolicy};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Options shared by `map` and `folder` registrations
#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
    /// Global root prepended to storage paths
    pub root: Option<PathBuf>,
    pub max_age: MaxAge,
}

pub struct GroupHandler {
    group: Arc<Group>,
    loader: Arc<dyn AssetLoader>,
    mime: Arc<MimeTable>,
    policy: ErrorPolicy,
}

impl GroupHandler {
    pub fn group(&self) -> &Group {
        &self.group
    }

    pub const fn policy(&self) -> ErrorPolicy {
        self.policy
    }
}

/// Register `group` and return the handler serving it
pub fn register(
    registry: &mut GroupRegistry,
    group: Group,
    loader: Arc<dyn AssetLoader>,
    mime: Arc<MimeTable>,
) -> GroupHandler {
    let policy = match group.resolution {
        Resolution::Explicit(_) => ErrorPolicy::Propagate,
        Resolution::Folder(_) => ErrorPolicy::Respond,
    };
    GroupHandler {
        group: registry.register(group),
        loader,
        mime,
        policy,
    }
}

/// Expose only the listed files under `/<name>/`
///
/// `urls` maps request-relative paths to storage paths.
pub fn map(
    registry: &mut GroupRegistry,
    loader: Arc<dyn AssetLoader>,
    name: &str,
    urls: HashMap<String, String>,
    options: GroupOptions,
) -> GroupHandler {
    let group = Group::explicit(format!("/{name}/"), urls)
        .with_root(options.root)
        .with_max_age(options.max_age);
    tracing::info!(prefix = %group.prefix, "serving static map");
    register(registry, group, loader, Arc::new(MimeTable::new()))
}

/// Expose everything under `dir` at `/<name>/`
pub fn folder(
    registry: &mut GroupRegistry,
    loader: Arc<dyn AssetLoader>,
    name: &str,
    dir: impl Into<PathBuf>,
    options: GroupOptions,
) -> GroupHandler {
    let group = Group::folder(format!("/{name}/"), dir)
        .with_root(options.root)
        .with_max_age(options.max_age);
    tracing::info!(prefix = %group.prefix, "serving static folder");
    register(registry, group, loader, Arc::new(MimeTable::new()))
}

#[async_trait(?Send)]
impl RouteHandler for GroupHandler {
    async fn handle(&self, req: &ServeRequest, res: &mut ServeResponse) -> Result<Flow> {
        let Some(remainder) = self.group.remainder(req.path()) else {
            return Ok(Flow::Next);
        };
        if remainder.is_empty() || !req.is_get_or_head() {
            return Ok(Flow::Next);
        }
        let Some(path) = self.group.resolve(remainder) else {
            return Ok(Flow::Next);
        };

        let loaded = self.loader.load(&path).await;
        let mut delivery = Delivery::new(req, res)
            .max_age(self.group.cache.max_age)
            .mime_table(&self.mime)
            .policy(self.policy);
        match loaded {
            Ok(asset) => delivery.pipe(&asset)?,
            Err(err) => delivery.error(err)?,
        }
        Ok(Flow::Handled)
    }
}
