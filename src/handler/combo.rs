//! Combo handler
//!
//! Serves several assets concatenated into one response:
//! `GET /combo?/yui/a.js~/yui/b.js` returns `a.js` followed by `b.js`.
//!
//! Members are loaded concurrently on the local executor and joined in
//! request order once every load has completed. The first failure answers
//! the request; loads still in flight keep running and their results are
//! discarded.

use super::{Flow, RouteHandler};
use crate::asset::{Asset, AssetLoader};
use crate::error::{Result, ServeError};
use crate::http::{MaxAge, MimeTable, ServeRequest, ServeResponse};
use crate::registry::GroupRegistry;
use crate::send::{Delivery, ErrorPolicy};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use hyper::header::CONTENT_TYPE;
use std::sync::Arc;

/// Combo endpoint settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboOptions {
    /// URL prefix of combo requests, query mark included. Empty by default,
    /// which makes every URL a combo request.
    pub base: String,
    /// Member separator
    pub separator: String,
    pub max_age: MaxAge,
}

impl Default for ComboOptions {
    fn default() -> Self {
        Self {
            base: String::new(),
            separator: "~".to_string(),
            max_age: MaxAge::default(),
        }
    }
}

/// Split a combo URL into its member paths.
///
/// Returns `Ok(None)` when `url` is not a combo request, and
/// `ServeError::EmptyCombo` when it names no member. Empty segments (as in
/// `a.js~~b.js`) are kept and later fail to resolve.
pub fn parse_combo_url<'u>(
    url: &'u str,
    base: &str,
    separator: &str,
) -> Result<Option<Vec<&'u str>>> {
    let Some(rest) = url.strip_prefix(base) else {
        return Ok(None);
    };
    if rest.is_empty() {
        return Err(ServeError::EmptyCombo);
    }
    Ok(Some(rest.split(separator).collect()))
}

/// The one content type shared by every member.
///
/// Decided from names alone, before any I/O.
pub fn common_content_type(members: &[&str], mime: &MimeTable) -> Result<String> {
    let mut seen: Vec<String> = Vec::new();
    for member in members {
        let content_type = mime.content_type(member);
        if !seen.contains(&content_type) {
            seen.push(content_type);
        }
    }
    if seen.len() > 1 {
        tracing::debug!(types = ?seen, "mixed content types in combo request");
        return Err(ServeError::MixedContentTypes);
    }
    seen.pop().ok_or(ServeError::EmptyCombo)
}

pub struct ComboHandler {
    registry: Arc<GroupRegistry>,
    loader: Arc<dyn AssetLoader>,
    mime: Arc<MimeTable>,
    options: ComboOptions,
}

impl ComboHandler {
    pub fn new(
        registry: Arc<GroupRegistry>,
        loader: Arc<dyn AssetLoader>,
        mime: Arc<MimeTable>,
        options: ComboOptions,
    ) -> Self {
        Self {
            registry,
            loader,
            mime,
            options,
        }
    }

    pub const fn options(&self) -> &ComboOptions {
        &self.options
    }

    /// Load every member concurrently and return them in request order.
    ///
    /// Must run inside a `tokio::task::LocalSet`.
    pub async fn load_all(&self, members: &[&str]) -> Result<Vec<Asset>> {
        let mut pending: FuturesUnordered<_> = members
            .iter()
            .enumerate()
            .map(|(index, member)| {
                let path = self.registry.resolve(member);
                let loader = Arc::clone(&self.loader);
                let member = (*member).to_string();
                let handle = tokio::task::spawn_local(async move {
                    match path {
                        Some(path) => loader.load(&path).await,
                        None => Err(ServeError::NotFound(member)),
                    }
                });
                async move { (index, handle.await) }
            })
            .collect();

        let mut slots: Vec<Option<Asset>> = vec![None; members.len()];
        let mut remaining = members.len();
        while let Some((index, joined)) = pending.next().await {
            // Returning here drops the join handles, which detaches the
            // remaining loads instead of aborting them.
            let asset = joined
                .map_err(|e| ServeError::Internal(format!("combo member task failed: {e}")))??;
            slots[index] = Some(asset);
            remaining -= 1;
            tracing::trace!(index, remaining, "combo member loaded");
        }

        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ServeError::Internal("combo member missing after join".into()))
    }
}

#[async_trait(?Send)]
impl RouteHandler for ComboHandler {
    async fn handle(&self, req: &ServeRequest, res: &mut ServeResponse) -> Result<Flow> {
        if !req.is_get_or_head() {
            return Ok(Flow::Next);
        }
        let Some(members) = parse_combo_url(&req.url, &self.options.base, &self.options.separator)?
        else {
            return Ok(Flow::Next);
        };

        let content_type = common_content_type(&members, &self.mime)?;
        tracing::debug!(count = members.len(), %content_type, "combo request");

        let parts = self.load_all(&members).await?;
        let asset = Asset::concat(&parts);

        res.set_header(CONTENT_TYPE, &content_type);
        Delivery::new(req, res)
            .max_age(self.options.max_age)
            .mime_table(&self.mime)
            .policy(ErrorPolicy::Propagate)
            .pipe(&asset)?;
        Ok(Flow::Handled)
    }
}
