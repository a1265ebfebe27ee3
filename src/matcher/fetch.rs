use std::sync::OnceLock;

use log::warn;
use regex::RegexSet;
use url::Url;

use crate::utils::text::to_full_url;

/// Third-party scripts that never carry request parameters.
const DENYLIST: &[&str] = &[r"jquery\.js", r"qrcode\.min\.js", r"bd\.js", r"hm\.js"];

pub trait ScriptFetcher {
    async fn fetch_text(&self, url: &str) -> anyhow::Result<String>;
}

impl ScriptFetcher for reqwest::Client {
    async fn fetch_text(&self, url: &str) -> anyhow::Result<String> {
        let text = self
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }
}

impl<T: ScriptFetcher> ScriptFetcher for &T {
    async fn fetch_text(&self, url: &str) -> anyhow::Result<String> {
        (**self).fetch_text(url).await
    }
}

pub fn is_denied(src: &str) -> bool {
    static DENYLIST_SET: OnceLock<RegexSet> = OnceLock::new();
    DENYLIST_SET
        .get_or_init(|| RegexSet::new(DENYLIST).unwrap())
        .is_match(src)
}

pub fn resolve_source(base: Option<&Url>, src: &str) -> String {
    match base.and_then(|base| base.join(src).ok()) {
        Some(url) => url.into(),
        None => to_full_url(src),
    }
}

pub async fn fetch_all<F: ScriptFetcher>(fetcher: &F, sources: &[String]) -> Vec<String> {
    let futures = sources.iter().map(|src| async move {
        match fetcher.fetch_text(src).await {
            Ok(text) => text,
            Err(err) => {
                warn!("[matcher] script {src} not loaded: {err}");
                String::new()
            }
        }
    });

    futures::future::join_all(futures).await
}
