use std::str::FromStr;

use anyhow::anyhow;
use reqwest::{header, Method};
use strum::VariantNames;
use url::Url;

use crate::{
    matcher::{self, ExtractError, Matcher, PageShape},
    models::*,
    utils::{self, create_client, size, ClientConfig},
};

const PAGE_CONCURRENCY: usize = 4;

pub fn init_logger() {
    let _ = env_logger::builder().try_init();
}

pub fn available_page_shapes() -> Vec<String> {
    PageShape::VARIANTS.iter().map(|s| s.to_string()).collect()
}

/// True when `err` came from a page that no longer matches its recipe.
/// Such failures need new recipes, retrying the same page will not help.
pub fn is_recipe_stale(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ExtractError>().is_some()
}

pub async fn format_script(html: String, page_url: Option<String>) -> anyhow::Result<PageScripts> {
    let matcher = default_matcher(page_url.as_deref())?;
    Ok(matcher.format_script(&html).await)
}

pub async fn parse_page(
    html: String,
    shape: String,
    password: Option<String>,
) -> anyhow::Result<Option<AjaxDescriptor>> {
    let shape = PageShape::from_str(&shape).map_err(|err| anyhow!(err))?;
    let matcher = default_matcher(None)?;
    let descriptor = matcher
        .parse_page(&html, shape, password.as_deref().unwrap_or_default())
        .await?;
    Ok(descriptor)
}

pub async fn parse_page_at(
    url: String,
    shape: String,
    password: Option<String>,
) -> anyhow::Result<Option<AjaxDescriptor>> {
    let shape = PageShape::from_str(&shape).map_err(|err| anyhow!(err))?;
    let html = create_client()
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let matcher = default_matcher(Some(&url))?;
    let descriptor = matcher
        .parse_page(&html, shape, password.as_deref().unwrap_or_default())
        .await?;
    Ok(descriptor)
}

pub async fn parse_pages_at(
    urls: Vec<String>,
    shape: String,
    password: Option<String>,
) -> anyhow::Result<Vec<Option<AjaxDescriptor>>> {
    let results = utils::async_map(urls, PAGE_CONCURRENCY, |url, _| {
        parse_page_at(url, shape.clone(), password.clone())
    })
    .await;
    results.into_iter().collect()
}

/// Sends a recovered request from the page at `page_url` and returns the
/// checked JSON reply.
pub async fn send_request(
    descriptor: AjaxDescriptor,
    page_url: String,
) -> anyhow::Result<serde_json::Value> {
    let url = Url::parse(&page_url)?.join(&descriptor.url)?;
    let method = Method::from_str(&descriptor.method.to_uppercase())?;

    let mut request = create_client()
        .request(method.clone(), url)
        .header(header::REFERER, page_url.as_str());
    if let Some(data) = &descriptor.data {
        request = if method == Method::GET {
            request.query(data)
        } else {
            request.form(data)
        };
    }

    utils::fetch_json(request).await
}

pub fn match_iframe(html: String) -> Option<String> {
    matcher::match_iframe(&html)
}

pub fn parse_error_page(html: String) -> String {
    matcher::parse_error_page(&html)
}

pub fn parse_share(text: String) -> Option<Share> {
    utils::share::parse_share(&text)
}

pub fn size_to_byte(text: String) -> Option<u64> {
    size::size_to_byte(&text, size::DEFAULT_STEP)
}

pub fn byte_to_size(bytes: u64) -> String {
    size::byte_to_size(bytes, size::DEFAULT_STEP).unwrap_or_default()
}

fn default_matcher(page_url: Option<&str>) -> anyhow::Result<Matcher<&'static reqwest::Client>> {
    let base_url = match page_url {
        Some(page_url) => Url::parse(page_url)?,
        None => Url::parse(&ClientConfig::default().base_url)?,
    };
    Ok(Matcher::new(create_client()).with_base_url(base_url))
}
