pub mod file_name;
pub mod html;
pub mod script;
pub mod share;
pub mod size;
pub mod status;
pub mod text;

use std::{future::Future, sync::OnceLock, time::Duration};

use futures::{stream, StreamExt};
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    ClientBuilder,
};

pub const LANZOU_URL: &str = "https://pc.woozooo.com";

pub fn get_user_agent<'a>() -> &'a str {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36 Edg/138.0.0.0"
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub referer: Option<String>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: LANZOU_URL.into(),
            user_agent: get_user_agent().into(),
            referer: None,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
        }
    }
}

pub fn create_client() -> &'static reqwest::Client {
    static LAZZY_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    LAZZY_CLIENT.get_or_init(|| create_client_with(&ClientConfig::default()).unwrap())
}

pub fn create_client_with(config: &ClientConfig) -> anyhow::Result<reqwest::Client> {
    let client = create_client_builder(config)
        .default_headers(get_default_headers(config)?)
        .build()?;
    Ok(client)
}

pub fn create_client_builder(config: &ClientConfig) -> reqwest::ClientBuilder {
    ClientBuilder::new()
        .connect_timeout(config.connect_timeout)
        .read_timeout(config.read_timeout)
        .user_agent(config.user_agent.as_str())
        .danger_accept_invalid_certs(true)
        .cookie_store(true)
}

pub fn get_default_headers(config: &ClientConfig) -> anyhow::Result<HeaderMap> {
    let mut headers = HeaderMap::default();

    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,zh-TW;q=0.8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-origin"));
    if let Some(referer) = &config.referer {
        headers.insert(header::REFERER, referer.parse()?);
    }
    Ok(headers)
}

/// Sends a request to the service and checks the `zt` status of JSON replies.
pub async fn fetch_json(
    request_builder: reqwest::RequestBuilder,
) -> anyhow::Result<serde_json::Value> {
    let body = request_builder.send().await?.text().await?;
    Ok(status::check_status(&body)?)
}

/// Maps `items` with at most `limit` calls in flight, keeping input order.
pub async fn async_map<T, R, F, Fut>(items: Vec<T>, limit: usize, mut f: F) -> Vec<R>
where
    F: FnMut(T, usize) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items.into_iter().enumerate())
        .map(|(idx, item)| f(item, idx))
        .buffered(limit.max(1))
        .collect()
        .await
}
