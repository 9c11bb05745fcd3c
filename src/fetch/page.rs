use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::FetchError;

const DIRECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROXY_TIMEOUT: Duration = Duration::from_secs(30);
/// Wrap width handed to html2text; wide so paragraphs stay on one line.
const TEXT_WIDTH: usize = 200;

/// Retrieves a page and returns it as readable text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Direct GET, then one retry through an optional forwarding proxy.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    proxy: Option<String>,
    direct_timeout: Duration,
    proxy_timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new(client: reqwest::Client, proxy: Option<String>) -> Self {
        Self {
            client,
            proxy,
            direct_timeout: DIRECT_TIMEOUT,
            proxy_timeout: PROXY_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, direct: Duration, proxied: Duration) -> Self {
        self.direct_timeout = direct;
        self.proxy_timeout = proxied;
        self
    }

    async fn get_html(&self, request_url: &str, target: &str, timeout: Duration) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(request_url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: target.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: target.to_string(),
                status: status.as_u16(),
            });
        }

        resp.text().await.map_err(|e| FetchError::Request {
            url: target.to_string(),
            message: e.to_string(),
        })
    }

    async fn get_html_with_fallback(&self, url: &Url) -> Result<String, FetchError> {
        let target = url.as_str();
        let direct = match self.get_html(target, target, self.direct_timeout).await {
            Ok(html) => return Ok(html),
            Err(e) => e,
        };

        let Some(proxy) = &self.proxy else {
            return Err(direct);
        };

        tracing::warn!(url = target, error = %direct, "direct fetch failed, retrying through proxy");
        let proxied_url = proxy_url(proxy, target).map_err(|message| FetchError::ProxyFallback {
            url: target.to_string(),
            direct: direct.to_string(),
            proxied: message,
        })?;

        self.get_html(proxied_url.as_str(), target, self.proxy_timeout)
            .await
            .map_err(|proxied| FetchError::ProxyFallback {
                url: target.to_string(),
                direct: direct.to_string(),
                proxied: proxied.to_string(),
            })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = validate_url(url)?;
        let html = self.get_html_with_fallback(&parsed).await?;
        html_to_text(&html).map_err(|message| FetchError::Convert {
            url: url.to_string(),
            message,
        })
    }
}

/// Accept only absolute `http`/`https` URLs.
pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
    let invalid = || FetchError::InvalidUrl(raw.to_string());
    if !(raw.starts_with("http://") || raw.starts_with("https://")) {
        return Err(invalid());
    }
    let url = Url::parse(raw).map_err(|_| invalid())?;
    if url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

/// `{proxy}?url={escaped target}`, keeping any query the proxy URL already has.
pub fn proxy_url(proxy: &str, target: &str) -> Result<Url, String> {
    let mut url = Url::parse(proxy).map_err(|e| format!("invalid proxy URL {proxy}: {e}"))?;
    url.query_pairs_mut().append_pair("url", target);
    Ok(url)
}

pub fn html_to_text(html: &str) -> Result<String, String> {
    html2text::from_read(Cursor::new(html.as_bytes()), TEXT_WIDTH).map_err(|e| e.to_string())
}
