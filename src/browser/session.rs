use crate::error::BrowserError;
use fantoccini::{Client, ClientBuilder};

/// Endpoints tried when the configured WebDriver URL does not answer
const FALLBACK_URLS: &[&str] = &[
    "http://localhost:9515", // ChromeDriver default
    "http://localhost:4723", // Appium default
    "http://localhost:9222", // Chrome debug port default
    "http://127.0.0.1:4444", // geckodriver by IP instead of localhost
];

/// Connects to the WebDriver instance, falling back to common local endpoints
pub async fn connect(webdriver_url: &str) -> Result<Client, BrowserError> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::info!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    for url in fallback_urls(webdriver_url) {
        ::log::info!("Trying fallback WebDriver URL: {}", url);
        // Fallback failures stay quiet to avoid log spam
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::info!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(BrowserError::Unreachable(webdriver_url.to_string()))
}

/// Fallback endpoints other than the one already tried
fn fallback_urls(tried: &str) -> impl Iterator<Item = &'static str> + '_ {
    FALLBACK_URLS.iter().copied().filter(move |url| *url != tried)
}
