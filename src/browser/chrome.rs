use crate::config::BrowserSettings;
use crate::error::{ParityError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Interval between polls in [`ChromeDriver::wait_for`]
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct ChromeDriver {
    browser: Browser,
    temp_dir: PathBuf,
    page_timeout: Duration,
}

/// How to launch the local Chrome
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Chrome binary; the system install is used when unset
    pub chrome_path: Option<String>,
    pub no_sandbox: bool,
    pub headless: bool,
}

impl ChromeDriver {
    /// Current page, excluding Chrome's own pages; creates one if none exist
    async fn get_active_page(&self) -> Result<Page> {
        let pages = self.browser.pages().await?;

        for page in pages.iter() {
            if let Ok(Some(url)) = page.url().await {
                if !url.starts_with("chrome://") {
                    return Ok(page.clone());
                }
            }
        }

        if let Some(page) = pages.last() {
            return Ok(page.clone());
        }

        self.browser
            .new_page("about:blank")
            .await
            .map_err(|e| ParityError::Other(format!("Failed to create page: {}", e)))
    }

    /// Launch using the browser section of the configuration
    pub async fn from_settings(settings: &BrowserSettings) -> Result<Self> {
        let mut driver = Self::new(LaunchOptions {
            chrome_path: settings.chrome_path.clone(),
            no_sandbox: settings.no_sandbox,
            headless: settings.headless,
        })
        .await?;
        driver.page_timeout = settings.page_timeout();
        Ok(driver)
    }

    pub async fn new(options: LaunchOptions) -> Result<Self> {
        // Unique profile per instance so parallel runs don't share state
        let unique_id = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let temp_dir = std::env::temp_dir().join(format!(
            "discover-parity-{}-{}",
            std::process::id(),
            unique_id
        ));
        std::fs::create_dir_all(&temp_dir).map_err(|e| {
            ParityError::LaunchFailed(format!("Failed to create temp directory: {}", e))
        })?;

        let mut config = if options.headless {
            BrowserConfig::builder()
        } else {
            BrowserConfig::builder().with_head()
        };

        config = config.user_data_dir(&temp_dir);

        if options.no_sandbox {
            config = config.arg("--no-sandbox");
        }
        config = config.arg("--disable-dev-shm-usage").arg("--disable-gpu");

        if let Some(path) = &options.chrome_path {
            config = config.chrome_executable(path);
        }

        let config = config.build().map_err(|e| {
            ParityError::LaunchFailed(format!(
                "{}. Install Chrome/Chromium or set browser.chrome_path",
                e
            ))
        })?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ParityError::LaunchFailed(e.to_string()))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        log::info!("Launched Chrome (headless: {})", options.headless);

        Ok(Self {
            browser,
            temp_dir,
            page_timeout: BrowserSettings::default().page_timeout(),
        })
    }

    pub fn page_timeout(&self) -> Duration {
        self.page_timeout
    }

    /// Navigate and wait for the load to finish, bounded by the page timeout
    pub async fn navigate(&self, url: &str) -> Result<()> {
        log::info!("Navigating to {}", url);
        let page = self.get_active_page().await?;

        match tokio::time::timeout(self.page_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {
                log::debug!("Navigation to {} completed", url);
                Ok(())
            }
            Ok(Err(e)) => {
                let message = e.to_string();
                if message.contains("oneshot canceled") {
                    Err(ParityError::NavigationFailed(
                        "Browser connection lost. The browser may have been closed or crashed."
                            .to_string(),
                    ))
                } else {
                    Err(ParityError::NavigationFailed(format!(
                        "Failed to navigate to {}: {}",
                        url, message
                    )))
                }
            }
            Err(_) => Err(ParityError::Timeout {
                what: format!("navigation to {}", url),
                ms: self.page_timeout.as_millis() as u64,
            }),
        }
    }

    /// Poll a JavaScript boolean expression until it is true
    ///
    /// Evaluation errors count as "not yet" so a page that is still loading
    /// does not abort the wait.
    pub async fn wait_for(&self, condition_js: &str, timeout: Duration, poll: Duration) -> Result<()> {
        let page = self.get_active_page().await?;
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let ready = match page.evaluate(condition_js).await {
                Ok(result) => result.into_value::<bool>().unwrap_or(false),
                Err(e) => {
                    log::debug!("Condition evaluation failed, retrying: {}", e);
                    false
                }
            };
            if ready {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ParityError::Timeout {
                    what: condition_js.to_string(),
                    ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(poll).await;
        }
    }

    pub async fn current_url(&self) -> Result<String> {
        let page = self.get_active_page().await?;

        let url = page
            .url()
            .await
            .map_err(|e| ParityError::Other(e.to_string()))?
            .ok_or(ParityError::NoPage)?;

        Ok(url)
    }

    /// Execute JavaScript and deserialize the result
    pub async fn execute_script_typed<T: serde::de::DeserializeOwned>(
        &self,
        script: &str,
    ) -> Result<T> {
        let page = self.get_active_page().await?;

        let result = page
            .evaluate(script)
            .await
            .map_err(|e| ParityError::Other(format!("Script execution failed: {}", e)))?;

        result
            .into_value()
            .map_err(|e| ParityError::Other(format!("Failed to deserialize result: {}", e)))
    }

    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let page = self.get_active_page().await?;

        let screenshot = page
            .screenshot(chromiumoxide::page::ScreenshotParams::default())
            .await
            .map_err(|e| ParityError::Other(format!("Failed to take screenshot: {}", e)))?;

        Ok(screenshot)
    }

    pub async fn screenshot_to_file(&self, path: &Path) -> Result<()> {
        let screenshot_data = self.screenshot().await?;

        tokio::fs::write(path, screenshot_data).await?;
        log::info!("Screenshot saved: {}", path.display());

        Ok(())
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| ParityError::Other(e.to_string()))?;
        Ok(())
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        if self.temp_dir.exists() {
            let _ = std::fs::remove_dir_all(&self.temp_dir);
        }
    }
}
