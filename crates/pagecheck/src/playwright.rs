//! Playwright browser automation
//!
//! The page is driven by a small Node script talking newline-delimited JSON
//! over the child's stdin/stdout. The script loads the target once and then
//! answers queries until it is told to close.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{PageCheckError, PageCheckResult};
use crate::page::{Page, PageDiagnostic, Viewport};

const DRIVER_SCRIPT: &str = include_str!("driver.js");

/// Extra time the driver gets on top of the navigation timeout to launch the
/// browser before the first event is due.
const LAUNCH_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport: Viewport,

    /// Bound on launching the page and waiting for network idle
    pub navigation_timeout: Duration,

    /// Bound on each individual query
    pub query_timeout: Duration,

    /// How long `close` waits for the driver before killing it
    pub close_timeout: Duration,

    /// Node executable
    pub node_binary: PathBuf,

    /// `NODE_PATH` for resolving the `playwright` package (None = ./node_modules)
    pub node_path: Option<PathBuf>,

    /// Verify `npx playwright --version` before launching
    pub check_install: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport: Viewport::default(),
            navigation_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(5),
            node_binary: PathBuf::from("node"),
            node_path: None,
            check_install: true,
        }
    }
}

/// Launch parameters handed to the driver script
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LaunchParams<'a> {
    browser: &'static str,
    headless: bool,
    viewport: Viewport,
    url: &'a str,
    navigation_timeout_ms: u64,
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    id: u64,
    #[serde(flatten)]
    op: Op<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Op<'a> {
    Count { selector: &'a str },
    Attributes { selector: &'a str, attribute: &'a str },
    Texts { selector: &'a str },
    Style { selector: &'a str, property: &'a str },
    Viewport { width: u32, height: u32 },
    Diagnostics,
    Close,
}

impl Op<'_> {
    fn describe(&self) -> String {
        match self {
            Op::Count { selector } => format!("count:{}", selector),
            Op::Attributes { selector, attribute } => format!("attribute:{}@{}", selector, attribute),
            Op::Texts { selector } => format!("texts:{}", selector),
            Op::Style { selector, property } => format!("style:{}@{}", selector, property),
            Op::Viewport { width, height } => format!("viewport:{}x{}", width, height),
            Op::Diagnostics => "diagnostics".to_string(),
            Op::Close => "close".to_string(),
        }
    }
}

/// First line the driver prints once the page is loaded (or not)
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum DriverEvent {
    Ready { title: String },
    Fatal { stage: String, error: String },
}

#[derive(Debug, Deserialize)]
struct Response {
    id: Option<u64>,
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

struct DriverIo {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// A page loaded in a Playwright-controlled browser
pub struct PlaywrightPage {
    io: Mutex<DriverIo>,
    child: Child,
    next_id: AtomicU64,
    title: String,
    query_timeout: Duration,
    close_timeout: Duration,

    // Holds the driver script for as long as node runs it
    _script_dir: TempDir,
}

impl PlaywrightPage {
    /// Launch the browser and navigate to `url`, waiting for network idle
    pub async fn launch(config: &DriverConfig, url: &Url) -> PageCheckResult<Self> {
        let node_path = match &config.node_path {
            Some(path) => path.clone(),
            None => std::env::current_dir()?.join("node_modules"),
        };

        if config.check_install {
            Self::check_playwright_installed(&node_path).await?;
        }

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("driver.js");
        std::fs::write(&script_path, DRIVER_SCRIPT)?;

        let params = serde_json::to_string(&LaunchParams {
            browser: config.browser.as_str(),
            headless: config.headless,
            viewport: config.viewport,
            url: url.as_str(),
            navigation_timeout_ms: config.navigation_timeout.as_millis() as u64,
        })?;

        info!("Launching {} for {}", config.browser.as_str(), url);
        debug!("Driver script: {}", script_path.display());

        let mut child = Command::new(&config.node_binary)
            .arg(&script_path)
            .arg(&params)
            .env("NODE_PATH", &node_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PageCheckError::DriverStartup(format!(
                    "Failed to spawn {}: {}",
                    config.node_binary.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PageCheckError::DriverStartup("driver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| PageCheckError::DriverStartup("driver stdout unavailable".to_string()))?;
        let mut stdout = BufReader::new(stdout).lines();

        let wait = config.navigation_timeout + LAUNCH_GRACE;
        let first = timeout(wait, stdout.next_line())
            .await
            .map_err(|_| PageCheckError::Timeout(format!("page load of {}", url)))??
            .ok_or(PageCheckError::DriverExited)?;

        let title = loaded_title(&first, url)?;

        info!("Page loaded successfully: {}", title);

        Ok(Self {
            io: Mutex::new(DriverIo { stdin, stdout }),
            child,
            next_id: AtomicU64::new(1),
            title,
            query_timeout: config.query_timeout,
            close_timeout: config.close_timeout,
            _script_dir: script_dir,
        })
    }

    /// Check if Playwright is installed where the driver will look for it
    async fn check_playwright_installed(node_path: &Path) -> PageCheckResult<()> {
        let output = install_check_command(node_path).status().await;

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(PageCheckError::PlaywrightNotFound),
        }
    }

    /// Document title as reported once the page finished loading
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Close the browser and reap the driver process.
    ///
    /// Always tears the process down, even when the driver no longer answers.
    pub async fn close(mut self) -> PageCheckResult<()> {
        let acked = timeout(self.close_timeout, self.request::<()>(Op::Close)).await;
        match acked {
            Ok(Ok(())) => debug!("Driver closed the browser"),
            Ok(Err(e)) => warn!("Driver did not acknowledge close: {}", e),
            Err(_) => warn!("Driver did not acknowledge close within {:?}", self.close_timeout),
        }

        if let Ok(status) = timeout(self.close_timeout, self.child.wait()).await {
            debug!("Driver exited with {:?}", status?);
            return Ok(());
        }

        // Try graceful shutdown first
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id() {
                info!("Stopping driver (pid: {})", pid);
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                    && timeout(Duration::from_millis(500), self.child.wait()).await.is_ok()
                {
                    return Ok(());
                }
            }
        }

        // Force kill if still running
        self.child.kill().await?;
        Ok(())
    }

    async fn request<T: DeserializeOwned>(&self, op: Op<'_>) -> PageCheckResult<T> {
        let what = op.describe();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut line = serde_json::to_string(&Request { id, op })?;
        line.push('\n');

        let mut io = self.io.lock().await;
        io.stdin.write_all(line.as_bytes()).await.map_err(driver_io)?;
        io.stdin.flush().await.map_err(driver_io)?;

        let response = timeout(self.query_timeout, read_response(&mut io.stdout, id))
            .await
            .map_err(|_| PageCheckError::Timeout(format!("{} after {:?}", what, self.query_timeout)))??;

        if !response.ok {
            return Err(PageCheckError::Query(
                response.error.unwrap_or_else(|| format!("{} failed", what)),
            ));
        }
        Ok(serde_json::from_value(response.value)?)
    }
}

/// Interpret the driver's first line: the page title once loaded, or why not
fn loaded_title(first: &str, url: &Url) -> PageCheckResult<String> {
    match serde_json::from_str::<DriverEvent>(first) {
        Ok(DriverEvent::Ready { title }) => Ok(title),
        Ok(DriverEvent::Fatal { stage, error }) if stage == "navigate" => Err(PageCheckError::Navigation {
            target: url.to_string(),
            reason: error,
        }),
        Ok(DriverEvent::Fatal { stage, error }) => {
            Err(PageCheckError::DriverStartup(format!("{}: {}", stage, error)))
        }
        Err(e) => Err(PageCheckError::Protocol(format!(
            "unexpected first line {:?}: {}",
            first, e
        ))),
    }
}

fn install_check_command(node_path: &Path) -> Command {
    let mut command = Command::new("npx");
    command
        .args(["playwright", "--version"])
        .env("NODE_PATH", node_path)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    command
}

/// Read lines until the response for `id` shows up.
///
/// Responses to requests that already timed out are skipped.
async fn read_response(
    stdout: &mut Lines<BufReader<ChildStdout>>,
    id: u64,
) -> PageCheckResult<Response> {
    loop {
        let line = stdout
            .next_line()
            .await
            .map_err(driver_io)?
            .ok_or(PageCheckError::DriverExited)?;
        if line.trim().is_empty() {
            continue;
        }

        let response: Response = serde_json::from_str(&line)
            .map_err(|e| PageCheckError::Protocol(format!("{:?}: {}", line, e)))?;
        match response.id {
            Some(got) if got == id => return Ok(response),
            Some(got) => debug!("Skipping stale response {} (waiting for {})", got, id),
            None => warn!(
                "Driver rejected a request: {}",
                response.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

fn driver_io(e: std::io::Error) -> PageCheckError {
    match e.kind() {
        std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::UnexpectedEof => PageCheckError::DriverExited,
        _ => PageCheckError::Io(e),
    }
}

#[async_trait]
impl Page for PlaywrightPage {
    async fn count(&self, selector: &str) -> PageCheckResult<usize> {
        self.request(Op::Count { selector }).await
    }

    async fn attributes(&self, selector: &str, attribute: &str) -> PageCheckResult<Vec<Option<String>>> {
        self.request(Op::Attributes { selector, attribute }).await
    }

    async fn texts(&self, selector: &str) -> PageCheckResult<Vec<String>> {
        self.request(Op::Texts { selector }).await
    }

    async fn computed_style(&self, selector: &str, property: &str) -> PageCheckResult<Option<String>> {
        self.request(Op::Style { selector, property }).await
    }

    async fn set_viewport(&self, viewport: Viewport) -> PageCheckResult<()> {
        self.request(Op::Viewport {
            width: viewport.width,
            height: viewport.height,
        })
        .await
    }

    async fn diagnostics(&self) -> PageCheckResult<Vec<PageDiagnostic>> {
        self.request(Op::Diagnostics).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = Request {
            id: 7,
            op: Op::Attributes {
                selector: "a[href^='tel:']",
                attribute: "href",
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": 7,
                "op": "attributes",
                "selector": "a[href^='tel:']",
                "attribute": "href",
            })
        );

        let close = serde_json::to_value(&Request { id: 8, op: Op::Close }).unwrap();
        assert_eq!(close, serde_json::json!({ "id": 8, "op": "close" }));
    }

    #[test]
    fn test_launch_params_use_camel_case() {
        let params = LaunchParams {
            browser: Browser::Webkit.as_str(),
            headless: true,
            viewport: Viewport { width: 375, height: 667 },
            url: "file:///srv/site/index.html",
            navigation_timeout_ms: 30_000,
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["browser"], "webkit");
        assert_eq!(value["navigationTimeoutMs"], 30_000);
        assert_eq!(value["viewport"]["width"], 375);
    }

    #[test]
    fn test_parse_driver_events() {
        let ready: DriverEvent =
            serde_json::from_str(r#"{"event":"ready","title":"Frankis Motors"}"#).unwrap();
        assert!(matches!(ready, DriverEvent::Ready { title } if title == "Frankis Motors"));

        let fatal: DriverEvent = serde_json::from_str(
            r#"{"event":"fatal","stage":"navigate","error":"net::ERR_FILE_NOT_FOUND"}"#,
        )
        .unwrap();
        assert!(matches!(fatal, DriverEvent::Fatal { stage, .. } if stage == "navigate"));
    }

    #[test]
    fn test_parse_responses() {
        let ok: Response = serde_json::from_str(r#"{"id":3,"ok":true,"value":["a",null]}"#).unwrap();
        assert_eq!(ok.id, Some(3));
        let values: Vec<Option<String>> = serde_json::from_value(ok.value).unwrap();
        assert_eq!(values, vec![Some("a".to_string()), None]);

        let err: Response =
            serde_json::from_str(r#"{"id":4,"ok":false,"error":"Unexpected token"}"#).unwrap();
        assert!(!err.ok);
        assert_eq!(err.error.as_deref(), Some("Unexpected token"));

        let diagnostics: Vec<PageDiagnostic> = serde_json::from_str(
            r#"[{"source":"console","message":"404"},{"source":"page_error","message":"x is undefined"}]"#,
        )
        .unwrap();
        assert_eq!(diagnostics[1], PageDiagnostic::PageError("x is undefined".into()));
    }

    #[test]
    fn test_first_line_outcomes() {
        let url = Url::parse("file:///srv/site/index.html").unwrap();

        let title = loaded_title(r#"{"event":"ready","title":"Frankis Motors"}"#, &url).unwrap();
        assert_eq!(title, "Frankis Motors");

        let launch = loaded_title(
            r#"{"event":"fatal","stage":"launch","error":"browserContext.newPage: Target closed"}"#,
            &url,
        );
        match launch {
            Err(PageCheckError::DriverStartup(msg)) => assert!(msg.starts_with("launch: "), "{}", msg),
            other => panic!("expected a startup error, got {:?}", other),
        }

        let navigate = loaded_title(
            r#"{"event":"fatal","stage":"navigate","error":"net::ERR_FILE_NOT_FOUND"}"#,
            &url,
        );
        assert!(matches!(navigate, Err(PageCheckError::Navigation { target, .. }) if target == url.as_str()));

        let garbage = loaded_title("Error: Cannot find module 'playwright'", &url);
        assert!(matches!(garbage, Err(PageCheckError::Protocol(_))));
    }

    #[test]
    fn test_driver_reports_page_setup_failures_as_launch_errors() {
        let launch_try = DRIVER_SCRIPT.find("try {").unwrap();
        let launch_catch = DRIVER_SCRIPT.find("stage: 'launch'").unwrap();
        for setup in ["newContext(", "newPage()"] {
            let at = DRIVER_SCRIPT.find(setup).unwrap();
            assert!(launch_try < at && at < launch_catch, "{} outside the launch try", setup);
        }
    }

    #[test]
    fn test_install_check_uses_driver_node_path() {
        let command = install_check_command(Path::new("/opt/site/node_modules"));
        let std_command = command.as_std();

        assert_eq!(std_command.get_program(), "npx");
        let args: Vec<_> = std_command.get_args().collect();
        assert_eq!(args, ["playwright", "--version"]);
        let node_path = std_command
            .get_envs()
            .find(|(key, _)| *key == "NODE_PATH")
            .and_then(|(_, value)| value);
        assert_eq!(node_path, Some(std::ffi::OsStr::new("/opt/site/node_modules")));
    }

    #[test]
    fn test_null_value_decodes_as_unit_and_none() {
        let _: () = serde_json::from_value(serde_json::Value::Null).unwrap();
        let style: Option<String> = serde_json::from_value(serde_json::Value::Null).unwrap();
        assert_eq!(style, None);
    }
}
