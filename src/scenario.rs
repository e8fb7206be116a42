//! Browser-driven chat scenario.
//!
//! One isolated headless Chrome session per run: inject the synthetic
//! identity before first paint, load the frontend, submit the configured
//! message and await the correlated `/chat/v1` response. The response
//! listener is armed *before* the send click — the reply must not be able to
//! slip past between action and observation. Each blocking step is bounded
//! by the configured timeout independently; cleanup of the browser session
//! is unconditional on every exit path.

use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, GetResponseBodyParams, Headers, RequestId,
    SetExtraHttpHeadersParams,
};
use chromiumoxide::handler::Handler;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use serde_json::json;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

use crate::config::RunConfig;
use crate::diagnostics;
use crate::error::{CheckError, CheckResult};

/// CSS selector for the message entry control. A hard dependency on a
/// specific UI affordance; acceptable for a synthetic smoke probe.
pub const CHAT_INPUT_SELECTOR: &str = r#"textarea[placeholder="メッセージを入力…"]"#;

/// Visible label of the send button
pub const SEND_BUTTON_LABEL: &str = "送信";

/// URL substring identifying the chat submission endpoint
pub const CHAT_ENDPOINT_PATTERN: &str = "/chat/v1";

/// Pause after a successful reply so the backend ledger debit can land
/// before the post-balance read. A documented eventual-consistency lag in
/// the BFF, not a flake guard.
const SETTLE_AFTER_REPLY: Duration = Duration::from_millis(1500);

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const BODY_FETCH_ATTEMPTS: u32 = 20;
const BODY_FETCH_INTERVAL: Duration = Duration::from_millis(200);
const VIEWPORT_WIDTH: u32 = 1280;
const VIEWPORT_HEIGHT: u32 = 720;

/// Result of one scripted chat turn
#[derive(Debug, Clone)]
pub struct ChatExchange {
    /// Trimmed, non-empty reply text
    pub reply_text: String,
    /// HTTP status of the matched network response
    pub transport_status: i64,
}

/// Whether a network response is the chat submission we are waiting for
pub fn response_matches(url: &str, status: i64) -> bool {
    url.contains(CHAT_ENDPOINT_PATTERN) && status == 200
}

/// Extract the trimmed reply text from a chat response body.
///
/// A missing, non-string or all-whitespace reply is the distinct
/// `chat_reply_empty` failure, not a timeout.
pub fn extract_reply(body: &str) -> CheckResult<String> {
    let payload: serde_json::Value =
        serde_json::from_str(body).unwrap_or(serde_json::Value::Null);
    let reply = payload
        .get("reply")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    if reply.is_empty() {
        return Err(CheckError::ui("chat_reply_empty"));
    }
    Ok(reply.to_string())
}

/// Run the full browser scenario and return the observed chat exchange.
///
/// Any failure after the page exists goes through diagnostic capture before
/// propagating; the session and browser are released on every exit path.
pub async fn run_browser_scenario(config: &RunConfig) -> CheckResult<ChatExchange> {
    let (mut browser, mut handler) = launch_browser(config).await?;
    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    let result = match new_identity_page(&browser, config).await {
        Ok(page) => match drive_chat_turn(&page, config).await {
            Ok(exchange) => Ok(exchange),
            Err(err) => Err(diagnostics::attach_failure_screenshot(&page, err).await),
        },
        Err(err) => Err(err),
    };

    let _ = browser.close().await;
    let _ = browser.wait().await;
    handler_task.abort();

    result
}

async fn launch_browser(config: &RunConfig) -> CheckResult<(Browser, Handler)> {
    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage")
        .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT);
    if !config.headless {
        builder = builder.with_head();
    }
    let browser_config = builder
        .build()
        .map_err(|e| CheckError::ui(format!("browser_config_invalid: {}", e)))?;

    Browser::launch(browser_config)
        .await
        .map_err(|e| ui_step("browser_launch", e))
}

/// Fresh page carrying the synthetic identity before any page script runs:
/// the test-traffic header on every request and the identity in
/// `localStorage` so the frontend authenticates as the test user from
/// first paint.
async fn new_identity_page(browser: &Browser, config: &RunConfig) -> CheckResult<Page> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| ui_step("browser_page", e))?;

    page.execute(EnableParams::default())
        .await
        .map_err(|e| ui_step("network_enable", e))?;
    page.execute(SetExtraHttpHeadersParams::new(Headers::new(json!({
        "x-izk-test-user": "1"
    }))))
    .await
    .map_err(|e| ui_step("test_header", e))?;

    let seed = format!(
        "window.localStorage.setItem('IZK_UID', {});",
        serde_json::Value::String(config.test_user_id.clone())
    );
    page.evaluate_on_new_document(seed)
        .await
        .map_err(|e| ui_step("identity_seed", e))?;

    Ok(page)
}

async fn drive_chat_turn(page: &Page, config: &RunConfig) -> CheckResult<ChatExchange> {
    let budget = config.timeout;

    bounded("navigation", budget, async {
        page.goto(config.frontend_url.clone())
            .await
            .map_err(|e| ui_step("navigation", e))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| ui_step("navigation_wait", e))?;
        Ok(())
    })
    .await?;

    let input = bounded(
        "chat_input",
        budget,
        wait_for_element(page, CHAT_INPUT_SELECTOR),
    )
    .await?;
    bounded("chat_input_fill", budget, async {
        input
            .click()
            .await
            .map_err(|e| ui_step("chat_input_focus", e))?;
        input
            .type_str(&config.chat_message)
            .await
            .map_err(|e| ui_step("chat_input_fill", e))?;
        Ok(())
    })
    .await?;

    let send_button = bounded("send_button", budget, wait_for_send_button(page)).await?;

    // Register-before-trigger: the listener must exist before the click.
    let mut responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(|e| ui_step("response_listener", e))?;
    send_button
        .click()
        .await
        .map_err(|e| ui_step("send_click", e))?;

    let (request_id, transport_status) = bounded("chat_response", budget, async {
        while let Some(event) = responses.next().await {
            if response_matches(&event.response.url, event.response.status) {
                return Ok((event.request_id.clone(), event.response.status));
            }
        }
        Err(CheckError::ui("chat_response_stream_closed"))
    })
    .await?;

    let body = bounded(
        "chat_response_body",
        budget,
        fetch_response_body(page, request_id),
    )
    .await?;
    let reply_text = extract_reply(&body)?;

    sleep(SETTLE_AFTER_REPLY).await;

    Ok(ChatExchange {
        reply_text,
        transport_status,
    })
}

/// Bound a blocking step by the configured timeout. Each step gets the full
/// budget; the overall UI-stage wall clock is the sum of per-step bounds.
async fn bounded<T, F>(step: &str, limit: Duration, operation: F) -> CheckResult<T>
where
    F: Future<Output = CheckResult<T>>,
{
    match timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(CheckError::ui(format!("{}_timeout", step))),
    }
}

async fn wait_for_element(page: &Page, selector: &str) -> CheckResult<Element> {
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }
        sleep(ELEMENT_POLL_INTERVAL).await;
    }
}

/// The send control has no stable selector; match buttons by visible label.
async fn wait_for_send_button(page: &Page) -> CheckResult<Element> {
    loop {
        if let Ok(buttons) = page.find_elements("button").await {
            for button in buttons {
                let label = button.inner_text().await.ok().flatten().unwrap_or_default();
                if label.contains(SEND_BUTTON_LABEL) {
                    return Ok(button);
                }
            }
        }
        sleep(ELEMENT_POLL_INTERVAL).await;
    }
}

/// The response body may lag the response event by a few frames; retry the
/// CDP fetch until it is available or the step budget runs out.
async fn fetch_response_body(page: &Page, request_id: RequestId) -> CheckResult<String> {
    let mut last_error = String::new();
    for _ in 0..BODY_FETCH_ATTEMPTS {
        match page
            .execute(GetResponseBodyParams::new(request_id.clone()))
            .await
        {
            Ok(response) => {
                if response.result.base64_encoded {
                    let bytes = base64::engine::general_purpose::STANDARD
                        .decode(&response.result.body)
                        .map_err(|e| ui_step("chat_response_decode", e))?;
                    return String::from_utf8(bytes)
                        .map_err(|e| ui_step("chat_response_decode", e));
                }
                return Ok(response.result.body.clone());
            }
            Err(e) => {
                last_error = e.to_string();
                sleep(BODY_FETCH_INTERVAL).await;
            }
        }
    }
    Err(CheckError::ui(format!(
        "chat_response_body_unavailable: {}",
        last_error
    )))
}

fn ui_step(step: &str, err: impl std::fmt::Display) -> CheckError {
    CheckError::ui(format!("{}_failed: {}", step, err))
}
