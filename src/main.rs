use clap::Parser;

use playcheck::outcome::CheckOutcome;
use playcheck::runner::run_check;
use playcheck::{ConfigSource, RunConfig};

/// Playcheck - automated playability check for the chat frontend and BFF
#[derive(Parser, Debug)]
#[command(
    name = "playcheck",
    about = "Drives the chat UI through a headless browser and verifies the wallet ledger moved as expected",
    after_help = "ENVIRONMENT VARIABLES:\n\
        FE_URL                      Frontend base URL (required)\n\
        BFF_BASE_URL                BFF base URL for wallet reads (required)\n\
        TEST_USER_ID                Synthetic test identity (required)\n\
        LLM_ASSISTED_CHAT_MESSAGE   Chat message to send\n\
        EXPECTED_POINTS_CHANGE      Expected points spent per chat turn\n\
        TIMEOUT_SECONDS             Per-step timeout for browser waits\n\
        CHECK_HEADLESS              Set to 'false' or '0' for a headed browser"
)]
struct Args {
    /// Frontend base URL the browser will load
    #[arg(long, env = "FE_URL")]
    fe_url: Option<String>,

    /// BFF base URL for the wallet balance reads
    #[arg(long, env = "BFF_BASE_URL")]
    bff_base_url: Option<String>,

    /// Synthetic test identity injected into the browser session
    #[arg(long, env = "TEST_USER_ID")]
    test_user_id: Option<String>,

    /// Chat message submitted through the UI
    #[arg(long, env = "LLM_ASSISTED_CHAT_MESSAGE")]
    message: Option<String>,

    /// Expected points spent per chat turn (balance should move by its negation)
    #[arg(long, env = "EXPECTED_POINTS_CHANGE")]
    expected_points_change: Option<String>,

    /// Timeout in seconds applied to each blocking browser wait
    #[arg(long, env = "TIMEOUT_SECONDS")]
    timeout_seconds: Option<String>,

    /// Headless mode; pass 'false' or '0' to watch the browser
    #[arg(long, env = "CHECK_HEADLESS")]
    headless: Option<String>,
}

impl From<Args> for ConfigSource {
    fn from(args: Args) -> Self {
        ConfigSource {
            frontend_url: args.fe_url,
            backend_url: args.bff_base_url,
            test_user_id: args.test_user_id,
            chat_message: args.message,
            expected_points_change: args.expected_points_change,
            timeout_seconds: args.timeout_seconds,
            headless: args.headless,
        }
    }
}

#[tokio::main]
async fn main() {
    let source = ConfigSource::from(Args::parse());

    // Validation gates everything: no network or browser cost is incurred
    // until the configuration is known to be complete.
    let config = match RunConfig::resolve(&source) {
        Ok(config) => config,
        Err(err) => {
            let outcome = CheckOutcome::config_failure(&err.to_string());
            std::process::exit(outcome.emit());
        }
    };

    let outcome = run_check(&config).await;
    std::process::exit(outcome.emit());
}
