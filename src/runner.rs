//! Stage orchestration for one check run.
//!
//! Strictly sequential: the pre-balance read must precede the chat turn, and
//! the chat turn must precede the post-balance read. Every error funnels to
//! the single reporting boundary; there is no retry or partial salvage.

use std::time::Instant;

use crate::config::RunConfig;
use crate::error::CheckResult;
use crate::outcome::{self, CheckOutcome};
use crate::scenario;
use crate::wallet::WalletProbe;

/// Run the full playability check and return the finalized outcome.
///
/// The outcome is assembled incrementally as stages complete; end-to-end
/// latency is recorded on success and failure alike.
pub async fn run_check(config: &RunConfig) -> CheckOutcome {
    let mut result = CheckOutcome::started(&config.chat_message);
    let started = Instant::now();

    let stages = run_stages(config, &mut result).await;
    result.response_time_ms = Some(started.elapsed().as_millis() as u64);

    if let Err(err) = stages {
        result.fail(&err);
    }
    result
}

async fn run_stages(config: &RunConfig, result: &mut CheckOutcome) -> CheckResult<()> {
    let probe = WalletProbe::new(config);

    let balance_before = probe.read_balance("before").await?;
    result.balance_before = Some(balance_before);

    let exchange = scenario::run_browser_scenario(config).await?;
    result.reply = Some(exchange.reply_text);
    result.transport_status = Some(exchange.transport_status);

    let balance_after = probe.read_balance("after").await?;
    result.balance_after = Some(balance_after);

    // Observed delta should equal the negation of the configured change.
    let delta = outcome::round_delta(balance_before, balance_after);
    let expected_delta = -config.expected_points_change;
    result.delta = Some(delta);
    result.expected_delta = Some(expected_delta);
    outcome::verify_delta(delta, expected_delta)?;

    Ok(())
}
