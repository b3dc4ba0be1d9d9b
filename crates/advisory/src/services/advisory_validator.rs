//! Advisory gate in front of order sizing.
//!
//! The gate asks the advisory model to confirm or replace the technical
//! signal. Its reply is only trusted when the last non-empty line is exactly
//! one of `BUY`, `SELL`, `HOLD` after trimming and uppercasing. Anything else,
//! and any transport failure or timeout, leaves the technical signal as is.

use std::sync::Arc;
use std::time::Duration;

use common::models::Signal;
use common::notifier::Notifier;
use tracing::{info, warn};

use crate::traits::{AdvisoryError, AdvisoryService};

/// Context text beyond this many characters is cut from the prompt.
pub const MAX_CONTEXT_CHARS: usize = 2_000;

const MAX_QUOTED_REPLY_CHARS: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The reply did not end in a valid token. Holds the trimmed reply, shortened.
    InvalidReply(String),
    /// The service failed or did not answer in time.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictSource {
    Advisory,
    Fallback(FallbackReason),
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub original: Signal,
    pub signal: Signal,
    pub source: VerdictSource,
}

impl Verdict {
    /// The technical signal taken as final, without asking anyone.
    pub fn passthrough(signal: Signal) -> Self {
        Self {
            original: signal,
            signal,
            source: VerdictSource::Disabled,
        }
    }

    fn fallback(original: Signal, reason: FallbackReason) -> Self {
        Self {
            original,
            signal: original,
            source: VerdictSource::Fallback(reason),
        }
    }

    pub fn overridden(&self) -> bool {
        self.original != self.signal
    }
}

pub struct AdvisoryValidator {
    service: Arc<dyn AdvisoryService>,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl AdvisoryValidator {
    pub fn new(
        service: Arc<dyn AdvisoryService>,
        notifier: Arc<dyn Notifier>,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            notifier,
            timeout,
        }
    }

    pub fn build_prompt(symbol: &str, signal: Signal, context: &str) -> String {
        let context: String = context.trim().chars().take(MAX_CONTEXT_CHARS).collect();
        let context = if context.is_empty() { "n/a".to_string() } else { context };

        format!(
            "Symbol: {symbol}\n\
             Suggested action: {signal}\n\
             \n\
             Market context:\n\
             {context}\n\
             \n\
             Review the suggested action and give a final decision.\n\
             Answer with exactly one word: BUY, SELL or HOLD.\n\
             - Uptrend and momentum below the oversold level: BUY.\n\
             - Downtrend and momentum above the overbought level: SELL.\n\
             - Otherwise: HOLD.\n\
             Give only the final answer, without explanation. \
             The last line of your answer must be that single word."
        )
    }

    /// Last non-empty line of the normalized reply, if it is a valid token.
    pub fn parse_reply(raw: &str) -> Option<Signal> {
        let normalized = raw.trim().to_uppercase();
        let last = normalized
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()?;
        last.parse().ok()
    }

    pub async fn validate(&self, symbol: &str, signal: Signal, context: &str) -> Verdict {
        let prompt = Self::build_prompt(symbol, signal, context);

        let reply = match tokio::time::timeout(self.timeout, self.service.ask(&prompt, self.timeout)).await {
            Ok(reply) => reply,
            Err(_) => Err(AdvisoryError::Timeout(self.timeout)),
        };

        let verdict = match reply {
            Ok(raw) => match Self::parse_reply(&raw) {
                Some(decided) => Verdict {
                    original: signal,
                    signal: decided,
                    source: VerdictSource::Advisory,
                },
                None => {
                    warn!("{}: discarding advisory reply {:?}", symbol, shorten(&raw));
                    Verdict::fallback(signal, FallbackReason::InvalidReply(shorten(&raw)))
                }
            },
            Err(e) => {
                warn!("{}: advisory unavailable, keeping {}: {}", symbol, signal, e);
                Verdict::fallback(signal, FallbackReason::Unavailable(e.to_string()))
            }
        };

        info!(
            "{}: suggested {} -> final {} ({:?})",
            symbol, verdict.original, verdict.signal, verdict.source
        );
        self.notifier.notify(audit_message(symbol, &verdict));
        verdict
    }
}

fn shorten(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= MAX_QUOTED_REPLY_CHARS {
        return trimmed.to_string();
    }
    let mut short: String = trimmed.chars().take(MAX_QUOTED_REPLY_CHARS).collect();
    short.push('…');
    short
}

fn audit_message(symbol: &str, verdict: &Verdict) -> String {
    let reply = match &verdict.source {
        VerdictSource::Advisory => verdict.signal.to_string(),
        VerdictSource::Fallback(FallbackReason::InvalidReply(raw)) => format!("invalid reply {raw:?}"),
        VerdictSource::Fallback(FallbackReason::Unavailable(e)) => format!("unavailable ({e})"),
        VerdictSource::Disabled => "disabled".to_string(),
    };
    format!(
        "🔍 AI decision\nSymbol: {}\nSuggested: {}\nAdvisory: {}\nFinal: {}",
        symbol, verdict.original, reply, verdict.signal
    )
}
