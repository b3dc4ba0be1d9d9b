use std::sync::Arc;
use std::time::Duration;

use common::models::{OrderOutcome, OrderRecord, OrderRequest};
use common::notifier::Notifier;
use market_data::traits::{ExchangeGateway, GatewayError, with_timeout};
use tracing::{error, info, warn};

use crate::services::audit_log::AuditLog;

/// Submits orders and reports their outcome.
///
/// Every order is sent exactly once. The submission, its notification and
/// its audit record run on their own task, so a caller that stops waiting
/// does not cancel an order that may already be on the exchange.
#[derive(Clone)]
pub struct ExecutionService {
    gateway: Arc<dyn ExchangeGateway>,
    notifier: Arc<dyn Notifier>,
    audit: Option<Arc<AuditLog>>,
    timeout: Duration,
}

impl ExecutionService {
    pub fn new(
        gateway: Arc<dyn ExchangeGateway>,
        notifier: Arc<dyn Notifier>,
        audit: Option<Arc<AuditLog>>,
        timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            notifier,
            audit,
            timeout,
        }
    }

    pub async fn execute(&self, request: OrderRequest) -> OrderOutcome {
        let service = self.clone();
        let symbol = request.symbol().to_string();

        match tokio::spawn(async move { service.submit_and_report(request).await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{}: order task failed: {}", symbol, e);
                OrderOutcome::rejected(format!("order task failed: {e}"))
            }
        }
    }

    async fn submit_and_report(self, request: OrderRequest) -> OrderOutcome {
        info!(
            "{}: submitting {} {} (client id {})",
            request.symbol(),
            request.side(),
            request.quantity(),
            request.client_order_id()
        );

        let outcome = match with_timeout(self.timeout, self.gateway.submit_order(&request)).await {
            Ok(outcome) => outcome,
            Err(GatewayError::Timeout(after)) => OrderOutcome::rejected(format!(
                "no answer within {after:?}, outcome unknown (client id {})",
                request.client_order_id()
            )),
            Err(e) => OrderOutcome::rejected(e.to_string()),
        };

        if outcome.accepted {
            info!(
                "{}: order {:?} accepted ({:?})",
                request.symbol(),
                outcome.exchange_order_id,
                outcome.status
            );
        } else {
            warn!(
                "{}: order rejected: {}",
                request.symbol(),
                outcome.error_detail.as_deref().unwrap_or("unknown")
            );
        }
        self.notifier.notify(order_message(&request, &outcome));

        if let Some(audit) = &self.audit {
            if let Err(e) = audit.record(&OrderRecord::new(&request, outcome.clone())).await {
                error!("{}: cannot write audit record: {:#}", request.symbol(), e);
            }
        }

        outcome
    }
}

fn order_message(request: &OrderRequest, outcome: &OrderOutcome) -> String {
    if outcome.accepted {
        let (icon, verb) = if outcome.is_filled() { ("✅", "executed") } else { ("⏳", "accepted") };
        format!(
            "{} {} {} {} {} (order {}, {})",
            icon,
            request.side(),
            request.quantity(),
            request.symbol(),
            verb,
            outcome
                .exchange_order_id
                .map_or_else(|| "?".to_string(), |id| id.to_string()),
            outcome.status.as_deref().unwrap_or("?")
        )
    } else {
        format!(
            "❌ {} {} {} rejected: {}",
            request.side(),
            request.quantity(),
            request.symbol(),
            outcome.error_detail.as_deref().unwrap_or("unknown error")
        )
    }
}
