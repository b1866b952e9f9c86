use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::MailConfig;
use crate::domain::customer::CustomerCreated;
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};

/// Mail message handed to the message bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

/// Outbound channel to the mail relay (a message-bus producer in production)
#[async_trait]
pub trait MailOutput: Send + Sync {
    async fn send(&self, mail: &Mail) -> anyhow::Result<()>;
}

/// Output that only logs the mail, used when no bus is configured
pub struct LogMailOutput;

#[async_trait]
impl MailOutput for LogMailOutput {
    async fn send(&self, mail: &Mail) -> anyhow::Result<()> {
        let payload = serde_json::to_string(mail)?;
        tracing::info!(to = %mail.to, %payload, "Mail dispatched");
        Ok(())
    }
}

pub struct Mailer {
    output: Arc<dyn MailOutput>,
    config: MailConfig,
    circuit_breaker: CircuitBreaker,
    metrics: Arc<Metrics>,
}

impl Mailer {
    pub fn new(
        output: Arc<dyn MailOutput>,
        config: MailConfig,
        breaker_config: CircuitBreakerConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        let gauge = metrics.clone();
        let circuit_breaker = CircuitBreaker::new("mail", breaker_config)
            .on_transition(move |state| gauge.set_mail_circuit_state(state.as_gauge()));

        Self {
            output,
            config,
            circuit_breaker,
            metrics,
        }
    }

    pub fn compose(&self, event: &CustomerCreated) -> Mail {
        Mail {
            to: self.config.sales.clone(),
            from: self.config.from.clone(),
            subject: format!("Neuer Kunde {}", event.customer_id),
            body: format!("<b>Neuer Kunde:</b> <i>{}</i>", event.last_name),
        }
    }

    /// Notify sales about a new customer. Never fails: a broken or slow
    /// output is logged and counted, and returns `false`.
    pub async fn send(&self, event: &CustomerCreated) -> bool {
        let mail = self.compose(event);
        tracing::trace!(?mail, "Sending new-customer mail");

        let limit = self.config.timeout();
        let result = self
            .circuit_breaker
            .call(async {
                match tokio::time::timeout(limit, self.output.send(&mail)).await {
                    Ok(sent) => sent,
                    Err(_) => Err(anyhow::anyhow!("mail output timed out after {:?}", limit)),
                }
            })
            .await;

        match result {
            Ok(()) => {
                self.metrics.record_mail("sent");
                true
            }
            Err(CircuitBreakerError::CircuitOpen) => {
                tracing::error!(customer_id = %event.customer_id, "Mail circuit open, notification dropped");
                self.metrics.record_mail("circuit_open");
                false
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                tracing::error!(error = %e, ?mail, "Failed to send mail");
                self.metrics.record_mail("failed");
                false
            }
        }
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }
}
