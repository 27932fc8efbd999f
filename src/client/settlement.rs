use super::{error::Result, session::ApiClient};
use crate::modules::payment::repository::{Deposit, DepositStatus};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct SettlementPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_secs(3),
        }
    }
}

#[derive(Clone, Debug)]
pub enum SettlementOutcome {
    Confirmed(Deposit),
    Failed(DepositStatus),
    /// Still pending when the attempts ran out; the webhook settles it later.
    Unconfirmed,
}

impl SettlementOutcome {
    fn from_deposit(deposit: Deposit) -> Option<Self> {
        match deposit.status {
            DepositStatus::Pending => None,
            DepositStatus::Paid => Some(SettlementOutcome::Confirmed(deposit)),
            status => Some(SettlementOutcome::Failed(status)),
        }
    }
}

impl ApiClient {
    pub async fn await_settlement(
        &self,
        reference: &str,
        policy: SettlementPolicy,
    ) -> Result<SettlementOutcome> {
        for attempt in 1..=policy.attempts {
            match self.verify_deposit(reference).await {
                Ok(deposit) => {
                    if let Some(outcome) = SettlementOutcome::from_deposit(deposit) {
                        return Ok(outcome);
                    }
                }
                Err(err) if err.is_transient() => {
                    tracing::warn!(
                        "Attempt {} to verify deposit {} failed: {}",
                        attempt,
                        reference,
                        err
                    );
                }
                Err(err) => return Err(err),
            }

            if attempt < policy.attempts {
                tokio::time::sleep(policy.interval).await;
            }
        }

        Ok(SettlementOutcome::Unconfirmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Error;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn deposit(status: DepositStatus) -> Deposit {
        Deposit {
            id: "01J0000000000000000000000".to_string(),
            reference: "NH-01J0000000000000000000000".to_string(),
            user_id: "01J0000000000000000000001".to_string(),
            amount: BigDecimal::from_str("500").unwrap(),
            amount_paid: None,
            status,
            checkout_url: None,
            gateway_reference: None,
            paid_at: None,
            settled_at: None,
            created_at: chrono::Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn pending_deposits_keep_polling() {
        assert!(SettlementOutcome::from_deposit(deposit(DepositStatus::Pending)).is_none());
    }

    #[test]
    fn terminal_deposits_end_polling() {
        assert!(matches!(
            SettlementOutcome::from_deposit(deposit(DepositStatus::Paid)),
            Some(SettlementOutcome::Confirmed(_))
        ));
        assert!(matches!(
            SettlementOutcome::from_deposit(deposit(DepositStatus::Reversed)),
            Some(SettlementOutcome::Failed(DepositStatus::Reversed))
        ));
        assert!(matches!(
            SettlementOutcome::from_deposit(deposit(DepositStatus::Expired)),
            Some(SettlementOutcome::Failed(DepositStatus::Expired))
        ));
    }

    #[tokio::test]
    async fn session_errors_abort_without_network() {
        let client = ApiClient::new("http://127.0.0.1:9");
        let err = client
            .await_settlement("NH-1", SettlementPolicy::default())
            .await
            .unwrap_err();
        assert_eq!(err, Error::SessionExpired);
    }
}
