use super::types::{
    request, response, RawEvent, RejectedPayment, Settlement, SettledTransaction, SuccessfulRefund,
};
use crate::{
    modules::payment::{
        gateway::{GatewayStatus, GatewayTransaction},
        repository::{self, Deposit},
        service::{self as payment, Report},
    },
    types::Context,
};
use bigdecimal::{BigDecimal, Zero};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde::de::DeserializeOwned;
use sha2::Sha512;
use std::sync::Arc;

pub fn verify_signature(secret: &str, signature: &str, body: &[u8]) -> Result<(), response::Error> {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes()).map_err(|err| {
        tracing::error!("Failed to generate mac: {:?}", err);
        response::Error::InvalidSignature
    })?;

    mac.update(body);

    let signature = hex::decode(signature).map_err(|err| {
        tracing::warn!("Webhook signature is not valid hex: {:?}", err);
        response::Error::InvalidSignature
    })?;

    mac.verify_slice(&signature).map_err(|err| {
        tracing::warn!("Failed to verify webhook signature: {:?}", err);
        response::Error::InvalidSignature
    })
}

fn decode<T: DeserializeOwned>(event: &RawEvent) -> Result<T, response::Error> {
    serde_json::from_value::<T>(event.event_data.clone()).map_err(|err| {
        tracing::error!("Failed to decode {} event: {}", event.event_type, err);
        response::Error::InvalidPayload
    })
}

async fn apply_to(
    ctx: &Context,
    deposit: Option<Deposit>,
    reference: &str,
    report: Report,
) -> response::Response {
    let deposit = match deposit {
        Some(deposit) => deposit,
        None => {
            tracing::warn!("Webhook referenced unknown deposit {}", reference);
            return Ok(response::Success::Acknowledged);
        }
    };

    payment::apply(ctx, deposit, report)
        .await
        .map(|_| response::Success::Acknowledged)
        .map_err(|_| response::Error::ServerError)
}

async fn successful_transaction(ctx: &Context, tx: GatewayTransaction) -> response::Response {
    let reference = tx.payment_reference.clone().ok_or_else(|| {
        tracing::error!("Successful transaction event without a payment reference");
        response::Error::InvalidPayload
    })?;

    let deposit = repository::find_by_reference(&ctx.db_conn.pool, reference.clone())
        .await
        .map_err(|_| response::Error::ServerError)?;

    apply_to(ctx, deposit, &reference, tx.into()).await
}

async fn rejected_payment(ctx: &Context, event: RejectedPayment) -> response::Response {
    let deposit = repository::find_by_reference(&ctx.db_conn.pool, event.payment_reference.clone())
        .await
        .map_err(|_| response::Error::ServerError)?;

    let report = Report {
        status: GatewayStatus::Failed,
        amount_paid: BigDecimal::zero(),
        gateway_reference: None,
    };

    apply_to(ctx, deposit, &event.payment_reference, report).await
}

async fn successful_refund(ctx: &Context, event: SuccessfulRefund) -> response::Response {
    let deposit =
        repository::find_by_gateway_reference(&ctx.db_conn.pool, event.transaction_reference.clone())
            .await
            .map_err(|_| response::Error::ServerError)?;

    let report = Report {
        status: GatewayStatus::Reversed,
        amount_paid: BigDecimal::zero(),
        gateway_reference: Some(event.transaction_reference.clone()),
    };

    apply_to(ctx, deposit, &event.transaction_reference, report).await
}

async fn settlement(ctx: &Context, event: Settlement) -> response::Response {
    let references = event
        .transactions
        .into_iter()
        .map(|SettledTransaction { transaction_reference }| transaction_reference)
        .collect::<Vec<_>>();

    let count = repository::mark_settled(&ctx.db_conn.pool, references)
        .await
        .map_err(|_| response::Error::ServerError)?;

    tracing::info!("Settlement stamped on {} deposits", count);

    Ok(response::Success::Acknowledged)
}

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    verify_signature(
        &ctx.payment.webhook_secret,
        &payload.signature.0,
        payload.body.as_ref(),
    )?;

    let event = parse_event(&payload.body)?;

    tracing::debug!("Received {} webhook", event.event_type);

    match event.event_type.as_str() {
        "SUCCESSFUL_TRANSACTION" => successful_transaction(&ctx, decode(&event)?).await,
        "REJECTED_PAYMENT" => rejected_payment(&ctx, decode(&event)?).await,
        "SUCCESSFUL_REFUND" => successful_refund(&ctx, decode(&event)?).await,
        "SETTLEMENT" => settlement(&ctx, decode(&event)?).await,
        other => {
            tracing::debug!("Ignoring {} webhook", other);
            Ok(response::Success::Acknowledged)
        }
    }
}

fn parse_event(body: &Bytes) -> Result<RawEvent, response::Error> {
    serde_json::from_slice::<RawEvent>(body.as_ref()).map_err(|err| {
        tracing::error!("Failed to parse webhook body: {}", err);
        response::Error::InvalidPayload
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_matching_signature() {
        let body = br#"{"eventType":"SETTLEMENT","eventData":{}}"#;
        let signature = sign("client-secret", body);
        assert!(verify_signature("client-secret", &signature, body).is_ok());
    }

    #[test]
    fn rejects_tampered_body_and_bad_hex() {
        let body = br#"{"eventType":"SETTLEMENT","eventData":{}}"#;
        let signature = sign("client-secret", body);

        assert!(matches!(
            verify_signature("client-secret", &signature, br#"{"eventType":"X"}"#),
            Err(response::Error::InvalidSignature)
        ));
        assert!(matches!(
            verify_signature("other-secret", &signature, body),
            Err(response::Error::InvalidSignature)
        ));
        assert!(matches!(
            verify_signature("client-secret", "not-hex", body),
            Err(response::Error::InvalidSignature)
        ));
    }

    #[test]
    fn settlement_events_list_transaction_references() {
        let event = parse_event(&Bytes::from_static(
            br#"{"eventType":"SETTLEMENT","eventData":{"amount":"1000","transactions":[{"transactionReference":"MNFY|1","amountPaid":"500"},{"transactionReference":"MNFY|2"}]}}"#,
        ))
        .ok()
        .unwrap();

        let settlement = decode::<Settlement>(&event).ok().unwrap();
        assert_eq!(settlement.transactions.len(), 2);
        assert_eq!(settlement.transactions[1].transaction_reference, "MNFY|2");
    }
}
