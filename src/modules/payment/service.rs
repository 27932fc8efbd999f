use super::{
    gateway::{self, GatewayStatus, GatewayTransaction},
    repository::{self, Deposit, DepositStatus},
};
use crate::{
    modules::{transaction, user::repository::User, wallet},
    types::Context,
};
use bigdecimal::{BigDecimal, Zero};
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, PartialEq)]
pub enum Error {
    AmountOutOfRange,
    DepositNotFound,
    GatewayUnavailable,
    UnexpectedError,
}

/// What a gateway report does to a local deposit.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Unchanged,
    Settle,
    Close(DepositStatus),
    Reverse,
}

pub fn reconcile(
    current: &DepositStatus,
    gateway: &GatewayStatus,
    amount_paid: &BigDecimal,
    amount: &BigDecimal,
) -> Transition {
    match (current, gateway) {
        (DepositStatus::Pending, GatewayStatus::Paid | GatewayStatus::Overpaid) => {
            match amount_paid >= amount {
                true => Transition::Settle,
                false => Transition::Unchanged,
            }
        }
        (DepositStatus::Pending, GatewayStatus::Failed) => Transition::Close(DepositStatus::Failed),
        (DepositStatus::Pending, GatewayStatus::Cancelled) => {
            Transition::Close(DepositStatus::Cancelled)
        }
        (DepositStatus::Pending, GatewayStatus::Expired) => {
            Transition::Close(DepositStatus::Expired)
        }
        (DepositStatus::Paid, GatewayStatus::Reversed) => Transition::Reverse,
        _ => Transition::Unchanged,
    }
}

/// Gateway report reduced to what reconciliation needs.
#[derive(Debug, Clone)]
pub struct Report {
    pub status: GatewayStatus,
    pub amount_paid: BigDecimal,
    pub gateway_reference: Option<String>,
}

impl From<GatewayTransaction> for Report {
    fn from(tx: GatewayTransaction) -> Self {
        Self {
            status: tx.payment_status,
            amount_paid: tx.amount_paid.unwrap_or_else(BigDecimal::zero),
            gateway_reference: tx.transaction_reference,
        }
    }
}

async fn reload(ctx: &Context, deposit: &Deposit) -> Result<Deposit, Error> {
    repository::find_by_reference(&ctx.db_conn.pool, deposit.reference.clone())
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::DepositNotFound)
}

async fn settle(ctx: &Context, deposit: &Deposit, report: Report) -> Result<Deposit, Error> {
    let mut tx = ctx.db_conn.pool.begin().await.map_err(|err| {
        tracing::error!("Failed to start settlement transaction: {}", err);
        Error::UnexpectedError
    })?;

    let paid = match repository::mark_paid(
        &mut *tx,
        deposit.id.clone(),
        repository::MarkPaidPayload {
            amount_paid: report.amount_paid,
            gateway_reference: report.gateway_reference,
        },
    )
    .await
    .map_err(|_| Error::UnexpectedError)?
    {
        Some(paid) => paid,
        None => return reload(ctx, deposit).await,
    };

    wallet::repository::credit(&mut *tx, paid.user_id.clone(), paid.amount.clone())
        .await
        .map_err(|_| Error::UnexpectedError)?;

    transaction::repository::create(
        &mut *tx,
        transaction::repository::CreatePayload {
            amount: paid.amount.clone(),
            direction: transaction::repository::TransactionDirection::Incoming,
            purpose: transaction::repository::TransactionPurpose::Deposit,
            reference: Some(paid.reference.clone()),
            note: Some("Wallet deposit".to_string()),
            user_id: paid.user_id.clone(),
        },
    )
    .await
    .map_err(|_| Error::UnexpectedError)?;

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit settlement transaction: {}", err);
        Error::UnexpectedError
    })?;

    tracing::info!(
        "Deposit {} settled, credited {} to {}",
        paid.reference,
        paid.amount,
        paid.user_id
    );

    Ok(paid)
}

async fn reverse(ctx: &Context, deposit: &Deposit) -> Result<Deposit, Error> {
    let mut tx = ctx.db_conn.pool.begin().await.map_err(|err| {
        tracing::error!("Failed to start reversal transaction: {}", err);
        Error::UnexpectedError
    })?;

    let reversed = match repository::transition(
        &mut *tx,
        deposit.id.clone(),
        DepositStatus::Paid,
        DepositStatus::Reversed,
    )
    .await
    .map_err(|_| Error::UnexpectedError)?
    {
        Some(reversed) => reversed,
        None => return reload(ctx, deposit).await,
    };

    let taken =
        wallet::repository::debit_up_to(&mut *tx, reversed.user_id.clone(), reversed.amount.clone())
            .await
            .map_err(|_| Error::UnexpectedError)?;

    if taken < reversed.amount {
        tracing::warn!(
            "Deposit {} reversed but only {} of {} could be recovered",
            reversed.reference,
            taken,
            reversed.amount
        );
    }

    transaction::repository::create(
        &mut *tx,
        transaction::repository::CreatePayload {
            amount: taken,
            direction: transaction::repository::TransactionDirection::Outgoing,
            purpose: transaction::repository::TransactionPurpose::Reversal,
            reference: Some(reversed.reference.clone()),
            note: Some("Deposit reversed".to_string()),
            user_id: reversed.user_id.clone(),
        },
    )
    .await
    .map_err(|_| Error::UnexpectedError)?;

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit reversal transaction: {}", err);
        Error::UnexpectedError
    })?;

    Ok(reversed)
}

async fn close(ctx: &Context, deposit: &Deposit, to: DepositStatus) -> Result<Deposit, Error> {
    match repository::transition(
        &ctx.db_conn.pool,
        deposit.id.clone(),
        DepositStatus::Pending,
        to.clone(),
    )
    .await
    .map_err(|_| Error::UnexpectedError)?
    {
        Some(closed) => {
            tracing::info!("Deposit {} closed as {}", closed.reference, to.to_string());
            Ok(closed)
        }
        None => reload(ctx, deposit).await,
    }
}

/// Applies a gateway report to a deposit. Every transition is conditional on
/// the status it starts from, so repeated reports are harmless.
pub async fn apply(ctx: &Context, deposit: Deposit, report: Report) -> Result<Deposit, Error> {
    match reconcile(
        &deposit.status,
        &report.status,
        &report.amount_paid,
        &deposit.amount,
    ) {
        Transition::Unchanged => Ok(deposit),
        Transition::Settle => settle(ctx, &deposit, report).await,
        Transition::Close(to) => close(ctx, &deposit, to).await,
        Transition::Reverse => reverse(ctx, &deposit).await,
    }
}

pub async fn deposit(ctx: Arc<Context>, user: User, amount: BigDecimal) -> Result<Deposit, Error> {
    if amount < ctx.payment.min_deposit || amount > ctx.payment.max_deposit {
        return Err(Error::AmountOutOfRange);
    }

    let deposit = repository::create(
        &ctx.db_conn.pool,
        repository::CreatePayload {
            user_id: user.id.clone(),
            amount: amount.clone(),
        },
    )
    .await
    .map_err(|_| Error::UnexpectedError)?;

    let checkout = match ctx
        .payment
        .gateway
        .init_transaction(gateway::InitTransactionPayload {
            amount,
            customer_name: format!("{} {}", user.first_name, user.last_name),
            customer_email: user.email.clone(),
            payment_reference: deposit.reference.clone(),
            description: "Wallet deposit".to_string(),
        })
        .await
    {
        Ok(checkout) => checkout,
        Err(err) => {
            tracing::error!(
                "Failed to initialise checkout for deposit {}: {:?}",
                deposit.reference,
                err
            );
            close(&ctx, &deposit, DepositStatus::Failed).await?;
            return Err(Error::GatewayUnavailable);
        }
    };

    repository::attach_checkout(
        &ctx.db_conn.pool,
        deposit.id,
        checkout.transaction_reference,
        checkout.checkout_url,
    )
    .await
    .map_err(|_| Error::UnexpectedError)
}

/// Which gateway reference a deposit is queried by. Once the checkout exists
/// its transaction reference is used.
#[derive(Debug, PartialEq)]
pub enum Lookup<'a> {
    TransactionReference(&'a str),
    PaymentReference(&'a str),
}

pub fn lookup(deposit: &Deposit) -> Lookup<'_> {
    match deposit.gateway_reference.as_deref() {
        Some(reference) => Lookup::TransactionReference(reference),
        None => Lookup::PaymentReference(&deposit.reference),
    }
}

async fn query_gateway(
    ctx: &Context,
    deposit: &Deposit,
) -> Result<GatewayTransaction, gateway::Error> {
    let gateway = &ctx.payment.gateway;

    match lookup(deposit) {
        Lookup::TransactionReference(reference) => {
            gateway.find_by_transaction_reference(reference).await
        }
        Lookup::PaymentReference(reference) => gateway.find_by_payment_reference(reference).await,
    }
}

/// Brings an owned deposit up to date with the gateway.
pub async fn verify(ctx: Arc<Context>, user_id: String, reference: String) -> Result<Deposit, Error> {
    let deposit = repository::find_by_reference_and_user_id(&ctx.db_conn.pool, reference, user_id)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::DepositNotFound)?;

    if deposit.status.is_terminal() {
        return Ok(deposit);
    }

    match query_gateway(&ctx, &deposit).await {
        Ok(tx) => apply(&ctx, deposit, tx.into()).await,
        Err(gateway::Error::NotFound) => Ok(deposit),
        Err(_) => Err(Error::GatewayUnavailable),
    }
}

/// Reconciles PENDING deposits the webhook has not settled. Returns how many
/// changed status.
pub async fn reconcile_pending(ctx: Arc<Context>) -> Result<usize, Error> {
    let now = Utc::now();
    let pending = repository::find_pending_created_before(
        &ctx.db_conn.pool,
        (now - chrono::Duration::minutes(2)).naive_utc(),
    )
    .await
    .map_err(|_| Error::UnexpectedError)?;

    let lifetime_cutoff = (now - ctx.payment.checkout_lifetime).naive_utc();
    let mut changed = 0;

    for deposit in pending {
        let reference = deposit.reference.clone();
        let outdated = deposit.created_at < lifetime_cutoff;

        let updated = match query_gateway(&ctx, &deposit).await {
            Ok(tx) => apply(&ctx, deposit, tx.into()).await,
            Err(gateway::Error::NotFound) => Ok(deposit),
            Err(err) => {
                tracing::warn!("Failed to query gateway for deposit {}: {:?}", reference, err);
                continue;
            }
        };

        let updated = match updated {
            Ok(updated) if outdated && updated.status == DepositStatus::Pending => {
                close(&ctx, &updated, DepositStatus::Expired).await
            }
            updated => updated,
        };

        match updated {
            Ok(updated) if updated.status != DepositStatus::Pending => changed += 1,
            Ok(_) => (),
            Err(err) => {
                tracing::error!("Failed to reconcile deposit {}: {:?}", reference, err);
            }
        }
    }

    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn pending_deposit_settles_when_fully_paid() {
        assert_eq!(
            reconcile(
                &DepositStatus::Pending,
                &GatewayStatus::Paid,
                &dec("500"),
                &dec("500.00")
            ),
            Transition::Settle
        );
        assert_eq!(
            reconcile(
                &DepositStatus::Pending,
                &GatewayStatus::Overpaid,
                &dec("600"),
                &dec("500")
            ),
            Transition::Settle
        );
    }

    #[test]
    fn short_payments_do_not_settle() {
        assert_eq!(
            reconcile(
                &DepositStatus::Pending,
                &GatewayStatus::Paid,
                &dec("499.99"),
                &dec("500")
            ),
            Transition::Unchanged
        );
        assert_eq!(
            reconcile(
                &DepositStatus::Pending,
                &GatewayStatus::PartiallyPaid,
                &dec("200"),
                &dec("500")
            ),
            Transition::Unchanged
        );
    }

    #[test]
    fn pending_deposit_follows_gateway_failures() {
        for (gateway, local) in [
            (GatewayStatus::Failed, DepositStatus::Failed),
            (GatewayStatus::Cancelled, DepositStatus::Cancelled),
            (GatewayStatus::Expired, DepositStatus::Expired),
        ] {
            assert_eq!(
                reconcile(&DepositStatus::Pending, &gateway, &dec("0"), &dec("500")),
                Transition::Close(local)
            );
        }
    }

    #[test]
    fn only_paid_deposits_reverse() {
        assert_eq!(
            reconcile(
                &DepositStatus::Paid,
                &GatewayStatus::Reversed,
                &dec("500"),
                &dec("500")
            ),
            Transition::Reverse
        );
        assert_eq!(
            reconcile(
                &DepositStatus::Pending,
                &GatewayStatus::Reversed,
                &dec("500"),
                &dec("500")
            ),
            Transition::Unchanged
        );
    }

    #[test]
    fn terminal_deposits_ignore_gateway() {
        for current in [
            DepositStatus::Paid,
            DepositStatus::Failed,
            DepositStatus::Cancelled,
            DepositStatus::Expired,
            DepositStatus::Reversed,
        ] {
            assert_eq!(
                reconcile(&current, &GatewayStatus::Paid, &dec("500"), &dec("500")),
                Transition::Unchanged
            );
        }
    }

    fn deposit(gateway_reference: Option<&str>) -> Deposit {
        Deposit {
            id: "01J2Z6Q3M8V0Y7R5T4W1X9K2AG".to_string(),
            reference: "NH-01J2Z6Q3M8V0Y7R5T4W1X9K2AF".to_string(),
            user_id: "01J2Z6Q3M8V0Y7R5T4W1X9K2AB".to_string(),
            amount: dec("500"),
            amount_paid: None,
            status: DepositStatus::Pending,
            checkout_url: None,
            gateway_reference: gateway_reference.map(str::to_string),
            paid_at: None,
            settled_at: None,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn deposits_with_a_checkout_are_looked_up_by_transaction_reference() {
        assert_eq!(
            lookup(&deposit(Some("MNFY|20240601|000001"))),
            Lookup::TransactionReference("MNFY|20240601|000001")
        );
        assert_eq!(
            lookup(&deposit(None)),
            Lookup::PaymentReference("NH-01J2Z6Q3M8V0Y7R5T4W1X9K2AF")
        );
    }

    #[test]
    fn report_defaults_missing_amount_to_zero() {
        let report = Report::from(GatewayTransaction {
            transaction_reference: Some("MNFY|9".to_string()),
            payment_reference: Some("NH-9".to_string()),
            amount_paid: None,
            payment_status: GatewayStatus::Pending,
        });
        assert_eq!(report.amount_paid, BigDecimal::zero());
        assert_eq!(report.gateway_reference.as_deref(), Some("MNFY|9"));
    }
}
