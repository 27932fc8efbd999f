use super::{
    provider::{self, ProviderStatus, StatusUpdate},
    repository::{self, Activation, ActivationStatus},
};
use crate::{
    modules::{catalog, transaction, wallet},
    types::Context,
};
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, PartialEq)]
pub enum Error {
    ServiceNotFound,
    OutOfStock,
    InsufficientBalance,
    ActivationNotFound,
    InvalidState(ActivationStatus),
    EarlyCancelDenied,
    ProviderUnavailable,
    UnexpectedError,
}

impl From<provider::Error> for Error {
    fn from(err: provider::Error) -> Self {
        match err {
            provider::Error::NoNumbers => Error::OutOfStock,
            provider::Error::EarlyCancelDenied => Error::EarlyCancelDenied,
            provider::Error::NoActivation => Error::ActivationNotFound,
            provider::Error::NoBalance
            | provider::Error::BadKey
            | provider::Error::RequestNotSent
            | provider::Error::InvalidHttpResponseStatusCode
            | provider::Error::FailedToDecodeResponse
            | provider::Error::Rejected(_) => Error::ProviderUnavailable,
        }
    }
}

pub struct PurchasePayload {
    pub user_id: String,
    pub country_id: i64,
    pub service_code: String,
}

/// Releases a number the provider handed out but we failed to record.
async fn release_number(ctx: &Context, provider_activation_id: &str) {
    if let Err(err) = ctx
        .number
        .provider
        .set_status(provider_activation_id, StatusUpdate::Cancel)
        .await
    {
        tracing::error!(
            "Failed to release provider activation {}: {:?}",
            provider_activation_id,
            err
        );
    }
}

pub async fn purchase(ctx: Arc<Context>, payload: PurchasePayload) -> Result<Activation, Error> {
    let listing = catalog::repository::find_listing(
        &ctx.db_conn.pool,
        payload.country_id,
        payload.service_code.clone(),
    )
    .await
    .map_err(|_| Error::UnexpectedError)?
    .ok_or(Error::ServiceNotFound)?;

    if listing.stock <= 0 {
        return Err(Error::OutOfStock);
    }

    let mut tx = ctx.db_conn.pool.begin().await.map_err(|err| {
        tracing::error!("Failed to start purchase transaction: {}", err);
        Error::UnexpectedError
    })?;

    wallet::repository::debit(&mut *tx, payload.user_id.clone(), listing.price.clone())
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::InsufficientBalance)?;

    let assignment = ctx
        .number
        .provider
        .get_number(payload.country_id, &payload.service_code)
        .await?;

    let recorded = async {
        let activation = repository::create(
            &mut *tx,
            repository::CreatePayload {
                user_id: payload.user_id.clone(),
                provider_activation_id: assignment.activation_id.clone(),
                phone_number: assignment.phone_number.clone(),
                country_id: payload.country_id,
                service_code: payload.service_code.clone(),
                price: listing.price.clone(),
                expires_at: (Utc::now() + ctx.number.activation_window).naive_utc(),
            },
        )
        .await
        .map_err(|_| Error::UnexpectedError)?;

        transaction::repository::create(
            &mut *tx,
            transaction::repository::CreatePayload {
                amount: listing.price.clone(),
                direction: transaction::repository::TransactionDirection::Outgoing,
                purpose: transaction::repository::TransactionPurpose::Purchase,
                reference: Some(activation.id.clone()),
                note: Some(format!("{} number ({})", listing.name, activation.phone_number)),
                user_id: payload.user_id.clone(),
            },
        )
        .await
        .map_err(|_| Error::UnexpectedError)?;

        tx.commit().await.map_err(|err| {
            tracing::error!("Failed to commit purchase transaction: {}", err);
            Error::UnexpectedError
        })?;

        Ok::<_, Error>(activation)
    }
    .await;

    match recorded {
        Ok(activation) => {
            if let Err(err) = ctx
                .number
                .provider
                .set_status(&activation.provider_activation_id, StatusUpdate::ReadyForSms)
                .await
            {
                tracing::warn!(
                    "Provider did not acknowledge activation {} as ready: {:?}",
                    activation.id,
                    err
                );
            }

            tracing::info!(
                "User {} purchased activation {} for {}",
                activation.user_id,
                activation.id,
                activation.price
            );
            Ok(activation)
        }
        Err(err) => {
            release_number(&ctx, &assignment.activation_id).await;
            Err(err)
        }
    }
}

/// Closes a WAITING activation and refunds its price. Returns `None` when the
/// activation had already left WAITING.
async fn close_and_refund(
    ctx: &Context,
    activation: &Activation,
    to: ActivationStatus,
) -> Result<Option<Activation>, Error> {
    let mut tx = ctx.db_conn.pool.begin().await.map_err(|err| {
        tracing::error!("Failed to start refund transaction: {}", err);
        Error::UnexpectedError
    })?;

    let closed = match repository::transition(
        &mut *tx,
        activation.id.clone(),
        ActivationStatus::Waiting,
        to.clone(),
    )
    .await
    .map_err(|_| Error::UnexpectedError)?
    {
        Some(closed) => closed,
        None => return Ok(None),
    };

    wallet::repository::credit(&mut *tx, closed.user_id.clone(), closed.price.clone())
        .await
        .map_err(|_| Error::UnexpectedError)?;

    transaction::repository::create(
        &mut *tx,
        transaction::repository::CreatePayload {
            amount: closed.price.clone(),
            direction: transaction::repository::TransactionDirection::Incoming,
            purpose: transaction::repository::TransactionPurpose::Refund,
            reference: Some(closed.id.clone()),
            note: Some(format!("Refund for {}", closed.phone_number)),
            user_id: closed.user_id.clone(),
        },
    )
    .await
    .map_err(|_| Error::UnexpectedError)?;

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit refund transaction: {}", err);
        Error::UnexpectedError
    })?;

    tracing::info!(
        "Activation {} marked {} and refunded {}",
        closed.id,
        to.to_string(),
        closed.price
    );

    Ok(Some(closed))
}

async fn reload(ctx: &Context, activation: &Activation) -> Result<Activation, Error> {
    repository::find_by_id_and_user_id(
        &ctx.db_conn.pool,
        activation.id.clone(),
        activation.user_id.clone(),
    )
    .await
    .map_err(|_| Error::UnexpectedError)?
    .ok_or(Error::ActivationNotFound)
}

/// Applies the provider's view of an open activation.
async fn apply_provider_status(
    ctx: &Context,
    activation: Activation,
    status: ProviderStatus,
) -> Result<Activation, Error> {
    if let Some(code) = status.code() {
        if activation.code.as_deref() == Some(code) {
            return Ok(activation);
        }

        return match repository::record_code(
            &ctx.db_conn.pool,
            activation.id.clone(),
            code.to_string(),
        )
        .await
        .map_err(|_| Error::UnexpectedError)?
        {
            Some(updated) => Ok(updated),
            None => reload(ctx, &activation).await,
        };
    }

    if status != ProviderStatus::Cancelled || activation.status != ActivationStatus::Waiting {
        return Ok(activation);
    }

    match close_and_refund(ctx, &activation, ActivationStatus::Cancelled).await? {
        Some(closed) => Ok(closed),
        None => reload(ctx, &activation).await,
    }
}

async fn find_owned(ctx: &Context, user_id: String, id: String) -> Result<Activation, Error> {
    repository::find_by_id_and_user_id(&ctx.db_conn.pool, id, user_id)
        .await
        .map_err(|_| Error::UnexpectedError)?
        .ok_or(Error::ActivationNotFound)
}

/// Fetches an activation, polling the provider while it is still open.
pub async fn get(ctx: Arc<Context>, user_id: String, id: String) -> Result<Activation, Error> {
    let activation = find_owned(&ctx, user_id, id).await?;

    if !matches!(
        activation.status,
        ActivationStatus::Waiting | ActivationStatus::Received
    ) {
        return Ok(activation);
    }

    match ctx
        .number
        .provider
        .get_status(&activation.provider_activation_id)
        .await
    {
        Ok(status) => apply_provider_status(&ctx, activation, status).await,
        Err(err) => {
            tracing::warn!(
                "Failed to poll provider for activation {}: {:?}",
                activation.id,
                err
            );
            Ok(activation)
        }
    }
}

pub async fn cancel(ctx: Arc<Context>, user_id: String, id: String) -> Result<Activation, Error> {
    let activation = find_owned(&ctx, user_id, id).await?;

    if activation.status != ActivationStatus::Waiting {
        return Err(Error::InvalidState(activation.status));
    }

    match ctx
        .number
        .provider
        .set_status(&activation.provider_activation_id, StatusUpdate::Cancel)
        .await
    {
        Ok(()) | Err(provider::Error::NoActivation) => (),
        Err(err) => return Err(err.into()),
    };

    match close_and_refund(&ctx, &activation, ActivationStatus::Cancelled).await? {
        Some(closed) => Ok(closed),
        None => {
            let current = reload(&ctx, &activation).await?;
            Err(Error::InvalidState(current.status))
        }
    }
}

pub async fn finish(ctx: Arc<Context>, user_id: String, id: String) -> Result<Activation, Error> {
    let activation = find_owned(&ctx, user_id, id).await?;

    if activation.status != ActivationStatus::Received {
        return Err(Error::InvalidState(activation.status));
    }

    ctx.number
        .provider
        .set_status(&activation.provider_activation_id, StatusUpdate::Complete)
        .await?;

    match repository::transition(
        &ctx.db_conn.pool,
        activation.id.clone(),
        ActivationStatus::Received,
        ActivationStatus::Completed,
    )
    .await
    .map_err(|_| Error::UnexpectedError)?
    {
        Some(completed) => Ok(completed),
        None => {
            let current = reload(&ctx, &activation).await?;
            Err(Error::InvalidState(current.status))
        }
    }
}

/// Returns whether the activation ended up EXPIRED.
async fn expire(ctx: &Context, activation: Activation) -> Result<bool, Error> {
    let provider = &ctx.number.provider;

    if let Ok(status) = provider.get_status(&activation.provider_activation_id).await {
        if status.code().is_some() {
            apply_provider_status(ctx, activation, status).await?;
            return Ok(false);
        }
    }

    if let Err(err) = provider
        .set_status(&activation.provider_activation_id, StatusUpdate::Cancel)
        .await
    {
        tracing::warn!(
            "Provider refused to cancel expired activation {}: {:?}",
            activation.id,
            err
        );
    }

    Ok(close_and_refund(ctx, &activation, ActivationStatus::Expired)
        .await?
        .is_some())
}

/// Closes every WAITING activation past its window. A code that arrived at
/// the last moment is kept instead.
pub async fn expire_overdue(ctx: Arc<Context>) -> Result<usize, Error> {
    let overdue = repository::find_expired_waiting(&ctx.db_conn.pool, Utc::now().naive_utc())
        .await
        .map_err(|_| Error::UnexpectedError)?;

    let mut expired = 0;
    for activation in overdue {
        let id = activation.id.clone();

        match expire(&ctx, activation).await {
            Ok(true) => expired += 1,
            Ok(false) => (),
            Err(err) => tracing::error!("Failed to expire activation {}: {:?}", id, err),
        }
    }

    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_map_to_purchase_outcomes() {
        assert_eq!(Error::from(provider::Error::NoNumbers), Error::OutOfStock);
        assert_eq!(
            Error::from(provider::Error::NoBalance),
            Error::ProviderUnavailable
        );
        assert_eq!(
            Error::from(provider::Error::EarlyCancelDenied),
            Error::EarlyCancelDenied
        );
        assert_eq!(
            Error::from(provider::Error::Rejected("BANNED".to_string())),
            Error::ProviderUnavailable
        );
    }
}
