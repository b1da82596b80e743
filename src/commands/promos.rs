use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tower::Service;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::{
    domain::{
        promo::{validate_and_normalize, PromoInput, ValidationError},
        Promo, PromoStatus,
    },
    ports::promo::{PromoFilter, PromoStore},
};

use super::{log_failure, null_as_default, CommandFuture, Error, PromoLifecycle, Source};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct InsertPromoRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub info: PromoInput,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Source,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct UpdatePromoRequest {
    pub id: Option<Uuid>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub info: PromoInput,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Source,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SelectOnePromoRequest {
    pub id: Option<Uuid>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Source,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SelectAllPromosRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Source,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeletePromoRequest {
    pub id: Option<Uuid>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: Source,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeletePromoResponse {
    pub id: Uuid,
    pub message: String,
}

impl<P> Service<InsertPromoRequest> for PromoLifecycle<P>
where
    P: PromoStore + Send + Sync + 'static,
{
    type Response = Promo;
    type Error = Error;
    type Future = CommandFuture<Promo>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: InsertPromoRequest) -> Self::Future {
        let promos = self.promos.clone();
        let span = info_span!("insert_promo", source = ?req.source);
        Box::pin(
            async move { insert(&*promos, req.info).await.inspect_err(log_failure) }
                .instrument(span),
        )
    }
}

async fn insert<P: PromoStore>(promos: &P, info: PromoInput) -> Result<Promo, Error> {
    let definition = validate_and_normalize(info)?;

    if promos
        .exists_by_filter(PromoFilter::Name(definition.name.clone()))
        .await?
    {
        return Err(name_taken(&definition.name));
    }

    let promo = promos.insert_one(definition).await?;
    info!(promo_id = %promo.id, status = promo.status().as_str(), "promo created");

    Ok(promo)
}

impl<P> Service<UpdatePromoRequest> for PromoLifecycle<P>
where
    P: PromoStore + Send + Sync + 'static,
{
    type Response = Promo;
    type Error = Error;
    type Future = CommandFuture<Promo>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: UpdatePromoRequest) -> Self::Future {
        let promos = self.promos.clone();
        let span = info_span!("update_promo", promo_id = ?req.id, source = ?req.source);
        Box::pin(
            async move {
                update(&*promos, req.id, req.info)
                    .await
                    .inspect_err(log_failure)
            }
            .instrument(span),
        )
    }
}

async fn update<P: PromoStore>(
    promos: &P,
    id: Option<Uuid>,
    info: PromoInput,
) -> Result<Promo, Error> {
    let id = id.ok_or(ValidationError::MissingInformation("id"))?;

    // Without an explicit status, the stored one is kept
    let keep_status = info.status.is_none();
    let mut definition = validate_and_normalize(info)?;

    let existing = promos
        .select_one_by_filter(PromoFilter::Id(id))
        .await?
        .ok_or(Error::NotFound("Promo"))?;
    if keep_status {
        definition.status = existing.status();
    }

    if let Some(other) = promos
        .select_one_by_filter(PromoFilter::Name(definition.name.clone()))
        .await?
    {
        if other.id != id {
            return Err(name_taken(&definition.name));
        }
    }

    promos
        .update_one_by_filter(PromoFilter::Id(id), definition.clone())
        .await?;
    info!(
        from = existing.status().as_str(),
        to = definition.status.as_str(),
        "promo updated"
    );

    Ok(Promo { id, definition })
}

impl<P> Service<SelectOnePromoRequest> for PromoLifecycle<P>
where
    P: PromoStore + Send + Sync + 'static,
{
    type Response = Promo;
    type Error = Error;
    type Future = CommandFuture<Promo>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: SelectOnePromoRequest) -> Self::Future {
        let promos = self.promos.clone();
        let span = info_span!("select_one_promo", promo_id = ?req.id, source = ?req.source);
        Box::pin(
            async move { select_one(&*promos, req.id).await.inspect_err(log_failure) }
                .instrument(span),
        )
    }
}

async fn select_one<P: PromoStore>(promos: &P, id: Option<Uuid>) -> Result<Promo, Error> {
    let id = id.ok_or(ValidationError::MissingInformation("id"))?;

    promos
        .select_one_by_filter(PromoFilter::Id(id))
        .await?
        .ok_or(Error::NotFound("Promo"))
}

impl<P> Service<SelectAllPromosRequest> for PromoLifecycle<P>
where
    P: PromoStore + Send + Sync + 'static,
{
    type Response = Vec<Promo>;
    type Error = Error;
    type Future = CommandFuture<Vec<Promo>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: SelectAllPromosRequest) -> Self::Future {
        let promos = self.promos.clone();
        let span = info_span!("select_all_promos", source = ?req.source);
        Box::pin(
            async move {
                promos
                    .select_all()
                    .await
                    .map_err(Error::from)
                    .inspect_err(log_failure)
            }
            .instrument(span),
        )
    }
}

impl<P> Service<DeletePromoRequest> for PromoLifecycle<P>
where
    P: PromoStore + Send + Sync + 'static,
{
    type Response = DeletePromoResponse;
    type Error = Error;
    type Future = CommandFuture<DeletePromoResponse>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: DeletePromoRequest) -> Self::Future {
        let promos = self.promos.clone();
        let span = info_span!("delete_promo", promo_id = ?req.id, source = ?req.source);
        Box::pin(
            async move { delete(&*promos, req.id).await.inspect_err(log_failure) }
                .instrument(span),
        )
    }
}

async fn delete<P: PromoStore>(promos: &P, id: Option<Uuid>) -> Result<DeletePromoResponse, Error> {
    let id = id.ok_or(ValidationError::MissingInformation("id"))?;

    let promo = promos
        .select_one_by_filter(PromoFilter::Id(id))
        .await?
        .ok_or(Error::NotFound("Promo"))?;

    // Only draft and inactive promos can go
    if promo.status() == PromoStatus::Active {
        return Err(Error::BusinessRule("Active promos can't be deleted".into()));
    }

    promos.delete_one_by_filter(PromoFilter::Id(id)).await?;
    info!("promo deleted");

    Ok(DeletePromoResponse {
        id,
        message: format!("Promo with ID: {id} is deleted"),
    })
}

fn name_taken(name: &str) -> Error {
    Error::BusinessRule(format!("Promo with name {name} already exists").into())
}
