//! Scoped read endpoints: latest per place, history, and export.

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use climon_core::repository::TimeRange;
use climon_service::{AlertTransport, PlaceSelector, ReadingView};
use surrealdb::Connection;

use crate::dto::{PlaceQuery, RangeQuery, parse_time_bound};
use crate::error::ApiResult;
use crate::state::AppState;

fn parse_range(from: Option<&str>, to: Option<&str>) -> ApiResult<TimeRange> {
    Ok(TimeRange {
        from: from.map(|raw| parse_time_bound("from", raw)).transpose()?,
        to: to.map(|raw| parse_time_bound("to", raw)).transpose()?,
    })
}

/// Latest reading per place in the caller's scope.
pub async fn latest_data<C, T>(
    State(state): State<AppState<C, T>>,
    headers: HeaderMap,
    Query(params): Query<PlaceQuery>,
) -> ApiResult<Json<Vec<ReadingView>>>
where
    C: Connection,
    T: AlertTransport + 'static,
{
    let tenant = state.authenticate(&headers).await?;
    let selector = PlaceSelector::parse(&params.place)?;
    Ok(Json(state.query.latest(&tenant, &selector).await?))
}

/// Full history for one place, newest first.
pub async fn history<C, T>(
    State(state): State<AppState<C, T>>,
    headers: HeaderMap,
    Query(params): Query<RangeQuery>,
) -> ApiResult<Json<Vec<ReadingView>>>
where
    C: Connection,
    T: AlertTransport + 'static,
{
    let tenant = state.authenticate(&headers).await?;
    let selector = PlaceSelector::parse(&params.place)?;
    let range = parse_range(params.from.as_deref(), params.to.as_deref())?;
    Ok(Json(state.query.history(&tenant, &selector, range).await?))
}

/// History across the selected places, rendered for export.
pub async fn export<C, T>(
    State(state): State<AppState<C, T>>,
    headers: HeaderMap,
    Query(params): Query<RangeQuery>,
) -> ApiResult<Json<Vec<ReadingView>>>
where
    C: Connection,
    T: AlertTransport + 'static,
{
    let tenant = state.authenticate(&headers).await?;
    let selector = PlaceSelector::parse(&params.place)?;
    let range = parse_range(params.from.as_deref(), params.to.as_deref())?;
    Ok(Json(state.query.export(&tenant, &selector, range).await?))
}
