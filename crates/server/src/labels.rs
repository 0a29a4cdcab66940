//! Labels API endpoints

use api_types::{
    ListParams,
    label::{LabelNew, LabelView},
};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    ServerError,
    paging::{self, Paged},
    server::{AccountContext, ServerState},
    views,
};

pub async fn list(
    Extension(ctx): Extension<AccountContext>,
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> Result<Paged<LabelView>, ServerError> {
    let page = state
        .engine
        .list_labels(ctx.account_id, &paging::list_query(params))
        .await?;
    Ok(Paged::new(page.map(views::label)))
}

pub async fn create(
    Extension(ctx): Extension<AccountContext>,
    State(state): State<ServerState>,
    Json(body): Json<LabelNew>,
) -> Result<(StatusCode, Json<LabelView>), ServerError> {
    let label = state.engine.create_label(ctx.account_id, &body.name).await?;
    Ok((StatusCode::CREATED, Json(views::label(label))))
}
