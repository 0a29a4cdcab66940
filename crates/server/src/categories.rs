//! Categories API endpoints

use api_types::category::{CategoryListParams, CategoryNew, CategoryView};
use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
};
use engine::{EntryKind, ListQuery};

use crate::{
    ServerError,
    paging::Paged,
    server::{AccountContext, ServerState},
    views,
};

pub async fn list(
    Extension(ctx): Extension<AccountContext>,
    State(state): State<ServerState>,
    Query(params): Query<CategoryListParams>,
) -> Result<Paged<CategoryView>, ServerError> {
    // Any other type value lists both kinds.
    let kind = params
        .kind
        .as_deref()
        .and_then(|kind| EntryKind::try_from(kind).ok());
    let list = ListQuery {
        page: params.page.unwrap_or_default(),
        order: params.order.unwrap_or_default(),
        sort: params.sort.unwrap_or_default(),
        ..ListQuery::default()
    };

    let page = state
        .engine
        .list_categories(ctx.account_id, &list, kind)
        .await?;
    Ok(Paged::new(page.map(views::category)))
}

pub async fn create(
    Extension(ctx): Extension<AccountContext>,
    State(state): State<ServerState>,
    Json(body): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let category = state
        .engine
        .create_category(ctx.account_id, &body.name, &views::category_code(&body.kind))
        .await?;
    Ok((StatusCode::CREATED, Json(views::category(category))))
}
