//! Contacts API endpoints

use api_types::{ListParams, contact::ContactView};
use axum::{
    Extension,
    extract::{Query, State},
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
) -> Result<Paged<ContactView>, ServerError> {
    let page = state
        .engine
        .list_contacts(ctx.account_id, &paging::list_query(params))
        .await?;
    Ok(Paged::new(page.map(views::contact)))
}
