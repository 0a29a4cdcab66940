//! Ledger API endpoints

use api_types::ledger::{LedgerListParams, LedgerUpsert, LedgerView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    CategoryDraft, ContactDraft, EntryKind, LabelDraft, LedgerDraft, LedgerListFilter,
};

use crate::{
    ServerError,
    paging::Paged,
    server::{AccountContext, ServerState},
    views,
};

fn list_filter(params: LedgerListParams) -> LedgerListFilter {
    let kind = params
        .kind
        .as_deref()
        .and_then(|kind| EntryKind::try_from(kind).ok());
    // A non-blank list without a usable id filters everything out.
    let label_ids = params
        .labels
        .as_deref()
        .map(str::trim)
        .filter(|labels| !labels.is_empty())
        .map(|labels| {
            labels
                .split(',')
                .filter_map(|id| id.trim().parse().ok())
                .collect()
        });

    LedgerListFilter {
        page: params.page.unwrap_or_default(),
        order: params.order.unwrap_or_default(),
        sort: params.sort.unwrap_or_default(),
        kind,
        category_id: params.category_id.filter(|id| *id > 0),
        year: params.year,
        start_date: params.start,
        end_date: params.end,
        label_ids,
        search: params.search.unwrap_or_default(),
    }
}

fn draft(ctx: AccountContext, body: LedgerUpsert) -> LedgerDraft {
    LedgerDraft {
        account_id: ctx.account_id,
        added_by_id: ctx.user_id,
        date: body.date,
        amount: body.amount,
        note: body.note,
        contact: ContactDraft {
            id: body.contact.id,
            name: body.contact.name,
            first_name: body.contact.first_name,
            last_name: body.contact.last_name,
            email: body.contact.email,
            ..ContactDraft::default()
        },
        category: CategoryDraft {
            id: body.category.id,
            kind: views::category_code(&body.category.kind),
            name: body.category.name,
            ..CategoryDraft::default()
        },
        labels: body
            .labels
            .into_iter()
            .map(|label| LabelDraft {
                id: label.id,
                name: label.name,
                ..LabelDraft::default()
            })
            .collect(),
        files: body.files.into_iter().map(|file| file.id).collect(),
    }
}

pub async fn list(
    Extension(ctx): Extension<AccountContext>,
    State(state): State<ServerState>,
    Query(params): Query<LedgerListParams>,
) -> Result<Paged<LedgerView>, ServerError> {
    let page = state
        .engine
        .list_ledgers(ctx.account_id, &list_filter(params))
        .await?;
    Ok(Paged::new(page.map(views::ledger)))
}

pub async fn get(
    Extension(ctx): Extension<AccountContext>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Json<LedgerView>, ServerError> {
    let ledger = state.engine.ledger(ctx.account_id, id).await?;
    Ok(Json(views::ledger(ledger)))
}

pub async fn create(
    Extension(ctx): Extension<AccountContext>,
    State(state): State<ServerState>,
    Json(body): Json<LedgerUpsert>,
) -> Result<(StatusCode, Json<LedgerView>), ServerError> {
    let ledger = state.engine.create_ledger(draft(ctx, body)).await?;
    Ok((StatusCode::CREATED, Json(views::ledger(ledger))))
}

pub async fn update(
    Extension(ctx): Extension<AccountContext>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    Json(body): Json<LedgerUpsert>,
) -> Result<Json<LedgerView>, ServerError> {
    let ledger = state.engine.update_ledger(id, draft(ctx, body)).await?;
    Ok(Json(views::ledger(ledger)))
}

pub async fn delete(
    Extension(ctx): Extension<AccountContext>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_ledger(ctx.account_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn attach_file(
    Extension(ctx): Extension<AccountContext>,
    State(state): State<ServerState>,
    Path((id, file_id)): Path<(i32, i32)>,
) -> Result<Json<LedgerView>, ServerError> {
    let ledger = state
        .engine
        .add_file_to_ledger(ctx.account_id, id, file_id)
        .await?;
    Ok(Json(views::ledger(ledger)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_filter_parses_labels_and_type() {
        let filter = list_filter(LedgerListParams {
            kind: Some("expense".to_string()),
            labels: Some("3, 7,x,".to_string()),
            category_id: Some(0),
            ..LedgerListParams::default()
        });
        assert_eq!(filter.kind, Some(EntryKind::Expense));
        assert_eq!(filter.label_ids, Some(vec![3, 7]));
        assert_eq!(filter.category_id, None);
    }

    #[test]
    fn unparseable_labels_still_filter() {
        let filter = list_filter(LedgerListParams {
            labels: Some("x,y".to_string()),
            ..LedgerListParams::default()
        });
        assert_eq!(filter.label_ids, Some(Vec::new()));

        let filter = list_filter(LedgerListParams {
            labels: Some(" ".to_string()),
            ..LedgerListParams::default()
        });
        assert_eq!(filter.label_ids, None);
    }

    #[test]
    fn drafts_are_owned_by_the_caller() {
        let ctx = AccountContext {
            account_id: 4,
            user_id: 11,
        };
        let mut body = LedgerUpsert::default();
        body.category.kind = "income".to_string();
        let draft = draft(ctx, body);
        assert_eq!(draft.account_id, 4);
        assert_eq!(draft.added_by_id, 11);
        assert_eq!(draft.category.kind, "2");
    }
}
