//! Conversions from engine aggregates to API views.

use api_types::{
    category::{CategoryKind, CategoryView},
    contact::ContactView,
    file::FileView,
    label::LabelView,
    ledger::LedgerView,
};

pub fn contact(contact: engine::Contact) -> ContactView {
    ContactView {
        id: contact.id,
        name: contact.name,
        first_name: contact.first_name,
        last_name: contact.last_name,
        email: contact.email,
        kind: contact.kind,
        address: contact.address,
        city: contact.city,
        state: contact.state,
        zip: contact.zip,
        country: contact.country,
        phone: contact.phone,
        website: contact.website,
        avatar: contact.avatar,
    }
}

pub fn category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        kind: CategoryKind::from_code(&category.kind),
    }
}

pub fn label(label: engine::Label) -> LabelView {
    LabelView {
        id: label.id,
        name: label.name,
    }
}

pub fn file(file: engine::File) -> FileView {
    FileView {
        id: file.id,
        name: file.name,
        path: file.path,
        mime_type: file.mime_type,
        size: file.size,
    }
}

pub fn ledger(ledger: engine::Ledger) -> LedgerView {
    LedgerView {
        id: ledger.id,
        account_id: ledger.account_id,
        added_by_id: ledger.added_by_id,
        contact_id: ledger.contact_id,
        category_id: ledger.category_id,
        date: ledger.date,
        amount: ledger.amount,
        note: ledger.note,
        contact: ledger.contact.map(contact),
        category: ledger.category.map(category),
        labels: ledger.labels.into_iter().map(label).collect(),
        files: ledger.files.into_iter().map(file).collect(),
    }
}

/// Accepts `income`/`expense` as well as the stored codes.
pub fn category_code(kind: &str) -> String {
    let kind = kind.trim();
    match engine::EntryKind::try_from(kind.to_lowercase().as_str()) {
        Ok(kind) => kind.category_code().to_string(),
        Err(_) => kind.to_string(),
    }
}
