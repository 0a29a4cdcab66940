//! Command structs for engine operations.
//!
//! A [`LedgerDraft`] is the unvalidated shape of a ledger write as it arrives
//! from a client. [`LedgerDraft::normalize`] trims it and pins every nested
//! record to the ledger's account, and [`LedgerDraft::validate`] collects the
//! field errors that must be reported before anything is written.

use chrono::NaiveDate;

use crate::{ResultEngine, ValidationErrors, contacts::CONTACT_KIND_BOTH};

/// Contact reference inside a ledger write.
///
/// Without an `id` the contact is matched by name (or first and last name)
/// and created when missing. With an `id` the stored contact is updated with
/// these fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub id: Option<i32>,
    pub account_id: i32,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub kind: String,
}

impl ContactDraft {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn person(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

/// Category reference inside a ledger write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryDraft {
    pub id: Option<i32>,
    pub account_id: i32,
    pub name: String,
    /// Legacy type code, `"1"` expense or `"2"` income.
    pub kind: String,
}

impl CategoryDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }
}

/// Label reference inside a ledger write. Labels are matched by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelDraft {
    pub id: Option<i32>,
    pub account_id: i32,
    pub name: String,
}

impl LabelDraft {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A ledger create or update request.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerDraft {
    pub account_id: i32,
    pub added_by_id: i32,
    pub date: Option<NaiveDate>,
    pub amount: f64,
    pub note: String,
    pub contact: ContactDraft,
    pub category: CategoryDraft,
    pub labels: Vec<LabelDraft>,
    /// Ids of already uploaded files to attach.
    pub files: Vec<i32>,
}

impl LedgerDraft {
    #[must_use]
    pub fn new(
        account_id: i32,
        added_by_id: i32,
        date: NaiveDate,
        amount: f64,
        contact: ContactDraft,
        category: CategoryDraft,
    ) -> Self {
        Self {
            account_id,
            added_by_id,
            date: Some(date),
            amount,
            note: String::new(),
            contact,
            category,
            labels: Vec::new(),
            files: Vec::new(),
        }
    }

    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    #[must_use]
    pub fn label(mut self, name: impl Into<String>) -> Self {
        self.labels.push(LabelDraft::named(name));
        self
    }

    #[must_use]
    pub fn file(mut self, file_id: i32) -> Self {
        self.files.push(file_id);
        self
    }

    /// Trim free text and scope every nested record to the ledger's account.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        let account_id = self.account_id;

        self.note = self.note.trim().to_string();

        self.contact.account_id = account_id;
        self.contact.name = self.contact.name.trim().to_string();
        self.contact.first_name = self.contact.first_name.trim().to_string();
        self.contact.last_name = self.contact.last_name.trim().to_string();
        self.contact.email = self.contact.email.trim().to_string();
        self.contact.kind = CONTACT_KIND_BOTH.to_string();
        self.contact.id = self.contact.id.filter(|id| *id > 0);

        self.category.account_id = account_id;
        self.category.name = self.category.name.trim().to_string();
        self.category.kind = self.category.kind.trim().to_string();
        self.category.id = self.category.id.filter(|id| *id > 0);

        for label in &mut self.labels {
            label.account_id = account_id;
            label.name = label.name.trim().to_string();
            label.id = label.id.filter(|id| *id > 0);
        }

        self
    }

    /// Collect every field error of the draft. Call after [`normalize`].
    ///
    /// [`normalize`]: LedgerDraft::normalize
    pub fn validate(&self) -> ResultEngine<()> {
        let mut errors = ValidationErrors::new();

        if self.amount == 0.0 || !self.amount.is_finite() {
            errors.add("amount", "The amount field is required.");
        }
        if self.date.is_none() {
            errors.add("date", "The date field is required.");
        }

        let contact = &self.contact;
        let has_person = !contact.first_name.is_empty() && !contact.last_name.is_empty();
        if contact.name.is_empty() && !has_person {
            errors.add(
                "contact",
                "A company name or contact first and last name is required.",
            );
        }

        if self.category.name.is_empty() {
            errors.add("category", "Category name is required.");
        } else if self.category.kind.is_empty() {
            errors.add("category", "Category type is required.");
        }

        for label in &self.labels {
            if label.name.is_empty() && label.id.is_none() {
                errors.add("labels", "Label name is required.");
            }
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;

    fn draft() -> LedgerDraft {
        LedgerDraft::new(
            3,
            9,
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or_default(),
            -42.5,
            ContactDraft::named("  Acme Corp "),
            CategoryDraft::new(" Office ", " 1 "),
        )
        .note("  paper  ")
        .label(" Q2 ")
    }

    #[test]
    fn normalize_trims_and_scopes_to_account() {
        let draft = draft().normalize();
        assert_eq!(draft.note, "paper");
        assert_eq!(draft.contact.name, "Acme Corp");
        assert_eq!(draft.contact.account_id, 3);
        assert_eq!(draft.contact.kind, "Both");
        assert_eq!(draft.category.name, "Office");
        assert_eq!(draft.category.kind, "1");
        assert_eq!(draft.category.account_id, 3);
        assert_eq!(draft.labels[0].name, "Q2");
        assert_eq!(draft.labels[0].account_id, 3);
    }

    #[test]
    fn zero_ids_mean_new_records() {
        let mut draft = draft();
        draft.contact.id = Some(0);
        draft.category.id = Some(0);
        let draft = draft.normalize();
        assert_eq!(draft.contact.id, None);
        assert_eq!(draft.category.id, None);
    }

    #[test]
    fn validation_reports_every_missing_field() {
        let mut draft = draft();
        draft.amount = 0.0;
        draft.date = None;
        draft.contact = ContactDraft::person("Jane", "");
        draft.category = CategoryDraft::new("   ", "1");

        let Err(EngineError::Validation(errors)) = draft.normalize().validate() else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.get("amount"), Some("The amount field is required."));
        assert_eq!(errors.get("date"), Some("The date field is required."));
        assert_eq!(
            errors.get("contact"),
            Some("A company name or contact first and last name is required.")
        );
        assert_eq!(errors.get("category"), Some("Category name is required."));
    }

    #[test]
    fn category_type_is_required() {
        let mut draft = draft();
        draft.category = CategoryDraft::new("Office", " ");
        let Err(EngineError::Validation(errors)) = draft.normalize().validate() else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.get("category"), Some("Category type is required."));
    }

    #[test]
    fn first_and_last_name_satisfy_contact() {
        let mut draft = draft();
        draft.contact = ContactDraft::person("Jane", "Doe");
        assert!(draft.normalize().validate().is_ok());
    }
}
