use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Query string shared by the contact, category and label listings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub order: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

pub mod contact {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct ContactView {
        pub id: i32,
        pub name: String,
        pub first_name: String,
        pub last_name: String,
        pub email: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub address: String,
        pub city: String,
        pub state: String,
        pub zip: String,
        pub country: String,
        pub phone: String,
        pub website: String,
        pub avatar: String,
    }
}

pub mod category {
    use super::*;

    /// Direction of a category as exposed by the API.
    ///
    /// Storage keeps the legacy codes `"1"` (expense) and `"2"` (income).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CategoryKind {
        Income,
        Expense,
    }

    impl CategoryKind {
        pub fn from_code(code: &str) -> Self {
            if code == "1" {
                Self::Expense
            } else {
                Self::Income
            }
        }

        pub fn code(self) -> &'static str {
            match self {
                Self::Expense => "1",
                Self::Income => "2",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: i32,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: CategoryKind,
    }

    /// Request body for creating a category. `type` takes `income`,
    /// `expense` or the numeric codes.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryNew {
        #[serde(default)]
        pub name: String,
        #[serde(default, rename = "type")]
        pub kind: String,
    }

    /// Query string of the category listing; `type` is `income` or
    /// `expense`.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryListParams {
        pub page: Option<i64>,
        pub order: Option<String>,
        pub sort: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<String>,
    }
}

pub mod label {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LabelView {
        pub id: i32,
        pub name: String,
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LabelNew {
        #[serde(default)]
        pub name: String,
    }
}

pub mod file {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FileView {
        pub id: i32,
        pub name: String,
        pub path: String,
        #[serde(rename = "type")]
        pub mime_type: String,
        pub size: i64,
    }
}

pub mod ledger {
    use super::*;
    use crate::{category::CategoryView, contact::ContactView, file::FileView, label::LabelView};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct LedgerView {
        pub id: i32,
        pub account_id: i32,
        pub added_by_id: i32,
        pub contact_id: i32,
        pub category_id: i32,
        pub date: NaiveDate,
        pub amount: f64,
        pub note: String,
        pub contact: Option<ContactView>,
        pub category: Option<CategoryView>,
        pub labels: Vec<LabelView>,
        pub files: Vec<FileView>,
    }

    /// Contact inside a ledger write. An `id` of 0 or none asks for a
    /// lookup by name and creation when missing.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ContactRef {
        pub id: Option<i32>,
        pub name: String,
        pub first_name: String,
        pub last_name: String,
        pub email: String,
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct CategoryRef {
        pub id: Option<i32>,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: String,
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct LabelRef {
        pub id: Option<i32>,
        pub name: String,
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct FileRef {
        pub id: i32,
    }

    /// Request body for creating or updating a ledger entry.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct LedgerUpsert {
        pub date: Option<NaiveDate>,
        pub amount: f64,
        pub note: String,
        pub contact: ContactRef,
        pub category: CategoryRef,
        pub labels: Vec<LabelRef>,
        pub files: Vec<FileRef>,
    }

    /// Query string of the ledger listing.
    ///
    /// `labels` is a comma separated list of label ids.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LedgerListParams {
        pub page: Option<i64>,
        pub order: Option<String>,
        pub sort: Option<String>,
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub category_id: Option<i32>,
        pub year: Option<i32>,
        pub start: Option<NaiveDate>,
        pub end: Option<NaiveDate>,
        pub labels: Option<String>,
        pub search: Option<String>,
    }
}

pub mod error {
    use std::collections::BTreeMap;

    use super::*;

    /// Body of every non-validation error response.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ErrorBody {
        pub error: String,
    }

    /// Body of a validation failure, keyed by field name.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ValidationBody {
        pub errors: BTreeMap<String, String>,
    }
}
