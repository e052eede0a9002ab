//! Field Catalog
//!
//! Static registry of the user fields the API can filter and sort on. The
//! table must stay in lock-step with the API's accepted field names and with
//! the alias tables in [`crate::encoder`].

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Data kind of a field, governing its legal operators and inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Monotonic integer id
    Counter,
    /// Opaque numeric/text identifier, nullable
    IdNumber,
    Text,
    /// Numeric value supporting ordering comparisons
    RangeNumber,
    Boolean,
    /// Integer seconds since the epoch
    Unix,
    /// ISO-8601 instant
    Datetime,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::IdNumber => "id_number",
            Self::Text => "text",
            Self::RangeNumber => "range_number",
            Self::Boolean => "boolean",
            Self::Unix => "unix",
            Self::Datetime => "datetime",
        }
    }

    /// Whether inputs of this type are entered as numbers
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Counter | Self::IdNumber | Self::RangeNumber | Self::Unix
        )
    }

    /// Whether inputs of this type are points in time
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Unix | Self::Datetime)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Description of one catalog field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// API field name (unique key)
    pub name: &'static str,
    pub semantic_type: SemanticType,
    pub sortable: bool,
    pub filterable: bool,
    /// Display title shown by the dashboard
    pub label: &'static str,
}

impl FieldDescriptor {
    pub const fn new(
        name: &'static str,
        semantic_type: SemanticType,
        sortable: bool,
        filterable: bool,
        label: &'static str,
    ) -> Self {
        Self {
            name,
            semantic_type,
            sortable,
            filterable,
            label,
        }
    }
}

/// Ordered, read-only set of field descriptors
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    fields: Vec<FieldDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl FieldCatalog {
    /// Build a catalog; later descriptors with a duplicate name are ignored
    pub fn new(descriptors: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        let mut fields = Vec::new();
        let mut index = HashMap::new();
        for descriptor in descriptors {
            if index.contains_key(descriptor.name) {
                continue;
            }
            index.insert(descriptor.name, fields.len());
            fields.push(descriptor);
        }
        Self { fields, index }
    }

    /// Find a field by name
    pub fn lookup(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// Fields matching a predicate, in catalog order
    pub fn list(&self, predicate: impl Fn(&FieldDescriptor) -> bool) -> Vec<&FieldDescriptor> {
        self.fields.iter().filter(|f| predicate(f)).collect()
    }

    pub fn filterable(&self) -> Vec<&FieldDescriptor> {
        self.list(|f| f.filterable)
    }

    pub fn sortable(&self) -> Vec<&FieldDescriptor> {
        self.list(|f| f.sortable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Known user field names
pub mod fields {
    pub const COUNTER: &str = "counter";
    pub const USER_ID: &str = "user_id";
    pub const ACCOUNTING_CODE: &str = "accounting_code";
    pub const USERNAME: &str = "username";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const NICKNAME: &str = "nickname";
    pub const PHONE_NUMBER: &str = "phone_number";
    pub const WHATSAPP_NUMBER: &str = "whatsapp_number";
    pub const COUNTRY: &str = "country";
    pub const MODE: &str = "mode";
    pub const IS_BAN: &str = "is_ban";
    pub const IS_REGISTERED: &str = "is_registered";
    pub const CHAT_NOT_FOUND: &str = "chat_not_found";
    pub const SCORE: &str = "score";
    pub const BAN_TIME: &str = "ban_time";
    pub const JOIN_DATE: &str = "join_date";
    pub const PROFILE_PATH: &str = "profile_path";
    pub const TELEGRAM_MESSAGE_ID: &str = "telegram_message_id";
    pub const GROUP_MESSAGE_ID: &str = "group_message_id";
    pub const PUBLIC_MESSAGE_ID: &str = "public_message_id";
    pub const PUBLIC_GROUP_MESSAGE_ID: &str = "public_group_message_id";
    pub const UPDATED_AT: &str = "updated_at";
    pub const CHANNEL_UPDATED_AT: &str = "channel_updated_at";
}

static USER_FIELDS: Lazy<FieldCatalog> = Lazy::new(|| {
    use fields::*;
    use SemanticType::*;

    FieldCatalog::new([
        FieldDescriptor::new(COUNTER, Counter, true, true, "شمارنده"),
        FieldDescriptor::new(USER_ID, IdNumber, true, true, "آیدی تلگرام"),
        FieldDescriptor::new(ACCOUNTING_CODE, IdNumber, true, true, "کد حسابداری"),
        FieldDescriptor::new(USERNAME, Text, true, true, "یوزر تلگرام"),
        FieldDescriptor::new(FIRST_NAME, Text, true, true, "نام کوچک"),
        FieldDescriptor::new(LAST_NAME, Text, true, true, "نام خانوادگی"),
        FieldDescriptor::new(NICKNAME, Text, true, true, "نام تلگرام"),
        FieldDescriptor::new(PHONE_NUMBER, Text, true, true, "شماره همراه"),
        FieldDescriptor::new(WHATSAPP_NUMBER, Text, true, true, "شماره واتساپ"),
        FieldDescriptor::new(COUNTRY, Text, true, true, "کشور"),
        FieldDescriptor::new(MODE, IdNumber, true, true, "حالت در ربات"),
        FieldDescriptor::new(IS_BAN, Boolean, true, true, "بن شده است"),
        FieldDescriptor::new(IS_REGISTERED, Boolean, true, true, "رجیستر شده است"),
        FieldDescriptor::new(CHAT_NOT_FOUND, Boolean, true, true, "چت یافت نمیشود"),
        FieldDescriptor::new(SCORE, RangeNumber, true, true, "امتیاز"),
        FieldDescriptor::new(BAN_TIME, Unix, true, true, "تاریخ بن شدن"),
        FieldDescriptor::new(JOIN_DATE, Unix, true, true, "تاریخ عضویت"),
        FieldDescriptor::new(PROFILE_PATH, Text, false, true, "مسیر پروفایل"),
        FieldDescriptor::new(TELEGRAM_MESSAGE_ID, IdNumber, false, true, "آیدی پیام چنل اصلی"),
        FieldDescriptor::new(GROUP_MESSAGE_ID, IdNumber, false, true, "آیدی پیام کامنت اصلی"),
        FieldDescriptor::new(PUBLIC_MESSAGE_ID, IdNumber, false, true, "آیدی پیام چنل عمومی"),
        FieldDescriptor::new(PUBLIC_GROUP_MESSAGE_ID, IdNumber, false, true, "آیدی پیام کامنت عمومی"),
        FieldDescriptor::new(UPDATED_AT, Datetime, true, true, "تاریخ آخرین ویرایش"),
        FieldDescriptor::new(CHANNEL_UPDATED_AT, Datetime, true, true, "تاریخ آپدیت شدن چنل"),
    ])
});

/// The process-wide catalog of user fields
pub fn user_catalog() -> &'static FieldCatalog {
    &USER_FIELDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let catalog = user_catalog();
        let score = catalog.lookup("score").unwrap();
        assert_eq!(score.semantic_type, SemanticType::RangeNumber);
        assert!(score.sortable);
        assert!(catalog.lookup("password").is_none());
    }

    #[test]
    fn test_catalog_size_and_order() {
        let catalog = user_catalog();
        assert_eq!(catalog.len(), 24);
        assert_eq!(catalog.iter().next().map(|f| f.name), Some(fields::COUNTER));
        assert_eq!(catalog.filterable().len(), 24);
    }

    #[test]
    fn test_sortable_excludes_message_ids() {
        let sortable: Vec<&str> = user_catalog().sortable().iter().map(|f| f.name).collect();
        assert_eq!(sortable.len(), 19);
        assert!(!sortable.contains(&fields::PROFILE_PATH));
        assert!(!sortable.contains(&fields::TELEGRAM_MESSAGE_ID));
        assert!(sortable.contains(&fields::CHANNEL_UPDATED_AT));
    }

    #[test]
    fn test_list_by_type() {
        let temporal = user_catalog().list(|f| f.semantic_type.is_temporal());
        let names: Vec<&str> = temporal.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec!["ban_time", "join_date", "updated_at", "channel_updated_at"]
        );
    }

    #[test]
    fn test_custom_catalog_ignores_duplicates() {
        let catalog = FieldCatalog::new([
            FieldDescriptor::new("a", SemanticType::Text, true, true, "A"),
            FieldDescriptor::new("a", SemanticType::Boolean, false, false, "A2"),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("a").unwrap().semantic_type, SemanticType::Text);
    }
}
