use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
            Deserialize,
        )]
        pub struct $name(pub i64);
    };
}

id_newtype!(ItemId);

/// Store names offered to the user. Static configuration, not part of the
/// dynamic data model; an item's `store` field may also be empty.
pub const STORE_CATALOG: &[&str] = &[
    "Carrefour",
    "Kaufland",
    "LIDL",
    "Metro",
    "Piață",
    "Selgros",
    "Black Friday",
];

/// One grocery entry as held by the remote collection. Every field carries a
/// default so a partially populated document still decodes; a document with
/// mistyped fields does not, and is skipped upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryItem {
    #[serde(default)]
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub store: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Active store filter. `All` is the distinguished no-filter sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreFilter {
    All,
    Store(String),
}

impl StoreFilter {
    pub fn matches(&self, item: &GroceryItem) -> bool {
        match self {
            StoreFilter::All => true,
            StoreFilter::Store(store) => item.store == *store,
        }
    }
}
