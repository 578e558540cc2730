use serde::{Deserialize, Serialize};

/// One typed attribute of a collection's schema.
///
/// The `id` is the stable identity of the field: it survives renames and is
/// what migrations refer to. The `name` is what records and rule expressions
/// see. Both must be unique within a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub type_: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub presentable: bool,
}

impl Field {
    pub fn new(id: impl Into<String>, name: impl Into<String>, type_: FieldType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            type_,
            required: false,
            system: false,
            hidden: false,
            presentable: false,
        }
    }
}

/// Field type together with its type-specific options.
///
/// Serialized with a `type` tag and the options flattened next to the common
/// field attributes, which matches the JSON shape the admin tooling emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    #[serde(rename_all = "camelCase")]
    Text {
        #[serde(default)]
        min: Option<u32>,
        #[serde(default)]
        max: Option<u32>,
        #[serde(default)]
        pattern: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Number {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default)]
        only_int: bool,
    },
    Bool,
    Date,
    #[serde(rename_all = "camelCase")]
    Json {
        #[serde(default)]
        max_size: Option<u64>,
    },
    #[serde(rename_all = "camelCase")]
    Select {
        max_select: u32,
        values: Vec<String>,
    },
}

impl FieldType {
    pub fn text() -> Self {
        Self::Text { min: None, max: None, pattern: None }
    }

    pub fn number() -> Self {
        Self::Number { min: None, max: None, only_int: false }
    }

    pub fn select(max_select: u32, values: &[&str]) -> Self {
        Self::Select {
            max_select,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}
