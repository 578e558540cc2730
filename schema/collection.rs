use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::field::Field;

/// A named group of records with a shared field schema, analogous to a table.
///
/// This is the in-memory value that migrations transform. All mutations here
/// are pure: nothing is persisted until the value is handed back to the store
/// in a single explicit save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub system: bool,
    pub fields: Vec<Field>,
    #[serde(default)]
    pub indexes: Vec<String>,
    #[serde(default)]
    pub list_rule: Option<String>,
    #[serde(default)]
    pub view_rule: Option<String>,
    #[serde(default)]
    pub create_rule: Option<String>,
    #[serde(default)]
    pub update_rule: Option<String>,
    #[serde(default)]
    pub delete_rule: Option<String>,
}

/// The five per-collection access rules.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    List,
    View,
    Create,
    Update,
    Delete,
}

impl Collection {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            system: false,
            fields: Vec::new(),
            indexes: Vec::new(),
            list_rule: None,
            view_rule: None,
            create_rule: None,
            update_rule: None,
            delete_rule: None,
        }
    }

    /// Looks up a field by its stable id.
    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == field_id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Inserts `field` so that it becomes `fields[index]`, shifting the tail
    /// right. Field order is observable (rendering, export), so the index is
    /// exact, not a hint. This is deliberately not idempotent: inserting a
    /// field whose id or name is already taken is schema drift and fails.
    pub fn add_field_at(&mut self, index: usize, field: Field) -> Result<(), SchemaError> {
        if self.field(&field.id).is_some() {
            return Err(SchemaError::DuplicateFieldId { id: field.id });
        }
        if self.field_by_name(&field.name).is_some() {
            return Err(SchemaError::DuplicateFieldName { name: field.name });
        }
        if index > self.fields.len() {
            return Err(SchemaError::IndexOutOfRange { index, len: self.fields.len() });
        }
        self.fields.insert(index, field);
        Ok(())
    }

    /// Appends a field at the end of the schema.
    pub fn add_field(&mut self, field: Field) -> Result<(), SchemaError> {
        self.add_field_at(self.fields.len(), field)
    }

    /// Swaps out the field with the same id, keeping its position. The new
    /// name must not collide with any other field.
    pub fn replace_field(&mut self, field: Field) -> Result<(), SchemaError> {
        if let Some(clash) = self.field_by_name(&field.name) {
            if clash.id != field.id {
                return Err(SchemaError::DuplicateFieldName { name: field.name });
            }
        }
        match self.fields.iter_mut().find(|f| f.id == field.id) {
            Some(slot) => {
                *slot = field;
                Ok(())
            }
            None => Err(SchemaError::FieldNotFound { id: field.id }),
        }
    }

    /// Removes a field by id and returns it.
    pub fn remove_field(&mut self, field_id: &str) -> Result<Field, SchemaError> {
        match self.fields.iter().position(|f| f.id == field_id) {
            Some(pos) => Ok(self.fields.remove(pos)),
            None => Err(SchemaError::FieldNotFound { id: field_id.to_string() }),
        }
    }

    /// Moves an existing field so that it becomes `fields[index]`.
    pub fn move_field(&mut self, field_id: &str, index: usize) -> Result<(), SchemaError> {
        if index >= self.fields.len() {
            return Err(SchemaError::IndexOutOfRange { index, len: self.fields.len() });
        }
        let field = self.remove_field(field_id)?;
        self.fields.insert(index, field);
        Ok(())
    }

    /// Stores a rule expression verbatim. The expression syntax belongs to
    /// the access-control layer; this model never parses it.
    pub fn set_rule(&mut self, kind: RuleKind, expr: Option<String>) {
        match kind {
            RuleKind::List => self.list_rule = expr,
            RuleKind::View => self.view_rule = expr,
            RuleKind::Create => self.create_rule = expr,
            RuleKind::Update => self.update_rule = expr,
            RuleKind::Delete => self.delete_rule = expr,
        }
    }

    pub fn rule(&self, kind: RuleKind) -> Option<&str> {
        match kind {
            RuleKind::List => self.list_rule.as_deref(),
            RuleKind::View => self.view_rule.as_deref(),
            RuleKind::Create => self.create_rule.as_deref(),
            RuleKind::Update => self.update_rule.as_deref(),
            RuleKind::Delete => self.delete_rule.as_deref(),
        }
    }
}
