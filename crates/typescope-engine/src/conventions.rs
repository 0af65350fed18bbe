//! Backing-Field Conventions
//!
//! A field backs a property when either
//! - the runtime marked it as auto-property storage, or
//! - its name equals `prefix + property + suffix` (case-insensitive) for one of
//!   the configured conventions and it shares the property's declaring type.
//!
//! The convention list is a plain value. [`BackingFieldConventions::default`]
//! holds the single convention `("_", "")`.

use serde::{Deserialize, Serialize};

use crate::descriptor::{FieldDescriptor, PropertyDescriptor};
use crate::error::{ReflectError, ReflectResult};
use crate::query::{MemberQueries, NameComparison};

/// Prefix and suffix wrapped around a property name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackingFieldConvention {
    /// Text before the property name
    #[serde(default)]
    pub prefix: String,
    /// Text after the property name
    #[serde(default)]
    pub suffix: String,
}

impl BackingFieldConvention {
    /// Create a convention
    pub fn new(prefix: &str, suffix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }

    /// Field name this convention expects for `property`
    pub fn field_name(&self, property: &str) -> String {
        format!("{}{}{}", self.prefix, property, self.suffix)
    }

    /// Whether `field` is the backing field of `property` under this convention
    pub fn matches(&self, field: &str, property: &str) -> bool {
        NameComparison::OrdinalIgnoreCase.matches(field, &self.field_name(property))
    }
}

/// Ordered list of backing-field conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackingFieldConventions(Vec<BackingFieldConvention>);

impl Default for BackingFieldConventions {
    fn default() -> Self {
        Self(vec![BackingFieldConvention::new("_", "")])
    }
}

impl BackingFieldConventions {
    /// A list with no conventions; only auto-property storage matches
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Append a convention
    pub fn add(&mut self, prefix: &str, suffix: &str) -> &mut Self {
        self.0.push(BackingFieldConvention::new(prefix, suffix));
        self
    }

    /// Replace every convention
    pub fn set<I>(&mut self, conventions: I) -> &mut Self
    where
        I: IntoIterator<Item = BackingFieldConvention>,
    {
        self.0 = conventions.into_iter().collect();
        self
    }

    /// Conventions in order
    pub fn iter(&self) -> impl Iterator<Item = &BackingFieldConvention> + '_ {
        self.0.iter()
    }

    /// Number of conventions
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No conventions configured
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any convention maps `property` to `field`
    pub fn matches(&self, field: &str, property: &str) -> bool {
        self.0.iter().any(|c| c.matches(field, property))
    }

    /// Reject conventions that would match a field named like its property
    pub fn validate(&self) -> ReflectResult<()> {
        if let Some(index) = self
            .0
            .iter()
            .position(|c| c.prefix.is_empty() && c.suffix.is_empty())
        {
            return Err(ReflectError::InvalidArgument(format!(
                "backing-field convention {} has neither prefix nor suffix",
                index
            )));
        }
        Ok(())
    }
}

/// Locates backing fields with a fixed convention list
#[derive(Debug, Clone, Default)]
pub struct BackingFieldResolver {
    conventions: BackingFieldConventions,
}

impl BackingFieldResolver {
    /// Resolver over `conventions`
    pub fn new(conventions: BackingFieldConventions) -> Self {
        Self { conventions }
    }

    /// Configured conventions
    pub fn conventions(&self) -> &BackingFieldConventions {
        &self.conventions
    }

    /// Configured conventions, for `add` and `set`
    pub fn conventions_mut(&mut self) -> &mut BackingFieldConventions {
        &mut self.conventions
    }

    fn backs(&self, field: &FieldDescriptor, property: &PropertyDescriptor) -> bool {
        field.declaring_type().id() == property.declaring_type().id()
            && self.conventions.matches(field.name(), property.name())
    }

    /// Whether `field` stores the value of some property
    pub fn is_backing_field(&self, field: &FieldDescriptor) -> bool {
        if field.is_auto_property_storage() {
            return true;
        }
        if self.conventions.is_empty() {
            return false;
        }
        field
            .declaring_type()
            .declared_properties()
            .any(|property| self.conventions.matches(field.name(), &property.name))
    }

    /// Storage field of `property`, auto-property storage first
    pub fn backing_field_of(&self, property: &PropertyDescriptor) -> Option<FieldDescriptor> {
        let storage = typescope_runtime::backing_field_name(property.name());
        let fields = property.declaring_type().fields().all();
        fields
            .iter()
            .find(|f| {
                f.is_auto_property_storage()
                    && f.name() == storage
                    && f.declaring_type().id() == property.declaring_type().id()
            })
            .or_else(|| fields.iter().find(|f| self.backs(f, property)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_convention() {
        let conventions = BackingFieldConventions::default();
        assert_eq!(conventions.len(), 1);
        assert!(conventions.matches("_name", "Name"));
        assert!(conventions.matches("_NAME", "name"));
        assert!(!conventions.matches("name", "Name"));
        assert!(!conventions.matches("m_name", "Name"));
    }

    #[test]
    fn test_add_and_set() {
        let mut conventions = BackingFieldConventions::default();
        conventions.add("m_", "");
        assert!(conventions.matches("m_name", "Name"));
        assert!(conventions.matches("_name", "Name"));

        conventions.set(vec![BackingFieldConvention::new("", "Field")]);
        assert!(conventions.matches("nameField", "Name"));
        assert!(!conventions.matches("_name", "Name"));
    }

    #[test]
    fn test_validate_rejects_bare_convention() {
        let mut conventions = BackingFieldConventions::empty();
        assert!(conventions.validate().is_ok());
        conventions.add("", "");
        assert!(matches!(
            conventions.validate(),
            Err(ReflectError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_serde_is_a_plain_list() {
        let conventions: BackingFieldConventions =
            serde_json::from_str(r#"[{"prefix": "m_"}, {"prefix": "", "suffix": "_"}]"#).unwrap();
        assert_eq!(conventions.len(), 2);
        assert!(conventions.matches("m_count", "Count"));
        assert!(conventions.matches("count_", "Count"));
    }
}
