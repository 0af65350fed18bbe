//! Kind-Specific Query Facades
//!
//! Every facade is a [`MemberQuery`] parameterised by a [`QueryKind`] that
//! projects walked members into its item type and a search-options view.
//!
//! ## Operations
//!
//! | Operation                 | Dedup | Zero matches     | Several matches  |
//! |---------------------------|-------|------------------|------------------|
//! | `all`                     | no    | empty            | all of them      |
//! | `all_where(p)`            | yes   | empty            | all of them      |
//! | `single` / `single_where` | *     | `Cardinality`    | `Cardinality`    |
//! | `single_or_none*`         | *     | `None`           | `Cardinality`    |
//! | `all_named*`              | yes   | empty            | all of them      |
//! | `named*`                  | yes   | `Cardinality`    | `Cardinality`    |
//! | `named_or_none*`          | yes   | `None`           | `Cardinality`    |
//!
//! `*` follows the list operation it counts: `single` counts `all`,
//! `single_where(p)` counts `all_where(p)`.
//!
//! Deduplication runs before the predicate, so a hidden base member never
//! resurfaces when the hiding declaration fails the filter.
//!
//! Names must not be blank. Matching is ordinal; event and
//! property-or-field queries accept [`NameComparison::OrdinalIgnoreCase`].

mod events;
mod fields;
mod members;
mod methods;
mod properties;
mod property_or_field;

use std::marker::PhantomData;

use rustc_hash::FxHashSet;
use typescope_runtime::TypeHandle;

use crate::descriptor::{MemberDescriptor, MemberSignature};
use crate::error::{require_name, ReflectError, ReflectResult};
use crate::hierarchy;
use crate::naming;

pub use events::{EventKind, EventOptions};
pub use fields::{FieldKind, FieldOptions};
pub use members::{AnyMemberKind, MemberOptions};
pub use methods::{ConstructorKind, ConstructorOptions, MethodKind, MethodOptions, SignatureOptions};
pub use properties::{PropertyKind, PropertyOptions};
pub use property_or_field::{PropertyOrFieldKind, PropertyOrFieldOptions};

/// How member names are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameComparison {
    /// Exact, case-sensitive
    #[default]
    Ordinal,
    /// Case-insensitive
    OrdinalIgnoreCase,
}

impl NameComparison {
    /// Whether `candidate` matches `name` under this comparison
    pub fn matches(self, candidate: &str, name: &str) -> bool {
        match self {
            NameComparison::Ordinal => candidate == name,
            NameComparison::OrdinalIgnoreCase => candidate
                .chars()
                .flat_map(char::to_uppercase)
                .eq(name.chars().flat_map(char::to_uppercase)),
        }
    }
}

/// Projection of walked members into one facade's items
pub trait QueryKind {
    /// Item returned by the facade
    type Item: Clone;
    /// Search-options view handed to predicates
    type Options;
    /// Kind name used in cardinality errors
    const NAME: &'static str;

    /// Project a walked member, `None` when it is not of this kind
    fn project(member: &MemberDescriptor) -> Option<Self::Item>;

    /// Build the search-options view of an item
    fn options(item: &Self::Item) -> Self::Options;

    /// Item name
    fn name(item: &Self::Item) -> &str;

    /// Deduplication key
    fn signature(item: &Self::Item) -> MemberSignature;
}

/// Marker for kinds whose names may be compared case-insensitively
pub trait CaseInsensitiveNames: QueryKind {}

/// Member query over one type and its ancestors
pub struct MemberQuery<'t, K: QueryKind> {
    ty: &'t TypeHandle,
    comparison: NameComparison,
    _kind: PhantomData<K>,
}

impl<K: QueryKind> Clone for MemberQuery<'_, K> {
    fn clone(&self) -> Self {
        Self {
            ty: self.ty,
            comparison: self.comparison,
            _kind: PhantomData,
        }
    }
}

impl<'t, K: QueryKind> MemberQuery<'t, K> {
    /// Query members of `ty`
    pub fn new(ty: &'t TypeHandle) -> Self {
        Self {
            ty,
            comparison: NameComparison::Ordinal,
            _kind: PhantomData,
        }
    }

    /// Queried type
    pub fn target(&self) -> &'t TypeHandle {
        self.ty
    }

    fn collect(&self) -> Vec<K::Item> {
        hierarchy::walk(self.ty).iter().filter_map(K::project).collect()
    }

    fn filtered<P>(&self, predicate: P) -> Vec<K::Item>
    where
        P: Fn(&K::Item) -> bool,
    {
        let mut seen: FxHashSet<MemberSignature> = FxHashSet::default();
        self.collect()
            .into_iter()
            .filter(|item| seen.insert(K::signature(item)))
            .filter(|item| predicate(item))
            .collect()
    }

    fn exactly_one(&self, items: Vec<K::Item>, target: String) -> ReflectResult<K::Item> {
        match self.at_most_one(items, target.clone())? {
            Some(item) => Ok(item),
            None => Err(self.cardinality(target, 0)),
        }
    }

    fn at_most_one(&self, mut items: Vec<K::Item>, target: String) -> ReflectResult<Option<K::Item>> {
        match items.len() {
            0 => Ok(None),
            1 => Ok(items.pop()),
            found => Err(self.cardinality(target, found)),
        }
    }

    fn cardinality(&self, target: String, found: usize) -> ReflectError {
        tracing::debug!(kind = K::NAME, %target, found, "member query cardinality failure");
        ReflectError::Cardinality {
            kind: K::NAME,
            target,
            found,
        }
    }

    fn target_any(&self) -> String {
        format!("on '{}'", naming::type_name(self.ty))
    }

    fn target_where(&self) -> String {
        format!("matching the predicate on '{}'", naming::type_name(self.ty))
    }

    fn target_named(&self, name: &str) -> String {
        format!("named '{}' on '{}'", name, naming::type_name(self.ty))
    }

    // ------------------------------------------------------------------------
    // Unnamed
    // ------------------------------------------------------------------------

    /// Every member of this kind, shadowed declarations included
    pub fn all(&self) -> Vec<K::Item> {
        self.collect()
    }

    /// Members matching `predicate`, most-derived declaration per signature
    pub fn all_where<P>(&self, predicate: P) -> Vec<K::Item>
    where
        P: Fn(&K::Options) -> bool,
    {
        self.filtered(|item| predicate(&K::options(item)))
    }

    /// The only member of this kind
    pub fn single(&self) -> ReflectResult<K::Item> {
        self.exactly_one(self.all(), self.target_any())
    }

    /// The only member matching `predicate`
    pub fn single_where<P>(&self, predicate: P) -> ReflectResult<K::Item>
    where
        P: Fn(&K::Options) -> bool,
    {
        self.exactly_one(self.all_where(predicate), self.target_where())
    }

    /// The only member of this kind, `None` when there is none
    pub fn single_or_none(&self) -> ReflectResult<Option<K::Item>> {
        self.at_most_one(self.all(), self.target_any())
    }

    /// The only member matching `predicate`, `None` when there is none
    pub fn single_or_none_where<P>(&self, predicate: P) -> ReflectResult<Option<K::Item>>
    where
        P: Fn(&K::Options) -> bool,
    {
        self.at_most_one(self.all_where(predicate), self.target_where())
    }

    // ------------------------------------------------------------------------
    // Named
    // ------------------------------------------------------------------------

    /// Members called `name`
    pub fn all_named(&self, name: &str) -> ReflectResult<Vec<K::Item>> {
        self.all_named_where(name, |_| true)
    }

    /// Members called `name` that match `predicate`
    pub fn all_named_where<P>(&self, name: &str, predicate: P) -> ReflectResult<Vec<K::Item>>
    where
        P: Fn(&K::Options) -> bool,
    {
        require_name("name", name)?;
        let comparison = self.comparison;
        Ok(self.filtered(|item| {
            comparison.matches(K::name(item), name) && predicate(&K::options(item))
        }))
    }

    /// The only member called `name`
    pub fn named(&self, name: &str) -> ReflectResult<K::Item> {
        self.named_where(name, |_| true)
    }

    /// The only member called `name` that matches `predicate`
    pub fn named_where<P>(&self, name: &str, predicate: P) -> ReflectResult<K::Item>
    where
        P: Fn(&K::Options) -> bool,
    {
        let items = self.all_named_where(name, predicate)?;
        self.exactly_one(items, self.target_named(name))
    }

    /// The only member called `name`, `None` when there is none
    pub fn named_or_none(&self, name: &str) -> ReflectResult<Option<K::Item>> {
        self.named_or_none_where(name, |_| true)
    }

    /// The only member called `name` matching `predicate`, `None` when there is none
    pub fn named_or_none_where<P>(&self, name: &str, predicate: P) -> ReflectResult<Option<K::Item>>
    where
        P: Fn(&K::Options) -> bool,
    {
        let items = self.all_named_where(name, predicate)?;
        self.at_most_one(items, self.target_named(name))
    }
}

impl<K: CaseInsensitiveNames> MemberQuery<'_, K> {
    /// Compare names with `comparison` in the named operations
    pub fn with_name_comparison(mut self, comparison: NameComparison) -> Self {
        self.comparison = comparison;
        self
    }
}

/// Query facades on [`TypeHandle`]
pub trait MemberQueries {
    /// Fields
    fn fields(&self) -> MemberQuery<'_, FieldKind>;
    /// Properties and indexers
    fn properties(&self) -> MemberQuery<'_, PropertyKind>;
    /// Methods, accessors included
    fn methods(&self) -> MemberQuery<'_, MethodKind>;
    /// Constructors declared on the type itself
    fn constructors(&self) -> MemberQuery<'_, ConstructorKind>;
    /// Events
    fn events(&self) -> MemberQuery<'_, EventKind>;
    /// Fields and properties as unified views
    fn properties_or_fields(&self) -> MemberQuery<'_, PropertyOrFieldKind>;
    /// Members of every kind
    fn members(&self) -> MemberQuery<'_, AnyMemberKind>;
}

impl MemberQueries for TypeHandle {
    fn fields(&self) -> MemberQuery<'_, FieldKind> {
        MemberQuery::new(self)
    }

    fn properties(&self) -> MemberQuery<'_, PropertyKind> {
        MemberQuery::new(self)
    }

    fn methods(&self) -> MemberQuery<'_, MethodKind> {
        MemberQuery::new(self)
    }

    fn constructors(&self) -> MemberQuery<'_, ConstructorKind> {
        MemberQuery::new(self)
    }

    fn events(&self) -> MemberQuery<'_, EventKind> {
        MemberQuery::new(self)
    }

    fn properties_or_fields(&self) -> MemberQuery<'_, PropertyOrFieldKind> {
        MemberQuery::new(self)
    }

    fn members(&self) -> MemberQuery<'_, AnyMemberKind> {
        MemberQuery::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_comparison() {
        assert!(NameComparison::Ordinal.matches("Name", "Name"));
        assert!(!NameComparison::Ordinal.matches("name", "Name"));
        assert!(NameComparison::OrdinalIgnoreCase.matches("name", "NAME"));
        assert!(!NameComparison::OrdinalIgnoreCase.matches("names", "NAME"));
        assert!(NameComparison::OrdinalIgnoreCase.matches("énergie", "ÉNERGIE"));
        assert!(NameComparison::OrdinalIgnoreCase.matches("straße", "STRASSE"));
        assert!(!NameComparison::OrdinalIgnoreCase.matches("Name", "Nam"));
    }
}
