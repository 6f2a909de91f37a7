// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Path-addressed identifiers for configuration tree nodes.
//!
//! An [`Identifier`] is the ordered list of steps from the tree root down to
//! one node. A list step without a key is wildcarded: it addresses every
//! entry of that list under its parent. Identifiers are created per incoming
//! change and discarded after the change is applied.

use crate::schema::{NodeKind, NodeTypeId, Schema};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Key of a list entry.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Key(String);

impl Key {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// One step of an [`Identifier`]: a node type plus, for list steps, an
/// optional key.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PathStep {
    ty: NodeTypeId,
    name: Arc<str>,
    kind: NodeKind,
    key: Option<Key>,
}

impl PathStep {
    #[must_use]
    pub fn node_type(&self) -> NodeTypeId {
        self.ty
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// A list step with no key addresses all entries of the list.
    #[must_use]
    pub fn is_wildcarded(&self) -> bool {
        self.kind == NodeKind::List && self.key.is_none()
    }
}

/// Concrete path from the tree root to one node or subtree.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Identifier {
    steps: Vec<PathStep>,
}

impl Identifier {
    /// Identifier of `ty`, with every list step along the path wildcarded.
    ///
    /// The full path is derived from the schema since each node type has
    /// exactly one position in the tree.
    #[must_use]
    pub fn typed(schema: &Schema, ty: NodeTypeId) -> Self {
        let steps = schema
            .path(ty)
            .into_iter()
            .map(|ty| PathStep {
                ty,
                name: schema.name_arc(ty),
                kind: schema.kind(ty),
                key: None,
            })
            .collect();
        Self { steps }
    }

    /// Identifier of one concrete entry of list type `ty`.
    #[must_use]
    pub fn keyed(schema: &Schema, ty: NodeTypeId, key: impl Into<Key>) -> Self {
        Self::typed(schema, ty).with_target_key(key)
    }

    /// Set the key of the step of type `ty`, if the path goes through it.
    #[must_use]
    pub fn with_key(mut self, ty: NodeTypeId, key: impl Into<Key>) -> Self {
        if let Some(step) = self.steps.iter_mut().find(|step| step.ty == ty) {
            step.key = Some(key.into());
        }
        self
    }

    /// Replace the key of the final step, turning a wildcarded list
    /// identifier into a concrete one.
    #[must_use]
    pub fn with_target_key(mut self, key: impl Into<Key>) -> Self {
        if let Some(step) = self.steps.last_mut() {
            step.key = Some(key.into());
        }
        self
    }

    /// Append a wildcarded step for child type `ty`.
    #[must_use]
    pub fn child(&self, schema: &Schema, ty: NodeTypeId) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep {
            ty,
            name: schema.name_arc(ty),
            kind: schema.kind(ty),
            key: None,
        });
        Self { steps }
    }

    /// Append a keyed step for child list type `ty`.
    #[must_use]
    pub fn child_keyed(&self, schema: &Schema, ty: NodeTypeId, key: impl Into<Key>) -> Self {
        self.child(schema, ty).with_target_key(key)
    }

    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.steps.len() < 2 {
            return None;
        }
        Some(Self {
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// The final step: the node this identifier addresses.
    ///
    /// An identifier always has at least one step, so this cannot fail.
    #[must_use]
    pub fn target(&self) -> &PathStep {
        &self.steps[self.steps.len() - 1]
    }

    #[must_use]
    pub fn target_type(&self) -> NodeTypeId {
        self.target().ty
    }

    #[must_use]
    pub fn target_key(&self) -> Option<&Key> {
        self.target().key()
    }

    /// True if any list step along the path lacks a key.
    #[must_use]
    pub fn is_wildcarded(&self) -> bool {
        self.steps.iter().any(PathStep::is_wildcarded)
    }

    /// Key of the first step of type `ty` along the path, if any.
    ///
    /// Lets a customizer of a nested node recover the key of an enclosing
    /// list entry, e.g. the interface name from an address identifier.
    #[must_use]
    pub fn first_key_of(&self, ty: NodeTypeId) -> Option<&Key> {
        self.steps
            .iter()
            .find(|step| step.ty == ty)
            .and_then(PathStep::key)
    }

    /// True if `prefix` addresses this node or one of its ancestors.
    /// A wildcarded step in the prefix matches any key.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        prefix.steps.len() <= self.steps.len()
            && prefix.steps.iter().zip(&self.steps).all(|(want, have)| {
                want.ty == have.ty && (want.key.is_none() || want.key == have.key)
            })
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for step in &self.steps {
            write!(f, "/{}", step.name)?;
            match (step.kind, &step.key) {
                (NodeKind::List, Some(key)) => write!(f, "[{key}]")?,
                (NodeKind::List, None) => write!(f, "[*]")?,
                (NodeKind::Container, _) => {}
            }
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "bolero"))]
mod contract {
    use crate::identifier::Key;
    use bolero::{Driver, TypeGenerator};

    impl TypeGenerator for Key {
        fn generate<D: Driver>(driver: &mut D) -> Option<Self> {
            let n = driver.produce::<u16>()?;
            Some(Key::new(format!("k{n}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaBuilder;
    use pretty_assertions::assert_eq;

    fn sample() -> (Schema, NodeTypeId, NodeTypeId, NodeTypeId) {
        let mut builder = SchemaBuilder::new();
        let interfaces = builder.container("interfaces", None).unwrap();
        let interface = builder.list("interface", Some(interfaces)).unwrap();
        let address = builder.list("address", Some(interface)).unwrap();
        (builder.build(), interfaces, interface, address)
    }

    #[test]
    fn typed_identifier_is_wildcarded() {
        let (schema, _, interface, _) = sample();
        let id = Identifier::typed(&schema, interface);
        assert!(id.is_wildcarded());
        assert_eq!(id.to_string(), "/interfaces/interface[*]");
    }

    #[test]
    fn target_key_substitution() {
        let (schema, _, interface, _) = sample();
        let id = Identifier::typed(&schema, interface).with_target_key("eth0");
        assert!(!id.is_wildcarded());
        assert_eq!(id.target_key(), Some(&Key::from("eth0")));
        assert_eq!(id.to_string(), "/interfaces/interface[eth0]");
    }

    #[test]
    fn nested_keys_are_recoverable() {
        let (schema, _, interface, address) = sample();
        let id = Identifier::keyed(&schema, interface, "eth0").child_keyed(
            &schema,
            address,
            "192.168.2.1",
        );
        assert_eq!(id.first_key_of(interface), Some(&Key::from("eth0")));
        assert_eq!(id.target_key(), Some(&Key::from("192.168.2.1")));
        assert_eq!(
            id.to_string(),
            "/interfaces/interface[eth0]/address[192.168.2.1]"
        );
    }

    #[test]
    fn parent_walks_up_one_step() {
        let (schema, interfaces, interface, _) = sample();
        let id = Identifier::keyed(&schema, interface, "eth0");
        let parent = id.parent().unwrap();
        assert_eq!(parent, Identifier::typed(&schema, interfaces));
        assert!(parent.parent().is_none());
    }

    #[test]
    fn prefix_matching_tolerates_wildcards() {
        let (schema, _, interface, address) = sample();
        let concrete = Identifier::keyed(&schema, interface, "eth0").child_keyed(
            &schema,
            address,
            "10.0.0.1",
        );
        let wildcard = Identifier::typed(&schema, interface);
        let other = Identifier::keyed(&schema, interface, "eth1");
        assert!(concrete.starts_with(&wildcard));
        assert!(concrete.starts_with(&concrete));
        assert!(!concrete.starts_with(&other));
    }

    #[test]
    fn generated_keys_substitute_cleanly() {
        let (schema, _, interface, _) = sample();
        bolero::check!().with_type().for_each(|key: &Key| {
            let id = Identifier::typed(&schema, interface).with_target_key(key.clone());
            assert_eq!(id.target_key(), Some(key));
            assert!(!id.is_wildcarded());
        });
    }
}
