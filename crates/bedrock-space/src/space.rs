//! Configuration space under construction
//!
//! [`ConfigurationSpace`] collects parameter declarations and their
//! conditions. `freeze()` validates the conditional graph and produces a
//! [`FrozenSpace`]; once frozen, the space rejects further mutation.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::condition::Condition;
use crate::error::{ConstructionError, SpaceError, UsageError, ValidationError};
use crate::frozen::FrozenSpace;
use crate::path::ParamPath;
use crate::range::ParameterRange;

/// Mutable set of parameter declarations and conditions
///
/// Usage:
/// ```rust
/// use bedrock_space::{Condition, ConfigurationSpace, ParamPath, ParameterRange};
///
/// let mut space = ConfigurationSpace::new();
/// let count = ParamPath::key("count");
/// let size = ParamPath::key("size");
/// space.add(ParameterRange::integer(count.clone(), (0, 2))).unwrap();
/// space.add(ParameterRange::integer(size.clone(), (1, 64))).unwrap();
/// space.add_condition(Condition::greater(size, count, 0)).unwrap();
/// let frozen = space.freeze().unwrap();
/// assert_eq!(frozen.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigurationSpace {
    parameters: IndexMap<ParamPath, ParameterRange>,
    conditions: Vec<Condition>,
    frozen: bool,
}

impl ConfigurationSpace {
    /// Create empty space
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter
    ///
    /// # Errors
    /// - [`UsageError::AlreadyFrozen`] after `freeze()`
    /// - [`ConstructionError`] for invalid declarations or duplicate paths
    pub fn add(&mut self, parameter: ParameterRange) -> Result<(), SpaceError> {
        self.ensure_mutable("add parameter")?;
        parameter.validate()?;

        if self.parameters.contains_key(parameter.path()) {
            return Err(ConstructionError::DuplicateParameter(parameter.path().clone()).into());
        }

        tracing::trace!(parameter = %parameter, "declared parameter");
        self.parameters.insert(parameter.path().clone(), parameter);
        Ok(())
    }

    /// Declare several parameters, stopping at the first error
    ///
    /// # Errors
    /// Same as [`add`](Self::add)
    pub fn add_all(
        &mut self,
        parameters: impl IntoIterator<Item = ParameterRange>,
    ) -> Result<(), SpaceError> {
        parameters.into_iter().try_for_each(|p| self.add(p))
    }

    /// Attach a condition
    ///
    /// References are resolved at freeze time, so conditions may be added
    /// before the parameters they name.
    ///
    /// # Errors
    /// [`UsageError::AlreadyFrozen`] after `freeze()`
    pub fn add_condition(&mut self, condition: Condition) -> Result<(), SpaceError> {
        self.ensure_mutable("add condition")?;
        if !self.conditions.contains(&condition) {
            self.conditions.push(condition);
        }
        Ok(())
    }

    /// Move every declaration of `other` into this space
    ///
    /// # Errors
    /// Same as [`add`](Self::add)
    pub fn merge(&mut self, other: ConfigurationSpace) -> Result<(), SpaceError> {
        let (parameters, conditions) = other.into_parts();
        self.add_all(parameters)?;
        conditions
            .into_iter()
            .try_for_each(|c| self.add_condition(c))
    }

    /// Split into declarations and conditions
    #[must_use]
    pub fn into_parts(self) -> (Vec<ParameterRange>, Vec<Condition>) {
        (self.parameters.into_values().collect(), self.conditions)
    }

    /// Check if a parameter is declared
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &ParamPath) -> bool {
        self.parameters.contains_key(path)
    }

    /// Get a declared parameter
    #[inline]
    #[must_use]
    pub fn get(&self, path: &ParamPath) -> Option<&ParameterRange> {
        self.parameters.get(path)
    }

    /// Number of declared parameters
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Check if nothing is declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Check if `freeze()` has succeeded
    #[inline]
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Declared parameters in declaration order
    #[inline]
    pub fn parameters(&self) -> impl Iterator<Item = &ParameterRange> {
        self.parameters.values()
    }

    /// Declared conditions
    #[inline]
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Validate the conditional graph and produce an immutable snapshot
    ///
    /// Performs:
    /// 1. Reference checks (guarded and governing parameters exist)
    /// 2. Reachability of every condition over its parent's domain
    /// 3. Cycle detection, producing a parents-first parameter order
    ///
    /// On success the space becomes read-only. Calling `freeze()` again
    /// yields an equal snapshot.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found; the space stays mutable.
    pub fn freeze(&mut self) -> Result<FrozenSpace, ValidationError> {
        self.validate_conditions()?;
        let order = self.dependency_order()?;

        let parameters: Vec<ParameterRange> = order
            .iter()
            .map(|&i| self.parameters[i].clone())
            .collect();
        let frozen = FrozenSpace::new(parameters, &self.conditions)?;

        self.frozen = true;
        tracing::debug!(
            parameters = frozen.len(),
            conditions = self.conditions.len(),
            "froze configuration space"
        );
        Ok(frozen)
    }

    fn ensure_mutable(&self, operation: &'static str) -> Result<(), UsageError> {
        if self.frozen {
            Err(UsageError::AlreadyFrozen { operation })
        } else {
            Ok(())
        }
    }

    fn validate_conditions(&self) -> Result<(), ValidationError> {
        for condition in &self.conditions {
            if !self.parameters.contains_key(condition.child()) {
                return Err(ValidationError::UnknownParameter(condition.child().clone()));
            }
            let Some(parent) = self.parameters.get(condition.parent()) else {
                return Err(ValidationError::UnknownParent {
                    child: condition.child().clone(),
                    parent: condition.parent().clone(),
                });
            };
            if condition.child() == condition.parent() {
                return Err(ValidationError::CyclicCondition(condition.child().clone()));
            }
            condition.check_reachable(parent.domain())?;
        }
        Ok(())
    }

    /// Depth-first ordering placing every parent before its children
    ///
    /// Ties keep declaration order, so identical declarations freeze to
    /// identical snapshots.
    fn dependency_order(&self) -> Result<Vec<usize>, ValidationError> {
        let mut parents: HashMap<usize, Vec<usize>> = HashMap::new();
        for condition in &self.conditions {
            if let (Some(child), Some(parent)) = (
                self.parameters.get_index_of(condition.child()),
                self.parameters.get_index_of(condition.parent()),
            ) {
                parents.entry(child).or_default().push(parent);
            }
        }

        fn visit(
            node: usize,
            parents: &HashMap<usize, Vec<usize>>,
            visiting: &mut HashSet<usize>,
            visited: &mut HashSet<usize>,
            order: &mut Vec<usize>,
        ) -> Result<(), usize> {
            if visited.contains(&node) {
                return Ok(());
            }
            if !visiting.insert(node) {
                return Err(node);
            }
            if let Some(ps) = parents.get(&node) {
                for &parent in ps {
                    visit(parent, parents, visiting, visited, order)?;
                }
            }
            visiting.remove(&node);
            visited.insert(node);
            order.push(node);
            Ok(())
        }

        let mut visiting = HashSet::new();
        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(self.parameters.len());
        for node in 0..self.parameters.len() {
            visit(node, &parents, &mut visiting, &mut visited, &mut order).map_err(|i| {
                let path = self
                    .parameters
                    .get_index(i)
                    .map(|(p, _)| p.clone())
                    .unwrap_or_default();
                ValidationError::CyclicCondition(path)
            })?;
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn key(name: &str) -> ParamPath {
        ParamPath::key(name)
    }

    fn counted_space() -> ConfigurationSpace {
        let mut space = ConfigurationSpace::new();
        space
            .add(ParameterRange::integer(key("count"), (0, 2)))
            .unwrap();
        space
            .add(ParameterRange::categorical(key("kind"), ["a", "b"]))
            .unwrap();
        space
            .add_condition(Condition::greater(key("kind"), key("count"), 0))
            .unwrap();
        space
    }

    #[test]
    fn add_rejects_duplicate() {
        let mut space = counted_space();
        let result = space.add(ParameterRange::integer(key("count"), (1, 1)));
        assert!(matches!(
            result,
            Err(SpaceError::Construction(ConstructionError::DuplicateParameter(_)))
        ));
    }

    #[test]
    fn add_rejects_inverted_range() {
        let mut space = ConfigurationSpace::new();
        let result = space.add(ParameterRange::integer(key("n"), (3, 1)));
        assert!(matches!(
            result,
            Err(SpaceError::Construction(ConstructionError::InvalidRange { .. }))
        ));
    }

    #[test]
    fn freeze_orders_parents_first() {
        let mut space = ConfigurationSpace::new();
        // Child declared before its parent
        space
            .add(ParameterRange::integer(key("size"), (1, 8)))
            .unwrap();
        space
            .add(ParameterRange::integer(key("count"), (0, 2)))
            .unwrap();
        space
            .add_condition(Condition::greater(key("size"), key("count"), 0))
            .unwrap();

        let frozen = space.freeze().unwrap();
        let order: Vec<String> = frozen.parameters().map(|p| p.path().to_string()).collect();
        assert_eq!(order, vec!["count", "size"]);
    }

    #[test]
    fn freeze_rejects_unknown_parent() {
        let mut space = counted_space();
        space
            .add_condition(Condition::equals(key("kind"), key("missing"), "x"))
            .unwrap();
        assert!(matches!(
            space.freeze(),
            Err(ValidationError::UnknownParent { .. })
        ));
        assert!(!space.is_frozen());
    }

    #[test]
    fn freeze_rejects_unknown_child() {
        let mut space = counted_space();
        space
            .add_condition(Condition::greater(key("ghost"), key("count"), 0))
            .unwrap();
        assert!(matches!(
            space.freeze(),
            Err(ValidationError::UnknownParameter(_))
        ));
    }

    #[test]
    fn freeze_rejects_condition_outside_range() {
        let mut space = counted_space();
        space
            .add(ParameterRange::integer(key("third"), (1, 4)))
            .unwrap();
        space
            .add_condition(Condition::greater(key("third"), key("count"), 2))
            .unwrap();
        assert!(matches!(
            space.freeze(),
            Err(ValidationError::Unreachable { .. })
        ));
    }

    #[test]
    fn freeze_rejects_cycle() {
        let mut space = ConfigurationSpace::new();
        space.add(ParameterRange::integer(key("a"), (0, 2))).unwrap();
        space.add(ParameterRange::integer(key("b"), (0, 2))).unwrap();
        space
            .add_condition(Condition::greater(key("a"), key("b"), 0))
            .unwrap();
        space
            .add_condition(Condition::greater(key("b"), key("a"), 0))
            .unwrap();
        assert!(matches!(
            space.freeze(),
            Err(ValidationError::CyclicCondition(_))
        ));
    }

    #[test]
    fn frozen_space_rejects_mutation() {
        let mut space = counted_space();
        space.freeze().unwrap();
        assert!(space.is_frozen());

        let add = space.add(ParameterRange::constant(key("late"), 1));
        assert!(matches!(add, Err(ref e) if e.is_usage()));

        let cond = space.add_condition(Condition::equals(key("kind"), key("count"), Value::Int(1)));
        assert!(matches!(
            cond,
            Err(SpaceError::Usage(UsageError::AlreadyFrozen { .. }))
        ));
        assert_eq!(space.len(), 2);
    }

    #[test]
    fn freeze_twice_yields_equal_snapshots() {
        let mut space = counted_space();
        let first = space.freeze().unwrap();
        let second = space.freeze().unwrap();
        assert_eq!(first.to_string(), second.to_string());
    }

    #[test]
    fn merge_moves_declarations() {
        let mut space = ConfigurationSpace::new();
        space.merge(counted_space()).unwrap();
        assert_eq!(space.len(), 2);
        assert_eq!(space.conditions().len(), 1);
    }
}
