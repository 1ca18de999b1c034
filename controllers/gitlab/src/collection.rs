//! Keyed diff of a desired sub-collection against what GitLab reports.
//!
//! Used for collections GitLab manages item by item (pipeline schedule
//! variables). Operations are applied create, then update, then delete.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Changes needed to turn `observed` into `desired`
#[derive(Debug)]
pub struct CollectionDiff<'a, D, O> {
    /// Desired items with no observed counterpart
    pub create: Vec<&'a D>,
    /// Desired items whose observed counterpart differs
    pub update: Vec<&'a D>,
    /// Observed items with no desired counterpart
    pub delete: Vec<&'a O>,
}

impl<D, O> CollectionDiff<'_, D, O> {
    /// True when both sides already agree
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty() && self.delete.is_empty()
    }
}

/// Compare two collections by key
///
/// Desired order is preserved in `create` and `update`; `delete` follows
/// observed order. A key repeated on the desired side is only acted on once.
pub fn diff<'a, D, O, K>(
    desired: &'a [D],
    observed: &'a [O],
    desired_key: impl Fn(&D) -> K,
    observed_key: impl Fn(&O) -> K,
    same: impl Fn(&D, &O) -> bool,
) -> CollectionDiff<'a, D, O>
where
    K: Eq + Hash,
{
    let by_key: HashMap<K, &O> = observed.iter().map(|o| (observed_key(o), o)).collect();
    let mut seen = HashSet::new();
    let mut result = CollectionDiff {
        create: Vec::new(),
        update: Vec::new(),
        delete: Vec::new(),
    };

    for item in desired {
        let key = desired_key(item);
        match by_key.get(&key) {
            None => result.create.push(item),
            Some(current) if !same(item, current) => result.update.push(item),
            Some(_) => {}
        }
        seen.insert(key);
    }
    result.delete = observed
        .iter()
        .filter(|o| !seen.contains(&observed_key(o)))
        .collect();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item(&'static str, &'static str);

    fn run<'a>(desired: &'a [Item], observed: &'a [Item]) -> CollectionDiff<'a, Item, Item> {
        diff(desired, observed, |d| d.0, |o| o.0, |d, o| d.1 == o.1)
    }

    #[test]
    fn equal_collections_need_nothing() {
        let desired = [Item("a", "1"), Item("b", "2")];
        let observed = [Item("b", "2"), Item("a", "1")];
        assert!(run(&desired, &observed).is_empty());
    }

    #[test]
    fn splits_into_create_update_delete() {
        let desired = [Item("a", "1"), Item("b", "changed"), Item("c", "3")];
        let observed = [Item("b", "2"), Item("d", "4"), Item("a", "1")];
        let result = run(&desired, &observed);
        assert_eq!(result.create, vec![&Item("c", "3")]);
        assert_eq!(result.update, vec![&Item("b", "changed")]);
        assert_eq!(result.delete, vec![&Item("d", "4")]);
    }

    #[test]
    fn empty_desired_deletes_everything() {
        let observed = [Item("a", "1")];
        let result = run(&[], &observed);
        assert_eq!(result.delete.len(), 1);
        assert!(result.create.is_empty());
    }
}
