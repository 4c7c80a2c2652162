use crate::database::value::{Canonical, Value};
use std::collections::HashMap;

/// Grouped results keyed by distinct value, in first-seen order.
///
/// Keys that match loosely (see [`Value::matches`]) share a group.
#[derive(Clone, Debug, PartialEq)]
pub struct Groups<T> {
    entries: Vec<(Value, T)>,
    index: HashMap<Canonical<'static>, usize>,
}

impl<T> Default for Groups<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T> Groups<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Value) -> Option<&T> {
        self.index
            .get(&key.canonical().into_owned())
            .map(|&position| &self.entries[position].1)
    }

    /// Mutable slot for `key`, created with `init` when first seen.
    pub(crate) fn entry(&mut self, key: &Value, init: impl FnOnce() -> T) -> &mut T {
        let canonical = key.canonical().into_owned();
        let position = match self.index.get(&canonical) {
            Some(&position) => position,
            None => {
                self.entries.push((key.clone(), init()));
                self.index.insert(canonical, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[position].1
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> + '_ {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &T)> + '_ {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn map<U>(self, mut f: impl FnMut(T) -> Option<U>) -> Groups<U> {
        let mut groups = Groups::new();
        for (key, value) in self.entries {
            if let Some(value) = f(value) {
                groups.index.insert(key.canonical().into_owned(), groups.entries.len());
                groups.entries.push((key, value));
            }
        }
        groups
    }
}

impl<T> IntoIterator for Groups<T> {
    type Item = (Value, T);
    type IntoIter = std::vec::IntoIter<(Value, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_ignores_arrival_order() {
        let values = [Value::from("3"), Value::from("3.0"), Value::Number(3.0)];
        for rotation in 0..values.len() {
            let mut groups = Groups::new();
            for value in values.iter().cycle().skip(rotation).take(values.len()) {
                *groups.entry(value, || 0) += 1;
            }
            assert_eq!(groups.len(), 1);
            assert_eq!(groups.get(&Value::from("3")), Some(&3));
        }
    }

    #[test]
    fn first_seen_order_survives_map() {
        let mut groups = Groups::new();
        for key in ["Open", "Resolved", "Open", "Pending"] {
            *groups.entry(&Value::from(key), || 0) += 1;
        }
        let repeated = groups.map(|count: usize| (count > 1).then_some(count));
        assert_eq!(repeated.keys().cloned().collect::<Vec<_>>(), vec![Value::from("Open")]);
        assert_eq!(repeated.get(&Value::from("Open")), Some(&2));
        assert_eq!(repeated.get(&Value::from("Pending")), None);
    }
}
