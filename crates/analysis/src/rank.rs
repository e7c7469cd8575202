use std::collections::HashMap;

/// Stable descending sort: equal keys keep their first-encountered order.
pub(crate) fn sort_desc_by_key<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

/// First item with the strictly largest key. `Iterator::max_by_key` keeps the last.
pub(crate) fn first_max_by<T, K: PartialOrd>(
    items: impl IntoIterator<Item = T>,
    key: impl Fn(&T) -> K,
) -> Option<T> {
    let mut best: Option<(T, K)> = None;
    for item in items {
        let k = key(&item);
        let replace = match &best {
            Some((_, best_key)) => k > *best_key,
            None => true,
        };
        if replace {
            best = Some((item, k));
        }
    }
    best.map(|(item, _)| item)
}

/// First item with the strictly smallest key.
pub(crate) fn first_min_by<T, K: PartialOrd>(
    items: impl IntoIterator<Item = T>,
    key: impl Fn(&T) -> K,
) -> Option<T> {
    let mut best: Option<(T, K)> = None;
    for item in items {
        let k = key(&item);
        let replace = match &best {
            Some((_, best_key)) => k < *best_key,
            None => true,
        };
        if replace {
            best = Some((item, k));
        }
    }
    best.map(|(item, _)| item)
}

/// Login-keyed accumulator that remembers insertion order.
#[derive(Debug)]
pub(crate) struct Tally<V> {
    index: HashMap<String, usize>,
    entries: Vec<(String, V)>,
}

impl<V> Default for Tally<V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<V> Tally<V> {
    pub(crate) fn entry(&mut self, key: &str, init: impl FnOnce() -> V) -> &mut V {
        let position = match self.index.get(key) {
            Some(position) => *position,
            None => {
                self.entries.push((key.to_string(), init()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[position].1
    }

    pub(crate) fn into_entries(self) -> Vec<(String, V)> {
        self.entries
    }
}

pub(crate) fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

pub(crate) fn hours(duration: chrono::Duration) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}

pub(crate) fn minutes(duration: chrono::Duration) -> f64 {
    duration.num_milliseconds() as f64 / 60_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_favor_first_encountered() {
        let values = [3, 7, 7, 1, 1];
        assert_eq!(first_max_by(values.iter().enumerate(), |(_, v)| **v).map(|(i, _)| i), Some(1));
        assert_eq!(first_min_by(values.iter().enumerate(), |(_, v)| **v).map(|(i, _)| i), Some(3));
    }

    #[test]
    fn stable_descending_sort() {
        let mut items = vec![("a", 1), ("b", 2), ("c", 1), ("d", 2)];
        sort_desc_by_key(&mut items, |(_, n)| *n);
        assert_eq!(items, vec![("b", 2), ("d", 2), ("a", 1), ("c", 1)]);
    }

    #[test]
    fn tally_keeps_insertion_order() {
        let mut tally = Tally::default();
        *tally.entry("zed", || 0u64) += 1;
        *tally.entry("amy", || 0u64) += 2;
        *tally.entry("zed", || 0u64) += 1;
        assert_eq!(
            tally.into_entries(),
            vec![("zed".to_string(), 2), ("amy".to_string(), 2)]
        );
    }

    #[test]
    fn mean_of_nothing_is_zero() {
        assert_eq!(mean(10.0, 0), 0.0);
    }
}
