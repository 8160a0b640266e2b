/// Keeps the best `(key, value)` pair seen so far.
///
/// A new pair replaces the current one only when its key is strictly
/// greater, so the first of several equal candidates is kept.
#[derive(Debug, Clone)]
pub struct LargestKeyValue<K, V> {
    entry: Option<(K, V)>,
}

impl<K, V> Default for LargestKeyValue<K, V> {
    fn default() -> Self {
        LargestKeyValue { entry: None }
    }
}

impl<K: Ord, V> LargestKeyValue<K, V> {
    pub fn new() -> Self {
        LargestKeyValue::default()
    }

    /// Offer a candidate; returns whether it was taken.
    pub fn use_if_larger(&mut self, key: K, value: V) -> bool {
        let larger = match &self.entry {
            Some((current, _)) => key > *current,
            None => true,
        };
        if larger {
            self.entry = Some((key, value));
        }
        larger
    }

    pub fn key(&self) -> Option<&K> {
        self.entry.as_ref().map(|(key, _)| key)
    }

    pub fn value(&self) -> Option<&V> {
        self.entry.as_ref().map(|(_, value)| value)
    }

    pub fn into_inner(self) -> Option<(K, V)> {
        self.entry
    }
}
