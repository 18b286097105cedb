use std::collections::BTreeSet;

/// Question numbers marked for review. Purely a visual aid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    numbers: BTreeSet<u32>,
}

impl FlagSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the number if absent, remove it if present. Returns whether it is now flagged.
    pub fn toggle(&mut self, question_number: u32) -> bool {
        if self.numbers.remove(&question_number) {
            false
        } else {
            self.numbers.insert(question_number);
            true
        }
    }

    #[must_use]
    pub fn is_flagged(&self, question_number: u32) -> bool {
        self.numbers.contains(&question_number)
    }

    /// Flagged numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.numbers.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn clear(&mut self) {
        self.numbers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_twice_restores_original_state() {
        let mut flags = FlagSet::new();
        flags.toggle(4);
        let before = flags.clone();

        assert!(flags.toggle(7));
        assert!(!flags.toggle(7));
        assert_eq!(flags, before);

        assert!(!flags.toggle(4));
        assert!(flags.toggle(4));
        assert_eq!(flags, before);
    }

    #[test]
    fn iterates_in_ascending_order() {
        let mut flags = FlagSet::new();
        for n in [9, 2, 5] {
            flags.toggle(n);
        }
        assert_eq!(flags.iter().collect::<Vec<_>>(), vec![2, 5, 9]);
    }
}
