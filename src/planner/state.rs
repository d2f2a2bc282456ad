/// Set of true atoms packed into 64-bit words.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct State {
    words: Vec<u64>,
}

impl State {
    pub fn new(atom_count: usize) -> Self {
        Self { words: vec![0; (atom_count + 63) / 64] }
    }

    #[inline]
    pub fn contains(&self, atom: usize) -> bool {
        self.words[atom / 64] & (1 << (atom % 64)) != 0
    }

    #[inline]
    pub fn insert(&mut self, atom: usize) {
        self.words[atom / 64] |= 1 << (atom % 64);
    }

    #[inline]
    pub fn remove(&mut self, atom: usize) {
        self.words[atom / 64] &= !(1 << (atom % 64));
    }

    pub fn contains_all(&self, atoms: &[usize]) -> bool {
        atoms.iter().all(|a| self.contains(*a))
    }

    pub fn contains_none(&self, atoms: &[usize]) -> bool {
        !atoms.iter().any(|a| self.contains(*a))
    }

    /// Indices of the true atoms in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, word)| {
            let mut bits = *word;
            std::iter::from_fn(move || {
                if bits == 0 {
                    None
                } else {
                    let b = bits.trailing_zeros() as usize;
                    bits &= bits - 1;
                    Some(w * 64 + b)
                }
            })
        })
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::State;

    #[test]
    fn test_bits() {
        let mut s = State::new(130);
        s.insert(0);
        s.insert(64);
        s.insert(129);
        assert!(s.contains(64));
        assert!(!s.contains(63));
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![0, 64, 129]);
        s.remove(64);
        assert_eq!(s.len(), 2);
        assert!(s.contains_all(&[0, 129]));
        assert!(s.contains_none(&[1, 64]));
        let mut t = State::new(130);
        t.insert(129);
        t.insert(0);
        assert_eq!(s, t);
    }
}
