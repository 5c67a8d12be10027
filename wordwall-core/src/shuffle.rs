use rand::Rng;

use crate::{PatcherError, Result};

/// Returns `items` reordered by a random sort key drawn per element.
pub fn shuffle_by_key<T, R: Rng + ?Sized>(items: Vec<T>, rng: &mut R) -> Vec<T> {
    let mut keyed: Vec<(f64, T)> = items.into_iter().map(|item| (rng.gen::<f64>(), item)).collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, item)| item).collect()
}

/// Shuffled copy of the processed set, handed out one source per patched
/// record. The n-th target in processed order receives the n-th source.
#[derive(Debug, Clone)]
pub struct ShufflePairing<H> {
    sources: Vec<H>,
    cursor: usize,
}

impl<H: Clone> ShufflePairing<H> {
    pub fn new<R: Rng + ?Sized>(processed: &[H], rng: &mut R) -> Self {
        Self {
            sources: shuffle_by_key(processed.to_vec(), rng),
            cursor: 0,
        }
    }

    pub fn sources(&self) -> &[H] {
        &self.sources
    }

    pub fn remaining(&self) -> usize {
        self.sources.len() - self.cursor
    }

    /// The next source record. Each source is handed out exactly once.
    pub fn next_source(&mut self) -> Result<H> {
        let source = self
            .sources
            .get(self.cursor)
            .cloned()
            .ok_or(PatcherError::PairingExhausted(self.cursor))?;
        self.cursor += 1;
        Ok(source)
    }
}
