//! Capped candidate search
//!
//! Produces at most `cap` candidates lazily and stops at the first one whose
//! probe yields a match. Probes run one at a time, in candidate order.

use std::future::Future;

use futures::future;
use futures::stream::{self, StreamExt};

/// Result of a search, with how many candidates were probed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome<T> {
    pub found: Option<T>,
    pub probed: usize,
}

/// Bounded first-match search over candidates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CandidateSearch {
    cap: usize,
}

impl CandidateSearch {
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }

    /// Probe candidates in order until one returns `Some`.
    /// Candidates past the cap are never produced.
    pub async fn first_match<I, C, T, F, Fut>(&self, candidates: I, probe: F) -> SearchOutcome<T>
    where
        I: IntoIterator<Item = C>,
        F: FnMut(C) -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let mut probed = 0usize;
        let found = {
            let matches = stream::iter(candidates.into_iter().take(self.cap))
                .inspect(|_| probed += 1)
                .then(probe)
                .filter_map(future::ready);
            let mut matches = std::pin::pin!(matches);
            matches.next().await
        };

        SearchOutcome { found, probed }
    }
}
