//! Alignment of the truth stream with the reconstructed stream.

use trackeff_core::{AlignmentError, EventIdentity, TruthSource};

/// Finds the truth entry matching a reconstructed event's identity.
///
/// The two streams are filtered independently upstream, so positions do
/// not correspond, but relative order is usually preserved. The aligner
/// keeps a cursor across calls: it first re-checks the entry under the
/// cursor, then advances (wrapping past the end) until the identity
/// matches. A search inspects at most `len()` entries, so a full
/// wraparound without a match fails instead of looping.
#[derive(Clone, Debug, Default)]
pub struct EventAligner {
    current: usize,
}

impl EventAligner {
    /// Start with the cursor at the first entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the cursor at `position`.
    pub fn with_cursor(position: usize) -> Self {
        Self { current: position }
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.current
    }

    /// Return the index of the truth entry whose identity is `identity`.
    ///
    /// On success the cursor rests on the returned index.
    pub fn align<S>(&mut self, identity: EventIdentity, source: &mut S) -> Result<usize, AlignmentError>
    where
        S: TruthSource + ?Sized,
    {
        let len = source.len();
        if len == 0 {
            return Err(AlignmentError::EmptyTruthStream { identity });
        }
        if self.current >= len {
            self.current = 0;
        }

        let mut matches = |i: usize| source.get(i).is_some_and(|e| e.identity == identity);

        if matches(self.current) {
            return Ok(self.current);
        }
        for _ in 1..len {
            self.current = (self.current + 1) % len;
            if matches(self.current) {
                return Ok(self.current);
            }
        }
        Err(AlignmentError::NoMatch {
            identity,
            attempts: len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use trackeff_test_utils::{TruthEventBuilder, VecTruthSource};

    fn stream(n: u32) -> VecTruthSource {
        VecTruthSource::new(
            (1..=n)
                .map(|e| TruthEventBuilder::new(100, e).build())
                .collect(),
        )
    }

    #[test]
    fn in_order_stream_checks_few_entries() {
        let mut src = stream(10);
        let mut a = EventAligner::new();
        for e in 1..=10 {
            assert_eq!(a.align(EventIdentity::new(100, e), &mut src), Ok(e as usize - 1));
        }
        // First event costs one load; every later one costs two.
        assert_eq!(src.loads(), 1 + 9 * 2);
    }

    #[test]
    fn repeated_identity_hits_cursor() {
        let mut src = stream(5);
        let mut a = EventAligner::new();
        a.align(EventIdentity::new(100, 3), &mut src).unwrap();
        src.reset_loads();
        assert_eq!(a.align(EventIdentity::new(100, 3), &mut src), Ok(2));
        assert_eq!(src.loads(), 1);
    }

    #[test]
    fn wraps_around() {
        let mut src = stream(5);
        let mut a = EventAligner::with_cursor(3);
        assert_eq!(a.align(EventIdentity::new(100, 1), &mut src), Ok(0));
        assert_eq!(a.cursor(), 0);
    }

    #[test]
    fn missing_identity_fails_after_full_wrap() {
        let mut src = stream(4);
        let mut a = EventAligner::new();
        match a.align(EventIdentity::new(999, 1), &mut src) {
            Err(AlignmentError::NoMatch { attempts: 4, .. }) => {}
            other => panic!("expected NoMatch, got {other:?}"),
        }
        assert_eq!(src.loads(), 4);
    }

    #[test]
    fn empty_stream_fails() {
        let mut src = VecTruthSource::new(Vec::new());
        match EventAligner::new().align(EventIdentity::new(1, 1), &mut src) {
            Err(AlignmentError::EmptyTruthStream { .. }) => {}
            other => panic!("expected EmptyTruthStream, got {other:?}"),
        }
    }

    #[test]
    fn stale_cursor_is_reset() {
        let mut src = stream(3);
        let mut a = EventAligner::with_cursor(17);
        assert_eq!(a.align(EventIdentity::new(100, 1), &mut src), Ok(0));
    }

    proptest! {
        #[test]
        fn finds_any_entry_within_len_loads(len in 1u32..60, start in 0usize..60, target in 0u32..60) {
            let target = target % len;
            let mut src = stream(len);
            let mut a = EventAligner::with_cursor(start);
            let got = a.align(EventIdentity::new(100, target + 1), &mut src);
            prop_assert_eq!(got, Ok(target as usize));
            prop_assert!(src.loads() <= len as usize);
        }

        #[test]
        fn absent_identity_costs_exactly_len(len in 1u32..60, start in 0usize..60) {
            let mut src = stream(len);
            let mut a = EventAligner::with_cursor(start);
            let got = a.align(EventIdentity::new(7, 1), &mut src);
            prop_assert!(got.is_err());
            prop_assert_eq!(src.loads(), len as usize);
        }
    }
}
