use std::fmt::Display;

/// An inclusive range of first-half differences, which may cover all of `u32`.
///
/// `std::ops::RangeInclusive<u32>` would do too, but its length does not fit
/// into a `u32` for the full range and splitting it is awkward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DiffRange {
    start: u32,
    end: u32,
}

impl DiffRange {
    /// Returns `None` if `start > end`.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        if start > end {
            None
        } else {
            Some(DiffRange { start, end })
        }
    }
    /// Every difference except the zero one.
    pub fn nonzero() -> Self {
        DiffRange {
            start: 1,
            end: u32::MAX,
        }
    }
    pub fn start(&self) -> u32 {
        self.start
    }
    pub fn end(&self) -> u32 {
        self.end
    }
    pub fn len(&self) -> u64 {
        (self.end - self.start) as u64 + 1
    }
    pub fn contains(&self, x: u32) -> bool {
        self.start <= x && x <= self.end
    }
    /// Splits the range into consecutive, disjoint pieces of `size` elements,
    /// the last one possibly shorter.
    pub fn chunks(self, size: u32) -> impl Iterator<Item = DiffRange> {
        assert!(size > 0, "chunk size must be positive");
        let mut next = Some(self.start);
        std::iter::from_fn(move || {
            let start = next?;
            let end = start.saturating_add(size - 1).min(self.end);
            next = if end == self.end { None } else { Some(end + 1) };
            Some(DiffRange { start, end })
        })
    }
}

impl Display for DiffRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}..={:#x}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    #[test]
    fn full_range() {
        let r = DiffRange::nonzero();
        assert_eq!(r.len(), (1u64 << 32) - 1);
        assert!(!r.contains(0));
        assert!(r.contains(u32::MAX));
        assert_eq!(r.chunks(1 << 30).count(), 4);
        assert_eq!(DiffRange::new(0, u32::MAX).unwrap().len(), 1 << 32);
    }
    #[test]
    fn empty_rejected() {
        assert_eq!(DiffRange::new(5, 4), None);
        assert_eq!(DiffRange::new(5, 5).map(|x| x.len()), Some(1));
    }
    #[test]
    fn chunks_at_the_end() {
        let r = DiffRange::new(u32::MAX - 4, u32::MAX).unwrap();
        let chunks: Vec<_> = r.chunks(2).collect();
        assert_eq!(
            chunks,
            vec![
                DiffRange::new(u32::MAX - 4, u32::MAX - 3).unwrap(),
                DiffRange::new(u32::MAX - 2, u32::MAX - 1).unwrap(),
                DiffRange::new(u32::MAX, u32::MAX).unwrap(),
            ]
        );
    }
    #[quickcheck]
    fn qc_chunks_cover(start: u32, span: u32, size: u16) -> TestResult {
        if size == 0 {
            return TestResult::discard();
        }
        let end = start.saturating_add(span % 100_000);
        let r = DiffRange::new(start, end).unwrap();
        let mut expected_start = r.start() as u64;
        let mut total = 0;
        for chunk in r.chunks(size as u32) {
            if chunk.start() as u64 != expected_start || chunk.len() > size as u64 {
                return TestResult::failed();
            }
            expected_start = chunk.end() as u64 + 1;
            total += chunk.len();
        }
        TestResult::from_bool(total == r.len() && expected_start == r.end() as u64 + 1)
    }
}
