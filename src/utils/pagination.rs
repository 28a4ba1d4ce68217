/// Fixed page size for book listings.
pub const PAGE_SIZE: u64 = 15;

/// 1-based page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u64,
    pub size: u64,
}

impl Page {
    pub fn new(number: u64) -> Self {
        Self {
            number: number.max(1),
            size: PAGE_SIZE,
        }
    }

    /// Lenient query-string parse: missing, non-numeric, zero or negative
    /// input falls back to the first page.
    pub fn parse(raw: Option<&str>) -> Self {
        let number = raw
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|n| *n >= 1)
            .unwrap_or(1);
        Self::new(number as u64)
    }

    pub fn skip(&self) -> u64 {
        (self.number - 1).saturating_mul(self.size)
    }

    /// `skip` as the driver accepts it (a signed 64-bit count). `None` means
    /// the page lies past any collection and is empty.
    pub fn driver_skip(&self) -> Option<u64> {
        let skip = self.skip();
        (skip <= i64::MAX as u64).then_some(skip)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_to_first_page() {
        assert_eq!(Page::parse(None).number, 1);
        assert_eq!(Page::parse(Some("invalid")).number, 1);
        assert_eq!(Page::parse(Some("")).number, 1);
        assert_eq!(Page::parse(Some("0")).number, 1);
        assert_eq!(Page::parse(Some("-3")).number, 1);
    }

    #[test]
    fn test_skip_offsets() {
        assert_eq!(Page::parse(Some("1")).skip(), 0);
        assert_eq!(Page::parse(Some("2")).skip(), 15);
        assert_eq!(Page::parse(Some(" 4 ")).skip(), 45);
    }

    #[test]
    fn test_driver_skip_rejects_unrepresentable_offsets() {
        assert_eq!(Page::parse(Some("2")).driver_skip(), Some(15));

        let huge = Page::parse(Some("1000000000000000000"));
        assert_eq!(huge.number, 1_000_000_000_000_000_000);
        assert!(huge.skip() > i64::MAX as u64);
        assert_eq!(huge.driver_skip(), None);
    }
}
