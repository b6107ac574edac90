//! Assertions over paged query results.

use std::net::Ipv6Addr;

use lease6_types::{Lease6, LeasePageSize, Result, ZERO_ADDRESS};

/// Asserts that lease addresses are strictly ascending.
///
/// # Panics
///
/// Panics naming the first pair out of order or repeated.
pub fn assert_strictly_ascending(leases: &[Lease6]) {
    for pair in leases.windows(2) {
        assert!(
            pair[0].address < pair[1].address,
            "leases out of order: {} is followed by {}",
            pair[0].address,
            pair[1].address
        );
    }
}

/// Returns the addresses of `leases`, in order.
#[must_use]
pub fn addresses_of(leases: &[Lease6]) -> Vec<Ipv6Addr> {
    leases.iter().map(|lease| lease.address).collect()
}

/// Pages through a query until it returns an empty page.
///
/// `fetch` is called with the cursor (`::` first, then the last address of
/// the previous page) and `page_size`. Every page is checked to be
/// non-oversized, ascending, and strictly above its cursor.
///
/// # Errors
///
/// Propagates the first error returned by `fetch`.
///
/// # Panics
///
/// Panics if a page breaks one of the checks above, or if more pages are
/// returned than `max_pages`.
pub fn collect_pages<F>(
    page_size: LeasePageSize,
    max_pages: usize,
    mut fetch: F,
) -> Result<Vec<Lease6>>
where
    F: FnMut(Ipv6Addr, LeasePageSize) -> Result<Vec<Lease6>>,
{
    let mut cursor = ZERO_ADDRESS;
    let mut all = Vec::new();

    for _ in 0..=max_pages {
        let page = fetch(cursor, page_size)?;
        let Some(last) = page.last() else {
            return Ok(all);
        };

        assert!(page.len() <= page_size.get(), "page of {} exceeds {page_size}", page.len());
        assert_strictly_ascending(&page);
        if cursor != ZERO_ADDRESS {
            assert!(page[0].address > cursor, "page starts at {} not after {cursor}", page[0].address);
        }

        cursor = last.address;
        all.extend(page);
    }

    panic!("query did not terminate within {max_pages} pages");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use lease6_types::Duid;

    use super::*;

    fn lease(last: u16) -> Lease6 {
        Lease6::builder()
            .address(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, last))
            .duid(Duid::new(b"x".to_vec()).unwrap())
            .build()
    }

    #[test]
    fn test_ascending_accepts_sorted() {
        assert_strictly_ascending(&[lease(1), lease(2), lease(9)]);
        assert_strictly_ascending(&[]);
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn test_ascending_rejects_duplicates() {
        assert_strictly_ascending(&[lease(1), lease(1)]);
    }

    #[test]
    fn test_collect_pages_follows_cursor() {
        let all: Vec<Lease6> = (1..=5).map(lease).collect();
        let page_size = LeasePageSize::new(2).unwrap();

        let mut calls = 0;
        let got = collect_pages(page_size, 10, |cursor, size| {
            calls += 1;
            Ok(all
                .iter()
                .filter(|l| cursor == ZERO_ADDRESS || l.address > cursor)
                .take(size.get())
                .cloned()
                .collect())
        })
        .unwrap();

        assert_eq!(addresses_of(&got), addresses_of(&all));
        assert_eq!(calls, 4);
    }

    #[test]
    #[should_panic(expected = "did not terminate")]
    fn test_collect_pages_detects_non_advancing_cursor() {
        let page_size = LeasePageSize::new(1).unwrap();
        let mut next = 0;
        let _ = collect_pages(page_size, 3, |_, _| {
            next += 1;
            Ok(vec![lease(next)])
        });
    }
}
