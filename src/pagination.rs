//! Page and progress arithmetic.
//!
//! Three page units exist, from finest to coarsest: LocationsIndex entries,
//! spine sections, and the engine's own fractional estimate. The functions
//! here are pure so the tracker and the navigator agree on the rules.

use crate::engine::{LocationPoint, SpineItem};

/// Default characters per LocationsIndex entry.
pub const DEFAULT_CHUNK_SIZE: usize = 1650;

/// Page position derived from one of the page units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageEstimate {
    /// 1-based.
    pub current_page: usize,
    pub total_pages: usize,
    /// Fraction of the document before the current position, in `[0, 1]`.
    pub fraction: f64,
}

/// Whole percent in `[0, 100]`; non-finite input counts as zero.
pub fn progress_percent(fraction: f64) -> u8 {
    if !fraction.is_finite() {
        return 0;
    }
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Clamp a requested 1-based page into `[1, total]`. An empty document still
/// has one page.
pub fn clamp_page(requested: i64, total: usize) -> usize {
    let total = total.max(1) as i64;
    requested.clamp(1, total) as usize
}

/// Page of the given LocationsIndex ordinal.
pub fn estimate_from_index(ordinal: usize, len: usize) -> PageEstimate {
    let len = len.max(1);
    let ordinal = ordinal.min(len - 1);
    PageEstimate {
        current_page: ordinal + 1,
        total_pages: len,
        fraction: ordinal as f64 / len as f64,
    }
}

/// Ordinal of the spine section containing `point`. An exact href match
/// anywhere in the spine wins over a locator that merely contains an href.
pub fn spine_position(spine: &[SpineItem], point: &LocationPoint) -> Option<usize> {
    let exact = point
        .href
        .as_deref()
        .and_then(|href| spine.iter().position(|item| item.href == href));
    exact.or_else(|| {
        let locator = point.locator.as_ref()?;
        spine
            .iter()
            .position(|item| locator.as_str().contains(item.href.as_str()))
    })
}

/// Spine-based fallback. When the section cannot be matched the last known
/// page is kept (clamped to the spine length) and the engine's own
/// percentage stands in for the fraction.
pub fn estimate_from_spine(
    spine: &[SpineItem],
    point: &LocationPoint,
    last_page: usize,
) -> PageEstimate {
    let total = spine.len().max(1);
    match spine_position(spine, point) {
        Some(ordinal) => PageEstimate {
            current_page: ordinal + 1,
            total_pages: total,
            fraction: ordinal as f64 / total as f64,
        },
        None => PageEstimate {
            current_page: last_page.clamp(1, total),
            total_pages: total,
            fraction: point.percentage.unwrap_or(0.0),
        },
    }
}

/// `ceil(total / 2)`, never below 1.
pub fn middle_page(total: usize) -> usize {
    total.max(1).div_ceil(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Locator;

    fn spine(hrefs: &[&str]) -> Vec<SpineItem> {
        hrefs
            .iter()
            .enumerate()
            .map(|(index, href)| SpineItem {
                index,
                href: href.to_string(),
            })
            .collect()
    }

    #[test]
    fn progress_is_rounded_and_bounded() {
        assert_eq!(progress_percent(0.0), 0);
        assert_eq!(progress_percent(0.424), 42);
        assert_eq!(progress_percent(0.426), 43);
        assert_eq!(progress_percent(1.7), 100);
        assert_eq!(progress_percent(-0.2), 0);
        assert_eq!(progress_percent(f64::NAN), 0);
    }

    #[test]
    fn requested_pages_are_clamped() {
        assert_eq!(clamp_page(0, 10), 1);
        assert_eq!(clamp_page(-4, 10), 1);
        assert_eq!(clamp_page(7, 10), 7);
        assert_eq!(clamp_page(11, 10), 10);
        assert_eq!(clamp_page(3, 0), 1);
    }

    #[test]
    fn index_ordinal_maps_to_one_based_page() {
        let estimate = estimate_from_index(0, 120);
        assert_eq!(estimate.current_page, 1);
        assert_eq!(estimate.total_pages, 120);
        assert_eq!(estimate.fraction, 0.0);

        let estimate = estimate_from_index(59, 120);
        assert_eq!(estimate.current_page, 60);
        assert!((estimate.fraction - 59.0 / 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn spine_section_is_matched_by_href_or_locator() {
        let items = spine(&["cover.xhtml", "ch1.xhtml", "ch2.xhtml", "ch3.xhtml"]);

        let by_href = LocationPoint {
            locator: None,
            href: Some("ch2.xhtml".to_string()),
            percentage: None,
        };
        let estimate = estimate_from_spine(&items, &by_href, 1);
        assert_eq!(estimate.current_page, 3);
        assert_eq!(estimate.total_pages, 4);
        assert!((estimate.fraction - 0.5).abs() < f64::EPSILON);

        let by_locator = LocationPoint {
            locator: Some(Locator::new("ch1.xhtml#loc3")),
            href: None,
            percentage: None,
        };
        assert_eq!(spine_position(&items, &by_locator), Some(1));
    }

    #[test]
    fn exact_href_beats_an_earlier_substring_href() {
        let items = spine(&["1.xhtml", "11.xhtml"]);
        let point = LocationPoint {
            locator: Some(Locator::new("11.xhtml#p3")),
            href: Some("11.xhtml".to_string()),
            percentage: None,
        };
        assert_eq!(spine_position(&items, &point), Some(1));
        assert_eq!(estimate_from_spine(&items, &point, 1).current_page, 2);
    }

    #[test]
    fn unmatched_section_keeps_last_page() {
        let items = spine(&["a.xhtml", "b.xhtml", "c.xhtml"]);
        let point = LocationPoint {
            locator: Some(Locator::new("epubcfi(/6/99)")),
            href: Some("missing.xhtml".to_string()),
            percentage: Some(0.3),
        };

        let estimate = estimate_from_spine(&items, &point, 2);
        assert_eq!(estimate.current_page, 2);
        assert_eq!(estimate.total_pages, 3);
        assert!((estimate.fraction - 0.3).abs() < f64::EPSILON);

        assert_eq!(estimate_from_spine(&items, &point, 9).current_page, 3);
    }

    #[test]
    fn middle_rounds_up() {
        assert_eq!(middle_page(9), 5);
        assert_eq!(middle_page(10), 5);
        assert_eq!(middle_page(1), 1);
        assert_eq!(middle_page(0), 1);
    }
}
