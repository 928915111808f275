//! Property tests for ingestion invariants.
//!
//! Uses proptest to verify:
//! 1. Alignment: output dates are a gap-free run of the session calendar
//! 2. Clamp: high/low always bracket open and close
//! 3. Sids: strictly increasing from 1 with no gaps
//! 4. Dividends: exactly the non-zero rows, no duplicate ex-dates

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use proptest::prelude::*;

use barbundle_core::data::{
    align_to_sessions, calibrate::clamp, canonicalize, extract_dividends, truncate_before,
    SessionRow,
};
use barbundle_core::domain::{EquityRow, Sid, SidAllocator};

// ── Strategies (proptest) ────────────────────────────────────────────

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1999, 12, 1).unwrap()
}

fn weekday_sessions(days: i64) -> Vec<NaiveDate> {
    (0..days)
        .map(|i| base_date() + Duration::days(i))
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

/// Raw rows on arbitrary calendar days (weekends included), some with a
/// missing close and some paying a dividend.
fn arb_rows() -> impl Strategy<Value = Vec<EquityRow>> {
    prop::collection::vec(
        (0..90i64, arb_price(), prop::bool::weighted(0.1), prop::bool::weighted(0.1)),
        1..40,
    )
    .prop_map(|raw| {
        let rows = raw
            .into_iter()
            .map(|(offset, price, missing_close, pays)| EquityRow {
                date: base_date() + Duration::days(offset),
                open: price,
                high: price + 1.0,
                low: price - 1.0,
                close: if missing_close { f64::NAN } else { price },
                volume: 1000.0,
                dividend: if pays { 0.5 } else { 0.0 },
            })
            .collect();
        canonicalize(rows)
    })
}

// ── 1. Alignment ─────────────────────────────────────────────────────

proptest! {
    /// Aligned dates are consecutive sessions inside the observed span, and
    /// every value is present.
    #[test]
    fn aligned_series_is_gap_free_session_run(rows in arb_rows()) {
        let sessions = weekday_sessions(120);
        let aligned = align_to_sessions(&rows, &sessions);

        let first = rows.first().unwrap().date;
        let last = rows.last().unwrap().date;

        for row in &aligned {
            prop_assert!(row.is_complete());
            prop_assert!(row.date >= first && row.date <= last);
        }

        if let (Some(head), Some(tail)) = (aligned.first(), aligned.last()) {
            let start = sessions.binary_search(&head.date).unwrap();
            let end = sessions.binary_search(&tail.date).unwrap();
            let dates: Vec<NaiveDate> = aligned.iter().map(|r| r.date).collect();
            prop_assert_eq!(&dates[..], &sessions[start..=end]);
        }
    }

    /// After the cutoff the series stays a suffix of the aligned run.
    #[test]
    fn cutoff_keeps_only_later_sessions(rows in arb_rows(), cut in 0..90i64) {
        let sessions = weekday_sessions(120);
        let cutoff = base_date() + Duration::days(cut);
        let aligned = align_to_sessions(&rows, &sessions);
        let kept = truncate_before(aligned.clone(), cutoff);

        prop_assert!(kept.iter().all(|r| r.date >= cutoff));
        prop_assert_eq!(&aligned[aligned.len() - kept.len()..], &kept[..]);
    }
}

// ── 2. Clamp ─────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn clamp_brackets_open_and_close(
        open in arb_price(),
        high in arb_price(),
        low in arb_price(),
        close in arb_price(),
    ) {
        let (h, l) = clamp(open, high, low, close);
        prop_assert!(h >= open && h >= close && h >= high);
        prop_assert!(l <= open && l <= close && l <= low);
    }
}

// ── 3. Sids ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn sids_count_up_from_one(n in 1usize..200) {
        let mut alloc = SidAllocator::new();
        let sids: Vec<Sid> = (0..n).map(|_| alloc.next_sid()).collect();
        let expected: Vec<Sid> = (1..=n as u32).map(Sid).collect();
        prop_assert_eq!(sids, expected);
    }
}

// ── 4. Dividends ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn dividends_are_exactly_the_paying_sessions(rows in arb_rows()) {
        let sessions = weekday_sessions(120);
        let aligned = align_to_sessions(&rows, &sessions);
        let dividends = extract_dividends(Sid(7), &aligned);

        let expected: Vec<(NaiveDate, f64)> = aligned
            .iter()
            .filter(|r| r.dividend != 0.0)
            .map(|r| (r.date, r.dividend))
            .collect();
        let got: Vec<(NaiveDate, f64)> =
            dividends.iter().map(|d| (d.ex_date, d.amount)).collect();
        prop_assert_eq!(got, expected);

        let mut dates: Vec<NaiveDate> = dividends.iter().map(|d| d.ex_date).collect();
        dates.dedup();
        prop_assert_eq!(dates.len(), dividends.len());
        prop_assert!(dividends.iter().all(|d| d.sid == Sid(7)));
    }

    /// Only raw rows that land on a session can pay; fills never do.
    #[test]
    fn filled_sessions_never_pay(rows in arb_rows()) {
        let sessions = weekday_sessions(120);
        let aligned = align_to_sessions(&rows, &sessions);
        for row in aligned.iter().filter(|r| r.dividend != 0.0) {
            let raw = rows.iter().find(|r| r.date == row.date);
            prop_assert!(raw.is_some_and(|r| r.dividend == row.dividend));
        }
    }
}
