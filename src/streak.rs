use crate::datekit::{format_key, DateKey, Year};
use std::collections::BTreeMap;
use std::iter::successors;
use time::Date;

/// Count the marked days in an unbroken run ending at `today` (or at the end
/// of `year`, if `today` is later).  An unmarked `today` ends the run at zero;
/// the walk never crosses back into the previous year.
pub(crate) fn calculate_streak<C>(
    read_days: &BTreeMap<DateKey, C>,
    year: Year,
    today: Date,
) -> u32 {
    if today < year.start() {
        return 0;
    }
    let cursor = today.min(year.end());
    let streak = successors(Some(cursor), |d| d.previous_day())
        .take_while(|&d| d >= year.start())
        .take_while(|&d| read_days.contains_key(&format_key(d)))
        .count();
    u32::try_from(streak).unwrap_or(u32::MAX)
}

/// A day is missed when it is strictly before `today` and not marked
pub(crate) fn is_missed_day<C>(
    date: Date,
    read_days: &BTreeMap<DateKey, C>,
    today: Date,
) -> bool {
    !read_days.contains_key(&format_key(date)) && date < today
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use time::Duration;

    fn year(value: i32) -> Year {
        Year::new(value).unwrap()
    }

    fn marked<I: IntoIterator<Item = Date>>(dates: I) -> BTreeMap<DateKey, &'static str> {
        dates.into_iter().map(|d| (format_key(d), "#1C7C54")).collect()
    }

    fn unmarked() -> BTreeMap<DateKey, &'static str> {
        BTreeMap::new()
    }

    fn days_between(start: Date, end: Date) -> impl Iterator<Item = Date> {
        successors(Some(start), |d| d.next_day()).take_while(move |&d| d <= end)
    }

    #[test]
    fn test_empty_map_has_no_streak() {
        let read_days = unmarked();
        for today in [
            date!(2025 - 06 - 01),
            date!(2026 - 01 - 01),
            date!(2026 - 03 - 10),
            date!(2027 - 02 - 01),
        ] {
            assert_eq!(calculate_streak(&read_days, year(2026), today), 0);
        }
    }

    #[test]
    fn test_three_day_streak() {
        let read_days = marked([
            date!(2026 - 03 - 08),
            date!(2026 - 03 - 09),
            date!(2026 - 03 - 10),
        ]);
        assert_eq!(
            calculate_streak(&read_days, year(2026), date!(2026 - 03 - 10)),
            3
        );
    }

    #[test]
    fn test_whole_year_so_far() {
        let today = date!(2026 - 03 - 10);
        let read_days = marked(days_between(date!(2026 - 01 - 01), today));
        assert_eq!(
            calculate_streak(&read_days, year(2026), today),
            u32::from(today.ordinal())
        );
    }

    #[test]
    fn test_gap_breaks_streak() {
        let today = date!(2026 - 05 - 20);
        for k in 1..10 {
            let gap = today - Duration::days(k);
            let read_days = marked(
                days_between(date!(2026 - 01 - 01), today).filter(|&d| d != gap),
            );
            assert_eq!(
                calculate_streak(&read_days, year(2026), today),
                u32::try_from(k).unwrap(),
                "gap {k} days before today"
            );
        }
    }

    #[test]
    fn test_unmarked_today_breaks_streak() {
        let read_days = marked([date!(2026 - 03 - 08), date!(2026 - 03 - 09)]);
        assert_eq!(
            calculate_streak(&read_days, year(2026), date!(2026 - 03 - 10)),
            0
        );
    }

    #[test]
    fn test_before_year_starts() {
        let read_days = marked([date!(2025 - 12 - 31), date!(2026 - 01 - 01)]);
        assert_eq!(
            calculate_streak(&read_days, year(2026), date!(2025 - 12 - 31)),
            0
        );
    }

    #[test]
    fn test_after_year_ends() {
        let read_days = marked([
            date!(2026 - 12 - 29),
            date!(2026 - 12 - 30),
            date!(2026 - 12 - 31),
        ]);
        assert_eq!(
            calculate_streak(&read_days, year(2026), date!(2027 - 02 - 14)),
            3
        );
    }

    #[test]
    fn test_streak_stops_at_year_start() {
        let read_days = marked(days_between(date!(2025 - 12 - 01), date!(2026 - 01 - 03)));
        assert_eq!(
            calculate_streak(&read_days, year(2026), date!(2026 - 01 - 03)),
            3
        );
    }

    #[test]
    fn test_missed_days() {
        let today = date!(2026 - 03 - 10);
        let read_days = marked([
            date!(2026 - 03 - 08),
            date!(2026 - 03 - 09),
            date!(2026 - 03 - 10),
        ]);
        assert!(is_missed_day(date!(2026 - 03 - 07), &read_days, today));
        assert!(!is_missed_day(date!(2026 - 03 - 08), &read_days, today));
        assert!(!is_missed_day(date!(2026 - 03 - 11), &read_days, today));
    }

    #[test]
    fn test_today_is_never_missed() {
        let read_days = unmarked();
        let today = date!(2026 - 03 - 10);
        assert!(!is_missed_day(today, &read_days, today));
        assert!(is_missed_day(date!(2026 - 03 - 09), &read_days, today));
    }

    #[test]
    fn test_future_is_never_missed() {
        let today = date!(2026 - 03 - 10);
        let none_marked = unmarked();
        let future = [date!(2026 - 03 - 11), date!(2026 - 12 - 31)];
        let all_marked = marked(future);
        for date in future {
            assert!(!is_missed_day(date, &none_marked, today));
            assert!(!is_missed_day(date, &all_marked, today));
        }
    }
}
