use chrono::{Datelike, Duration, NaiveDate};
use clap::ValueEnum;

use crate::dates::{
    DateRange, end_of_week, first_day_of_month, first_day_of_year, last_day_of_month, last_day_of_year, shift_month,
    shift_year,
};
use crate::domain::ReadingInterval;

pub const ZOOM_STEP: f64 = 0.5;
pub const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM_YEAR: f64 = 6.0;
const MAX_ZOOM_MONTH: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterMode {
    Month,
    Year,
    All,
}

impl FilterMode {
    pub fn max_zoom(self) -> f64 {
        match self {
            FilterMode::Month => MAX_ZOOM_MONTH,
            FilterMode::Year | FilterMode::All => MAX_ZOOM_YEAR,
        }
    }

    /// Human label for the period containing `reference`.
    pub fn period_label(self, reference: NaiveDate) -> String {
        match self {
            FilterMode::Month => reference.format("%B %Y").to_string(),
            FilterMode::Year => reference.year().to_string(),
            FilterMode::All => "All time".to_string(),
        }
    }

    /// Moves `reference` by whole periods. `All` has nowhere to go.
    pub fn shift(self, reference: NaiveDate, delta: i32) -> NaiveDate {
        match self {
            FilterMode::Month => shift_month(reference, delta),
            FilterMode::Year => shift_year(reference, delta),
            FilterMode::All => reference,
        }
    }
}

/// Visible span of the timeline. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Intervals sharing one timeline row; no two of them overlap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lane {
    pub intervals: Vec<ReadingInterval>,
}

impl Lane {
    fn accepts(&self, interval: &ReadingInterval) -> bool {
        self.intervals.iter().all(|member| !member.overlaps(interval))
    }
}

/// Greedy lane assignment in start-date order.
///
/// Each interval joins the first lane none of whose members it overlaps
/// (inclusive endpoints), otherwise opens a new lane. Equal start dates keep
/// their input order. The result is valid but not guaranteed minimal.
pub fn pack_intervals(intervals: &[ReadingInterval]) -> Vec<Lane> {
    let mut ordered = intervals.to_vec();
    ordered.sort_by_key(|interval| interval.start_date);

    let mut lanes: Vec<Lane> = Vec::new();
    for interval in ordered {
        match lanes.iter_mut().find(|lane| lane.accepts(&interval)) {
            Some(lane) => lane.intervals.push(interval),
            None => lanes.push(Lane {
                intervals: vec![interval],
            }),
        }
    }
    lanes
}

/// The whole month or year containing `reference`; `None` for all time.
pub fn nominal_period(mode: FilterMode, reference: NaiveDate) -> Option<DateRange> {
    match mode {
        FilterMode::Month => Some(DateRange {
            start: first_day_of_month(reference),
            end: last_day_of_month(reference),
        }),
        FilterMode::Year => Some(DateRange {
            start: first_day_of_year(reference),
            end: last_day_of_year(reference),
        }),
        FilterMode::All => None,
    }
}

/// Intervals overlapping the nominal period, regardless of display clamping.
pub fn filter_for_period(mode: FilterMode, reference: NaiveDate, intervals: &[ReadingInterval]) -> Vec<ReadingInterval> {
    match nominal_period(mode, reference) {
        Some(period) => intervals
            .iter()
            .filter(|interval| interval.range().overlaps(&period))
            .cloned()
            .collect(),
        None => intervals.to_vec(),
    }
}

fn is_current_period(mode: FilterMode, reference: NaiveDate, now: NaiveDate) -> bool {
    nominal_period(mode, reference).is_some_and(|period| period.contains(now))
}

/// Computes the visible window, or `None` when there is nothing to show.
pub fn compute_window(
    mode: FilterMode,
    reference: NaiveDate,
    intervals: &[ReadingInterval],
    now: NaiveDate,
) -> Option<TimeWindow> {
    if intervals.is_empty() {
        return None;
    }

    let window = match mode {
        FilterMode::All => {
            let start = intervals.iter().map(|interval| interval.start_date).min()?;
            TimeWindow {
                start,
                end: now.max(start),
            }
        }
        FilterMode::Year => {
            let start = first_day_of_year(reference);
            let end = if reference.year() == now.year() {
                now
            } else {
                last_day_of_year(reference)
            };
            TimeWindow { start, end }
        }
        FilterMode::Month => {
            let start = first_day_of_month(reference);
            let month_end = last_day_of_month(reference);
            let end = if is_current_period(mode, reference, now) && now < month_end {
                end_of_week(now).min(month_end)
            } else {
                month_end
            };
            TimeWindow { start, end }
        }
    };
    Some(window)
}

/// Default magnification so the elapsed part of a current period fills the
/// view. Past periods and all-time views are not magnified.
pub fn compute_default_zoom(mode: FilterMode, reference: NaiveDate, now: NaiveDate) -> f64 {
    if !is_current_period(mode, reference, now) {
        return MIN_ZOOM;
    }
    let period_end = match nominal_period(mode, reference) {
        Some(period) => period.end,
        None => return MIN_ZOOM,
    };
    if now > period_end {
        return MIN_ZOOM;
    }

    let elapsed_quarters = match mode {
        FilterMode::Year => now.month0() / 3,
        FilterMode::Month => (now.day0() / 7).min(3),
        FilterMode::All => return MIN_ZOOM,
    };
    let fraction = (elapsed_quarters + 1) as f64 / 4.0;
    (1.0 / fraction).clamp(MIN_ZOOM, mode.max_zoom())
}

/// Zoom level tied to a filter selection. Changing the selection resets the
/// level before the default is recomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    mode: FilterMode,
    reference: NaiveDate,
    level: f64,
}

impl ZoomState {
    pub fn new(mode: FilterMode, reference: NaiveDate, now: NaiveDate) -> Self {
        Self {
            mode,
            reference,
            level: compute_default_zoom(mode, reference, now),
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    /// Returns true when the selection changed and the level was recomputed.
    pub fn retarget(&mut self, mode: FilterMode, reference: NaiveDate, now: NaiveDate) -> bool {
        if mode == self.mode && reference == self.reference {
            return false;
        }
        self.mode = mode;
        self.reference = reference;
        self.level = compute_default_zoom(mode, reference, now);
        true
    }

    pub fn zoom_in(&mut self) {
        self.level = (self.level + ZOOM_STEP).min(self.mode.max_zoom());
    }

    pub fn zoom_out(&mut self) {
        self.level = (self.level - ZOOM_STEP).max(MIN_ZOOM);
    }
}

/// Maps a zoomed window onto terminal columns.
#[derive(Debug, Clone, Copy)]
pub struct TimelineViewport {
    pub window: TimeWindow,
    pub zoom: f64,
    offset_days: i64,
}

impl TimelineViewport {
    pub fn new(window: TimeWindow, zoom: f64, offset_days: i64) -> Self {
        let mut viewport = Self {
            window,
            zoom: zoom.max(MIN_ZOOM),
            offset_days: 0,
        };
        viewport.offset_days = offset_days.clamp(0, viewport.max_offset());
        viewport
    }

    pub fn visible_days(&self) -> i64 {
        ((self.window.days() as f64 / self.zoom).ceil() as i64).max(1)
    }

    pub fn max_offset(&self) -> i64 {
        (self.window.days() - self.visible_days()).max(0)
    }

    pub fn offset_days(&self) -> i64 {
        self.offset_days
    }

    pub fn visible_start(&self) -> NaiveDate {
        self.window.start + Duration::days(self.offset_days)
    }

    pub fn visible_end(&self) -> NaiveDate {
        self.visible_start() + Duration::days(self.visible_days() - 1)
    }

    /// Column of `date` within `width` columns; may fall outside `0..width`.
    pub fn date_to_column(&self, date: NaiveDate, width: u16) -> i64 {
        let days = (date - self.visible_start()).num_days();
        days * width as i64 / self.visible_days()
    }

    /// Inclusive column span of an interval, clipped to the view.
    pub fn columns_for(&self, interval: &ReadingInterval, width: u16) -> Option<(u16, u16)> {
        if width == 0 || interval.end_date < self.visible_start() || interval.start_date > self.visible_end() {
            return None;
        }
        let last = width as i64 - 1;
        let start = self.date_to_column(interval.start_date, width).clamp(0, last);
        let next_day = interval.end_date + Duration::days(1);
        let end = (self.date_to_column(next_day, width) - 1).clamp(start, last);
        Some((start as u16, end as u16))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;

    use super::{
        FilterMode, TimeWindow, TimelineViewport, ZoomState, compute_default_zoom, compute_window, filter_for_period,
        pack_intervals,
    };
    use crate::domain::ReadingInterval;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn interval(id: &str, start: NaiveDate, end: NaiveDate) -> ReadingInterval {
        ReadingInterval {
            id: id.to_string(),
            start_date: start,
            end_date: end,
            title: format!("Book {id}"),
            author: None,
            rating: 3,
            pages: None,
        }
    }

    fn lane_ids(intervals: &[ReadingInterval]) -> Vec<Vec<String>> {
        pack_intervals(intervals)
            .into_iter()
            .map(|lane| lane.intervals.into_iter().map(|interval| interval.id).collect())
            .collect()
    }

    #[test]
    fn empty_and_single_inputs() {
        assert!(pack_intervals(&[]).is_empty());
        let single = [interval("a", day(2024, 1, 1), day(2024, 1, 1))];
        assert_eq!(lane_ids(&single), vec![vec!["a".to_string()]]);
    }

    #[test]
    fn mutually_overlapping_intervals_need_three_lanes() {
        let intervals = [
            interval("a", day(2024, 1, 1), day(2024, 1, 10)),
            interval("b", day(2024, 1, 2), day(2024, 1, 9)),
            interval("c", day(2024, 1, 3), day(2024, 1, 8)),
        ];
        assert_eq!(pack_intervals(&intervals).len(), 3);
    }

    #[test]
    fn touching_endpoints_do_not_share_a_lane() {
        let intervals = [
            interval("a", day(2024, 1, 1), day(2024, 1, 5)),
            interval("b", day(2024, 1, 5), day(2024, 1, 9)),
            interval("c", day(2024, 1, 10), day(2024, 1, 12)),
        ];
        assert_eq!(
            lane_ids(&intervals),
            vec![vec!["a".to_string(), "c".to_string()], vec!["b".to_string()]]
        );
    }

    #[test]
    fn packs_in_start_order_and_reuses_earlier_lanes() {
        let intervals = [
            interval("late", day(2024, 3, 1), day(2024, 3, 5)),
            interval("long", day(2024, 1, 1), day(2024, 2, 28)),
            interval("early", day(2024, 1, 5), day(2024, 1, 6)),
            interval("tie", day(2024, 1, 5), day(2024, 1, 20)),
        ];
        assert_eq!(
            lane_ids(&intervals),
            vec![
                vec!["long".to_string(), "late".to_string()],
                vec!["early".to_string()],
                vec!["tie".to_string()],
            ]
        );
    }

    #[test]
    fn fills_the_first_lane_with_room() {
        let intervals = [
            interval("a", day(2024, 1, 1), day(2024, 1, 31)),
            interval("b", day(2024, 1, 2), day(2024, 1, 3)),
            interval("c", day(2024, 1, 10), day(2024, 1, 12)),
        ];
        assert_eq!(
            lane_ids(&intervals),
            vec![
                vec!["a".to_string()],
                vec!["b".to_string(), "c".to_string()],
            ]
        );
    }

    proptest! {
        #[test]
        fn lanes_never_hold_overlapping_intervals(
            spans in prop::collection::vec((0i64..400, 0i64..40), 0..40)
        ) {
            let base = day(2023, 1, 1);
            let intervals = spans
                .iter()
                .enumerate()
                .map(|(index, (offset, length))| {
                    let start = base + chrono::Duration::days(*offset);
                    interval(&index.to_string(), start, start + chrono::Duration::days(*length))
                })
                .collect::<Vec<_>>();

            let lanes = pack_intervals(&intervals);
            let placed: usize = lanes.iter().map(|lane| lane.intervals.len()).sum();
            prop_assert_eq!(placed, intervals.len());
            for lane in &lanes {
                for (index, left) in lane.intervals.iter().enumerate() {
                    for right in &lane.intervals[index + 1..] {
                        prop_assert!(!(left.start_date <= right.end_date && right.start_date <= left.end_date));
                    }
                }
            }
        }
    }

    #[test]
    fn window_is_none_without_intervals() {
        assert_eq!(compute_window(FilterMode::All, day(2024, 5, 15), &[], day(2024, 5, 15)), None);
    }

    #[test]
    fn current_year_window_ends_today() {
        let now = day(2024, 5, 15);
        let intervals = [interval("a", day(2024, 2, 1), day(2024, 2, 10))];
        let window = compute_window(FilterMode::Year, day(2024, 2, 1), &intervals, now).unwrap();
        assert_eq!(window, TimeWindow { start: day(2024, 1, 1), end: now });

        let past = compute_window(FilterMode::Year, day(2023, 7, 1), &intervals, now).unwrap();
        assert_eq!(past, TimeWindow { start: day(2023, 1, 1), end: day(2023, 12, 31) });
    }

    #[test]
    fn current_month_window_ends_on_saturday() {
        let intervals = [interval("a", day(2024, 5, 1), day(2024, 5, 3))];
        // Wednesday 15th -> Saturday 18th.
        let window = compute_window(FilterMode::Month, day(2024, 5, 1), &intervals, day(2024, 5, 15)).unwrap();
        assert_eq!(window, TimeWindow { start: day(2024, 5, 1), end: day(2024, 5, 18) });

        // Tuesday 28th -> Saturday June 1st, clamped to May 31st.
        let window = compute_window(FilterMode::Month, day(2024, 5, 1), &intervals, day(2024, 5, 28)).unwrap();
        assert_eq!(window.end, day(2024, 5, 31));

        // Last day of the month is not before the month end.
        let window = compute_window(FilterMode::Month, day(2024, 5, 1), &intervals, day(2024, 5, 31)).unwrap();
        assert_eq!(window.end, day(2024, 5, 31));

        let past = compute_window(FilterMode::Month, day(2024, 2, 9), &intervals, day(2024, 5, 15)).unwrap();
        assert_eq!(past, TimeWindow { start: day(2024, 2, 1), end: day(2024, 2, 29) });
    }

    #[test]
    fn all_time_window_runs_from_first_read_to_now() {
        let intervals = [
            interval("a", day(2022, 6, 1), day(2022, 6, 30)),
            interval("b", day(2021, 3, 4), day(2021, 3, 20)),
        ];
        let window = compute_window(FilterMode::All, day(2024, 1, 1), &intervals, day(2024, 5, 15)).unwrap();
        assert_eq!(window, TimeWindow { start: day(2021, 3, 4), end: day(2024, 5, 15) });
    }

    #[test]
    fn filter_uses_the_full_period_not_the_clamped_window() {
        let intervals = [
            interval("spans-in", day(2024, 4, 25), day(2024, 5, 2)),
            interval("late-may", day(2024, 5, 29), day(2024, 5, 30)),
            interval("june", day(2024, 6, 1), day(2024, 6, 3)),
        ];
        let filtered = filter_for_period(FilterMode::Month, day(2024, 5, 10), &intervals);
        let ids = filtered.iter().map(|interval| interval.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["spans-in", "late-may"]);
        assert_eq!(filter_for_period(FilterMode::All, day(2024, 5, 10), &intervals).len(), 3);
    }

    #[test]
    fn year_filter_keeps_reads_crossing_new_year() {
        let intervals = vec![
            interval("autumn-2023", day(2023, 10, 1), day(2023, 11, 15)),
            interval("over-new-year", day(2023, 12, 20), day(2024, 1, 4)),
            interval("new-years-eve", day(2024, 12, 31), day(2025, 1, 2)),
            interval("spring-2025", day(2025, 3, 1), day(2025, 3, 9)),
        ];

        let ids_for = |reference: NaiveDate| {
            filter_for_period(FilterMode::Year, reference, &intervals)
                .into_iter()
                .map(|interval| interval.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(ids_for(day(2024, 7, 1)), vec!["over-new-year", "new-years-eve"]);
        assert_eq!(ids_for(day(2023, 1, 1)), vec!["autumn-2023", "over-new-year"]);
        assert_eq!(ids_for(day(2025, 12, 31)), vec!["new-years-eve", "spring-2025"]);
    }

    #[test]
    fn default_zoom_front_loads_elapsed_time() {
        assert_eq!(compute_default_zoom(FilterMode::Year, day(2024, 1, 1), day(2024, 2, 10)), 4.0);
        assert_eq!(compute_default_zoom(FilterMode::Year, day(2024, 1, 1), day(2024, 5, 15)), 2.0);
        assert_eq!(compute_default_zoom(FilterMode::Year, day(2024, 1, 1), day(2024, 8, 1)), 4.0 / 3.0);
        assert_eq!(compute_default_zoom(FilterMode::Year, day(2024, 1, 1), day(2024, 12, 1)), 1.0);
        assert_eq!(compute_default_zoom(FilterMode::Year, day(2023, 1, 1), day(2024, 2, 10)), 1.0);

        assert_eq!(compute_default_zoom(FilterMode::Month, day(2024, 5, 1), day(2024, 5, 3)), 3.0);
        assert_eq!(compute_default_zoom(FilterMode::Month, day(2024, 5, 1), day(2024, 5, 8)), 2.0);
        assert_eq!(compute_default_zoom(FilterMode::Month, day(2024, 5, 1), day(2024, 5, 30)), 1.0);
        assert_eq!(compute_default_zoom(FilterMode::Month, day(2024, 4, 1), day(2024, 5, 3)), 1.0);

        assert_eq!(compute_default_zoom(FilterMode::All, day(2024, 5, 1), day(2024, 5, 3)), 1.0);
    }

    #[test]
    fn manual_zoom_is_bounded_and_reset_on_retarget() {
        let now = day(2024, 11, 20);
        let mut zoom = ZoomState::new(FilterMode::Month, day(2024, 10, 1), now);
        assert_eq!(zoom.level(), 1.0);
        for _ in 0..10 {
            zoom.zoom_in();
        }
        assert_eq!(zoom.level(), 3.0);
        zoom.zoom_out();
        assert_eq!(zoom.level(), 2.5);

        assert!(!zoom.retarget(FilterMode::Month, day(2024, 10, 1), now));
        assert_eq!(zoom.level(), 2.5);

        assert!(zoom.retarget(FilterMode::Year, day(2023, 10, 1), now));
        assert_eq!(zoom.level(), 1.0);
        for _ in 0..20 {
            zoom.zoom_in();
        }
        assert_eq!(zoom.level(), 6.0);
        for _ in 0..20 {
            zoom.zoom_out();
        }
        assert_eq!(zoom.level(), 1.0);

        assert!(zoom.retarget(FilterMode::Month, day(2024, 11, 1), now));
        // 20th -> week index 2 -> 4/3.
        assert_eq!(zoom.level(), 4.0 / 3.0);
    }

    #[test]
    fn viewport_maps_dates_to_columns() {
        let window = TimeWindow {
            start: day(2024, 1, 1),
            end: day(2024, 1, 10),
        };
        let viewport = TimelineViewport::new(window, 1.0, 0);
        assert_eq!(viewport.visible_days(), 10);
        let first_day = interval("a", day(2024, 1, 1), day(2024, 1, 1));
        assert_eq!(viewport.columns_for(&first_day, 20), Some((0, 1)));
        let tail = interval("b", day(2023, 12, 20), day(2024, 1, 10));
        assert_eq!(viewport.columns_for(&tail, 20), Some((0, 19)));

        let zoomed = TimelineViewport::new(window, 2.0, 99);
        assert_eq!(zoomed.visible_days(), 5);
        assert_eq!(zoomed.offset_days(), 5);
        assert_eq!(zoomed.visible_start(), day(2024, 1, 6));
        assert_eq!(zoomed.columns_for(&first_day, 20), None);
    }
}
