//! RRULE expansion (RFC 5545 §3.3.10).
//!
//! The rule is walked one FREQ period at a time: the first period contains
//! DTSTART and each following one is INTERVAL periods later. Inside a period
//! the BY* parts build the candidate set in the order BYMONTH, BYWEEKNO,
//! BYYEARDAY, BYMONTHDAY, BYDAY, BYHOUR, BYMINUTE, BYSECOND, each part either
//! expanding the set or limiting it as the RFC's table prescribes for the
//! rule's frequency. BYSETPOS then picks positions from the sorted set, and
//! COUNT and UNTIL end the stream.

use std::cmp::Ordering;
use std::collections::VecDeque;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use super::instant::{Instant, TimeContext};
use crate::rfc::ical::core::{Frequency, Recur, RecurUntil, WeekdayNum};

/// Errors raised when a rule is first expanded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpansionError {
    #[error("recurrence rule has no FREQ")]
    MissingFrequency,

    #[error("UNTIL {until} and DTSTART {start} must both be DATE or both DATE-TIME")]
    UntilTypeMismatch { until: String, start: String },

    #[error("FREQ={freq} cannot repeat a DATE start")]
    SubDailyDate { freq: Frequency },
}

/// Expansion limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionOptions {
    /// Consecutive empty FREQ periods after which the rule is treated as
    /// exhausted. Sub-daily rules jump over whole days, hours or minutes
    /// rejected by a coarser BY* part, so each jump counts once.
    pub max_idle_periods: u32,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self {
            max_idle_periods: 50_000,
        }
    }
}

/// Expands a rule from its DTSTART into a lazy, ascending stream.
///
/// The stream is infinite unless the rule has COUNT or UNTIL; callers must
/// bound it themselves otherwise.
///
/// ## Errors
/// Returns an error if the rule has no FREQ, if UNTIL and DTSTART differ in
/// value type, or if a DATE start is combined with a sub-daily frequency.
#[tracing::instrument(level = "debug", skip(context, options), fields(rule = %rule, start = %start))]
pub fn expand<'a>(
    rule: &Recur,
    start: &Instant,
    context: TimeContext<'a>,
    options: ExpansionOptions,
) -> Result<RecurrenceIter<'a>, ExpansionError> {
    let freq = rule.freq().ok_or(ExpansionError::MissingFrequency)?;
    if start.is_date() && freq < Frequency::Daily {
        return Err(ExpansionError::SubDailyDate { freq });
    }

    let until = rule.until().map(|until| match until {
        RecurUntil::Date(d) => Instant::Date(*d),
        RecurUntil::DateTime(dt) => Instant::DateTime(dt.clone()),
    });
    if let Some(until) = &until
        && until.is_date() != start.is_date()
    {
        return Err(ExpansionError::UntilTypeMismatch {
            until: until.to_string(),
            start: start.to_string(),
        });
    }

    Ok(RecurrenceIter {
        plan: Plan::new(rule, freq, start),
        start: start.clone(),
        context,
        until,
        remaining: rule.count(),
        index: 0,
        idle: 0,
        max_idle: options.max_idle_periods,
        buffer: VecDeque::new(),
        done: false,
    })
}

/// Lazy occurrence stream of one rule.
#[derive(Debug)]
pub struct RecurrenceIter<'a> {
    plan: Plan,
    start: Instant,
    context: TimeContext<'a>,
    until: Option<Instant>,
    remaining: Option<u32>,
    index: u64,
    idle: u32,
    max_idle: u32,
    buffer: VecDeque<NaiveDateTime>,
    done: bool,
}

impl Iterator for RecurrenceIter<'_> {
    type Item = Instant;

    fn next(&mut self) -> Option<Instant> {
        loop {
            if self.remaining == Some(0) {
                self.done = true;
                return None;
            }
            if let Some(local) = self.buffer.pop_front() {
                let instant = self.start.with_local(local);
                if let Some(until) = &self.until
                    && self.context.compare(&instant, until) == Ordering::Greater
                {
                    self.done = true;
                    self.buffer.clear();
                    return None;
                }
                if let Some(remaining) = &mut self.remaining {
                    *remaining -= 1;
                }
                return Some(instant);
            }
            if self.done {
                return None;
            }
            self.fill();
        }
    }
}

impl RecurrenceIter<'_> {
    /// Moves to the next period holding at least one occurrence.
    fn fill(&mut self) {
        let start = self.start.local();
        while self.buffer.is_empty() {
            let Some(period) = self.plan.period(start, self.index) else {
                tracing::debug!(index = self.index, "recurrence left the representable range");
                self.done = true;
                return;
            };
            self.index += 1;

            let mut set = self.plan.candidates(&period, start);
            self.plan.select_positions(&mut set);
            set.retain(|local| *local >= start);

            if set.is_empty() {
                self.idle += 1;
                if self.idle >= self.max_idle {
                    tracing::debug!(idle = self.idle, "recurrence stopped after idle periods");
                    self.done = true;
                    return;
                }
                // Ticks inside a rejected day, hour or minute are all empty.
                if let Period::Tick(tick) = period
                    && let Some(next) = self.plan.next_open_unit(tick)
                    && let Some(index) = self.plan.tick_index(start, next)
                {
                    self.index = self.index.max(index);
                }
            } else {
                self.idle = 0;
                self.buffer.extend(set);
            }
        }
    }
}

/// One FREQ period.
#[derive(Debug, Clone, Copy)]
enum Period {
    Year(i32),
    Month(i32, u32),
    Week(NaiveDate),
    Day(NaiveDate),
    /// Start of an hour, minute or second.
    Tick(NaiveDateTime),
}

/// The rule reduced to what the expander reads.
#[derive(Debug, Clone)]
struct Plan {
    freq: Frequency,
    interval: u32,
    wkst: chrono::Weekday,
    is_date: bool,
    by_second: Vec<u32>,
    by_minute: Vec<u32>,
    by_hour: Vec<u32>,
    by_day: Vec<WeekdayNum>,
    by_monthday: Vec<i16>,
    by_yearday: Vec<i16>,
    by_weekno: Vec<i16>,
    by_month: Vec<u32>,
    by_setpos: Vec<i16>,
}

fn widen(values: &[u8]) -> Vec<u32> {
    values.iter().map(|v| u32::from(*v)).collect()
}

impl Plan {
    fn new(rule: &Recur, freq: Frequency, start: &Instant) -> Self {
        let mut plan = Self {
            freq,
            interval: rule.interval(),
            wkst: rule.wkst().to_chrono(),
            is_date: start.is_date(),
            by_second: widen(rule.by_second()),
            by_minute: widen(rule.by_minute()),
            by_hour: widen(rule.by_hour()),
            by_day: rule.by_day().to_vec(),
            by_monthday: rule.by_monthday().to_vec(),
            by_yearday: rule.by_yearday().to_vec(),
            by_weekno: rule.by_weekno().to_vec(),
            by_month: widen(rule.by_month()),
            by_setpos: rule.by_setpos().to_vec(),
        };

        if !plan.by_yearday.is_empty()
            && matches!(freq, Frequency::Daily | Frequency::Weekly | Frequency::Monthly)
        {
            tracing::debug!(%freq, "BYYEARDAY ignored");
            plan.by_yearday.clear();
        }
        if !plan.by_weekno.is_empty() && freq != Frequency::Yearly {
            tracing::debug!(%freq, "BYWEEKNO ignored");
            plan.by_weekno.clear();
        }
        if !plan.by_monthday.is_empty() && freq == Frequency::Weekly {
            tracing::debug!(%freq, "BYMONTHDAY ignored");
            plan.by_monthday.clear();
        }
        if plan.is_date
            && !(plan.by_hour.is_empty() && plan.by_minute.is_empty() && plan.by_second.is_empty())
        {
            tracing::debug!("time parts ignored for a DATE start");
            plan.by_hour.clear();
            plan.by_minute.clear();
            plan.by_second.clear();
        }
        plan
    }

    /// The `index`-th period after the one containing `start`.
    fn period(&self, start: NaiveDateTime, index: u64) -> Option<Period> {
        let step = index.checked_mul(u64::from(self.interval))?;
        let signed = i64::try_from(step).ok()?;
        Some(match self.freq {
            Frequency::Yearly => {
                let year = i64::from(start.year()).checked_add(signed)?;
                Period::Year(i32::try_from(year).ok()?)
            }
            Frequency::Monthly => {
                let months = i64::from(start.year()) * 12 + i64::from(start.month0());
                let months = months.checked_add(signed)?;
                let year = i32::try_from(months.div_euclid(12)).ok()?;
                let month = u32::try_from(months.rem_euclid(12)).ok()? + 1;
                Period::Month(year, month)
            }
            Frequency::Weekly => {
                let first = week_start(start.date(), self.wkst)?;
                Period::Week(first.checked_add_days(Days::new(step.checked_mul(7)?))?)
            }
            Frequency::Daily => Period::Day(start.date().checked_add_days(Days::new(step))?),
            Frequency::Hourly => {
                let base = start.date().and_hms_opt(start.hour(), 0, 0)?;
                Period::Tick(base.checked_add_signed(TimeDelta::try_hours(signed)?)?)
            }
            Frequency::Minutely => {
                let base = start.date().and_hms_opt(start.hour(), start.minute(), 0)?;
                Period::Tick(base.checked_add_signed(TimeDelta::try_minutes(signed)?)?)
            }
            Frequency::Secondly => {
                Period::Tick(start.checked_add_signed(TimeDelta::try_seconds(signed)?)?)
            }
        })
    }

    /// Start of the day, hour or minute after `tick` when a coarser limit
    /// rejects the unit `tick` lies in.
    fn next_open_unit(&self, tick: NaiveDateTime) -> Option<NaiveDateTime> {
        let day = tick.date();
        if self.limit_day(day).is_none() {
            return day.succ_opt().map(|next| next.and_time(NaiveTime::MIN));
        }
        let hour = day.and_hms_opt(tick.hour(), 0, 0)?;
        if self.freq < Frequency::Hourly
            && !self.by_hour.is_empty()
            && !self.by_hour.contains(&tick.hour())
        {
            return hour.checked_add_signed(TimeDelta::hours(1));
        }
        if self.freq == Frequency::Secondly
            && !self.by_minute.is_empty()
            && !self.by_minute.contains(&tick.minute())
        {
            let minute = day.and_hms_opt(tick.hour(), tick.minute(), 0)?;
            return minute.checked_add_signed(TimeDelta::minutes(1));
        }
        None
    }

    /// Index of the first tick period at or after `target`.
    fn tick_index(&self, start: NaiveDateTime, target: NaiveDateTime) -> Option<u64> {
        let Period::Tick(first) = self.period(start, 0)? else {
            return None;
        };
        let unit: i64 = match self.freq {
            Frequency::Hourly => 3_600,
            Frequency::Minutely => 60,
            Frequency::Secondly => 1,
            _ => return None,
        };
        let step = unit.checked_mul(i64::from(self.interval))?;
        let offset = target.signed_duration_since(first).num_seconds();
        u64::try_from(offset.checked_add(step - 1)?.div_euclid(step)).ok()
    }

    /// Sorted, de-duplicated candidates of one period.
    fn candidates(&self, period: &Period, start: NaiveDateTime) -> Vec<NaiveDateTime> {
        let times = self.times(period, start);
        let mut out: Vec<NaiveDateTime> = self
            .days(period, start.date())
            .into_iter()
            .flat_map(|day| times.iter().map(move |t| day.and_time(*t)))
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    fn select_positions(&self, set: &mut Vec<NaiveDateTime>) {
        if self.by_setpos.is_empty() || set.is_empty() {
            return;
        }
        let len = u32::try_from(set.len()).unwrap_or(u32::MAX);
        let mut picked: Vec<NaiveDateTime> = self
            .by_setpos
            .iter()
            .filter_map(|pos| resolve_ordinal(*pos, len))
            .filter_map(|n| set.get(usize::try_from(n - 1).ok()?).copied())
            .collect();
        picked.sort_unstable();
        picked.dedup();
        *set = picked;
    }

    fn times(&self, period: &Period, start: NaiveDateTime) -> Vec<NaiveTime> {
        if self.is_date {
            return vec![NaiveTime::MIN];
        }
        let or_start = |values: &[u32], fallback: u32| {
            if values.is_empty() {
                vec![fallback]
            } else {
                values.to_vec()
            }
        };
        let keeps = |values: &[u32], value: u32| values.is_empty() || values.contains(&value);

        let (hours, minutes, seconds) = match (self.freq, period) {
            (Frequency::Hourly, Period::Tick(t)) => {
                if !keeps(&self.by_hour, t.hour()) {
                    return Vec::new();
                }
                (
                    vec![t.hour()],
                    or_start(&self.by_minute, start.minute()),
                    or_start(&self.by_second, start.second()),
                )
            }
            (Frequency::Minutely, Period::Tick(t)) => {
                if !keeps(&self.by_hour, t.hour()) || !keeps(&self.by_minute, t.minute()) {
                    return Vec::new();
                }
                (
                    vec![t.hour()],
                    vec![t.minute()],
                    or_start(&self.by_second, start.second()),
                )
            }
            (_, Period::Tick(t)) => {
                if !keeps(&self.by_hour, t.hour())
                    || !keeps(&self.by_minute, t.minute())
                    || !keeps(&self.by_second, t.second())
                {
                    return Vec::new();
                }
                (vec![t.hour()], vec![t.minute()], vec![t.second()])
            }
            _ => (
                or_start(&self.by_hour, start.hour()),
                or_start(&self.by_minute, start.minute()),
                or_start(&self.by_second, start.second()),
            ),
        };

        let mut out = Vec::with_capacity(hours.len() * minutes.len() * seconds.len());
        for h in &hours {
            for m in &minutes {
                for s in &seconds {
                    // A BYSECOND of 60 has no wall-clock value.
                    if let Some(t) = NaiveTime::from_hms_opt(*h, *m, *s) {
                        out.push(t);
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }

    fn days(&self, period: &Period, start: NaiveDate) -> Vec<NaiveDate> {
        let mut days = match period {
            Period::Year(year) => self.year_days(*year, start),
            Period::Month(year, month) => self.month_days(*year, *month, start),
            Period::Week(first) => self.week_days(*first, start),
            Period::Day(day) => self.limit_day(*day).into_iter().collect(),
            Period::Tick(t) => self.limit_day(t.date()).into_iter().collect(),
        };
        days.sort_unstable();
        days.dedup();
        days
    }

    fn in_months(&self, day: NaiveDate) -> bool {
        self.by_month.is_empty() || self.by_month.contains(&day.month())
    }

    /// Span that BYDAY ordinals count in when BYDAY limits.
    fn ordinal_span(&self, day: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        if self.freq == Frequency::Yearly && self.by_month.is_empty() {
            year_span(day.year())
        } else {
            month_span(day.year(), day.month())
        }
    }

    fn matches_by_day(&self, day: NaiveDate) -> bool {
        if self.by_day.is_empty() {
            return true;
        }
        self.ordinal_span(day)
            .is_some_and(|(first, last)| by_day_matches(day, first, last, &self.by_day))
    }

    fn matches_monthday(&self, day: NaiveDate) -> bool {
        if self.by_monthday.is_empty() {
            return true;
        }
        let len = month_len(day.year(), day.month());
        self.by_monthday
            .iter()
            .any(|n| resolve_ordinal(*n, len) == Some(day.day()))
    }

    fn matches_yearday(&self, day: NaiveDate) -> bool {
        if self.by_yearday.is_empty() {
            return true;
        }
        let len = year_len(day.year());
        self.by_yearday
            .iter()
            .any(|n| resolve_ordinal(*n, len) == Some(day.ordinal()))
    }

    fn matches_weekno(&self, day: NaiveDate) -> bool {
        if self.by_weekno.is_empty() {
            return true;
        }
        let Some((week, total)) = week_number(day, self.wkst) else {
            return false;
        };
        self.by_weekno
            .iter()
            .any(|n| resolve_ordinal(*n, total) == Some(week))
    }

    /// Limit checks for a single day (DAILY and finer periods).
    fn limit_day(&self, day: NaiveDate) -> Option<NaiveDate> {
        (self.in_months(day)
            && self.matches_yearday(day)
            && self.matches_monthday(day)
            && self.matches_by_day(day))
        .then_some(day)
    }

    fn week_days(&self, first: NaiveDate, start: NaiveDate) -> Vec<NaiveDate> {
        first
            .iter_days()
            .take(7)
            .filter(|day| {
                if self.by_day.is_empty() {
                    day.weekday() == start.weekday()
                } else {
                    self.by_day.iter().any(|wd| wd.weekday.to_chrono() == day.weekday())
                }
            })
            .filter(|day| self.in_months(*day))
            .collect()
    }

    fn month_days(&self, year: i32, month: u32, start: NaiveDate) -> Vec<NaiveDate> {
        if !self.by_month.is_empty() && !self.by_month.contains(&month) {
            return Vec::new();
        }
        let Some((first, last)) = month_span(year, month) else {
            return Vec::new();
        };

        if !self.by_monthday.is_empty() {
            monthdays(year, month, &self.by_monthday)
                .into_iter()
                .filter(|day| self.by_day.is_empty() || by_day_matches(*day, first, last, &self.by_day))
                .collect()
        } else if !self.by_day.is_empty() {
            expand_by_day(first, last, &self.by_day)
        } else {
            NaiveDate::from_ymd_opt(year, month, start.day())
                .into_iter()
                .collect()
        }
    }

    fn year_days(&self, year: i32, start: NaiveDate) -> Vec<NaiveDate> {
        let months: Vec<u32> = if self.by_month.is_empty() {
            (1..=12).collect()
        } else {
            self.by_month.clone()
        };

        if !self.by_yearday.is_empty() {
            let len = year_len(year);
            self.by_yearday
                .iter()
                .filter_map(|n| resolve_ordinal(*n, len))
                .filter_map(|n| NaiveDate::from_yo_opt(year, n))
                .filter(|day| {
                    self.in_months(*day)
                        && self.matches_weekno(*day)
                        && self.matches_monthday(*day)
                        && self.matches_by_day(*day)
                })
                .collect()
        } else if !self.by_monthday.is_empty() {
            months
                .iter()
                .flat_map(|month| monthdays(year, *month, &self.by_monthday))
                .filter(|day| self.matches_weekno(*day) && self.matches_by_day(*day))
                .collect()
        } else if !self.by_weekno.is_empty() {
            let Some((first, last)) = year_span(year) else {
                return Vec::new();
            };
            first
                .iter_days()
                .take_while(|day| *day <= last)
                .filter(|day| {
                    self.matches_weekno(*day)
                        && self.in_months(*day)
                        && (self.by_day.is_empty()
                            || self
                                .by_day
                                .iter()
                                .any(|wd| wd.weekday.to_chrono() == day.weekday()))
                })
                .collect()
        } else if !self.by_day.is_empty() {
            if self.by_month.is_empty() {
                year_span(year)
                    .map(|(first, last)| expand_by_day(first, last, &self.by_day))
                    .unwrap_or_default()
            } else {
                months
                    .iter()
                    .filter_map(|month| month_span(year, *month))
                    .flat_map(|(first, last)| expand_by_day(first, last, &self.by_day))
                    .collect()
            }
        } else if !self.by_month.is_empty() {
            months
                .iter()
                .filter_map(|month| NaiveDate::from_ymd_opt(year, *month, start.day()))
                .collect()
        } else {
            NaiveDate::from_ymd_opt(year, start.month(), start.day())
                .into_iter()
                .collect()
        }
    }
}

/// Resolves a 1-based ordinal that may count from the end (`-1` is last).
fn resolve_ordinal(n: i16, len: u32) -> Option<u32> {
    let magnitude = u32::from(n.unsigned_abs());
    if magnitude == 0 || magnitude > len {
        None
    } else if n > 0 {
        Some(magnitude)
    } else {
        Some(len + 1 - magnitude)
    }
}

fn month_span(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

fn year_span(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

fn month_len(year: i32, month: u32) -> u32 {
    month_span(year, month).map_or(0, |(_, last)| last.day())
}

fn year_len(year: i32) -> u32 {
    year_span(year).map_or(0, |(_, last)| last.ordinal())
}

fn monthdays(year: i32, month: u32, by_monthday: &[i16]) -> Vec<NaiveDate> {
    let len = month_len(year, month);
    by_monthday
        .iter()
        .filter_map(|n| resolve_ordinal(*n, len))
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .collect()
}

fn week_start(day: NaiveDate, wkst: chrono::Weekday) -> Option<NaiveDate> {
    let back = (day.weekday().num_days_from_monday() + 7 - wkst.num_days_from_monday()) % 7;
    day.checked_sub_days(Days::new(u64::from(back)))
}

/// First day of week 1: the week (starting on `wkst`) holding at least four
/// days of the year.
fn first_week_start(year: i32, wkst: chrono::Weekday) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let start = week_start(jan1, wkst)?;
    if jan1.signed_duration_since(start).num_days() <= 3 {
        Some(start)
    } else {
        start.checked_add_days(Days::new(7))
    }
}

/// Week number of a day and the number of weeks in its week-numbering year.
fn week_number(day: NaiveDate, wkst: chrono::Weekday) -> Option<(u32, u32)> {
    let mut year = day.year();
    if day < first_week_start(year, wkst)? {
        year -= 1;
    } else if day >= first_week_start(year + 1, wkst)? {
        year += 1;
    }
    let first = first_week_start(year, wkst)?;
    let next = first_week_start(year + 1, wkst)?;
    let week = day.signed_duration_since(first).num_days() / 7 + 1;
    let total = next.signed_duration_since(first).num_days() / 7;
    Some((u32::try_from(week).ok()?, u32::try_from(total).ok()?))
}

/// Every day in `[first, last]` matching a BYDAY entry; an ordinal picks the
/// nth such weekday of the span.
fn expand_by_day(first: NaiveDate, last: NaiveDate, by_day: &[WeekdayNum]) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    for wd in by_day {
        let weekday = wd.weekday.to_chrono();
        let matching: Vec<NaiveDate> = first
            .iter_days()
            .take_while(|day| *day <= last)
            .filter(|day| day.weekday() == weekday)
            .collect();
        match wd.ordinal {
            None => out.extend(matching),
            Some(n) => {
                let len = u32::try_from(matching.len()).unwrap_or(0);
                if let Some(day) = resolve_ordinal(n, len)
                    .and_then(|i| matching.get(usize::try_from(i - 1).ok()?).copied())
                {
                    out.push(day);
                }
            }
        }
    }
    out
}

fn by_day_matches(day: NaiveDate, first: NaiveDate, last: NaiveDate, by_day: &[WeekdayNum]) -> bool {
    by_day.iter().any(|wd| {
        if wd.weekday.to_chrono() != day.weekday() {
            return false;
        }
        match wd.ordinal {
            None => true,
            Some(n) if n > 0 => day.signed_duration_since(first).num_days() / 7 + 1 == i64::from(n),
            Some(n) => last.signed_duration_since(day).num_days() / 7 + 1 == -i64::from(n),
        }
    })
}

#[cfg(test)]
#[path = "recur_tests.rs"]
mod tests;
