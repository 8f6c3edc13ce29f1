use crate::event::Dated;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

/// Returns the nearest event strictly after `reference`.
///
/// This is a single linear scan over `events`, the input doesn't have to be sorted.
/// Events without timestamp are skipped.
/// If several events share the nearest timestamp, the first one wins.
///
/// Returns `None` if `events` is empty or all of them are at or before `reference`.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use next_event::select_next;
///
/// let races = [
///     Utc.with_ymd_and_hms(2023, 11, 19, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2023, 11, 26, 0, 0, 0).unwrap(),
/// ];
/// let now = Utc.with_ymd_and_hms(2023, 11, 20, 0, 0, 0).unwrap();
///
/// assert_eq!(select_next(&races, &now), Some(&races[1]));
/// ```
pub fn select_next<'a, T, I, Tz>(events: I, reference: &DateTime<Tz>) -> Option<&'a T>
where
    T: Dated + 'a,
    I: IntoIterator<Item = &'a T>,
    Tz: TimeZone,
{
    let reference = reference.with_timezone(&Utc);
    let mut best: Option<(&'a T, TimeDelta)> = None;

    for event in events {
        let Some(at) = event.occurs_at() else {
            continue;
        };

        let delta = at - reference;
        if delta > TimeDelta::zero() && best.map_or(true, |(_, best_delta)| delta < best_delta) {
            best = Some((event, delta));
        }
    }

    best.map(|(event, _)| event)
}

/// Returns the latest event which happened within `window` before `reference`, both bounds inclusive.
///
/// Same rules as for [`select_next`]: unsorted input, events without timestamp are skipped, first one wins on ties.
pub fn select_recent<'a, T, I, Tz>(events: I, reference: &DateTime<Tz>, window: TimeDelta) -> Option<&'a T>
where
    T: Dated + 'a,
    I: IntoIterator<Item = &'a T>,
    Tz: TimeZone,
{
    let reference = reference.with_timezone(&Utc);
    let mut best: Option<(&'a T, TimeDelta)> = None;

    for event in events {
        let Some(at) = event.occurs_at() else {
            continue;
        };

        let age = reference - at;
        if age >= TimeDelta::zero() && age <= window && best.map_or(true, |(_, best_age)| age < best_age) {
            best = Some((event, age));
        }
    }

    best.map(|(event, _)| event)
}

/// Returns all events strictly after `reference`, earliest first.
///
/// Events with equal timestamps keep their original order,
/// so the first item is always the same as [`select_next`] returns.
pub fn upcoming<'a, T, I, Tz>(events: I, reference: &DateTime<Tz>) -> Vec<&'a T>
where
    T: Dated + 'a,
    I: IntoIterator<Item = &'a T>,
    Tz: TimeZone,
{
    let reference = reference.with_timezone(&Utc);
    let mut upcoming: Vec<(&'a T, DateTime<Utc>)> = events
        .into_iter()
        .filter_map(|event| {
            let at = event.occurs_at()?;
            (at > reference).then_some((event, at))
        })
        .collect();

    upcoming.sort_by_key(|(_, at)| *at);
    upcoming.into_iter().map(|(event, _)| event).collect()
}
