use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use next_event::{parse_timestamp, select_next, source::parse_document, Dated, EventCollection, TimestampSource};
use rstest::rstest;

const SCHEDULE: &str = r#"{
    "Races": [
        {"Country": "Bahrain", "City": "Sakhir", "Race": "Mar 2 2024 15:00 UTC"},
        {"Country": "Saudi Arabia", "City": "Jeddah", "Race": "Mar 9 2024 17:00 UTC"},
        {"Country": "Australia", "City": "Melbourne", "Race": "Mar 24 2024 04:00 UTC"},
        {"Country": "Japan", "City": "Suzuka", "Race": "Apr 7 2024 05:00 UTC"},
        {"Country": "China", "City": "Shanghai", "Race": "TBA"},
        {"Country": "Miami", "City": "Miami", "Race": "May 5 2024 20:00 UTC"}
    ]
}"#;

fn races() -> EventCollection {
    parse_document(SCHEDULE, "Races", &TimestampSource::default()).unwrap()
}

fn at(input: &str) -> DateTime<Utc> {
    parse_timestamp(input).unwrap()
}

#[rstest]
#[case("2024-01-01", Some("Bahrain"))]
#[case("Mar 2 2024 14:59 UTC", Some("Bahrain"))]
#[case("Mar 2 2024 15:00 UTC", Some("Saudi Arabia"))]
#[case("2024-03-10", Some("Australia"))]
#[case("2024-04-07T05:00:00Z", Some("Miami"))]
#[case("2024-05-05T20:00:00Z", None)]
#[case("2025-01-01", None)]
fn next_race(#[case] now: &str, #[case] expected: Option<&str>) {
    let races = races();
    let next = races.next_after(&at(now));
    assert_eq!(next.and_then(|e| e.get_str("Country")), expected, "now: {now}");
}

#[test]
fn next_race_with_local_reference() {
    let races = races();
    // 2024-03-09 19:30 in Jeddah is 16:30 UTC, before the race start
    let jeddah = chrono::FixedOffset::east_opt(3 * 3600).unwrap();
    let now = jeddah.with_ymd_and_hms(2024, 3, 9, 19, 30, 0).unwrap();
    assert_eq!(races.next_after(&now).unwrap().get_str("City"), Some("Jeddah"));
}

#[test]
fn selected_event_is_the_nearest_future_one() {
    let races = races();
    for now in ["2023-12-31", "2024-03-05", "2024-03-20T12:00:00", "2024-04-30"] {
        let now = at(now);
        let next = races.next_after(&now).unwrap().occurs_at().unwrap();
        assert!(next > now);
        assert!(races
            .iter()
            .filter_map(Dated::occurs_at)
            .all(|t| t <= now || t >= next));
    }
}

#[test]
fn recent_race() {
    let races = races();
    let monday = at("2024-03-25T10:00:00Z");
    let recent = races.recent_within(&monday, TimeDelta::hours(48)).unwrap();
    assert_eq!(recent.get_str("Country"), Some("Australia"));

    let wednesday = at("2024-03-27T10:00:00Z");
    assert!(races.recent_within(&wednesday, TimeDelta::hours(48)).is_none());
}

#[test]
fn upcoming_races() {
    let races = races();
    let upcoming: Vec<&str> = races
        .upcoming_after(&at("2024-03-10"))
        .into_iter()
        .filter_map(|e| e.get_str("Country"))
        .collect();
    assert_eq!(upcoming, vec!["Australia", "Japan", "Miami"]);
}

#[test]
fn plain_timestamps() {
    let dates = [at("2023-11-19"), at("2023-11-20T00:00:01")];
    assert_eq!(select_next(&dates, &at("2023-11-20T00:00:00")), Some(&dates[1]));
    assert_eq!(select_next(&dates, &at("2023-11-21")), None);
    assert_eq!(select_next(&dates[..0], &at("2023-11-21")), None);
}
