use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use statlite_core::device::{DeviceType, OsFamily};
use statlite_core::hit::Hit;
use statlite_core::report::DateRange;
use statlite_duckdb::DuckDbBackend;

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 15, 0).unwrap()
}

fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
        NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
    )
    .unwrap()
}

fn hit(visitor: &str, page: &str, referrer: Option<&str>, when: DateTime<Utc>) -> Hit {
    hit_on(visitor, page, referrer, DeviceType::Desktop, OsFamily::Linux, when)
}

fn hit_on(
    visitor: &str,
    page: &str,
    referrer: Option<&str>,
    device: DeviceType,
    os: OsFamily,
    when: DateTime<Utc>,
) -> Hit {
    Hit {
        visitor_hash: visitor.to_string(),
        page_path: page.to_string(),
        referrer: referrer.map(str::to_string),
        user_agent_hash: "ua-hash".to_string(),
        device_type: device,
        os,
        hit_date: when,
    }
}

/// Two hits aggregated, one still raw: totals must cover both sides.
#[tokio::test]
async fn summary_merges_rollups_with_the_raw_tail() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.insert_hits(&[
        hit("v1", "/", None, at(2025, 6, 1, 9)),
        hit("v2", "/", None, at(2025, 6, 1, 10)),
    ])
    .await
    .expect("insert");
    db.aggregate_hits().await.expect("aggregate");

    db.insert_hits(&[hit("v3", "/", None, at(2025, 6, 2, 11))])
        .await
        .expect("insert raw tail");

    let summary = db
        .get_summary(range((2025, 6, 1), (2025, 6, 2)))
        .await
        .expect("summary");
    assert_eq!(summary.total_hits, 3);
    assert_eq!(summary.unique_visitors, 3);
}

#[tokio::test]
async fn summary_respects_range_bounds() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.insert_hits(&[
        hit("v1", "/", None, at(2025, 6, 1, 9)),
        hit("v2", "/", None, at(2025, 6, 5, 9)),
    ])
    .await
    .expect("insert");

    let summary = db
        .get_summary(range((2025, 6, 1), (2025, 6, 3)))
        .await
        .expect("summary");
    assert_eq!(summary.total_hits, 1);
}

#[tokio::test]
async fn trends_cover_both_sources_in_date_order() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.insert_hits(&[
        hit("v1", "/", None, at(2025, 6, 1, 9)),
        hit("v2", "/", None, at(2025, 6, 1, 10)),
    ])
    .await
    .expect("insert");
    db.aggregate_hits().await.expect("aggregate");
    db.insert_hits(&[hit("v3", "/", None, at(2025, 6, 3, 8))])
        .await
        .expect("insert raw");

    let trends = db
        .get_daily_trends(range((2025, 6, 1), (2025, 6, 3)))
        .await
        .expect("trends");
    assert_eq!(trends.len(), 2);
    assert_eq!(trends[0].date, "2025-06-01");
    assert_eq!(trends[0].hits, 2);
    assert_eq!(trends[1].date, "2025-06-03");
    assert_eq!(trends[1].hits, 1);
}

#[tokio::test]
async fn top_pages_rank_by_hits_and_honor_the_limit() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.insert_hits(&[
        hit("v1", "/a", None, at(2025, 6, 1, 9)),
        hit("v2", "/a", None, at(2025, 6, 1, 9)),
        hit("v3", "/a", None, at(2025, 6, 1, 9)),
        hit("v1", "/b", None, at(2025, 6, 1, 10)),
        hit("v2", "/b", None, at(2025, 6, 1, 10)),
        hit("v1", "/c", None, at(2025, 6, 1, 11)),
    ])
    .await
    .expect("insert");
    db.aggregate_hits().await.expect("aggregate");
    // One more raw hit for /b: merged counts must include it.
    db.insert_hits(&[hit("v4", "/b", None, at(2025, 6, 1, 20))])
        .await
        .expect("insert raw");

    let pages = db
        .get_top_pages(range((2025, 6, 1), (2025, 6, 1)), 2)
        .await
        .expect("pages");
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].page_path, "/a");
    assert_eq!(pages[0].hits, 3);
    assert_eq!(pages[1].page_path, "/b");
    assert_eq!(pages[1].hits, 3);
}

#[tokio::test]
async fn referrers_label_direct_traffic() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.insert_hits(&[
        hit("v1", "/", Some("Google"), at(2025, 6, 1, 9)),
        hit("v2", "/", Some("Google"), at(2025, 6, 1, 9)),
        hit("v3", "/", None, at(2025, 6, 1, 9)),
    ])
    .await
    .expect("insert");
    db.aggregate_hits().await.expect("aggregate");

    let referrers = db
        .get_top_referrers(range((2025, 6, 1), (2025, 6, 1)), 10)
        .await
        .expect("referrers");
    assert_eq!(referrers.len(), 2);
    assert_eq!(referrers[0].referrer, "Google");
    assert_eq!(referrers[0].hits, 2);
    assert_eq!(referrers[1].referrer, "Direct");
    assert_eq!(referrers[1].hits, 1);
}

#[tokio::test]
async fn device_breakdown_reads_the_raw_window() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    db.insert_hits(&[
        hit_on("v1", "/", None, DeviceType::Mobile, OsFamily::Android, at(2025, 6, 1, 9)),
        hit_on("v2", "/", None, DeviceType::Mobile, OsFamily::Ios, at(2025, 6, 1, 9)),
        hit_on("v3", "/", None, DeviceType::Desktop, OsFamily::Windows, at(2025, 6, 1, 9)),
    ])
    .await
    .expect("insert");

    let devices = db
        .get_device_breakdown(range((2025, 6, 1), (2025, 6, 1)))
        .await
        .expect("devices");
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].label, "Mobile");
    assert_eq!(devices[0].hits, 2);

    let os = db
        .get_os_breakdown(range((2025, 6, 1), (2025, 6, 1)))
        .await
        .expect("os");
    assert_eq!(os.len(), 3);
}

#[tokio::test]
async fn hourly_histogram_is_24_zero_filled_points() {
    let db = DuckDbBackend::open_in_memory().expect("db");
    let now = Utc::now();
    db.insert_hits(&[
        hit("v1", "/", None, now),
        hit("v2", "/", None, now - Duration::hours(2)),
        // Outside the trailing window, must not appear.
        hit("v3", "/", None, now - Duration::hours(30)),
    ])
    .await
    .expect("insert");

    let points = db.get_hourly_histogram().await.expect("histogram");
    assert_eq!(points.len(), 24);
    let total: u64 = points.iter().map(|p| p.hits).sum();
    assert_eq!(total, 2);
    assert_eq!(points.last().unwrap().hits, 1, "current hour holds the newest hit");
}
