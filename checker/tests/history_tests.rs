use httpd_limits::history::{HistoricalRecord, HistoryStore, SqliteHistory, UseMax, SECONDS_PER_DAY};
use httpd_limits::CheckError;
use tempfile::tempdir;

const NOW: i64 = 1_700_000_000;

fn record(days_ago: i64, real_avg_mb: f64, running_count: u64) -> HistoricalRecord {
    HistoricalRecord {
        timestamp: NOW - days_ago * SECONDS_PER_DAY,
        real_avg_mb,
        shared_avg_mb: 1.0,
        real_total_mb: real_avg_mb * running_count as f64,
        running_count,
    }
}

#[test]
fn test_create_database() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("nested").join("history.sqlite");
    let store = SqliteHistory::open(&db_path).unwrap();
    assert!(db_path.exists());
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_save_and_query_max() {
    let dir = tempdir().unwrap();
    let mut store = SqliteHistory::open(&dir.path().join("history.sqlite")).unwrap();
    store.save(&record(3, 20.0, 50), 30).unwrap();
    store.save(&record(2, 35.5, 10), 30).unwrap();
    store.save(&record(1, 25.0, 80), 30).unwrap();

    let since = NOW - 30 * SECONDS_PER_DAY;
    let by_avg = store.max_since(since, UseMax::RealAvg).unwrap().unwrap();
    assert_eq!(by_avg.real_avg_mb, 35.5);
    assert_eq!(by_avg.shared_avg_mb, 1.0);

    let by_running = store.max_since(since, UseMax::Running).unwrap().unwrap();
    assert_eq!(by_running.running_count, 80);
    assert_eq!(by_running.real_avg_mb, 25.0);
}

#[test]
fn test_query_window() {
    let mut store = SqliteHistory::open_in_memory().unwrap();
    store.save(&record(10, 90.0, 5), 30).unwrap();
    store.save(&record(1, 25.0, 5), 30).unwrap();

    let recent = store.max_since(NOW - 5 * SECONDS_PER_DAY, UseMax::RealAvg).unwrap().unwrap();
    assert_eq!(recent.real_avg_mb, 25.0);
    assert!(store.max_since(NOW + 1, UseMax::RealAvg).unwrap().is_none());
}

#[test]
fn test_save_prunes_beyond_retention() {
    let mut store = SqliteHistory::open_in_memory().unwrap();
    store.save(&record(40, 90.0, 5), 30).unwrap();
    store.save(&record(20, 30.0, 5), 30).unwrap();
    assert_eq!(store.count().unwrap(), 2);

    store.save(&record(0, 25.0, 5), 30).unwrap();
    assert_eq!(store.count().unwrap(), 2);
    let max = store.max_since(0, UseMax::RealAvg).unwrap().unwrap();
    assert_eq!(max.real_avg_mb, 30.0);
}

#[test]
fn test_open_under_file_reports_directory_error() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let err = SqliteHistory::open(&blocker.join("history.sqlite")).unwrap_err();
    assert!(matches!(err, CheckError::ResourceUnavailable { what: "history store", .. }));
}
