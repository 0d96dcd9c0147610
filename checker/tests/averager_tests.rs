use httpd_limits::averager::SizeAverages;
use httpd_limits::collector::ProcessSample;

fn sample(pid: u32, parent_pid: u32, resident_mb: f64, shared_mb: f64) -> ProcessSample {
    ProcessSample { pid, name: "httpd".to_string(), parent_pid, resident_mb, shared_mb }
}

#[test]
fn test_recency_weighted_average() {
    let samples = vec![
        sample(100, 1, 12.0, 2.0),
        sample(101, 100, 10.0, 2.0),
        sample(102, 100, 20.0, 4.0),
        sample(103, 100, 40.0, 8.0),
    ];
    let sizes = SizeAverages::from_samples(&samples);

    // real: 8 -> (8 + 16) / 2 = 12 -> (12 + 32) / 2 = 22
    assert_eq!(sizes.real_avg_mb, 22.0);
    // shared: 2 -> 3 -> 5.5
    assert_eq!(sizes.shared_avg_mb, 5.5);
    assert_eq!(sizes.running_count, 3);
    // The arithmetic mean of 8, 16 and 32 would be 18.67.
    assert_ne!(sizes.real_avg_mb, (8.0 + 16.0 + 32.0) / 3.0);
}

#[test]
fn test_order_changes_the_average() {
    let forward = vec![sample(101, 100, 10.0, 0.0), sample(102, 100, 20.0, 0.0), sample(103, 100, 40.0, 0.0)];
    let mut reversed = forward.clone();
    reversed.reverse();

    let a = SizeAverages::from_samples(&forward);
    let b = SizeAverages::from_samples(&reversed);
    assert_eq!(a.real_avg_mb, 27.5);
    assert_eq!(b.real_avg_mb, 20.0);
    assert_eq!(a.real_total_mb, b.real_total_mb);
}

#[test]
fn test_total_includes_excluded_samples() {
    let samples = vec![
        sample(1, 0, 5.0, 1.0),
        sample(100, 1, 12.0, 2.0),
        sample(101, 100, 10.0, 2.0),
    ];
    let sizes = SizeAverages::from_samples(&samples);
    assert_eq!(sizes.real_total_mb, 4.0 + 10.0 + 8.0);
    assert_eq!(sizes.running_count, 1);
    // Seeded by the first non-excluded sample, not by 0.
    assert_eq!(sizes.real_avg_mb, 8.0);
    assert_eq!(sizes.shared_avg_mb, 2.0);
}

#[test]
fn test_only_excluded_samples() {
    let sizes = SizeAverages::from_samples(&[sample(100, 1, 12.0, 2.0)]);
    assert_eq!(sizes.running_count, 0);
    assert_eq!(sizes.real_avg_mb, 0.0);
    assert_eq!(sizes.real_total_mb, 10.0);
}
