use httpd_limits::verdict::{classify, Severity};

const RAM: f64 = 3939.0;
const SWAP_FREE: f64 = 5984.0;

#[test]
fn test_fits_in_ram() {
    let v = classify(2313.14, RAM, SWAP_FREE, 0.0);
    assert_eq!(v.severity, Severity::Ok);
    assert!(v.margin_mb < 0.0);
}

#[test]
fn test_ram_boundary_is_inclusive() {
    let v = classify(RAM, RAM, SWAP_FREE, 0.0);
    assert_eq!(v.severity, Severity::Ok);
    assert_eq!(v.margin_mb, 0.0);
}

#[test]
fn test_swap_use_without_tolerance_warns() {
    let v = classify(4754.0, RAM, SWAP_FREE, 0.0);
    assert_eq!(v.severity, Severity::Warning);
    assert_eq!(v.severity.exit_code(), 1);
}

#[test]
fn test_swap_use_within_tolerance_is_ok() {
    let v = classify(4753.0, RAM, SWAP_FREE, 20.0);
    assert_eq!(v.severity, Severity::Ok);
    assert_eq!(v.severity.exit_code(), 0);
}

#[test]
fn test_tolerance_boundary_is_inclusive() {
    // 25% of 5984 is exactly 1496.
    let v = classify(RAM + 1496.0, RAM, SWAP_FREE, 25.0);
    assert_eq!(v.severity, Severity::Ok);
    assert_eq!(v.margin_mb, 0.0);

    let v = classify(RAM + 1496.5, RAM, SWAP_FREE, 25.0);
    assert_eq!(v.severity, Severity::Warning);
}

#[test]
fn test_swap_boundary_is_inclusive() {
    let v = classify(RAM + SWAP_FREE, RAM, SWAP_FREE, 0.0);
    assert_eq!(v.severity, Severity::Warning);
    assert_eq!(v.margin_mb, 0.0);
}

#[test]
fn test_beyond_swap_is_error() {
    let v = classify(10000.0, RAM, SWAP_FREE, 0.0);
    assert_eq!(v.severity, Severity::Error);
    assert_eq!(v.severity.exit_code(), 2);
    assert_eq!(v.margin_mb, 10000.0 - 9923.0);
}

#[test]
fn test_full_tolerance_never_warns() {
    let v = classify(RAM + SWAP_FREE, RAM, SWAP_FREE, 100.0);
    assert_eq!(v.severity, Severity::Ok);
    let v = classify(RAM + SWAP_FREE + 1.0, RAM, SWAP_FREE, 100.0);
    assert_eq!(v.severity, Severity::Error);
}
