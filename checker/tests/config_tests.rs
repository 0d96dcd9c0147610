use httpd_limits::config::Config;
use httpd_limits::history::UseMax;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.general.swap_tolerance, 0);
    assert!(config.general.exe_search_paths.contains(&PathBuf::from("/usr/sbin/httpd")));
    assert_eq!(config.history.retain_days, 30);
    assert_eq!(config.history.use_max, None);
}

#[test]
fn test_load_from_toml() {
    let toml_content = r#"
[general]
swap_tolerance = 20
exe_search_paths = ["/opt/httpd/bin/httpd"]

[history]
db_path = "/var/lib/check-httpd-limits/history.sqlite"
retain_days = 7
use_max = "running"
"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml_content.as_bytes()).unwrap();
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.general.swap_tolerance, 20);
    assert_eq!(config.general.exe_search_paths, vec![PathBuf::from("/opt/httpd/bin/httpd")]);
    assert_eq!(config.history.retain_days, 7);
    assert_eq!(config.history.use_max, Some(UseMax::Running));
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[history]\nretain_days = 3\n").unwrap();
    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.history.retain_days, 3);
    assert_eq!(config.general, Config::default().general);
}

#[test]
fn test_tolerance_out_of_range() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[general]\nswap_tolerance = 150\n").unwrap();
    assert!(Config::load(file.path()).is_err());
}
