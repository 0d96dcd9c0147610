//! Locating the httpd binary and reading its build information

use crate::error::{CheckError, Result};
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

pub const DEFAULT_EXE_PATHS: &[&str] = &[
    "/usr/sbin/httpd",
    "/usr/sbin/httpd2",
    "/usr/sbin/apache2",
    "/usr/local/apache2/bin/httpd",
    "/usr/local/sbin/httpd",
    "/opt/apache2/bin/httpd",
];

/// What `httpd -V` reports about the running build.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpdInfo {
    pub root: Option<PathBuf>,
    pub config_file: PathBuf,
    pub version: (u32, u32),
    pub mpm: String,
}

/// Resolve the binary to compare against /proc/<pid>/exe.
///
/// An explicit path wins; otherwise the first existing search path is used.
pub fn locate_exe(explicit: Option<&Path>, search_paths: &[PathBuf]) -> Result<PathBuf> {
    let candidate = match explicit {
        Some(path) => path.to_path_buf(),
        None => search_paths
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .ok_or_else(|| CheckError::MalformedSource {
                what: "httpd executable",
                detail: "none of the search paths exist, use --exe".to_string(),
            })?,
    };
    let resolved = candidate
        .canonicalize()
        .map_err(|e| CheckError::unavailable("httpd executable", &candidate, e))?;
    info!("using httpd executable {}", resolved.display());
    Ok(resolved)
}

/// Run `<exe> -V` and parse its output.
pub fn query(exe: &Path) -> Result<HttpdInfo> {
    let output = Command::new(exe)
        .arg("-V")
        .output()
        .map_err(|e| CheckError::unavailable("httpd build info", exe, e))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    debug!("{} -V:\n{}", exe.display(), stdout);
    parse_build_info(&stdout)
}

pub fn parse_build_info(text: &str) -> Result<HttpdInfo> {
    let bad = |detail: &str| CheckError::MalformedSource {
        what: "httpd build info",
        detail: detail.to_string(),
    };
    let capture = |pattern: &str| -> Option<String> {
        let re = Regex::new(pattern).ok()?;
        text.lines()
            .find_map(|line| re.captures(line))
            .map(|caps| caps[1].to_string())
    };

    let root = capture(r#"^\s*-D\s+HTTPD_ROOT="([^"]+)""#).map(PathBuf::from);
    let config = capture(r#"^\s*-D\s+SERVER_CONFIG_FILE="([^"]+)""#)
        .ok_or_else(|| bad("no SERVER_CONFIG_FILE line"))?;
    let version = capture(r"^Server version:\s+\S+/(\d+\.\d+)")
        .ok_or_else(|| bad("no Server version line"))?;
    let mpm = capture(r"^Server MPM:\s+(\S+)").ok_or_else(|| bad("no Server MPM line"))?;

    let (major, minor) = version
        .split_once('.')
        .and_then(|(a, b)| Some((a.parse().ok()?, b.parse().ok()?)))
        .ok_or_else(|| bad("unparseable version"))?;

    let config_file = match (&root, Path::new(&config)) {
        (Some(root), rel) if rel.is_relative() => root.join(rel),
        (_, path) => path.to_path_buf(),
    };

    Ok(HttpdInfo {
        root,
        config_file,
        version: (major, minor),
        mpm: mpm.to_lowercase(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBIAN_V: &str = r#"Server version: Apache/2.4.41 (Ubuntu)
Server built:   2020-08-12T19:46:17
Server's Module Magic Number: 20120211:88
Architecture:   64-bit
Server MPM:     event
  threaded:     yes (fixed thread count)
Server compiled with....
 -D APR_HAS_SENDFILE
 -D HTTPD_ROOT="/etc/apache2"
 -D SERVER_CONFIG_FILE="apache2.conf"
"#;

    #[test]
    fn test_parse_relative_config_path() {
        let info = parse_build_info(DEBIAN_V).unwrap();
        assert_eq!(info.version, (2, 4));
        assert_eq!(info.mpm, "event");
        assert_eq!(info.config_file, PathBuf::from("/etc/apache2/apache2.conf"));
    }

    #[test]
    fn test_parse_absolute_config_path() {
        let text = "Server version: Apache/2.2.15 (Unix)\nServer MPM:     Prefork\n \
                    -D HTTPD_ROOT=\"/etc/httpd\"\n -D SERVER_CONFIG_FILE=\"/opt/conf/httpd.conf\"\n";
        let info = parse_build_info(text).unwrap();
        assert_eq!(info.version, (2, 2));
        assert_eq!(info.mpm, "prefork");
        assert_eq!(info.config_file, PathBuf::from("/opt/conf/httpd.conf"));
    }

    #[test]
    fn test_missing_mpm_is_an_error() {
        let text = "Server version: Apache/2.4.6\n -D SERVER_CONFIG_FILE=\"conf/httpd.conf\"\n";
        assert!(matches!(
            parse_build_info(text),
            Err(CheckError::MalformedSource { what: "httpd build info", .. })
        ));
    }

    #[test]
    fn test_locate_without_candidates() {
        let paths = vec![PathBuf::from("/nonexistent/httpd")];
        assert!(matches!(
            locate_exe(None, &paths),
            Err(CheckError::MalformedSource { what: "httpd executable", .. })
        ));
    }

    #[test]
    fn test_locate_explicit_missing_exe() {
        let err = locate_exe(Some(Path::new("/nonexistent/httpd")), &[]).unwrap_err();
        assert!(matches!(err, CheckError::ResourceUnavailable { what: "httpd executable", .. }));
    }
}
