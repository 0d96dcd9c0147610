//! Default httpd limits per version and MPM, merged with the on-disk config

use crate::error::{CheckError, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Tunable directives of the httpd MPM modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Tunable {
    StartServers,
    MinSpareServers,
    MaxSpareServers,
    MinSpareThreads,
    MaxSpareThreads,
    ThreadsPerChild,
    ThreadLimit,
    ServerLimit,
    MaxClients,
    MaxRequestWorkers,
    MaxRequestsPerChild,
    MaxConnectionsPerChild,
}

impl Tunable {
    pub const ALL: [Tunable; 12] = [
        Tunable::StartServers,
        Tunable::MinSpareServers,
        Tunable::MaxSpareServers,
        Tunable::MinSpareThreads,
        Tunable::MaxSpareThreads,
        Tunable::ThreadsPerChild,
        Tunable::ThreadLimit,
        Tunable::ServerLimit,
        Tunable::MaxClients,
        Tunable::MaxRequestWorkers,
        Tunable::MaxRequestsPerChild,
        Tunable::MaxConnectionsPerChild,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tunable::StartServers => "StartServers",
            Tunable::MinSpareServers => "MinSpareServers",
            Tunable::MaxSpareServers => "MaxSpareServers",
            Tunable::MinSpareThreads => "MinSpareThreads",
            Tunable::MaxSpareThreads => "MaxSpareThreads",
            Tunable::ThreadsPerChild => "ThreadsPerChild",
            Tunable::ThreadLimit => "ThreadLimit",
            Tunable::ServerLimit => "ServerLimit",
            Tunable::MaxClients => "MaxClients",
            Tunable::MaxRequestWorkers => "MaxRequestWorkers",
            Tunable::MaxRequestsPerChild => "MaxRequestsPerChild",
            Tunable::MaxConnectionsPerChild => "MaxConnectionsPerChild",
        }
    }

    /// Directive names are case-insensitive in httpd.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name().eq_ignore_ascii_case(name))
    }

    /// The per-child request cap may be 0, meaning unlimited.
    pub fn zero_allowed(self) -> bool {
        matches!(self, Tunable::MaxRequestsPerChild | Tunable::MaxConnectionsPerChild)
    }
}

impl fmt::Display for Tunable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Deprecated directive → current directive.
pub const RENAMES: &[(Tunable, Tunable)] = &[
    (Tunable::MaxClients, Tunable::MaxRequestWorkers),
    (Tunable::MaxRequestsPerChild, Tunable::MaxConnectionsPerChild),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyModel {
    /// One process per connection.
    Prefork,
    /// Pools of threaded processes (worker, event, eventopt).
    Threaded,
}

impl ConcurrencyModel {
    pub fn from_mpm(mpm: &str) -> Result<Self> {
        match mpm.to_ascii_lowercase().as_str() {
            "prefork" => Ok(ConcurrencyModel::Prefork),
            "worker" | "event" | "eventopt" => Ok(ConcurrencyModel::Threaded),
            _ => Err(CheckError::UnsupportedConcurrencyModel(mpm.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Naming {
    /// `MaxClients` / `MaxRequestsPerChild`
    Legacy,
    /// `MaxRequestWorkers` / `MaxConnectionsPerChild`
    Current,
}

impl Naming {
    pub fn worker_cap(self) -> Tunable {
        match self {
            Naming::Legacy => Tunable::MaxClients,
            Naming::Current => Tunable::MaxRequestWorkers,
        }
    }
}

#[derive(Debug, Clone)]
struct ProfileDefaults {
    naming: Naming,
    tunables: BTreeMap<Tunable, u64>,
}

/// Built-in defaults keyed by `(major, minor)` and concurrency model.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: BTreeMap<((u32, u32), ConcurrencyModel), ProfileDefaults>,
}

impl ProfileTable {
    /// The defaults documented upstream for httpd 2.2 and 2.4.
    pub fn builtin() -> Self {
        use Tunable::*;

        let mut profiles = BTreeMap::new();
        let mut add = |version: (u32, u32), model, naming: Naming, values: &[(Tunable, u64)]| {
            let tunables = values.iter().copied().collect();
            profiles.insert((version, model), ProfileDefaults { naming, tunables });
        };

        add((2, 2), ConcurrencyModel::Prefork, Naming::Legacy, &[
            (StartServers, 5),
            (MinSpareServers, 5),
            (MaxSpareServers, 10),
            (ServerLimit, 256),
            (MaxClients, 256),
            (MaxRequestsPerChild, 10000),
        ]);
        add((2, 2), ConcurrencyModel::Threaded, Naming::Legacy, &[
            (StartServers, 3),
            (MinSpareThreads, 75),
            (MaxSpareThreads, 250),
            (ThreadsPerChild, 25),
            (ServerLimit, 16),
            (ThreadLimit, 64),
            (MaxClients, 400),
            (MaxRequestsPerChild, 10000),
        ]);
        add((2, 4), ConcurrencyModel::Prefork, Naming::Current, &[
            (StartServers, 5),
            (MinSpareServers, 5),
            (MaxSpareServers, 10),
            (ServerLimit, 256),
            (MaxRequestWorkers, 256),
            (MaxConnectionsPerChild, 0),
        ]);
        add((2, 4), ConcurrencyModel::Threaded, Naming::Current, &[
            (StartServers, 3),
            (MinSpareThreads, 75),
            (MaxSpareThreads, 250),
            (ThreadsPerChild, 25),
            (ServerLimit, 16),
            (ThreadLimit, 64),
            (MaxRequestWorkers, 400),
            (MaxConnectionsPerChild, 0),
        ]);

        Self { profiles }
    }

    /// Pick the profile for `version`: exact match, else the oldest profile
    /// when `version` predates it (with a note), else the newest profile
    /// below `version`. Versions newer than every profile are unsupported.
    fn select(
        &self,
        version: (u32, u32),
        model: ConcurrencyModel,
        notes: &mut Vec<String>,
    ) -> Result<((u32, u32), &ProfileDefaults)> {
        let candidates: Vec<_> = self
            .profiles
            .iter()
            .filter(|((_, m), _)| *m == model)
            .map(|((v, _), defaults)| (*v, defaults))
            .collect();
        let unsupported = || CheckError::UnsupportedVersion { major: version.0, minor: version.1 };

        if let Some(exact) = candidates.iter().find(|(v, _)| *v == version) {
            return Ok(*exact);
        }
        let (oldest, newest) = match (candidates.first(), candidates.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(unsupported()),
        };
        if version < oldest.0 {
            let note = format!(
                "httpd {}.{} is older than the oldest supported profile, using {}.{} defaults",
                version.0, version.1, oldest.0 .0, oldest.0 .1
            );
            info!("{}", note);
            notes.push(note);
            return Ok(oldest);
        }
        if version > newest.0 {
            return Err(unsupported());
        }
        candidates
            .into_iter()
            .filter(|(v, _)| *v < version)
            .last()
            .ok_or_else(unsupported)
    }
}

/// The effective tunables for the detected version and MPM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigProfile {
    pub version: (u32, u32),
    pub mpm: String,
    pub model: ConcurrencyModel,
    pub naming: Naming,
    pub tunables: BTreeMap<Tunable, u64>,
}

impl ConfigProfile {
    pub fn get(&self, tunable: Tunable) -> Option<u64> {
        self.tunables.get(&tunable).copied()
    }

    pub fn effective_limits(&self) -> EffectiveLimits {
        let worker_cap = self.naming.worker_cap();
        match self.model {
            ConcurrencyModel::Prefork => EffectiveLimits {
                model: self.model,
                bounding: worker_cap,
                cap: self.get(worker_cap).unwrap_or(0),
                threads_per_process: 1,
                worker_cap_tunable: worker_cap,
            },
            ConcurrencyModel::Threaded => EffectiveLimits {
                model: self.model,
                bounding: Tunable::ServerLimit,
                cap: self.get(Tunable::ServerLimit).unwrap_or(0),
                threads_per_process: self.get(Tunable::ThreadsPerChild).unwrap_or(1),
                worker_cap_tunable: worker_cap,
            },
        }
    }
}

/// The one tunable that bounds how many httpd processes can run at once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectiveLimits {
    pub model: ConcurrencyModel,
    /// Worker cap for prefork, `ServerLimit` for threaded models.
    pub bounding: Tunable,
    pub cap: u64,
    pub threads_per_process: u64,
    /// Name of the worker-count directive for this profile.
    pub worker_cap_tunable: Tunable,
}

impl EffectiveLimits {
    /// Request-handling units available at the cap, saturating at `u64::MAX`.
    pub fn workers(&self) -> u64 {
        self.cap.saturating_mul(self.threads_per_process)
    }
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub profile: ConfigProfile,
    /// Informational, non-fatal messages (fallbacks, renames, derivations).
    pub notes: Vec<String>,
}

/// Resolve defaults for `version`/`mpm` and apply the overrides found in the
/// MPM's `<IfModule>` block of `config_text`.
pub fn resolve(
    table: &ProfileTable,
    version: (u32, u32),
    mpm: &str,
    config_text: &str,
) -> Result<Resolution> {
    let model = ConcurrencyModel::from_mpm(mpm)?;
    let mut notes = Vec::new();
    let (profile_version, defaults) = table.select(version, model, &mut notes)?;
    let naming = defaults.naming;

    let mut explicit = match directive_block(config_text, mpm) {
        Some(block) => parse_directives(&block, |t| {
            defaults.tunables.contains_key(&t)
                || (naming == Naming::Current && RENAMES.iter().any(|(old, _)| *old == t))
        }),
        None => {
            let note = format!("no <IfModule> block for {} found, using defaults", mpm);
            info!("{}", note);
            notes.push(note);
            BTreeMap::new()
        }
    };

    if naming == Naming::Current {
        migrate_renamed(&mut explicit, &mut notes);
    }

    let mut tunables = defaults.tunables.clone();
    tunables.extend(explicit.iter().map(|(t, v)| (*t, *v)));

    if model == ConcurrencyModel::Threaded {
        let cap = naming.worker_cap();
        if let (Some(&workers), None) = (explicit.get(&cap), explicit.get(&Tunable::ServerLimit)) {
            let threads = tunables.get(&Tunable::ThreadsPerChild).copied().unwrap_or(0);
            if let Some(limit) = workers.checked_div(threads) {
                let limit = limit.max(1);
                let note = format!(
                    "ServerLimit not set, derived {} from {} {} / ThreadsPerChild {}",
                    limit, cap, workers, threads
                );
                info!("{}", note);
                notes.push(note);
                tunables.insert(Tunable::ServerLimit, limit);
            }
        }
    }

    for (tunable, value) in &tunables {
        if *value == 0 && !tunable.zero_allowed() {
            return Err(CheckError::InvalidConfiguration { tunable: tunable.name(), value: *value });
        }
    }

    Ok(Resolution {
        profile: ConfigProfile {
            version: profile_version,
            mpm: mpm.to_ascii_lowercase(),
            model,
            naming,
            tunables,
        },
        notes,
    })
}

/// Move deprecated directives to their current names. A current name set
/// explicitly in the block wins over its deprecated alias.
fn migrate_renamed(explicit: &mut BTreeMap<Tunable, u64>, notes: &mut Vec<String>) {
    for &(old, new) in RENAMES {
        let Some(value) = explicit.remove(&old) else { continue };
        let note = if explicit.contains_key(&new) {
            format!("both {} and {} are set, ignoring {}", old, new, old)
        } else {
            explicit.insert(new, value);
            format!("{} is deprecated, using its value {} for {}", old, value, new)
        };
        info!("{}", note);
        notes.push(note);
    }
}

/// Lines of the first `<IfModule mpm>` block, without the markers.
pub fn directive_block(config_text: &str, mpm: &str) -> Option<Vec<String>> {
    let open = Regex::new(&format!(
        r"(?i)^\s*<IfModule\s+(?:mpm_)?{}(?:\.c|_module)\s*>",
        regex::escape(mpm)
    ))
    .ok()?;
    let close = Regex::new(r"(?i)^\s*</IfModule\s*>").ok()?;

    let mut lines = config_text.lines();
    lines.by_ref().find(|line| open.is_match(line))?;
    Some(
        lines
            .take_while(|line| !close.is_match(line))
            .map(str::to_string)
            .collect(),
    )
}

fn parse_directives(lines: &[String], known: impl Fn(Tunable) -> bool) -> BTreeMap<Tunable, u64> {
    let mut values = BTreeMap::new();
    for line in lines {
        let mut words = line.split_whitespace();
        let (Some(name), Some(raw), None) = (words.next(), words.next(), words.next()) else {
            continue;
        };
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            continue;
        }
        let Ok(value) = raw.parse::<u64>() else { continue };
        match Tunable::from_name(name).filter(|t| known(*t)) {
            Some(tunable) => {
                debug!("config sets {} {}", tunable, value);
                values.insert(tunable, value);
            }
            None => debug!("ignoring directive {}", name),
        }
    }
    values
}
