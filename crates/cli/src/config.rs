// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI flags, INI config file, and the resolved runtime options.
//!
//! Precedence: built-in defaults, then the config file's global section,
//! then CLI flags. Every named INI section describes one device; the
//! section name is the hostname and all keys are copied into the device's
//! option bag.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;

/// Default per-command read deadline when `commandtimeout` is not set.
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Network device backups and change alerts.
#[derive(Debug, Parser)]
#[command(name = "sweet", version, about)]
pub struct Config {
    /// Path to the INI configuration file.
    pub config: PathBuf,

    /// Workspace directory for scraped configs.
    #[arg(short, long, env = "SWEET_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Collection interval in seconds (0 = one-shot).
    #[arg(short, long, env = "SWEET_INTERVAL")]
    pub interval: Option<u64>,

    /// Concurrent device collections.
    #[arg(short, long, env = "SWEET_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Device collection timeout in seconds.
    #[arg(long, env = "SWEET_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Send change notifications to this email address.
    #[arg(short, long)]
    pub to: Option<String>,

    /// Send change notifications from this email address.
    #[arg(short, long)]
    pub from: Option<String>,

    /// SMTP server as host:port.
    #[arg(short, long)]
    pub smtp: Option<String>,

    /// Accept untrusted SSH device keys.
    #[arg(long)]
    pub insecure: bool,

    /// Push after committing changed configs.
    #[arg(long)]
    pub push: bool,

    /// Log as JSON for the system log collector instead of plain text.
    #[arg(long)]
    pub syslog: bool,

    /// Run the HTTP status server.
    #[arg(long)]
    pub web: bool,

    /// Host and port for the HTTP status server.
    #[arg(long)]
    pub weblisten: Option<String>,

    /// Optional user:pass protecting the HTTP status server.
    #[arg(long)]
    pub webauth: Option<String>,
}

/// Static access record for one device, immutable for the run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceConfig {
    /// Logical id: status-table key, workspace filename prefix, VCS path.
    pub hostname: String,
    /// Network address (the `ip` option overrides the hostname).
    pub target: String,
    /// Access method tag: `cisco`, `junos`, or `external`.
    pub method: String,
    /// Whole-job collection timeout.
    #[serde(serialize_with = "as_secs")]
    pub timeout: Duration,
    /// Read deadline for a single command's output.
    #[serde(serialize_with = "as_secs")]
    pub command_timeout: Duration,
    /// Credentials and method-specific settings; never serialized.
    #[serde(skip)]
    pub options: BTreeMap<String, String>,
}

fn as_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

impl DeviceConfig {
    /// Look up an option from the device's bag.
    pub fn opt(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn insecure(&self) -> bool {
        self.opt("insecure") == Some("true")
    }
}

/// Resolved runtime options: global settings plus the device table in
/// configuration-file order.
#[derive(Debug, Clone)]
pub struct Options {
    pub workspace: PathBuf,
    pub interval: Duration,
    pub timeout: Duration,
    pub concurrency: usize,
    pub push: bool,
    pub insecure: bool,
    pub use_syslog: bool,
    pub web_enabled: bool,
    pub web_listen: String,
    pub web_auth: Option<(String, String)>,
    pub to_email: Option<String>,
    pub from_email: Option<String>,
    pub smtp: String,
    /// Directory the process was launched from; relative external-script
    /// paths resolve against it.
    pub launch_dir: PathBuf,
    pub devices: Vec<DeviceConfig>,
}

impl Options {
    /// Build runtime options from CLI flags and the INI file contents.
    pub fn load(cli: &Config, ini_text: &str, launch_dir: PathBuf) -> anyhow::Result<Self> {
        let sections = parse_ini(ini_text)?;

        let mut opts = Options {
            workspace: PathBuf::from("./sweet-workspace"),
            interval: Duration::from_secs(300),
            timeout: Duration::from_secs(60),
            concurrency: 30,
            push: false,
            insecure: false,
            use_syslog: false,
            web_enabled: false,
            web_listen: "localhost:5000".to_owned(),
            web_auth: None,
            to_email: None,
            from_email: None,
            smtp: "localhost:25".to_owned(),
            launch_dir,
            devices: Vec::new(),
        };

        let empty = BTreeMap::new();
        let global = sections
            .iter()
            .find(|(name, _)| name.is_empty())
            .map(|(_, kv)| kv)
            .unwrap_or(&empty);

        if let Some(v) = global.get("workspace") {
            opts.workspace = PathBuf::from(v);
        }
        if let Some(v) = global.get("interval") {
            opts.interval = parse_secs("interval", v)?;
        }
        if let Some(v) = global.get("timeout") {
            opts.timeout = parse_secs("timeout", v)?;
        }
        if let Some(v) = global.get("concurrency") {
            opts.concurrency =
                v.parse().map_err(|_| anyhow::anyhow!("bad concurrency value: {v}"))?;
        }
        if let Some(v) = global.get("smtp") {
            opts.smtp = v.clone();
        }
        if let Some(v) = global.get("weblisten") {
            opts.web_listen = v.clone();
        }
        if let Some(v) = global.get("webauth") {
            opts.web_auth = Some(parse_webauth(v)?);
        }
        opts.to_email = global.get("to").cloned();
        opts.from_email = global.get("from").cloned();
        opts.insecure = global.get("insecure").map(|v| v == "true").unwrap_or(false);
        opts.push = global.get("push").map(|v| v == "true").unwrap_or(false);
        opts.use_syslog = global.get("syslog").map(|v| v == "true").unwrap_or(false);
        opts.web_enabled = global.get("web").map(|v| v == "true").unwrap_or(false);

        let default_user = global.get("default-user").cloned();
        let default_pass = global.get("default-pass").cloned();
        let default_method = global.get("default-method").cloned();

        // CLI flags override config-file values.
        if let Some(ref v) = cli.workspace {
            opts.workspace = v.clone();
        }
        if let Some(v) = cli.interval {
            opts.interval = Duration::from_secs(v);
        }
        if let Some(v) = cli.timeout {
            opts.timeout = Duration::from_secs(v);
        }
        if let Some(v) = cli.concurrency {
            opts.concurrency = v;
        }
        if let Some(ref v) = cli.smtp {
            opts.smtp = v.clone();
        }
        if let Some(ref v) = cli.weblisten {
            opts.web_listen = v.clone();
        }
        if let Some(ref v) = cli.webauth {
            opts.web_auth = Some(parse_webauth(v)?);
        }
        match (&cli.to, &cli.from) {
            (Some(to), Some(from)) => {
                opts.to_email = Some(to.clone());
                opts.from_email = Some(from.clone());
            }
            (None, None) => {}
            _ => anyhow::bail!("both --to and --from are required for email to work"),
        }
        opts.insecure |= cli.insecure;
        opts.push |= cli.push;
        opts.use_syslog |= cli.syslog;
        opts.web_enabled |= cli.web;

        if opts.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }

        // Named sections are devices, kept in file order.
        for (name, kv) in &sections {
            if name.is_empty() {
                continue;
            }
            let mut options = kv.clone();

            let method = match options.get("method").or(default_method.as_ref()) {
                Some(m) => m.clone(),
                None => anyhow::bail!("no method specified for {name} and no default-method"),
            };
            if !options.contains_key("user") {
                match &default_user {
                    Some(u) => {
                        options.insert("user".to_owned(), u.clone());
                    }
                    None => anyhow::bail!("no user specified for {name} and no default-user"),
                }
            }
            if !options.contains_key("pass") {
                match &default_pass {
                    Some(p) => {
                        options.insert("pass".to_owned(), p.clone());
                    }
                    None => anyhow::bail!("no pass specified for {name} and no default-pass"),
                }
            }
            // Enable escalation falls back to the login password.
            if !options.contains_key("enable") {
                if let Some(pass) = options.get("pass").cloned() {
                    options.insert("enable".to_owned(), pass);
                }
            }
            if opts.insecure {
                options.insert("insecure".to_owned(), "true".to_owned());
            }

            let timeout = match options.get("timeout") {
                Some(v) => parse_secs(&format!("timeout for {name}"), v)?,
                None => opts.timeout,
            };
            let command_timeout = match options.get("commandtimeout") {
                Some(v) => parse_secs(&format!("commandtimeout for {name}"), v)?,
                None => DEFAULT_COMMAND_TIMEOUT,
            };
            let target = options.get("ip").cloned().unwrap_or_else(|| name.clone());

            opts.devices.push(DeviceConfig {
                hostname: name.clone(),
                target,
                method,
                timeout,
                command_timeout,
                options,
            });
        }

        Ok(opts)
    }
}

fn parse_secs(what: &str, value: &str) -> anyhow::Result<Duration> {
    let secs: u64 = value.parse().map_err(|_| anyhow::anyhow!("bad {what} value: {value}"))?;
    Ok(Duration::from_secs(secs))
}

fn parse_webauth(value: &str) -> anyhow::Result<(String, String)> {
    match value.split_once(':') {
        Some((user, pass)) if !user.is_empty() => Ok((user.to_owned(), pass.to_owned())),
        _ => anyhow::bail!("malformed webauth value - should be username:pass"),
    }
}

/// Parse INI text into `(section name, key/value)` pairs in file order.
/// Keys before the first section header belong to the unnamed global
/// section. Lines starting with `#` or `;` are comments.
#[allow(clippy::type_complexity)]
pub fn parse_ini(text: &str) -> anyhow::Result<Vec<(String, BTreeMap<String, String>)>> {
    let mut sections: Vec<(String, BTreeMap<String, String>)> = Vec::new();
    sections.push((String::new(), BTreeMap::new()));

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("empty section name at line {}", lineno + 1);
            }
            sections.push((name.to_owned(), BTreeMap::new()));
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                let key = key.trim().to_lowercase();
                if key.is_empty() {
                    anyhow::bail!("empty key at line {}", lineno + 1);
                }
                if let Some((_, kv)) = sections.last_mut() {
                    kv.insert(key, value.trim().to_owned());
                }
            }
            None => anyhow::bail!("expected key=value at line {}: {line}", lineno + 1),
        }
    }

    Ok(sections)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
