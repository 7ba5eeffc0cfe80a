//! Database connection URLs.
//!
//! Accepted form:
//!
//! ```text
//! scheme[+driver]://[user[:password]@]host[:port][/database][?key=value&...]
//! ```
//!
//! File-backed backends use an empty authority (`sqlite:///app.db`,
//! `sqlite://` for an in-memory database). User, password and database may
//! carry `%XX` escapes and are stored decoded. The password never appears in
//! `Display` or `Debug` output.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ConfigError, Result};

fn scheme_regex() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| {
        Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?P<rest>.*)$")
            .unwrap_or_else(|e| unreachable!("scheme pattern is valid: {e}"))
    })
}

/// A parsed, validated connection URL.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseUrl {
    scheme: String,
    user: Option<String>,
    password: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    params: Vec<(String, String)>,
}

impl DatabaseUrl {
    /// Parse and validate a connection URL.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(ConfigError::invalid_url("database URL is empty").into());
        }
        if input.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid_url("database URL contains whitespace").into());
        }

        let caps = scheme_regex().captures(input).ok_or_else(|| {
            ConfigError::invalid_url("database URL must look like scheme://...")
        })?;
        let scheme = caps["scheme"].to_ascii_lowercase();
        let rest = &caps["rest"];

        if scheme.starts_with('+') || scheme.ends_with('+') || scheme.matches('+').count() > 1 {
            return Err(ConfigError::invalid_url(format!("malformed scheme \"{}\"", scheme)).into());
        }

        let (userinfo, remainder) = split_userinfo(rest);
        let (hostport, path, query) = split_location(remainder);

        let (user, password) = match userinfo {
            Some(info) => {
                let (user, password) = match info.split_once(':') {
                    Some((u, p)) => (u, Some(percent_decode(p, "password")?)),
                    None => (info, None),
                };
                if user.is_empty() {
                    return Err(ConfigError::invalid_url("user name before '@' is empty").into());
                }
                (Some(percent_decode(user, "user name")?), password)
            }
            None => (None, None),
        };

        let (host, port) = parse_host_port(hostport)?;
        if userinfo.is_some() && host.is_none() {
            return Err(ConfigError::invalid_url("credentials given without a host").into());
        }

        let database = match path.filter(|p| !p.is_empty()) {
            Some(p) => Some(percent_decode(p, "database")?),
            None => None,
        };
        let params = match query {
            Some(q) => parse_params(q)?,
            None => Vec::new(),
        };

        Ok(Self {
            scheme,
            user,
            password,
            host,
            port,
            database,
            params,
        })
    }

    /// Full scheme, including any `+driver` suffix.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Backend name: the scheme without its driver suffix.
    pub fn backend(&self) -> &str {
        self.scheme
            .split_once('+')
            .map_or(self.scheme.as_str(), |(backend, _)| backend)
    }

    /// Driver suffix, if the scheme has one (`postgresql+asyncpg` -> `asyncpg`).
    pub fn driver(&self) -> Option<&str> {
        self.scheme.split_once('+').map(|(_, driver)| driver)
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Database name, or file path for file-backed backends.
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Query parameters in the order they appeared.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// First value of a query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render the URL with the password masked.
    pub fn redacted(&self) -> String {
        let mut out = format!("{}://", self.scheme);
        if let Some(user) = &self.user {
            out.push_str(&percent_encode(user, USERINFO_RESERVED));
            if self.password.is_some() {
                out.push_str(":***");
            }
            out.push('@');
        }
        if let Some(host) = &self.host {
            if host.contains(':') {
                out.push_str(&format!("[{}]", host));
            } else {
                out.push_str(host);
            }
        }
        if let Some(port) = self.port {
            out.push_str(&format!(":{}", port));
        }
        if let Some(db) = &self.database {
            out.push('/');
            out.push_str(&percent_encode(db, PATH_RESERVED));
        }
        if !self.params.is_empty() {
            let q: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            out.push('?');
            out.push_str(&q.join("&"));
        }
        out
    }
}

/// Split off `user[:password]@`.
///
/// The user name stops at the first `:`, `/` or `@`; a password runs to the
/// next `@`, so it may contain `/`, `?` or `:`.
fn split_userinfo(rest: &str) -> (Option<&str>, &str) {
    let Some(stop) = rest.find([':', '/', '@']) else {
        return (None, rest);
    };
    let at = match rest.as_bytes()[stop] {
        b'@' => Some(stop),
        b':' => rest[stop..].find('@').map(|i| stop + i),
        _ => None,
    };
    match at {
        Some(at) => (Some(&rest[..at]), &rest[at + 1..]),
        None => (None, rest),
    }
}

/// Split `host[:port][/database][?query]`.
fn split_location(remainder: &str) -> (&str, Option<&str>, Option<&str>) {
    let (location, query) = match remainder.split_once('?') {
        Some((loc, q)) => (loc, Some(q)),
        None => (remainder, None),
    };
    match location.split_once('/') {
        Some((hostport, path)) => (hostport, Some(path), query),
        None => (location, None, query),
    }
}

const USERINFO_RESERVED: &[u8] = b":@/?#%[]";
const PATH_RESERVED: &[u8] = b"?#%";

/// Decode `%XX` escapes. A `%` not followed by two hex digits is kept as is.
fn percent_decode(raw: &str, what: &str) -> Result<String> {
    if !raw.contains('%') {
        return Ok(raw.to_string());
    }
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out)
        .map_err(|_| ConfigError::invalid_url(format!("{} is not valid UTF-8 once decoded", what)).into())
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Escape `reserved` bytes, whitespace, and non-ASCII as `%XX`.
fn percent_encode(raw: &str, reserved: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    for &b in raw.as_bytes() {
        if reserved.contains(&b) || b.is_ascii_whitespace() || b.is_ascii_control() || !b.is_ascii() {
            out.push_str(&format!("%{:02X}", b));
        } else {
            out.push(b as char);
        }
    }
    out
}

fn parse_host_port(hostport: &str) -> Result<(Option<String>, Option<u16>)> {
    if hostport.is_empty() {
        return Ok((None, None));
    }

    // Bracketed IPv6 literal: [::1]:5432
    if let Some(stripped) = hostport.strip_prefix('[') {
        let (host, tail) = stripped
            .split_once(']')
            .ok_or_else(|| ConfigError::invalid_url("unterminated IPv6 host literal"))?;
        if host.is_empty() {
            return Err(ConfigError::invalid_url("empty IPv6 host literal").into());
        }
        let port = match tail {
            "" => None,
            t => match t.strip_prefix(':') {
                Some(p) => Some(parse_port(p)?),
                None => {
                    return Err(
                        ConfigError::invalid_url("unexpected text after IPv6 host").into()
                    );
                }
            },
        };
        return Ok((Some(host.to_string()), port));
    }

    let (host, port) = match hostport.rsplit_once(':') {
        Some((h, p)) => (h, Some(parse_port(p)?)),
        None => (hostport, None),
    };
    if host.is_empty() {
        return Err(ConfigError::invalid_url("port given without a host").into());
    }
    Ok((Some(host.to_string()), port))
}

fn parse_port(raw: &str) -> Result<u16> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::invalid_url(format!("invalid port \"{}\"", raw)).into());
    }
    raw.parse::<u16>()
        .map_err(|_| ConfigError::invalid_url(format!("port {} is out of range", raw)).into())
}

fn parse_params(query: &str) -> Result<Vec<(String, String)>> {
    let mut params = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            ConfigError::invalid_url(format!("query parameter \"{}\" has no value", pair))
        })?;
        if key.is_empty() {
            return Err(ConfigError::invalid_url("query parameter with empty name").into());
        }
        params.push((key.to_string(), value.to_string()));
    }
    Ok(params)
}

impl FromStr for DatabaseUrl {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DatabaseUrl").field(&self.redacted()).finish()
    }
}

/// Mask the password of a raw URL string for logging.
///
/// Falls back to a placeholder when the string does not parse, since an
/// unparseable value may still contain a secret.
pub fn redact(raw: &str) -> String {
    DatabaseUrl::parse(raw).map_or_else(|_| "<invalid database url>".to_string(), |u| u.redacted())
}
