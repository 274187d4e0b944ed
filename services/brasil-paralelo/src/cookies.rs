use std::io::ErrorKind;
use std::path::Path;

use reqwest::Url;
use reqwest::cookie::Jar;
use tracing::warn;

use crate::error::{Result, ServiceError};

/// Default location of the exported browser cookies.
pub const DEFAULT_COOKIES_PATH: &str = "Cookies/BRASIL_PARALELO/default.txt";

/// A single cookie from a Netscape `cookies.txt` export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    pub name: String,
    pub value: String,
}

impl Cookie {
    /**
        `Set-Cookie` form of this cookie, and the URL it is set from.

        Cookies for a leading-dot domain or with the subdomain flag get a
        `Domain` attribute, the rest stay host-only.
    */
    fn to_set_cookie(&self) -> Option<(String, Url)> {
        let host = self.domain.trim_start_matches('.');
        let scheme = if self.secure { "https" } else { "http" };
        let path = if self.path.starts_with('/') { self.path.as_str() } else { "/" };
        let url = Url::parse(&format!("{scheme}://{host}{path}")).ok()?;

        let mut header = format!("{}={}; Path={path}", self.name, self.value);
        if self.include_subdomains || self.domain.starts_with('.') {
            header.push_str(&format!("; Domain={host}"));
        }
        if self.secure {
            header.push_str("; Secure");
        }
        Some((header, url))
    }
}

/**
    Cookies loaded from a Netscape-format file, the format browser export
    extensions produce.
*/
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    /**
        Load cookies from `path`. A missing file is an authentication
        error telling the user where to export their cookies.
    */
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ServiceError::Auth(path.display().to_string()),
            _ => ServiceError::Cookies {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        })?;
        let jar = Self::parse(&content);
        if jar.is_empty() {
            return Err(ServiceError::Cookies {
                path: path.display().to_string(),
                reason: "no cookies found in file".into(),
            });
        }
        Ok(jar)
    }

    /**
        Parse `cookies.txt` content. Comment lines are skipped, except
        `#HttpOnly_` entries which are real cookies. Lines without the
        seven tab-separated fields are ignored.
    */
    pub fn parse(content: &str) -> Self {
        let cookies = content
            .lines()
            .filter_map(|line| {
                let line = line.trim_end_matches('\r');
                let line = match line.strip_prefix("#HttpOnly_") {
                    Some(rest) => rest,
                    None if line.starts_with('#') => return None,
                    None => line,
                };
                let fields: Vec<&str> = line.split('\t').collect();
                let [domain, subdomains, path, secure, _expires, name, value] = fields[..] else {
                    return None;
                };
                Some(Cookie {
                    domain: domain.to_string(),
                    include_subdomains: subdomains.eq_ignore_ascii_case("TRUE"),
                    path: path.to_string(),
                    secure: secure.eq_ignore_ascii_case("TRUE"),
                    name: name.to_string(),
                    value: value.to_string(),
                })
            })
            .collect();
        Self { cookies }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /**
        Add every cookie to `jar`, keeping its domain, path and secure flag
        so the client only sends it where the browser would.
    */
    pub fn add_to(&self, jar: &Jar) {
        for cookie in &self.cookies {
            match cookie.to_set_cookie() {
                Some((header, url)) => jar.add_cookie_str(&header, &url),
                None => warn!(domain = %cookie.domain, name = %cookie.name, "skipping cookie with invalid domain"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::cookie::CookieStore;

    use super::*;

    const COOKIES: &str = "# Netscape HTTP Cookie File\n\
        .brasilparalelo.com.br\tTRUE\t/\tFALSE\t1999999999\tsession\tabc123\n\
        #HttpOnly_plataforma.brasilparalelo.com.br\tFALSE\t/\tFALSE\t1999999999\ttoken\txyz\n\
        plataforma.brasilparalelo.com.br\tFALSE\t/account\tTRUE\t0\tsecret\tv\n\
        other.example.com\tFALSE\t/\tFALSE\t0\tignored\t1\n\
        malformed line\n";

    fn cookie_names(jar: &Jar, url: &str) -> Vec<String> {
        let Some(header) = jar.cookies(&Url::parse(url).unwrap()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = header
            .to_str()
            .unwrap()
            .split("; ")
            .map(|pair| pair.split('=').next().unwrap().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn parses_netscape_format() {
        let jar = CookieJar::parse(COOKIES);
        assert_eq!(jar.len(), 4);
        assert_eq!(
            jar.cookies[2],
            Cookie {
                domain: "plataforma.brasilparalelo.com.br".into(),
                include_subdomains: false,
                path: "/account".into(),
                secure: true,
                name: "secret".into(),
                value: "v".into(),
            }
        );
    }

    #[test]
    fn jar_matches_domain_and_subdomains() {
        let jar = Jar::default();
        CookieJar::parse(COOKIES).add_to(&jar);

        assert_eq!(
            cookie_names(&jar, "https://plataforma.brasilparalelo.com.br/"),
            ["session", "token"]
        );
        assert_eq!(
            cookie_names(&jar, "https://stream.brasilparalelo.com.br/x/stream.mpd"),
            ["session"]
        );
        assert_eq!(cookie_names(&jar, "https://brasilparalelo.com.br/"), ["session"]);
        assert!(cookie_names(&jar, "https://evilbrasilparalelo.com.br/").is_empty());
    }

    #[test]
    fn jar_honours_path_and_secure() {
        let jar = Jar::default();
        CookieJar::parse(COOKIES).add_to(&jar);

        assert_eq!(
            cookie_names(&jar, "https://plataforma.brasilparalelo.com.br/account/profile"),
            ["secret", "session", "token"]
        );
        assert_eq!(
            cookie_names(&jar, "http://plataforma.brasilparalelo.com.br/account/profile"),
            ["session", "token"]
        );
        assert_eq!(
            cookie_names(&jar, "https://plataforma.brasilparalelo.com.br/playlists"),
            ["session", "token"]
        );
    }

    #[test]
    fn missing_file_asks_for_export() {
        let err = CookieJar::load(Path::new("/nonexistent/cookies.txt")).unwrap_err();
        match err {
            ServiceError::Auth(path) => assert_eq!(path, "/nonexistent/cookies.txt"),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn load_rejects_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "# Netscape HTTP Cookie File\n").unwrap();
        let err = CookieJar::load(file.path()).unwrap_err();
        assert!(matches!(err, ServiceError::Cookies { .. }));
    }
}
