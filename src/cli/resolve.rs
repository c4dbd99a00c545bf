//! Turns command-line arguments and the config file into a connection and
//! a query. No network I/O happens here.

use crate::cli::Args;
use crate::config::template;
use crate::config::{Config, ConfigError, StoredQuery};
use crate::format::OutputMode;
use crate::graylog::Connection;
use crate::search::{HostTimezone, SearchQuery, SearchRange, Sort, SortOrder};
use std::time::Duration;

/// Environment variable consulted for the password.
pub const PASSWORD_ENV: &str = "GRAYTAIL_PASSWORD";

/// Values read from the process environment.
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Env {
    pub fn from_process() -> Self {
        Self {
            user: std::env::var("USER")
                .or_else(|_| std::env::var("USERNAME"))
                .ok(),
            password: std::env::var(PASSWORD_ENV).ok(),
        }
    }
}

/// Where to connect, and the timezone if one is configured explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub connection: Connection,
    pub timezone: Option<HostTimezone>,
}

/// Pick the node (`--node`, then `--host`, then `default_node`) and fill in
/// credentials.
pub fn resolve_target(args: &Args, config: &Config, env: &Env) -> Result<Target, ConfigError> {
    let (mut connection, node_username, node_password, timezone) = if let Some(name) = &args.node {
        let node = config.node(name)?;
        node_connection(node)
    } else if let Some(host) = &args.host {
        let connection = Connection {
            host: host.clone(),
            port: args.port,
            endpoint: args.endpoint.clone(),
            tls: args.tls,
            username: String::new(),
            password: String::new(),
            proxy: None,
            timeout: Duration::from_secs(crate::config::types::DEFAULT_TIMEOUT_SECS),
        };
        (connection, None, None, None)
    } else if let Some(node) = config.default_node() {
        node_connection(node)
    } else {
        return Err(ConfigError::Invalid(
            "No host or node configuration specified and no default found.".into(),
        ));
    };

    if args.proxy.is_some() {
        connection.proxy = args.proxy.clone();
    }

    connection.username = args
        .username
        .clone()
        .or(node_username)
        .or_else(|| env.user.clone())
        .ok_or_else(|| ConfigError::Invalid("no username given; pass --username".into()))?;

    connection.password = args
        .password
        .clone()
        .or_else(|| env.password.clone())
        .or(node_password)
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "no password for {}@{}; pass --password or set {}",
                connection.username, connection.host, PASSWORD_ENV
            ))
        })?;

    Ok(Target {
        connection,
        timezone,
    })
}

type NodeParts = (Connection, Option<String>, Option<String>, Option<HostTimezone>);

fn node_connection(node: &crate::config::Node) -> NodeParts {
    let connection = Connection {
        host: node.host.clone(),
        port: node.port,
        endpoint: node.endpoint.clone(),
        tls: node.tls,
        username: String::new(),
        password: String::new(),
        proxy: node.proxy.clone(),
        timeout: node.timeout,
    };
    (
        connection,
        node.username.clone(),
        node.password.clone(),
        node.timezone,
    )
}

/// Query to run plus the fields the formatter displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedQuery {
    pub query: SearchQuery,
    pub fields: Vec<String>,
}

/// Build the query. A `:name` query argument selects a stored query whose
/// values take precedence over the command-line defaults.
pub fn resolve_query(
    args: &Args,
    config: &Config,
    timezone: HostTimezone,
) -> Result<ResolvedQuery, ConfigError> {
    let stored = match args.query.strip_prefix(':') {
        Some(name) => {
            let values = template::parse_options(&args.template_options)?;
            config.query(name)?.render(&values)?
        }
        None => StoredQuery {
            query: args.query.clone(),
            ..StoredQuery::default()
        },
    };

    let from = stored.from.as_deref().unwrap_or(&args.search_from);
    let to = stored.to.as_deref().or(args.search_to.as_deref());
    let range = SearchRange::parse(from, to, timezone)
        .map_err(|e| ConfigError::Invalid(format!("invalid search range: {}", e)))?;

    let limit = stored.limit.unwrap_or(args.limit);
    let limit = usize::try_from(limit).ok().filter(|l| *l > 0);

    let sort = stored.sort.or_else(|| args.sort.clone()).map(|field| Sort {
        field,
        order: if stored.ascending.unwrap_or(args.asc) {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        },
    });

    let fields = stored.fields.unwrap_or_else(|| args.fields.clone());
    let stream = stored.stream.or_else(|| args.stream.clone());

    let requested: Vec<String> = match args.mode() {
        OutputMode::Json => Vec::new(),
        OutputMode::Tail => fields
            .iter()
            .cloned()
            .chain(std::iter::once("level".to_string()))
            .collect(),
        OutputMode::Dump => fields.clone(),
    };

    let query = SearchQuery::new(range, stored.query)
        .with_limit(limit)
        .with_stream(stream.as_deref())
        .with_fields(requested)
        .with_sort(sort);

    Ok(ResolvedQuery { query, fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Node;
    use crate::search::TimeSpec;
    use chrono::TimeDelta;
    use clap::Parser;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["graytail"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    fn node(name: &str) -> Node {
        Node {
            name: name.into(),
            host: format!("{}.example.com", name),
            port: 9000,
            endpoint: "/api".into(),
            tls: true,
            username: Some("svc".into()),
            password: Some("from-config".into()),
            timezone: None,
            proxy: None,
            timeout: Duration::from_secs(10),
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.nodes.insert("prod".into(), node("prod"));
        config.nodes.insert("dev".into(), node("dev"));
        config.default_node = Some("prod".into());
        config.queries.insert(
            "errors".into(),
            StoredQuery {
                query: "level:<=3 AND source:${host}".into(),
                limit: Some(0),
                from: Some("1 hour ago".into()),
                fields: Some(vec!["message".into(), "source".into()]),
                sort: Some("timestamp".into()),
                ascending: Some(true),
                ..StoredQuery::default()
            },
        );
        config
    }

    #[test]
    fn test_no_target_is_config_error() {
        let err = resolve_target(&args(&[]), &Config::default(), &Env::default()).unwrap_err();
        assert!(err.to_string().contains("No host or node configuration"));
    }

    #[test]
    fn test_default_node_used() {
        let target = resolve_target(&args(&[]), &config(), &Env::default()).unwrap();
        assert_eq!(target.connection.host, "prod.example.com");
        assert_eq!(target.connection.username, "svc");
        assert_eq!(target.connection.password, "from-config");
        assert_eq!(target.connection.base_url(), "https://prod.example.com:9000/api");
    }

    #[test]
    fn test_named_node_and_overrides() {
        let env = Env {
            user: Some("me".into()),
            password: Some("from-env".into()),
        };
        let target =
            resolve_target(&args(&["--node", "dev", "-u", "bob", "--proxy", "http://p:3128"]), &config(), &env)
                .unwrap();
        assert_eq!(target.connection.host, "dev.example.com");
        assert_eq!(target.connection.username, "bob");
        assert_eq!(target.connection.password, "from-env");
        assert_eq!(target.connection.proxy.as_deref(), Some("http://p:3128"));
    }

    #[test]
    fn test_unknown_node() {
        let err = resolve_target(&args(&["--node", "prdo"]), &config(), &Env::default()).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownName { .. }));
    }

    #[test]
    fn test_ad_hoc_host() {
        let env = Env {
            user: Some("me".into()),
            password: Some("pw".into()),
        };
        let target = resolve_target(&args(&["-H", "localhost", "--tls", "--port", "443"]), &config(), &env)
            .unwrap();
        assert_eq!(target.connection.base_url(), "https://localhost:443");
        assert_eq!(target.connection.username, "me");
        assert_eq!(target.timezone, None);
    }

    #[test]
    fn test_missing_password() {
        let env = Env {
            user: Some("me".into()),
            password: None,
        };
        let err = resolve_target(&args(&["-H", "localhost"]), &Config::default(), &env).unwrap_err();
        assert!(err.to_string().contains(PASSWORD_ENV));
    }

    #[test]
    fn test_plain_query() {
        let resolved = resolve_query(&args(&["-n", "25", "-r", "s1", "source:db"]), &config(), HostTimezone::Utc)
            .unwrap();
        let q = &resolved.query;
        assert_eq!(q.query(), "source:db");
        assert_eq!(q.limit(), Some(25));
        assert_eq!(q.filter(), Some("streams:s1"));
        assert_eq!(q.range().from(), TimeSpec::Relative(TimeDelta::seconds(-300)));
        assert_eq!(q.range().to(), None);
        assert_eq!(q.fields(), &["message".to_string(), "level".to_string()]);
        assert_eq!(resolved.fields, vec!["message"]);
        assert!(q.sort().is_none());
    }

    #[test]
    fn test_non_positive_limit_is_unbounded() {
        let resolved = resolve_query(&args(&["-n", "-1"]), &config(), HostTimezone::Utc).unwrap();
        assert_eq!(resolved.query.limit(), None);
    }

    #[test]
    fn test_json_mode_requests_all_fields() {
        let resolved = resolve_query(&args(&["-j", "-e", "source"]), &config(), HostTimezone::Utc).unwrap();
        assert!(resolved.query.fields().is_empty());
    }

    #[test]
    fn test_stored_query() {
        let resolved = resolve_query(
            &args(&["-d", "-x", "host=db-1", ":errors"]),
            &config(),
            HostTimezone::Utc,
        )
        .unwrap();
        let q = &resolved.query;
        assert_eq!(q.query(), "level:<=3 AND source:db-1");
        assert_eq!(q.limit(), None);
        assert_eq!(q.range().from(), TimeSpec::Relative(TimeDelta::seconds(-3_600)));
        let sort = q.sort().unwrap();
        assert_eq!(sort.field, "timestamp");
        assert_eq!(sort.order, SortOrder::Ascending);
        assert_eq!(resolved.fields, vec!["message", "source"]);
    }

    #[test]
    fn test_stored_query_missing_template_value() {
        let err = resolve_query(&args(&[":errors"]), &config(), HostTimezone::Utc).unwrap_err();
        assert!(matches!(err, ConfigError::Template { .. }));
    }

    #[test]
    fn test_invalid_range() {
        let err = resolve_query(&args(&["-@", "last tuesday"]), &config(), HostTimezone::Utc).unwrap_err();
        assert!(err.to_string().contains("invalid search range"));
    }
}
