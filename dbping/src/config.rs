use std::path::PathBuf;

use anyhow::Context as _;
use dbping_mysql::{ConnectOptions, TlsConfig};
use ini::Ini;

use crate::cli::Cli;

/// Settings that can come from the command line, the environment or `.my.cnf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Setting {
    Host,
    Port,
    User,
    Password,
    Database,
    CaCert,
    Insecure,
}

impl Setting {
    fn env_var(self) -> Option<&'static str> {
        match self {
            Self::Host => Some("DB_HOST"),
            Self::Port => Some("DB_PORT"),
            Self::User => Some("DB_USER"),
            Self::Password => Some("DB_PASSWORD"),
            Self::Database => Some("DB_NAME"),
            Self::CaCert | Self::Insecure => None,
        }
    }
}

/// Loaded `[client]` sections, in load order. Later files override earlier ones.
#[derive(Debug, Default)]
pub(crate) struct MyCnf {
    files: Vec<Ini>,
}

impl MyCnf {
    /// `./.my.cnf`, then `~/.my.cnf`. Missing files are skipped, unparsable ones logged.
    pub(crate) fn load_default() -> Self {
        let mut paths = vec![PathBuf::from(".my.cnf")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".my.cnf"));
        }
        Self::load(&paths)
    }

    pub(crate) fn load(paths: &[PathBuf]) -> Self {
        let files = paths
            .iter()
            .filter(|path| path.is_file())
            .filter_map(|path| match Ini::load_from_file(path) {
                Ok(ini) => Some(ini),
                Err(err) => {
                    tracing::warn!(path = %path.display(), "ignoring unreadable option file: {err}");
                    None
                }
            })
            .collect();
        Self { files }
    }

    #[cfg(test)]
    pub(crate) fn from_contents(contents: &str) -> Self {
        match Ini::load_from_str(contents) {
            Ok(ini) => Self { files: vec![ini] },
            Err(err) => panic!("invalid test option file: {err}"),
        }
    }

    /// Looks up `key`, then its dashed variant (`ca_cert` / `ca-cert`).
    fn get(&self, key: &str) -> Option<String> {
        let dashed = key.replace('_', "-");
        self.files.iter().rev().find_map(|ini| {
            let client = ini.section(Some("client"))?;
            client
                .get(key)
                .or_else(|| client.get(dashed.as_str()))
                .map(str::to_string)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Cli,
    Env,
    MyCnf,
}

/// Final connection settings plus where each non-CLI value came from.
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub connect: ConnectOptions,
    pub from_env: Vec<Setting>,
    pub from_mycnf: Vec<Setting>,
}

struct Lookup<'a, E> {
    cli: &'a Cli,
    env: E,
    mycnf: &'a MyCnf,
    from_env: Vec<Setting>,
    from_mycnf: Vec<Setting>,
}

impl<E> Lookup<'_, E>
where
    E: Fn(&str) -> Option<String>,
{
    fn get(&mut self, setting: Setting) -> Option<String> {
        let (value, source) = self.find(setting)?;
        match source {
            Source::Cli => {}
            Source::Env => self.from_env.push(setting),
            Source::MyCnf => self.from_mycnf.push(setting),
        }
        Some(value)
    }

    fn find(&self, setting: Setting) -> Option<(String, Source)> {
        if let Some(v) = cli_value(self.cli, setting) {
            return Some((v, Source::Cli));
        }
        if let Some(v) = setting
            .env_var()
            .and_then(|name| (self.env)(name))
            .filter(|v| !v.is_empty())
        {
            return Some((v, Source::Env));
        }
        self.mycnf
            .get(&setting.to_string())
            .map(|v| (v, Source::MyCnf))
    }
}

fn cli_value(cli: &Cli, setting: Setting) -> Option<String> {
    match setting {
        Setting::Host => cli.host.clone(),
        Setting::Port => cli.port.map(|p| p.to_string()),
        Setting::User => cli.user.clone(),
        Setting::Password => cli.password.clone(),
        Setting::Database => cli.database.clone(),
        Setting::CaCert => cli.ca_cert.as_ref().map(|p| p.display().to_string()),
        Setting::Insecure => cli.insecure.then(|| "true".to_string()),
    }
}

/// Resolves connection settings with precedence CLI > environment > `.my.cnf` > defaults.
pub(crate) fn resolve<E>(cli: &Cli, env: E, mycnf: &MyCnf) -> anyhow::Result<Resolved>
where
    E: Fn(&str) -> Option<String>,
{
    let mut lookup = Lookup {
        cli,
        env,
        mycnf,
        from_env: Vec::new(),
        from_mycnf: Vec::new(),
    };

    let host = lookup
        .get(Setting::Host)
        .filter(|h| !h.trim().is_empty())
        .context("no host defined (use --host, DB_HOST or host= in .my.cnf)")?;

    let mut connect = ConnectOptions::new(host.trim());
    connect.timeout = cli.timeout;

    if let Some(port) = lookup.get(Setting::Port) {
        connect.port = port
            .trim()
            .parse()
            .with_context(|| format!("invalid port '{port}'"))?;
    }
    if let Some(user) = lookup.get(Setting::User) {
        connect.user = user;
    }
    if let Some(password) = lookup.get(Setting::Password) {
        connect.password = password;
    }
    connect.database = lookup.get(Setting::Database).filter(|d| !d.is_empty());

    let ca_cert = lookup.get(Setting::CaCert).map(PathBuf::from);
    let insecure = match lookup.get(Setting::Insecure) {
        Some(v) => parse_flag(&v).with_context(|| format!("invalid insecure value '{v}'"))?,
        None => false,
    };
    if insecure && ca_cert.is_some() {
        anyhow::bail!("insecure and ca-cert cannot be used together");
    }
    connect.tls = TlsConfig { ca_cert, insecure };

    Ok(Resolved {
        connect,
        from_env: lookup.from_env,
        from_mycnf: lookup.from_mycnf,
    })
}

/// Option-file booleans: a bare key counts as set.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn describe(settings: &[Setting]) -> String {
    settings
        .iter()
        .map(Setting::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
