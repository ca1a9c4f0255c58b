use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, debug};
use webwalk_core::{Reporter, WalkConfig, WalkSummary, Walker};
use webwalk_scanner::{Credentials, HtmlExtractor, HttpFetcher};

/// Everything the command line says, before any validation.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub url: String,
    /// 0 means unbounded.
    pub depth: usize,
    pub excludes: Vec<String>,
    pub includes: Vec<String>,
    pub filters: Vec<String>,
    pub indent: bool,
    pub spaces_per_indent: usize,
    pub relative: bool,
    pub no_warnings: bool,
    pub verbose: u8,
    pub replicate: Option<PathBuf>,
    pub copy: Option<PathBuf>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub password_file: Option<PathBuf>,
    pub insecure: bool,
    pub timeout: u64,
    pub follow_external: bool,
    pub debug: bool,
}

impl CliOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let strings = |id: &str| -> Vec<String> {
            matches
                .get_many::<String>(id)
                .map(|values| values.cloned().collect())
                .unwrap_or_default()
        };

        Self {
            url: matches.get_one::<String>("URL").cloned().unwrap_or_default(),
            depth: matches.get_one::<usize>("depth").copied().unwrap_or(0),
            excludes: strings("exclude"),
            includes: strings("include"),
            filters: strings("filter"),
            indent: matches.get_flag("indent"),
            spaces_per_indent: matches
                .get_one::<usize>("spaces-per-indent")
                .copied()
                .unwrap_or(webwalk_core::config::DEFAULT_SPACES_PER_INDENT),
            relative: matches.get_flag("relurl"),
            no_warnings: matches.get_flag("no-warnings"),
            verbose: matches.get_count("verbose"),
            replicate: matches.get_one::<PathBuf>("replicate").cloned(),
            copy: matches.get_one::<PathBuf>("copy").cloned(),
            username: matches.get_one::<String>("username").cloned(),
            password: matches.get_one::<String>("password").cloned(),
            password_file: matches.get_one::<PathBuf>("password-file").cloned(),
            insecure: matches.get_flag("insecure"),
            timeout: matches.get_one::<u64>("timeout").copied().unwrap_or(10),
            follow_external: matches.get_flag("follow-external"),
            debug: matches.get_flag("debug"),
        }
    }
}

pub fn init_tracing(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Expand a leading `~` in a user supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

/// Turn the username/password options into credentials.
///
/// With a username but no password, the password is read from `input`
/// after writing a prompt to `prompt`.
pub fn resolve_credentials<R: BufRead, W: Write>(
    options: &CliOptions,
    input: R,
    prompt: W,
) -> Result<Option<Credentials>> {
    credentials_with(options, |username| read_password(username, input, prompt))
}

/// Credentials for an interactive run. A missing password is prompted for
/// on the terminal without echo, or read as a line when stdin is not a
/// terminal.
pub fn prompt_credentials(options: &CliOptions) -> Result<Option<Credentials>> {
    if io::stdin().is_terminal() {
        credentials_with(options, |username| {
            rpassword::prompt_password(format!("Password for {}? ", username))
                .context("could not read the password")
        })
    } else {
        resolve_credentials(options, io::stdin().lock(), io::stderr())
    }
}

fn credentials_with<P>(options: &CliOptions, ask: P) -> Result<Option<Credentials>>
where
    P: FnOnce(&str) -> Result<String>,
{
    if options.password.is_some() && options.password_file.is_some() {
        bail!("the arguments --password (-P) and --password-file (-p) are mutually exclusive");
    }

    let mut password = options.password.clone();
    if let Some(ref file) = options.password_file {
        let path = expand_path(file);
        if !path.exists() {
            bail!("password file does not exist: {}", path.display());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("could not read password file {}", path.display()))?;
        password = Some(contents.trim().to_string());
    }

    match (options.username.as_deref(), password) {
        (None, None) => Ok(None),
        (None, Some(_)) => bail!("username must be specified when a password is specified"),
        (Some(username), Some(password)) => Ok(Some(Credentials::new(username, password))),
        (Some(username), None) => {
            let password = ask(username)?;
            Ok(Some(Credentials::new(username, password)))
        }
    }
}

fn read_password<R: BufRead, W: Write>(username: &str, mut input: R, mut prompt: W) -> Result<String> {
    write!(prompt, "Password for {}? ", username)?;
    prompt.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("could not read the password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Validate the options into the immutable configuration of a walk.
pub fn build_config(options: &CliOptions) -> Result<WalkConfig> {
    let max_depth = if options.depth == 0 {
        None
    } else {
        Some(options.depth)
    };

    let config = WalkConfig::builder(options.url.as_str())
        .with_excludes(options.excludes.iter().cloned())
        .with_includes(options.includes.iter().cloned())
        .with_filters(options.filters.iter().cloned())
        .with_max_depth(max_depth)
        .with_indent(options.indent)
        .with_spaces_per_indent(options.spaces_per_indent)
        .with_relative_paths(options.relative)
        .with_verbosity(options.verbose)
        .with_warnings(!options.no_warnings)
        .with_follow_external(options.follow_external)
        .with_replicate_dir(options.replicate.as_deref().map(expand_path))
        .with_copy_dir(options.copy.as_deref().map(expand_path))
        .build()?;

    debug!("Walk configuration: {:?}", config);
    Ok(config)
}

/// Validate the configuration and walk the site, writing the report to
/// stdout and warnings to stderr. Credentials are resolved beforehand so
/// that no prompt happens once the walk is under way.
pub async fn run(options: &CliOptions, credentials: Option<Credentials>) -> Result<WalkSummary> {
    let config = build_config(options)?;

    let fetcher = HttpFetcher::builder()
        .with_timeout(options.timeout)
        .with_credentials(credentials)
        .with_accept_invalid_certs(options.insecure)
        .build()
        .context("could not create the HTTP client")?;

    let color = io::stderr().is_terminal();
    let mut reporter =
        Reporter::new(io::stdout(), io::stderr(), config.render.clone()).with_color(color);

    let walker = Walker::new(&config, fetcher, HtmlExtractor::new());
    let report = walker.walk(&mut reporter).await;

    Ok(report.summary)
}
