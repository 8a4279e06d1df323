use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::error::{DigestError, DigestResult};
use crate::utils::llm::DEFAULT_OPENAI_BASE_URL;

pub const GITLAB_DOMAIN_VAR: &str = "GITLAB_DOMAIN";
pub const GITLAB_TOKEN_VAR: &str = "GITLAB_TOKEN";
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_VAR: &str = "OPENAI_BASE_URL";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Summarize your GitLab activity with an LLM", long_about = None)]
pub struct Cli {
    /// Start date (YYYY-MM-DD)
    #[arg(short, long, required_unless_present = "list_models")]
    pub start: Option<String>,

    /// End date (YYYY-MM-DD)
    #[arg(short, long, required_unless_present = "list_models")]
    pub end: Option<String>,

    /// GitLab username, shown next to the summary
    #[arg(short, long)]
    pub user: Option<String>,

    /// Use a JSON file with the user's event data instead of a GitLab instance
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Number of bullet points for the summary
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Directory the fetched events are dumped into
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// List the models available to the OpenAI key and exit
    #[arg(long)]
    pub list_models: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Date window for the events query. The labels are the literal strings the
/// user typed; they name the dump file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub start_label: String,
    pub end_label: String,
}

impl DateRange {
    pub fn parse(start: &str, end: &str) -> DigestResult<Self> {
        Ok(DateRange {
            start: parse_date("start", start)?,
            end: parse_date("end", end)?,
            start_label: start.to_string(),
            end_label: end.to_string(),
        })
    }
}

fn parse_date(which: &str, value: &str) -> DigestResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        DigestError::Config(format!(
            "invalid {} date '{}' (expected YYYY-MM-DD): {}",
            which, value, e
        ))
    })
}

#[derive(Debug, Clone)]
pub struct GitLabSettings {
    pub base_url: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub base_url: String,
}

impl OpenAiSettings {
    /// Only the OpenAI key is needed, used by `--list-models`.
    pub fn from_lookup<F>(lookup: F) -> DigestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = non_empty(&lookup, OPENAI_API_KEY_VAR).ok_or_else(|| {
            DigestError::Config(format!("please set the {} environment variable", OPENAI_API_KEY_VAR))
        })?;

        Ok(OpenAiSettings {
            api_key,
            base_url: openai_base_url(&lookup),
        })
    }

    pub fn from_env() -> DigestResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }
}

/// Everything one run needs, resolved once from flags and environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub range: DateRange,
    pub user: String,
    pub file: Option<PathBuf>,
    pub bullet_count: u32,
    pub output_dir: PathBuf,
    pub gitlab: GitLabSettings,
    pub openai: OpenAiSettings,
}

impl Config {
    /// Builds the run configuration. All three credentials are required even
    /// in file mode; they are checked before the dates.
    pub fn resolve<F>(cli: Cli, lookup: F) -> DigestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gitlab_domain = non_empty(&lookup, GITLAB_DOMAIN_VAR);
        let gitlab_token = non_empty(&lookup, GITLAB_TOKEN_VAR);
        let openai_api_key = non_empty(&lookup, OPENAI_API_KEY_VAR);

        let (base_url, token, api_key) = match (gitlab_domain, gitlab_token, openai_api_key) {
            (Some(domain), Some(token), Some(key)) => (domain, token, key),
            (domain, token, key) => {
                let missing: Vec<&str> = [
                    (GITLAB_DOMAIN_VAR, domain.is_none()),
                    (GITLAB_TOKEN_VAR, token.is_none()),
                    (OPENAI_API_KEY_VAR, key.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                return Err(DigestError::Config(format!(
                    "please set the {} environment variable(s)",
                    missing.join(", ")
                )));
            }
        };

        if !base_url.starts_with("http") {
            return Err(DigestError::Config(format!(
                "environment variable {} must start with 'http', got '{}'",
                GITLAB_DOMAIN_VAR, base_url
            )));
        }

        let start = cli
            .start
            .ok_or_else(|| DigestError::Config("--start is required".to_string()))?;
        let end = cli
            .end
            .ok_or_else(|| DigestError::Config("--end is required".to_string()))?;
        let range = DateRange::parse(&start, &end)?;

        if cli.count == 0 {
            return Err(DigestError::Config("--count must be at least 1".to_string()));
        }

        Ok(Config {
            range,
            user: cli.user.unwrap_or_default(),
            file: cli.file,
            bullet_count: cli.count,
            output_dir: cli.output_dir,
            gitlab: GitLabSettings {
                base_url: base_url.trim_end_matches('/').to_string(),
                token,
            },
            openai: OpenAiSettings {
                api_key,
                base_url: openai_base_url(&lookup),
            },
        })
    }

    pub fn from_env(cli: Cli) -> DigestResult<Self> {
        Self::resolve(cli, |key| env::var(key).ok())
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn openai_base_url<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, OPENAI_BASE_URL_VAR)
        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}
