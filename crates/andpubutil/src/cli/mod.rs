//! CLI definition and command handling

pub mod output;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use console::style;
use tracing::{debug, info};

use andpubutil_play::{
    publish, GooglePlayClient, PlayError, PublishReport, PublishRequest, ReviewPolicy, KEY_ENV_VAR,
};

use crate::exit_codes;

/// andpubutil - upload APK, AAB and OBB files to Google Play
#[derive(Debug, Parser)]
#[command(name = "andpubutil")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Package name (e.g., com.example.app)
    #[arg(required = true)]
    pub package_name: String,

    /// Files to upload, in order (.apk, .aab, .obb)
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Path to service account JSON key
    #[arg(long, env = KEY_ENV_VAR)]
    pub key: Option<PathBuf>,

    /// Optional dotenv file, loaded before options are read from the environment
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Commit once without the review fallback
    #[arg(long)]
    pub no_fallback: bool,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

const DEFAULT_ENV_FILE: &str = ".env";

/// Find `--env-file` in raw arguments, ahead of full parsing
pub fn env_file_from_args(args: &[OsString]) -> PathBuf {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }
        if arg == "--env-file" {
            if let Some(value) = iter.next() {
                return PathBuf::from(value);
            }
        } else if let Some(value) = arg.to_str().and_then(|a| a.strip_prefix("--env-file=")) {
            return PathBuf::from(value);
        }
    }
    PathBuf::from(DEFAULT_ENV_FILE)
}

/// Exit code for a failed parse; help and version requests exit cleanly
pub fn parse_error_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => exit_codes::SUCCESS,
        _ => exit_codes::ERROR,
    }
}

impl Cli {
    /// Default console log filter for the chosen verbosity
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        }
    }

    fn review_policy(&self) -> ReviewPolicy {
        if self.no_fallback {
            ReviewPolicy::Single
        } else {
            ReviewPolicy::default()
        }
    }

    /// Execute the upload
    pub fn execute(&self) -> anyhow::Result<()> {
        let request = PublishRequest::new(&self.package_name, self.files.iter().cloned())?;
        let policy = self.review_policy();
        let key_path = self.key.as_deref();

        if !self.quiet && self.format == OutputFormat::Text {
            output::info(&format!(
                "Uploading {} file(s) to {}",
                request.artifacts.len(),
                style(&request.package_name).bold()
            ));
        }

        let rt = tokio::runtime::Runtime::new()?;
        let report = rt
            .block_on(publish(&request, policy, || connect(key_path)))
            .context("Publishing failed")?;

        self.print_report(&report)
    }

    fn print_report(&self, report: &PublishReport) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
            OutputFormat::Text if !self.quiet => {
                for upload in &report.uploads {
                    println!(
                        "{}",
                        output::key_value(
                            &upload.kind.to_string(),
                            &format!(
                                "{} (version code {})",
                                output::path_style().apply_to(upload.path.display()),
                                upload.version_code
                            ),
                        )
                    );
                }
                output::success(&format!(
                    "Committed edit {} (status {}, attempt {})",
                    report.edit_id, report.commit_status, report.attempt
                ));
            }
            OutputFormat::Text => {}
        }

        Ok(())
    }
}

/// Load a dotenv file without overriding variables already set
pub fn load_env_file(path: &Path) {
    match dotenvy::from_path(path) {
        Ok(()) => info!("Loaded {}", path.display()),
        Err(e) if e.not_found() => debug!("No env file at {}", path.display()),
        Err(e) => debug!("Ignoring env file {}: {}", path.display(), e),
    }
}

/// Build a client for one publish attempt
fn connect(key_path: Option<&Path>) -> andpubutil_play::error::Result<GooglePlayClient> {
    let path = key_path.ok_or_else(|| {
        PlayError::MissingCredentials(format!("{} is not set and --key was not given", KEY_ENV_VAR))
    })?;
    GooglePlayClient::from_key_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let cli = Cli::try_parse_from(["andpubutil", "com.example.app", "app.aab"]).unwrap();
        assert_eq!(cli.package_name, "com.example.app");
        assert_eq!(cli.files, vec![PathBuf::from("app.aab")]);
        assert_eq!(cli.env_file, PathBuf::from(".env"));
        assert_eq!(cli.review_policy(), ReviewPolicy::Fallback);
        assert_eq!(cli.log_level(), "info");
    }

    #[test]
    fn test_too_few_arguments_exit_one() {
        let err = Cli::try_parse_from(["andpubutil", "com.example.app"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&err), exit_codes::ERROR);

        let err = Cli::try_parse_from(["andpubutil"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&err), exit_codes::ERROR);
    }

    #[test]
    fn test_help_exits_cleanly() {
        let err = Cli::try_parse_from(["andpubutil", "--help"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&err), exit_codes::SUCCESS);
    }

    #[test]
    fn test_files_keep_order() {
        let cli = Cli::try_parse_from([
            "andpubutil",
            "--no-fallback",
            "com.example.app",
            "a.apk",
            "main.obb",
            "b.aab",
        ])
        .unwrap();
        assert_eq!(
            cli.files,
            vec![PathBuf::from("a.apk"), PathBuf::from("main.obb"), PathBuf::from("b.aab")]
        );
        assert_eq!(cli.review_policy(), ReviewPolicy::Single);
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["andpubutil", "-v", "-q", "com.example.app", "a.apk"]).is_err());
    }

    #[test]
    fn test_unsupported_file_fails_before_network() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "andpubutil",
            "--env-file",
            dir.path().join("missing.env").to_str().unwrap(),
            "--key",
            dir.path().join("key.json").to_str().unwrap(),
            "com.example.app",
            "app.apk",
            "notes.txt",
        ])
        .unwrap();

        let err = cli.execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlayError>(),
            Some(PlayError::UnsupportedFileType(_))
        ));
        assert_eq!(exit_codes::for_error(&err), exit_codes::CONFIG_ERROR);
    }

    #[test]
    fn test_connect_without_key() {
        let err = connect(None).err().unwrap();
        assert!(matches!(err, PlayError::MissingCredentials(_)));
    }

    #[test]
    fn test_env_file_from_args() {
        let args = |list: &[&str]| list.iter().map(OsString::from).collect::<Vec<_>>();

        assert_eq!(
            env_file_from_args(&args(&["andpubutil", "com.example.app", "a.apk"])),
            PathBuf::from(".env")
        );
        assert_eq!(
            env_file_from_args(&args(&["andpubutil", "--env-file", "ci.env", "pkg", "a.apk"])),
            PathBuf::from("ci.env")
        );
        assert_eq!(
            env_file_from_args(&args(&["andpubutil", "--env-file=/etc/play.env", "pkg", "a.apk"])),
            PathBuf::from("/etc/play.env")
        );
        assert_eq!(
            env_file_from_args(&args(&["andpubutil", "pkg", "--", "--env-file", "x.env"])),
            PathBuf::from(".env")
        );
    }

    #[test]
    fn test_env_file_supplies_key_without_overriding() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("play-key.json");
        let env_path = dir.path().join(".env");
        std::fs::write(&env_path, format!("{}={}\n", KEY_ENV_VAR, key_path.display())).unwrap();

        std::env::remove_var(KEY_ENV_VAR);
        load_env_file(&env_path);

        let cli = Cli::try_parse_from(["andpubutil", "com.example.app", "app.apk"]).unwrap();
        assert_eq!(cli.key.as_deref(), Some(key_path.as_path()));

        // The key file does not exist: credentials were found but are unusable
        let err = connect(cli.key.as_deref()).err().unwrap();
        assert!(matches!(err, PlayError::InvalidCredentials(_)));

        // A second env file must not replace the value already in the environment
        let other_env = dir.path().join("other.env");
        std::fs::write(&other_env, format!("{}=/elsewhere/key.json\n", KEY_ENV_VAR)).unwrap();
        load_env_file(&other_env);

        let cli = Cli::try_parse_from(["andpubutil", "com.example.app", "app.apk"]).unwrap();
        assert_eq!(cli.key.as_deref(), Some(key_path.as_path()));

        // An explicit flag still wins over the environment
        let cli = Cli::try_parse_from([
            "andpubutil",
            "--key",
            "/flag/key.json",
            "com.example.app",
            "app.apk",
        ])
        .unwrap();
        assert_eq!(cli.key, Some(PathBuf::from("/flag/key.json")));

        load_env_file(&dir.path().join("absent.env"));
        std::env::remove_var(KEY_ENV_VAR);
    }
}
