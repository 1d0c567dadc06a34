//! Command-line argument parsing for the berth CLI.

use std::path::PathBuf;

use crate::engine::BuildArg;

/// Usage text printed by `--help` and after argument errors.
pub const USAGE: &str = "\
Usage:
  berth pull <image>
  berth build <recipe-file> [-t TAG] [--build-arg KEY=VALUE]... [--no-cache] [--pull]
  berth --version
  berth --help

Environment:
  BERTH_ENGINE_URL    engine address (default http://localhost:2375)
  BERTH_API_VERSION   API version prefix, e.g. 1.43
  BERTH_TIMEOUT_SECS  whole-request timeout in seconds
  BERTH_LOG           log filter (default warn)
";

/// Options for `berth build`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildOptions {
    pub recipe_path: PathBuf,
    pub tag: String,
    pub build_args: Vec<BuildArg>,
    pub no_cache: bool,
    pub pull_latest: bool,
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Pull an image
    Pull { image: String },
    /// Build an image from a recipe file
    Build(BuildOptions),
    /// Arguments could not be understood
    Invalid(String),
}

/// Parse command-line arguments, program name first.
///
/// # Examples
///
/// ```
/// use berth::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["berth".to_string(), "pull".to_string(), "nginx".to_string()];
/// assert_eq!(
///     parse_args(args.into_iter()),
///     CliCommand::Pull { image: "nginx".to_string() }
/// );
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let args: Vec<String> = args.skip(1).collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return CliCommand::Help;
    }

    let Some((command, rest)) = args.split_first() else {
        return CliCommand::Help;
    };

    match command.as_str() {
        "--version" | "-V" => CliCommand::Version,
        "pull" => parse_pull(rest),
        "build" => parse_build(rest),
        other => CliCommand::Invalid(format!("unknown command '{}'", other)),
    }
}

fn parse_pull(args: &[String]) -> CliCommand {
    match args {
        [image] if !image.starts_with('-') => CliCommand::Pull {
            image: image.clone(),
        },
        [] => CliCommand::Invalid("pull needs an image reference".to_string()),
        _ => CliCommand::Invalid("pull takes exactly one image reference".to_string()),
    }
}

fn parse_build(args: &[String]) -> CliCommand {
    let mut options = BuildOptions::default();
    let mut recipe: Option<PathBuf> = None;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--no-cache" => options.no_cache = true,
            "--pull" => options.pull_latest = true,
            "-t" | "--tag" => match iter.next() {
                Some(tag) => options.tag = tag.clone(),
                None => return CliCommand::Invalid(format!("{} needs a value", arg)),
            },
            "--build-arg" => match iter.next().map(|pair| (pair, BuildArg::parse(pair))) {
                Some((_, Some(build_arg))) => options.build_args.push(build_arg),
                Some((pair, None)) => {
                    return CliCommand::Invalid(format!(
                        "invalid build arg '{}', expected KEY=VALUE",
                        pair
                    ))
                }
                None => return CliCommand::Invalid("--build-arg needs a value".to_string()),
            },
            flag if flag.starts_with("--tag=") => {
                options.tag = flag["--tag=".len()..].to_string();
            }
            flag if flag.starts_with("--build-arg=") => {
                let pair = &flag["--build-arg=".len()..];
                match BuildArg::parse(pair) {
                    Some(build_arg) => options.build_args.push(build_arg),
                    None => {
                        return CliCommand::Invalid(format!(
                            "invalid build arg '{}', expected KEY=VALUE",
                            pair
                        ))
                    }
                }
            }
            flag if flag.starts_with('-') && flag != "-" => {
                return CliCommand::Invalid(format!("unknown option '{}'", flag));
            }
            path => {
                if recipe.is_some() {
                    return CliCommand::Invalid("build takes exactly one recipe file".to_string());
                }
                recipe = Some(PathBuf::from(path));
            }
        }
    }

    match recipe {
        Some(path) => {
            options.recipe_path = path;
            CliCommand::Build(options)
        }
        None => CliCommand::Invalid("build needs a recipe file".to_string()),
    }
}
