use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use envreplace::config::{
	CONFIG_FILE_NAME, LoadedConfig, load_config, load_config_file, user_config_path,
};
use envreplace::{Options, Replacer};

#[derive(Parser)]
#[command(name = "envreplace")]
#[command(
	author,
	version,
	about = "Replace identifiers and environment variable references in source files"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Use this config file instead of searching for .envreplace.toml
	#[arg(long = "config", value_name = "PATH", global = true)]
	config_file: Option<PathBuf>,

	/// Add or override a replacement value (repeatable)
	#[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val, global = true)]
	set: Vec<(String, String)>,

	/// Only replace keys wrapped in these delimiters
	#[arg(long, num_args = 2, value_names = ["OPEN", "CLOSE"], global = true)]
	delimiters: Option<Vec<String>>,

	/// Also replace keys that are the target of an assignment
	#[arg(long, global = true)]
	allow_assignment: bool,

	/// Do not generate source maps
	#[arg(long, global = true)]
	no_sourcemap: bool,

	/// Glob of files to transform (repeatable, replaces the configured list)
	#[arg(long, value_name = "GLOB", global = true)]
	include: Vec<String>,

	/// Glob of files to skip (repeatable, replaces the configured list)
	#[arg(long, value_name = "GLOB", global = true)]
	exclude: Vec<String>,

	/// Write results under this directory instead of stdout
	#[arg(long, value_name = "DIR")]
	out_dir: Option<PathBuf>,

	/// Only print or write files that changed
	#[arg(long)]
	changed_only: bool,

	/// Create a template .envreplace.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .envreplace.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,

	/// Increase log verbosity (-v debug, -vv trace)
	#[arg(short, long, action = ArgAction::Count, global = true)]
	verbose: u8,

	/// Files to transform
	files: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the resolved replacement keys and flags
	Show,
	/// Check the configuration for errors without transforming anything
	Validate,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	// Handle --init
	if cli.init {
		return handle_init(cli.force);
	}

	// Handle subcommands
	if let Some(ref command) = cli.command {
		return match command {
			Commands::Config { action } => match action {
				ConfigAction::Show => handle_config_show(&cli),
				ConfigAction::Validate => handle_config_validate(&cli),
			},
		};
	}

	if cli.files.is_empty() {
		anyhow::bail!("No input files given");
	}

	handle_transform(&cli)
}

fn init_tracing(verbose: u8) {
	let default_level = match verbose {
		0 => "warn",
		1 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_env("ENVREPLACE_LOG")
		.unwrap_or_else(|_| EnvFilter::new(default_level));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.try_init();
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
	let (key, value) = s
		.split_once('=')
		.ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
	if key.is_empty() {
		return Err(format!("empty key in `{s}`"));
	}
	Ok((key.to_string(), value.to_string()))
}

/// Load the config and apply command-line overrides.
fn resolve_config(cli: &Cli) -> Result<LoadedConfig> {
	let cwd = std::env::current_dir().context("Failed to get current directory")?;

	let mut loaded = match &cli.config_file {
		Some(path) => load_config_file(path, &cwd)
			.with_context(|| format!("Failed to load {}", path.display()))?,
		None => load_config(&cwd).context("Failed to load configuration")?,
	};

	apply_overrides(&mut loaded.options, cli);
	Ok(loaded)
}

fn apply_overrides(options: &mut Options, cli: &Cli) {
	for (key, value) in &cli.set {
		options.values.insert(key.clone(), value.clone());
	}
	if !cli.include.is_empty() {
		options.include = cli.include.clone();
	}
	if !cli.exclude.is_empty() {
		options.exclude = cli.exclude.clone();
	}
	if let Some([open, close]) = cli.delimiters.as_deref() {
		options.delimiters = Some((open.clone(), close.clone()));
	}
	if cli.allow_assignment {
		options.prevent_assignment = false;
	}
	if cli.no_sourcemap {
		options.sourcemap = false;
	}
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(CONFIG_FILE_NAME);

	if config_path.exists() && !force {
		anyhow::bail!("{CONFIG_FILE_NAME} already exists. Use --force to overwrite.");
	}

	std::fs::write(&config_path, init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {CONFIG_FILE_NAME}");
	Ok(ExitCode::SUCCESS)
}

fn init_template() -> &'static str {
	r#"# envreplace configuration

# Files to transform, relative to the working directory.
include = ["./src/**/*"]
# exclude = ["./src/vendor/**"]

# Only replace keys written as <@KEY@>.
# delimiters = ["<@", "@>"]

# Leave `KEY = value` assignments untouched.
preventAssignment = true

sourcemap = true

[values]
__VERSION__ = "0.1.0"
# API_URL = "https://example.com"
"#
}

fn handle_config_show(cli: &Cli) -> Result<ExitCode> {
	let loaded = resolve_config(cli)?;
	let options = &loaded.options;
	let replacer = Replacer::new(options.clone()).context("Failed to build replacer")?;

	match &loaded.path {
		Some(path) => println!("# Source: {}", path.display()),
		None => println!("# Source: (defaults)"),
	}
	println!("# include: {:?}", options.include);
	println!("# exclude: {:?}", options.exclude);
	if let Some((open, close)) = &options.delimiters {
		println!("# delimiters: {open:?} {close:?}");
	}
	println!("# prevent-assignment: {}", options.prevent_assignment);
	println!("# sourcemap: {}", options.sourcemap);
	println!("# keys: {}", replacer.keys().len());
	println!();

	let table = replacer.matcher().table();
	for key in replacer.keys() {
		if let Some(value) = table.get(key) {
			println!("  {key} = {value}");
		}
	}

	if loaded.path.is_none()
		&& let Ok(user_path) = user_config_path()
	{
		println!();
		println!("User config path: {}", user_path.display());
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_validate(cli: &Cli) -> Result<ExitCode> {
	let result = resolve_config(cli).and_then(|loaded| {
		let replacer = Replacer::new(loaded.options).context("Failed to build replacer")?;
		Ok((loaded.path, replacer.keys().len()))
	});

	match result {
		Ok((Some(path), keys)) => {
			println!("Configuration is valid: {} ({} keys)", path.display(), keys);
			Ok(ExitCode::SUCCESS)
		}
		Ok((None, keys)) => {
			println!("No configuration file found, defaults are valid ({keys} keys)");
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {e:#}");
			Ok(ExitCode::FAILURE)
		}
	}
}

fn handle_transform(cli: &Cli) -> Result<ExitCode> {
	let loaded = resolve_config(cli)?;
	let replacer = Replacer::new(loaded.options).context("Failed to build replacer")?;

	for file in &cli.files {
		let code = std::fs::read_to_string(file)
			.with_context(|| format!("Failed to read {}", file.display()))?;
		let id = file.to_string_lossy();

		let result = replacer
			.transform(&code, &id)
			.with_context(|| format!("Failed to transform {}", file.display()))?;

		match &cli.out_dir {
			Some(out_dir) => {
				let target = out_dir.join(output_relative_path(file));
				match result {
					Some(result) => {
						write_file(&target, &result.code)?;
						if let Some(source_map) = result.source_map(&id, &code) {
							let file_name = target
								.file_name()
								.map(|n| n.to_string_lossy().to_string())
								.unwrap_or_default();
							let json = source_map
								.with_file(file_name)
								.to_json()
								.context("Failed to serialize source map")?;
							write_file(&map_path(&target), &json)?;
						}
					}
					None if !cli.changed_only => write_file(&target, &code)?,
					None => {}
				}
			}
			None => match result {
				Some(result) => print!("{}", result.code),
				None if !cli.changed_only => print!("{code}"),
				None => {}
			},
		}
	}

	Ok(ExitCode::SUCCESS)
}

/// Path of `file` inside the output directory.
fn output_relative_path(file: &Path) -> PathBuf {
	let relative = std::env::current_dir()
		.ok()
		.and_then(|cwd| file.strip_prefix(cwd).ok().map(Path::to_path_buf))
		.unwrap_or_else(|| file.to_path_buf());

	if relative.is_absolute() {
		return relative
			.file_name()
			.map(PathBuf::from)
			.unwrap_or(relative);
	}

	relative
		.components()
		.filter(|c| matches!(c, std::path::Component::Normal(_)))
		.collect()
}

fn map_path(target: &Path) -> PathBuf {
	let mut name = target.as_os_str().to_os_string();
	name.push(".map");
	PathBuf::from(name)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)
			.with_context(|| format!("Failed to create {}", parent.display()))?;
	}
	std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
