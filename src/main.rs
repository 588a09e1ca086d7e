//! CLI entry point for twig

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{LevelFilter, debug};
use serde_json::Value;
use twig::{
    DictParser, FileFinder, FileTree, FinderConfig, MarkdownStyle, OutputConfig, Tree,
    TreeFormatter, TreeMarkup, XmlStyle, print_flat_json, print_json,
};

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            std::io::stdout().is_terminal()
        }
    }
}

/// How a tree is written to stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Box-drawing tree with a summary line
    #[default]
    Tree,
    /// Nested brace markup
    Markup,
    /// Nested XML elements
    Xml,
    /// Nested markdown bullet list
    Markdown,
    /// Pretty-printed JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "twig")]
#[command(about = "Build and render trees from JSON documents and directories")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto", global = true)]
    color: ColorMode,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a JSON document into a tree
    Dict {
        /// JSON file to read, or - for stdin
        file: PathBuf,

        /// Output format
        #[arg(long = "format", default_value = "tree")]
        format: Format,

        /// Build reverse lookups by name and level
        #[arg(long = "analyze")]
        analyze: bool,
    },

    /// Scan a directory into a tree
    Files {
        /// Directory to display
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Descend only N levels deep
        #[arg(short = 'L', long = "level")]
        level: Option<usize>,

        /// Ignore files and directories matching pattern (can be used multiple times)
        #[arg(short = 'I', long = "ignore")]
        ignore: Vec<String>,

        /// Only list files matching pattern (can be used multiple times)
        #[arg(short = 'P', long = "pattern")]
        pattern: Vec<String>,

        /// Skip paths matching regex (can be used multiple times)
        #[arg(long = "exclude-path", value_name = "REGEX")]
        exclude_path: Vec<String>,

        /// Only list files whose path matches regex (can be used multiple times)
        #[arg(long = "include-path", value_name = "REGEX")]
        include_path: Vec<String>,

        /// Keep at most N files per directory
        #[arg(long = "limit")]
        limit: Option<usize>,

        /// Show all files (ignore hidden and .gitignore filtering)
        #[arg(short, long)]
        all: bool,

        /// List directories only
        #[arg(short = 'd', long = "dirs-only")]
        dirs_only: bool,

        /// Show aggregated sizes next to names
        #[arg(short = 's', long = "size")]
        size: bool,

        /// Output format
        #[arg(long = "format", default_value = "tree")]
        format: Format,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(default)
        .parse_env("TWIG_LOG")
        .format_timestamp(None)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("twig: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> twig::Result<()> {
    let use_color = should_use_color(args.color);
    match args.command {
        Command::Dict {
            file,
            format,
            analyze,
        } => run_dict(&file, format, analyze, use_color),
        Command::Files {
            path,
            level,
            ignore,
            pattern,
            exclude_path,
            include_path,
            limit,
            all,
            dirs_only,
            size,
            format,
        } => {
            let config = FinderConfig {
                show_all: all,
                max_depth: level,
                max_items: limit,
                dirs_only,
                include_patterns: pattern,
                exclude_patterns: ignore,
                include_paths: include_path,
                exclude_paths: exclude_path,
            };
            run_files(&path, config, size, format, use_color)
        }
    }
}

fn run_dict(file: &Path, format: Format, analyze: bool, use_color: bool) -> twig::Result<()> {
    let text = if file.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(file)?
    };
    let input: Value = serde_json::from_str(&text)?;
    let dict = DictParser::new().parse(&input);
    debug!("parsed {} dict nodes", dict.len());

    if format == Format::Json {
        print_flat_json(&dict)?;
        return Ok(());
    }
    let tree = dict.build_tree(analyze)?;
    emit(&tree, format, false, use_color)
}

fn run_files(
    path: &Path,
    config: FinderConfig,
    show_size: bool,
    format: Format,
    use_color: bool,
) -> twig::Result<()> {
    let root = fs::canonicalize(path).map_err(|e| {
        io::Error::new(e.kind(), format!("cannot access '{}': {}", path.display(), e))
    })?;
    let index = FileFinder::new(config)?.find(&root)?;
    let files = FileTree::build(&root, &index, true)?;
    emit(files.tree(), format, show_size, use_color)
}

fn emit(tree: &Tree, format: Format, show_size: bool, use_color: bool) -> twig::Result<()> {
    match format {
        Format::Tree => {
            let formatter = TreeFormatter::new(OutputConfig {
                use_color,
                show_size,
                max_level: None,
            });
            formatter.print(tree)?;
        }
        Format::Markup => println!("{}", TreeMarkup::new(tree).render()?),
        Format::Xml => println!("{}", TreeMarkup::with_style(tree, XmlStyle).render()?),
        Format::Markdown => println!("{}", TreeMarkup::with_style(tree, MarkdownStyle).render()?),
        Format::Json => print_json(tree)?,
    }
    debug!("emitted {} nodes", tree.len());
    Ok(())
}
