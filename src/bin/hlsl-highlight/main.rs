// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod settings;

use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::process::exit;

use anyhow::{Context as _, bail};
use argh::FromArgs;
use hlsl_highlight::highlighter::{HighlightResult, TokenCategory, lang_hlsl};
use hlsl_highlight::registry::Registry;
use serde::Serialize;
use tracing::{Level, debug};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, fmt};

use crate::settings::Settings;

#[derive(FromArgs, PartialEq, Debug)]
#[argh(description = "Syntax highlighter for HLSL and SDSL shaders")]
struct Command {
    #[argh(option, description = "settings.json to use instead of the one in the config directory")]
    settings: Option<PathBuf>,
    #[argh(subcommand)]
    sub: SubCommands,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
enum SubCommands {
    Render(SubCommandRender),
    Tokens(SubCommandTokens),
    Detect(SubCommandDetect),
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "render", description = "Print a file with ANSI colors")]
struct SubCommandRender {
    #[argh(positional, description = "source text file")]
    input: PathBuf,
    #[argh(option, description = "language name, e.g. hlsl or sdsl")]
    language: Option<String>,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "tokens", description = "List the tokens of a file")]
struct SubCommandTokens {
    #[argh(positional, description = "source text file")]
    input: PathBuf,
    #[argh(option, description = "language name, e.g. hlsl or sdsl")]
    language: Option<String>,
    #[argh(switch, description = "print a JSON array instead of one line per token")]
    json: bool,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand, name = "detect", description = "Guess the language of a file")]
struct SubCommandDetect {
    #[argh(positional, description = "source text file")]
    input: PathBuf,
}

#[derive(Serialize)]
struct TokenRecord<'a> {
    start: usize,
    end: usize,
    category: TokenCategory,
    text: &'a str,
}

pub fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("{e:#}");
        exit(1);
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::builder().with_default_directive(Level::WARN.into()).from_env_lossy();
    let fmt_layer = fmt::layer().with_writer(std::io::stderr);
    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}

fn run() -> anyhow::Result<()> {
    let command: Command = argh::from_env();
    let settings = Settings::load(command.settings.as_deref())?;
    debug!(path = ?settings.path, "loaded settings");
    let registry = Registry::with_builtin_languages()?;

    match &command.sub {
        SubCommands::Render(cmd) => {
            let text = read_input(&cmd.input)?;
            let language =
                resolve_language(&registry, &settings, cmd.language.as_deref(), &cmd.input);
            let result = registry.tokenize(&language, &text)?;
            run_render(&settings, &text, &result)?;
        }
        SubCommands::Tokens(cmd) => {
            let text = read_input(&cmd.input)?;
            let language =
                resolve_language(&registry, &settings, cmd.language.as_deref(), &cmd.input);
            let result = registry.tokenize(&language, &text)?;
            run_tokens(&text, &result, cmd.json)?;
        }
        SubCommands::Detect(cmd) => {
            let text = read_input(&cmd.input)?;
            let Some(result) = registry.highlight_auto(&text, None) else {
                bail!("No languages registered");
            };
            println!("{} {}", result.language, result.score());
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// `--language`, then the settings' file associations, then the built-in extension list.
fn resolve_language(
    registry: &Registry,
    settings: &Settings,
    explicit: Option<&str>,
    path: &Path,
) -> String {
    if let Some(language) = explicit {
        return language.to_string();
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let language = settings
        .language_for_extension(ext)
        .or_else(|| registry.language_for_extension(ext))
        .unwrap_or(lang_hlsl::NAME);
    debug!(path = %path.display(), language, "resolved language");
    language.to_string()
}

fn run_render(settings: &Settings, text: &str, result: &HighlightResult) -> anyhow::Result<()> {
    let mut out = BufWriter::new(stdout().lock());
    render(&mut out, settings, text, result)?;
    out.flush()?;
    Ok(())
}

/// Writes `text` with every token wrapped in its SGR color. Text between tokens is left as is.
fn render(
    out: &mut impl Write,
    settings: &Settings,
    text: &str,
    result: &HighlightResult,
) -> std::io::Result<()> {
    let mut pos = 0;

    for token in &result.tokens {
        out.write_all(text[pos..token.start()].as_bytes())?;
        let color = settings.color_of(token.category);
        if color.is_empty() {
            out.write_all(token.text(text).as_bytes())?;
        } else {
            write!(out, "\x1b[{color}m{}\x1b[m", token.text(text))?;
        }
        pos = token.range.end;
    }
    out.write_all(text[pos..].as_bytes())
}

fn run_tokens(text: &str, result: &HighlightResult, json: bool) -> anyhow::Result<()> {
    let mut out = BufWriter::new(stdout().lock());

    if json {
        let records: Vec<_> = result
            .tokens
            .iter()
            .map(|t| TokenRecord {
                start: t.range.start,
                end: t.range.end,
                category: t.category,
                text: t.text(text),
            })
            .collect();
        serde_json::to_writer_pretty(&mut out, &records)?;
        writeln!(out)?;
    } else {
        for t in &result.tokens {
            writeln!(out, "{:?} {} {:?}", t.range, t.category, t.text(text))?;
        }
        writeln!(out, "relevance {}", result.score())?;
    }

    out.flush()?;
    Ok(())
}
