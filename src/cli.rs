//! Command line host: JSON documents → description (json | html), or saved description → html
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;

use crate::config::DescribeOptions;
use crate::describe::{Description, describe_with};
use crate::realm::Realm;
use crate::render::render_html;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// describe JSON documents as inspectable type/property/prototype reports
#[derive(Parser, Debug)]
#[command(name = "object-describe", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// describe each input document and print the JSON description
    Json(DescribeOut),
    /// describe each input document and print an HTML rendering
    Html(DescribeOut),
    /// render previously produced description JSON as HTML
    Render(RenderOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct DescribeSettings {
    /// JSON options file (`ignoredTypes`, `bucketSize`, `maxTotal`, `truncateAt`, `maxDepth`)
    #[arg(long)]
    config: Option<PathBuf>,

    /// kind whose prototype is not described; repeatable
    #[arg(long = "ignore", value_name = "KIND")]
    ignore: Vec<String>,

    /// iterable sample bucket size
    #[arg(long)]
    bucket_size: Option<usize>,

    /// maximum number of sampled iterable elements
    #[arg(long)]
    max_total: Option<usize>,

    /// maximum summary string length
    #[arg(long)]
    truncate_at: Option<usize>,

    /// fail on graphs nested deeper than this
    #[arg(long)]
    max_depth: Option<usize>,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    describe_settings: DescribeSettings,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct RenderOut {
    /// description JSON file produced by the `json` subcommand
    #[arg(long, short)]
    input: PathBuf,

    /// output .html file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One input document, labelled with where it came from.
#[derive(Debug, Clone)]
struct Document {
    origin: String,
    value: serde_json::Value,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths =
            resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            let parsed = if self.ndjson {
                source
                    .lines()
                    .enumerate()
                    .filter(|(_, line)| !line.trim().is_empty())
                    .map(|(ix, line)| {
                        let origin = format!("{source_path_str}:{}", ix + 1);
                        serde_json::from_str(line)
                            .with_context(|| format!("failed to parse JSON ({origin})"))
                            .map(|value| Document { origin, value })
                    })
                    .collect::<Result<Vec<_>>>()?
            } else {
                let value = serde_json::from_str(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                vec![Document { origin: source_path_str.clone(), value }]
            };
            for document in parsed {
                documents.extend(self.preprocess(document)?);
            }
        }
        Ok(documents)
    }

    /// JSON pointer selection, then the optional jq filter (which may fan out).
    fn preprocess(&self, document: Document) -> Result<Vec<Document>> {
        let Document { origin, mut value } = document;
        if let Some(pointer) = self.json_pointer.as_deref() {
            value = value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {pointer} matched nothing ({origin})"))?;
        }
        let Some(jq_expr) = self.jq_expr.as_deref() else {
            return Ok(vec![Document { origin, value }]);
        };
        let outputs = crate::jq_exec::run_jaq(jq_expr, &value)
            .with_context(|| format!("failed to apply jq expression ({origin})"))?;
        Ok(outputs
            .into_iter()
            .enumerate()
            .map(|(ix, value)| Document { origin: format!("{origin}#{ix}"), value })
            .collect())
    }
}

impl DescribeSettings {
    /// Config file (if any) with command line overrides on top.
    fn options(&self) -> Result<DescribeOptions> {
        let mut options = match self.config.as_ref() {
            Some(path) => DescribeOptions::load(path)?,
            None => DescribeOptions::default(),
        };
        options = options.ignoring(self.ignore.iter().cloned());
        if let Some(bucket_size) = self.bucket_size {
            options.bucket_size = bucket_size;
        }
        if let Some(max_total) = self.max_total {
            options.max_total = max_total;
        }
        if let Some(truncate_at) = self.truncate_at {
            options.truncate_at = truncate_at;
        }
        if self.max_depth.is_some() {
            options.max_depth = self.max_depth;
        }
        if options.bucket_size == 0 {
            bail!("bucket size must be positive");
        }
        Ok(options)
    }
}

impl DescribeOut {
    /// Each document gets its own realm; documents are described in parallel.
    fn describe_all(&self) -> Result<Vec<Description>> {
        let options = self.describe_settings.options()?;
        let documents = self.input_settings.load_documents()?;
        tracing::info!(documents = documents.len(), "describing");
        documents
            .par_iter()
            .map(|document| {
                let mut realm = Realm::new();
                let value = realm.import_json(&document.value);
                describe_with(&mut realm, &value, &options)
                    .with_context(|| format!("failed to describe {}", document.origin))
            })
            .collect()
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Json(target) => {
                let descriptions = target.describe_all()?;
                let text = if target.input_settings.ndjson {
                    let lines = descriptions
                        .iter()
                        .map(serde_json::to_string)
                        .collect::<Result<Vec<_>, _>>()?;
                    lines.join("\n")
                } else if let [single] = descriptions.as_slice() {
                    serde_json::to_string_pretty(single)?
                } else {
                    serde_json::to_string_pretty(&descriptions)?
                };
                write_output(target.out.as_deref(), &text)
            }
            Command::Html(target) => {
                let descriptions = target.describe_all()?;
                let pages: Vec<String> = descriptions.iter().map(render_html).collect();
                write_output(target.out.as_deref(), &pages.join("\n"))
            }
            Command::Render(target) => {
                let source = std::fs::read_to_string(&target.input)
                    .with_context(|| format!("failed to read {}", target.input.display()))?;
                let description: Description = crate::config::from_str_with_path(&source)
                    .with_context(|| format!("invalid description JSON in {}", target.input.display()))?;
                write_output(target.out.as_deref(), &render_html(&description))
            }
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (warnings and up by default).
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    let Some(out) = out else {
        println!("{text}");
        return Ok(());
    };
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // an explicit glob that matches nothing is almost certainly a typo
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
