//! dombridge - Query HTML with CSS selectors

use std::io::Read;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use dombridge::{Bridge, Handle};

#[derive(Parser)]
#[command(name = "dombridge")]
#[command(version, about = "Query HTML with CSS selectors", long_about = None)]
#[command(after_help = "EXAMPLES:
    dombridge page.html 'a[href]' --attr href --base https://example.com/
    dombridge page.html 'h1, h2' --text
    curl -s https://example.com | dombridge - 'p:contains(domain)' --json")]
struct Cli {
    /// Input HTML file, or `-` for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// CSS selector to match
    #[arg(value_name = "SELECTOR")]
    selector: String,

    /// Base URI used to resolve relative links
    #[arg(long, value_name = "URI", default_value = "")]
    base: String,

    /// Parse the input as a body fragment instead of a full document
    #[arg(long)]
    fragment: bool,

    /// Print this attribute of each match; links are made absolute
    #[arg(long, value_name = "NAME", conflicts_with = "text")]
    attr: Option<String>,

    /// Print the text of each match instead of its markup
    #[arg(long)]
    text: bool,

    /// Print matches as a JSON array
    #[arg(long)]
    json: bool,

    /// Stop after the first match
    #[arg(long)]
    first: bool,
}

/// Attributes that hold URLs.
const LINK_ATTRS: &[&str] = &["href", "src", "action", "cite", "poster", "formaction"];

/// One match, as printed by `--json`.
#[derive(Serialize)]
struct Match {
    tag: String,
    text: String,
    html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    attr: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(0) => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}

fn read_input(path: &str) -> Result<String, String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("stdin: {e}"))?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))
    }
}

/// Run the query and print the results. Returns the number of matches.
fn run(cli: &Cli) -> Result<usize, String> {
    let html = read_input(&cli.input)?;
    let bridge = Bridge::new();
    let doc = if cli.fragment {
        bridge.parse_fragment(&html, &cli.base)
    } else {
        bridge.parse(&html, &cli.base)
    };

    let matches = find(&bridge, doc, cli)?;
    let rendered = matches
        .iter()
        .map(|&h| describe(&bridge, h, cli.attr.as_deref()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;

    if cli.json {
        let out = serde_json::to_string_pretty(&rendered).map_err(|e| e.to_string())?;
        println!("{out}");
    } else {
        for m in &rendered {
            match (&cli.attr, cli.text) {
                (Some(_), _) => println!("{}", m.attr.as_deref().unwrap_or_default()),
                (None, true) => println!("{}", m.text),
                (None, false) => println!("{}", m.html),
            }
        }
    }

    bridge.dispose();
    Ok(rendered.len())
}

fn find(bridge: &Bridge, doc: Handle, cli: &Cli) -> Result<Vec<Handle>, String> {
    if cli.first {
        return match bridge.select_first(doc, &cli.selector) {
            Ok(h) => Ok(vec![h]),
            Err(dombridge::BridgeError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e.to_string()),
        };
    }

    let list = bridge
        .select(doc, &cli.selector)
        .map_err(|e| e.to_string())?;
    let len = bridge.size(list).map_err(|e| e.to_string())?;
    (0..len)
        .map(|i| bridge.get(list, i as i64).map_err(|e| e.to_string()))
        .collect()
}

fn describe(bridge: &Bridge, handle: Handle, attr: Option<&str>) -> dombridge::Result<Match> {
    let attr = match attr {
        Some(name) if LINK_ATTRS.contains(&name) => {
            let raw = bridge.attr(handle, name)?;
            let resolved = bridge.node_abs_url(handle, name)?;
            match raw {
                Some(_) if !resolved.is_empty() => Some(resolved),
                other => other,
            }
        }
        Some(name) => bridge.attr(handle, name)?,
        None => None,
    };
    Ok(Match {
        tag: bridge.tag_name(handle)?,
        text: bridge.text(handle)?,
        html: bridge.outer_html(handle)?,
        attr,
    })
}
