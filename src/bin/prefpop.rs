use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use prefpop::join::{columns, join_series};
use prefpop::{
    Category, Client, ClientConfig, JoinedRow, PrefectureCatalog, Region, SelectionStore,
};
use prefpop::{storage, viz};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "prefpop",
    version,
    about = "Fetch, join, export & chart Japanese prefecture population trends"
)]
struct Cli {
    #[command(flatten)]
    conn: ConnArgs,
    #[command(subcommand)]
    cmd: Command,
}

/// Connection settings; each overrides its PREFPOP_* environment variable.
#[derive(Args, Debug)]
struct ConnArgs {
    /// API key sent as X-API-KEY (env: PREFPOP_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,
    /// API base URL (env: PREFPOP_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Per-request timeout in seconds (env: PREFPOP_TIMEOUT_SECS, default 30)
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List prefecture codes and names.
    Prefectures(PrefecturesArgs),
    /// Fetch population series for prefectures (and optionally save, plot, or print them).
    Chart(ChartArgs),
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct PrefecturesArgs {
    /// Group the list by region.
    #[arg(long, default_value_t = false)]
    by_region: bool,
}

#[derive(Args, Debug)]
struct ChartArgs {
    /// Prefecture codes separated by comma or semicolon (e.g., 1,13,47)
    #[arg(short, long)]
    prefs: String,
    /// Population category to fetch: total, young, working or elderly.
    #[arg(short = 'C', long, value_parser = str::parse::<Category>, default_value_t = Category::Total)]
    category: Category,
    /// Save the joined table to file (format inferred by --format or extension).
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
    /// Create a chart at the given path (.svg or .png).
    #[arg(long)]
    plot: Option<PathBuf>,
    /// Width of the plot (default 1000).
    #[arg(long, default_value_t = 1000)]
    width: u32,
    /// Height of the plot (default 600).
    #[arg(long, default_value_t = 600)]
    height: u32,
    /// Font file for chart text, e.g. one with Japanese glyphs (env: PREFPOP_FONT).
    #[arg(long)]
    font: Option<PathBuf>,
}

fn parse_codes(s: &str) -> Result<Vec<u32>> {
    let codes = s
        .split([',', ';'])
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(|x| {
            x.parse::<u32>()
                .map_err(|_| anyhow!("invalid prefecture code {x:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    if codes.is_empty() {
        bail!("at least one prefecture code required");
    }
    Ok(codes)
}

fn client_config(conn: &ConnArgs) -> ClientConfig {
    let mut cfg = ClientConfig::from_env();
    if let Some(key) = &conn.api_key {
        cfg.api_key = Some(key.clone());
    }
    if let Some(url) = &conn.base_url {
        cfg.base_url = url.clone();
    }
    if let Some(secs) = conn.timeout {
        cfg.timeout = Duration::from_secs(secs.max(1));
    }
    cfg
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let client = Client::new(client_config(&cli.conn)).context("build http client")?;
    match cli.cmd {
        Command::Prefectures(args) => cmd_prefectures(&client, args),
        Command::Chart(args) => cmd_chart(&client, args),
    }
}

fn load_catalog(client: &Client) -> Result<PrefectureCatalog> {
    let catalog = PrefectureCatalog::load(client);
    match catalog.error() {
        Some(err) => bail!("{err}"),
        None => Ok(catalog),
    }
}

fn cmd_prefectures(client: &Client, args: PrefecturesArgs) -> Result<()> {
    let catalog = load_catalog(client)?;
    if args.by_region {
        for region in Region::ALL {
            println!("{} ({})", region.name(), region.id());
            for p in catalog.by_region(region) {
                println!("  {:>2}  {}", p.code, p.name);
            }
        }
    } else {
        for p in catalog.prefectures() {
            println!("{:>2}  {}", p.code, p.name);
        }
    }
    Ok(())
}

fn cmd_chart(client: &Client, args: ChartArgs) -> Result<()> {
    let codes = parse_codes(&args.prefs)?;
    let category = args.category;
    let catalog = load_catalog(client)?;

    let store = SelectionStore::new(client);
    store.change_category(category)?;
    for code in codes {
        let name = catalog
            .name_of(code)
            .ok_or_else(|| anyhow!("unknown prefecture code {code}"))?;
        store.toggle_entity(code, name, true)?;
    }

    let selection = store.selection();
    let rows = join_series(&selection);
    let cols = columns(&selection);

    if let Some(path) = args.out.as_ref() {
        let fmt = match args.format {
            Some(OutFormat::Csv) => "csv",
            Some(OutFormat::Json) => "json",
            None => path.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
        }
        .to_ascii_lowercase();
        match fmt.as_str() {
            "csv" => storage::save_csv(&rows, &cols, path)?,
            "json" => storage::save_json(&rows, path)?,
            other => bail!("unsupported format: {}", other),
        }
        eprintln!("Saved {} rows to {}", rows.len(), path.display());
    }

    if let Some(plot_path) = args.plot.as_ref() {
        if let Some(font) = args.font.as_ref() {
            viz::use_font_file(font)?;
        }
        viz::plot_rows(&rows, &cols, category, plot_path, args.width, args.height)?;
        eprintln!("Wrote plot to {}", plot_path.display());
    }

    if args.out.is_none() && args.plot.is_none() {
        print_table(&rows, &cols);
    }
    Ok(())
}

fn print_table(rows: &[JoinedRow], cols: &[String]) {
    let mut header = String::from("year");
    for c in cols {
        header.push('\t');
        header.push_str(c);
    }
    println!("{header}");
    for row in rows {
        let mut line = row.year.to_string();
        for c in cols {
            line.push('\t');
            match row.get(c) {
                Some(v) => line.push_str(&v.to_string()),
                None => line.push('-'),
            }
        }
        println!("{line}");
    }
}
