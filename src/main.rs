use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use ip_atlas::{
    logger::{setup_logger, LogTarget},
    lookup::{
        asn::asn_from_label,
        history::{fetch_summary, today_utc},
        parse_address_list, GeoClient, LookupOrchestrator, LookupRow, PrefixHistoryClient,
        PrefixQuery,
    },
    proxy::{FilterSelection, ProxyLoader, ProxyView, RecordSource, ResourceLocation},
    tui::{LookupApp, ProxyViewerApp},
    Config,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// IP/ASN lookup and proxy-list viewer
#[derive(Parser)]
#[command(name = "ip-atlas", version)]
#[command(about = "IP/ASN lookup and proxy-list viewer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: log::LevelFilter,

    /// Log file used while a TUI owns the terminal
    #[arg(long, global = true, default_value = "ip-atlas.log")]
    log_file: PathBuf,

    /// HTTP timeout in seconds
    #[arg(long, global = true, default_value = "15")]
    timeout: u64,

    /// Announced-prefixes API URL
    #[arg(long, global = true, default_value = ip_atlas::DEFAULT_PREFIX_ENDPOINT)]
    prefix_endpoint: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up geolocation and ASN for up to 50 addresses
    Lookup {
        /// Addresses to look up
        addresses: Vec<String>,
        /// File with one address per line ("-" for stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Lookups allowed in flight at once
        #[arg(short = 'n', long, default_value = "1")]
        concurrency: usize,
        /// Print rows as JSON lines
        #[arg(long)]
        json: bool,
        /// Open the interactive lookup TUI
        #[arg(long)]
        tui: bool,
        /// Geolocation API base URL
        #[arg(long, default_value = ip_atlas::DEFAULT_GEO_ENDPOINT)]
        geo_endpoint: String,
    },
    /// List prefixes an ASN announced on one UTC day
    History {
        /// ASN, with or without the AS prefix
        #[arg(long)]
        asn: String,
        /// Day to query (YYYY-MM-DD), defaults to today in UTC
        #[arg(long)]
        date: Option<String>,
        /// Print every prefix instead of the first 50
        #[arg(long)]
        all: bool,
    },
    /// Browse a proxy list in the interactive viewer
    Proxies {
        /// Data file path or URL
        #[arg(short, long, default_value = "alive.txt")]
        source: String,
        /// Country name map (JSON) path or URL
        #[arg(long, default_value = "countries.json")]
        countries: String,
        /// Auto-refresh period in seconds
        #[arg(long, default_value = "600")]
        refresh_secs: u64,
        /// Rows revealed per "load more"
        #[arg(long, default_value = "50")]
        page_size: usize,
    },
    /// Print a filtered proxy list
    Filter {
        /// Data file path or URL
        #[arg(short, long, default_value = "alive.txt")]
        source: String,
        /// Country code to keep
        #[arg(long)]
        country: Option<String>,
        /// Port to keep
        #[arg(long)]
        port: Option<String>,
        /// Print full records instead of addresses only
        #[arg(long)]
        csv: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::new()
        .with_timeout(Duration::from_secs(cli.timeout))
        .with_prefix_endpoint(cli.prefix_endpoint);

    let uses_tui = matches!(
        cli.command,
        Commands::Proxies { .. } | Commands::Lookup { tui: true, .. }
    );
    let target = if uses_tui {
        LogTarget::File(&cli.log_file)
    } else {
        LogTarget::Stderr
    };
    setup_logger(Some(cli.log_level), target)?;

    match cli.command {
        Commands::Lookup {
            addresses,
            file,
            concurrency,
            json,
            tui,
            geo_endpoint,
        } => {
            let config = config
                .with_concurrency(concurrency)
                .with_geo_endpoint(geo_endpoint);
            let mut list = addresses;
            if let Some(path) = file {
                list.extend(parse_address_list(&read_input(&path)?));
            }

            let orchestrator =
                LookupOrchestrator::new(GeoClient::from_config(&config)?).with_concurrency(config.concurrency);

            if tui {
                let prefixes = PrefixHistoryClient::from_config(&config)?;
                let mut app = LookupApp::new(orchestrator, prefixes, list.join("\n"));
                app.run().await?;
                return Ok(());
            }

            let result = orchestrator
                .run_with(&list, |_, row| print_row(&row, json))
                .await;
            if let Err(e) = result {
                eprintln!("{}", e);
                std::process::exit(2);
            }
        }
        Commands::History { asn, date, all } => {
            let asn = asn_from_label(&asn).unwrap_or(asn);
            let query = match date {
                Some(d) => PrefixQuery::parse(Some(&asn), &d),
                None => PrefixQuery::new(Some(&asn), Some(today_utc())),
            }?;

            let client = PrefixHistoryClient::from_config(&config)?;
            let summary = fetch_summary(&client, query).await?;

            println!("{}", summary.headline());
            let shown = if all { &summary.prefixes[..] } else { summary.sample() };
            for prefix in shown {
                println!("  {}", prefix);
            }
            if summary.is_empty() || (summary.is_truncated() && !all) {
                println!("{}", summary.note().unwrap_or_default());
            }
        }
        Commands::Proxies {
            source,
            countries,
            refresh_secs,
            page_size,
        } => {
            let config = config
                .with_page_size(page_size)
                .with_refresh_interval(Duration::from_secs(refresh_secs.max(1)));
            let loader = ProxyLoader::from_config(&config, ResourceLocation::parse(&source))?;
            let names = loader
                .load_country_names(&ResourceLocation::parse(&countries))
                .await;

            let mut app = ProxyViewerApp::new(loader, names, config.page_size, config.refresh_interval);
            app.run().await?;
        }
        Commands::Filter {
            source,
            country,
            port,
            csv,
        } => {
            let loader = ProxyLoader::from_config(&config, ResourceLocation::parse(&source))?;
            let records = loader
                .load_records()
                .await
                .map_err(|e| anyhow!("Failed to load {}: {}", source, e))?;

            let mut view = ProxyView::new(config.page_size);
            view.replace_records(records);
            view.apply_filter(FilterSelection::new(country, port));
            let text = if csv { view.csv_text() } else { view.addresses_text() };
            match text {
                Some(text) => println!("{}", text),
                None => eprintln!("No matching records."),
            }
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}

fn print_row(row: &LookupRow, json: bool) {
    if json {
        match serde_json::to_string(row) {
            Ok(line) => println!("{}", line),
            Err(e) => log::error!("Failed to encode row for {}: {}", row.address(), e),
        }
    } else {
        println!("{}", row);
    }
}
