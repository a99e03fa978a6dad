use std::fs::File;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use tokio::io::{AsyncBufReadExt, BufReader};

use reviewfeed::api::{FeedItem, FeedSource};
use reviewfeed::core::config::{self, CliOverrides, FeedConfig, ResolvedConfig};
use reviewfeed::core::pager::{PagerEntry, pager_links};
use reviewfeed::core::query::ReviewQuery;
use reviewfeed::core::session::{FeedSession, LoadOutcome};
use reviewfeed::seo::sitemap::{SitemapKind, build_sitemap, build_sitemap_index};
use reviewfeed::seo::{SeoDocument, SiteInfo, robots, rss};

#[derive(Parser)]
#[command(name = "reviewfeed", about = "Review feeds, pagers, sitemaps and RSS")]
struct Args {
    /// Use fixture data instead of the review API
    #[arg(long)]
    mock: bool,

    /// Review API base URL (overrides REVIEWFEED_API_URL and the config file)
    #[arg(long)]
    api_url: Option<String>,

    /// Public site origin used in sitemaps and RSS
    #[arg(long)]
    site_url: Option<String>,

    /// Level written to reviewfeed.log
    #[arg(long, default_value = "debug")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print pager entries and their links
    Pager {
        #[arg(long)]
        current: i64,
        #[arg(long)]
        total: i64,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Print the sitemap index or one sub-sitemap
    Sitemap {
        #[arg(long, value_enum, default_value_t)]
        kind: SitemapArg,
        /// Sub-sitemap page for reviews and products
        #[arg(long)]
        page: Option<String>,
    },
    /// Print one page of the RSS feed
    Rss {
        #[arg(long)]
        page: Option<String>,
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
    /// Print robots.txt
    Robots,
    /// Follow the live feed; reads commands from stdin
    Watch {
        #[arg(long)]
        sort: Option<String>,
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum SitemapArg {
    #[default]
    Index,
    Static,
    Categories,
    Reviews,
    Products,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to reviewfeed.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("reviewfeed.log") {
        let _ = WriteLogger::init(args.log_level, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        warn!("Ignoring config file: {}", e);
        eprintln!("warning: {e}; using defaults");
        FeedConfig::default()
    });
    let overrides = CliOverrides {
        api_url: args.api_url.clone(),
        mock: args.mock,
        site_url: args.site_url.clone(),
    };
    let resolved = config::resolve(&file_config, &overrides);
    info!("reviewfeed starting: {:?}", resolved);

    let source = reviewfeed::build_source(&resolved);
    let site = SiteInfo::from(&resolved);

    match args.command {
        Command::Pager {
            current,
            total,
            sort,
            category,
        } => {
            let query = ReviewQuery::from_params(None, sort.as_deref(), category.as_deref());
            print_pager(&query, &resolved.base_path, current, total);
        }
        Command::Sitemap { kind, page } => {
            let page = ReviewQuery::from_params(page.as_deref(), None, None).page;
            let doc = match kind {
                SitemapArg::Index => build_sitemap_index(source.as_ref(), &site).await,
                SitemapArg::Static => build_sitemap(source.as_ref(), &site, SitemapKind::Static).await,
                SitemapArg::Categories => {
                    build_sitemap(source.as_ref(), &site, SitemapKind::Categories).await
                }
                SitemapArg::Reviews => {
                    build_sitemap(source.as_ref(), &site, SitemapKind::Reviews(page)).await
                }
                SitemapArg::Products => {
                    build_sitemap(source.as_ref(), &site, SitemapKind::Products(page)).await
                }
            };
            print_document(&doc);
        }
        Command::Rss {
            page,
            sort,
            category,
        } => {
            let query = ReviewQuery::from_params(page.as_deref(), sort.as_deref(), category.as_deref());
            let doc = rss::build_reviews_feed(source.as_ref(), &site, &query).await;
            print_document(&doc);
        }
        Command::Robots => print_document(&robots::build_robots(&site)),
        Command::Watch { sort, category } => {
            let query = ReviewQuery::from_params(None, sort.as_deref(), category.as_deref());
            watch(source, &resolved, query).await?;
        }
    }
    Ok(())
}

fn print_pager(query: &ReviewQuery, base_path: &str, current: i64, total: i64) {
    let entries = pager_links(current, total, |page| {
        query.href(base_path, u32::try_from(page).unwrap_or(u32::MAX))
    });
    if entries.is_empty() {
        println!("(no pages)");
    }
    for entry in entries {
        match entry {
            PagerEntry::Link {
                page,
                href,
                current,
            } => {
                let marker = if current { "*" } else { " " };
                println!("{marker}{page:>6}  {href}");
            }
            PagerEntry::Ellipsis => println!("     …"),
        }
    }
}

fn print_document(doc: &SeoDocument) {
    println!("Content-Type: {}", doc.content_type);
    println!("Cache-Control: {}", doc.cache_control);
    println!();
    print!("{}", doc.body);
}

fn print_items(items: &[FeedItem], offset: usize) {
    for (i, item) in items.iter().enumerate() {
        println!(
            "{:>4}. [{}] {} by {} ({} likes)",
            offset + i + 1,
            item.created_at.format("%Y-%m-%d %H:%M"),
            item.title,
            item.author.as_deref().unwrap_or("anonymous"),
            item.like_count
        );
    }
}

async fn watch(
    source: Arc<dyn FeedSource>,
    config: &ResolvedConfig,
    query: ReviewQuery,
) -> std::io::Result<()> {
    let mut session = FeedSession::start(source, query, config.session).await;
    print_items(&session.visible(), 0);
    println!("commands: more | apply | status | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "more" | "m" => {
                let before = session.visible().len();
                match session.load_more().await {
                    LoadOutcome::Skipped => println!("nothing more to load"),
                    LoadOutcome::Loaded { .. } => {
                        let visible = session.visible();
                        print_items(&visible[before.min(visible.len())..], before);
                    }
                    LoadOutcome::Failed(e) => println!("load failed: {e}"),
                }
            }
            "apply" | "a" => {
                let added = session.apply_new_items();
                println!("{added} new reviews added");
                if added > 0 {
                    print_items(&session.visible()[..added], 0);
                }
            }
            "status" | "s" => {
                let snapshot = session.snapshot();
                println!(
                    "{} visible, {} new waiting, more: {}{}",
                    snapshot.visible.len(),
                    snapshot.pending_count,
                    snapshot.has_more,
                    snapshot
                        .last_error
                        .map(|e| format!(", last error: {e}"))
                        .unwrap_or_default()
                );
            }
            "quit" | "q" => break,
            "" => {}
            other => println!("unknown command: {other}"),
        }
    }

    session.close();
    Ok(())
}
