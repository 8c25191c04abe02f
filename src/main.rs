use std::{path::Path, sync::Arc};

use anyhow::Context;
use bookrent::{
    CatalogClient, CatalogQueryEngine, EngineConfig, FetchOutcome, MemorySession, QueryState,
    SessionStore,
    cart::Cart,
    config::Config,
    domain::{
        display::Star,
        models::{Book, BookId, QueryFilters, SortOrder},
    },
    engine::highlight::Segment,
};
use clap::{Args, Parser, Subcommand};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder, prelude::*};

type BookrentResult<T> = anyhow::Result<T>;

#[derive(Debug, Parser)]
#[command(name = "bookrent", version, about = "Browse and rent books from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List book categories
    Categories,
    /// Submit a title/author/isbn search
    Search {
        query: String,
        #[command(flatten)]
        browse: BrowseArgs,
    },
    /// Browse the filtered catalog; `--query` only re-ranks locally
    Browse {
        #[arg(long)]
        query: Option<String>,
        #[command(flatten)]
        browse: BrowseArgs,
    },
    /// Show one book
    Book { id: String },
    /// Rent a book
    Rent {
        id: String,
        #[arg(long)]
        address: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Show the rental cart
    Orders {
        /// Order status code (1-7)
        #[arg(long)]
        status: Option<u8>,
    },
}

#[derive(Debug, Args)]
struct BrowseArgs {
    #[arg(long)]
    category: Option<i64>,
    #[arg(long)]
    available_only: bool,
    #[arg(long)]
    best_sellers: bool,
    #[arg(long)]
    new_releases: bool,
    /// Sort titles descending
    #[arg(long)]
    desc: bool,
    /// How many pages to scroll through
    #[arg(long, default_value_t = 1)]
    pages: u32,
    #[arg(long)]
    page_size: Option<u32>,
}

impl BrowseArgs {
    fn filters(&self) -> QueryFilters {
        QueryFilters {
            best_sellers: self.best_sellers,
            new_releases: self.new_releases,
            available_only: self.available_only,
            sort_order: if self.desc { SortOrder::Desc } else { SortOrder::Asc },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> BookrentResult<()> {
    // Respect RUST_LOG if set, default to info for our crate and warn for deps.
    let default_filter = format!("{}=info,reqwest=warn,h2=warn", env!("CARGO_CRATE_NAME"));
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish()
        .with(ErrorLayer::default())
        .init();

    // Load environment variables from .env files
    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    };
    let cli = Cli::parse();
    let config = Config::load()?;
    if let Err(e) = config.validate() {
        return Err(anyhow::anyhow!(e));
    }

    let session = Arc::new(match config.token() {
        Some(token) => MemorySession::with_token(token),
        None => MemorySession::new(),
    });
    let client = CatalogClient::new(&config.base_url, session.clone(), config.request_timeout())
        .with_context(|| "Failed to build HTTP client")?;

    if session.bearer_token().is_none() {
        if let Some((email, password)) = config.login_credentials() {
            let credential = client
                .login(email, password, false)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .with_context(|| "Login failed")?;
            session.login(credential);
        }
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.base_url,
        has_token = session.bearer_token().is_some(),
        "configured catalog client"
    );

    match cli.command {
        Command::Categories => {
            let categories = client
                .get_categories()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            for c in categories {
                println!("{:>5}  {} ({} books)", c.id, c.name, c.book_count);
            }
        }
        Command::Search { query, browse } => {
            let mut engine = build_engine(&client, &config, &browse);
            engine.set_search_query(query);
            let first = engine.execute_search().await;
            scroll(&mut engine, first, browse.pages).await?;
            print_results(engine.state());
        }
        Command::Browse { query, browse } => {
            let mut engine = build_engine(&client, &config, &browse);
            let first = engine.load().await;
            scroll(&mut engine, first, browse.pages).await?;
            if let Some(q) = query {
                engine.set_search_query(q);
            }
            print_results(engine.state());
        }
        Command::Book { id } => {
            let book = client
                .get_book(&BookId(id))
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print_book_detail(&book);
        }
        Command::Rent { id, address, notes } => {
            client
                .checkout(&[BookId(id)], &address, &notes)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .with_context(|| "Failed to rent the book")?;
            println!("Book rented successfully!");
        }
        Command::Orders { status } => {
            let mut cart = Cart::new(status);
            cart.refresh(&client)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print_cart(&cart);
        }
    }
    Ok(())
}

fn build_engine(
    client: &CatalogClient,
    config: &Config,
    browse: &BrowseArgs,
) -> CatalogQueryEngine<CatalogClient> {
    let mut engine_config = EngineConfig::new(
        browse.category,
        browse.page_size.unwrap_or(config.page_size),
    );
    engine_config.local_ranking = config.local_ranking;
    CatalogQueryEngine::new(Arc::new(client.clone()), engine_config).with_filters(browse.filters())
}

/// Applies the first outcome, then keeps loading pages until `pages` are in or the end is reached.
async fn scroll(
    engine: &mut CatalogQueryEngine<CatalogClient>,
    first: FetchOutcome,
    pages: u32,
) -> BookrentResult<()> {
    let mut outcome = first;
    loop {
        match outcome {
            FetchOutcome::Failed(e) => return Err(anyhow::anyhow!(e.user_message())),
            FetchOutcome::Skipped | FetchOutcome::Stale => break,
            FetchOutcome::Applied { .. } => {}
        }
        if engine.current_page() >= pages.max(1) {
            break;
        }
        outcome = engine.load_next_page().await;
    }
    Ok(())
}

fn render(segments: &[Segment<'_>]) -> String {
    segments
        .iter()
        .map(|s| {
            if s.highlighted {
                format!("\x1b[30;43m{}\x1b[0m", s.text)
            } else {
                s.text.to_string()
            }
        })
        .collect()
}

fn render_stars(book: &Book) -> String {
    book.stars()
        .iter()
        .map(|s| match s {
            Star::Full => '★',
            Star::Half => '⯪',
            Star::Empty => '☆',
        })
        .collect()
}

fn print_results(state: &QueryState) {
    let shown = state.displayed();
    if shown.is_empty() {
        println!("No books found");
        return;
    }
    for (i, book) in shown.iter().enumerate() {
        let authors = if book.authors.is_empty() {
            book.author_line()
        } else {
            book.authors
                .iter()
                .map(|a| render(&state.highlight(&a.name)))
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!("{:>3}. {}", i + 1, render(&state.highlight(&book.title)));
        println!("     By {authors}");
        println!(
            "     {} {}  |  {} of {} available",
            render_stars(book),
            book.review_label(),
            book.available_copies,
            book.total_copies
        );
        if let Some(isbn) = &book.isbn {
            println!("     ISBN: {}", render(&state.highlight(isbn)));
        }
    }
    println!(
        "{} shown, {} loaded of {} total",
        shown.len(),
        state.results().len(),
        state.total_count()
    );
}

fn print_book_detail(book: &Book) {
    println!("{}", book.title);
    println!("By {}", book.author_line());
    println!("{} {}", render_stars(book), book.review_label());
    for (label, value) in [
        ("Category", &book.category),
        ("Publisher", &book.publisher),
        ("Binding", &book.binding),
        ("ISBN", &book.isbn),
    ] {
        if let Some(v) = value {
            println!("{label}: {v}");
        }
    }
    println!(
        "Copies: {}/{}{}",
        book.available_copies,
        book.total_copies,
        if book.is_available { "" } else { " (unavailable)" }
    );
    println!("Cover: {}", book.image_url);
    if let Some(d) = &book.description {
        println!("\n{d}");
    }
}

fn print_cart(cart: &Cart) {
    for order in cart.orders() {
        for book in &order.books {
            println!(
                "#{} {} - {} [{}]",
                order.order_id,
                book.title,
                book.authors.join(", "),
                book.status.as_deref().unwrap_or("-")
            );
        }
    }
    let t = cart.totals();
    println!("{} Books", t.books_count);
    println!("Subtotal:  {}", t.subtotal);
    println!("Discount:  {}", t.discount);
    println!("Delivery:  {}", t.delivery);
    println!("Total:     {}", t.total);

    let borrowed = cart.borrowed_books();
    if !borrowed.is_empty() {
        println!("\nBorrowed:");
        for (i, b) in borrowed.iter().enumerate() {
            let author = b.authors.first().map(String::as_str).unwrap_or("");
            println!(
                "{}. {} - {} ({})",
                i + 1,
                b.title,
                author,
                b.status.as_deref().unwrap_or("")
            );
        }
    }
}
