use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use estate_scout::filters::FilterCriteria;
use estate_scout::format::{
    format_date, format_price, format_square_feet, truncate_text, CARD_TEXT_LEN,
};
use estate_scout::models::{NewTask, Property, PropertyType, TaskStatus};
use estate_scout::saved::SavedTracker;
use estate_scout::sort::{sort_properties, SortKey};
use estate_scout::store::{
    MockStore, PropertyStore, RemoteStore, StoreError, FEATURED_LIMIT, SIMILAR_LIMIT,
};
use estate_scout::tasks::is_overdue;

#[derive(Parser)]
#[command(name = "estate-scout", about = "Browse, filter and track property listings")]
struct Cli {
    /// Use the in-memory mock store instead of the remote backend
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Default)]
struct FilterArgs {
    /// Free-text search over title, address and description
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    price_min: Option<i64>,
    #[arg(long)]
    price_max: Option<i64>,
    /// Property type; repeat for several (house, condo, townhouse, apartment, land, commercial)
    #[arg(long = "type")]
    property_types: Vec<PropertyType>,
    #[arg(long)]
    beds_min: Option<u32>,
    #[arg(long)]
    baths_min: Option<u32>,
    #[arg(long)]
    sqft_min: Option<u32>,
    /// Required amenity; repeat for several (any one matching is enough)
    #[arg(long = "amenity")]
    amenities: Vec<String>,
}

impl FilterArgs {
    fn into_criteria(self) -> FilterCriteria {
        FilterCriteria {
            price_min: self.price_min,
            price_max: self.price_max,
            property_types: self.property_types,
            bedrooms_min: self.beds_min,
            bathrooms_min: self.baths_min,
            square_feet_min: self.sqft_min,
            amenities: self.amenities,
            query: self.query,
        }
        .normalized()
    }
}

#[derive(Subcommand)]
enum Command {
    /// List properties, optionally filtered and sorted
    Browse {
        #[command(flatten)]
        filters: FilterArgs,
        /// newest, price-low, price-high, beds-high or sqft-high
        #[arg(long, default_value = "newest")]
        sort: SortKey,
    },
    /// Show the featured listings strip
    Featured,
    /// Show one property with its similar listings and tasks
    Show { id: u32 },
    /// Save a property
    Save { id: u32 },
    /// Remove a property from the saved list
    Unsave { id: u32 },
    /// Toggle a property's saved state
    Toggle { id: u32 },
    /// List saved properties
    Saved,
    /// List saved searches
    Searches,
    /// Persist the given filters as a named search
    SaveSearch {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Delete a saved search
    DeleteSearch { id: u32 },
    /// List all tasks
    Tasks,
    /// Create a task, optionally tied to a property
    AddTask {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        due: Option<chrono::NaiveDate>,
        #[arg(long)]
        property: Option<u32>,
    },
}

fn print_listing(index: usize, property: &Property) {
    println!(
        "{}. {} ({})",
        index + 1,
        property.title,
        format_price(property.price)
    );
    println!(
        "   {} | {} bd / {} ba / {} sqft",
        property.address,
        property.bedrooms,
        property.bathrooms,
        format_square_feet(property.square_feet)
    );
    let listed = property
        .listing_date
        .map(format_date)
        .unwrap_or_else(|| "date unknown".to_string());
    println!("   {} · listed {}", property.property_type, listed);
}

async fn run(store: Arc<dyn PropertyStore>, command: Command) -> Result<()> {
    match command {
        Command::Browse { filters, sort } => {
            let criteria = filters.into_criteria();
            let results = if criteria.is_empty() {
                info!("browsing all listings");
                store.list_all().await?
            } else {
                info!("searching with {} active filters", criteria.active_count());
                store.search(&criteria).await?
            };
            let results = sort_properties(&results, sort);
            println!("{} properties", results.len());
            for (i, property) in results.iter().enumerate() {
                print_listing(i, property);
            }
        }
        Command::Featured => {
            let featured = store.list_featured(FEATURED_LIMIT).await?;
            println!("{} featured properties", featured.len());
            for (i, property) in featured.iter().enumerate() {
                print_listing(i, property);
            }
        }
        Command::Show { id } => match store.get_by_id(id).await {
            Ok(property) => {
                println!("{} - {}", property.title, format_price(property.price));
                println!("{}", property.address);
                println!(
                    "{} bd / {} ba / {} sqft · built {}",
                    property.bedrooms,
                    property.bathrooms,
                    format_square_feet(property.square_feet),
                    property.year_built
                );
                if !property.description.is_empty() {
                    println!("{}", truncate_text(&property.description, CARD_TEXT_LEN));
                }
                if !property.amenities.is_empty() {
                    println!("Amenities: {}", property.amenities.join(", "));
                }

                let similar = store.list_similar(id, SIMILAR_LIMIT).await?;
                if !similar.is_empty() {
                    println!("\nSimilar properties:");
                    for (i, p) in similar.iter().enumerate() {
                        print_listing(i, p);
                    }
                }

                let tasks = store.tasks_for_property(id).await?;
                if !tasks.is_empty() {
                    let today = chrono::Utc::now().date_naive();
                    println!("\nTasks:");
                    for task in &tasks {
                        let due = task
                            .due_date
                            .map(format_date)
                            .unwrap_or_else(|| "no due date".to_string());
                        let flag = if is_overdue(task, today) { " (overdue)" } else { "" };
                        println!("- [{}] {} - {}{}", task.status, task.name, due, flag);
                    }
                }
            }
            Err(StoreError::NotFound(_)) => println!("No property with id {id}."),
            Err(err) => return Err(err.into()),
        },
        Command::Save { id } => {
            let tracker = SavedTracker::new(store.clone());
            tracker.load().await?;
            match tracker.save(id).await {
                Ok(true) => println!("Property saved."),
                Ok(false) => println!("Property was already saved."),
                Err(err) => {
                    warn!("saving failed: {err}");
                    println!("Failed to update saved properties. Try again.");
                }
            }
        }
        Command::Unsave { id } => {
            let tracker = SavedTracker::new(store.clone());
            tracker.load().await?;
            match tracker.unsave(id).await {
                Ok(true) => println!("Property removed from saved list."),
                Ok(false) => println!("Property was not saved."),
                Err(err) => {
                    warn!("removing failed: {err}");
                    println!("Failed to update saved properties. Try again.");
                }
            }
        }
        Command::Toggle { id } => {
            let tracker = SavedTracker::new(store.clone());
            tracker.load().await?;
            match tracker.toggle(id).await {
                Ok(true) => println!("Property saved."),
                Ok(false) => println!("Property removed from saved list."),
                Err(err) => {
                    warn!("saving failed: {err}");
                    println!("Failed to update saved properties. Try again.");
                }
            }
        }
        Command::Saved => {
            let tracker = SavedTracker::new(store.clone());
            tracker.load().await?;
            let ids = tracker.saved_ids();
            if ids.is_empty() {
                println!("No saved properties yet.");
            }
            let mut shown = 0;
            for id in ids {
                match store.get_by_id(id).await {
                    Ok(property) => {
                        print_listing(shown, &property);
                        shown += 1;
                    }
                    // A listing can disappear from the store after being saved
                    Err(StoreError::NotFound(_)) => warn!("saved property {id} no longer exists"),
                    Err(err) => return Err(err.into()),
                }
            }
        }
        Command::Searches => {
            let searches = store.list_saved_searches().await?;
            if searches.is_empty() {
                println!("No saved searches.");
            }
            for search in searches {
                println!(
                    "{}: {} - {} results, {} filters, saved {}",
                    search.id,
                    search.name,
                    search.result_count,
                    search.filters.active_count(),
                    format_date(search.created_at.date_naive())
                );
            }
        }
        Command::SaveSearch { name, filters } => {
            let criteria = filters.into_criteria();
            let result_count = store.search(&criteria).await?.len() as u32;
            let search = store.save_search(&name, &criteria, result_count).await?;
            println!(
                "Saved search \"{}\" ({} current results).",
                search.name, search.result_count
            );
        }
        Command::DeleteSearch { id } => match store.delete_search(id).await {
            Ok(()) => println!("Search deleted."),
            Err(StoreError::NotFound(_)) => println!("No saved search with id {id}."),
            Err(err) => return Err(err.into()),
        },
        Command::Tasks => {
            let tasks = store.list_tasks().await?;
            if tasks.is_empty() {
                println!("No tasks.");
            }
            let today = chrono::Utc::now().date_naive();
            for task in &tasks {
                let due = task
                    .due_date
                    .map(format_date)
                    .unwrap_or_else(|| "no due date".to_string());
                let flag = if is_overdue(task, today) { " (overdue)" } else { "" };
                println!("{}: [{}] {} - {}{}", task.id, task.status, task.name, due, flag);
            }
        }
        Command::AddTask {
            name,
            description,
            due,
            property,
        } => {
            let task = store
                .create_task(NewTask {
                    name,
                    description,
                    status: TaskStatus::NotStarted,
                    due_date: due,
                    assigned_to: None,
                    property_id: property,
                })
                .await?;
            println!("Created task {} ({}).", task.id, task.name);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Backend selection happens once, here; everything downstream sees
    // only the PropertyStore trait.
    let store: Arc<dyn PropertyStore> = if cli.mock {
        Arc::new(MockStore::new())
    } else {
        Arc::new(RemoteStore::from_env()?)
    };
    info!("using {} store", store.source_name());

    run(store, cli.command).await
}
