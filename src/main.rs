mod api;
mod config;
mod dates;
mod domain;
mod error;
mod ingest;
mod libraries;
mod session;
mod stats;
mod storage;
mod timeline;
mod ui;

use std::collections::HashSet;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use log::warn;
use serde_json::Value;

use crate::api::{ApiClient, ApiError};
use crate::config::{AppConfig, load_config};
use crate::dates::{format_date, parse_date};
use crate::domain::{Book, Library, Review, ReviewDraft, WishlistDraft, WishlistPatch};
use crate::error::LibraryError;
use crate::ingest::reviews_from_api;
use crate::libraries::StateDir;
use crate::session::{FileTokenStore, Session};
use crate::stats::{WRAP_DEFAULT_PAGES, aggregate, compute_metrics, home_stats, word_cloud, wrap_pages};
use crate::storage::{load_library, save_library};
use crate::timeline::{FilterMode, ZoomState, filter_for_period};
use crate::ui::{print_timeline, run_dashboard};

#[derive(Debug, Parser)]
#[command(name = "wrappedup", about = "Terminal reading tracker with yearly wraps")]
struct Cli {
	#[arg(long)]
	library: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Init {
		#[arg(long)]
		owner: Option<String>,
	},
	Dashboard,
	AddReview {
		#[arg(long)]
		title: String,
		#[arg(long)]
		author: Option<String>,
		#[arg(long)]
		pages: Option<u32>,
		#[arg(long)]
		rating: i64,
		#[arg(long)]
		start: String,
		#[arg(long)]
		end: String,
		#[arg(long, default_value = "")]
		text: String,
	},
	Reviews,
	RemoveReview {
		#[arg(long)]
		id: String,
	},
	/// Merge reviews from a JSON export of the review service.
	Import {
		#[arg(long)]
		file: PathBuf,
	},
	/// Pull reviews and wishlist from the review service.
	Sync,
	Timeline {
		#[arg(long, value_enum, default_value_t = FilterMode::Year)]
		mode: FilterMode,
		#[arg(long)]
		date: Option<String>,
		/// Zoom steps from the default level; negative zooms out.
		#[arg(long, default_value_t = 0, allow_hyphen_values = true)]
		zoom_steps: i32,
		#[arg(long, default_value_t = 0)]
		offset: i64,
		#[arg(long, default_value_t = 80)]
		width: u16,
	},
	Wrap {
		#[arg(long, value_enum, default_value_t = FilterMode::Year)]
		mode: FilterMode,
		#[arg(long)]
		date: Option<String>,
	},
	Metrics {
		#[arg(long)]
		id: String,
	},
	Home,
	WishAdd {
		#[arg(long)]
		title: String,
		#[arg(long)]
		author: Option<String>,
		#[arg(long)]
		pages: Option<u32>,
		#[arg(long)]
		description: Option<String>,
		#[arg(long)]
		priority: Option<i64>,
		#[arg(long)]
		public: bool,
		#[arg(long)]
		remote: bool,
	},
	WishList {
		#[arg(long)]
		public: bool,
	},
	WishUpdate {
		#[arg(long)]
		id: String,
		#[arg(long)]
		description: Option<String>,
		#[arg(long)]
		priority: Option<i64>,
		#[arg(long)]
		public: Option<bool>,
		#[arg(long)]
		remote: bool,
	},
	WishRemove {
		#[arg(long)]
		id: String,
		#[arg(long)]
		remote: bool,
	},
	Search {
		query: String,
		#[arg(long, default_value_t = 10)]
		limit: usize,
	},
	Login {
		#[arg(long)]
		token: String,
	},
	Logout,
	Libraries {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
}

fn main() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let state = StateDir::locate();
	let config = load_config(&state.config_path())?;
	let session = Session::new(Box::new(FileTokenStore::new(state.token_path())))?;
	let mut client = ApiClient::new(config.api_base_url.clone(), session)?;

	match &cli.command {
		Some(Command::Libraries { limit }) => return print_recent_libraries(&state, *limit),
		Some(Command::Login { token }) => {
			client.session_mut().login(token)?;
			println!("logged in; token stored at {}", state.token_path().display());
			return Ok(());
		}
		Some(Command::Logout) => {
			client.session_mut().logout()?;
			println!("logged out");
			return Ok(());
		}
		Some(Command::Search { query, limit }) => return search_catalog(&mut client, query, *limit),
		_ => {}
	}

	let mut library_path = state.resolve_library(cli.library)?;
	let mut library = load_library(&library_path)?;
	if let Err(err) = state.remember(&library_path, Utc::now()) {
		warn!("failed to store recent library: {err}");
	}

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Init { owner } => {
			if owner.is_some() {
				library.header.owner = owner;
			}
			save_library(&library_path, &library)?;
			println!("initialized library at {}", library_path.display());
		}
		Command::Dashboard => {
			run_dashboard(&mut library, &mut library_path, &config, &mut client)?;
		}
		Command::AddReview {
			title,
			author,
			pages,
			rating,
			start,
			end,
			text,
		} => {
			let draft = ReviewDraft {
				title,
				author,
				pages,
				rating,
				start_date: start,
				end_date: end,
				text,
			};
			let review_id = library.add_review(draft, Utc::now())?;
			save_library(&library_path, &library)?;
			println!("added review {review_id}");
		}
		Command::Reviews => {
			print_reviews(&library);
		}
		Command::RemoveReview { id } => {
			let review = library.remove_review(&id)?;
			save_library(&library_path, &library)?;
			println!("removed review {id} ({})", review.book.title);
		}
		Command::Import { file } => {
			let raw = fs::read_to_string(&file)?;
			let values = match serde_json::from_str::<Value>(&raw)? {
				Value::Array(values) => values,
				_ => return Err(format!("{} must contain a JSON array of reviews", file.display()).into()),
			};
			let (added, updated) = library.merge_reviews(reviews_from_api(&values));
			save_library(&library_path, &library)?;
			println!("imported {added} new and {updated} updated reviews from {} entries", values.len());
		}
		Command::Sync => {
			let reviews = client.fetch_reviews()?;
			let (added, updated) = library.merge_reviews(reviews);
			let wishlist = client.fetch_wishlist()?;
			let wishlist_count = wishlist.len();
			for item in wishlist {
				library.upsert_wishlist_item(item);
			}
			save_library(&library_path, &library)?;
			println!("reviews: {added} added, {updated} updated | wishlist: {wishlist_count} entries");
		}
		Command::Timeline {
			mode,
			date,
			zoom_steps,
			offset,
			width,
		} => {
			let today = Local::now().date_naive();
			let mut zoom = ZoomState::new(mode, parse_day(date.as_deref())?, today);
			for _ in 0..zoom_steps.unsigned_abs() {
				if zoom_steps > 0 {
					zoom.zoom_in();
				} else {
					zoom.zoom_out();
				}
			}
			print_timeline(&library, &zoom, offset, width, today);
		}
		Command::Wrap { mode, date } => {
			print_wrap(&library, &config, mode, parse_day(date.as_deref())?);
		}
		Command::Metrics { id } => {
			let review = library.review(&id).ok_or(LibraryError::ReviewNotFound(id.clone()))?;
			print_metrics(review);
		}
		Command::Home => {
			print_home(&library, &config);
		}
		Command::WishAdd {
			title,
			author,
			pages,
			description,
			priority,
			public,
			remote,
		} => {
			let draft = WishlistDraft {
				book: Book::new(title, author, pages),
				description,
				priority,
				is_public: public,
			};
			let mut item = draft.into_item(Utc::now())?;
			if remote {
				item = client.create_wishlist_item(&item)?;
			}
			let item_id = item.id.clone();
			library.upsert_wishlist_item(item);
			save_library(&library_path, &library)?;
			println!("added wishlist entry {item_id}");
		}
		Command::WishList { public } => {
			print_wishlist(&library, public);
		}
		Command::WishUpdate {
			id,
			description,
			priority,
			public,
			remote,
		} => {
			let patch = WishlistPatch {
				description,
				priority,
				is_public: public,
			};
			let mut item = library.update_wishlist_item(&id, &patch, Utc::now())?.clone();
			if remote {
				item = client.update_wishlist_item(&item)?;
				library.upsert_wishlist_item(item.clone());
			}
			save_library(&library_path, &library)?;
			println!(
				"updated {} | P{} | {}",
				item.book.title,
				item.priority,
				if item.is_public { "public" } else { "private" }
			);
		}
		Command::WishRemove { id, remote } => {
			if library.wishlist_item(&id).is_none() {
				return Err(LibraryError::WishlistItemNotFound(id).into());
			}
			if remote {
				client.delete_wishlist_item(&id)?;
			}
			let item = library.remove_wishlist_item(&id)?;
			save_library(&library_path, &library)?;
			println!("removed wishlist entry {id} ({})", item.book.title);
		}
		Command::Libraries { .. }
		| Command::Login { .. }
		| Command::Logout
		| Command::Search { .. } => {}
	}

	Ok(())
}

fn print_recent_libraries(state: &StateDir, limit: usize) -> Result<(), Box<dyn Error>> {
	let rows = state.recent_libraries(limit)?;
	if rows.is_empty() {
		println!("no recent libraries");
		return Ok(());
	}

	for (index, entry) in rows.iter().enumerate() {
		let opened = entry
			.opened_at
			.map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
			.unwrap_or_else(|| "-".to_string());
		println!("{:>2}. {opened:<16}  {}", index + 1, entry.path.display());
	}

	Ok(())
}

fn search_catalog(client: &mut ApiClient, query: &str, limit: usize) -> Result<(), Box<dyn Error>> {
	let books = match client.searcher().search(query) {
		Ok(books) => books,
		Err(ApiError::Unauthorized) => {
			client.expire_session()?;
			return Err(ApiError::Unauthorized.into());
		}
		Err(err) => return Err(err.into()),
	};

	if books.is_empty() {
		println!("no results for {query:?}");
		return Ok(());
	}

	for book in books.iter().take(limit) {
		let pages = book
			.pages
			.map(|pages| format!("{pages} pages"))
			.unwrap_or_else(|| "pages unknown".to_string());
		println!("{} | {} | {}", book.title, book.author_label(), pages);
	}

	Ok(())
}

fn parse_day(input: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
	match input {
		Some(raw) => Ok(parse_date(raw)?),
		None => Ok(Local::now().date_naive()),
	}
}

fn date_span(review: &Review) -> String {
	match review.date_range() {
		Some(range) => format!("{} .. {}", format_date(range.start), format_date(range.end)),
		None => "undated".to_string(),
	}
}

fn print_reviews(library: &Library) {
	if library.reviews.is_empty() {
		println!("no reviews yet");
		return;
	}

	let mut reviews = library.reviews.iter().collect::<Vec<_>>();
	reviews.sort_by(|left, right| right.end_date.cmp(&left.end_date));
	for review in reviews {
		println!(
			"{} | {}/5 | {} | {} | {}",
			review.id,
			review.rating,
			date_span(review),
			review.book.title,
			review.book.author_label()
		);
	}
}

fn print_wrap(library: &Library, config: &AppConfig, mode: FilterMode, reference: NaiveDate) {
	let intervals = filter_for_period(mode, reference, &library.intervals());
	let stats = aggregate(&intervals, wrap_pages);

	println!("wrap for {}", mode.period_label(reference));
	if intervals.is_empty() {
		println!("no dated reviews in this period");
		return;
	}

	println!("books read:      {}", stats.books_read);
	println!("pages read:      {}", stats.pages_read);
	println!("reading days:    {}", stats.total_reading_days);
	println!("avg days/book:   {:.1}", stats.avg_days_per_book);
	println!("avg rating:      {:.2}", stats.avg_rating);
	println!("avg pages/day:   {:.1}", stats.avg_pages_per_day);

	let mut favourites = intervals.iter().collect::<Vec<_>>();
	favourites.sort_by(|left, right| {
		right
			.rating
			.cmp(&left.rating)
			.then_with(|| left.start_date.cmp(&right.start_date))
	});
	println!("\ntop rated:");
	for interval in favourites.iter().take(3) {
		println!("{}/5 | {}", interval.rating, interval.title);
	}

	let ids = intervals
		.iter()
		.map(|interval| interval.id.as_str())
		.collect::<HashSet<_>>();
	let texts = library
		.reviews
		.iter()
		.filter(|review| ids.contains(review.id.as_str()))
		.map(|review| review.text.as_str());
	let words = word_cloud(texts, config.word_cloud_size);
	if !words.is_empty() {
		println!("\nwords:");
		let line = words
			.iter()
			.map(|word| format!("{}({})", word.word, word.count))
			.collect::<Vec<_>>()
			.join(" ");
		println!("{line}");
	}
}

fn print_metrics(review: &Review) {
	let metrics = compute_metrics(review, review.book.pages_or(WRAP_DEFAULT_PAGES), Utc::now());
	let basic = metrics.basic();

	println!("{} | {}", review.book.title, review.book.author_label());
	println!("read:            {}", date_span(review));
	println!("total days:      {}", basic.total_days);
	println!("reflection days: {}", basic.reflection_days);
	println!("review length:   {} chars, {} words", basic.review_length, basic.words_in_review);
	match metrics.pages() {
		Some(pages) => {
			println!("pages/day:       {:.1}", pages.pages_per_day);
			println!("days/page:       {:.1}", pages.time_per_page);
			println!("chars/page:      {:.1}", pages.review_density);
			println!("value/page:      {:.1}", pages.value_per_page);
		}
		None => println!("page metrics:    unavailable (no page count or dates)"),
	}
}

fn print_home(library: &Library, config: &AppConfig) {
	let today = Local::now().date_naive();
	let home = home_stats(&library.reviews, today, config.estimate_default_pages);
	println!("books read:      {}", home.books_read);
	println!("estimated pages: {}", home.estimated_pages);
	println!("this year:       {}", home.books_this_year);
	println!("avg rating:      {:.2}", home.avg_rating);
}

fn print_wishlist(library: &Library, public_only: bool) {
	let items = library.wishlist_by_priority(public_only);
	if items.is_empty() {
		println!("wishlist is empty");
		return;
	}

	for item in items {
		println!(
			"{} | P{} | {} | {} | {}{}",
			item.id,
			item.priority,
			if item.is_public { "public" } else { "private" },
			item.book.title,
			item.book.author_label(),
			item.description
				.as_ref()
				.map(|value| format!(" | {value}"))
				.unwrap_or_default()
		);
	}
}
