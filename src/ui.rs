use std::cell::Cell;
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Local, NaiveDate, Utc};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use crossterm::{ExecutableCommand, execute};
use log::{LevelFilter, debug, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use crate::api::{ApiClient, ApiError, SearchGate, SearchTicket};
use crate::config::AppConfig;
use crate::dates::{format_date, parse_date};
use crate::domain::{
	Book, Library, MAX_PRIORITY, MAX_RATING, MIN_PRIORITY, MIN_RATING, ReadingInterval, Review, ReviewDraft,
	WishlistDraft, WishlistPatch, check_rating, optional_text, required_text,
};
use crate::libraries::{RecentLibrary, StateDir};
use crate::stats::{
	AggregateStats, HomeStats, ReviewMetrics, WRAP_DEFAULT_PAGES, WordWeight, aggregate, compute_metrics, home_stats,
	word_cloud, wrap_pages,
};
use crate::storage::{load_library, save_library};
use crate::timeline::{
	FilterMode, Lane, TimelineViewport, ZoomState, compute_window, filter_for_period, nominal_period, pack_intervals,
};

const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);
const SESSION_REFRESH_INTERVAL: StdDuration = StdDuration::from_secs(2);
const TICK: StdDuration = StdDuration::from_millis(100);

type SearchReply = (SearchTicket, Result<Vec<Book>, ApiError>);

pub fn run_dashboard(
	library: &mut Library,
	library_path: &mut PathBuf,
	config: &AppConfig,
	client: &mut ApiClient,
) -> Result<(), Box<dyn Error>> {
	// Log lines written to stderr would tear the alternate screen.
	let log_level = log::max_level();
	log::set_max_level(LevelFilter::Off);

	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, library, library_path, config, client);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;
	log::set_max_level(log_level);

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	library: &mut Library,
	library_path: &mut PathBuf,
	config: &AppConfig,
	client: &mut ApiClient,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::new(Local::now().date_naive());
	let (reply_tx, reply_rx) = mpsc::channel::<SearchReply>();

	let session_changed = Rc::new(Cell::new(false));
	let flag = Rc::clone(&session_changed);
	client.session_mut().subscribe(move |_| flag.set(true));
	let mut last_refresh = Instant::now();

	loop {
		let today = Local::now().date_naive();
		let view = build_view(&app, library, config, today, Utc::now());
		app.sync_with_view(&view);
		let signed_in = client.session().is_authenticated();
		terminal.draw(|frame| draw_dashboard(frame, &app, &view, signed_in))?;

		receive_search_results(&mut app, &reply_rx, client);
		if let InputMode::Search(search) = &mut app.mode {
			if search.is_due(config.search_debounce()) {
				start_search(search, &mut app.gate, client, &reply_tx);
			}
		}

		if last_refresh.elapsed() >= SESSION_REFRESH_INTERVAL {
			if let Err(err) = client.session_mut().refresh() {
				warn!("failed to re-read session token: {err}");
			}
			last_refresh = Instant::now();
		}
		if session_changed.replace(false) {
			app.status = if client.session().is_authenticated() {
				"Signed in".to_string()
			} else {
				"Signed out; run `wrappedup login` to search".to_string()
			};
		}

		if event::poll(TICK)? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code, library, library_path),
					InputMode::Select(_) => handle_select_key(&mut app, key.code, library, library_path),
					InputMode::Search(_) => handle_search_key(&mut app, key.code, library, library_path),
					InputMode::Normal => handle_normal_key(&mut app, key.code, library, library_path, &view, today),
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &ViewModel, signed_in: bool) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(12), Constraint::Length(4)])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
		.split(layout[0]);

	let left = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(8), Constraint::Percentage(40)])
		.split(body[0]);

	let right = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Length(10),
			Constraint::Length(7),
			Constraint::Min(6),
			Constraint::Length(7),
		])
		.split(body[1]);

	render_timeline_panel(frame, left[0], app, view);
	render_reviews_panel(frame, left[1], app, view);
	render_stats_panel(frame, right[0], view, signed_in);
	render_metrics_panel(frame, right[1], view);
	render_wishlist_panel(frame, right[2], app, view);
	render_word_cloud_panel(frame, right[3], view);
	render_footer(frame, layout[1], app);

	match &app.mode {
		InputMode::Select(select) => render_select_popup(frame, select),
		InputMode::Search(search) => render_search_popup(frame, search),
		InputMode::Normal | InputMode::Prompt(_) => {}
	}
}

fn render_timeline_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let title = format!(
		"Timeline | {} | zoom {:.1}x | {} lane{}",
		view.period_label,
		app.zoom.level(),
		view.lanes.len(),
		if view.lanes.len() == 1 { "" } else { "s" }
	);
	let block = Block::default()
		.borders(Borders::ALL)
		.title(title)
		.border_style(border_style(app.focus == FocusPane::Timeline));

	let Some(viewport) = view.viewport else {
		let empty = Paragraph::new("(no dated reviews in this period)").block(block);
		frame.render_widget(empty, area);
		return;
	};

	let width = area.width.saturating_sub(2);
	let mut lines = vec![axis_line(&viewport, width)];
	for lane in &view.lanes {
		lines.push(styled_lane_line(lane, &viewport, width, view.selected_review_id()));
	}

	frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_reviews_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = view
		.review_rows
		.iter()
		.map(|row| ListItem::new(row.line.clone()))
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !view.review_rows.is_empty() {
		state.select(Some(app.review_index.min(view.review_rows.len() - 1)));
	}

	let block = Block::default()
		.borders(Borders::ALL)
		.title(format!("Reviews ({})", view.review_rows.len()))
		.border_style(border_style(app.focus == FocusPane::Reviews));
	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(no reviews in this period)")]
	} else {
		items
	})
	.block(block)
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_stats_panel(frame: &mut Frame, area: Rect, view: &ViewModel, signed_in: bool) {
	let stats = &view.stats;
	let home = &view.home;
	let lines = vec![
		Line::from(Span::styled(
			view.period_label.clone(),
			Style::default().add_modifier(Modifier::BOLD),
		)),
		Line::from(format!("Books read: {}", stats.books_read)),
		Line::from(format!("Pages read: {}", stats.pages_read)),
		Line::from(format!("Reading days: {}", stats.total_reading_days)),
		Line::from(format!(
			"Avg {:.1} days/book | {:.1} pages/day",
			stats.avg_days_per_book, stats.avg_pages_per_day
		)),
		Line::from(format!("Avg rating: {}", stars(stats.avg_rating))),
		Line::from(Span::styled(
			format!(
				"All time: {} books, ~{} pages, {} this year",
				home.books_read, home.estimated_pages, home.books_this_year
			),
			Style::default().fg(Color::Gray),
		)),
		Line::from(Span::styled(
			if signed_in { "online" } else { "offline" },
			Style::default().fg(if signed_in { Color::Green } else { Color::DarkGray }),
		)),
	];

	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Wrap"));
	frame.render_widget(panel, area);
}

fn render_metrics_panel(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let lines = match &view.details {
		Some(details) => metrics_lines(details),
		None => vec![Line::from("(select a review)")],
	};
	let panel = Paragraph::new(lines)
		.wrap(Wrap { trim: true })
		.block(Block::default().borders(Borders::ALL).title("Review Metrics"));
	frame.render_widget(panel, area);
}

fn metrics_lines(details: &ReviewDetails) -> Vec<Line<'static>> {
	let basic = details.metrics.basic();
	let mut lines = vec![Line::from(Span::styled(
		details.heading.clone(),
		Style::default().add_modifier(Modifier::BOLD),
	))];

	if basic.total_days == 0 {
		lines.push(Line::from("No reading dates"));
	} else {
		lines.push(Line::from(format!(
			"Read in {} day{} | finished {} day{} ago",
			basic.total_days,
			if basic.total_days == 1 { "" } else { "s" },
			basic.reflection_days,
			if basic.reflection_days == 1 { "" } else { "s" }
		)));
	}
	lines.push(Line::from(format!(
		"Review: {} chars, {} words",
		basic.review_length, basic.words_in_review
	)));

	match details.metrics.pages() {
		Some(pages) => {
			lines.push(Line::from(format!(
				"{:.1} pages/day | {:.1} days/page",
				pages.pages_per_day, pages.time_per_page
			)));
			lines.push(Line::from(format!(
				"{:.1} chars/page | {:.1} stars per 100 pages",
				pages.review_density, pages.value_per_page
			)));
		}
		None => lines.push(Line::from(Span::styled(
			"No page count",
			Style::default().fg(Color::DarkGray),
		))),
	}
	lines
}

fn render_wishlist_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = view
		.wishlist_rows
		.iter()
		.map(|row| ListItem::new(row.line.clone()))
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	if !view.wishlist_rows.is_empty() {
		state.select(Some(app.wishlist_index.min(view.wishlist_rows.len() - 1)));
	}

	let block = Block::default()
		.borders(Borders::ALL)
		.title("Wishlist")
		.border_style(border_style(app.focus == FocusPane::Wishlist));
	let list = List::new(if items.is_empty() {
		vec![ListItem::new("(empty, press / to search)")]
	} else {
		items
	})
	.block(block)
	.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_word_cloud_panel(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let mut spans = Vec::new();
	for word in &view.words {
		spans.push(Span::styled(word.word.clone(), word_style(word)));
		spans.push(Span::raw(" "));
	}
	let text = if spans.is_empty() {
		Line::from("(no review text)")
	} else {
		Line::from(spans)
	};

	let panel = Paragraph::new(text)
		.wrap(Wrap { trim: true })
		.block(Block::default().borders(Borders::ALL).title("Words"));
	frame.render_widget(panel, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("Tab pane | j/k select | m/y/a month/year/all | n/N next/prev period | t today | +/- zoom | h/l scroll | q quit"),
			Line::from("r new review | / search books | d delete | [/] priority | v public | e note | g switch library"),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
		],
		InputMode::Search(_) => vec![
			Line::from("Type to search the catalog"),
			Line::from(app.status.clone()),
			Line::from("Up/Down move | Enter add to wishlist | Esc close"),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(62, 55, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()).style(option.style))
			.collect::<Vec<_>>()
	};

	let current = if select.options.is_empty() {
		0
	} else {
		select.selected.saturating_add(1)
	};
	let total = select.options.len();
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(format!("{} ({current}/{total})", select.title)),
		)
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len().saturating_sub(1))));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn render_search_popup(frame: &mut Frame, search: &SearchState) {
	let area = centered_rect(70, 60, frame.area());
	frame.render_widget(Clear, area);

	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Length(3), Constraint::Min(3)])
		.split(area);

	let input = Paragraph::new(format!("> {}", search.input)).block(
		Block::default()
			.borders(Borders::ALL)
			.title(if search.loading { "Search (loading...)" } else { "Search" }),
	);
	frame.render_widget(input, layout[0]);

	let items = if search.results.is_empty() {
		vec![ListItem::new(if search.input.trim().is_empty() {
			"(type a title or author)"
		} else {
			"(no results)"
		})]
	} else {
		search
			.results
			.iter()
			.map(|book| {
				let pages = book.pages.map(|pages| format!(" | {pages} p.")).unwrap_or_default();
				ListItem::new(format!("{} | {}{}", book.title, book.author_label(), pages))
			})
			.collect::<Vec<_>>()
	};

	let mut state = ListState::default();
	if !search.results.is_empty() {
		state.select(Some(search.selected.min(search.results.len() - 1)));
	}
	let list = List::new(items)
		.block(Block::default().borders(Borders::ALL).title("Results"))
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));
	frame.render_stateful_widget(list, layout[1], &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

/// One column of a lane: which read covers it and which title character
/// sits there, if any.
#[derive(Clone, Copy)]
struct BarCell<'a> {
	interval: &'a ReadingInterval,
	label: Option<char>,
}

fn lane_cells<'a>(lane: &'a Lane, viewport: &TimelineViewport, width: u16) -> Vec<Option<BarCell<'a>>> {
	let mut cells = vec![None; width as usize];
	for interval in &lane.intervals {
		let Some((start, end)) = viewport.columns_for(interval, width) else {
			continue;
		};
		let mut label = interval.title.chars();
		for column in start..=end {
			cells[column as usize] = Some(BarCell {
				interval,
				label: label.next(),
			});
		}
	}
	cells
}

fn styled_lane_line(lane: &Lane, viewport: &TimelineViewport, width: u16, selected: Option<&str>) -> Line<'static> {
	let mut spans: Vec<Span<'static>> = Vec::new();
	let mut run = String::new();
	let mut run_style = Style::default();

	for cell in lane_cells(lane, viewport, width) {
		let (ch, style) = match cell {
			Some(cell) => {
				let mut style = rating_style(cell.interval.rating);
				if selected == Some(cell.interval.id.as_str()) {
					style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
				}
				(cell.label.unwrap_or(' '), style)
			}
			None => (' ', Style::default()),
		};
		if style != run_style && !run.is_empty() {
			spans.push(Span::styled(std::mem::take(&mut run), run_style));
		}
		run_style = style;
		run.push(ch);
	}
	if !run.is_empty() {
		spans.push(Span::styled(run, run_style));
	}
	Line::from(spans)
}

fn plain_lane_line(lane: &Lane, viewport: &TimelineViewport, width: u16) -> String {
	lane_cells(lane, viewport, width)
		.into_iter()
		.map(|cell| match cell {
			Some(cell) => cell.label.unwrap_or('='),
			None => ' ',
		})
		.collect()
}

fn axis_text(viewport: &TimelineViewport, width: u16) -> String {
	let start = format_date(viewport.visible_start());
	let end = format_date(viewport.visible_end());
	let width = width as usize;
	if width < start.len() + end.len() + 1 {
		return start.chars().take(width).collect();
	}
	format!("{start}{}{end}", " ".repeat(width - start.len() - end.len()))
}

fn axis_line(viewport: &TimelineViewport, width: u16) -> Line<'static> {
	Line::from(Span::styled(axis_text(viewport, width), Style::default().fg(Color::DarkGray)))
}

/// Plain-text timeline for the `timeline` command.
pub fn print_timeline(library: &Library, zoom: &ZoomState, offset_days: i64, width: u16, today: NaiveDate) {
	let intervals = filter_for_period(zoom.mode(), zoom.reference(), &library.intervals());
	let Some(window) = compute_window(zoom.mode(), zoom.reference(), &intervals, today) else {
		println!("no dated reviews for {}", zoom.mode().period_label(zoom.reference()));
		return;
	};
	let viewport = TimelineViewport::new(window, zoom.level(), offset_days);
	let lanes = pack_intervals(&intervals);

	println!(
		"{} | window {} .. {} | zoom {:.1}x | {} lane(s)",
		zoom.mode().period_label(zoom.reference()),
		format_date(window.start),
		format_date(window.end),
		zoom.level(),
		lanes.len()
	);
	println!("        {}", axis_text(&viewport, width));
	for (index, lane) in lanes.iter().enumerate() {
		println!("lane {:>2} |{}|", index + 1, plain_lane_line(lane, &viewport, width));
	}

	println!();
	for (index, lane) in lanes.iter().enumerate() {
		for interval in &lane.intervals {
			println!(
				"[{}] {} .. {} | {} | {}",
				index + 1,
				format_date(interval.start_date),
				format_date(interval.end_date),
				stars(interval.rating as f64),
				interval.title
			);
		}
	}
}

fn handle_normal_key(
	app: &mut App,
	code: KeyCode,
	library: &mut Library,
	library_path: &mut PathBuf,
	view: &ViewModel,
	today: NaiveDate,
) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Tab => {
			app.focus = app.focus.next();
			false
		}
		KeyCode::BackTab => {
			app.focus = app.focus.prev();
			false
		}
		KeyCode::Up | KeyCode::Char('k') => {
			app.move_selection(-1, view);
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			app.move_selection(1, view);
			false
		}
		KeyCode::Left | KeyCode::Char('h') => {
			app.scroll(-1, view);
			false
		}
		KeyCode::Right | KeyCode::Char('l') => {
			app.scroll(1, view);
			false
		}
		KeyCode::Char('m') => {
			app.set_filter(FilterMode::Month, app.zoom.reference(), today);
			false
		}
		KeyCode::Char('y') => {
			app.set_filter(FilterMode::Year, app.zoom.reference(), today);
			false
		}
		KeyCode::Char('a') => {
			app.set_filter(FilterMode::All, app.zoom.reference(), today);
			false
		}
		KeyCode::Char('n') => {
			app.shift_period(1, today);
			false
		}
		KeyCode::Char('N') => {
			app.shift_period(-1, today);
			false
		}
		KeyCode::Char('t') => {
			app.set_filter(app.zoom.mode(), today, today);
			false
		}
		KeyCode::Char('+') | KeyCode::Char('=') => {
			app.zoom.zoom_in();
			app.status = format!("zoom {:.1}x", app.zoom.level());
			false
		}
		KeyCode::Char('-') => {
			app.zoom.zoom_out();
			app.status = format!("zoom {:.1}x", app.zoom.level());
			false
		}
		KeyCode::Char('r') => {
			app.mode = InputMode::Prompt(PromptState::new("Book title", PromptKind::ReviewTitle));
			false
		}
		KeyCode::Char('/') => {
			app.mode = InputMode::Search(SearchState::default());
			app.status = "Waiting for input".to_string();
			false
		}
		KeyCode::Char('g') => {
			match build_library_switch_select(library_path.as_path()) {
				Ok(select) => app.mode = InputMode::Select(select),
				Err(err) => app.status = err,
			}
			false
		}
		KeyCode::Char('d') => {
			let select = match app.focus {
				FocusPane::Wishlist => view
					.wishlist_rows
					.get(app.wishlist_index)
					.map(|row| build_delete_select(DeleteTarget::Wishlist, &row.id, &row.title)),
				FocusPane::Timeline | FocusPane::Reviews => view
					.review_rows
					.get(app.review_index)
					.map(|row| build_delete_select(DeleteTarget::Review, &row.id, &row.title)),
			};
			match select {
				Some(select) => app.mode = InputMode::Select(select),
				None => app.status = "Nothing selected to delete".to_string(),
			}
			false
		}
		KeyCode::Char('[') | KeyCode::Char(']') | KeyCode::Char('v') | KeyCode::Char('e') => {
			if app.focus != FocusPane::Wishlist {
				app.status = "Focus the Wishlist to edit entries".to_string();
				return false;
			}
			let Some(row) = view.wishlist_rows.get(app.wishlist_index) else {
				app.status = "No wishlist entry selected".to_string();
				return false;
			};

			let patch = match code {
				KeyCode::Char('[') => WishlistPatch {
					priority: Some((row.priority.saturating_sub(1)).max(MIN_PRIORITY) as i64),
					..Default::default()
				},
				KeyCode::Char(']') => WishlistPatch {
					priority: Some((row.priority + 1).min(MAX_PRIORITY) as i64),
					..Default::default()
				},
				KeyCode::Char('v') => WishlistPatch {
					is_public: Some(!row.is_public),
					..Default::default()
				},
				_ => {
					let mut prompt = PromptState::new(
						"Wishlist note (empty clears it)",
						PromptKind::WishlistNote {
							item_id: row.id.clone(),
						},
					);
					prompt.input = row.description.clone().unwrap_or_default();
					app.mode = InputMode::Prompt(prompt);
					return false;
				}
			};
			app.status = match update_wishlist(library, library_path.as_path(), &row.id, &patch) {
				Ok(message) => message,
				Err(err) => format!("error: {err}"),
			};
			false
		}
		_ => false,
	}
}

fn handle_prompt_key(app: &mut App, code: KeyCode, library: &mut Library, library_path: &mut PathBuf) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				other => {
					app.mode = other;
					return false;
				}
			};

			match submit_prompt(prompt.clone(), library, library_path.as_path()) {
				Ok(PromptOutcome::NextPrompt(next_prompt)) => app.mode = InputMode::Prompt(next_prompt),
				Ok(PromptOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key(app: &mut App, code: KeyCode, library: &mut Library, library_path: &mut PathBuf) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				other => {
					app.mode = other;
					return false;
				}
			};

			match submit_select(select.clone(), library, library_path) {
				Ok(message) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_search_key(app: &mut App, code: KeyCode, library: &mut Library, library_path: &mut PathBuf) -> bool {
	let InputMode::Search(search) = &mut app.mode else {
		return false;
	};

	match code {
		KeyCode::Esc => {
			app.gate.cancel();
			app.mode = InputMode::Normal;
			app.status = "Search closed".to_string();
		}
		KeyCode::Backspace => {
			search.input.pop();
			search.touch();
		}
		KeyCode::Char(value) => {
			search.input.push(value);
			search.touch();
		}
		KeyCode::Up => {
			search.selected = search.selected.saturating_sub(1);
		}
		KeyCode::Down => {
			if !search.results.is_empty() {
				search.selected = (search.selected + 1).min(search.results.len() - 1);
			}
		}
		KeyCode::Enter => {
			let Some(book) = search.results.get(search.selected).cloned() else {
				app.status = "No result selected".to_string();
				return false;
			};
			match add_to_wishlist(library, library_path.as_path(), book) {
				Ok(message) => {
					app.gate.cancel();
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => app.status = format!("error: {err}"),
			}
		}
		_ => {}
	}

	false
}

fn start_search(search: &mut SearchState, gate: &mut SearchGate, client: &ApiClient, replies: &Sender<SearchReply>) {
	let query = search.input.trim().to_string();
	search.edited_at = None;
	search.searched = Some(query.clone());

	if query.is_empty() {
		gate.cancel();
		search.results.clear();
		search.loading = false;
		return;
	}

	let ticket = gate.begin();
	search.loading = true;
	let searcher = client.searcher();
	let replies = replies.clone();
	thread::spawn(move || {
		let result = searcher.search(&query);
		if replies.send((ticket, result)).is_err() {
			debug!("search for {query:?} finished after the dashboard closed");
		}
	});
}

fn receive_search_results(app: &mut App, replies: &Receiver<SearchReply>, client: &mut ApiClient) {
	while let Ok((ticket, result)) = replies.try_recv() {
		let outcome = app.gate.accept(ticket, result);
		if matches!(outcome, Err(ApiError::Cancelled)) {
			debug!("discarded results of a superseded search");
			continue;
		}

		let InputMode::Search(search) = &mut app.mode else {
			continue;
		};
		search.loading = false;
		match outcome {
			Ok(books) => {
				app.status = format!("{} result{}", books.len(), if books.len() == 1 { "" } else { "s" });
				search.results = books;
				search.selected = 0;
			}
			Err(ApiError::Unauthorized) => {
				app.status = match client.expire_session() {
					Ok(()) => ApiError::Unauthorized.to_string(),
					Err(err) => format!("{}; {err}", ApiError::Unauthorized),
				};
			}
			Err(err) => app.status = format!("search failed: {err}"),
		}
	}
}

fn submit_prompt(prompt: PromptState, library: &mut Library, library_path: &Path) -> Result<PromptOutcome, String> {
	let input = prompt.input;
	let next = |title: &str, kind: PromptKind, prefill: String| -> Result<PromptOutcome, String> {
		let mut next_prompt = PromptState::new(title, kind);
		next_prompt.input = prefill;
		Ok(PromptOutcome::NextPrompt(next_prompt))
	};

	match prompt.kind {
		PromptKind::ReviewTitle => {
			let draft = ReviewDraft {
				title: required_text(&input, "title").map_err(|err| err.to_string())?,
				..Default::default()
			};
			next("Author (optional)", PromptKind::ReviewAuthor { draft }, String::new())
		}
		PromptKind::ReviewAuthor { mut draft } => {
			draft.author = optional_text(Some(input.as_str()));
			next("Page count (optional)", PromptKind::ReviewPages { draft }, String::new())
		}
		PromptKind::ReviewPages { mut draft } => {
			draft.pages = match optional_text(Some(input.as_str())) {
				Some(raw) => Some(
					raw.parse::<u32>()
						.map_err(|_| format!("page count must be a whole number, got {raw:?}"))?,
				),
				None => None,
			};
			next(
				&format!("Rating ({MIN_RATING}-{MAX_RATING})"),
				PromptKind::ReviewRating { draft },
				String::new(),
			)
		}
		PromptKind::ReviewRating { mut draft } => {
			let rating = input
				.trim()
				.parse::<i64>()
				.map_err(|_| format!("rating must be a number, got {:?}", input.trim()))?;
			draft.rating = check_rating(rating).map_err(|err| err.to_string())?.into();
			let today = format_date(Local::now().date_naive());
			next("Started reading (YYYY-MM-DD)", PromptKind::ReviewStart { draft }, today)
		}
		PromptKind::ReviewStart { mut draft } => {
			parse_date(&input).map_err(|err| err.to_string())?;
			draft.start_date = input.trim().to_string();
			let today = format_date(Local::now().date_naive());
			next("Finished reading (YYYY-MM-DD)", PromptKind::ReviewEnd { draft }, today)
		}
		PromptKind::ReviewEnd { mut draft } => {
			draft.end_date = input.trim().to_string();
			draft.validate().map_err(|err| err.to_string())?;
			next("Review text", PromptKind::ReviewText { draft }, String::new())
		}
		PromptKind::ReviewText { mut draft } => {
			draft.text = input;
			let title = draft.title.clone();
			library.add_review(draft, Utc::now()).map_err(|err| err.to_string())?;
			persist(library_path, library)?;
			Ok(PromptOutcome::Done(format!("added review: {title}")))
		}
		PromptKind::WishlistNote { item_id } => {
			let patch = WishlistPatch {
				description: Some(input),
				..Default::default()
			};
			update_wishlist(library, library_path, &item_id, &patch).map(PromptOutcome::Done)
		}
	}
}

fn submit_select(select: SelectState, library: &mut Library, library_path: &mut PathBuf) -> Result<String, String> {
	let selected_value = select
		.selected_option()
		.map(|option| option.value.clone())
		.ok_or_else(|| "no option selected".to_string())?;

	match select.kind {
		SelectKind::LibrarySwitch => {
			let selected_path = selected_value
				.map(PathBuf::from)
				.ok_or_else(|| "selected library path is missing".to_string())?;
			switch_library(library, library_path, selected_path)
		}
		SelectKind::DeleteConfirm { target, id, title } => {
			let action = selected_value
				.as_deref()
				.ok_or_else(|| "selected action is missing".to_string())?;
			if action != "delete" {
				return Ok("Delete cancelled".to_string());
			}
			match target {
				DeleteTarget::Review => {
					library.remove_review(&id).map_err(|err| err.to_string())?;
				}
				DeleteTarget::Wishlist => {
					library.remove_wishlist_item(&id).map_err(|err| err.to_string())?;
				}
			}
			persist(library_path.as_path(), library)?;
			Ok(format!("deleted: {title}"))
		}
	}
}

fn build_library_switch_select(current_path: &Path) -> Result<SelectState, String> {
	let mut recent = StateDir::locate()
		.recent_libraries(100)
		.map_err(|err| format!("failed to load recent libraries: {err}"))?;
	if !recent.iter().any(|entry| entry.path == current_path) {
		recent.insert(
			0,
			RecentLibrary {
				path: current_path.to_path_buf(),
				opened_at: None,
			},
		);
	}

	let options = recent
		.into_iter()
		.map(|entry| {
			let value = entry.path.display().to_string();
			let opened = entry
				.opened_at
				.map(|at| at.with_timezone(&Local).format("%b %d").to_string())
				.unwrap_or_else(|| "      ".to_string());
			let (marker, style) = if entry.path == current_path {
				("*", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
			} else if entry.path.exists() {
				(" ", Style::default())
			} else {
				("?", Style::default().fg(Color::DarkGray))
			};
			SelectOption::new(format!("{marker} {opened}  {value}"), Some(value), style)
		})
		.collect::<Vec<_>>();

	let mut select = SelectState::new("Switch library (? = missing)", SelectKind::LibrarySwitch, options);
	let current_value = current_path.display().to_string();
	select.selected = select
		.options
		.iter()
		.position(|option| option.value.as_deref() == Some(current_value.as_str()))
		.unwrap_or(0);
	Ok(select)
}

fn build_delete_select(target: DeleteTarget, id: &str, title: &str) -> SelectState {
	let what = match target {
		DeleteTarget::Review => "review",
		DeleteTarget::Wishlist => "wishlist entry",
	};
	let options = vec![
		SelectOption::new(
			"Delete",
			Some("delete".to_string()),
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	let mut select = SelectState::new(
		format!("Delete {what}? {title}"),
		SelectKind::DeleteConfirm {
			target,
			id: id.to_string(),
			title: title.to_string(),
		},
		options,
	);
	// Default to cancel to prevent accidental deletions.
	select.selected = 1;
	select
}

fn add_to_wishlist(library: &mut Library, library_path: &Path, book: Book) -> Result<String, String> {
	let title = book.title.clone();
	let draft = WishlistDraft {
		book,
		..Default::default()
	};
	library.add_wishlist_item(draft, Utc::now()).map_err(|err| err.to_string())?;
	persist(library_path, library)?;
	Ok(format!("added to wishlist: {title}"))
}

fn update_wishlist(library: &mut Library, library_path: &Path, id: &str, patch: &WishlistPatch) -> Result<String, String> {
	let item = library
		.update_wishlist_item(id, patch, Utc::now())
		.map_err(|err| err.to_string())?;
	let message = format!(
		"{} | priority {} | {}",
		item.book.title,
		item.priority,
		if item.is_public { "public" } else { "private" }
	);
	persist(library_path, library)?;
	Ok(message)
}

fn switch_library(library: &mut Library, library_path: &mut PathBuf, next_path: PathBuf) -> Result<String, String> {
	if &next_path == library_path {
		return Ok(format!("already using library: {}", library_path.display()));
	}

	if !next_path.exists() {
		return Err(format!("library does not exist: {}", next_path.display()));
	}

	let next_library = load_library(&next_path).map_err(|err| err.to_string())?;
	*library = next_library;
	*library_path = next_path;

	match StateDir::locate().remember(library_path.as_path(), Utc::now()) {
		Ok(()) => Ok(format!("switched library: {}", library_path.display())),
		Err(err) => Ok(format!(
			"switched library: {} (warning: failed to store recents: {err})",
			library_path.display()
		)),
	}
}

fn persist(path: &Path, library: &Library) -> Result<(), String> {
	save_library(path, library).map_err(|err| err.to_string())
}

fn build_view(app: &App, library: &Library, config: &AppConfig, today: NaiveDate, now: DateTime<Utc>) -> ViewModel {
	let mode = app.zoom.mode();
	let reference = app.zoom.reference();
	let intervals = filter_for_period(mode, reference, &library.intervals());
	let viewport = compute_window(mode, reference, &intervals, today)
		.map(|window| TimelineViewport::new(window, app.zoom.level(), app.offset_days));
	let lanes = pack_intervals(&intervals);
	let stats = aggregate(&intervals, wrap_pages);
	let home = home_stats(&library.reviews, today, config.estimate_default_pages);

	let reviews = period_reviews(library, mode, reference);
	let words = word_cloud(reviews.iter().map(|review| review.text.as_str()), config.word_cloud_size);
	let details = reviews
		.get(app.review_index.min(reviews.len().saturating_sub(1)))
		.map(|review| ReviewDetails {
			heading: format!("{} | {}", review.book.title, review.book.author_label()),
			metrics: compute_metrics(review, review.book.pages_or(WRAP_DEFAULT_PAGES), now),
		});
	let review_rows = reviews
		.iter()
		.map(|review| ReviewRow {
			id: review.id.clone(),
			title: review.book.title.clone(),
			line: review_line(review),
		})
		.collect::<Vec<_>>();

	let wishlist_rows = library
		.wishlist_by_priority(false)
		.into_iter()
		.map(|item| WishlistRow {
			id: item.id.clone(),
			title: item.book.title.clone(),
			priority: item.priority,
			is_public: item.is_public,
			description: item.description.clone(),
			line: Line::from(vec![
				Span::styled(format!("P{} ", item.priority), priority_style(item.priority)),
				Span::raw(item.book.title.clone()),
				Span::styled(
					if item.is_public { " (public)" } else { "" },
					Style::default().fg(Color::DarkGray),
				),
			]),
		})
		.collect::<Vec<_>>();

	ViewModel {
		period_label: mode.period_label(reference),
		lanes,
		viewport,
		stats,
		home,
		review_rows,
		review_index: app.review_index,
		details,
		words,
		wishlist_rows,
	}
}

/// Reviews shown in the list: those read during the selected period, or
/// every review for all time. Most recently finished first, undated last.
fn period_reviews(library: &Library, mode: FilterMode, reference: NaiveDate) -> Vec<&Review> {
	let period = nominal_period(mode, reference);
	let mut reviews = library
		.reviews
		.iter()
		.filter(|review| match &period {
			Some(period) => review.date_range().is_some_and(|range| range.overlaps(period)),
			None => true,
		})
		.collect::<Vec<_>>();
	reviews.sort_by(|left, right| right.end_date.cmp(&left.end_date));
	reviews
}

fn review_line(review: &Review) -> Line<'static> {
	let dates = match review.date_range() {
		Some(range) => format!("{} .. {}", format_date(range.start), format_date(range.end)),
		None => "undated".to_string(),
	};
	Line::from(vec![
		Span::styled(stars(review.rating as f64), Style::default().fg(rating_color(review.rating))),
		Span::raw(format!(" {} ", review.book.title)),
		Span::styled(
			format!("| {} | {dates}", review.book.author_label()),
			Style::default().fg(Color::DarkGray),
		),
	])
}

fn stars(rating: f64) -> String {
	let filled = rating.round().clamp(0.0, MAX_RATING as f64) as usize;
	format!(
		"{}{} {:.1}",
		"*".repeat(filled),
		".".repeat(MAX_RATING as usize - filled),
		rating
	)
}

fn rating_color(rating: u8) -> Color {
	match rating {
		5 => Color::LightGreen,
		4 => Color::Green,
		3 => Color::Yellow,
		2 => Color::LightRed,
		_ => Color::Red,
	}
}

fn rating_style(rating: u8) -> Style {
	Style::default().fg(Color::Black).bg(rating_color(rating))
}

fn priority_style(priority: u8) -> Style {
	if priority >= 4 {
		Style::default().fg(Color::LightYellow).add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(Color::Gray)
	}
}

fn word_style(word: &WordWeight) -> Style {
	match word.weight {
		5 => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
		4 => Style::default().fg(Color::LightCyan).add_modifier(Modifier::BOLD),
		3 => Style::default().fg(Color::Cyan),
		2 => Style::default().fg(Color::Gray),
		_ => Style::default().fg(Color::DarkGray),
	}
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	Done(String),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	value: Option<String>,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, value: Option<String>, style: Style) -> Self {
		Self {
			label: label.into(),
			value,
			style,
		}
	}
}

/// Search prompt state. A query is sent once typing pauses for the
/// debounce interval.
#[derive(Debug, Clone, Default)]
struct SearchState {
	input: String,
	edited_at: Option<Instant>,
	searched: Option<String>,
	results: Vec<Book>,
	selected: usize,
	loading: bool,
}

impl SearchState {
	fn touch(&mut self) {
		self.edited_at = Some(Instant::now());
	}

	fn is_due(&self, debounce: StdDuration) -> bool {
		self.edited_at.is_some_and(|edited| edited.elapsed() >= debounce)
			&& self.searched.as_deref() != Some(self.input.trim())
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	ReviewTitle,
	ReviewAuthor { draft: ReviewDraft },
	ReviewPages { draft: ReviewDraft },
	ReviewRating { draft: ReviewDraft },
	ReviewStart { draft: ReviewDraft },
	ReviewEnd { draft: ReviewDraft },
	ReviewText { draft: ReviewDraft },
	WishlistNote { item_id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteTarget {
	Review,
	Wishlist,
}

#[derive(Debug, Clone)]
enum SelectKind {
	LibrarySwitch,
	DeleteConfirm {
		target: DeleteTarget,
		id: String,
		title: String,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusPane {
	Timeline,
	Reviews,
	Wishlist,
}

impl FocusPane {
	fn next(self) -> Self {
		match self {
			FocusPane::Timeline => FocusPane::Reviews,
			FocusPane::Reviews => FocusPane::Wishlist,
			FocusPane::Wishlist => FocusPane::Timeline,
		}
	}

	fn prev(self) -> Self {
		match self {
			FocusPane::Timeline => FocusPane::Wishlist,
			FocusPane::Reviews => FocusPane::Timeline,
			FocusPane::Wishlist => FocusPane::Reviews,
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
	Search(SearchState),
}

#[derive(Debug)]
struct App {
	focus: FocusPane,
	zoom: ZoomState,
	offset_days: i64,
	review_index: usize,
	wishlist_index: usize,
	mode: InputMode,
	gate: SearchGate,
	status: String,
}

impl App {
	fn new(today: NaiveDate) -> Self {
		Self {
			focus: FocusPane::Timeline,
			zoom: ZoomState::new(FilterMode::Year, today, today),
			offset_days: 0,
			review_index: 0,
			wishlist_index: 0,
			mode: InputMode::Normal,
			gate: SearchGate::default(),
			status: "Ready".to_string(),
		}
	}

	fn sync_with_view(&mut self, view: &ViewModel) {
		self.review_index = self.review_index.min(view.review_rows.len().saturating_sub(1));
		self.wishlist_index = self.wishlist_index.min(view.wishlist_rows.len().saturating_sub(1));
		if let Some(viewport) = view.viewport {
			self.offset_days = viewport.offset_days();
		}
	}

	fn set_filter(&mut self, mode: FilterMode, reference: NaiveDate, today: NaiveDate) {
		if self.zoom.retarget(mode, reference, today) {
			self.offset_days = 0;
			self.review_index = 0;
		}
		self.status = format!("{} | zoom {:.1}x", mode.period_label(reference), self.zoom.level());
	}

	fn shift_period(&mut self, delta: i32, today: NaiveDate) {
		let mode = self.zoom.mode();
		if mode == FilterMode::All {
			self.status = "All time has no previous or next period".to_string();
			return;
		}
		self.set_filter(mode, mode.shift(self.zoom.reference(), delta), today);
	}

	fn scroll(&mut self, direction: i64, view: &ViewModel) {
		let Some(viewport) = view.viewport else {
			return;
		};
		let step = (viewport.visible_days() / 8).max(1);
		self.offset_days = (self.offset_days + direction * step).clamp(0, viewport.max_offset());
	}

	fn move_selection(&mut self, delta: i32, view: &ViewModel) {
		let (index, len) = match self.focus {
			FocusPane::Timeline | FocusPane::Reviews => (&mut self.review_index, view.review_rows.len()),
			FocusPane::Wishlist => (&mut self.wishlist_index, view.wishlist_rows.len()),
		};
		if len == 0 {
			*index = 0;
			return;
		}

		if delta > 0 {
			*index = (*index + delta as usize).min(len - 1);
		} else {
			*index = index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}
}

struct ViewModel {
	period_label: String,
	lanes: Vec<Lane>,
	viewport: Option<TimelineViewport>,
	stats: AggregateStats,
	home: HomeStats,
	review_rows: Vec<ReviewRow>,
	review_index: usize,
	details: Option<ReviewDetails>,
	words: Vec<WordWeight>,
	wishlist_rows: Vec<WishlistRow>,
}

impl ViewModel {
	fn selected_review_id(&self) -> Option<&str> {
		if self.review_rows.is_empty() {
			return None;
		}
		let index = self.review_index.min(self.review_rows.len() - 1);
		Some(self.review_rows[index].id.as_str())
	}
}

struct ReviewDetails {
	heading: String,
	metrics: ReviewMetrics,
}

#[derive(Clone)]
struct ReviewRow {
	id: String,
	title: String,
	line: Line<'static>,
}

#[derive(Clone)]
struct WishlistRow {
	id: String,
	title: String,
	priority: u8,
	is_public: bool,
	description: Option<String>,
	line: Line<'static>,
}
