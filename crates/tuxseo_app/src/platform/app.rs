use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use serde::Deserialize;
use serde_json::Value;
use tuxseo_core::trend::TrendPoint;
use tuxseo_core::{update, AppState, KeyValueRows, Keyword, Msg, ScanPhase, Suggestion};
use tuxseo_engine::{
    ensure_store_dir, EngineHandle, FileStore, LocalStore, ReqwestDispatcher, SettingsCache,
};
use tuxseo_logging::{redact, tux_debug, tux_info, tux_warn};

use super::cli::{Cli, Command};
use super::config::AppConfig;
use super::effects::EffectRunner;
use super::notify::{Notifier, TerminalNotifier};
use super::{logging, persistence, render};

// Grace period on top of the request timeout before a silent engine is given up on.
const IDLE_GRACE: Duration = Duration::from_secs(5);

pub fn run_app() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(config.log_destination, level);
    tux_info!("tuxseo starting against {}", config.base_url);

    let output = match cli.command {
        Command::Trend {
            file,
            width,
            height,
        } => render_trend(&file, width, height)?,
        Command::Rows {
            json,
            set,
            replace,
            remove,
        } => edit_rows(
            &json,
            &RowEdits {
                set: &set,
                replace: &replace,
                remove: &remove,
            },
            cli.html,
        )?,
        command => {
            let mut app = App::connect(&config, Box::new(TerminalNotifier::new(cli.html)))?;
            app.restore();
            app.execute(command);
            app.render(cli.html)
        }
    };
    print!("{output}");
    Ok(())
}

/// Owns the core state and feeds it messages until every started request has resolved.
pub struct App {
    state: AppState,
    runner: EffectRunner,
    idle_timeout: Duration,
}

impl App {
    pub fn connect(config: &AppConfig, notifier: Box<dyn Notifier>) -> anyhow::Result<Self> {
        ensure_store_dir(&config.store_dir)
            .with_context(|| format!("store directory {}", config.store_dir.display()))?;
        let store: Arc<dyn LocalStore> = Arc::new(FileStore::new(config.store_dir.clone()));
        let page = config.page_context()?;
        match page.resolve_token() {
            Some(token) => tux_debug!("anti-forgery token {}", redact(&token)),
            None => tux_warn!("no anti-forgery token configured; state-changing actions will fail"),
        }
        let settings = config.dispatch_settings();
        let idle_timeout = settings.request_timeout + IDLE_GRACE;
        let dispatcher = Arc::new(ReqwestDispatcher::new(&config.base_url, page, settings)?);
        let engine = EngineHandle::new(dispatcher, store.clone(), config.poll_policy());
        let runner = EffectRunner::new(engine, SettingsCache::new(store), notifier);
        Ok(Self::new(runner, idle_timeout))
    }

    pub fn new(runner: EffectRunner, idle_timeout: Duration) -> Self {
        Self {
            state: AppState::new(),
            runner,
            idle_timeout,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Applies the cached view state from a previous run.
    pub fn restore(&mut self) {
        if let Some(view_state) = persistence::load_view_state(self.runner.cache()) {
            self.dispatch(Msg::RestoreViewState(view_state));
        }
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.run(effects);
    }

    /// Processes engine events until nothing is pending. A running scan poll is
    /// bounded by its own policy, so it is waited on without an idle limit.
    pub fn settle(&mut self) {
        while self.state.has_pending_work() {
            match self.runner.next_msg(self.idle_timeout) {
                Some(msg) => self.dispatch(msg),
                None if matches!(self.state.scan_phase(), ScanPhase::Analyzing { .. }) => {}
                None => {
                    tux_warn!("no response within {:?}; giving up", self.idle_timeout);
                    break;
                }
            }
        }
    }

    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Scan { url } => self.dispatch(Msg::ScanSubmitted { url }),
            Command::Resume => match persistence::remembered_scan(self.runner.cache()) {
                Some(job) => self.dispatch(Msg::RestoreScan(job)),
                None => tux_info!("no remembered scan to resume"),
            },
            Command::ToggleAutoSubmission {
                project_id,
                enabled,
            } => {
                self.dispatch(Msg::AutoSubmissionLoaded {
                    project_id,
                    enabled,
                });
                self.dispatch(Msg::AutoSubmissionToggleClicked { project_id });
            }
            Command::Suggest { project_id } => {
                self.dispatch(Msg::GenerateSuggestionsClicked { project_id })
            }
            Command::Archive {
                project_id,
                suggestion_id,
                undo,
            } => {
                let mut suggestion = Suggestion::bare(suggestion_id, project_id);
                suggestion.archived = undo;
                self.dispatch(Msg::SuggestionsLoaded(vec![suggestion]));
                self.dispatch(Msg::ArchiveClicked {
                    suggestion_id,
                    archived: !undo,
                });
            }
            Command::Score {
                project_id,
                suggestion_id,
                score,
            } => {
                self.dispatch(Msg::SuggestionsLoaded(vec![Suggestion::bare(
                    suggestion_id,
                    project_id,
                )]));
                self.dispatch(Msg::ScoreClicked {
                    suggestion_id,
                    score: score.into(),
                });
            }
            Command::Post {
                project_id,
                suggestion_id,
                post_id,
            } => {
                let mut suggestion = Suggestion::bare(suggestion_id, project_id);
                suggestion.generated_post_id = Some(post_id);
                self.dispatch(Msg::SuggestionsLoaded(vec![suggestion]));
                // Posting is gated on the project settings.
                self.dispatch(Msg::ProjectOpened { project_id });
                self.settle();
                self.dispatch(Msg::PostClicked { suggestion_id });
            }
            Command::Generate {
                project_id,
                suggestion_id,
            } => {
                self.dispatch(Msg::SuggestionsLoaded(vec![Suggestion::bare(
                    suggestion_id,
                    project_id,
                )]));
                self.dispatch(Msg::GenerateContentClicked { suggestion_id });
            }
            Command::KeywordAdd { project_id, text } => self.dispatch(Msg::KeywordSubmitted {
                project_id: Some(project_id),
                text,
            }),
            Command::KeywordUse {
                project_id,
                keyword_id,
                in_use,
            } => {
                self.dispatch(Msg::KeywordsLoaded(vec![Keyword {
                    id: keyword_id,
                    project_id,
                    text: String::new(),
                    volume: None,
                    in_use,
                    created_at: String::new(),
                }]));
                self.dispatch(Msg::KeywordUseClicked {
                    project_id,
                    keyword_id,
                });
            }
            Command::Competitor { project_id, url } => self.dispatch(Msg::CompetitorSubmitted {
                project_id: Some(project_id),
                url,
            }),
            Command::PricingPage { project_id, url } => {
                self.dispatch(Msg::PricingPageSubmitted {
                    project_id: Some(project_id),
                    url,
                })
            }
            Command::PricingStrategy { project_id, prompt } => {
                self.dispatch(Msg::PricingStrategyClicked {
                    project_id,
                    user_prompt: prompt,
                })
            }
            Command::Idea { project_id, idea } => {
                self.dispatch(Msg::IdeaSubmitted { project_id, idea })
            }
            Command::ProjectDetails {
                project_id,
                details,
            } => self.dispatch(Msg::ProjectDetailsSubmitted {
                project_id,
                details: details.into(),
            }),
            Command::Settings { project_id } => {
                self.dispatch(Msg::ProjectOpened { project_id });
                self.settle();
                let features = self.state.features(project_id);
                tux_info!(
                    "project {} auto-submission setting: {}, pro subscription: {}",
                    project_id,
                    features.has_auto_submission_setting,
                    features.has_pro_subscription
                );
            }
            Command::Trend { .. } | Command::Rows { .. } => {}
        }
        self.settle();
    }

    pub fn render(&self, html: bool) -> String {
        let view = self.state.view();
        if html {
            render::view_html(&view)
        } else {
            render::view_text(&view)
        }
    }
}

#[derive(Deserialize)]
struct TrendPointDto {
    month: String,
    year: i32,
    value: f64,
}

fn render_trend(file: &Path, width: f64, height: f64) -> anyhow::Result<String> {
    let raw = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let points: Vec<TrendPointDto> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;
    let points: Vec<TrendPoint> = points
        .into_iter()
        .map(|dto| TrendPoint {
            month: dto.month,
            year: dto.year,
            value: dto.value,
        })
        .collect();
    Ok(format!("{}\n", render::trend_chart(&points, width, height)))
}

/// Rows from a JSON object; malformed or empty input starts from one blank row.
fn parse_rows(json: &str) -> KeyValueRows {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => KeyValueRows::from_pairs(map.into_iter().map(|(key, value)| {
            let value = match value {
                Value::String(text) => text,
                other => other.to_string(),
            };
            (key, value)
        })),
        _ => KeyValueRows::default(),
    }
}

struct RowEdits<'a> {
    set: &'a [String],
    replace: &'a [String],
    remove: &'a [usize],
}

fn split_pair(pair: &str) -> anyhow::Result<(&str, &str)> {
    pair.split_once('=')
        .with_context(|| format!("expected KEY=VALUE, got {pair:?}"))
}

/// Replacements and removals use the original indices; additions go last.
fn edit_rows(json: &str, edits: &RowEdits<'_>, html: bool) -> anyhow::Result<String> {
    let mut rows = parse_rows(json);
    for edit in edits.replace {
        let (index, pair) = edit
            .split_once(':')
            .with_context(|| format!("expected INDEX:KEY=VALUE, got {edit:?}"))?;
        let index: usize = index
            .trim()
            .parse()
            .with_context(|| format!("bad row index in {edit:?}"))?;
        let (key, value) = split_pair(pair)?;
        rows.set_row(index, key, value);
    }
    let mut indices = edits.remove.to_vec();
    indices.sort_unstable_by(|a, b| b.cmp(a));
    for index in indices {
        rows.remove_row(index);
    }
    for pair in edits.set {
        let (key, value) = split_pair(pair)?;
        rows.add_row(key, value);
    }
    if html {
        return Ok(format!("{}\n", render::key_value_rows(&rows)));
    }
    Ok(format!("{}\n", serde_json::to_string(&rows.serialize())?))
}
