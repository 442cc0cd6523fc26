use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tuxseo_core::{ProjectDetails, Score};

#[derive(Parser, Debug)]
#[command(name = "tuxseo")]
#[command(about = "Drive the TuxSEO dashboard actions from the terminal")]
#[command(version)]
pub struct Cli {
    /// Configuration file (RON)
    #[arg(short, long, env = "TUXSEO_CONFIG", default_value = "tuxseo.ron")]
    pub config: PathBuf,

    /// Print HTML fragments instead of a text summary
    #[arg(long)]
    pub html: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Scan a website and wait for the analysis to finish
    Scan { url: String },
    /// Resume polling a scan left unfinished by a previous run
    Resume,
    /// Flip the auto-submission setting of a project
    ToggleAutoSubmission {
        project_id: u64,
        /// Value currently shown for the project
        #[arg(long)]
        enabled: bool,
    },
    /// Generate new title suggestions
    Suggest { project_id: u64 },
    /// Archive a suggestion (or restore it with --undo)
    Archive {
        project_id: u64,
        suggestion_id: u64,
        #[arg(long)]
        undo: bool,
    },
    /// Like or dislike a suggested title
    Score {
        project_id: u64,
        suggestion_id: u64,
        #[arg(value_enum)]
        score: ScoreArg,
    },
    /// Publish the generated post of a suggestion
    Post {
        project_id: u64,
        suggestion_id: u64,
        post_id: u64,
    },
    /// Generate full blog content for a suggestion
    Generate { project_id: u64, suggestion_id: u64 },
    /// Add a tracked keyword
    KeywordAdd { project_id: u64, text: String },
    /// Mark a keyword as used (or unused)
    KeywordUse {
        project_id: u64,
        keyword_id: u64,
        /// Value currently shown for the keyword
        #[arg(long)]
        in_use: bool,
    },
    /// Analyze a competitor website
    Competitor { project_id: u64, url: String },
    /// Analyze a project's pricing page
    PricingPage { project_id: u64, url: String },
    /// Create a pricing strategy for a project
    PricingStrategy {
        project_id: u64,
        /// Extra instructions for the strategy
        #[arg(long, default_value = "")]
        prompt: String,
    },
    /// Turn a free-text idea into one title suggestion
    Idea { project_id: u64, idea: String },
    /// Save the project profile; fields left out are sent empty
    ProjectDetails {
        project_id: u64,
        #[command(flatten)]
        details: DetailsArgs,
    },
    /// Fetch and cache project settings
    Settings { project_id: u64 },
    /// Render a keyword trend chart from a JSON file of monthly points
    Trend {
        file: PathBuf,
        #[arg(long, default_value_t = 320.0)]
        width: f64,
        #[arg(long, default_value_t = 160.0)]
        height: f64,
    },
    /// Edit auto-submit header/body rows given as a JSON object
    Rows {
        json: String,
        /// Add a row, as KEY=VALUE
        #[arg(long = "set")]
        set: Vec<String>,
        /// Overwrite the row at an index, as INDEX:KEY=VALUE
        #[arg(long = "replace")]
        replace: Vec<String>,
        /// Remove the row at this index
        #[arg(long = "remove")]
        remove: Vec<usize>,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct DetailsArgs {
    #[arg(long, default_value = "")]
    pub key_features: String,
    #[arg(long, default_value = "")]
    pub target_audience: String,
    #[arg(long, default_value = "")]
    pub pain_points: String,
    #[arg(long, default_value = "")]
    pub product_usage: String,
    #[arg(long, default_value = "")]
    pub links: String,
    #[arg(long, default_value = "")]
    pub blog_theme: String,
    #[arg(long, default_value = "")]
    pub founders: String,
    #[arg(long, default_value = "")]
    pub language: String,
}

impl From<DetailsArgs> for ProjectDetails {
    fn from(args: DetailsArgs) -> Self {
        ProjectDetails {
            key_features: args.key_features,
            target_audience_summary: args.target_audience,
            pain_points: args.pain_points,
            product_usage: args.product_usage,
            links: args.links,
            blog_theme: args.blog_theme,
            founders: args.founders,
            language: args.language,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScoreArg {
    Like,
    Neutral,
    Dislike,
}

impl From<ScoreArg> for Score {
    fn from(arg: ScoreArg) -> Self {
        match arg {
            ScoreArg::Like => Score::Liked,
            ScoreArg::Neutral => Score::Neutral,
            ScoreArg::Dislike => Score::Disliked,
        }
    }
}
