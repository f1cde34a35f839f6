use std::fmt;
use std::sync::Arc;

use academy_core::model::{Course, LearnerId, VideoId};
use remote::{Remote, RemoteConfig};
use services::{AuthContext, CatalogService, ProgressService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingApiConfig,
    InvalidLearnerId { raw: String },
    InvalidVideoList { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingApiConfig => write!(
                f,
                "missing backend configuration: set ABNP_API_URL and ABNP_API_KEY or pass --api-url/--api-key"
            ),
            ArgsError::InvalidLearnerId { raw } => write!(f, "invalid --learner value: {raw}"),
            ArgsError::InvalidVideoList { raw } => write!(f, "invalid --videos value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- courses  [--api-url <url>] [--api-key <key>]");
    eprintln!("  cargo run -p app -- articles [--api-url <url>] [--api-key <key>]");
    eprintln!(
        "  cargo run -p app -- progress [--learner <uuid>] [--videos <id,id,...>] [--api-url <url>] [--api-key <key>]"
    );
    eprintln!();
    eprintln!("progress defaults to the video set of the active courses.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ABNP_API_URL, ABNP_API_KEY, ABNP_ACCESS_TOKEN, ABNP_LEARNER_ID");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Courses,
    Articles,
    Progress,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "courses" => Some(Self::Courses),
            "articles" => Some(Self::Articles),
            "progress" => Some(Self::Progress),
            _ => None,
        }
    }
}

struct Args {
    config: RemoteConfig,
    learner: Option<LearnerId>,
    videos: Vec<VideoId>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut api_url = std::env::var("ABNP_API_URL").ok().filter(|v| !v.is_empty());
        let mut api_key = std::env::var("ABNP_API_KEY").ok().filter(|v| !v.is_empty());
        let mut access_token = std::env::var("ABNP_ACCESS_TOKEN")
            .ok()
            .filter(|v| !v.is_empty());
        let mut learner = std::env::var("ABNP_LEARNER_ID")
            .ok()
            .and_then(|value| value.parse::<LearnerId>().ok());
        let mut videos = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api-url" => api_url = Some(require_value(args, "--api-url")?),
                "--api-key" => api_key = Some(require_value(args, "--api-key")?),
                "--access-token" => access_token = Some(require_value(args, "--access-token")?),
                "--learner" => {
                    let value = require_value(args, "--learner")?;
                    let parsed = value
                        .parse::<LearnerId>()
                        .map_err(|_| ArgsError::InvalidLearnerId { raw: value.clone() })?;
                    learner = Some(parsed);
                }
                "--videos" => {
                    let value = require_value(args, "--videos")?;
                    videos = value
                        .split(',')
                        .map(|raw| {
                            VideoId::new(raw.trim()).ok_or(ArgsError::InvalidVideoList {
                                raw: value.clone(),
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let (Some(api_url), Some(api_key)) = (api_url, api_key) else {
            return Err(ArgsError::MissingApiConfig);
        };
        let mut config = RemoteConfig::new(api_url, api_key);
        if let Some(token) = access_token {
            config = config.with_access_token(token);
        }

        Ok(Self {
            config,
            learner,
            videos,
        })
    }
}

fn format_duration(course: &Course) -> String {
    course
        .duration_minutes()
        .map_or_else(|| "--".to_string(), |minutes| format!("{minutes} min"))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Courses,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Courses,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let remote = Remote::postgrest(&args.config)?;
    let catalog = CatalogService::new(Arc::clone(&remote.catalog));

    match cmd {
        Command::Courses => {
            for course in catalog.active_courses().await? {
                let video = course
                    .video_id()
                    .map_or_else(|| "no video".to_string(), |id| id.to_string());
                println!(
                    "{:>3}. {}  [{}]  ({})",
                    course.order_index(),
                    course.title(),
                    format_duration(&course),
                    video
                );
            }
        }
        Command::Articles => {
            for article in catalog.published_articles().await? {
                let published = article
                    .published_at()
                    .map_or_else(|| "unpublished".to_string(), |at| at.date_naive().to_string());
                println!("{}  {}", published, article.title());
            }
        }
        Command::Progress => {
            let auth = args
                .learner
                .map_or_else(AuthContext::anonymous, AuthContext::for_learner);
            if !auth.is_authenticated() {
                eprintln!("progress: no learner given, reporting an empty snapshot");
            }

            let video_ids = if args.videos.is_empty() {
                catalog.course_video_ids().await?
            } else {
                args.videos
            };

            let progress = ProgressService::new(auth, Arc::clone(&remote.sessions));
            let snapshot = progress.snapshot(video_ids).await?;

            for video_id in snapshot.video_ids().to_vec() {
                let video = snapshot.video(&video_id);
                let mark = if video.completed { "done" } else { "    " };
                println!(
                    "{mark}  {video_id}  {:>3}%  watched {}s",
                    video.percentage, video.watch_time_seconds
                );
            }

            let total = snapshot.total();
            println!();
            println!(
                "{}/{} videos completed ({}%), {} min watched",
                total.completed_videos,
                total.total_videos,
                total.completion_percentage,
                total.total_watch_time_minutes
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app=info,services=info,remote=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
