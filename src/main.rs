use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use engagement_resume::aggregate::verb_ratio;
use engagement_resume::config::Config;
use engagement_resume::models::{Event, Selector};
use engagement_resume::normalize::normalize;
use engagement_resume::rank::Scope;
use engagement_resume::resume::resolve_group_kind;
use engagement_resume::{import, report, telemetry, EngagementError, GroupKind, ResumeBuilder};

#[derive(Parser)]
#[command(name = "engagement-resume")]
#[command(about = "Engagement resumes and rankings from learning interaction logs", long_about = None)]
struct Cli {
    /// Processed event CSV; defaults to ENGAGEMENT_EVENTS
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a resume for an actor id or a course/institution name
    Resume {
        target: Selector,
        #[arg(long, value_enum, default_value_t = Format::Markdown)]
        format: Format,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print an actor's place in their course and institution
    Rank { actor_id: i64 },
    /// Ratio of two verbs' counts for one category
    Ratio {
        target: Selector,
        #[arg(long)]
        category: String,
        #[arg(long)]
        numerator: String,
        #[arg(long)]
        denominator: String,
    },
}

fn scoped_rows(events: &[Event], target: &Selector) -> Vec<Event> {
    let normalized = normalize(events);
    match target {
        Selector::Actor(actor_id) => normalized
            .into_iter()
            .filter(|event| event.actor_id == *actor_id)
            .collect(),
        Selector::Group(name) => {
            let scope = Scope {
                kind: resolve_group_kind(events, name),
                name: name.clone(),
            };
            normalized
                .into_iter()
                .filter(|event| scope.contains(event))
                .collect()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("invalid engagement configuration")?;
    telemetry::init(&config.log_level)?;

    let path = cli.events.unwrap_or(config.events_path);
    let events = import::read_events(&path)
        .with_context(|| format!("failed to load events from {}", path.display()))?;
    let builder = ResumeBuilder::new(config.parallel_threshold);

    match cli.command {
        Commands::Resume {
            target,
            format,
            out,
        } => {
            let resume = builder.resume(&events, &target)?;
            let rendered = match format {
                Format::Markdown => report::render_markdown(&resume),
                Format::Json => report::render_json(&resume)?,
            };
            match out {
                Some(out) => {
                    std::fs::write(&out, rendered)
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!("Resume written to {}.", out.display());
                }
                None => print!("{rendered}"),
            }
        }
        Commands::Rank { actor_id } => {
            let enrolment = events
                .iter()
                .find(|event| event.actor_id == actor_id)
                .ok_or(EngagementError::UnknownActor { actor_id })?;
            for scope in [
                Scope::course(enrolment.course.as_str()),
                Scope::institution(enrolment.institution.as_str()),
            ] {
                let place = builder.rank_actor(&events, actor_id, &scope);
                let label = match scope.kind {
                    GroupKind::Course => "Course",
                    GroupKind::Institution => "Institution",
                };
                println!(
                    "{label} {}: place {} of {} students",
                    scope.name, place.place, place.population_size
                );
            }
        }
        Commands::Ratio {
            target,
            category,
            numerator,
            denominator,
        } => {
            let rows = scoped_rows(&events, &target);
            match verb_ratio(&rows, &category, &numerator, &denominator) {
                Some(ratio) => println!(
                    "{target}: {numerator}/{denominator} on {category} = {ratio:.3}"
                ),
                None => println!("{target}: no '{denominator}' {category} rows recorded."),
            }
        }
    }

    Ok(())
}
