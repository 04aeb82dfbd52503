//! Histogram command implementation
//!
//! One count-only search per date bucket; buckets are generated up front
//! so an invalid range fails before any network call and the progress bar
//! knows its total.

use crate::commands::{connect, validate_overrides};
use crate::config::Configuration;
use crate::{output, progress::Progress};
use anyhow::{Context, Result};
use clap::Args;
use retsq_client::Session;
use retsq_engine::output::{for_format, OutputFormat, OutputSink, Payload};
use retsq_engine::{generate_buckets, PageQuery, PageRunner};
use retsq_shared::error::Error as RetsError;
use retsq_shared::utils::time::{format_query_timestamp, parse_interval, parse_timestamp};
use retsq_shared::{OutputDestination, Row, SearchBatch, TimeRange};

#[derive(Args, Debug)]
pub struct HistogramArgs {
    /// Key of the configuration entry to use
    pub key: String,

    /// Alias in the config file for the resource+class(es) to query
    pub resource_alias: String,

    /// Bucket width, e.g. '1d' (1 day), '2h' (2 hours)
    pub interval: String,

    /// Modification-timestamp field the histogram is based on
    #[arg(short = 't', long)]
    pub timestamp_field: String,

    /// Start timestamp for the earliest bucket
    #[arg(short, long)]
    pub start: String,

    /// End timestamp for the latest bucket
    #[arg(short, long)]
    pub end: String,

    /// Resource if not specified in config
    #[arg(short, long)]
    pub resource: Option<String>,

    /// Class if not specified in config
    #[arg(short, long)]
    pub class: Option<String>,

    /// Output file format for the data: csv, json, yaml
    #[arg(short = 'O', long)]
    pub output: Option<String>,

    /// Turn off the progress bar
    #[arg(short = 'Q', long)]
    pub no_progress_bar: bool,
}

pub async fn run(args: HistogramArgs) -> Result<()> {
    validate_overrides(&args.resource, &args.class)?;

    let format = args
        .output
        .as_deref()
        .map(str::parse::<OutputFormat>)
        .transpose()?;

    let start = parse_timestamp(&args.start)?;
    let end = parse_timestamp(&args.end)?;
    let interval = parse_interval(&args.interval)?;
    let buckets = generate_buckets(start, end, interval)?;

    let configuration = Configuration::load()?;
    let mls = configuration.by_key(&args.key)?;
    let target = mls.target(
        &args.resource_alias,
        args.resource.as_deref(),
        args.class.as_deref(),
    )?;

    let mut session = connect(mls)?;
    session.login().await.context("login failed")?;

    let result = run_target(&mut session, &args, &target.resource, &target.classes, &buckets, format).await;
    session.disconnect().await;
    result
}

async fn run_target(
    session: &mut Session,
    args: &HistogramArgs,
    resource: &str,
    classes: &[String],
    buckets: &[TimeRange],
    format: Option<OutputFormat>,
) -> Result<()> {
    let mut failed = 0usize;
    for class in classes {
        output::heading(&format!("Resource: {}", resource));
        output::heading(&format!("Class: {}", class));

        match run_class(session, args, resource, class, buckets, format).await {
            Ok(()) => {}
            Err(err @ (RetsError::Protocol(_) | RetsError::Query { .. })) => {
                failed += 1;
                output::error(&format!("class {} failed: {}", class, err));
            }
            Err(err) => return Err(err.into()),
        }
        println!();
    }

    if failed > 0 {
        anyhow::bail!("{} of {} class(es) failed", failed, classes.len());
    }
    Ok(())
}

async fn run_class(
    session: &mut Session,
    args: &HistogramArgs,
    resource: &str,
    class: &str,
    buckets: &[TimeRange],
    format: Option<OutputFormat>,
) -> retsq_shared::error::Result<()> {
    let mut sink: Option<Box<dyn OutputSink>> = match format {
        Some(format) => {
            let mut sink = for_format(format);
            sink.bind(OutputDestination::listing(&args.key, resource, class))?;
            Some(sink)
        }
        None => None,
    };

    let progress = Progress::new(!args.no_progress_bar, buckets.len() as u64);

    for bucket in buckets {
        let start = format_query_timestamp(bucket.start());
        let end = format_query_timestamp(bucket.end());
        let query = format!("({}={}-{})", args.timestamp_field, start, end);

        let spec = PageQuery {
            resource: resource.to_string(),
            class: class.to_string(),
            query,
            limit: 1,
            offset: 0,
            count_only: true,
            standard_names: false,
            select: None,
        };
        let mut runner = PageRunner::new(session, spec);
        let batch = runner
            .next_batch()
            .await?
            .ok_or_else(|| RetsError::Protocol("count query returned no batch".into()))?;
        let count = batch.total_count.unwrap_or(0);

        match sink.as_mut() {
            Some(sink) => {
                let row = Row::from_pairs(vec![
                    ("Start".to_string(), start),
                    ("End".to_string(), end),
                    ("Count".to_string(), count.to_string()),
                ]);
                sink.write(Payload::Listings(&SearchBatch::new(vec![row], None)))?;
            }
            None => println!("Start: {}; End: {}; Count: {}", start, end, count),
        }
        progress.advance(1);
    }
    progress.finish();

    if let Some(mut sink) = sink.take() {
        sink.complete()?;
    }
    Ok(())
}
