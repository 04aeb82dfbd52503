//! Query command implementation

use crate::commands::{connect, validate_overrides};
use crate::config::{Configuration, MlsConfig};
use crate::{output, progress::Progress};
use anyhow::{Context, Result};
use clap::Args;
use retsq_client::Session;
use retsq_engine::output::{for_format, OutputFormat, OutputSink, Payload, StreamSink};
use retsq_engine::{PageQuery, PageRunner};
use retsq_shared::error::Error as RetsError;
use retsq_shared::OutputDestination;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Key of the configuration entry to use
    pub key: String,

    /// Query to send to the server, e.g. '(Status=Active)'
    pub query: String,

    /// Alias in the config file for the resource+class(es) to query
    pub resource_alias: String,

    /// Specific resource for this query. If not provided, runs against the
    /// alias from the config file.
    #[arg(short, long)]
    pub resource: Option<String>,

    /// Specific class for this query. If not provided, runs against all in
    /// the config file.
    #[arg(short, long)]
    pub class: Option<String>,

    /// Starting offset for the query
    #[arg(short, long, default_value_t = 0)]
    pub offset: u64,

    /// Page size for the query
    #[arg(short, long, default_value_t = 100)]
    pub limit: u64,

    /// Ask only for the matching record count
    #[arg(short = 'C', long)]
    pub count: bool,

    /// Specific fields to select, comma-separated system names
    #[arg(short, long)]
    pub select: Option<String>,

    /// Output file format for the data: csv, json, yaml
    #[arg(short = 'O', long)]
    pub output: Option<String>,

    /// Turn off the progress bar
    #[arg(short = 'Q', long)]
    pub no_progress_bar: bool,
}

pub async fn run(args: QueryArgs) -> Result<()> {
    validate_overrides(&args.resource, &args.class)?;
    warn_count_overrides(&args);

    let format = args
        .output
        .as_deref()
        .map(str::parse::<OutputFormat>)
        .transpose()?;

    let configuration = Configuration::load()?;
    let mls = configuration.by_key(&args.key)?;
    let target = mls.target(
        &args.resource_alias,
        args.resource.as_deref(),
        args.class.as_deref(),
    )?;

    let mut session = connect(mls)?;
    session.login().await.context("login failed")?;

    let result = run_target(&mut session, &args, mls, &target.resource, &target.classes, format).await;
    session.disconnect().await;
    result
}

async fn run_target(
    session: &mut Session,
    args: &QueryArgs,
    mls: &MlsConfig,
    resource: &str,
    classes: &[String],
    format: Option<OutputFormat>,
) -> Result<()> {
    let mut failed = 0usize;
    for class in classes {
        output::heading(&format!("Resource: {}", resource));
        output::heading(&format!("Class: {}", class));

        match run_class(session, args, mls, resource, class, format).await {
            Ok(()) => {}
            // A bad response or rejected query kills this class only;
            // siblings still run, the command still exits non-zero.
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
    args: &QueryArgs,
    mls: &MlsConfig,
    resource: &str,
    class: &str,
    format: Option<OutputFormat>,
) -> retsq_shared::error::Result<()> {
    let mut sink: Option<Box<dyn OutputSink>> = if args.count {
        None
    } else {
        let mut sink: Box<dyn OutputSink> = match format {
            Some(format) => for_format(format),
            None => Box::new(StreamSink::new()),
        };
        sink.bind(OutputDestination::listing(&args.key, resource, class))?;
        Some(sink)
    };

    let progress = Progress::new(!args.no_progress_bar && !args.count, args.limit);

    let spec = PageQuery {
        resource: resource.to_string(),
        class: class.to_string(),
        query: args.query.clone(),
        limit: args.limit,
        offset: args.offset,
        count_only: args.count,
        standard_names: mls.standard_names,
        select: args.select.clone(),
    };
    let mut runner = PageRunner::new(session, spec);

    let mut first = true;
    let mut total = None;
    while let Some(batch) = runner.next_batch().await? {
        if first {
            if let Some(t) = batch.total_count {
                progress.set_total(t);
            }
            first = false;
        }
        total = batch.total_count.or(total);
        if let Some(sink) = sink.as_mut() {
            sink.write(Payload::Listings(&batch))?;
        }
        progress.advance(batch.row_count);
    }
    progress.finish();

    if let Some(mut sink) = sink.take() {
        sink.complete()?;
    }
    if args.count {
        println!("\nCount: {}", total.unwrap_or(0));
    }
    Ok(())
}

fn warn_count_overrides(args: &QueryArgs) {
    if !args.count {
        return;
    }
    if args.offset != 0 {
        output::warning("--offset is ignored when --count is present");
    }
    if args.limit != 100 {
        output::warning("--limit is ignored when --count is present");
    }
    if args.select.is_some() {
        output::warning("--select is ignored when --count is present");
    }
    if args.output.is_some() {
        output::warning("--output is ignored when --count is present");
    }
}
