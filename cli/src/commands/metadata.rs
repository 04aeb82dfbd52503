//! Metadata command implementation

use crate::commands::{connect, validate_overrides};
use crate::config::Configuration;
use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use retsq_client::Session;
use retsq_engine::metadata::{resolve_table, sort_deep};
use retsq_engine::output::{for_format, OutputFormat, OutputSink, Payload, StreamSink};
use retsq_shared::error::Error as RetsError;
use retsq_shared::{MetadataScope, OutputDestination};

#[derive(Args, Debug)]
pub struct MetadataArgs {
    /// Key of the configuration entry to use
    pub key: String,

    /// Type of metadata to request: system, resources, classes, table
    #[arg(value_name = "TYPE")]
    pub scope: String,

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

    /// Output file format for the data: json, yaml
    #[arg(short = 'O', long)]
    pub output: Option<String>,
}

pub async fn run(args: MetadataArgs) -> Result<()> {
    validate_overrides(&args.resource, &args.class)?;

    // Both of these are fatal before any network traffic.
    let scope: MetadataScope = args.scope.parse()?;
    let format = parse_format(args.output.as_deref())?;

    let configuration = Configuration::load()?;
    let mls = configuration.by_key(&args.key)?;
    let target = mls.target(
        &args.resource_alias,
        args.resource.as_deref(),
        args.class.as_deref(),
    )?;

    let mut session = connect(mls)?;
    session.login().await.context("login failed")?;

    // Only table metadata varies by class; the other scopes run once.
    let classes: &[String] = match scope {
        MetadataScope::Table => &target.classes,
        _ => &target.classes[..target.classes.len().min(1)],
    };

    let result = run_scopes(&mut session, &args, scope, &target.resource, classes, format).await;
    session.disconnect().await;
    result
}

fn parse_format(output: Option<&str>) -> Result<Option<OutputFormat>> {
    let Some(output) = output else {
        return Ok(None);
    };
    match output.parse::<OutputFormat>()? {
        OutputFormat::Csv => {
            anyhow::bail!("invalid output format 'csv' for metadata, must be one of: json, yaml")
        }
        format => Ok(Some(format)),
    }
}

async fn run_scopes(
    session: &mut Session,
    args: &MetadataArgs,
    scope: MetadataScope,
    resource: &str,
    classes: &[String],
    format: Option<OutputFormat>,
) -> Result<()> {
    let mut failed = 0usize;
    for class in classes {
        output::heading(&format!("Resource: {}", resource));
        output::heading(&format!("Class: {}", class));

        match run_scope(session, args, scope, resource, class, format).await {
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

async fn run_scope(
    session: &mut Session,
    args: &MetadataArgs,
    scope: MetadataScope,
    resource: &str,
    class: &str,
    format: Option<OutputFormat>,
) -> retsq_shared::error::Result<()> {
    let results = match scope {
        MetadataScope::System => session.system_metadata().await?,
        MetadataScope::Resources => session.resources_metadata(resource).await?,
        MetadataScope::Classes => session.classes_metadata(resource).await?,
        MetadataScope::Table => {
            let table = resolve_table(session, resource, class).await?;
            serde_json::to_value(table)?
        }
    };
    let results = sort_deep(results);

    let mut sink: Box<dyn OutputSink> = match format {
        Some(format) => for_format(format),
        None => Box::new(StreamSink::new()),
    };
    sink.bind(OutputDestination::metadata(&args.key, resource, class, scope))?;
    sink.write(Payload::Metadata(&results))?;
    sink.complete()?;
    Ok(())
}
