//! Object-query command implementation

use crate::commands::connect;
use crate::config::Configuration;
use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use retsq_engine::output::{BinarySink, OutputSink, Payload};
use retsq_shared::error::Error as RetsError;
use retsq_shared::{MediaObject, OutputDestination};
use serde_json::json;

#[derive(Args, Debug)]
pub struct ObjectQueryArgs {
    /// Key of the configuration entry to use
    pub key: String,

    /// Record id to fetch objects for
    pub id: String,

    /// Alias in the config file for the resource to query
    pub resource_alias: String,

    /// Specific resource for this query. Overrides the value in the config
    /// file.
    #[arg(short, long)]
    pub resource: Option<String>,

    /// Name of the media-object field. Overrides the value in the config
    /// file.
    #[arg(short, long)]
    pub field: Option<String>,

    /// Id(s) of the object to request (usually an index). Defaults to *.
    #[arg(short = 'i', long, default_value = "*")]
    pub object_id: String,

    /// Request the locations (URLs) of the media instead of the binaries.
    /// Overrides the value in the config file.
    #[arg(long)]
    pub by_location: bool,

    /// Save the binaries from the response under media/
    #[arg(long)]
    pub save_binaries: bool,
}

pub async fn run(args: ObjectQueryArgs) -> Result<()> {
    let configuration = Configuration::load()?;
    let mls = configuration.by_key(&args.key)?;
    let alias = mls.alias(&args.resource_alias)?;

    let resource = args
        .resource
        .clone()
        .unwrap_or_else(|| alias.resource.clone());
    let field = match &args.field {
        Some(field) => field.clone(),
        None => alias
            .object
            .as_ref()
            .map(|object| object.field.clone())
            .ok_or_else(|| {
                RetsError::Configuration(format!(
                    "alias '{}' has no object field configured; pass --field",
                    args.resource_alias
                ))
            })?,
    };
    let by_location = args.by_location
        || alias
            .object
            .as_ref()
            .map(|object| object.by_location)
            .unwrap_or(false);

    if args.save_binaries && by_location {
        output::warning("--save-binaries has no effect on a by-location request");
    }

    let mut session = connect(mls)?;
    session.login().await.context("login failed")?;

    output::heading(&format!("Resource: {}", resource));
    let result = fetch_and_output(&mut session, &args, &resource, &field, by_location).await;
    session.disconnect().await;
    result
}

async fn fetch_and_output(
    session: &mut retsq_client::Session,
    args: &ObjectQueryArgs,
    resource: &str,
    field: &str,
    by_location: bool,
) -> Result<()> {
    let objects = session
        .fetch_object(resource, field, &args.id, &args.object_id, by_location)
        .await?;

    println!("{}", summary(&objects, by_location)?);
    println!();

    if args.save_binaries && !by_location {
        let mut sink = BinarySink::new();
        sink.bind(OutputDestination::listing(&args.key, resource, ""))?;
        sink.write(Payload::Media(&objects))?;
        sink.complete()?;
    }
    Ok(())
}

/// JSON summary of the fetched objects; `Location` only appears on
/// by-location requests.
fn summary(objects: &[MediaObject], by_location: bool) -> Result<String> {
    let entries: Vec<serde_json::Value> = objects
        .iter()
        .map(|object| {
            let mut entry = json!({
                "ContentId": object.content_id,
                "ContentDescription": object.content_description,
                "ContentType": object.content_type,
                "ObjectId": object.object_id,
            });
            if by_location {
                entry["Location"] = json!(object.location);
            }
            entry
        })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}
