//! Subcommand implementations.

pub mod detect;
pub mod import;
pub mod normalize;
pub mod schema;
pub mod stats;

use crate::cli::{Cli, Commands, FileArgs};
use crate::error::{ImportError, Result};
use crate::format::OutputContext;
use crate::intake::{FileContent, FileIntake, ImportFile};
use serde_json::Value;
use tracing::debug;

/// Run the selected subcommand.
///
/// # Errors
///
/// Whatever the subcommand fails with.
pub async fn run(cli: &Cli, ctx: &OutputContext) -> Result<()> {
    let overrides = cli.overrides();
    match &cli.command {
        Commands::Import(args) => import::execute(args, &overrides, ctx).await,
        Commands::Detect(args) => detect::execute(args, ctx),
        Commands::Normalize(args) => normalize::execute(args, &overrides, ctx).await,
        Commands::Stats => stats::execute(&overrides, ctx),
        Commands::Schema(args) => schema::execute(args, ctx),
    }
}

/// Load the file named on the command line.
fn load_file(args: &FileArgs) -> Result<ImportFile> {
    let file = ImportFile::from_path(&args.file)?;
    debug!(path = %args.file.display(), bytes = file.content.len(), "read input file");
    Ok(match &args.mime {
        Some(mime) => file.with_mime(mime.clone()),
        None => file,
    })
}

/// Read import data from the file named on the command line.
///
/// The CLI installs no decoder or API parser, so encrypted exports and API
/// specifications fail with [`ImportError::UnavailableCollaborator`].
fn read_data(args: &FileArgs) -> Result<Value> {
    let file = load_file(args)?;
    match FileIntake::new().read(&file)? {
        FileContent::Data(data) => Ok(data),
        FileContent::ApiModel(_) => Err(ImportError::UnavailableCollaborator(
            "API processor not available".to_string(),
        )),
    }
}
