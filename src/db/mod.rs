//! Persistence module: the JSON dataset file and the attachment directory.
//!
//! The dataset file is the source of truth for all employee data.

mod attachments;
mod repository;

pub use attachments::*;
pub use repository::*;

use crate::config::Config;
use crate::errors::AppError;

/// Open the dataset store and attachment directory described by `config`.
pub async fn init_storage(config: &Config) -> Result<(Repository, AttachmentStore), AppError> {
    let repo = Repository::new(config.data_path.clone());
    // Creates the file with an empty dataset on first start
    repo.load().await?;

    let attachments = AttachmentStore::new(config.resources_path.clone());
    attachments.ensure_directory().await?;

    Ok((repo, attachments))
}
