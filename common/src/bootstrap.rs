// Bootstrap utilities for binary initialization

use crate::backend::{MdmBackend, RestBackend};
use crate::config::Settings;
use crate::schedule::parse_timezone;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::info;

/// Build the REST backend described by the settings
///
/// # Errors
/// Returns error if the base URL is invalid or the HTTP client cannot be built
#[tracing::instrument(skip(settings))]
pub fn init_backend(settings: &Settings) -> Result<Arc<dyn MdmBackend>> {
    info!(base_url = %settings.backend.base_url, "Initializing MDM backend client");

    let backend = RestBackend::new(&settings.backend).context("Failed to create MDM backend client")?;

    info!("MDM backend client initialized");
    Ok(Arc::new(backend))
}

/// Resolve the timezone daily trigger times are shown in
///
/// # Errors
/// Returns error if the configured timezone is not a known IANA name
pub fn init_timezone(settings: &Settings) -> Result<Tz> {
    parse_timezone(&settings.schedule.timezone)
        .with_context(|| format!("Invalid schedule timezone '{}'", settings.schedule.timezone))
}
