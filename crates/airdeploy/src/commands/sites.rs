//! Site command handler.

use tabled::Tabled;

use airdeploy_core::{ControlPlane, Site};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Tabled)]
struct SiteRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl From<&Site> for SiteRow {
    fn from(s: &Site) -> Self {
        Self {
            id: s.id.to_string(),
            name: s.name.clone(),
        }
    }
}

pub async fn handle(ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    let mut sites = ControlPlane::list_sites(&ctx.client).await?;
    sites.sort_by(|a, b| a.id.cmp(&b.id));
    let out = output::render_list(&global.output, &sites, |s| SiteRow::from(s))?;
    output::print_output(&out, global.quiet);
    Ok(())
}
