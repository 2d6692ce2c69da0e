//! Resolves display names into API Gateway identifiers.

use tracing::{debug, error};

use crate::services::{GatewayApi, Lookup, ProviderError, RemoteRecord};

/// Fetches every page of `lookup`, following `position` until a page comes
/// back without one.
pub async fn list_all<A>(api: &A, lookup: &Lookup) -> Result<Vec<RemoteRecord>, ProviderError>
where
    A: GatewayApi + ?Sized,
{
    let mut records = Vec::new();
    let mut position = None;
    let mut pages = 0usize;

    loop {
        let page = api.list_page(lookup, position).await?;
        pages += 1;
        records.extend(page.items);
        match page.position {
            Some(next) => position = Some(next),
            None => break,
        }
    }

    debug!(%lookup, pages, records = records.len(), "Listing complete");
    Ok(records)
}

/// Returns the first record of `lookup` whose name equals `name` exactly.
///
/// A provider "not found" answer yields `Ok(None)`. Any other provider error
/// is logged and returned. When several records share the name, the first
/// one listed wins.
#[tracing::instrument(skip(api, lookup), fields(%lookup))]
pub async fn locate<A>(
    api: &A,
    lookup: &Lookup,
    name: &str,
) -> Result<Option<RemoteRecord>, ProviderError>
where
    A: GatewayApi + ?Sized,
{
    match list_all(api, lookup).await {
        Ok(records) => Ok(records.into_iter().find(|r| r.name == name)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => {
            error!(error = %e, "Failed to check if {lookup} '{name}' exists");
            Err(e)
        }
    }
}
