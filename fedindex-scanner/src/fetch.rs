use crate::activitypub::Collection;
use crate::error::FetchError;
use crate::transport::TransportRouter;
use reqwest::header::{ACCEPT, LOCATION};
use std::fmt;
use tracing::debug;
use url::Url;

const ACTIVITY_ACCEPT: &str = "application/activity+json, application/json";
const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Following,
    Followers,
}

impl Relation {
    pub fn path(&self) -> &'static str {
        match self {
            Relation::Following => "/following",
            Relation::Followers => "/followers",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path().trim_start_matches('/'))
    }
}

/// Build the relation endpoint URL for an instance identifier.
pub fn relation_url(instance_id: &str, relation: Relation) -> Result<Url, FetchError> {
    let base = instance_id.trim().trim_end_matches('/');
    let target = format!("{}{}", base, relation.path());
    let url = Url::parse(&target)
        .map_err(|_| FetchError::InvalidIdentifier(instance_id.to_string()))?;
    if url.host_str().is_none() {
        return Err(FetchError::InvalidIdentifier(instance_id.to_string()));
    }
    Ok(url)
}

/// GET one relation collection of `instance_id` and return the member ids in
/// the order the instance listed them. Duplicates are kept.
///
/// Redirects are followed here rather than by the client, so every hop goes
/// through `TransportRouter::select_client` for its own host.
pub async fn fetch_relations(
    router: &TransportRouter,
    instance_id: &str,
    relation: Relation,
) -> Result<Vec<String>, FetchError> {
    let mut url = relation_url(instance_id, relation)?;
    let mut hops = 0;

    let response = loop {
        let host = url
            .host_str()
            .ok_or_else(|| FetchError::InvalidIdentifier(url.to_string()))?;

        let handle = router.select_client(host)?;
        debug!("GET {} via {:?}", url, handle.route());

        let response = handle
            .client()
            .get(url.clone())
            .header(ACCEPT, ACTIVITY_ACCEPT)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

        if !response.status().is_redirection() {
            break response;
        }
        if hops == MAX_REDIRECTS {
            return Err(FetchError::Redirect {
                url: url.to_string(),
                reason: format!("more than {} redirects", MAX_REDIRECTS),
            });
        }

        let next = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|location| url.join(location).ok())
            .ok_or_else(|| FetchError::Redirect {
                url: url.to_string(),
                reason: format!("HTTP {} without a usable Location", response.status().as_u16()),
            })?;
        debug!("{} redirected to {}", url, next);
        hops += 1;
        url = next;
    };

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::from_reqwest(url.as_str(), e))?;

    let collection = Collection::from_json(&body).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })?;

    let ids = collection.identifiers();
    debug!("{} listed {} {} entries", instance_id, ids.len(), relation);
    Ok(ids)
}
