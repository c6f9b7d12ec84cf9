//! Adaptive container location.
//!
//! Result-item containers carry obfuscated, per-deployment class names, so
//! they cannot be addressed by a fixed selector. Two tiers run in priority
//! order: a list of generic structural selectors, then a landmark-relative
//! discovery that reads the generated class token off the first list item
//! following a stable text heading and re-queries with it.

use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::traits::browser::{Browser, Element, Query};
use crate::types::config::EngineConfig;

/// Generic selector patterns tried first, in order. Structural roles and
/// test attributes survive redeployments far longer than class names.
pub const GENERIC_CONTAINER_SELECTORS: [&str; 5] = [
    "li[role='listitem']",
    "div[data-testid=\"offer-listing\"]",
    "div[jscontroller=\"yCwSd\"]",
    "div[role=\"option\"]",
    "div[role=\"group\"]",
];

/// Whether a class token looks like the framework's generated container
/// class: 5 to 10 characters, purely ASCII alphanumeric.
pub fn is_candidate_class_token(token: &str) -> bool {
    (5..=10).contains(&token.len()) && token.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Locate the flight-offer containers on the current page.
///
/// Returns containers in document order, or `NoContainersFound` once both
/// tiers are exhausted. Failure is fatal for the current view only; the
/// caller skips the view rather than aborting the run.
pub async fn locate_containers(
    browser: &dyn Browser,
    config: &EngineConfig,
) -> Result<Vec<Box<dyn Element>>> {
    for selector in GENERIC_CONTAINER_SELECTORS {
        match browser.find_all(&Query::css(selector)).await {
            Ok(containers) if !containers.is_empty() => {
                info!(
                    selector = %selector,
                    count = containers.len(),
                    "Located flight containers with generic selector"
                );
                return Ok(containers);
            }
            Ok(_) => {}
            Err(e) => {
                debug!(selector = %selector, error = %e, "Generic selector query failed");
            }
        }
    }

    if let Some(token) = discover_container_class(browser, &config.landmark_text).await {
        let selector = format!("li.{token}");
        match browser.find_all(&Query::css(&selector)).await {
            Ok(containers) if !containers.is_empty() => {
                info!(
                    class = %token,
                    count = containers.len(),
                    "Located flight containers with discovered class"
                );
                return Ok(containers);
            }
            Ok(_) => debug!(class = %token, "Discovered class matched nothing"),
            Err(e) => debug!(class = %token, error = %e, "Discovered-class query failed"),
        }
    }

    Err(EngineError::NoContainersFound {
        strategies_tried: GENERIC_CONTAINER_SELECTORS.len() + 1,
    })
}

/// Landmark-relative class discovery.
///
/// Finds the text landmark, takes the structurally-following list item,
/// and picks the first class token that passes the candidate predicate.
/// Every step is best-effort; any miss yields `None`.
pub async fn discover_container_class(browser: &dyn Browser, landmark: &str) -> Option<String> {
    let landmark_element = match browser.find_one(&Query::containing_text(landmark)).await {
        Ok(element) => element,
        Err(e) => {
            debug!(landmark = %landmark, error = %e, "Landmark not found");
            return None;
        }
    };

    let following = landmark_element
        .find_all(&Query::xpath("following::li[1]"))
        .await
        .ok()?;
    let list_item = following.into_iter().next()?;

    let class_attr = list_item.attribute("class").await.ok().flatten()?;
    let token = class_attr
        .split_whitespace()
        .find(|t| is_candidate_class_token(t))
        .map(str::to_string);

    match &token {
        Some(t) => info!(landmark = %landmark, class = %t, "Discovered container class token"),
        None => debug!(landmark = %landmark, class_attr = %class_attr, "No candidate class token"),
    }
    token
}
