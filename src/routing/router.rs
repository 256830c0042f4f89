//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store deployed routes
//! - Deploy / undeploy routes at runtime
//! - Look up the matching route for a request
//!
//! # Design Decisions
//! - Copy-on-write snapshots (arc-swap): lookups never take a lock
//! - O(n) template scan (acceptable for typical route counts)
//! - Most literal segments wins; ties go to the earliest deployment
//! - Explicit NotFound / MethodNotAllowed rather than silent default

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::Method;
use thiserror::Error;

use crate::config::MethodConfig;
use crate::http::route::RouteHandler;
use crate::routing::matcher::{PathTemplate, TemplateError};

/// Errors deploying a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    #[error("invalid route path `{path}`: {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: TemplateError,
    },

    #[error("{0}")]
    InvalidMethod(String),
}

/// A deployed route.
#[derive(Debug)]
pub struct Route {
    pub http_method: Method,
    pub template: PathTemplate,
    pub config: Arc<MethodConfig>,
    pub handler: Arc<RouteHandler>,
}

/// Outcome of a route lookup.
#[derive(Debug)]
pub enum RouteMatch {
    Found {
        route: Arc<Route>,
        params: HashMap<String, String>,
    },
    /// The path exists but not for this HTTP method.
    MethodNotAllowed,
    NotFound,
}

/// The set of deployed routes.
#[derive(Default)]
pub struct RouteTable {
    routes: ArcSwap<Vec<Arc<Route>>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy a route, replacing any route with the same method and path.
    pub fn deploy(&self, config: Arc<MethodConfig>, handler: Arc<RouteHandler>) -> Result<(), DeployError> {
        let http_method = config.http_method().map_err(DeployError::InvalidMethod)?;
        let template = PathTemplate::parse(&config.path).map_err(|source| DeployError::InvalidPath {
            path: config.path.clone(),
            source,
        })?;
        let route = Arc::new(Route {
            http_method,
            template,
            config,
            handler,
        });

        self.routes.rcu(|current| {
            let mut next: Vec<Arc<Route>> = current
                .iter()
                .filter(|r| !same_route(r, &route.http_method, route.template.as_str()))
                .cloned()
                .collect();
            next.push(route.clone());
            next
        });

        tracing::info!(
            method = %route.http_method,
            path = %route.template.as_str(),
            target = %route.config.method_name,
            "Route deployed"
        );
        Ok(())
    }

    /// Remove the route deployed for this config. Returns whether one existed.
    pub fn undeploy(&self, config: &MethodConfig) -> bool {
        let Ok(http_method) = config.http_method() else {
            return false;
        };
        let before = self.routes.load().len();
        self.routes.rcu(|current| {
            current
                .iter()
                .filter(|r| !same_route(r, &http_method, &config.path))
                .cloned()
                .collect::<Vec<_>>()
        });
        let removed = self.routes.load().len() < before;
        if removed {
            tracing::info!(method = %http_method, path = %config.path, "Route undeployed");
        }
        removed
    }

    /// Remove every route.
    pub fn clear(&self) {
        self.routes.store(Arc::new(Vec::new()));
    }

    pub fn len(&self) -> usize {
        self.routes.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the deployed routes.
    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.routes.load().iter().cloned().collect()
    }

    /// Find the route for a request.
    pub fn match_request(&self, method: &Method, path: &str) -> RouteMatch {
        let routes = self.routes.load();
        let mut path_matched = false;
        let mut best: Option<(&Arc<Route>, HashMap<String, String>)> = None;

        for route in routes.iter() {
            let Some(params) = route.template.matches(path) else {
                continue;
            };
            path_matched = true;
            if route.http_method != *method {
                continue;
            }
            let better = best
                .as_ref()
                .map_or(true, |(b, _)| route.template.specificity() > b.template.specificity());
            if better {
                best = Some((route, params));
            }
        }

        match best {
            Some((route, params)) => RouteMatch::Found {
                route: route.clone(),
                params,
            },
            None if path_matched => RouteMatch::MethodNotAllowed,
            None => RouteMatch::NotFound,
        }
    }
}

fn same_route(route: &Route, method: &Method, path: &str) -> bool {
    route.http_method == *method && route.template.as_str() == path
}
