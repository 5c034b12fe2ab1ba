use serde::Serialize;

use super::role::Role;

/// Access requirement attached to a page of the portal shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "roles", rename_all = "snake_case")]
pub enum RouteAccess {
    Public,
    /// An empty role list admits any authenticated session.
    Protected(Vec<Role>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// Path pattern with `:param` segments and an optional trailing `*`.
///
/// Literal segments match case-insensitively, the way the shell's router does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
    wildcard: bool,
}

impl RoutePattern {
    pub fn new(pattern: &str) -> Self {
        let mut segments = Vec::new();
        let mut wildcard = false;

        for part in split_path(pattern) {
            if part == "*" {
                wildcard = true;
                break;
            }
            if part.starts_with(':') {
                segments.push(Segment::Param);
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Self {
            raw: pattern.to_string(),
            segments,
            wildcard,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_path(strip_query(path)).collect();

        if parts.len() < self.segments.len() {
            return false;
        }
        if !self.wildcard && parts.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(parts.iter())
            .all(|(segment, part)| match segment {
                Segment::Literal(literal) => literal.eq_ignore_ascii_case(part),
                Segment::Param => !part.is_empty(),
            })
    }
}

#[derive(Debug, Clone)]
struct RouteRule {
    pattern: RoutePattern,
    access: RouteAccess,
}

/// Ordered route declarations; the first matching pattern wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public(mut self, pattern: &str) -> Self {
        self.rules.push(RouteRule {
            pattern: RoutePattern::new(pattern),
            access: RouteAccess::Public,
        });
        self
    }

    pub fn protected(mut self, pattern: &str, roles: &[Role]) -> Self {
        self.rules.push(RouteRule {
            pattern: RoutePattern::new(pattern),
            access: RouteAccess::Protected(roles.to_vec()),
        });
        self
    }

    /// Page map of the procurement portal shell.
    pub fn portal() -> Self {
        Self::new()
            .public("/")
            .public("/about")
            .public("/auth/login")
            .public("/auth/register")
            .public("/bids")
            .public("/bids/:id")
            .protected("/dashboard", &[])
            .protected("/settings", &[])
            .protected("/dashboard/bidder/*", &[Role::Bidder])
            .protected("/dashboard/officer/*", &[Role::Officer])
            .protected("/dashboard/committee/*", &[Role::Committee])
            .protected("/dashboard/admin/*", &[Role::Admin])
            .protected("/dashboard/*", &[])
    }

    /// Unknown paths are public so the shell can render its not-found page.
    pub fn lookup(&self, path: &str) -> RouteAccess {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map(|rule| rule.access.clone())
            .unwrap_or(RouteAccess::Public)
    }
}

fn strip_query(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or_default()
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty())
}
