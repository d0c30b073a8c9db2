//! Token matching
//!
//! Two independent predicates run against every candidate record: exact
//! UUID equality, and name equality after trimming the token (exact or
//! case-insensitive). A record matched by both still counts once.

use std::collections::BTreeSet;

use super::Resource;
use crate::error::ResolveError;

/// Why a candidate was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchReason {
    ExactUuid,
    ExactName,
    CaseInsensitiveName,
}

/// UUIDs are compared exactly, case included
pub fn match_uuid(token: &str, uuid: &str) -> Option<MatchReason> {
    (!uuid.is_empty() && token == uuid).then_some(MatchReason::ExactUuid)
}

pub fn match_name(token: &str, name: &str) -> Option<MatchReason> {
    let token = token.trim();
    if token.is_empty() || name.is_empty() {
        return None;
    }
    if token == name {
        Some(MatchReason::ExactName)
    } else if token.to_lowercase() == name.to_lowercase() {
        Some(MatchReason::CaseInsensitiveName)
    } else {
        None
    }
}

/// Outcome of matching one token against a collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMatch {
    token: String,
    // insertion ordered; candidate lists follow collection order
    matches: Vec<(String, BTreeSet<MatchReason>)>,
}

impl ResolvedMatch {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            matches: Vec::new(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Record `id` as a candidate when a predicate fired
    pub fn add_match(&mut self, id: &str, reason: Option<MatchReason>) {
        let Some(reason) = reason else {
            return;
        };
        match self.matches.iter_mut().find(|(existing, _)| existing == id) {
            Some((_, reasons)) => {
                reasons.insert(reason);
            }
            None => self
                .matches
                .push((id.to_string(), BTreeSet::from([reason]))),
        }
    }

    /// The single matched identifier
    pub fn get_only(&self) -> Result<String, ResolveError> {
        match self.matches.as_slice() {
            [] => Err(ResolveError::NotFound {
                token: self.token.clone(),
            }),
            [(id, _)] => Ok(id.clone()),
            _ => Err(ResolveError::Ambiguous {
                token: self.token.clone(),
                candidates: self.candidates().map(str::to_string).collect(),
            }),
        }
    }

    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|(id, _)| id.as_str())
    }

    pub fn reasons(&self, id: &str) -> Option<&BTreeSet<MatchReason>> {
        self.matches
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, reasons)| reasons)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Match `token` against every record of a collection
pub fn match_resource<R: Resource>(token: &str, items: &[R]) -> ResolvedMatch {
    let mut resolved = ResolvedMatch::new(token);
    for item in items {
        resolved.add_match(item.uuid(), match_uuid(token, item.uuid()));
        for name in item.names() {
            resolved.add_match(item.uuid(), match_name(token, name));
        }
    }
    resolved
}
