//! # Competition Roster
//!
//! The immutable set of teams and images. Every identifier that reaches the
//! score store or the shell registry has been resolved through here.

use std::collections::HashSet;

use crate::entities::{Image, Team};
use crate::errors::RosterError;
use crate::validation::is_valid_token;

/// Teams and images for one competition.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    teams: Vec<Team>,
    images: Vec<Image>,
}

impl Roster {
    /// Build and validate a roster.
    pub fn new(teams: Vec<Team>, images: Vec<Image>) -> Result<Self, RosterError> {
        let roster = Self { teams, images };
        roster.validate()?;
        Ok(roster)
    }

    /// Check identifier uniqueness and non-emptiness.
    ///
    /// Team ids and aliases share one namespace: agents may submit either,
    /// so any collision makes resolution ambiguous.
    pub fn validate(&self) -> Result<(), RosterError> {
        let mut seen = HashSet::new();
        for (position, team) in self.teams.iter().enumerate() {
            if team.id.is_empty() {
                return Err(RosterError::EmptyTeamId { position });
            }
            if team.alias.is_empty() {
                return Err(RosterError::EmptyTeamAlias {
                    id: team.id.clone(),
                });
            }
            if !is_valid_token(&team.id) {
                return Err(RosterError::InvalidIdentifier(team.id.clone()));
            }
            if !seen.insert(team.id.as_str()) {
                return Err(RosterError::DuplicateTeam(team.id.clone()));
            }
            if team.alias != team.id && !seen.insert(team.alias.as_str()) {
                return Err(RosterError::DuplicateTeam(team.alias.clone()));
            }
        }

        let mut names = HashSet::new();
        for (position, image) in self.images.iter().enumerate() {
            if image.name.is_empty() {
                return Err(RosterError::EmptyImageName { position });
            }
            if !is_valid_token(&image.name) {
                return Err(RosterError::InvalidIdentifier(image.name.clone()));
            }
            if !names.insert(image.name.as_str()) {
                return Err(RosterError::DuplicateImage(image.name.clone()));
            }
        }
        Ok(())
    }

    /// Resolve a team by id first, then by alias.
    pub fn resolve_team(&self, id_or_alias: &str) -> Option<&Team> {
        self.team(id_or_alias)
            .or_else(|| self.teams.iter().find(|t| t.alias == id_or_alias))
    }

    /// Look up a team strictly by id.
    pub fn team(&self, id: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Look up an image by name.
    pub fn image(&self, name: &str) -> Option<&Image> {
        self.images.iter().find(|i| i.name == name)
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }
}
