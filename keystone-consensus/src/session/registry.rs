use std::collections::HashMap;

use keystone_common::review::Vote;

/// Votes collected by one session, one per validator.
#[derive(Debug, Default, Clone)]
pub struct VoteRegistry {
    // ValidatorID -> Vote
    votes: HashMap<String, Vote>,
}

impl VoteRegistry {
    pub fn new() -> Self {
        Self {
            votes: HashMap::new(),
        }
    }

    /// Stores `vote`, replacing any earlier vote from the same validator.
    /// Returns the replaced vote, if any.
    pub fn register_vote(&mut self, vote: Vote) -> Option<Vote> {
        self.votes.insert(vote.validator_id.clone(), vote)
    }

    pub fn get(&self, validator_id: &str) -> Option<&Vote> {
        self.votes.get(validator_id)
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    /// Copy of the vote set ordered by validator id.
    pub fn snapshot(&self) -> Vec<Vote> {
        let mut votes: Vec<Vote> = self.votes.values().cloned().collect();
        votes.sort_by(|a, b| a.validator_id.cmp(&b.validator_id));
        votes
    }
}
