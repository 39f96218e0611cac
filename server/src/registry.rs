use std::collections::HashMap;
use std::time::{Duration, Instant};

use walkabout_shared::protocol::{default_display_name, PlayerEntryWire, PlayerId, PlayerStateWire};

/// A connected, joined participant.
#[derive(Debug, Clone)]
pub struct PresenceEntry {
    pub id: PlayerId,
    pub display_name: String,
    pub last_state: Option<PlayerStateWire>,
    pub last_update: Instant,
    join_order: u64,
}

/// Authoritative directory of joined participants. Owned by the relay task;
/// every mutation happens there, one command at a time.
#[derive(Debug)]
pub struct PresenceRegistry {
    entries: HashMap<PlayerId, PresenceEntry>,
    next_id: PlayerId,
    next_join_order: u64,
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
            next_join_order: 0,
        }
    }

    /// Hand out an identity for a new connection. Never reused.
    pub fn allocate_id(&mut self) -> PlayerId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Join. A repeated join overwrites the name and forgets the last state
    /// but keeps the original place in snapshot order.
    pub fn register(
        &mut self,
        id: PlayerId,
        display_name: Option<&str>,
        now: Instant,
    ) -> &PresenceEntry {
        let display_name = match display_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_display_name(id),
        };

        let join_order = match self.entries.get(&id) {
            Some(existing) => existing.join_order,
            None => {
                let order = self.next_join_order;
                self.next_join_order += 1;
                order
            }
        };

        self.entries.insert(
            id,
            PresenceEntry {
                id,
                display_name,
                last_state: None,
                last_update: now,
                join_order,
            },
        );
        &self.entries[&id]
    }

    /// Record a state message. Returns false if the sender has not joined.
    pub fn update(&mut self, id: PlayerId, state: PlayerStateWire, now: Instant) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.last_state = Some(state);
                entry.last_update = now;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: PlayerId) -> Option<PresenceEntry> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&PresenceEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry in join order, for `players:init`.
    pub fn snapshot(&self) -> Vec<PlayerEntryWire> {
        let mut entries: Vec<&PresenceEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.join_order);
        entries
            .into_iter()
            .map(|e| PlayerEntryWire {
                id: e.id,
                display_name: e.display_name.clone(),
                state: e.last_state,
            })
            .collect()
    }

    /// Entries whose last join or state is older than `max_age`.
    pub fn stale(&self, now: Instant, max_age: Duration) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self
            .entries
            .values()
            .filter(|e| now.saturating_duration_since(e.last_update) > max_age)
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids
    }
}
