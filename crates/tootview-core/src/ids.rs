//! Session-scoped short handles for server ids.
//!
//! Server ids are long snowflake numbers that nobody wants to type. [`IdMap`] hands out the index
//! at which an id was first seen instead, so `fav 3` can be resolved back to the real id before a
//! request goes out. The map only grows and is never persisted.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

/// A server-assigned numeric identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalId(pub u64);

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for GlobalId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for GlobalId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(GlobalId)
            .map_err(|_| IdError::MalformedGlobal {
                input: s.to_string(),
            })
    }
}

/// A small index into an [`IdMap`].
pub type LocalId = usize;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The typed local id is not a number, is negative, or was never handed out.
    #[error("Invalid ID.")]
    InvalidId { input: String },
    #[error("malformed server id: {input:?}")]
    MalformedGlobal { input: String },
}

#[derive(Clone, Debug, Default)]
pub struct IdMap {
    globals: Vec<GlobalId>,
    locals: HashMap<GlobalId, LocalId>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the local id for `global`, assigning the next one on first sight.
    pub fn to_local(&mut self, global: GlobalId) -> LocalId {
        if let Some(&local) = self.locals.get(&global) {
            return local;
        }
        let local = self.globals.len();
        self.globals.push(global);
        self.locals.insert(global, local);
        tracing::debug!(local, %global, "assigned local id");
        local
    }

    /// Returns the global id that was assigned `local`.
    pub fn to_global(&self, local: LocalId) -> Result<GlobalId, IdError> {
        self.globals
            .get(local)
            .copied()
            .ok_or_else(|| IdError::InvalidId {
                input: local.to_string(),
            })
    }

    /// Resolves a user-typed local id such as `"3"`.
    pub fn resolve(&self, input: &str) -> Result<GlobalId, IdError> {
        let invalid = || IdError::InvalidId {
            input: input.to_string(),
        };
        let local = input.trim().parse::<i64>().map_err(|_| invalid())?;
        let local = LocalId::try_from(local).map_err(|_| invalid())?;
        self.to_global(local).map_err(|_| invalid())
    }

    /// Returns the local id for `global` without assigning one.
    pub fn local_of(&self, global: GlobalId) -> Option<LocalId> {
        self.locals.get(&global).copied()
    }

    pub fn len(&self) -> usize {
        self.globals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.globals.is_empty()
    }
}

/// An [`IdMap`] that can be shared between threads.
///
/// `to_local` holds the lock across the lookup and the append, so two threads seeing the same new
/// id at once still agree on a single local id.
#[derive(Debug, Default)]
pub struct SharedIdMap {
    inner: Mutex<IdMap>,
}

impl SharedIdMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, IdMap> {
        // The map is append-only, so a panic mid-update cannot leave it inconsistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn to_local(&self, global: GlobalId) -> LocalId {
        self.lock().to_local(global)
    }

    pub fn to_global(&self, local: LocalId) -> Result<GlobalId, IdError> {
        self.lock().to_global(local)
    }

    pub fn resolve(&self, input: &str) -> Result<GlobalId, IdError> {
        self.lock().resolve(input)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;
    use tracing_test::traced_test;

    #[test]
    fn assigns_sequential_local_ids() {
        let mut ids = IdMap::new();
        assert_eq!(ids.to_local(GlobalId(109_000_000_000_000_001)), 0);
        assert_eq!(ids.to_local(GlobalId(42)), 1);
        assert_eq!(ids.to_local(GlobalId(109_000_000_000_000_001)), 0);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids.to_global(1), Ok(GlobalId(42)));
    }

    #[test]
    fn out_of_range_is_invalid() {
        let mut ids = IdMap::new();
        ids.to_local(GlobalId(7));
        assert!(matches!(ids.to_global(1), Err(IdError::InvalidId { .. })));
        assert!(matches!(IdMap::new().to_global(0), Err(IdError::InvalidId { .. })));
    }

    #[test]
    fn resolve_rejects_garbage_and_negative_input() {
        let mut ids = IdMap::new();
        ids.to_local(GlobalId(7));
        assert_eq!(ids.resolve(" 0 "), Ok(GlobalId(7)));
        for input in ["-1", "1", "abc", "", "0.5", "99999999999999999999999"] {
            assert_eq!(
                ids.resolve(input),
                Err(IdError::InvalidId {
                    input: input.to_string()
                }),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn invalid_id_message_is_user_facing() {
        let err = IdMap::new().resolve("5").unwrap_err();
        assert_eq!(err.to_string(), "Invalid ID.");
    }

    #[test]
    fn parses_global_ids_from_api_strings() {
        assert_eq!("109876543210".parse::<GlobalId>(), Ok(GlobalId(109_876_543_210)));
        assert!(matches!(
            "abc".parse::<GlobalId>(),
            Err(IdError::MalformedGlobal { .. })
        ));
    }

    #[test]
    #[traced_test]
    fn logs_new_assignments_only() {
        let mut ids = IdMap::new();
        ids.to_local(GlobalId(5));
        ids.to_local(GlobalId(5));
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .filter(|l| l.contains("assigned local id"))
                .count()
            {
                1 => Ok(()),
                n => Err(format!("expected one assignment log, got {n}")),
            }
        });
    }

    #[test]
    fn shared_map_agrees_on_concurrent_first_sightings() {
        let ids = Arc::new(SharedIdMap::new());
        let handles = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || {
                    (0..100u64)
                        .map(|g| ids.to_local(GlobalId(g)))
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();
        let results = handles
            .into_iter()
            .map(|h| h.join().expect("worker"))
            .collect::<Vec<_>>();

        assert_eq!(ids.len(), 100);
        for locals in &results[1..] {
            assert_eq!(locals, &results[0]);
        }
        for g in 0..100u64 {
            let local = results[0][g as usize];
            assert_eq!(ids.to_global(local), Ok(GlobalId(g)));
        }
    }

    proptest! {
        #[test]
        fn local_round_trips_to_global(globals in proptest::collection::vec(any::<u64>(), 0..200)) {
            let mut ids = IdMap::new();
            for &g in &globals {
                let local = ids.to_local(GlobalId(g));
                prop_assert_eq!(ids.to_global(local), Ok(GlobalId(g)));
            }
            let distinct = globals.iter().collect::<std::collections::HashSet<_>>().len();
            prop_assert_eq!(ids.len(), distinct);

            let before = ids.len();
            for &g in &globals {
                ids.to_local(GlobalId(g));
            }
            prop_assert_eq!(ids.len(), before);
        }

        #[test]
        fn anything_past_the_end_is_invalid(n in 0usize..10_000, extra in 0usize..1_000) {
            let mut ids = IdMap::new();
            for g in 0..(n % 50) as u64 {
                ids.to_local(GlobalId(g));
            }
            let is_invalid = matches!(
                ids.to_global(ids.len() + extra),
                Err(IdError::InvalidId { .. })
            );
            prop_assert!(is_invalid);
        }
    }
}
