//! Leaderboard and best-ghost synchronisation against a blob store.

use std::{collections::BTreeMap, time::Duration};

use gravitation_core::GhostFrame;
use gravitation_system_leaderboard::{GhostLibrary, Leaderboard, Submission};
use gravitation_system_race_timer::format_elapsed;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{info, warn};

use crate::store::{BlobStore, StoreError};

/// Keys under which the leaderboard and the per-level ghosts are stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreLayout {
    /// Key of the blob holding the whole leaderboard.
    pub leaderboard_key: String,
    /// Key of the ghost blob for each known level.
    pub ghost_keys: BTreeMap<String, String>,
}

impl StoreLayout {
    /// Key of the ghost blob for `level`, defaulting to `ghosts/<level>`.
    #[must_use]
    pub fn ghost_key(&self, level: &str) -> String {
        self.ghost_keys
            .get(level)
            .cloned()
            .unwrap_or_else(|| format!("ghosts/{level}"))
    }
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            leaderboard_key: "leaderboard".to_owned(),
            ghost_keys: BTreeMap::new(),
        }
    }
}

/// Keeps the last known leaderboard and ghosts and pushes finished runs.
///
/// Store failures are logged and swallowed; callers always continue with
/// the last data that was successfully loaded.
#[derive(Debug)]
pub struct ScoreKeeper<S> {
    store: S,
    layout: StoreLayout,
    leaderboard: Leaderboard,
    ghosts: GhostLibrary,
}

impl<S: BlobStore> ScoreKeeper<S> {
    /// Creates a keeper with empty local data.
    #[must_use]
    pub fn new(store: S, layout: StoreLayout) -> Self {
        Self {
            store,
            layout,
            leaderboard: Leaderboard::default(),
            ghosts: GhostLibrary::default(),
        }
    }

    /// Last known leaderboard.
    #[must_use]
    pub const fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    /// Last known best ghosts.
    #[must_use]
    pub const fn ghosts(&self) -> &GhostLibrary {
        &self.ghosts
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Reloads the leaderboard and the ghost blobs.
    ///
    /// Ghosts are read from every configured key and from the key of every
    /// level on the loaded leaderboard. Returns `false` if the leaderboard or
    /// a configured ghost blob failed to load; whatever loaded is kept. A
    /// leaderboard level without a stored ghost is not a failure.
    pub async fn refresh(&mut self) -> bool {
        let mut complete = true;

        match self.fetch::<Leaderboard>(&self.layout.leaderboard_key).await {
            Ok(leaderboard) => self.leaderboard = leaderboard,
            Err(error) => {
                warn!(%error, "failed to load leaderboard, keeping last known data");
                complete = false;
            }
        }

        let mut ghost_keys: BTreeMap<String, bool> = self
            .layout
            .ghost_keys
            .values()
            .map(|key| (key.clone(), true))
            .collect();
        for level in self.leaderboard.levels() {
            let _ = ghost_keys.entry(self.layout.ghost_key(level)).or_insert(false);
        }

        for (key, required) in ghost_keys {
            match self.fetch::<GhostLibrary>(&key).await {
                Ok(ghosts) => self.ghosts.merge(ghosts),
                Err(StoreError::Missing { .. }) if !required => {}
                Err(error) => {
                    warn!(%error, key = %key, "failed to load ghosts, keeping last known data");
                    complete = false;
                }
            }
        }

        complete
    }

    /// Submits a finished run.
    ///
    /// A run that beats the player's personal best is written to a freshly
    /// fetched leaderboard and stored back. When the run then matches the
    /// level's global best, `frames` becomes the level's ghost.
    pub async fn submit(
        &mut self,
        level: &str,
        user: &str,
        elapsed: Duration,
        frames: &[GhostFrame],
    ) -> Submission {
        let time = format_elapsed(elapsed);
        if !self.leaderboard.improves(level, user, &time) {
            return Submission::NotImproved;
        }

        if let Err(error) = self.push_time(level, user, &time).await {
            warn!(%error, level, user, "failed to update leaderboard");
        }

        let global_best = self.leaderboard.global_best(level) == Some(time.as_str());
        if global_best {
            self.ghosts.replace(level, frames.to_vec());
            let key = self.layout.ghost_key(level);
            let blob = GhostLibrary::single(level, frames.to_vec());
            if let Err(error) = self.store_blob(&key, &blob).await {
                warn!(%error, level, "failed to store ghost");
            }
        }

        info!(level, user, time = %time, global_best, "personal best submitted");
        Submission::PersonalBest { global_best }
    }

    async fn push_time(&mut self, level: &str, user: &str, time: &str) -> Result<(), StoreError> {
        let mut fresh = match self.fetch::<Leaderboard>(&self.layout.leaderboard_key).await {
            Ok(leaderboard) => leaderboard,
            Err(StoreError::Missing { .. }) => Leaderboard::default(),
            Err(error) => return Err(error),
        };
        fresh.record(level, user, time);
        self.store_blob(&self.layout.leaderboard_key, &fresh).await?;
        self.leaderboard = fresh;
        Ok(())
    }

    async fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<T, StoreError> {
        let value = self.store.get(key).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn store_blob<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.store.put(key, serde_json::to_value(value)?).await
    }
}
