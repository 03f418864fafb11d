//! Session boundaries for live profile loads.
//!
//! A session starts whenever a load follows a schema upgrade, the profile
//! has never recorded a session, or the profile sat idle past the timeout.
//! Starting a session clears every `Session` counter and leaves the all-time
//! counters alone.

use crate::config::{DEFAULT_SESSION_IDLE_SECS, UpgradeConfig};
use mtrack_core::error::{ProfileError, Result};
use mtrack_core::input::{ClickKind, MouseButton, zeroed_click_set};
use mtrack_core::{Grid, Group, Key, Node, ProfileRecord, Resolution, SchemaVersion};
use strum::IntoEnumIterator;

/// Why a load started a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTrigger {
    /// The stored schema version was not the current one.
    Upgraded,
    /// No session start has ever been recorded.
    FirstSession,
    /// The profile was last modified longer ago than the idle timeout.
    Idle,
}

/// Detects session boundaries and resets session-scoped state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionLifecycle {
    idle_secs: f64,
}

impl SessionLifecycle {
    pub fn new(idle_secs: u64) -> Self {
        Self {
            idle_secs: idle_secs as f64,
        }
    }

    pub fn from_config(config: &UpgradeConfig) -> Self {
        Self::new(config.session_idle_secs)
    }

    /// Decides whether this load begins a new session.
    ///
    /// `stored` is the version the record had before migration.
    pub fn trigger(
        &self,
        record: &ProfileRecord,
        stored: SchemaVersion,
        now: f64,
    ) -> Result<Option<SessionTrigger>> {
        if !stored.is_current() {
            return Ok(Some(SessionTrigger::Upgraded));
        }
        let starts = match record.get(&["SessionStarts"])? {
            Node::List(starts) => starts,
            _ => return Err(ProfileError::mismatch(&["SessionStarts"], "list")),
        };
        if starts.is_empty() {
            return Ok(Some(SessionTrigger::FirstSession));
        }
        if now - record.float(&["Time", "Modified"])? > self.idle_secs {
            return Ok(Some(SessionTrigger::Idle));
        }
        Ok(None)
    }

    /// Finalizes a migrated record for live use.
    ///
    /// Starts a new session when one is due, otherwise makes sure every
    /// resolution has session click grids. Always stamps the current version.
    pub fn apply(
        &self,
        record: &mut ProfileRecord,
        stored: SchemaVersion,
        now: f64,
    ) -> Result<Option<SessionTrigger>> {
        let trigger = self.trigger(record, stored, now)?;
        match trigger {
            Some(reason) => {
                tracing::info!("Starting new session ({:?})", reason);
                start_session(record, now)?;
            }
            None => ensure_session_clicks(record)?,
        }
        record.set_version(SchemaVersion::current());
        Ok(trigger)
    }
}

impl Default for SessionLifecycle {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_IDLE_SECS)
    }
}

fn empty_session_keys() -> Node {
    Node::group_of([
        ("Pressed", Node::empty_group()),
        ("Held", Node::empty_group()),
        (
            "Intervals",
            Node::group_of([
                ("Total", Node::empty_group()),
                ("Individual", Node::empty_group()),
            ]),
        ),
        ("Mistakes", Node::empty_group()),
    ])
}

fn empty_gamepad_session() -> Node {
    Node::group_of([
        (
            "Buttons",
            Node::group_of([
                ("Pressed", Node::empty_group()),
                ("Held", Node::empty_group()),
            ]),
        ),
        ("Axis", Node::empty_group()),
    ])
}

/// Clears session counters, records the start and bumps the load count.
fn start_session(record: &mut ProfileRecord, now: f64) -> Result<()> {
    record.insert(&["Ticks", "Session", "Tracks"], Node::Int(0))?;
    record.insert(&["Ticks", "Session", "Total"], Node::Int(0))?;
    record.insert(&["Keys", "Session"], empty_session_keys())?;

    for (key, entry) in record.group_mut(&["Resolution"])?.iter_mut() {
        if let Some(res) = key.as_resolution() {
            reset_session_clicks(clicks_of(entry, res)?, res);
        }
    }

    record.insert(&["Gamepad", "Session"], empty_gamepad_session())?;

    let loaded = record.int(&["TimesLoaded"])?;
    record.insert(&["TimesLoaded"], Node::Int(loaded + 1))?;
    record.list_mut(&["SessionStarts"])?.push(Node::Float(now));
    Ok(())
}

/// Adds session click grids for resolutions that gained none yet.
fn ensure_session_clicks(record: &mut ProfileRecord) -> Result<()> {
    for (key, entry) in record.group_mut(&["Resolution"])?.iter_mut() {
        let Some(res) = key.as_resolution() else {
            continue;
        };
        let clicks = clicks_of(entry, res)?;
        match clicks.get_mut(&Key::name("Session")) {
            Some(session) => repair_click_set(session, res, false),
            None => {
                tracing::debug!("Creating session click grids for {}", res);
                clicks.insert(Key::name("Session"), zeroed_click_set(res));
            }
        }
    }
    Ok(())
}

fn clicks_of(entry: &mut Node, res: Resolution) -> Result<&mut Group> {
    let path = ["Resolution", "<res>", "Clicks"];
    entry
        .as_group_mut()
        .ok_or_else(|| ProfileError::mismatch(&path[..2], "group"))?
        .get_mut(&Key::name("Clicks"))
        .ok_or_else(|| ProfileError::MissingField {
            path: format!("Resolution.{res}.Clicks"),
        })?
        .as_group_mut()
        .ok_or_else(|| ProfileError::mismatch(&path, "group"))
}

fn reset_session_clicks(clicks: &mut Group, res: Resolution) {
    match clicks.get_mut(&Key::name("Session")) {
        Some(session) => repair_click_set(session, res, true),
        None => {
            clicks.insert(Key::name("Session"), zeroed_click_set(res));
        }
    }
}

/// Makes `node` a complete six-grid click set for `res`.
///
/// Missing or malformed leaves become zero grids. Existing grids are zeroed
/// when `zero` is set and left untouched otherwise.
fn repair_click_set(node: &mut Node, res: Resolution, zero: bool) {
    let Some(kinds) = node.as_group_mut() else {
        *node = zeroed_click_set(res);
        return;
    };
    for kind in ClickKind::iter() {
        let kind_node = kinds
            .entry(Key::name(kind.to_string()))
            .or_insert_with(Node::empty_group);
        if kind_node.as_group().is_none() {
            *kind_node = Node::empty_group();
        }
        let Some(buttons) = kind_node.as_group_mut() else {
            continue;
        };
        for button in MouseButton::iter() {
            let leaf = buttons
                .entry(Key::name(button.to_string()))
                .or_insert_with(|| Node::Grid(Grid::zeros(res)));
            if !matches!(leaf, Node::Grid(grid) if grid.resolution() == res) {
                *leaf = Node::Grid(Grid::zeros(res));
            } else if let (true, Node::Grid(grid)) = (zero, leaf) {
                grid.fill(0);
            }
        }
    }
}
