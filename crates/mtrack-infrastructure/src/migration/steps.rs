//! Profile schema migrations, one per historical release.
//!
//! Each step is a plain function over the profile tree, named after what it
//! does and registered under the version it produces. Steps run oldest
//! first and may assume every earlier step has already run.

use super::traits::{Migration, MigrationContext, ProfileMigration};
use mtrack_core::error::{ProfileError, Result};
use mtrack_core::input::{ClickKind, MouseButton, click_set, empty_button_groups};
use mtrack_core::maps;
use mtrack_core::{
    Grid, Group, Key, Node, ProfileRecord, Resolution, SchemaVersion, SparseGrid,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use strum::IntoEnumIterator;

type StepFn = fn(&mut ProfileRecord, &MigrationContext) -> Result<()>;

/// A named migration backed by a step function.
#[derive(Clone, Copy)]
pub struct Step {
    target: &'static str,
    name: &'static str,
    description: &'static str,
    apply: StepFn,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("target", &self.target)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Migration for Step {
    fn from_version(&self) -> SchemaVersion {
        self.to_version()
            .previous()
            .unwrap_or(SchemaVersion::OLDEST)
    }

    fn to_version(&self) -> SchemaVersion {
        SchemaVersion::resolve(self.target)
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }
}

impl ProfileMigration for Step {
    fn migrate(&self, record: &mut ProfileRecord, ctx: &MigrationContext) -> Result<()> {
        (self.apply)(record, ctx)
    }
}

const fn step(
    target: &'static str,
    name: &'static str,
    description: &'static str,
    apply: StepFn,
) -> Step {
    Step {
        target,
        name,
        description,
        apply,
    }
}

/// Every step, in registry order.
pub const STEPS: &[Step] = &[
    step(
        "2.0",
        "base_layout",
        "Create the base profile layout",
        base_layout,
    ),
    step(
        "2.0.1",
        "add_acceleration",
        "Add acceleration tracking",
        add_acceleration,
    ),
    step(
        "2.0.1b",
        "acceleration_to_speed",
        "Rename acceleration to speed",
        acceleration_to_speed,
    ),
    step(
        "2.0.2",
        "add_combined",
        "Add combined speed and position maps",
        add_combined,
    ),
    step(
        "2.0.3",
        "split_clicks_and_ticks",
        "Split clicks per button and ticks into counters",
        split_clicks_and_ticks,
    ),
    step(
        "2.0.4",
        "creation_time",
        "Record creation time, rename modified time",
        creation_time,
    ),
    step(
        "2.0.5",
        "group_maps",
        "Group maps together and add temporary maps",
        group_maps,
    ),
    step(
        "2.0.5b",
        "per_map_ticks",
        "Separate tick counts per map",
        per_map_ticks,
    ),
    step(
        "2.0.6",
        "drop_speed_maps",
        "Remove speed and combined maps",
        drop_speed_maps,
    ),
    step(
        "2.0.6b",
        "session_ticks",
        "Track ticks for the current session",
        session_ticks,
    ),
    step(
        "2.0.6c",
        "session_keys",
        "Track key presses for the current session",
        session_keys,
    ),
    step(
        "2.0.7",
        "rename_keys",
        "Fix incorrect key names",
        rename_keys,
    ),
    step(
        "2.0.8",
        "session_starts",
        "Store each session start",
        session_starts,
    ),
    step(
        "2.0.9",
        "prune_track_bounds",
        "Remove track coordinates outside their resolution",
        prune_track_bounds,
    ),
    step(
        "2.0.9b",
        "integer_ticks",
        "Match session and total tick layout, store integers",
        integer_ticks,
    ),
    step(
        "2.0.9c",
        "session_clicks",
        "Add a separate click map for the session",
        session_clicks,
    ),
    step(
        "2.0.9d",
        "drop_temp_maps",
        "Remove temporary maps, add double clicks",
        drop_temp_maps,
    ),
    step(
        "2.0.9e",
        "prune_resolutions",
        "Remove resolutions with unsupported aspect ratios",
        prune_resolutions,
    ),
    step(
        "2.0.10",
        "click_hierarchy",
        "Nest clicks by kind and button, convert to dense grids",
        click_hierarchy,
    ),
    step(
        "2.0.10b",
        "reset_double_clicks",
        "Reset double click maps",
        reset_double_clicks,
    ),
    step(
        "2.0.10c",
        "key_intervals",
        "Track time between key presses and mistakes",
        key_intervals,
    ),
    step(
        "2.0.10d",
        "individual_intervals",
        "Track intervals for each key",
        individual_intervals,
    ),
    step("2.0.11", "gamepad", "Add gamepad tracking", gamepad),
    step(
        "2.0.12",
        "resolution_keys",
        "Group every map under its resolution",
        resolution_keys,
    ),
    step(
        "2.0.13",
        "history_animation",
        "Record track history for animation",
        history_animation,
    ),
];

/// The steps wrapped for registration.
pub fn all() -> Vec<Arc<dyn ProfileMigration>> {
    STEPS
        .iter()
        .map(|s| Arc::new(*s) as Arc<dyn ProfileMigration>)
        .collect()
}

const KEY_SCOPES: [&str; 2] = ["All", "Session"];

const KEY_RENAMES: [(&str, &str); 4] = [
    ("UNDERSCORE", "HYPHEN"),
    ("MULTIPLY", "ASTERISK"),
    ("AT", "APOSTROPHE"),
    ("HASH", "NUMBER"),
];

fn group() -> Node {
    Node::empty_group()
}

fn sparse() -> Node {
    Node::Sparse(SparseGrid::new())
}

fn join_path<'a>(base: &[&'a str], field: &'a str) -> Vec<&'a str> {
    base.iter().copied().chain(std::iter::once(field)).collect()
}

fn base_layout(record: &mut ProfileRecord, ctx: &MigrationContext) -> Result<()> {
    let fields = [
        ("Count", Node::Int(0)),
        ("Tracks", group()),
        ("Clicks", group()),
        ("Keys", group()),
        ("Ticks", Node::Int(0)),
        ("LastSave", Node::Float(ctx.now)),
        ("TimesLoaded", Node::Int(0)),
    ];
    for (name, node) in fields {
        record.insert(&[name], node)?;
    }
    Ok(())
}

fn add_acceleration(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    record.insert(&["Acceleration"], group())?;
    Ok(())
}

fn acceleration_to_speed(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    record.take(&["Acceleration"])?;
    record.insert(&["Speed"], group())?;
    Ok(())
}

fn add_combined(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    record.insert(&["Combined"], group())?;
    Ok(())
}

/// Splits each click map into `[left, middle, right]` and moves tick counts
/// under `Ticks`.
///
/// Click counts recorded so far become left-button counts for live and scan
/// loads alike. Earlier releases cleared them when this upgrade ran on a live
/// load; here they are always kept.
fn split_clicks_and_ticks(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    for node in record.group_mut(&["Clicks"])?.values_mut() {
        let left = std::mem::replace(node, Node::Int(0));
        *node = Node::List(vec![left, sparse(), sparse()]);
    }
    record.insert(&["Keys"], Node::group_of([("Pressed", group()), ("Held", group())]))?;

    let count = record.take(&["Count"])?;
    let total = record.take(&["Ticks"])?;
    record.insert(
        &["Ticks"],
        Node::group_of([
            ("Current", count.clone()),
            ("Total", total),
            ("Recorded", count),
        ]),
    )?;
    Ok(())
}

fn creation_time(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    let saved = record.take(&["LastSave"])?;
    record.insert(
        &["Time"],
        Node::group_of([("Created", saved.clone()), ("Modified", saved)]),
    )?;
    Ok(())
}

fn group_maps(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    let mut maps = Group::new();
    for name in ["Tracks", "Clicks", "Speed", "Combined"] {
        maps.insert(Key::name(name), record.take(&[name])?);
    }
    for i in 1..=8 {
        maps.insert(Key::name(format!("Temp{i}")), group());
    }
    record.insert(&["Maps"], Node::Group(maps))?;
    Ok(())
}

fn per_map_ticks(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    let current = record.take(&["Ticks", "Current"])?;
    record.insert(
        &["Ticks", "Current"],
        Node::group_of([("Tracks", current.clone()), ("Speed", current)]),
    )?;
    Ok(())
}

fn drop_speed_maps(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    record.take(&["Maps", "Speed"])?;
    record.take(&["Maps", "Combined"])?;
    record.take(&["Ticks", "Current", "Speed"])?;
    Ok(())
}

fn session_ticks(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    let current = record.get(&["Ticks", "Current", "Tracks"])?.clone();
    let total = record.get(&["Ticks", "Total"])?.clone();
    record.insert(
        &["Ticks", "Session"],
        Node::group_of([("Current", current), ("Total", total)]),
    )?;
    Ok(())
}

fn session_keys(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    let all = record.take(&["Keys"])?;
    record.insert(
        &["Keys"],
        Node::group_of([
            ("All", all),
            (
                "Session",
                Node::group_of([("Pressed", group()), ("Held", group())]),
            ),
        ]),
    )?;
    Ok(())
}

fn rename_keys(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    for scope in KEY_SCOPES {
        for counter in ["Pressed", "Held"] {
            let keys = record.group_mut(&["Keys", scope, counter])?;
            for (old, new) in KEY_RENAMES {
                match keys.remove(&Key::name(old)) {
                    Some(value) => {
                        keys.insert(Key::name(new), value);
                    }
                    None => tracing::debug!(
                        "No {} in Keys.{}.{}, skipping rename",
                        old,
                        scope,
                        counter
                    ),
                }
            }
        }
    }
    Ok(())
}

fn session_starts(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    record.insert(&["SessionStarts"], Node::List(Vec::new()))?;
    Ok(())
}

fn prune_track_bounds(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    for (key, node) in record.group_mut(&["Maps", "Tracks"])?.iter_mut() {
        if let (Key::Resolution(res), Node::Sparse(points)) = (key, node) {
            let dropped = points.retain_within(*res);
            if dropped > 0 {
                tracing::debug!("Removed {} track coordinates outside {}", dropped, res);
            }
        }
    }
    Ok(())
}

fn integer_ticks(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    let tracks = record.int(&["Ticks", "Current", "Tracks"])?;
    let session = record.int(&["Ticks", "Session", "Current"])?;
    record.insert(&["Ticks", "Tracks"], Node::Int(tracks))?;
    record.insert(&["Ticks", "Session", "Tracks"], Node::Int(session))?;
    record.take(&["Ticks", "Current"])?;
    record.take(&["Ticks", "Session", "Current"])?;

    for node in record.group_mut(&["Maps", "Tracks"])?.values_mut() {
        if let Node::Sparse(points) = node {
            for count in points.entries.values_mut() {
                *count = count.truncate();
            }
        }
    }
    Ok(())
}

fn session_clicks(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    record.insert(&["Maps", "Session"], Node::group_of([("Clicks", group())]))?;
    Ok(())
}

fn drop_temp_maps(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    for i in 1..=8 {
        let name = format!("Temp{i}");
        record.take(&["Maps", name.as_str()])?;
    }
    record.insert(&["Maps", "DoubleClicks"], group())?;
    record.insert(&["Maps", "Session", "DoubleClicks"], group())?;
    Ok(())
}

fn prune_resolutions(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    for map in ["Tracks", "Clicks", "DoubleClicks"] {
        record.group_mut(&["Maps", map])?.retain(|key, _| match key {
            Key::Resolution(res) => {
                let keep = res.has_supported_aspect();
                if !keep {
                    tracing::warn!("Removing {} from Maps.{}: unsupported aspect ratio", res, map);
                }
                keep
            }
            Key::Name(_) => true,
        });
    }
    Ok(())
}

/// Splits `{res: [left, middle, right]}` into one group per button.
fn split_by_button(source: Group, path: &[&str]) -> Result<Vec<(MouseButton, Group)>> {
    let mut buttons: Vec<(MouseButton, Group)> =
        MouseButton::iter().map(|b| (b, Group::new())).collect();
    for (key, node) in source {
        let Node::List(items) = node else {
            return Err(ProfileError::mismatch(path, "list of three button maps"));
        };
        if items.len() != buttons.len() {
            return Err(ProfileError::mismatch(path, "list of three button maps"));
        }
        for ((_, slot), item) in buttons.iter_mut().zip(items) {
            slot.insert(key.clone(), item);
        }
    }
    Ok(buttons)
}

fn click_hierarchy(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    for base in [&["Maps"][..], &["Maps", "Session"][..]] {
        let mut kinds = Group::new();
        for (kind, field) in [(ClickKind::Single, "Clicks"), (ClickKind::Double, "DoubleClicks")] {
            let path = join_path(base, field);
            let source = record.take_group(&path)?;
            let buttons = split_by_button(source, &path)?;
            kinds.insert(
                Key::name(kind.to_string()),
                Node::Group(
                    buttons
                        .into_iter()
                        .map(|(button, leaves)| {
                            (Key::name(button.to_string()), Node::Group(leaves))
                        })
                        .collect(),
                ),
            );
        }
        record.insert(&join_path(base, "Click"), Node::Group(kinds))?;
    }

    let summary = maps::convert_legacy(record.group_mut(&["Maps"])?);
    tracing::debug!(
        "Converted {} legacy maps to grids ({} coordinates dropped)",
        summary.converted,
        summary.dropped
    );
    Ok(())
}

fn reset_double_clicks(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    record.insert(&["Maps", "Click", "Double"], empty_button_groups())?;
    Ok(())
}

fn key_intervals(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    for scope in KEY_SCOPES {
        record.insert(&["Keys", scope, "Intervals"], group())?;
        record.insert(&["Keys", scope, "Mistakes"], group())?;
    }
    Ok(())
}

fn individual_intervals(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    for scope in KEY_SCOPES {
        let total = record.take(&["Keys", scope, "Intervals"])?;
        record.insert(
            &["Keys", scope, "Intervals"],
            Node::group_of([("Total", total), ("Individual", group())]),
        )?;
    }
    Ok(())
}

fn gamepad(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    record.insert(
        &["Gamepad"],
        Node::group_of([(
            "All",
            Node::group_of([
                (
                    "Buttons",
                    Node::group_of([("Pressed", group()), ("Held", group())]),
                ),
                ("Axis", group()),
            ]),
        )]),
    )?;
    Ok(())
}

type ClickLeaves = HashMap<(ClickKind, MouseButton), Group>;

/// Flattens `Click.{Single,Double}.{Left,Middle,Right}` into owned leaves.
fn take_click_leaves(maps: &mut ProfileRecord, base: &[&str]) -> Result<ClickLeaves> {
    let mut leaves = ClickLeaves::new();
    for kind in ClickKind::iter() {
        for button in MouseButton::iter() {
            let (kind_name, button_name) = (kind.to_string(), button.to_string());
            let mut path = join_path(base, "Click");
            path.push(&kind_name);
            path.push(&button_name);
            leaves.insert((kind, button), maps.take_group(&path)?);
        }
    }
    Ok(leaves)
}

fn resolutions_in(group: &Group) -> impl Iterator<Item = Resolution> + '_ {
    group.keys().filter_map(Key::as_resolution)
}

fn resolution_keys(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    let mut maps = ProfileRecord::from_group(record.take_group(&["Maps"])?);
    let mut tracks = maps.take_group(&["Tracks"])?;
    let mut all_clicks = take_click_leaves(&mut maps, &[])?;
    let mut session_clicks = take_click_leaves(&mut maps, &["Session"])?;

    // Every resolution with any all-time data keeps an entry.
    let mut resolutions: BTreeSet<Resolution> = resolutions_in(&tracks).collect();
    for leaves in all_clicks.values() {
        resolutions.extend(resolutions_in(leaves));
    }

    let mut by_resolution = Group::new();
    for res in resolutions {
        let key = Key::Resolution(res);
        let zero = || Node::Grid(Grid::zeros(res));
        let tracks_grid = tracks.remove(&key).unwrap_or_else(zero);

        let take_leaf = |leaves: &mut ClickLeaves, kind: ClickKind, button: MouseButton| {
            leaves
                .get_mut(&(kind, button))
                .and_then(|g| g.remove(&key))
                .unwrap_or_else(zero)
        };
        let all = click_set(|kind, button| take_leaf(&mut all_clicks, kind, button));

        let has_session = session_clicks.values().any(|g| g.contains_key(&key));
        let mut clicks = vec![("All", all)];
        if has_session {
            clicks.push((
                "Session",
                click_set(|kind, button| take_leaf(&mut session_clicks, kind, button)),
            ));
        }

        by_resolution.insert(
            key.clone(),
            Node::group_of([
                ("Tracks", tracks_grid),
                (
                    "Clicks",
                    Node::Group(clicks.into_iter().map(|(n, v)| (Key::name(n), v)).collect()),
                ),
            ]),
        );
    }

    let unkeyed = tracks.keys().filter(|k| k.as_resolution().is_none()).count();
    if unkeyed > 0 {
        tracing::warn!("Discarded {} track maps without a resolution key", unkeyed);
    }

    record.insert(&["Resolution"], Node::Group(by_resolution))?;
    Ok(())
}

fn history_animation(record: &mut ProfileRecord, _: &MigrationContext) -> Result<()> {
    record.insert(
        &["HistoryAnimation"],
        Node::group_of([
            ("Tracks", Node::List(Vec::new())),
            ("Clicks", Node::List(Vec::new())),
            ("Keyboard", Node::List(Vec::new())),
        ]),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::build_profile_registry;
    use mtrack_core::{Count, Point};

    const NOW: f64 = 1_700_000_000.0;

    fn ctx() -> MigrationContext {
        MigrationContext::at(NOW)
    }

    /// A freshly created profile migrated up to `version`.
    fn record_at(version: &str) -> ProfileRecord {
        build_profile_registry()
            .migrate_to(ProfileRecord::new(), SchemaVersion::resolve(version), &ctx())
            .unwrap()
    }

    fn run(name: &str, record: &mut ProfileRecord) -> Result<()> {
        let step = STEPS.iter().find(|s| s.name == name).unwrap();
        step.migrate(record, &ctx())
    }

    fn sparse_of(points: &[(i64, i64, u64)]) -> Node {
        Node::Sparse(
            points
                .iter()
                .map(|&(x, y, c)| (Point::new(x, y), Count::Int(c)))
                .collect(),
        )
    }

    fn res_key(w: u32, h: u32) -> Key {
        Key::Resolution(Resolution::new(w, h))
    }

    #[test]
    fn test_steps_cover_every_version_once() {
        assert_eq!(STEPS.len(), mtrack_core::VERSION_HISTORY.len() - 1);
        for (i, step) in STEPS.iter().enumerate() {
            assert_eq!(step.to_version().index(), i + 1, "{}", step.name);
        }
    }

    #[test]
    fn test_base_layout_stamps_last_save() {
        let record = record_at("2.0");
        assert_eq!(record.float(&["LastSave"]).unwrap(), NOW);
        assert_eq!(record.int(&["TimesLoaded"]).unwrap(), 0);
        assert_eq!(record.version_tag(), Some("2.0"));
    }

    #[test]
    fn test_acceleration_to_speed_requires_acceleration() {
        let mut record = record_at("2.0");
        let err = run("acceleration_to_speed", &mut record).unwrap_err();
        assert_eq!(
            err,
            ProfileError::MissingField {
                path: "Acceleration".to_string()
            }
        );
    }

    #[test]
    fn test_split_clicks_and_ticks_keeps_counts() {
        let mut record = record_at("2.0.2");
        record.insert(&["Count"], Node::Int(42)).unwrap();
        record.insert(&["Ticks"], Node::Int(900)).unwrap();
        record
            .group_mut(&["Clicks"])
            .unwrap()
            .insert(res_key(1920, 1080), sparse_of(&[(5, 5, 2)]));

        run("split_clicks_and_ticks", &mut record).unwrap();

        assert_eq!(record.int(&["Ticks", "Current"]).unwrap(), 42);
        assert_eq!(record.int(&["Ticks", "Recorded"]).unwrap(), 42);
        assert_eq!(record.int(&["Ticks", "Total"]).unwrap(), 900);
        assert!(!record.contains(&["Count"]));

        let clicks = record.group(&["Clicks"]).unwrap();
        match &clicks[&res_key(1920, 1080)] {
            Node::List(buttons) => {
                assert_eq!(buttons.len(), 3);
                assert_eq!(buttons[0], sparse_of(&[(5, 5, 2)]));
                assert_eq!(buttons[1], sparse_of(&[]));
            }
            other => panic!("expected list, got {}", other.kind()),
        }
    }

    #[test]
    fn test_rename_keys_is_per_map_and_skips_absent() {
        let mut record = record_at("2.0.6c");
        record
            .group_mut(&["Keys", "All", "Pressed"])
            .unwrap()
            .insert(Key::name("HASH"), Node::Int(3));
        record
            .group_mut(&["Keys", "Session", "Held"])
            .unwrap()
            .insert(Key::name("UNDERSCORE"), Node::Int(7));

        run("rename_keys", &mut record).unwrap();

        assert_eq!(record.int(&["Keys", "All", "Pressed", "NUMBER"]).unwrap(), 3);
        assert!(!record.contains(&["Keys", "All", "Pressed", "HASH"]));
        assert_eq!(record.int(&["Keys", "Session", "Held", "HYPHEN"]).unwrap(), 7);
        assert!(record.group(&["Keys", "All", "Held"]).unwrap().is_empty());
    }

    #[test]
    fn test_prune_track_bounds_keeps_origin() {
        let mut record = record_at("2.0.8");
        record.group_mut(&["Maps", "Tracks"]).unwrap().insert(
            res_key(4, 3),
            sparse_of(&[(0, 0, 1), (3, 2, 2), (4, 0, 9), (0, 3, 9)]),
        );

        run("prune_track_bounds", &mut record).unwrap();

        assert_eq!(
            record.group(&["Maps", "Tracks"]).unwrap()[&res_key(4, 3)],
            sparse_of(&[(0, 0, 1), (3, 2, 2)])
        );
    }

    #[test]
    fn test_prune_track_bounds_drops_negative_points() {
        let mut record = record_at("2.0.8");
        record
            .group_mut(&["Maps", "Tracks"])
            .unwrap()
            .insert(res_key(4, 3), sparse_of(&[(1, 1, 7), (-5, 2, 3), (2, -1, 4)]));

        run("prune_track_bounds", &mut record).unwrap();

        assert_eq!(
            record.group(&["Maps", "Tracks"]).unwrap()[&res_key(4, 3)],
            sparse_of(&[(1, 1, 7)])
        );
    }

    #[test]
    fn test_integer_ticks_truncates() {
        let mut record = record_at("2.0.9");
        record
            .insert(&["Ticks", "Current", "Tracks"], Node::Float(12.9))
            .unwrap();
        let mut points = SparseGrid::new();
        points.insert(Point::new(1, 1), Count::Float(4.7));
        record
            .group_mut(&["Maps", "Tracks"])
            .unwrap()
            .insert(res_key(4, 3), Node::Sparse(points));

        run("integer_ticks", &mut record).unwrap();

        assert_eq!(record.get(&["Ticks", "Tracks"]).unwrap(), &Node::Int(12));
        assert!(!record.contains(&["Ticks", "Current"]));
        assert!(!record.contains(&["Ticks", "Session", "Current"]));
        assert_eq!(
            record.group(&["Maps", "Tracks"]).unwrap()[&res_key(4, 3)],
            sparse_of(&[(1, 1, 4)])
        );
    }

    #[test]
    fn test_prune_resolutions() {
        let mut record = record_at("2.0.9d");
        for map in ["Tracks", "Clicks", "DoubleClicks"] {
            let group = record.group_mut(&["Maps", map]).unwrap();
            group.insert(res_key(1920, 1080), sparse_of(&[]));
            group.insert(res_key(1337, 999), sparse_of(&[]));
        }

        run("prune_resolutions", &mut record).unwrap();

        for map in ["Tracks", "Clicks", "DoubleClicks"] {
            let group = record.group(&["Maps", map]).unwrap();
            assert!(group.contains_key(&res_key(1920, 1080)));
            assert!(!group.contains_key(&res_key(1337, 999)));
        }
    }

    #[test]
    fn test_click_hierarchy_preserves_every_cell() {
        let mut record = record_at("2.0.9e");
        let lists = Node::List(vec![
            sparse_of(&[(0, 0, 5)]),
            sparse_of(&[(1, 1, 3)]),
            sparse_of(&[(3, 2, 1)]),
        ]);
        record
            .group_mut(&["Maps", "Clicks"])
            .unwrap()
            .insert(res_key(4, 3), lists.clone());
        record
            .group_mut(&["Maps", "Session", "DoubleClicks"])
            .unwrap()
            .insert(res_key(4, 3), lists);

        run("click_hierarchy", &mut record).unwrap();

        assert!(!record.contains(&["Maps", "Clicks"]));
        assert!(!record.contains(&["Maps", "Session", "DoubleClicks"]));
        let expect = [("Left", 0, 0, 5), ("Middle", 1, 1, 3), ("Right", 3, 2, 1)];
        let bases = [
            &["Maps", "Click", "Single"][..],
            &["Maps", "Session", "Click", "Double"][..],
        ];
        for base in bases {
            for (button, x, y, count) in expect {
                let path = join_path(base, button);
                match &record.group(&path).unwrap()[&res_key(4, 3)] {
                    Node::Grid(grid) => {
                        assert_eq!(grid.get(x, y), Some(count));
                        assert_eq!(grid.total(), count);
                    }
                    other => panic!("expected grid, got {}", other.kind()),
                }
            }
        }
    }

    #[test]
    fn test_click_hierarchy_drops_negative_clicks() {
        let mut record = record_at("2.0.9e");
        record.group_mut(&["Maps", "Clicks"]).unwrap().insert(
            res_key(4, 3),
            Node::List(vec![
                sparse_of(&[(2, 1, 4), (-1, 0, 6)]),
                sparse_of(&[(0, -3, 2)]),
                sparse_of(&[]),
            ]),
        );

        run("click_hierarchy", &mut record).unwrap();

        let single = record.group(&["Maps", "Click", "Single"]).unwrap();
        let grid_at = |button: &str| match single[&Key::name(button)].as_group() {
            Some(leaves) => leaves[&res_key(4, 3)].clone(),
            None => panic!("expected a group for {button}"),
        };
        let Node::Grid(left) = grid_at("Left") else {
            panic!("expected a grid for Left");
        };
        assert_eq!(left.get(2, 1), Some(4));
        assert_eq!(left.total(), 4);
        assert_eq!(grid_at("Middle"), Node::Grid(Grid::zeros(Resolution::new(4, 3))));
    }

    #[test]
    fn test_click_hierarchy_rejects_malformed_clicks() {
        let mut record = record_at("2.0.9e");
        record
            .group_mut(&["Maps", "Clicks"])
            .unwrap()
            .insert(res_key(4, 3), sparse_of(&[(0, 0, 1)]));

        let err = run("click_hierarchy", &mut record).unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn test_resolution_keys_defaults_missing_grids() {
        let mut record = record_at("2.0.11");
        let mut tracks = Grid::zeros(Resolution::new(4, 3));
        tracks.set(2, 1, 8);
        record
            .group_mut(&["Maps", "Tracks"])
            .unwrap()
            .insert(res_key(4, 3), Node::Grid(tracks.clone()));
        let mut right = Grid::zeros(Resolution::new(16, 9));
        right.set(0, 0, 1);
        record
            .group_mut(&["Maps", "Click", "Single", "Right"])
            .unwrap()
            .insert(res_key(16, 9), Node::Grid(right.clone()));

        run("resolution_keys", &mut record).unwrap();

        assert!(!record.contains(&["Maps"]));
        let by_res = record.group(&["Resolution"]).unwrap();
        assert_eq!(by_res.len(), 2);

        let small = by_res[&res_key(4, 3)].as_group().unwrap();
        assert_eq!(small[&Key::name("Tracks")], Node::Grid(tracks));

        let wide = ProfileRecord::from_group(by_res[&res_key(16, 9)].as_group().unwrap().clone());
        assert_eq!(
            wide.get(&["Tracks"]).unwrap(),
            &Node::Grid(Grid::zeros(Resolution::new(16, 9)))
        );
        assert_eq!(
            wide.get(&["Clicks", "All", "Single", "Right"]).unwrap(),
            &Node::Grid(right)
        );
        assert_eq!(
            wide.get(&["Clicks", "All", "Double", "Left"]).unwrap(),
            &Node::Grid(Grid::zeros(Resolution::new(16, 9)))
        );
        assert!(!wide.contains(&["Clicks", "Session"]));
    }

    #[test]
    fn test_resolution_keys_carries_session_clicks() {
        let mut record = record_at("2.0.11");
        let res = Resolution::new(4, 3);
        record
            .group_mut(&["Maps", "Tracks"])
            .unwrap()
            .insert(res_key(4, 3), Node::Grid(Grid::zeros(res)));
        let mut session = Grid::zeros(res);
        session.set(1, 2, 6);
        record
            .group_mut(&["Maps", "Session", "Click", "Single", "Left"])
            .unwrap()
            .insert(res_key(4, 3), Node::Grid(session.clone()));

        run("resolution_keys", &mut record).unwrap();

        assert_eq!(
            record
                .get(&["Resolution"])
                .unwrap()
                .as_group()
                .and_then(|g| g[&res_key(4, 3)].as_group())
                .map(|g| ProfileRecord::from_group(g.clone()))
                .unwrap()
                .get(&["Clicks", "Session", "Single", "Left"])
                .unwrap(),
            &Node::Grid(session)
        );
    }
}
