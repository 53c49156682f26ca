use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Result;
use arbor_source::{
    ChangeTryRecvError, DataSourceOptions, FlatDataSource, NestedDataSource,
    SourceError, ViewportRange,
};
use arbor_tree::{
    AccessorKind, Children, ChildrenSender, FlatTreeControl, TreeError,
    TreeFlattener, TreeView,
};

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    name: &'static str,
    children: Vec<Entry>,
}

impl Entry {
    fn leaf(name: &'static str) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    fn branch(name: &'static str, children: Vec<Entry>) -> Self {
        Self { name, children }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Row {
    name: &'static str,
    level: usize,
    expandable: bool,
}

type Senders = Rc<RefCell<HashMap<&'static str, ChildrenSender<Entry>>>>;

fn entries() -> Vec<Entry> {
    vec![
        Entry::branch(
            "parent 1",
            vec![
                Entry::branch(
                    "parent 1-1",
                    vec![Entry::leaf("leaf 1-1-1"), Entry::leaf("leaf 1-1-2")],
                ),
                Entry::branch("parent 1-2", vec![Entry::leaf("leaf 1-2-1")]),
            ],
        ),
        Entry::branch("parent 2", vec![Entry::leaf("leaf 2-1")]),
    ]
}

fn to_row(entry: &Entry, level: usize) -> Row {
    Row {
        name: entry.name,
        level,
        expandable: !entry.children.is_empty(),
    }
}

fn flattener() -> TreeFlattener<Entry, Row> {
    TreeFlattener::new(
        to_row,
        |row: &Row| row.level,
        |row: &Row| row.expandable,
        |entry: &Entry| entry.children.clone(),
    )
}

/// Children of the named entries arrive through senders kept in the
/// returned map.
fn deferred_flattener(
    deferred: &'static [&'static str],
) -> (TreeFlattener<Entry, Row>, Senders) {
    let senders = Senders::default();
    let captured = Rc::clone(&senders);
    let flattener = TreeFlattener::new(
        to_row,
        |row: &Row| row.level,
        |row: &Row| row.expandable,
        move |entry: &Entry| {
            if deferred.contains(&entry.name) {
                let (sender, children) = Children::deferred();
                captured.borrow_mut().insert(entry.name, sender);
                children
            } else {
                Children::Ready(entry.children.clone())
            }
        },
    );
    (flattener, senders)
}

fn level_tree() -> TreeView<Row, &'static str> {
    TreeView::builder()
        .level_accessor(|row: &Row| row.level)
        .track_by(|row: &Row| row.name)
        .build()
        .expect("level tree")
}

fn names(rows: &[Row]) -> Vec<&'static str> {
    rows.iter().map(|row| row.name).collect()
}

fn row<'a>(
    source: &'a FlatDataSource<Entry, Row, &'static str>,
    name: &str,
) -> &'a Row {
    source
        .flattened_data()
        .iter()
        .find(|row| row.name == name)
        .expect("row present")
}

#[test]
fn only_expanded_parent_reveals_its_children() -> Result<()> {
    let mut source = FlatDataSource::new(level_tree(), flattener(), entries())?;
    assert_eq!(names(&source.visible()), vec!["parent 1", "parent 2"]);

    let parent = row(&source, "parent 1").clone();
    assert!(source.expand(&parent));

    assert_eq!(
        names(&source.visible()),
        vec!["parent 1", "parent 1-1", "parent 1-2", "parent 2"]
    );
    Ok(())
}

#[test]
fn expansion_round_trip_restores_visible_sequence() -> Result<()> {
    let mut source = FlatDataSource::new(level_tree(), flattener(), entries())?;
    let before = source.visible();
    let parent = row(&source, "parent 2").clone();

    source.expand(&parent);
    assert_eq!(source.visible().len(), before.len() + 1);
    source.collapse(&parent);

    assert_eq!(&*source.visible(), &*before);
    Ok(())
}

#[test]
fn no_op_expansion_does_not_notify() -> Result<()> {
    let mut source = FlatDataSource::new(level_tree(), flattener(), entries())?;
    let changes = source.connect();
    changes.try_recv().expect("initial value");

    let leaf = row(&source, "leaf 2-1").clone();
    assert!(!source.collapse(&leaf));
    assert_eq!(changes.try_recv(), Err(ChangeTryRecvError::Empty));
    Ok(())
}

#[test]
fn set_data_twice_yields_equal_visible_sequences() -> Result<()> {
    let data: Arc<[Entry]> = Arc::from(entries());
    let mut source =
        FlatDataSource::new(level_tree(), flattener(), Arc::clone(&data))?;
    source.expand_all();
    let changes = source.connect();

    source.set_data(Arc::clone(&data))?;
    source.set_data(Arc::clone(&data))?;

    let first = changes.recv()?;
    let second = changes.recv()?;
    let third = changes.recv()?;
    assert_eq!(&*first, &*second);
    assert_eq!(&*second, &*third);
    assert_eq!(first.len(), 8);
    assert!(Arc::ptr_eq(source.data(), &data));
    Ok(())
}

#[test]
fn expansion_survives_data_reload() -> Result<()> {
    let mut source = FlatDataSource::new(level_tree(), flattener(), entries())?;
    let parent = row(&source, "parent 2").clone();
    source.expand(&parent);

    source.set_data(entries())?;
    assert!(source.is_expanded(&parent));
    assert_eq!(source.visible().len(), 3);
    Ok(())
}

#[test]
fn connect_delivers_current_sequence_then_updates() -> Result<()> {
    let mut source = FlatDataSource::new(level_tree(), flattener(), entries())?;
    let changes = source.connect();

    assert_eq!(names(&changes.recv()?), vec!["parent 1", "parent 2"]);

    source.expand_all();
    assert_eq!(changes.recv()?.len(), 8);
    Ok(())
}

#[test]
fn disconnect_releases_only_that_subscription() -> Result<()> {
    let mut source = FlatDataSource::new(level_tree(), flattener(), entries())?;
    let kept = source.connect();
    let released = source.connect();

    assert!(source.disconnect(released));
    source.view_changed(ViewportRange::new(0, 1));

    assert_eq!(kept.drain_latest().map(|rows| rows.len()), Some(2));
    Ok(())
}

#[test]
fn view_changed_republishes_and_windows_rows() -> Result<()> {
    let mut source = FlatDataSource::new(level_tree(), flattener(), entries())?;
    source.expand_all();
    let changes = source.connect();
    changes.try_recv().expect("initial value");

    source.view_changed(ViewportRange::new(6, 10));

    assert_eq!(changes.try_recv().map(|rows| rows.len()), Ok(8));
    assert_eq!(source.viewport(), Some(ViewportRange::new(6, 10)));
    assert_eq!(names(source.visible_window()), vec!["parent 2", "leaf 2-1"]);
    Ok(())
}

#[test]
fn descendant_operations_refresh_visible_rows() -> Result<()> {
    let mut source = FlatDataSource::new(level_tree(), flattener(), entries())?;
    let parent = row(&source, "parent 1").clone();

    assert!(source.expand_descendants(&parent));
    assert_eq!(source.visible().len(), 7);

    assert!(source.toggle_descendants(&parent));
    assert_eq!(names(&source.visible()), vec!["parent 1", "parent 2"]);
    Ok(())
}

#[test]
fn children_accessor_tree_is_rejected_by_flat_source() {
    let tree = TreeView::<Row, &str>::builder()
        .children_accessor(|_: &Row| &[])
        .track_by(|row: &Row| row.name)
        .build()
        .expect("children tree");

    let result = FlatDataSource::new(tree, flattener(), entries());
    assert!(matches!(
        result,
        Err(SourceError::UnsupportedAccessor {
            found: AccessorKind::Children
        })
    ));
}

#[test]
fn tree_control_receives_flattened_rows() -> Result<()> {
    let control = FlatTreeControl::new(
        |row: &Row| row.level,
        |row: &Row| row.expandable,
        |row: &Row| row.name,
    );
    let tree = TreeView::builder().tree_control(control).build()?;
    let mut source = FlatDataSource::new(tree, flattener(), entries())?;

    let control = source.tree().control().expect("control");
    assert_eq!(control.data_nodes().len(), 8);

    source.expand_all();
    assert_eq!(source.visible().len(), 8);
    source.collapse_all();
    assert_eq!(source.visible().len(), 2);
    Ok(())
}

#[test]
fn silent_children_source_leaves_siblings_visible() -> Result<()> {
    let (flattener, _senders) = deferred_flattener(&["parent 1"]);
    let mut source = FlatDataSource::new(level_tree(), flattener, entries())?;
    source.expand_all();

    assert!(source.has_pending_children());
    assert!(!source.poll_children()?);
    assert_eq!(
        names(source.flattened_data()),
        vec!["parent 1", "parent 2", "leaf 2-1"]
    );
    Ok(())
}

#[test]
fn deferred_children_are_spliced_on_poll() -> Result<()> {
    let (flattener, senders) = deferred_flattener(&["parent 1-1"]);
    let mut source = FlatDataSource::new(level_tree(), flattener, entries())?;
    source.expand_all();
    let changes = source.connect();
    changes.try_recv().expect("initial value");

    let sender = senders.borrow_mut().remove("parent 1-1").expect("sender");
    assert!(sender.send(vec![Entry::leaf("leaf 1-1-1")]));
    assert!(source.poll_children()?);

    assert!(!source.has_pending_children());
    assert_eq!(
        names(&changes.try_recv().expect("update")),
        vec![
            "parent 1",
            "parent 1-1",
            "leaf 1-1-1",
            "parent 1-2",
            "leaf 1-2-1",
            "parent 2",
            "leaf 2-1",
        ]
    );
    Ok(())
}

#[test]
fn failing_children_source_discards_the_pass() -> Result<()> {
    let (flattener, senders) = deferred_flattener(&["parent 2"]);
    let mut source = FlatDataSource::new(level_tree(), flattener, entries())?;
    let changes = source.connect();
    changes.try_recv().expect("initial value");

    senders.borrow()["parent 2"].fail("listing failed");
    let error = source.poll_children().err().expect("error");

    assert!(matches!(error, SourceError::Tree(TreeError::Children(_))));
    assert!(source.flattened_data().is_empty());
    assert!(changes.try_recv().expect("notification").is_empty());
    assert_eq!(changes.try_recv(), Err(ChangeTryRecvError::Empty));
    assert!(!source.has_pending_children());
    Ok(())
}

#[test]
fn new_data_supersedes_pending_children() -> Result<()> {
    let (flattener, senders) = deferred_flattener(&["parent 2"]);
    let mut source = FlatDataSource::new(level_tree(), flattener, entries())?;
    let generation = source.generation();
    let stale = senders.borrow_mut().remove("parent 2").expect("sender");

    source.set_data(vec![Entry::leaf("solo")])?;
    assert_eq!(source.generation(), generation + 1);

    stale.send(vec![Entry::leaf("late")]);
    assert!(!source.poll_children()?);
    assert_eq!(names(source.flattened_data()), vec!["solo"]);
    Ok(())
}

#[test]
fn failed_reload_keeps_previous_rows() -> Result<()> {
    let flattener = flattener().with_max_depth(1);
    let shallow = vec![Entry::branch("top", vec![Entry::leaf("child")])];
    let mut source = FlatDataSource::new(level_tree(), flattener, shallow)?;

    let error = source.set_data(entries()).err().expect("too deep");
    assert!(matches!(
        error,
        SourceError::Tree(TreeError::DepthExceeded { limit: 1 })
    ));
    assert_eq!(names(source.flattened_data()), vec!["top", "child"]);
    assert_eq!(source.data().len(), 1);
    Ok(())
}

#[test]
fn failed_reload_keeps_pending_children_resolvable() -> Result<()> {
    let (flattener, senders) = deferred_flattener(&["parent 2"]);
    let shallow = vec![
        Entry::branch("top", vec![Entry::leaf("child")]),
        Entry::branch("parent 2", vec![Entry::leaf("leaf 2-1")]),
    ];
    let mut source = FlatDataSource::new(
        level_tree(),
        flattener.with_max_depth(1),
        shallow,
    )?;
    let generation = source.generation();
    assert!(source.has_pending_children());

    assert!(source.set_data(entries()).is_err());
    assert_eq!(source.generation(), generation);
    assert!(source.has_pending_children());

    let sender = senders.borrow_mut().remove("parent 2").expect("sender");
    assert!(sender.send(vec![Entry::leaf("leaf 2-1")]));
    assert!(source.poll_children()?);

    assert!(!source.has_pending_children());
    assert_eq!(
        names(source.flattened_data()),
        vec!["top", "child", "parent 2", "leaf 2-1"]
    );
    Ok(())
}

#[test]
fn lagging_subscriber_receives_newest_sequence() -> Result<()> {
    let options = DataSourceOptions::default().with_change_capacity(1);
    let mut source = FlatDataSource::with_options(
        level_tree(),
        flattener(),
        entries(),
        options,
    )?;
    let changes = source.connect();

    source.expand_all();
    assert_eq!(changes.try_recv().map(|rows| rows.len()), Ok(8));
    assert_eq!(changes.try_recv(), Err(ChangeTryRecvError::Empty));

    let first = row(&source, "parent 1").clone();
    let second = row(&source, "parent 2").clone();
    source.collapse(&first);
    source.collapse(&second);
    assert_eq!(changes.drain_latest().as_deref(), Some(&*source.visible()));
    assert_eq!(names(&source.visible()), vec!["parent 1", "parent 2"]);
    Ok(())
}

fn nested_tree() -> TreeView<Entry, &'static str> {
    TreeView::builder()
        .children_accessor(|entry: &Entry| entry.children.as_slice())
        .track_by(|entry: &Entry| entry.name)
        .build()
        .expect("children tree")
}

fn entry_names(entries: &[Entry]) -> Vec<&'static str> {
    entries.iter().map(|entry| entry.name).collect()
}

#[test]
fn nested_source_walks_only_expanded_nodes() -> Result<()> {
    let data = entries();
    let mut source = NestedDataSource::new(nested_tree(), data.clone())?;
    assert_eq!(entry_names(&source.visible()), vec!["parent 1", "parent 2"]);

    source.expand(&data[0]);
    source.expand(&data[0].children[1]);
    assert_eq!(
        entry_names(&source.visible()),
        vec!["parent 1", "parent 1-1", "parent 1-2", "leaf 1-2-1", "parent 2"]
    );

    source.collapse(&data[0]);
    assert_eq!(entry_names(&source.visible()), vec!["parent 1", "parent 2"]);
    Ok(())
}

#[test]
fn nested_source_publishes_changes() -> Result<()> {
    let data = entries();
    let mut source = NestedDataSource::new(nested_tree(), data.clone())?;
    let changes = source.connect();
    assert_eq!(changes.recv()?.len(), 2);

    source.expand_all();
    assert_eq!(changes.recv()?.len(), 8);

    source.set_data(vec![data[1].clone()]);
    assert_eq!(entry_names(&changes.recv()?), vec!["parent 2", "leaf 2-1"]);
    Ok(())
}

#[test]
fn nested_source_rejects_flat_trees() {
    let result = NestedDataSource::new(
        TreeView::<Entry, &str>::builder()
            .level_accessor(|_: &Entry| 0)
            .track_by(|entry: &Entry| entry.name)
            .build()
            .expect("level tree"),
        entries(),
    );
    assert!(matches!(
        result,
        Err(SourceError::UnsupportedAccessor {
            found: AccessorKind::Level
        })
    ));
}
