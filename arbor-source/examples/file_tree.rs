use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use arbor_source::{FlatDataSource, ViewportRange};
use arbor_tree::{Children, ChildrenSender, TreeFlattener, TreeView};
use log::info;

#[derive(Clone, Debug)]
struct FsEntry {
    path: String,
    is_dir: bool,
}

impl FsEntry {
    fn new(path: &str, is_dir: bool) -> Self {
        Self {
            path: path.to_string(),
            is_dir,
        }
    }
}

#[derive(Clone, Debug)]
struct Row {
    path: String,
    level: usize,
    is_dir: bool,
}

impl Row {
    fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

type Listings = Rc<RefCell<Vec<(String, ChildrenSender<FsEntry>)>>>;

/// Directory listing served by a slow backend.
fn list_dir(path: &str) -> Vec<FsEntry> {
    match path {
        "project" => vec![
            FsEntry::new("project/src", true),
            FsEntry::new("project/tests", true),
            FsEntry::new("project/Cargo.toml", false),
        ],
        "project/src" => vec![
            FsEntry::new("project/src/lib.rs", false),
            FsEntry::new("project/src/tree", true),
        ],
        "project/src/tree" => vec![
            FsEntry::new("project/src/tree/flat.rs", false),
            FsEntry::new("project/src/tree/nested.rs", false),
        ],
        "project/tests" => vec![FsEntry::new("project/tests/smoke.rs", false)],
        _ => Vec::new(),
    }
}

fn render(source: &FlatDataSource<FsEntry, Row, String>) {
    let tree = source.tree();
    for row in source.visible_window() {
        let mut line = String::new();
        for guide in tree.indents(row) {
            line.push_str(if guide { "│  " } else { "   " });
        }
        if row.level > 0 {
            line.push_str(if tree.is_last(row) { "└─ " } else { "├─ " });
        }
        line.push_str(row.name());
        if row.is_dir {
            line.push('/');
        }
        println!("{line}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let listings = Listings::default();
    let requested = Rc::clone(&listings);
    let flattener = TreeFlattener::new(
        |entry: &FsEntry, level| Row {
            path: entry.path.clone(),
            level,
            is_dir: entry.is_dir,
        },
        |row: &Row| row.level,
        |row: &Row| row.is_dir,
        move |entry: &FsEntry| {
            let (sender, children) = Children::deferred();
            requested.borrow_mut().push((entry.path.clone(), sender));
            children
        },
    );
    let tree = TreeView::builder()
        .level_accessor(|row: &Row| row.level)
        .track_by(|row: &Row| row.path.clone())
        .build()?;

    let mut source = FlatDataSource::new(
        tree,
        flattener,
        vec![FsEntry::new("project", true)],
    )?;
    let changes = source.connect();
    info!("initial rows: {}", changes.recv_async().await?.len());

    while source.has_pending_children() {
        for (path, sender) in listings.borrow_mut().drain(..) {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                sender.send(list_dir(&path));
            });
        }

        tokio::time::sleep(Duration::from_millis(5)).await;
        if source.poll_children()? {
            source.expand_all();
        }
    }

    let visible = changes.drain_latest().unwrap_or_else(|| source.visible());
    info!("listing settled with {} visible rows", visible.len());

    source.view_changed(ViewportRange::new(0, visible.len()));
    render(&source);
    Ok(())
}
