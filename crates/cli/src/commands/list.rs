use runbook_manifest::{Manifest, TaskKind};

/// Print every task name, its kind, and description (if any), one per
/// line, sorted by name (the manifest's `BTreeMap` already gives us
/// that order for free).
pub fn execute(manifest: &Manifest) {
    for (name, task) in &manifest.tasks {
        let kind = match task.kind {
            TaskKind::Oneshot => "oneshot",
            TaskKind::Daemon => "daemon",
        };
        match &task.description {
            Some(desc) => println!("{name}\t{kind}\t{desc}"),
            None => println!("{name}\t{kind}"),
        }
    }
}
