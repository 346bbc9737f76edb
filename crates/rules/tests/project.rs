//! End-to-end: load a project from disk, resolve a cursor range, follow it to
//! its definition, reload a changed file.

use std::fs;
use std::path::{Path, PathBuf};

use rulemap_core::{ByteRange, Settings};
use rulemap_rules::loader::{discover_project_files, LoadEvent};
use rulemap_rules::{resolve_at_range, RulesetLoader};
use tempfile::TempDir;

const UNITS: &str = "\
units:
  - type: SOLDIER
    race: STR_HUMAN
    stats:
      tu: 60
";

const ITEMS: &str = "\
items:
  - type: RIFLE
    spawnUnit: SOLDIER
    requires:
      - SOLDIER
";

const RESEARCH: &str = "\
research:
  - name: SOLDIER
    cost: 100
";

fn write_project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create tempdir");
    let root = dir.path().join("mod");
    fs::create_dir_all(root.join("Ruleset")).unwrap();
    fs::create_dir_all(root.join("Language")).unwrap();
    fs::write(root.join("Ruleset/units.rul"), UNITS).unwrap();
    fs::write(root.join("Ruleset/items.rul"), ITEMS).unwrap();
    fs::write(root.join("Ruleset/research.rul"), RESEARCH).unwrap();
    fs::write(
        root.join("Language/en-US.yml"),
        "en-US:\n  SOLDIER: Soldier\n  RIFLE: Rifle\n",
    )
    .unwrap();
    (dir, root)
}

fn load(root: &Path) -> RulesetLoader {
    let loader = RulesetLoader::new(Settings::default());
    let project = discover_project_files(root, loader.settings()).unwrap();
    let mut completes = 0;
    loader
        .load(&[project], |event| {
            if event == LoadEvent::Complete {
                completes += 1;
            }
        })
        .unwrap();
    assert_eq!(completes, 1);
    loader
}

fn nth_range(text: &str, needle: &str, nth: usize) -> ByteRange {
    let (start, _) = text.match_indices(needle).nth(nth).expect("needle present");
    ByteRange::new(start, start + needle.len())
}

#[test]
fn cross_reference_resolves_to_the_targeted_rule_type() {
    let (_dir, root) = write_project();
    let loader = load(&root);
    let tree = loader.tree();

    let range = nth_range(ITEMS, "SOLDIER", 0);
    let source = resolve_at_range(ITEMS, range).expect("token resolves");
    assert_eq!(source.rule_type, "items");
    assert_eq!(source.key, "spawnUnit");

    let found = tree.find_definitions(&root, "SOLDIER", Some(&source));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].rule_type, "units");
    assert_eq!(found[0].file, root.join("Ruleset/units.rul"));
    assert_eq!(found[0].range, nth_range(UNITS, "SOLDIER", 0));

    // The same name under `requires` targets research instead.
    let source = resolve_at_range(ITEMS, nth_range(ITEMS, "SOLDIER", 1)).unwrap();
    assert_eq!(source.key, "requires");
    let found = tree.find_definitions(&root, "SOLDIER", Some(&source));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].rule_type, "research");

    assert_eq!(tree.find_definitions(&root, "SOLDIER", None).len(), 2);
    assert_eq!(tree.translation(&root, "RIFLE"), "Rifle");
}

#[test]
fn renamed_definition_disappears_after_reload() {
    let (_dir, root) = write_project();
    fs::remove_file(root.join("Ruleset/research.rul")).unwrap();
    let loader = load(&root);
    let tree = loader.tree();
    assert_eq!(tree.find_definitions(&root, "SOLDIER", None).len(), 1);

    let units = root.join("Ruleset/units.rul");
    fs::write(&units, UNITS.replace("SOLDIER", "SOLDIER_2")).unwrap();
    let result = loader.reload_file(&root, &units, |_| {});
    assert!(result.is_loaded());

    assert!(tree.find_definitions(&root, "SOLDIER", None).is_empty());
    let renamed = tree.find_definitions(&root, "SOLDIER_2", None);
    assert_eq!(renamed.len(), 1);
    assert_eq!(renamed[0].file, units);
    assert_eq!(tree.files_defining(&root, "SOLDIER_2"), vec![units]);
}

#[test]
fn projects_are_indexed_independently() {
    let (_dir_a, root_a) = write_project();
    let (_dir_b, root_b) = write_project();
    fs::write(root_b.join("Ruleset/units.rul"), "units:\n  - type: MUTON\n").unwrap();

    let loader = RulesetLoader::new(Settings::default());
    let projects = vec![
        discover_project_files(&root_a, loader.settings()).unwrap(),
        discover_project_files(&root_b, loader.settings()).unwrap(),
    ];
    let mut per_root_totals = Vec::new();
    loader
        .load(&projects, |event| {
            if let LoadEvent::FileLoaded(progress) = event {
                per_root_totals.push((progress.root, progress.total_files));
            }
        })
        .unwrap();
    assert_eq!(per_root_totals.len(), 8);
    assert!(per_root_totals.iter().all(|(_, total)| *total == 4));

    let tree = loader.tree();
    assert_eq!(tree.roots().len(), 2);
    assert!(tree.find_definitions(&root_a, "MUTON", None).is_empty());
    assert_eq!(tree.find_definitions(&root_b, "MUTON", None).len(), 1);
    assert_eq!(tree.find_definitions(&root_b, "SOLDIER", None).len(), 1);
}
