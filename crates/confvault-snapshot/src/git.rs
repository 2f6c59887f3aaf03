//! [`VersionControlBackend`] on top of libgit2.

use crate::backend::{PruneOutcome, VersionControlBackend};
use crate::{Revision, RevisionId, SnapshotError, SnapshotResult};
use chrono::{DateTime, Utc};
use git2::build::CheckoutBuilder;
use git2::{
    BranchType, Commit, Diff, DiffFormat, DiffOptions, ErrorCode, IndexAddOption, ObjectType, Oid,
    Repository, ResetType, Signature, StatusOptions, TreeWalkMode, TreeWalkResult,
};
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Message of the revision created when a repository is first set up.
pub const BASELINE_MESSAGE: &str = "Initial configuration snapshot";

/// File inside the metadata directory listing history boundaries, one
/// object id per line. Uses git's shallow-file format so command-line git
/// treats pruned history the same way.
const SHALLOW_FILE: &str = "shallow";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Git-backed revision storage for a single directory.
///
/// The repository is reopened for every call so the backend itself holds no
/// libgit2 handles and can be shared across threads.
#[derive(Debug, Clone)]
pub struct GitBackend {
    root: PathBuf,
    author_name: String,
    author_email: String,
}

impl GitBackend {
    /// Create a backend for `root`, committing as the given identity.
    pub fn new(
        root: impl Into<PathBuf>,
        author_name: impl Into<String>,
        author_email: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            author_name: author_name.into(),
            author_email: author_email.into(),
        }
    }

    /// The directory under version control.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn open(&self) -> SnapshotResult<Repository> {
        Repository::open(&self.root).map_err(|e| match e.code() {
            ErrorCode::NotFound => SnapshotError::NotInitialized,
            _ => SnapshotError::Git(e),
        })
    }

    fn signature(&self) -> SnapshotResult<Signature<'static>> {
        Ok(Signature::now(&self.author_name, &self.author_email)?)
    }

    /// Stage the whole tree (including deletions) and commit it on HEAD.
    fn write_commit<'r>(
        &self,
        repo: &'r Repository,
        message: &str,
        allow_empty: bool,
    ) -> SnapshotResult<Commit<'r>> {
        let mut index = repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        let tree_id = index.write_tree()?;

        let parent = head_commit(repo)?;
        if !allow_empty && parent.as_ref().is_some_and(|p| p.tree_id() == tree_id) {
            return Err(SnapshotError::NoChanges);
        }

        let tree = repo.find_tree(tree_id)?;
        let sig = self.signature()?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;

        Ok(repo.find_commit(oid)?)
    }
}

impl VersionControlBackend for GitBackend {
    fn initialize(&self) -> SnapshotResult<bool> {
        let init_err = |e: SnapshotError| SnapshotError::Initialization(e.to_string());

        match Repository::open(&self.root) {
            Ok(repo) => {
                if head_commit(&repo).map_err(init_err)?.is_none() {
                    self.write_commit(&repo, BASELINE_MESSAGE, true)
                        .map_err(init_err)?;
                    debug!(root = %self.root.display(), "Created baseline revision");
                }
                return Ok(false);
            }
            Err(e) if e.code() == ErrorCode::NotFound => {}
            Err(e) => return Err(init_err(e.into())),
        }

        let repo = Repository::init(&self.root).map_err(|e| init_err(e.into()))?;
        {
            let mut config = repo.config().map_err(|e| init_err(e.into()))?;
            config
                .set_str("user.name", &self.author_name)
                .map_err(|e| init_err(e.into()))?;
            config
                .set_str("user.email", &self.author_email)
                .map_err(|e| init_err(e.into()))?;
        }
        self.write_commit(&repo, BASELINE_MESSAGE, true)
            .map_err(init_err)?;

        Ok(true)
    }

    fn head(&self) -> SnapshotResult<Revision> {
        let repo = self.open()?;
        let boundaries = read_boundaries(&repo)?;
        let head = head_commit(&repo)?.ok_or(SnapshotError::NotInitialized)?;
        to_revision(&repo, &head, &boundaries)
    }

    fn resolve(&self, id: &str) -> SnapshotResult<Revision> {
        let repo = self.open()?;
        let boundaries = read_boundaries(&repo)?;
        let commit = find_commit(&repo, id)?;
        to_revision(&repo, &commit, &boundaries)
    }

    fn is_dirty(&self) -> SnapshotResult<bool> {
        let repo = self.open()?;
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let dirty = !repo.statuses(Some(&mut opts))?.is_empty();
        Ok(dirty)
    }

    fn changed_paths(&self, since: &RevisionId) -> SnapshotResult<Vec<PathBuf>> {
        let repo = self.open()?;
        let tree = find_commit(&repo, since.as_str())?.tree()?;
        let mut opts = workdir_options();
        let diff = repo.diff_tree_to_workdir_with_index(Some(&tree), Some(&mut opts))?;

        Ok(diff
            .deltas()
            .filter_map(|d| d.new_file().path().or_else(|| d.old_file().path()))
            .map(Path::to_path_buf)
            .collect())
    }

    fn commit(&self, message: &str) -> SnapshotResult<Revision> {
        let repo = self.open()?;
        let commit = self.write_commit(&repo, message, false)?;
        let boundaries = read_boundaries(&repo)?;
        to_revision(&repo, &commit, &boundaries)
    }

    fn log(&self, limit: usize) -> SnapshotResult<Vec<Revision>> {
        let repo = self.open()?;
        let boundaries = read_boundaries(&repo)?;

        let mut revisions = Vec::new();
        let mut next = head_commit(&repo)?;
        while let Some(commit) = next {
            if revisions.len() >= limit {
                break;
            }
            revisions.push(to_revision(&repo, &commit, &boundaries)?);
            next = predecessor(&repo, &commit, &boundaries);
        }

        Ok(revisions)
    }

    fn diff(&self, from: Option<&RevisionId>, to: Option<&RevisionId>) -> SnapshotResult<String> {
        let repo = self.open()?;

        let diff = match (from, to) {
            (Some(a), Some(b)) => {
                let old = find_commit(&repo, a.as_str())?.tree()?;
                let new = find_commit(&repo, b.as_str())?.tree()?;
                repo.diff_tree_to_tree(Some(&old), Some(&new), None)?
            }
            (Some(a), None) => {
                let old = find_commit(&repo, a.as_str())?.tree()?;
                let mut opts = workdir_options();
                repo.diff_tree_to_workdir_with_index(Some(&old), Some(&mut opts))?
            }
            (None, to) => {
                let boundaries = read_boundaries(&repo)?;
                let commit = match to {
                    Some(b) => find_commit(&repo, b.as_str())?,
                    None => head_commit(&repo)?.ok_or(SnapshotError::NotInitialized)?,
                };
                let old = predecessor(&repo, &commit, &boundaries)
                    .map(|p| p.tree())
                    .transpose()?;
                repo.diff_tree_to_tree(old.as_ref(), Some(&commit.tree()?), None)?
            }
        };

        render_patch(&diff)
    }

    fn hard_reset_to(&self, id: &RevisionId) -> SnapshotResult<()> {
        let repo = self.open()?;
        let commit = find_commit(&repo, id.as_str())?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force().remove_untracked(true);
        repo.reset(commit.as_object(), ResetType::Hard, Some(&mut checkout))?;

        Ok(())
    }

    fn checkout_paths(&self, id: &RevisionId, patterns: &[String]) -> SnapshotResult<Vec<PathBuf>> {
        let repo = self.open()?;
        let commit = find_commit(&repo, id.as_str())?;
        let tree = commit.tree()?;
        let matchers = patterns
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let mut matched = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    let path = format!("{dir}{name}");
                    if path_matches(&path, patterns, &matchers) {
                        matched.push(PathBuf::from(path));
                    }
                }
            }
            TreeWalkResult::Ok
        })?;

        if matched.is_empty() {
            return Ok(matched);
        }

        let mut checkout = CheckoutBuilder::new();
        checkout.force().disable_pathspec_match(true);
        for path in &matched {
            checkout.path(path.as_path());
        }
        repo.checkout_tree(commit.as_object(), Some(&mut checkout))?;

        Ok(matched)
    }

    fn delete_divergent_branches(&self) -> SnapshotResult<usize> {
        let repo = self.open()?;
        let mut deleted = 0;

        for branch in repo.branches(Some(BranchType::Local))? {
            let (mut branch, _) = branch?;
            if branch.is_head() {
                continue;
            }
            let name = branch.name()?.unwrap_or("<non-utf8>").to_string();
            branch.delete()?;
            debug!(branch = %name, "Deleted divergent branch");
            deleted += 1;
        }

        Ok(deleted)
    }

    fn delete_old_revisions(&self, keep: usize) -> SnapshotResult<PruneOutcome> {
        if keep == 0 {
            return Err(SnapshotError::InvalidRetention(keep));
        }

        let repo = self.open()?;
        let mut boundaries = read_boundaries(&repo)?;

        let mut chain = Vec::new();
        let mut next = head_commit(&repo)?;
        while let Some(commit) = next {
            chain.push(commit.id());
            next = predecessor(&repo, &commit, &boundaries);
        }

        if chain.len() <= keep {
            return Ok(PruneOutcome::default());
        }

        boundaries.insert(chain[keep - 1]);
        write_boundaries(&repo, &boundaries)?;

        let removed_objects = sweep_unreachable(&repo, &boundaries)?;

        boundaries.retain(|oid| repo.find_commit(*oid).is_ok());
        write_boundaries(&repo, &boundaries)?;

        Ok(PruneOutcome {
            pruned_revisions: chain.len() - keep,
            removed_objects,
        })
    }
}

fn head_commit(repo: &Repository) -> SnapshotResult<Option<Commit<'_>>> {
    match repo.head() {
        Ok(head) => Ok(Some(head.peel_to_commit()?)),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn find_commit<'r>(repo: &'r Repository, id: &str) -> SnapshotResult<Commit<'r>> {
    repo.revparse_single(id)
        .and_then(|obj| obj.peel_to_commit())
        .map_err(|_| SnapshotError::not_found(id))
}

/// First parent of `commit`, unless history was cut there.
fn predecessor<'r>(
    repo: &'r Repository,
    commit: &Commit<'r>,
    boundaries: &HashSet<Oid>,
) -> Option<Commit<'r>> {
    if boundaries.contains(&commit.id()) {
        return None;
    }
    commit
        .parent_ids()
        .next()
        .and_then(|id| repo.find_commit(id).ok())
}

fn to_revision(
    repo: &Repository,
    commit: &Commit<'_>,
    boundaries: &HashSet<Oid>,
) -> SnapshotResult<Revision> {
    let parent = predecessor(repo, commit, boundaries);
    let new_tree = commit.tree()?;
    let old_tree = parent.as_ref().map(|p| p.tree()).transpose()?;
    let files_changed = repo
        .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)?
        .deltas()
        .len();

    Ok(Revision {
        id: commit.id().into(),
        message: commit.message().unwrap_or("").trim_end().to_string(),
        author: commit.author().name().unwrap_or("").to_string(),
        timestamp: DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0)
            .unwrap_or_else(Utc::now),
        parent: parent.map(|p| p.id().into()),
        files_changed,
    })
}

fn workdir_options() -> DiffOptions {
    let mut opts = DiffOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .show_untracked_content(true);
    opts
}

fn render_patch(diff: &Diff<'_>) -> SnapshotResult<String> {
    let mut out = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
            out.push(line.origin());
        }
        out.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;
    Ok(out)
}

/// A tree path matches when a glob matches it or a pattern names one of its
/// parent directories.
fn path_matches(path: &str, patterns: &[String], matchers: &[Pattern]) -> bool {
    matchers.iter().any(|m| m.matches_with(path, MATCH_OPTIONS))
        || patterns.iter().any(|p| {
            let dir = p.trim_end_matches('/');
            !dir.is_empty() && Path::new(path).starts_with(dir)
        })
}

fn read_boundaries(repo: &Repository) -> SnapshotResult<HashSet<Oid>> {
    match fs::read_to_string(repo.path().join(SHALLOW_FILE)) {
        Ok(content) => Ok(content
            .lines()
            .filter_map(|line| Oid::from_str(line.trim()).ok())
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashSet::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_boundaries(repo: &Repository, boundaries: &HashSet<Oid>) -> SnapshotResult<()> {
    let path = repo.path().join(SHALLOW_FILE);
    if boundaries.is_empty() {
        if path.exists() {
            fs::remove_file(path)?;
        }
        return Ok(());
    }

    let mut lines: Vec<String> = boundaries.iter().map(Oid::to_string).collect();
    lines.sort();
    fs::write(path, format!("{}\n", lines.join("\n")))?;
    Ok(())
}

/// Delete loose objects unreachable from refs, HEAD and the index, walking
/// history no further than the boundaries. Returns the number removed.
fn sweep_unreachable(repo: &Repository, boundaries: &HashSet<Oid>) -> SnapshotResult<usize> {
    let mut reachable = HashSet::new();
    let mut pending = Vec::new();

    if let Some(head) = head_commit(repo)? {
        pending.push(head.id());
    }
    for reference in repo.references()? {
        if let Ok(commit) = reference?.peel_to_commit() {
            pending.push(commit.id());
        }
    }
    for entry in repo.index()?.iter() {
        reachable.insert(entry.id);
    }

    while let Some(oid) = pending.pop() {
        if !reachable.insert(oid) {
            continue;
        }
        let Ok(commit) = repo.find_commit(oid) else {
            continue;
        };
        mark_tree(repo, commit.tree_id(), &mut reachable)?;
        if !boundaries.contains(&oid) {
            pending.extend(commit.parent_ids());
        }
    }

    let mut removed = 0;
    for dir in fs::read_dir(repo.path().join("objects"))? {
        let dir = dir?;
        let prefix = dir.file_name().to_string_lossy().into_owned();
        if prefix.len() != 2 || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            continue;
        }
        for file in fs::read_dir(dir.path())? {
            let file = file?;
            let suffix = file.file_name().to_string_lossy().into_owned();
            if suffix.len() != 38 {
                continue;
            }
            let Ok(oid) = Oid::from_str(&format!("{prefix}{suffix}")) else {
                continue;
            };
            if !reachable.contains(&oid) {
                fs::remove_file(file.path())?;
                removed += 1;
            }
        }
    }

    Ok(removed)
}

fn mark_tree(repo: &Repository, tree_id: Oid, reachable: &mut HashSet<Oid>) -> SnapshotResult<()> {
    if !reachable.insert(tree_id) {
        return Ok(());
    }
    let tree = repo.find_tree(tree_id)?;
    tree.walk(TreeWalkMode::PreOrder, |_, entry| {
        reachable.insert(entry.id());
        TreeWalkResult::Ok
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, GitBackend) {
        let dir = TempDir::new().unwrap();
        let backend = GitBackend::new(dir.path(), "Test User", "test@example.com");
        backend.initialize().unwrap();
        (dir, backend)
    }

    fn write(dir: &TempDir, path: &str, content: &str) {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("configuration.yaml"), "homeassistant:\n").unwrap();
        let backend = GitBackend::new(dir.path(), "Test User", "test@example.com");

        assert!(backend.initialize().unwrap());
        assert!(!backend.initialize().unwrap());

        let log = backend.log(10).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].message, BASELINE_MESSAGE);
        assert_eq!(log[0].files_changed, 1);
        assert!(!backend.is_dirty().unwrap());
    }

    #[test]
    fn test_initialize_empty_directory() {
        let (_dir, backend) = setup();
        let head = backend.head().unwrap();
        assert_eq!(head.parent, None);
        assert_eq!(head.author, "Test User");
    }

    #[test]
    fn test_operations_before_initialize() {
        let dir = TempDir::new().unwrap();
        let backend = GitBackend::new(dir.path(), "Test User", "test@example.com");
        assert!(matches!(backend.log(5), Err(SnapshotError::NotInitialized)));
    }

    #[test]
    fn test_commit_and_no_changes() {
        let (dir, backend) = setup();
        write(&dir, "a.yaml", "one\n");

        let revision = backend.commit("add A").unwrap();
        assert_eq!(revision.message, "add A");
        assert_eq!(revision.files_changed, 1);

        write(&dir, "a.yaml", "one\n");
        assert!(backend.commit("noop").unwrap_err().is_no_changes());
        assert_eq!(backend.log(10).unwrap().len(), 2);
    }

    #[test]
    fn test_commit_records_deletions() {
        let (dir, backend) = setup();
        write(&dir, "a.yaml", "one\n");
        backend.commit("add A").unwrap();

        fs::remove_file(dir.path().join("a.yaml")).unwrap();
        assert!(backend.is_dirty().unwrap());
        backend.commit("remove A").unwrap();

        assert!(!backend.is_dirty().unwrap());
        let diff = backend.diff(None, None).unwrap();
        assert!(diff.contains("-one"));
    }

    #[test]
    fn test_log_newest_first_and_limited() {
        let (dir, backend) = setup();
        for i in 1..=4 {
            write(&dir, &format!("file{i}.yaml"), "x\n");
            backend.commit(&format!("commit {i}")).unwrap();
        }

        let log = backend.log(2).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].message, "commit 4");
        assert_eq!(log[1].message, "commit 3");
        assert_eq!(log[0].parent.as_ref(), Some(&log[1].id));
        assert!(backend.log(0).unwrap().is_empty());
    }

    #[test]
    fn test_diff_modes() {
        let (dir, backend) = setup();
        write(&dir, "a.yaml", "line 1\nline 2\n");
        let first = backend.commit("first").unwrap();
        write(&dir, "a.yaml", "line 1\nchanged\n");
        let second = backend.commit("second").unwrap();

        let between = backend.diff(Some(&first.id), Some(&second.id)).unwrap();
        assert!(between.contains("-line 2"));
        assert!(between.contains("+changed"));

        let head = backend.diff(None, None).unwrap();
        assert_eq!(head, between);

        write(&dir, "new.yaml", "fresh\n");
        let worktree = backend.diff(Some(&second.id), None).unwrap();
        assert!(worktree.contains("+fresh"));
        assert!(!worktree.contains("+changed"));

        let of_first = backend.diff(None, Some(&first.id)).unwrap();
        assert!(of_first.contains("+line 2"));
    }

    #[test]
    fn test_unknown_revision() {
        let (_dir, backend) = setup();
        let bogus = RevisionId::from_string("0123456789012345678901234567890123456789");
        assert!(matches!(
            backend.diff(Some(&bogus), None),
            Err(SnapshotError::RevisionNotFound(_))
        ));
        assert!(matches!(
            backend.resolve("not-a-revision"),
            Err(SnapshotError::RevisionNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_short_id() {
        let (dir, backend) = setup();
        write(&dir, "a.yaml", "x\n");
        let revision = backend.commit("add A").unwrap();
        assert_eq!(backend.resolve(revision.short_id()).unwrap().id, revision.id);
    }

    #[test]
    fn test_hard_reset_removes_untracked() {
        let (dir, backend) = setup();
        write(&dir, "a.yaml", "v1\n");
        let first = backend.commit("v1").unwrap();
        write(&dir, "a.yaml", "v2\n");
        backend.commit("v2").unwrap();
        write(&dir, "stray.yaml", "junk\n");

        backend.hard_reset_to(&first.id).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("a.yaml")).unwrap(), "v1\n");
        assert!(!dir.path().join("stray.yaml").exists());
        assert_eq!(backend.head().unwrap().id, first.id);
    }

    #[test]
    fn test_checkout_paths_is_selective() {
        let (dir, backend) = setup();
        write(&dir, "a.yaml", "a1\n");
        write(&dir, "b.yaml", "b1\n");
        write(&dir, "packages/c.yaml", "c1\n");
        let first = backend.commit("v1").unwrap();

        write(&dir, "a.yaml", "a2\n");
        write(&dir, "b.yaml", "b2\n");
        fs::remove_file(dir.path().join("packages/c.yaml")).unwrap();
        let second = backend.commit("v2").unwrap();

        let touched = backend
            .checkout_paths(&first.id, &["a.yaml".to_string(), "packages".to_string()])
            .unwrap();
        assert_eq!(
            touched,
            vec![PathBuf::from("a.yaml"), PathBuf::from("packages/c.yaml")]
        );

        assert_eq!(fs::read_to_string(dir.path().join("a.yaml")).unwrap(), "a1\n");
        assert_eq!(fs::read_to_string(dir.path().join("b.yaml")).unwrap(), "b2\n");
        assert!(dir.path().join("packages/c.yaml").exists());
        assert_eq!(backend.head().unwrap().id, second.id);
    }

    #[test]
    fn test_checkout_glob_respects_separators() {
        let (dir, backend) = setup();
        write(&dir, "top.yaml", "1\n");
        write(&dir, "packages/nested.yaml", "1\n");
        let first = backend.commit("v1").unwrap();

        let touched = backend.checkout_paths(&first.id, &["*.yaml".to_string()]).unwrap();
        assert_eq!(touched, vec![PathBuf::from("top.yaml")]);

        let touched = backend
            .checkout_paths(&first.id, &["**/*.yaml".to_string()])
            .unwrap();
        assert_eq!(touched.len(), 2);
    }

    #[test]
    fn test_delete_divergent_branches() {
        let (dir, backend) = setup();
        {
            let repo = Repository::open(dir.path()).unwrap();
            let head = repo.head().unwrap().peel_to_commit().unwrap();
            repo.branch("experiment", &head, false).unwrap();
            repo.branch("old-idea", &head, false).unwrap();
        }

        assert_eq!(backend.delete_divergent_branches().unwrap(), 2);
        assert_eq!(backend.delete_divergent_branches().unwrap(), 0);
    }

    #[test]
    fn test_delete_old_revisions_keeps_newest() {
        let (dir, backend) = setup();
        for i in 1..=6 {
            write(&dir, "a.yaml", &format!("version {i}\n"));
            backend.commit(&format!("commit {i}")).unwrap();
        }
        let before = backend.log(3).unwrap();

        let outcome = backend.delete_old_revisions(3).unwrap();
        assert_eq!(outcome.pruned_revisions, 4);
        assert!(outcome.removed_objects > 0);

        let after = backend.log(10).unwrap();
        let ids = |revs: &[Revision]| revs.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&after), ids(&before));
        assert_eq!(after[2].parent, None);
        assert!(backend.diff(None, None).unwrap().contains("+version 6"));
        backend.diff(Some(&after[2].id), Some(&after[0].id)).unwrap();

        assert_eq!(backend.delete_old_revisions(3).unwrap(), PruneOutcome::default());
    }

    #[test]
    fn test_delete_old_revisions_rejects_zero() {
        let (_dir, backend) = setup();
        assert!(matches!(
            backend.delete_old_revisions(0),
            Err(SnapshotError::InvalidRetention(0))
        ));
    }
}
